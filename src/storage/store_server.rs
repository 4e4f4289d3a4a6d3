// src/storage/store_server.rs - Async message passing for Store
//
// One task owns the SQLite connection and executes commands in arrival
// order, so transactions never interleave. Callers hold a cloneable
// StoreHandle.

use tokio::sync::{mpsc, oneshot};
use tracing::{info, warn};

use crate::core::types::{ChatSession, Message};
use crate::infra::errors::{StoreError, StoreResult};
use crate::storage::store::Store;
use crate::storage::usage::UsageStats;
use crate::storage::Database;

type Reply<T> = oneshot::Sender<StoreResult<T>>;

#[derive(Debug)]
pub enum StoreCommand {
    ListSessions {
        resp: Reply<Vec<ChatSession>>,
    },
    GetSession {
        id: String,
        resp: Reply<Option<ChatSession>>,
    },
    UpsertSession {
        session: ChatSession,
        resp: Reply<()>,
    },
    DeleteSession {
        id: String,
        resp: Reply<()>,
    },
    ClearAllSessions {
        resp: Reply<()>,
    },
    LoadMessages {
        session_id: String,
        resp: Reply<Vec<Message>>,
    },
    UpsertMessages {
        session_id: String,
        messages: Vec<Message>,
        resp: Reply<()>,
    },
    DeleteMessages {
        session_id: String,
        resp: Reply<()>,
    },
    ClearAllMessages {
        resp: Reply<()>,
    },
    SaveChat {
        session: ChatSession,
        messages: Vec<Message>,
        resp: Reply<()>,
    },
    DeleteChat {
        session_id: String,
        resp: Reply<()>,
    },
    ClearAll {
        resp: Reply<()>,
    },
    UsageStats {
        resp: Reply<UsageStats>,
    },
}

fn server_gone() -> StoreError {
    StoreError::unavailable("store server has shut down")
}

/// A handle to the Store that uses message passing.
#[derive(Clone)]
pub struct StoreHandle {
    tx: mpsc::Sender<StoreCommand>,
}

impl StoreHandle {
    pub fn new(tx: mpsc::Sender<StoreCommand>) -> Self {
        Self { tx }
    }

    async fn request<T>(&self, make: impl FnOnce(Reply<T>) -> StoreCommand) -> StoreResult<T> {
        let (resp_tx, resp_rx) = oneshot::channel();
        self.tx
            .send(make(resp_tx))
            .await
            .map_err(|_| server_gone())?;
        resp_rx.await.map_err(|_| server_gone())?
    }

    pub async fn list_sessions(&self) -> StoreResult<Vec<ChatSession>> {
        self.request(|resp| StoreCommand::ListSessions { resp }).await
    }

    pub async fn get_session(&self, id: &str) -> StoreResult<Option<ChatSession>> {
        let id = id.to_string();
        self.request(|resp| StoreCommand::GetSession { id, resp }).await
    }

    pub async fn upsert_session(&self, session: ChatSession) -> StoreResult<()> {
        self.request(|resp| StoreCommand::UpsertSession { session, resp }).await
    }

    pub async fn delete_session(&self, id: &str) -> StoreResult<()> {
        let id = id.to_string();
        self.request(|resp| StoreCommand::DeleteSession { id, resp }).await
    }

    pub async fn clear_all_sessions(&self) -> StoreResult<()> {
        self.request(|resp| StoreCommand::ClearAllSessions { resp }).await
    }

    pub async fn load_messages(&self, session_id: &str) -> StoreResult<Vec<Message>> {
        let session_id = session_id.to_string();
        self.request(|resp| StoreCommand::LoadMessages { session_id, resp }).await
    }

    pub async fn upsert_messages(
        &self,
        session_id: &str,
        messages: Vec<Message>,
    ) -> StoreResult<()> {
        let session_id = session_id.to_string();
        self.request(|resp| StoreCommand::UpsertMessages {
            session_id,
            messages,
            resp,
        })
        .await
    }

    pub async fn delete_messages(&self, session_id: &str) -> StoreResult<()> {
        let session_id = session_id.to_string();
        self.request(|resp| StoreCommand::DeleteMessages { session_id, resp }).await
    }

    pub async fn clear_all_messages(&self) -> StoreResult<()> {
        self.request(|resp| StoreCommand::ClearAllMessages { resp }).await
    }

    /// Session metadata and history in one transaction.
    pub async fn save_chat(
        &self,
        session: ChatSession,
        messages: Vec<Message>,
    ) -> StoreResult<()> {
        self.request(|resp| StoreCommand::SaveChat {
            session,
            messages,
            resp,
        })
        .await
    }

    pub async fn delete_chat(&self, session_id: &str) -> StoreResult<()> {
        let session_id = session_id.to_string();
        self.request(|resp| StoreCommand::DeleteChat { session_id, resp }).await
    }

    pub async fn clear_all(&self) -> StoreResult<()> {
        self.request(|resp| StoreCommand::ClearAll { resp }).await
    }

    pub async fn usage_stats(&self) -> StoreResult<UsageStats> {
        self.request(|resp| StoreCommand::UsageStats { resp }).await
    }
}

/// Helper to spawn the store server and return a handle.
pub fn spawn_store_server(db: Database) -> (StoreHandle, tokio::task::JoinHandle<()>) {
    let (tx, rx) = mpsc::channel(100);
    let handle = StoreHandle::new(tx);
    let join_handle = tokio::spawn(run_store_server(db, rx));
    (handle, join_handle)
}

/// Owns the gateway and the connection once it has been opened.
struct StoreServer {
    db: Database,
    store: Option<Store>,
}

impl StoreServer {
    /// Open on first use; a failed open is retried by the next command.
    fn with_store<T>(&mut self, op: impl FnOnce(&Store) -> StoreResult<T>) -> StoreResult<T> {
        if self.store.is_none() {
            match self.db.open() {
                Ok(store) => {
                    info!("Opened chat database ({:?})", self.db.location());
                    self.store = Some(store);
                }
                Err(e) => {
                    warn!("Chat database unavailable: {}", e);
                    return Err(e);
                }
            }
        }
        match self.store.as_ref() {
            Some(store) => op(store),
            None => Err(StoreError::unavailable("database not open")),
        }
    }
}

/// The background task that owns the Store.
pub async fn run_store_server(db: Database, mut rx: mpsc::Receiver<StoreCommand>) {
    let mut server = StoreServer { db, store: None };

    while let Some(cmd) = rx.recv().await {
        match cmd {
            StoreCommand::ListSessions { resp } => {
                let res = server.with_store(|s| s.list_sessions());
                let _ = resp.send(res);
            }
            StoreCommand::GetSession { id, resp } => {
                let res = server.with_store(|s| s.get_session(&id));
                let _ = resp.send(res);
            }
            StoreCommand::UpsertSession { session, resp } => {
                let res = server.with_store(|s| s.upsert_session(&session));
                let _ = resp.send(res);
            }
            StoreCommand::DeleteSession { id, resp } => {
                let res = server.with_store(|s| s.delete_session(&id));
                let _ = resp.send(res);
            }
            StoreCommand::ClearAllSessions { resp } => {
                let res = server.with_store(|s| s.clear_all_sessions());
                let _ = resp.send(res);
            }
            StoreCommand::LoadMessages { session_id, resp } => {
                let res = server.with_store(|s| s.load_messages(&session_id));
                let _ = resp.send(res);
            }
            StoreCommand::UpsertMessages {
                session_id,
                messages,
                resp,
            } => {
                let res = server.with_store(|s| s.upsert_messages(&session_id, &messages));
                let _ = resp.send(res);
            }
            StoreCommand::DeleteMessages { session_id, resp } => {
                let res = server.with_store(|s| s.delete_messages(&session_id));
                let _ = resp.send(res);
            }
            StoreCommand::ClearAllMessages { resp } => {
                let res = server.with_store(|s| s.clear_all_messages());
                let _ = resp.send(res);
            }
            StoreCommand::SaveChat {
                session,
                messages,
                resp,
            } => {
                let res = server.with_store(|s| s.save_chat(&session, &messages));
                let _ = resp.send(res);
            }
            StoreCommand::DeleteChat { session_id, resp } => {
                let res = server.with_store(|s| s.delete_chat(&session_id));
                let _ = resp.send(res);
            }
            StoreCommand::ClearAll { resp } => {
                let res = server.with_store(|s| s.clear_all());
                let _ = resp.send(res);
            }
            StoreCommand::UsageStats { resp } => {
                let res = server.with_store(|s| s.usage_stats());
                let _ = resp.send(res);
            }
        }
    }
}

// src/core/history.rs - Best-effort chat history surface for UI code
//
// Everything here absorbs storage failures: reads fall back to empty
// results, writes log and move on. Callers that need the error use the
// StoreHandle and SaveCoordinator directly.

use std::sync::Arc;
use std::time::Duration;
use tracing::{error, warn};

use crate::core::coordinator::SaveCoordinator;
use crate::core::title::TitlePolicy;
use crate::core::types::{ChatMode, ChatSession, Message};
use crate::infra::config::Config;
use crate::storage::store_server::{spawn_store_server, StoreHandle};
use crate::storage::usage::UsageStats;
use crate::storage::Database;

/// How many sessions the home screen lists.
pub const RECENT_SESSIONS: usize = 5;

#[derive(Clone)]
pub struct ChatHistory {
    store: StoreHandle,
    saver: SaveCoordinator,
}

impl ChatHistory {
    /// Spawn the store server for the configured database. The database is
    /// opened lazily by the first operation. Must be called from within a
    /// tokio runtime.
    pub fn open(config: &Config) -> Self {
        Self::with_database(
            Database::from_config(&config.storage),
            config.persistence.debounce(),
            config.titles.policy(),
        )
    }

    pub fn with_database(db: Database, debounce: Duration, titles: TitlePolicy) -> Self {
        let (store, _server) = spawn_store_server(db);
        let saver = SaveCoordinator::new(Arc::new(store.clone()), debounce, titles);
        Self { store, saver }
    }

    /// In-memory history with default timing (for testing).
    pub fn in_memory() -> Self {
        let config = Config::default();
        Self::with_database(
            Database::in_memory(),
            config.persistence.debounce(),
            config.titles.policy(),
        )
    }

    pub fn from_parts(store: StoreHandle, saver: SaveCoordinator) -> Self {
        Self { store, saver }
    }

    pub fn store(&self) -> &StoreHandle {
        &self.store
    }

    pub fn saver(&self) -> &SaveCoordinator {
        &self.saver
    }

    // -- Reads --

    /// All sessions, newest first; empty if storage fails.
    pub async fn list_sessions(&self) -> Vec<ChatSession> {
        self.store.list_sessions().await.unwrap_or_else(|e| {
            warn!("Failed to list sessions: {}", e);
            Vec::new()
        })
    }

    pub async fn recent_sessions(&self, limit: usize) -> Vec<ChatSession> {
        let mut sessions = self.list_sessions().await;
        sessions.truncate(limit);
        sessions
    }

    pub async fn get_session(&self, id: &str) -> Option<ChatSession> {
        self.store.get_session(id).await.unwrap_or_else(|e| {
            warn!("Failed to load session {}: {}", id, e);
            None
        })
    }

    /// Stored history for a session; empty if absent or storage fails.
    pub async fn load_messages(&self, id: &str) -> Vec<Message> {
        self.store.load_messages(id).await.unwrap_or_else(|e| {
            warn!("Failed to load messages for {}: {}", id, e);
            Vec::new()
        })
    }

    pub async fn usage_stats(&self) -> UsageStats {
        self.store.usage_stats().await.unwrap_or_else(|e| {
            warn!("Failed to compute storage usage: {}", e);
            UsageStats::default()
        })
    }

    // -- Writes --

    /// Debounced save, called on every change to the in-memory history.
    pub fn request_save(&self, id: &str, messages: Vec<Message>, mode: ChatMode) {
        self.saver.request_save(id, messages, mode);
    }

    /// Immediate save, called when the conversation is being left.
    pub async fn flush_now(&self, id: &str, messages: Vec<Message>, mode: ChatMode) {
        // Already logged by the coordinator.
        let _ = self.saver.flush_now(id, messages, mode).await;
    }

    /// Remove a session and its history. A pending save for it is dropped
    /// so it cannot bring the session back.
    pub async fn delete_chat(&self, id: &str) {
        self.saver.cancel(id);
        if let Err(e) = self.store.delete_chat(id).await {
            error!("Failed to delete chat {}: {}", id, e);
        }
    }

    /// Remove every session and history, dropping all pending saves.
    pub async fn clear_all(&self) {
        self.saver.cancel_all();
        if let Err(e) = self.store.clear_all().await {
            error!("Failed to clear chat data: {}", e);
        }
    }
}

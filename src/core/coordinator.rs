// src/core/coordinator.rs - Debounced, per-session save coordination
//
// Each session id moves through Idle -> PendingTimer -> Saving -> Idle.
// A new request for the same id cancels the pending timer and re-arms it,
// so a burst of edits turns into one write carrying the latest history.
// The delay is measured from the request, not from when the timer task is
// first polled. A per-session gate is held for the duration of each write;
// a flush that arrives after a timer has claimed its save waits for that
// write and is written after it.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::{sleep_until, Instant};
use tracing::{debug, error, warn};

use crate::core::title::TitlePolicy;
use crate::core::types::{ChatMode, ChatSession, Message};
use crate::infra::errors::StoreResult;
use crate::storage::store_server::StoreHandle;
use crate::util::now_millis;

pub const DEFAULT_DEBOUNCE: Duration = Duration::from_millis(1000);

/// Destination of an atomic save: session metadata plus full history,
/// committed together or not at all.
#[async_trait]
pub trait SaveSink: Send + Sync {
    async fn save_chat(&self, session: ChatSession, messages: Vec<Message>) -> StoreResult<()>;
}

#[async_trait]
impl SaveSink for StoreHandle {
    async fn save_chat(&self, session: ChatSession, messages: Vec<Message>) -> StoreResult<()> {
        StoreHandle::save_chat(self, session, messages).await
    }
}

struct PendingSave {
    generation: u64,
    timer: JoinHandle<()>,
}

type Gate = Arc<tokio::sync::Mutex<()>>;

#[derive(Default)]
struct SessionSlot {
    gate: Gate,
    generation: u64,
    pending: Option<PendingSave>,
}

struct Inner {
    sink: Arc<dyn SaveSink>,
    delay: Duration,
    titles: TitlePolicy,
    slots: Mutex<HashMap<String, SessionSlot>>,
}

impl Inner {
    fn slots(&self) -> MutexGuard<'_, HashMap<String, SessionSlot>> {
        self.slots.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Claim the pending save if it is still the one armed as `generation`,
    /// returning the session's gate to write under.
    fn take_pending(&self, id: &str, generation: u64) -> Option<Gate> {
        let mut slots = self.slots();
        match slots.get_mut(id) {
            Some(slot) if slot.pending.as_ref().map(|p| p.generation) == Some(generation) => {
                slot.pending = None;
                Some(Arc::clone(&slot.gate))
            }
            _ => None,
        }
    }

    /// Forget an idle slot nobody else is holding on to.
    fn prune(&self, id: &str) {
        let mut slots = self.slots();
        let idle = slots
            .get(id)
            .is_some_and(|slot| slot.pending.is_none() && Arc::strong_count(&slot.gate) == 1);
        if idle {
            slots.remove(id);
        }
    }

    async fn persist(&self, id: &str, messages: Vec<Message>, mode: ChatMode) -> StoreResult<()> {
        let session = ChatSession {
            id: id.to_string(),
            title: self.titles.derive(&messages),
            timestamp: now_millis(),
            mode,
        };
        match self.sink.save_chat(session, messages).await {
            Ok(()) => Ok(()),
            Err(e) => {
                if e.is_transient() {
                    warn!("Failed to save chat {}, storage may recover: {}", id, e);
                } else {
                    error!("Failed to save chat {}: {}", id, e);
                }
                Err(e)
            }
        }
    }
}

// The timer holds no gate while it sleeps. Once it claims the pending
// save nothing aborts it, so the gate it clones is always released.
async fn fire_at(
    inner: Arc<Inner>,
    id: String,
    generation: u64,
    deadline: Instant,
    messages: Vec<Message>,
    mode: ChatMode,
) {
    sleep_until(deadline).await;

    let Some(gate) = inner.take_pending(&id, generation) else {
        // Superseded or flushed while waiting.
        return;
    };
    let guard = gate.lock().await;
    let _ = inner.persist(&id, messages, mode).await;
    drop(guard);
    drop(gate);
    inner.prune(&id);
}

/// Coalesces save requests per session and performs the atomic save.
#[derive(Clone)]
pub struct SaveCoordinator {
    inner: Arc<Inner>,
}

impl SaveCoordinator {
    pub fn new(sink: Arc<dyn SaveSink>, delay: Duration, titles: TitlePolicy) -> Self {
        Self {
            inner: Arc::new(Inner {
                sink,
                delay,
                titles,
                slots: Mutex::new(HashMap::new()),
            }),
        }
    }

    pub fn delay(&self) -> Duration {
        self.inner.delay
    }

    /// Schedule a save after the quiet period. Later calls for the same id
    /// within the window replace this one. Must be called from within a
    /// tokio runtime.
    pub fn request_save(&self, id: &str, messages: Vec<Message>, mode: ChatMode) {
        if id.is_empty() || messages.is_empty() {
            return;
        }

        let mut slots = self.inner.slots();
        let slot = slots.entry(id.to_string()).or_default();
        if let Some(previous) = slot.pending.take() {
            previous.timer.abort();
        }
        slot.generation += 1;
        let generation = slot.generation;
        let deadline = Instant::now() + self.inner.delay;

        // Spawned under the table lock so the timer cannot look for its
        // entry before it is recorded.
        let timer = tokio::spawn(fire_at(
            Arc::clone(&self.inner),
            id.to_string(),
            generation,
            deadline,
            messages,
            mode,
        ));
        slot.pending = Some(PendingSave { generation, timer });
        debug!("Save for {} scheduled (generation {})", id, generation);
    }

    /// Cancel any pending timer and write now. Resolves once the write has
    /// committed or failed.
    pub async fn flush_now(
        &self,
        id: &str,
        messages: Vec<Message>,
        mode: ChatMode,
    ) -> StoreResult<()> {
        if id.is_empty() || messages.is_empty() {
            return Ok(());
        }

        let gate = {
            let mut slots = self.inner.slots();
            let slot = slots.entry(id.to_string()).or_default();
            if let Some(previous) = slot.pending.take() {
                previous.timer.abort();
                debug!("Pending save for {} replaced by flush", id);
            }
            Arc::clone(&slot.gate)
        };

        let guard = gate.lock().await;
        let result = self.inner.persist(id, messages, mode).await;
        drop(guard);
        drop(gate);
        self.inner.prune(id);
        result
    }

    /// Drop the pending save for `id` without writing. Returns whether one
    /// was pending.
    pub fn cancel(&self, id: &str) -> bool {
        let cancelled = {
            let mut slots = self.inner.slots();
            match slots.get_mut(id).and_then(|slot| slot.pending.take()) {
                Some(pending) => {
                    pending.timer.abort();
                    true
                }
                None => false,
            }
        };
        self.inner.prune(id);
        cancelled
    }

    /// Drop every pending save. Returns how many were cancelled.
    pub fn cancel_all(&self) -> usize {
        let mut slots = self.inner.slots();
        let mut cancelled = 0;
        for slot in slots.values_mut() {
            if let Some(pending) = slot.pending.take() {
                pending.timer.abort();
                cancelled += 1;
            }
        }
        slots.retain(|_, slot| Arc::strong_count(&slot.gate) > 1);
        cancelled
    }

    pub fn has_pending(&self, id: &str) -> bool {
        self.inner
            .slots()
            .get(id)
            .is_some_and(|slot| slot.pending.is_some())
    }

    pub fn pending_count(&self) -> usize {
        self.inner
            .slots()
            .values()
            .filter(|slot| slot.pending.is_some())
            .count()
    }
}

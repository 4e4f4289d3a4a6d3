// src/lib.rs - Library root for chatkeep
//
// Local persistence for chat sessions: session metadata and message
// histories in SQLite, debounced per-session saves, derived titles and a
// storage usage estimate.

pub mod core;
pub mod infra;
pub mod storage;
pub mod util;

pub use crate::core::{ChatHistory, ChatMode, ChatSession, Message, Role};
pub use crate::infra::errors::{StoreError, StoreResult};
pub use crate::storage::usage::{format_bytes, UsageStats};

// src/core/mod.rs - Chat session logic

pub mod coordinator;
pub mod history;
pub mod title;
pub mod types;

pub use coordinator::{SaveCoordinator, SaveSink};
pub use history::ChatHistory;
pub use title::{derive_title, TitlePolicy};
pub use types::{Attachment, AttachmentKind, ChatMode, ChatSession, Message, MessageHistory, Role};

// src/core/title.rs - Session title derivation

use crate::core::types::{AttachmentKind, Message, Role};
use crate::util::truncate_chars;

pub const DEFAULT_TITLE: &str = "New Chat";
pub const DEFAULT_MAX_TITLE_CHARS: usize = 50;

const MARKUP_CHARS: [char; 5] = ['#', '*', '`', '_', '~'];
const ELLIPSIS: &str = "...";

/// Knobs for title derivation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TitlePolicy {
    /// Characters kept from the first user message before `...` is appended.
    pub max_chars: usize,
}

impl Default for TitlePolicy {
    fn default() -> Self {
        Self {
            max_chars: DEFAULT_MAX_TITLE_CHARS,
        }
    }
}

impl TitlePolicy {
    /// Compute a display title for a history. Never fails; an empty history
    /// yields [`DEFAULT_TITLE`].
    pub fn derive(&self, messages: &[Message]) -> String {
        if let Some(first_user) = messages.iter().find(|m| m.role == Role::User) {
            let cleaned = strip_markup(&first_user.text);
            let cleaned = cleaned.trim();
            if !cleaned.is_empty() {
                let head = truncate_chars(cleaned, self.max_chars);
                if head.len() < cleaned.len() {
                    return format!("{head}{ELLIPSIS}");
                }
                return head.to_string();
            }
            return match first_user.attachment.as_ref().map(|a| a.kind) {
                Some(AttachmentKind::Image) => "Image Analysis".into(),
                Some(AttachmentKind::Video) => "Video Analysis".into(),
                None => DEFAULT_TITLE.into(),
            };
        }

        match messages.last() {
            Some(last) if last.image.is_some() => "Generated Image".into(),
            Some(last) if last.video.is_some() => "Generated Video".into(),
            _ => DEFAULT_TITLE.into(),
        }
    }
}

/// Derive a title with the default policy.
pub fn derive_title(messages: &[Message]) -> String {
    TitlePolicy::default().derive(messages)
}

fn strip_markup(text: &str) -> String {
    text.chars().filter(|c| !MARKUP_CHARS.contains(c)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::types::Attachment;

    #[test]
    fn test_empty_history() {
        assert_eq!(derive_title(&[]), "New Chat");
    }

    #[test]
    fn test_short_user_text_kept_whole() {
        let msgs = vec![Message::user("Hello world, this is a longer test message")];
        assert_eq!(
            derive_title(&msgs),
            "Hello world, this is a longer test message"
        );
    }

    #[test]
    fn test_exactly_fifty_chars_no_suffix() {
        let text = "a".repeat(50);
        let title = derive_title(&[Message::user(text.clone())]);
        assert_eq!(title, text);
        assert_eq!(title.chars().count(), 50);
    }

    #[test]
    fn test_fifty_one_chars_truncated() {
        let text = "b".repeat(51);
        let title = derive_title(&[Message::user(text)]);
        assert_eq!(title.chars().count(), 53);
        assert!(title.ends_with("..."));
        assert_eq!(&title[..50], "b".repeat(50));
    }

    #[test]
    fn test_markup_stripped_then_trimmed() {
        let msgs = vec![Message::user("  ## **Bold** `code` _it_ ~x~  ")];
        assert_eq!(derive_title(&msgs), "Bold code it x");
    }

    #[test]
    fn test_markup_only_counts_as_empty() {
        let msgs =
            vec![Message::user("### ***").with_attachment(Attachment::video("v", "video/mp4"))];
        assert_eq!(derive_title(&msgs), "Video Analysis");
    }

    #[test]
    fn test_image_attachment_only() {
        let msgs = vec![Message::user("").with_attachment(Attachment::image("AAAA", "image/jpeg"))];
        assert_eq!(derive_title(&msgs), "Image Analysis");
    }

    #[test]
    fn test_first_user_message_wins() {
        let msgs = vec![
            Message::model("Hi! How can I help?"),
            Message::user("First question"),
            Message::user("Second question"),
        ];
        assert_eq!(derive_title(&msgs), "First question");
    }

    #[test]
    fn test_empty_user_message_without_attachment_is_default() {
        let msgs = vec![
            Message::user("   "),
            Message::model("").with_image("data:image/png;base64,AAA"),
        ];
        assert_eq!(derive_title(&msgs), "New Chat");
    }

    #[test]
    fn test_model_only_generated_image() {
        let msgs = vec![
            Message::model("working on it"),
            Message::model("").with_image("data:image/png;base64,AAA"),
        ];
        assert_eq!(derive_title(&msgs), "Generated Image");
    }

    #[test]
    fn test_model_only_generated_video() {
        let msgs = vec![Message::model("").with_video("https://example.com/v.mp4")];
        assert_eq!(derive_title(&msgs), "Generated Video");
    }

    #[test]
    fn test_model_only_last_message_decides() {
        let msgs = vec![
            Message::model("").with_image("img"),
            Message::model("plain text"),
        ];
        assert_eq!(derive_title(&msgs), "New Chat");
    }

    #[test]
    fn test_multibyte_truncation_by_chars() {
        let text = "é".repeat(60);
        let title = derive_title(&[Message::user(text)]);
        assert_eq!(title.chars().count(), 53);
    }

    #[test]
    fn test_custom_policy_length() {
        let policy = TitlePolicy { max_chars: 5 };
        assert_eq!(policy.derive(&[Message::user("abcdef")]), "abcde...");
        assert_eq!(policy.derive(&[Message::user("abcde")]), "abcde");
    }

    #[test]
    fn test_deterministic() {
        let msgs = vec![Message::user("same input")];
        assert_eq!(derive_title(&msgs), derive_title(&msgs));
    }
}

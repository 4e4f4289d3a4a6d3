// tests/store_test.rs - Integration test: SQLite round-trip (store CRUD)

use chatkeep::core::types::{Attachment, ChatMode, ChatSession, Message, Role};
use chatkeep::storage::schema;
use chatkeep::storage::store::Store;
use chatkeep::storage::usage::UsageStats;
use pretty_assertions::assert_eq;
use rusqlite::Connection;

/// Create an in-memory SQLite store with schema applied.
fn test_store() -> Store {
    let conn = Connection::open_in_memory().unwrap();
    schema::run_migrations(&conn).unwrap();
    Store::new(conn)
}

fn session(id: &str, title: &str, timestamp: i64, mode: ChatMode) -> ChatSession {
    ChatSession {
        id: id.into(),
        title: title.into(),
        timestamp,
        mode,
    }
}

/// A history exercising every optional field.
fn rich_history() -> Vec<Message> {
    vec![
        Message {
            id: "m1".into(),
            role: Role::User,
            text: "What is in this picture?".into(),
            image: None,
            video: None,
            attachment: Some(Attachment {
                kind: chatkeep::core::types::AttachmentKind::Image,
                url: Some("blob:local/123".into()),
                data: Some("iVBORw0KGgo=".into()),
                mime_type: "image/png".into(),
            }),
            timestamp: 1_700_000_000_000,
            is_thinking: None,
        },
        Message {
            id: "m2".into(),
            role: Role::Model,
            text: String::new(),
            image: Some("data:image/png;base64,AAAA".into()),
            video: None,
            attachment: None,
            timestamp: 1_700_000_001_000,
            is_thinking: Some(false),
        },
        Message {
            id: "m3".into(),
            role: Role::Model,
            text: "Here is a clip ✨".into(),
            image: None,
            video: Some("https://example.com/video.mp4".into()),
            attachment: None,
            timestamp: 1_700_000_002_000,
            is_thinking: Some(true),
        },
    ]
}

#[test]
fn test_messages_round_trip() {
    let store = test_store();
    let history = rich_history();

    store.upsert_messages("sess-1", &history).unwrap();
    assert_eq!(store.load_messages("sess-1").unwrap(), history);
}

#[test]
fn test_upsert_messages_rewrites_whole_history() {
    let store = test_store();
    store.upsert_messages("sess-1", &rich_history()).unwrap();

    let shorter = vec![Message::user("start over")];
    store.upsert_messages("sess-1", &shorter).unwrap();
    assert_eq!(store.load_messages("sess-1").unwrap(), shorter);
}

#[test]
fn test_load_missing_history_is_empty() {
    let store = test_store();
    assert!(store.load_messages("never-saved").unwrap().is_empty());
}

#[test]
fn test_list_sessions_newest_first() {
    let store = test_store();
    store
        .upsert_session(&session("old", "Old", 1_000, ChatMode::Default))
        .unwrap();
    store
        .upsert_session(&session("new", "New", 3_000, ChatMode::ImageGen))
        .unwrap();
    store
        .upsert_session(&session("mid", "Mid", 2_000, ChatMode::VideoGen))
        .unwrap();

    let ids: Vec<String> = store
        .list_sessions()
        .unwrap()
        .into_iter()
        .map(|s| s.id)
        .collect();
    assert_eq!(ids, vec!["new", "mid", "old"]);
}

#[test]
fn test_one_row_per_session_id() {
    let store = test_store();
    store
        .upsert_session(&session("s", "First", 1, ChatMode::Default))
        .unwrap();
    store
        .upsert_session(&session("s", "Second", 2, ChatMode::Default))
        .unwrap();

    let count: i64 = store
        .conn()
        .query_row("SELECT COUNT(*) FROM sessions WHERE id = ?1", ["s"], |row| {
            row.get(0)
        })
        .unwrap();
    assert_eq!(count, 1);
    assert_eq!(store.get_session("s").unwrap().unwrap().title, "Second");
}

#[test]
fn test_delete_session_leaves_history() {
    let store = test_store();
    store
        .save_chat(
            &session("s", "Hello", 10, ChatMode::Default),
            &[Message::user("Hello")],
        )
        .unwrap();

    store.delete_session("s").unwrap();
    assert!(store.list_sessions().unwrap().is_empty());
    assert_eq!(store.load_messages("s").unwrap().len(), 1);

    store.delete_messages("s").unwrap();
    assert!(store.load_messages("s").unwrap().is_empty());
}

#[test]
fn test_delete_absent_is_not_error() {
    let store = test_store();
    store.delete_session("ghost").unwrap();
    store.delete_messages("ghost").unwrap();
    store.delete_chat("ghost").unwrap();
}

#[test]
fn test_delete_chat_removes_both() {
    let store = test_store();
    store
        .save_chat(
            &session("keep", "Keep", 1, ChatMode::Default),
            &[Message::user("keep")],
        )
        .unwrap();
    store
        .save_chat(
            &session("drop", "Drop", 2, ChatMode::Default),
            &[Message::user("drop")],
        )
        .unwrap();

    store.delete_chat("drop").unwrap();

    assert!(store.get_session("drop").unwrap().is_none());
    assert!(store.load_messages("drop").unwrap().is_empty());
    assert!(store.get_session("keep").unwrap().is_some());
    assert_eq!(store.load_messages("keep").unwrap().len(), 1);
}

#[test]
fn test_clear_all_empties_both_collections() {
    let store = test_store();
    for id in ["a", "b", "c"] {
        store
            .save_chat(
                &session(id, id, 1, ChatMode::Default),
                &[Message::user(id)],
            )
            .unwrap();
    }

    store.clear_all_sessions().unwrap();
    store.clear_all_messages().unwrap();

    assert!(store.list_sessions().unwrap().is_empty());
    for id in ["a", "b", "c"] {
        assert!(store.load_messages(id).unwrap().is_empty());
    }
}

#[test]
fn test_histories_without_sessions_are_tolerated() {
    let store = test_store();
    store
        .upsert_messages("orphan", &[Message::user("no metadata")])
        .unwrap();
    store
        .upsert_session(&session("bare", "No history", 5, ChatMode::Default))
        .unwrap();

    assert_eq!(store.list_sessions().unwrap().len(), 1);
    assert!(store.load_messages("bare").unwrap().is_empty());
    assert_eq!(store.usage_stats().unwrap().item_count, 1);
}

#[test]
fn test_usage_on_empty_store() {
    let store = test_store();
    assert_eq!(store.usage_stats().unwrap(), UsageStats::default());
}

#[test]
fn test_usage_ignores_sessions_table() {
    let store = test_store();
    store
        .upsert_session(&session("s", "Only metadata", 1, ChatMode::Default))
        .unwrap();
    assert_eq!(
        store.usage_stats().unwrap(),
        UsageStats {
            usage_bytes: 0,
            item_count: 0
        }
    );
}

#[test]
fn test_usage_grows_with_content() {
    let store = test_store();
    store
        .upsert_messages("s", &[Message::user("short")])
        .unwrap();
    let small = store.usage_stats().unwrap();

    store
        .upsert_messages("s", &[Message::user("x".repeat(10_000))])
        .unwrap();
    let large = store.usage_stats().unwrap();

    assert_eq!(small.item_count, 1);
    assert_eq!(large.item_count, 1);
    assert!(large.usage_bytes > small.usage_bytes + 9_000);
}

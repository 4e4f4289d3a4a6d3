// src/storage/store.rs - SQLite operations

use rusqlite::types::Type;
use rusqlite::{params, Connection, OptionalExtension};
use tracing::{debug, warn};

use crate::core::types::{ChatMode, ChatSession, Message, MessageHistory};
use crate::infra::errors::StoreResult;
use crate::storage::usage::UsageStats;

const SESSION_COLS: &str = "id, title, mode, timestamp";

fn row_to_session(row: &rusqlite::Row) -> rusqlite::Result<ChatSession> {
    let mode: String = row.get(2)?;
    let mode = mode
        .parse::<ChatMode>()
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(2, Type::Text, Box::new(e)))?;
    Ok(ChatSession {
        id: row.get(0)?,
        title: row.get(1)?,
        mode,
        timestamp: row.get(3)?,
    })
}

fn put_session(conn: &Connection, session: &ChatSession) -> StoreResult<()> {
    conn.execute(
        "INSERT INTO sessions (id, title, mode, timestamp) VALUES (?1, ?2, ?3, ?4)
         ON CONFLICT(id) DO UPDATE SET
             title = excluded.title,
             mode = excluded.mode,
             timestamp = excluded.timestamp",
        params![
            session.id,
            session.title,
            session.mode.as_str(),
            session.timestamp
        ],
    )?;
    Ok(())
}

fn put_messages(conn: &Connection, session_id: &str, messages: &[Message]) -> StoreResult<()> {
    let json = serde_json::to_string(messages)?;
    conn.execute(
        "INSERT INTO messages (session_id, messages_json) VALUES (?1, ?2)
         ON CONFLICT(session_id) DO UPDATE SET messages_json = excluded.messages_json",
        params![session_id, json],
    )?;
    Ok(())
}

/// Low-level SQLite operations over the sessions and messages tables.
pub struct Store {
    conn: Connection,
}

impl Store {
    pub fn new(conn: Connection) -> Self {
        Self { conn }
    }

    pub fn conn(&self) -> &Connection {
        &self.conn
    }

    // -- Sessions --

    /// All sessions, newest first. Rows whose values cannot be decoded are
    /// skipped.
    pub fn list_sessions(&self) -> StoreResult<Vec<ChatSession>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {SESSION_COLS} FROM sessions ORDER BY timestamp DESC, id ASC"
        ))?;
        let mut sessions = Vec::new();
        for row in stmt.query_map([], row_to_session)? {
            match row {
                Ok(session) => sessions.push(session),
                Err(rusqlite::Error::FromSqlConversionFailure(_, _, e)) => {
                    warn!("Skipping unreadable session row: {}", e);
                }
                Err(e) => return Err(e.into()),
            }
        }
        Ok(sessions)
    }

    pub fn get_session(&self, id: &str) -> StoreResult<Option<ChatSession>> {
        let session = self
            .conn
            .query_row(
                &format!("SELECT {SESSION_COLS} FROM sessions WHERE id = ?1"),
                params![id],
                row_to_session,
            )
            .optional()?;
        Ok(session)
    }

    pub fn upsert_session(&self, session: &ChatSession) -> StoreResult<()> {
        put_session(&self.conn, session)
    }

    pub fn delete_session(&self, id: &str) -> StoreResult<()> {
        self.conn.execute("DELETE FROM sessions WHERE id = ?1", params![id])?;
        Ok(())
    }

    pub fn clear_all_sessions(&self) -> StoreResult<()> {
        self.conn.execute("DELETE FROM sessions", [])?;
        Ok(())
    }

    // -- Messages --

    /// Message history for a session; empty when none was stored.
    pub fn load_messages(&self, session_id: &str) -> StoreResult<Vec<Message>> {
        let json: Option<String> = self
            .conn
            .query_row(
                "SELECT messages_json FROM messages WHERE session_id = ?1",
                params![session_id],
                |row| row.get(0),
            )
            .optional()?;
        match json {
            Some(json) => Ok(serde_json::from_str(&json)?),
            None => Ok(Vec::new()),
        }
    }

    /// Replace the whole history stored under `session_id`.
    pub fn upsert_messages(&self, session_id: &str, messages: &[Message]) -> StoreResult<()> {
        put_messages(&self.conn, session_id, messages)
    }

    pub fn delete_messages(&self, session_id: &str) -> StoreResult<()> {
        self.conn.execute(
            "DELETE FROM messages WHERE session_id = ?1",
            params![session_id],
        )?;
        Ok(())
    }

    pub fn clear_all_messages(&self) -> StoreResult<()> {
        self.conn.execute("DELETE FROM messages", [])?;
        Ok(())
    }

    // -- Combined --

    /// Write session metadata and its history in one transaction.
    pub fn save_chat(&self, session: &ChatSession, messages: &[Message]) -> StoreResult<()> {
        let tx = self.conn.unchecked_transaction()?;
        put_session(&tx, session)?;
        put_messages(&tx, &session.id, messages)?;
        tx.commit()?;
        debug!(
            "Saved session {} ({} messages, title {:?})",
            session.id,
            messages.len(),
            session.title
        );
        Ok(())
    }

    /// Remove a session and its history in one transaction.
    pub fn delete_chat(&self, session_id: &str) -> StoreResult<()> {
        let tx = self.conn.unchecked_transaction()?;
        tx.execute("DELETE FROM sessions WHERE id = ?1", params![session_id])?;
        tx.execute(
            "DELETE FROM messages WHERE session_id = ?1",
            params![session_id],
        )?;
        tx.commit()?;
        Ok(())
    }

    /// Empty both tables in one transaction.
    pub fn clear_all(&self) -> StoreResult<()> {
        let tx = self.conn.unchecked_transaction()?;
        tx.execute("DELETE FROM sessions", [])?;
        tx.execute("DELETE FROM messages", [])?;
        tx.commit()?;
        Ok(())
    }

    // -- Usage --

    /// Sum of the JSON-encoded size of every stored history.
    pub fn usage_stats(&self) -> StoreResult<UsageStats> {
        let mut stmt = self
            .conn
            .prepare("SELECT session_id, messages_json FROM messages")?;
        let mut rows = stmt.query([])?;

        let mut stats = UsageStats::default();
        while let Some(row) = rows.next()? {
            let session_id: String = row.get(0)?;
            let json: String = row.get(1)?;
            let record = MessageHistory {
                session_id,
                messages: serde_json::from_str(&json)?,
            };
            let encoded = serde_json::to_string(&record)?;
            stats.add_record(encoded.len());
        }
        Ok(stats)
    }
}

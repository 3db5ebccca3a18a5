//! Per-caller conversation history.
//!
//! A session row is created the first time an exchange is stored for a phone
//! number. Turns are ordered by rowid; timestamps are informational only.

use callcenter_types::{Role, Turn};
use rusqlite::{params, Connection};

use crate::error::RecordError;
use crate::parse_label;

/// Persists one caller/agent exchange atomically.
///
/// Both turns are inserted inside one transaction, caller first. If either
/// insert fails, neither is visible to later reads.
pub fn append_exchange(
    conn: &Connection,
    phone: &str,
    caller: &Turn,
    agent: &Turn,
) -> Result<(), RecordError> {
    let tx = conn.unchecked_transaction()?;

    tx.execute(
        "INSERT INTO sessions (phone) VALUES (?1)
         ON CONFLICT (phone) DO UPDATE SET last_seen_at = datetime('now')",
        [phone],
    )?;

    for turn in [caller, agent] {
        tx.execute(
            "INSERT INTO conversation_turns (phone, role, content, tool_call_id)
             VALUES (?1, ?2, ?3, ?4)",
            params![phone, turn.role.as_str(), turn.content, turn.tool_call_id],
        )?;
    }

    tx.commit()?;
    Ok(())
}

/// Returns the most recent `limit` turns for a caller, oldest first.
pub fn recent_turns(
    conn: &Connection,
    phone: &str,
    limit: usize,
) -> Result<Vec<Turn>, RecordError> {
    let mut stmt = conn.prepare(
        "SELECT role, content, tool_call_id FROM conversation_turns
         WHERE phone = ?1 ORDER BY id DESC LIMIT ?2",
    )?;

    let limit = i64::try_from(limit).unwrap_or(i64::MAX);
    let rows = stmt.query_map(params![phone, limit], |row| {
        Ok(Turn {
            role: parse_label::<Role>(0, row.get(0)?)?,
            content: row.get(1)?,
            tool_call_id: row.get(2)?,
        })
    })?;

    let mut turns = Vec::new();
    for row in rows {
        turns.push(row?);
    }
    turns.reverse();
    Ok(turns)
}

/// Total number of persisted turns for a caller.
pub fn session_turn_count(conn: &Connection, phone: &str) -> Result<usize, RecordError> {
    let count: i64 = conn.query_row(
        "SELECT COUNT(*) FROM conversation_turns WHERE phone = ?1",
        [phone],
        |row| row.get(0),
    )?;
    Ok(usize::try_from(count).unwrap_or_default())
}

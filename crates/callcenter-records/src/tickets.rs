//! Support tickets.

use callcenter_types::TicketPriority;
use rusqlite::{params, Connection};
use serde::{Deserialize, Serialize};

use crate::error::RecordError;
use crate::parse_label;

/// A support ticket opened on behalf of a caller.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ticket {
    pub id: i64,
    pub phone: String,
    pub issue: String,
    pub priority: TicketPriority,
    pub status: String,
    pub created_at: String,
}

/// Opens a ticket and returns its id, which the agent reads out to the caller.
pub fn create_ticket(
    conn: &Connection,
    phone: &str,
    issue: &str,
    priority: TicketPriority,
) -> Result<i64, RecordError> {
    let id = conn.query_row(
        "INSERT INTO tickets (phone, issue, priority) VALUES (?1, ?2, ?3) RETURNING id",
        params![phone, issue, priority.as_str()],
        |row| row.get(0),
    )?;
    Ok(id)
}

/// Lists every ticket for a caller, newest first.
pub fn list_tickets(conn: &Connection, phone: &str) -> Result<Vec<Ticket>, RecordError> {
    let mut stmt = conn.prepare(
        "SELECT id, phone, issue, priority, status, created_at
         FROM tickets WHERE phone = ?1 ORDER BY id DESC",
    )?;

    let rows = stmt.query_map([phone], |row| {
        Ok(Ticket {
            id: row.get(0)?,
            phone: row.get(1)?,
            issue: row.get(2)?,
            priority: parse_label(3, row.get(3)?)?,
            status: row.get(4)?,
            created_at: row.get(5)?,
        })
    })?;

    let mut tickets = Vec::new();
    for row in rows {
        tickets.push(row?);
    }
    Ok(tickets)
}

//! Persistent records for the call center.
//!
//! Customer accounts, support tickets and per-caller conversation history,
//! all stored in SQLite. The free functions take a `&Connection` and are
//! usable from blocking code and tests; [`SqliteRecordStore`] wraps a pool
//! and exposes the same operations through the async [`AccountStore`] and
//! [`ConversationStore`] traits consumed by the agent and memory layers.
//!
//! Conversation turns are append-only: an exchange (caller turn followed by
//! agent turn) is written in a single transaction, so a reader never sees
//! half of it.

mod conversations;
mod customers;
mod error;
mod store;
mod tickets;

pub use conversations::{append_exchange, recent_turns, session_turn_count};
pub use customers::{get_customer, insert_customer, update_customer_status, Customer, NewCustomer};
pub use error::RecordError;
pub use store::{AccountStore, ConversationStore, SqliteRecordStore};
pub use tickets::{create_ticket, list_tickets, Ticket};

use callcenter_types::ParseLabelError;
use std::str::FromStr;

/// Parses a label column into one of the shared enums, reporting a
/// conversion failure for unknown values.
pub(crate) fn parse_label<T>(idx: usize, value: String) -> rusqlite::Result<T>
where
    T: FromStr<Err = ParseLabelError>,
{
    value.parse().map_err(|e: ParseLabelError| {
        rusqlite::Error::FromSqlConversionFailure(idx, rusqlite::types::Type::Text, Box::new(e))
    })
}

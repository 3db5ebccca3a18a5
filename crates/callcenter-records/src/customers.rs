//! Customer account records.

use callcenter_types::AccountStatus;
use rusqlite::{params, Connection, OptionalExtension, Row};
use serde::{Deserialize, Serialize};

use crate::error::RecordError;
use crate::parse_label;

const CUSTOMER_COLUMNS: &str = "id, phone, name, email, plan, status, balance, created_at";

/// A customer account, keyed by phone number.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Customer {
    pub id: i64,
    pub phone: String,
    pub name: String,
    pub email: Option<String>,
    pub plan: String,
    pub status: AccountStatus,
    pub balance: f64,
    /// Creation timestamp (SQLite `datetime('now')`, UTC).
    pub created_at: String,
}

impl Customer {
    /// First word of the account holder's name.
    pub fn first_name(&self) -> &str {
        self.name.split_whitespace().next().unwrap_or(&self.name)
    }
}

/// Parameters for creating a customer account.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewCustomer {
    pub phone: String,
    pub name: String,
    pub email: Option<String>,
    pub plan: String,
    pub status: AccountStatus,
    pub balance: f64,
}

fn map_row_to_customer(row: &Row) -> rusqlite::Result<Customer> {
    Ok(Customer {
        id: row.get(0)?,
        phone: row.get(1)?,
        name: row.get(2)?,
        email: row.get(3)?,
        plan: row.get(4)?,
        status: parse_label(5, row.get(5)?)?,
        balance: row.get(6)?,
        created_at: row.get(7)?,
    })
}

/// Creates a customer account and returns it.
pub fn insert_customer(conn: &Connection, new: &NewCustomer) -> Result<Customer, RecordError> {
    let customer = conn.query_row(
        &format!(
            "INSERT INTO customers (phone, name, email, plan, status, balance)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)
             RETURNING {CUSTOMER_COLUMNS}"
        ),
        params![
            new.phone,
            new.name,
            new.email,
            new.plan,
            new.status.as_str(),
            new.balance,
        ],
        map_row_to_customer,
    )?;
    Ok(customer)
}

/// Looks up a customer by phone number. Returns `None` when unknown.
pub fn get_customer(conn: &Connection, phone: &str) -> Result<Option<Customer>, RecordError> {
    let customer = conn
        .query_row(
            &format!("SELECT {CUSTOMER_COLUMNS} FROM customers WHERE phone = ?1"),
            [phone],
            map_row_to_customer,
        )
        .optional()?;
    Ok(customer)
}

/// Changes a customer's account status in one statement and returns the
/// updated record, or `None` if no customer has that phone number.
pub fn update_customer_status(
    conn: &Connection,
    phone: &str,
    status: AccountStatus,
) -> Result<Option<Customer>, RecordError> {
    let customer = conn
        .query_row(
            &format!(
                "UPDATE customers SET status = ?1 WHERE phone = ?2
                 RETURNING {CUSTOMER_COLUMNS}"
            ),
            params![status.as_str(), phone],
            map_row_to_customer,
        )
        .optional()?;
    Ok(customer)
}

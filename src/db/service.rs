use chrono::{DateTime, Utc};
use duckdb::{params, Connection, Result as DbResult, Row};
use uuid::Uuid;

use crate::store::{StoreError, Ticket, TicketStatus};

const TICKET_COLUMNS: &str =
    "id, user_name, email, category, priority, status, title, description, created_at, updated_at";

/// Raw column values; converted to a [`Ticket`] outside the driver callback
/// so parse failures surface as [`StoreError::Corrupt`].
struct TicketRow {
    id: String,
    user_name: String,
    email: String,
    category: String,
    priority: String,
    status: String,
    title: String,
    description: String,
    created_at: String,
    updated_at: Option<String>,
}

pub struct DbService;

impl DbService {
    fn read_row(row: &Row) -> DbResult<TicketRow> {
        Ok(TicketRow {
            id: row.get(0)?,
            user_name: row.get(1)?,
            email: row.get(2)?,
            category: row.get(3)?,
            priority: row.get(4)?,
            status: row.get(5)?,
            title: row.get(6)?,
            description: row.get(7)?,
            created_at: row.get(8)?,
            updated_at: row.get(9)?,
        })
    }

    fn into_ticket(row: TicketRow) -> Result<Ticket, StoreError> {
        let corrupt = |what: &str, e: &dyn std::fmt::Display| {
            StoreError::Corrupt(format!("ticket {}: bad {}: {}", row.id, what, e))
        };

        Ok(Ticket {
            id: row.id.parse::<Uuid>().map_err(|e| corrupt("id", &e))?,
            category: row.category.parse().map_err(|e| corrupt("category", &e))?,
            priority: row.priority.parse().map_err(|e| corrupt("priority", &e))?,
            status: row.status.parse().map_err(|e| corrupt("status", &e))?,
            created_at: parse_timestamp(&row.created_at).map_err(|e| corrupt("created_at", &e))?,
            updated_at: row
                .updated_at
                .as_deref()
                .map(parse_timestamp)
                .transpose()
                .map_err(|e| corrupt("updated_at", &e))?,
            user_name: row.user_name,
            email: row.email,
            title: row.title,
            description: row.description,
        })
    }

    fn collect(rows: impl Iterator<Item = DbResult<TicketRow>>) -> Result<Vec<Ticket>, StoreError> {
        let mut tickets = Vec::new();
        for row in rows {
            tickets.push(Self::into_ticket(row?)?);
        }
        Ok(tickets)
    }

    pub fn insert_ticket(conn: &Connection, ticket: &Ticket) -> DbResult<()> {
        conn.execute(
            "INSERT INTO tickets (id, user_name, email, category, priority, status, title, description, created_at, updated_at)
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
            params![
                ticket.id.to_string(),
                ticket.user_name,
                ticket.email,
                ticket.category.as_str(),
                ticket.priority.as_str(),
                ticket.status.as_str(),
                ticket.title,
                ticket.description,
                ticket.created_at.to_rfc3339(),
                ticket.updated_at.map(|t| t.to_rfc3339()),
            ],
        )?;
        Ok(())
    }

    pub fn update_ticket_status(conn: &Connection, ticket: &Ticket) -> DbResult<usize> {
        conn.execute(
            "UPDATE tickets SET status = ?, updated_at = ? WHERE id = ?",
            params![
                ticket.status.as_str(),
                ticket.updated_at.map(|t| t.to_rfc3339()),
                ticket.id.to_string(),
            ],
        )
    }

    pub fn get_ticket(conn: &Connection, id: Uuid) -> Result<Option<Ticket>, StoreError> {
        let mut stmt = conn.prepare(&format!("SELECT {TICKET_COLUMNS} FROM tickets WHERE id = ?"))?;
        let mut rows = stmt.query_map(params![id.to_string()], Self::read_row)?;

        match rows.next() {
            Some(row) => Ok(Some(Self::into_ticket(row?)?)),
            None => Ok(None),
        }
    }

    pub fn list_tickets(conn: &Connection, status: Option<TicketStatus>) -> Result<Vec<Ticket>, StoreError> {
        match status {
            Some(status) => {
                let mut stmt = conn.prepare(&format!(
                    "SELECT {TICKET_COLUMNS} FROM tickets WHERE status = ? ORDER BY seq ASC"
                ))?;
                let rows = stmt.query_map(params![status.as_str()], Self::read_row)?;
                Self::collect(rows)
            }
            None => {
                let mut stmt = conn.prepare(&format!("SELECT {TICKET_COLUMNS} FROM tickets ORDER BY seq ASC"))?;
                let rows = stmt.query_map([], Self::read_row)?;
                Self::collect(rows)
            }
        }
    }
}

fn parse_timestamp(raw: &str) -> Result<DateTime<Utc>, chrono::ParseError> {
    DateTime::parse_from_rfc3339(raw).map(|t| t.with_timezone(&Utc))
}

pub mod memory;

pub use memory::MemoryTicketStore;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;
use uuid::Uuid;

use crate::protocol::{Category, Priority, TicketDraft, UnknownVariant};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TicketStatus {
    Backlog,
    InProgress,
    Resolved,
}

impl TicketStatus {
    /// Kanban column order.
    pub const ALL: [TicketStatus; 3] = [
        TicketStatus::Backlog,
        TicketStatus::InProgress,
        TicketStatus::Resolved,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Backlog => "backlog",
            Self::InProgress => "in-progress",
            Self::Resolved => "resolved",
        }
    }
}

impl fmt::Display for TicketStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TicketStatus {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|status| status.as_str() == s.trim())
            .ok_or_else(|| UnknownVariant::new("status", s))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Ticket {
    pub id: Uuid,
    pub user_name: String,
    pub email: String,
    pub category: Category,
    pub priority: Priority,
    pub status: TicketStatus,
    pub title: String,
    pub description: String,
    pub created_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

impl Ticket {
    /// Materializes an accepted draft as a fresh backlog ticket.
    pub fn from_draft(draft: TicketDraft) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            user_name: draft.user_name,
            email: draft.email,
            category: draft.category,
            priority: draft.priority,
            status: TicketStatus::Backlog,
            title: draft.title,
            description: draft.description,
            created_at: now,
            updated_at: Some(now),
        }
    }

    /// Applies a status change; `updated_at` never precedes `created_at`,
    /// even if the wall clock stepped backwards.
    pub fn set_status(&mut self, status: TicketStatus) {
        self.status = status;
        self.updated_at = Some(Utc::now().max(self.created_at));
    }
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Database error: {0}")]
    Database(#[from] duckdb::Error),
    #[error("Ticket store lock poisoned")]
    Poisoned,
    #[error("Corrupt ticket row: {0}")]
    Corrupt(String),
}

/// The ticket collection shared by chat sessions, the HTTP surface and the
/// dashboard. Implementations serialize their own writes.
pub trait TicketStore: Send + Sync {
    fn create(&self, draft: TicketDraft) -> Result<Ticket, StoreError>;

    /// Moves a ticket to `status`. Returns `false` (and changes nothing) when
    /// no ticket has that id.
    fn update_status(&self, id: Uuid, status: TicketStatus) -> Result<bool, StoreError>;

    fn get(&self, id: Uuid) -> Result<Option<Ticket>, StoreError>;

    /// All tickets in insertion order.
    fn list(&self) -> Result<Vec<Ticket>, StoreError>;

    fn list_by_status(&self, status: TicketStatus) -> Result<Vec<Ticket>, StoreError> {
        Ok(self
            .list()?
            .into_iter()
            .filter(|t| t.status == status)
            .collect())
    }

    /// Distinct categories in use, first-seen order.
    fn categories(&self) -> Result<Vec<Category>, StoreError> {
        let mut seen = Vec::new();
        for ticket in self.list()? {
            if !seen.contains(&ticket.category) {
                seen.push(ticket.category);
            }
        }
        Ok(seen)
    }
}

//! Read model for the kanban triage board.

use serde::Serialize;
use tracing::{debug, info};
use uuid::Uuid;

use crate::protocol::Category;
use crate::store::{StoreError, Ticket, TicketStatus, TicketStore};

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Column {
    pub status: TicketStatus,
    pub title: &'static str,
    pub tickets: Vec<Ticket>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardStats {
    pub total: usize,
    pub backlog: usize,
    pub in_progress: usize,
    pub resolved: usize,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Board {
    pub columns: Vec<Column>,
    pub stats: DashboardStats,
    pub categories: Vec<Category>,
}

fn column_title(status: TicketStatus) -> &'static str {
    match status {
        TicketStatus::Backlog => "Backlog",
        TicketStatus::InProgress => "In Progress",
        TicketStatus::Resolved => "Resolved",
    }
}

impl Board {
    /// Snapshots the store into three columns, insertion order within each.
    pub fn load(store: &dyn TicketStore) -> Result<Self, StoreError> {
        let tickets = store.list()?;
        let stats = DashboardStats::from_tickets(&tickets);

        let categories = store.categories()?;

        let columns = TicketStatus::ALL
            .into_iter()
            .map(|status| Column {
                status,
                title: column_title(status),
                tickets: tickets.iter().filter(|t| t.status == status).cloned().collect(),
            })
            .collect();

        Ok(Self {
            columns,
            stats,
            categories,
        })
    }

    pub fn column(&self, status: TicketStatus) -> Option<&Column> {
        self.columns.iter().find(|c| c.status == status)
    }
}

impl DashboardStats {
    pub fn from_tickets(tickets: &[Ticket]) -> Self {
        tickets.iter().fold(
            Self {
                total: tickets.len(),
                ..Self::default()
            },
            |mut stats, ticket| {
                match ticket.status {
                    TicketStatus::Backlog => stats.backlog += 1,
                    TicketStatus::InProgress => stats.in_progress += 1,
                    TicketStatus::Resolved => stats.resolved += 1,
                }
                stats
            },
        )
    }
}

/// Drop handler: a card released over a column moves to that column's status.
pub fn move_ticket(store: &dyn TicketStore, id: Uuid, to: TicketStatus) -> Result<bool, StoreError> {
    let moved = store.update_status(id, to)?;
    if moved {
        info!("Ticket {} moved to {}", id, to);
    } else {
        debug!("Drop on {} for unknown ticket {} ignored", to, id);
    }
    Ok(moved)
}

pub mod connection;
pub mod service;

pub use connection::{get_connection, open_in_memory, DbPool};

use tracing::debug;
use uuid::Uuid;

use crate::protocol::TicketDraft;
use crate::store::{StoreError, Ticket, TicketStatus, TicketStore};
use service::DbService;

/// [`TicketStore`] backed by a DuckDB file. The connection mutex is the
/// single mutation queue for every session sharing the store.
pub struct DuckDbTicketStore {
    pool: DbPool,
}

impl DuckDbTicketStore {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

impl TicketStore for DuckDbTicketStore {
    fn create(&self, draft: TicketDraft) -> Result<Ticket, StoreError> {
        let ticket = Ticket::from_draft(draft);
        let conn = self.pool.lock().map_err(|_| StoreError::Poisoned)?;
        DbService::insert_ticket(&conn, &ticket)?;
        Ok(ticket)
    }

    fn update_status(&self, id: Uuid, status: TicketStatus) -> Result<bool, StoreError> {
        let conn = self.pool.lock().map_err(|_| StoreError::Poisoned)?;
        let Some(mut ticket) = DbService::get_ticket(&conn, id)? else {
            debug!("Status change for unknown ticket {} ignored", id);
            return Ok(false);
        };
        ticket.set_status(status);
        DbService::update_ticket_status(&conn, &ticket)?;
        Ok(true)
    }

    fn get(&self, id: Uuid) -> Result<Option<Ticket>, StoreError> {
        let conn = self.pool.lock().map_err(|_| StoreError::Poisoned)?;
        DbService::get_ticket(&conn, id)
    }

    fn list(&self) -> Result<Vec<Ticket>, StoreError> {
        let conn = self.pool.lock().map_err(|_| StoreError::Poisoned)?;
        DbService::list_tickets(&conn, None)
    }

    fn list_by_status(&self, status: TicketStatus) -> Result<Vec<Ticket>, StoreError> {
        let conn = self.pool.lock().map_err(|_| StoreError::Poisoned)?;
        DbService::list_tickets(&conn, Some(status))
    }
}

use std::sync::Mutex;
use uuid::Uuid;

use crate::protocol::TicketDraft;
use crate::store::{StoreError, Ticket, TicketStatus, TicketStore};

/// Process-local store; the default backend and the one tests use.
#[derive(Default)]
pub struct MemoryTicketStore {
    tickets: Mutex<Vec<Ticket>>,
}

impl MemoryTicketStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl TicketStore for MemoryTicketStore {
    fn create(&self, draft: TicketDraft) -> Result<Ticket, StoreError> {
        let ticket = Ticket::from_draft(draft);
        let mut tickets = self.tickets.lock().map_err(|_| StoreError::Poisoned)?;
        tickets.push(ticket.clone());
        Ok(ticket)
    }

    fn update_status(&self, id: Uuid, status: TicketStatus) -> Result<bool, StoreError> {
        let mut tickets = self.tickets.lock().map_err(|_| StoreError::Poisoned)?;
        match tickets.iter_mut().find(|t| t.id == id) {
            Some(ticket) => {
                ticket.set_status(status);
                Ok(true)
            }
            None => Ok(false),
        }
    }

    fn get(&self, id: Uuid) -> Result<Option<Ticket>, StoreError> {
        let tickets = self.tickets.lock().map_err(|_| StoreError::Poisoned)?;
        Ok(tickets.iter().find(|t| t.id == id).cloned())
    }

    fn list(&self) -> Result<Vec<Ticket>, StoreError> {
        let tickets = self.tickets.lock().map_err(|_| StoreError::Poisoned)?;
        Ok(tickets.clone())
    }
}

pub mod api;
pub mod cli;
pub mod config;
pub mod dashboard;
pub mod db;
pub mod llm;
pub mod protocol;
pub mod session;
pub mod store;

use std::sync::Arc;

use crate::config::{DatabaseConfig, StoreBackend};
use store::{MemoryTicketStore, StoreError, TicketStore};

/// Opens the ticket store selected by `database.backend`.
pub fn open_store(config: &DatabaseConfig) -> Result<Arc<dyn TicketStore>, StoreError> {
    match config.backend {
        StoreBackend::Memory => Ok(Arc::new(MemoryTicketStore::new())),
        StoreBackend::Duckdb => {
            let pool = db::get_connection(config)?;
            Ok(Arc::new(db::DuckDbTicketStore::new(pool)))
        }
    }
}

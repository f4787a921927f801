use crate::config::DatabaseConfig;
use duckdb::{Connection, Result as DbResult};
use std::sync::{Arc, Mutex};
use tracing::info;

pub type DbPool = Arc<Mutex<Connection>>;

// `seq` carries insertion order; timestamps are stored as RFC 3339 text so
// they round-trip without the driver's chrono feature.
pub(crate) const SCHEMA: &str = r#"
CREATE SEQUENCE IF NOT EXISTS seq_tickets;

CREATE TABLE IF NOT EXISTS tickets (
    id VARCHAR PRIMARY KEY,
    seq BIGINT NOT NULL DEFAULT nextval('seq_tickets'),
    user_name VARCHAR NOT NULL,
    email VARCHAR NOT NULL,
    category VARCHAR NOT NULL,
    priority VARCHAR NOT NULL,
    status VARCHAR NOT NULL,
    title VARCHAR NOT NULL,
    description TEXT NOT NULL,
    created_at VARCHAR NOT NULL,
    updated_at VARCHAR
);
"#;

pub fn get_connection(config: &DatabaseConfig) -> DbResult<DbPool> {
    info!("Connecting to DuckDB at {}", config.path);
    let conn = Connection::open(&config.path)?;

    init_schema(&conn)?;

    Ok(Arc::new(Mutex::new(conn)))
}

pub fn open_in_memory() -> DbResult<DbPool> {
    let conn = Connection::open_in_memory()?;
    init_schema(&conn)?;
    Ok(Arc::new(Mutex::new(conn)))
}

fn init_schema(conn: &Connection) -> DbResult<()> {
    info!("Initializing ticket schema");
    conn.execute_batch(SCHEMA)?;
    Ok(())
}

//! Database migrations.

use rusqlite::Connection;
use rusqlite_migration::{Migrations, M};

use crate::error::{StoreError, StoreResult};

/// SQL schema definition.
const SCHEMA: &str = include_str!("schema.sql");

/// Bring the connection's schema up to date.
pub fn run_migrations(conn: &mut Connection) -> StoreResult<()> {
    let migrations = Migrations::new(vec![M::up(SCHEMA)]);

    migrations
        .to_latest(conn)
        .map_err(|e| StoreError::Migration(e.to_string()))
}

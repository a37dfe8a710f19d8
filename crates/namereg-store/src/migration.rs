//! Database schema migrations for SQLite.
//!
//! Each migration transforms the schema from version N to N+1. All pending
//! migrations run in a single transaction.

use rusqlite::Connection;

use crate::error::{Result, StoreError};

/// Current schema version.
pub const CURRENT_VERSION: u32 = 1;

/// Initialize or migrate the database schema.
///
/// Idempotent: running it against an up-to-date database does nothing.
pub fn migrate(conn: &mut Connection) -> Result<()> {
    conn.execute(
        "CREATE TABLE IF NOT EXISTS schema_migrations (
            version INTEGER PRIMARY KEY,
            applied_at INTEGER NOT NULL DEFAULT (CAST(strftime('%s', 'now') AS INTEGER))
        )",
        [],
    )?;

    let current: u32 = conn.query_row(
        "SELECT COALESCE(MAX(version), 0) FROM schema_migrations",
        [],
        |row| row.get(0),
    )?;

    if current > CURRENT_VERSION {
        return Err(StoreError::Migration(format!(
            "database schema version {} is newer than supported version {}",
            current, CURRENT_VERSION
        )));
    }

    if current < CURRENT_VERSION {
        let tx = conn.transaction()?;

        for version in (current + 1)..=CURRENT_VERSION {
            apply_migration(&tx, version)?;
            tx.execute(
                "INSERT INTO schema_migrations (version) VALUES (?1)",
                rusqlite::params![version],
            )?;
            tracing::debug!(version, "applied schema migration");
        }

        tx.commit()?;
    }

    Ok(())
}

fn apply_migration(conn: &Connection, version: u32) -> Result<()> {
    match version {
        1 => apply_v1(conn),
        _ => Err(StoreError::Migration(format!(
            "unknown migration version: {}",
            version
        ))),
    }
}

/// Migration v1: domains and the owner index.
fn apply_v1(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        r#"
        -- One row per key. Expired rows stay until the key is registered again.
        CREATE TABLE domains (
            name_key BLOB PRIMARY KEY,        -- 32 bytes, Blake3 of normalized name
            name TEXT NOT NULL,               -- as supplied by the registrant
            owner BLOB NOT NULL,              -- 32 bytes, Ed25519 public key
            created_at INTEGER NOT NULL,      -- unix seconds
            expires_at INTEGER NOT NULL,      -- unix seconds, exclusive
            bio TEXT,
            address TEXT,
            inserted_seq INTEGER NOT NULL     -- insertion order for listings
        );

        -- Owner -> assigned keys. Tracks assignments, not liveness.
        CREATE TABLE owner_index (
            owner BLOB NOT NULL,
            name_key BLOB NOT NULL,
            PRIMARY KEY (owner, name_key)
        );

        CREATE INDEX idx_domains_expires_at ON domains(expires_at);
        CREATE INDEX idx_domains_owner ON domains(owner);
        CREATE INDEX idx_owner_index_name_key ON owner_index(name_key);
        "#,
    )?;

    Ok(())
}

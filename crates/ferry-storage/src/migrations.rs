//! Schema migrations
//!
//! The schema version lives in SQLite's `user_version` pragma. Each entry in
//! `MIGRATIONS` moves the schema up by one version.

use crate::error::StorageError;
use crate::Result;
use rusqlite::Connection;

type Migration = fn(&Connection) -> Result<()>;

const MIGRATIONS: &[(&str, Migration)] = &[("visit history and settings", migrate_v1)];

pub(crate) fn schema_version() -> i64 {
    MIGRATIONS.len() as i64
}

pub fn run_migrations(conn: &Connection) -> Result<()> {
    let current: i64 = conn.pragma_query_value(None, "user_version", |row| row.get(0))?;
    let target = schema_version();

    if current > target {
        return Err(StorageError::Migration(format!(
            "database schema v{} is newer than supported v{}",
            current, target
        )));
    }

    for (index, (name, migrate)) in MIGRATIONS.iter().enumerate().skip(current as usize) {
        let version = index as i64 + 1;
        tracing::info!(version, migration = *name, "Applying schema migration");

        migrate(conn)
            .map_err(|e| StorageError::Migration(format!("v{} ({}): {}", version, name, e)))?;
        conn.pragma_update(None, "user_version", version)?;
    }

    Ok(())
}

fn migrate_v1(conn: &Connection) -> Result<()> {
    // One row per distinct URL; re-visits bump visited_at instead of adding rows.
    conn.execute_batch(
        r#"
        CREATE TABLE IF NOT EXISTS visits (
            url TEXT PRIMARY KEY,
            title TEXT NOT NULL DEFAULT '',
            visited_at TEXT NOT NULL
        );
        CREATE INDEX IF NOT EXISTS idx_visits_visited ON visits(visited_at);

        CREATE TABLE IF NOT EXISTS settings (
            key TEXT PRIMARY KEY,
            value TEXT NOT NULL,
            updated_at TEXT NOT NULL
        );
        "#,
    )?;
    Ok(())
}

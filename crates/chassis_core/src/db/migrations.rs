//! SQLite migration plan executor.
//!
//! # Responsibility
//! - Apply a caller-supplied migration plan atomically.
//! - Mirror the applied version to `PRAGMA user_version`.
//!
//! # Invariants
//! - Plan `version` values must be strictly increasing.
//! - A database at a newer version than the plan is rejected, never
//!   downgraded.

use crate::db::{DbError, DbResult};
use rusqlite::Connection;

/// One schema step of a migration plan.
///
/// The scaffolding core does not own any schema; consuming applications
/// declare their tables as an ordered plan and hand it to the data context
/// on open.
#[derive(Debug, Clone, Copy)]
pub struct Migration {
    /// Strictly increasing schema version this step produces.
    pub version: u32,
    /// Batch of SQL statements executed for this step.
    pub sql: &'static str,
}

/// Returns the newest version a migration plan produces.
pub fn latest_version(migrations: &[Migration]) -> u32 {
    migrations.last().map_or(0, |migration| migration.version)
}

/// Applies all pending steps of the plan on the provided connection.
pub fn apply_migrations(conn: &mut Connection, migrations: &[Migration]) -> DbResult<()> {
    let mut previous = 0;
    for migration in migrations {
        if migration.version <= previous {
            return Err(DbError::MigrationOrder {
                previous,
                next: migration.version,
            });
        }
        previous = migration.version;
    }

    let current_version = current_user_version(conn)?;
    let latest = latest_version(migrations);

    if current_version > latest {
        return Err(DbError::UnsupportedSchemaVersion {
            db_version: current_version,
            latest_supported: latest,
        });
    }

    if current_version == latest {
        return Ok(());
    }

    let tx = conn.transaction()?;
    for migration in migrations {
        if migration.version <= current_version {
            continue;
        }

        tx.execute_batch(migration.sql)?;
        tx.execute_batch(&format!("PRAGMA user_version = {};", migration.version))?;
    }
    tx.commit()?;

    Ok(())
}

fn current_user_version(conn: &Connection) -> DbResult<u32> {
    let version = conn.query_row("PRAGMA user_version;", [], |row| row.get::<_, u32>(0))?;
    Ok(version)
}

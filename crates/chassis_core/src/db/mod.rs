//! SQLite data-context bootstrap, staging and schema migration entry points.
//!
//! # Responsibility
//! - Open and configure SQLite connections for the scaffolding core.
//! - Track staged mutations and commit them as one transaction.
//! - Apply caller-supplied schema migrations in deterministic order.
//!
//! # Invariants
//! - Migration version is tracked via `PRAGMA user_version`.
//! - Repository code must not read/write application data before
//!   migrations succeed.
//! - A released connection is never touched again.

use std::error::Error;
use std::fmt::{Display, Formatter};

pub mod context;
pub mod migrations;

pub type DbResult<T> = Result<T, DbError>;

#[derive(Debug)]
pub enum DbError {
    Sqlite(rusqlite::Error),
    Io(std::io::Error),
    UnsupportedSchemaVersion {
        db_version: u32,
        latest_supported: u32,
    },
    MigrationOrder {
        previous: u32,
        next: u32,
    },
    Disposed,
}

impl Display for DbError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Sqlite(err) => write!(f, "{err}"),
            Self::Io(err) => write!(f, "{err}"),
            Self::UnsupportedSchemaVersion {
                db_version,
                latest_supported,
            } => write!(
                f,
                "database schema version {db_version} is newer than supported {latest_supported}"
            ),
            Self::MigrationOrder { previous, next } => write!(
                f,
                "migration versions must be strictly increasing, got {next} after {previous}"
            ),
            Self::Disposed => write!(f, "data context is disposed"),
        }
    }
}

impl Error for DbError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Sqlite(err) => Some(err),
            Self::Io(err) => Some(err),
            Self::UnsupportedSchemaVersion { .. } => None,
            Self::MigrationOrder { .. } => None,
            Self::Disposed => None,
        }
    }
}

impl From<rusqlite::Error> for DbError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Sqlite(value)
    }
}

//! Owned data context: connection bootstrap, staging and scoped release.
//!
//! # Responsibility
//! - Open file or in-memory SQLite connections with required pragmas.
//! - Hold staged mutations in one open transaction until `save_changes`.
//! - Release the connection exactly once, rolling back unsaved work.
//!
//! # Invariants
//! - Returned contexts have `foreign_keys=ON` and migrations fully applied.
//! - `save_changes` reports exactly the mutations staged since the last
//!   commit.
//! - Every access after disposal fails with `DbError::Disposed`.

use crate::config::StoreConfig;
use crate::db::migrations::{apply_migrations, Migration};
use crate::db::{DbError, DbResult};
use log::{error, info, warn};
use parking_lot::Mutex;
use rusqlite::Connection;
use std::path::Path;
use std::sync::Arc;
use std::time::{Duration, Instant};

const DEFAULT_BUSY_TIMEOUT: Duration = Duration::from_secs(5);

struct ContextState {
    conn: Option<Connection>,
    in_tx: bool,
    staged: usize,
}

pub(crate) struct ContextInner {
    state: Mutex<ContextState>,
}

/// Stateful handle to the underlying store: one connection plus the count
/// of staged, not yet committed mutations.
///
/// A context is owned by exactly one unit of work; repositories reach it
/// through internal handles that cannot release it.
pub struct DataContext {
    inner: Arc<ContextInner>,
}

impl std::fmt::Debug for DataContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DataContext").finish_non_exhaustive()
    }
}

/// Internal accessor cloned into repositories.
///
/// A handle can execute reads and stage mutations but can never commit or
/// release the connection.
#[derive(Clone)]
pub(crate) struct ContextHandle {
    inner: Arc<ContextInner>,
}

impl DataContext {
    /// Opens a SQLite database file and applies the migration plan.
    ///
    /// # Side effects
    /// - Performs connection bootstrap and migration checks.
    /// - Emits `db_open` logging events with duration and status.
    pub fn open(path: impl AsRef<Path>, migrations: &[Migration]) -> DbResult<Self> {
        Self::open_file(path.as_ref(), DEFAULT_BUSY_TIMEOUT, migrations)
    }

    /// Opens an in-memory SQLite database and applies the migration plan.
    ///
    /// # Side effects
    /// - Performs connection bootstrap and migration checks.
    /// - Emits `db_open` logging events with duration and status.
    pub fn open_in_memory(migrations: &[Migration]) -> DbResult<Self> {
        let started_at = Instant::now();
        info!("event=db_open module=db status=start mode=memory");

        let conn = match Connection::open_in_memory() {
            Ok(conn) => conn,
            Err(err) => {
                error!(
                    "event=db_open module=db status=error mode=memory duration_ms={} error_code=db_open_failed error={}",
                    started_at.elapsed().as_millis(),
                    err
                );
                return Err(err.into());
            }
        };

        Self::bootstrap(conn, DEFAULT_BUSY_TIMEOUT, migrations, "memory", started_at)
    }

    /// Opens the store described by a [`StoreConfig`].
    ///
    /// A configured path opens a file-backed store, creating parent
    /// directories as needed; no path means in-memory.
    pub fn from_config(config: &StoreConfig, migrations: &[Migration]) -> DbResult<Self> {
        let Some(path) = config.db_path.as_ref() else {
            return Self::open_in_memory(migrations);
        };

        if let Some(parent) = path.parent() {
            if let Err(err) = std::fs::create_dir_all(parent) {
                error!(
                    "event=db_open module=db status=error mode=file error_code=db_dir_failed error={err}"
                );
                return Err(DbError::Io(err));
            }
        }

        Self::open_file(path, Duration::from_millis(config.busy_timeout_ms), migrations)
    }

    fn open_file(path: &Path, busy_timeout: Duration, migrations: &[Migration]) -> DbResult<Self> {
        let started_at = Instant::now();
        info!("event=db_open module=db status=start mode=file");

        let conn = match Connection::open(path) {
            Ok(conn) => conn,
            Err(err) => {
                error!(
                    "event=db_open module=db status=error mode=file duration_ms={} error_code=db_open_failed error={}",
                    started_at.elapsed().as_millis(),
                    err
                );
                return Err(err.into());
            }
        };

        Self::bootstrap(conn, busy_timeout, migrations, "file", started_at)
    }

    fn bootstrap(
        mut conn: Connection,
        busy_timeout: Duration,
        migrations: &[Migration],
        mode: &str,
        started_at: Instant,
    ) -> DbResult<Self> {
        let bootstrapped = (|| -> DbResult<()> {
            conn.execute_batch("PRAGMA foreign_keys = ON;")?;
            conn.busy_timeout(busy_timeout)?;
            apply_migrations(&mut conn, migrations)?;
            Ok(())
        })();

        match bootstrapped {
            Ok(()) => {
                info!(
                    "event=db_open module=db status=ok mode={mode} duration_ms={}",
                    started_at.elapsed().as_millis()
                );
                Ok(Self {
                    inner: Arc::new(ContextInner {
                        state: Mutex::new(ContextState {
                            conn: Some(conn),
                            in_tx: false,
                            staged: 0,
                        }),
                    }),
                })
            }
            Err(err) => {
                error!(
                    "event=db_open module=db status=error mode={mode} duration_ms={} error_code=db_bootstrap_failed error={}",
                    started_at.elapsed().as_millis(),
                    err
                );
                Err(err)
            }
        }
    }

    pub(crate) fn handle(&self) -> ContextHandle {
        ContextHandle {
            inner: Arc::clone(&self.inner),
        }
    }

    /// Returns whether the owned connection has been released.
    pub fn is_disposed(&self) -> bool {
        self.inner.state.lock().conn.is_none()
    }

    /// Commits every staged mutation in one transaction and returns how
    /// many were applied.
    ///
    /// With nothing staged this is a no-op returning 0. Commit failures
    /// propagate unchanged and leave the transaction open.
    pub fn save_changes(&self) -> DbResult<usize> {
        let mut guard = self.inner.state.lock();
        let state = &mut *guard;
        let conn = state.conn.as_ref().ok_or(DbError::Disposed)?;

        if state.in_tx {
            conn.execute_batch("COMMIT;")?;
            state.in_tx = false;
        }

        let applied = state.staged;
        state.staged = 0;
        Ok(applied)
    }

    /// Releases the connection, rolling back any uncommitted transaction.
    ///
    /// Idempotent: the first call releases, later calls are no-ops.
    pub fn dispose(&self) {
        let mut guard = self.inner.state.lock();
        let state = &mut *guard;
        let Some(conn) = state.conn.take() else {
            return;
        };

        if state.in_tx {
            if let Err(err) = conn.execute_batch("ROLLBACK;") {
                warn!("event=db_dispose module=db status=rollback_failed error={err}");
            }
            state.in_tx = false;
            state.staged = 0;
        }

        if let Err((leaked, err)) = conn.close() {
            warn!("event=db_dispose module=db status=close_failed error={err}");
            drop(leaked);
        } else {
            info!("event=db_dispose module=db status=ok");
        }
    }
}

impl ContextHandle {
    /// Runs a read-only closure against the live connection.
    pub(crate) fn read<R, E>(&self, f: impl FnOnce(&Connection) -> Result<R, E>) -> Result<R, E>
    where
        E: From<DbError>,
    {
        let guard = self.inner.state.lock();
        let conn = guard.conn.as_ref().ok_or(DbError::Disposed)?;
        f(conn)
    }

    /// Runs a mutating closure inside the context transaction, opening it
    /// lazily on the first staged mutation.
    ///
    /// The closure reports how many rows it staged; failures leave the
    /// staged count untouched.
    pub(crate) fn stage<R, E>(
        &self,
        f: impl FnOnce(&Connection) -> Result<(usize, R), E>,
    ) -> Result<R, E>
    where
        E: From<DbError>,
    {
        let mut guard = self.inner.state.lock();
        let state = &mut *guard;
        let conn = state.conn.as_ref().ok_or(DbError::Disposed)?;

        if !state.in_tx {
            conn.execute_batch("BEGIN DEFERRED;")
                .map_err(|err| E::from(DbError::Sqlite(err)))?;
            state.in_tx = true;
        }

        let (rows, value) = f(conn)?;
        state.staged += rows;
        Ok(value)
    }
}

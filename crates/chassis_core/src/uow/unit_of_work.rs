//! Unit of work: repository factory and transactional boundary.
//!
//! # Responsibility
//! - Lazily construct and cache one repository per entity type.
//! - Commit all staged changes across repositories in one call.
//!
//! # Invariants
//! - Two lookups for the same entity type return the identical repository
//!   instance for the lifetime of this unit of work.
//! - Disposal is idempotent and also runs on drop, rolling back unsaved
//!   work.

use crate::db::context::DataContext;
use crate::db::{DbError, DbResult};
use crate::repo::generic_repo::{Persisted, RepoError, RepoResult, SqliteRepository};
use log::info;
use std::any::{Any, TypeId};
use std::collections::HashMap;

/// Transactional scope owning one data context and a cache of repositories.
///
/// One unit of work serves one logical caller; the repository cache relies
/// on `&mut` access instead of internal locking.
pub struct UnitOfWork {
    ctx: DataContext,
    repositories: HashMap<TypeId, Box<dyn Any + Send>>,
}

impl UnitOfWork {
    /// Takes exclusive ownership of the data context.
    pub fn new(ctx: DataContext) -> Self {
        Self {
            ctx,
            repositories: HashMap::new(),
        }
    }

    /// Returns the repository for `T`, constructing and caching it on
    /// first access.
    ///
    /// # Side effects
    /// - Emits a `repository_created` logging event on first access per
    ///   type.
    pub fn repository<T: Persisted>(&mut self) -> RepoResult<&SqliteRepository<T>> {
        if self.ctx.is_disposed() {
            return Err(RepoError::Db(DbError::Disposed));
        }

        let key = TypeId::of::<T>();
        if !self.repositories.contains_key(&key) {
            let repo = SqliteRepository::<T>::try_new(self.ctx.handle())?;
            self.repositories.insert(key, Box::new(repo));
            info!(
                "event=repository_created module=uow status=ok entity={}",
                T::TABLE
            );
        }

        self.repositories
            .get(&key)
            .and_then(|repo| repo.downcast_ref::<SqliteRepository<T>>())
            .ok_or_else(|| {
                RepoError::InvalidData(format!(
                    "repository registry holds a foreign instance for `{}`",
                    T::TABLE
                ))
            })
    }

    /// Commits the staged changes of every repository obtained from this
    /// unit of work and returns the number of affected records.
    ///
    /// # Side effects
    /// - Emits a `save` logging event with the affected-record count.
    pub fn save(&self) -> DbResult<usize> {
        let rows_affected = self.ctx.save_changes()?;
        info!("event=save module=uow status=ok rows_affected={rows_affected}");
        Ok(rows_affected)
    }

    /// Returns whether this unit of work has released its context.
    pub fn is_disposed(&self) -> bool {
        self.ctx.is_disposed()
    }

    /// Releases the owned context, rolling back any unsaved changes.
    ///
    /// Idempotent; the cache is cleared so stale repositories cannot be
    /// handed out again.
    pub fn dispose(&mut self) {
        self.ctx.dispose();
        self.repositories.clear();
    }
}

impl Drop for UnitOfWork {
    fn drop(&mut self) {
        self.ctx.dispose();
    }
}

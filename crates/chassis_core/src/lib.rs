//! Generic CRUD scaffolding core for layered business applications.
//! This crate is the single source of truth for repository, unit-of-work
//! and application-service contracts.

pub mod config;
pub mod db;
pub mod logging;
pub mod model;
pub mod repo;
pub mod service;
pub mod uow;

pub use config::{load_config, StoreConfig};
pub use db::context::DataContext;
pub use db::migrations::{apply_migrations, latest_version, Migration};
pub use db::{DbError, DbResult};
pub use logging::{default_log_level, init_logging, logging_status};
pub use model::dto::Dto;
pub use model::entity::{Entity, EntityId};
pub use model::mapper::Mapper;
pub use repo::generic_repo::{
    Filter, ListQuery, OrderBy, Persisted, RepoError, RepoResult, Repository, SortDirection,
    SqliteRepository,
};
pub use service::crud_service::{CrudAppService, CrudService};
pub use uow::unit_of_work::UnitOfWork;

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

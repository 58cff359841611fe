//! Generic CRUD application service.
//!
//! # Responsibility
//! - Declare the CRUD contract exposed to calling layers.
//! - Provide a ready-to-use implementation delegating to the unit of work
//!   and a mapper.
//!
//! # Invariants
//! - Service APIs never bypass repository staging or unit-of-work commit.
//! - Read operations are asynchronous; mutations commit before returning.

use crate::model::dto::Dto;
use crate::model::entity::EntityId;
use crate::model::mapper::Mapper;
use crate::repo::generic_repo::{ListQuery, Persisted, RepoError, RepoResult, Repository};
use crate::uow::unit_of_work::UnitOfWork;
use async_trait::async_trait;
use std::marker::PhantomData;

/// CRUD surface exposed to calling code for one DTO shape.
///
/// Read operations are async so callers can await completion without
/// blocking unrelated work; mutations are synchronous and durable once
/// they return.
#[async_trait]
pub trait CrudService<D: Dto> {
    /// Fetches DTOs for entities matching the query options.
    async fn get(&mut self, query: &ListQuery) -> RepoResult<Vec<D>>;

    /// Fetches all entities as DTOs.
    async fn get_all(&mut self) -> RepoResult<Vec<D>>;

    /// Fetches one DTO by entity id; absence is not a failure.
    async fn get_by_id(&mut self, id: EntityId) -> RepoResult<Option<D>>;

    /// Maps the DTO to an entity, persists it and returns the resulting
    /// DTO with its storage-assigned id.
    fn insert(&mut self, dto: &D) -> RepoResult<D>;

    /// Removes the entity with the given id.
    fn delete_by_id(&mut self, id: EntityId) -> RepoResult<()>;

    /// Removes the entity the DTO mirrors; the DTO must carry an id.
    fn delete(&mut self, dto: &D) -> RepoResult<()>;

    /// Maps the DTO to an entity, persists the modification and returns
    /// the resulting DTO.
    fn update(&mut self, dto: &D) -> RepoResult<D>;
}

/// Basic CRUD service over one entity/DTO/mapper triple.
///
/// Usable as-is for plain CRUD, or wrapped per entity kind when custom
/// behavior is needed on top of the generic operations.
pub struct CrudAppService<E, D, M>
where
    E: Persisted,
    D: Dto,
    M: Mapper<D, E>,
{
    uow: UnitOfWork,
    mapper: M,
    _kinds: PhantomData<fn() -> (E, D)>,
}

impl<E, D, M> CrudAppService<E, D, M>
where
    E: Persisted,
    D: Dto,
    M: Mapper<D, E>,
{
    /// Builds a service owning the given unit of work.
    pub fn new(uow: UnitOfWork, mapper: M) -> Self {
        Self {
            uow,
            mapper,
            _kinds: PhantomData,
        }
    }
}

#[async_trait]
impl<E, D, M> CrudService<D> for CrudAppService<E, D, M>
where
    E: Persisted + Send,
    D: Dto + Send + Sync,
    M: Mapper<D, E> + Send,
{
    async fn get(&mut self, query: &ListQuery) -> RepoResult<Vec<D>> {
        let entities = self.uow.repository::<E>()?.list(query)?;
        Ok(entities
            .iter()
            .map(|entity| self.mapper.to_dto(entity))
            .collect())
    }

    async fn get_all(&mut self) -> RepoResult<Vec<D>> {
        let entities = self.uow.repository::<E>()?.list(&ListQuery::default())?;
        Ok(entities
            .iter()
            .map(|entity| self.mapper.to_dto(entity))
            .collect())
    }

    async fn get_by_id(&mut self, id: EntityId) -> RepoResult<Option<D>> {
        let entity = self.uow.repository::<E>()?.get(id)?;
        Ok(entity.map(|entity| self.mapper.to_dto(&entity)))
    }

    fn insert(&mut self, dto: &D) -> RepoResult<D> {
        let entity = self.mapper.to_entity(dto);
        let entity = self.uow.repository::<E>()?.insert(entity)?;
        self.uow.save()?;
        Ok(self.mapper.to_dto(&entity))
    }

    fn delete_by_id(&mut self, id: EntityId) -> RepoResult<()> {
        self.uow.repository::<E>()?.delete_by_id(id)?;
        self.uow.save()?;
        Ok(())
    }

    fn delete(&mut self, dto: &D) -> RepoResult<()> {
        let id = dto.id().ok_or(RepoError::MissingId { entity: E::TABLE })?;
        self.delete_by_id(id)
    }

    fn update(&mut self, dto: &D) -> RepoResult<D> {
        let entity = self.mapper.to_entity(dto);
        self.uow.repository::<E>()?.update(&entity)?;
        self.uow.save()?;
        Ok(self.mapper.to_dto(&entity))
    }
}

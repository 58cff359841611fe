//! Generic repository contract and SQLite implementation.
//!
//! # Responsibility
//! - Provide one stable CRUD facade per entity type over the owned
//!   data context.
//! - Build filtered/ordered/paged SQL from entity-declared metadata.
//!
//! # Invariants
//! - Mutations execute inside the context transaction and stay pending
//!   until the unit of work saves.
//! - Read paths reject invalid persisted state instead of masking it.
//! - Order columns are validated against the entity's declared columns.

use crate::db::context::ContextHandle;
use crate::db::DbError;
use crate::model::entity::{Entity, EntityId};
use rusqlite::types::Value;
use rusqlite::{params_from_iter, Connection, Row};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::marker::PhantomData;

pub type RepoResult<T> = Result<T, RepoError>;

/// Generic repository error for persistence and query operations.
#[derive(Debug)]
pub enum RepoError {
    Db(DbError),
    NotFound {
        entity: &'static str,
        id: EntityId,
    },
    MissingId {
        entity: &'static str,
    },
    InvalidQuery(String),
    UnknownRelation {
        entity: &'static str,
        relation: String,
    },
    MissingRequiredTable(&'static str),
    MissingRequiredColumn {
        table: &'static str,
        column: &'static str,
    },
    InvalidData(String),
}

impl Display for RepoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Db(err) => write!(f, "{err}"),
            Self::NotFound { entity, id } => write!(f, "{entity} record not found: {id}"),
            Self::MissingId { entity } => {
                write!(f, "{entity} record has no storage-assigned id yet")
            }
            Self::InvalidQuery(message) => write!(f, "invalid query: {message}"),
            Self::UnknownRelation { entity, relation } => {
                write!(f, "unknown relation `{relation}` for {entity}")
            }
            Self::MissingRequiredTable(table) => write!(f, "missing required table `{table}`"),
            Self::MissingRequiredColumn { table, column } => {
                write!(f, "missing required column `{column}` in table `{table}`")
            }
            Self::InvalidData(message) => write!(f, "invalid persisted data: {message}"),
        }
    }
}

impl Error for RepoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Db(err) => Some(err),
            _ => None,
        }
    }
}

impl From<DbError> for RepoError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for RepoError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

/// SQL mapping contract an entity type supplies to its repository.
///
/// The identifier column is always `id` and is owned by the storage layer;
/// `COLUMNS` lists the data columns in the order `bind_columns` produces
/// them.
pub trait Persisted: Entity + Sized + 'static {
    /// Table this entity type is stored in.
    const TABLE: &'static str;
    /// Data columns, excluding `id`.
    const COLUMNS: &'static [&'static str];

    /// Returns bind values for `COLUMNS`, in declaration order.
    fn bind_columns(&self) -> Vec<Value>;

    /// Decodes one row selected as `id, COLUMNS...`.
    fn from_row(row: &Row<'_>) -> RepoResult<Self>;

    /// Hydrates one named relation for an already-decoded record.
    ///
    /// The default rejects every relation name; entity types with related
    /// data override this for the names they understand.
    fn load_related(&mut self, conn: &Connection, relation: &str) -> RepoResult<()> {
        let _ = conn;
        Err(RepoError::UnknownRelation {
            entity: Self::TABLE,
            relation: relation.to_string(),
        })
    }
}

/// Sort direction for ordered listings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortDirection {
    Asc,
    Desc,
}

impl SortDirection {
    fn sql(self) -> &'static str {
        match self {
            Self::Asc => "ASC",
            Self::Desc => "DESC",
        }
    }
}

/// Ordering applied to a listing, validated against the entity's columns.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderBy {
    pub column: String,
    pub direction: SortDirection,
}

impl OrderBy {
    pub fn asc(column: impl Into<String>) -> Self {
        Self {
            column: column.into(),
            direction: SortDirection::Asc,
        }
    }

    pub fn desc(column: impl Into<String>) -> Self {
        Self {
            column: column.into(),
            direction: SortDirection::Desc,
        }
    }
}

/// SQL predicate fragment with its bound parameters.
///
/// The clause is appended to the generated `WHERE` section as-is, so it
/// uses positional placeholders starting at `?1`.
#[derive(Debug, Clone)]
pub struct Filter {
    pub clause: String,
    pub params: Vec<Value>,
}

impl Filter {
    pub fn new(clause: impl Into<String>, params: Vec<Value>) -> Self {
        Self {
            clause: clause.into(),
            params,
        }
    }
}

/// Query options for listing entities.
///
/// The default query selects all rows in stable `id` order.
#[derive(Debug, Clone, Default)]
pub struct ListQuery {
    /// Optional predicate; `None` means all rows.
    pub filter: Option<Filter>,
    /// Optional ordering; `None` means ascending `id`.
    pub order: Option<OrderBy>,
    /// Relation names hydrated on every returned record.
    pub include: Vec<String>,
    /// Maximum rows to return.
    pub limit: Option<u32>,
    /// Number of rows to skip.
    pub offset: u32,
}

/// Repository interface for one entity type's CRUD operations.
pub trait Repository<T: Persisted> {
    /// Lists entities using filter, order, inclusion and pagination options.
    fn list(&self, query: &ListQuery) -> RepoResult<Vec<T>>;
    /// Gets one entity by id; absence is not a failure.
    fn get(&self, id: EntityId) -> RepoResult<Option<T>>;
    /// Stages an insert and returns the entity with its assigned id.
    fn insert(&self, entity: T) -> RepoResult<T>;
    /// Stages an update of all data columns, matched by id.
    fn update(&self, entity: &T) -> RepoResult<()>;
    /// Stages a delete by id.
    fn delete_by_id(&self, id: EntityId) -> RepoResult<()>;
    /// Stages a delete of an already-persisted entity.
    fn delete(&self, entity: &T) -> RepoResult<()>;
}

/// SQLite-backed generic repository.
///
/// Constructed by the owning unit of work, never directly by callers.
pub struct SqliteRepository<T: Persisted> {
    ctx: ContextHandle,
    select_sql: String,
    insert_sql: String,
    update_sql: String,
    delete_sql: String,
    _entity: PhantomData<fn() -> T>,
}

impl<T: Persisted> std::fmt::Debug for SqliteRepository<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SqliteRepository")
            .field("table", &T::TABLE)
            .finish_non_exhaustive()
    }
}

impl<T: Persisted> SqliteRepository<T> {
    /// Builds a repository bound to the given context after verifying the
    /// connection carries the entity's table and columns.
    pub(crate) fn try_new(ctx: ContextHandle) -> RepoResult<Self> {
        ctx.read(|conn| ensure_connection_ready::<T>(conn))?;

        Ok(Self {
            ctx,
            select_sql: select_sql::<T>(),
            insert_sql: insert_sql::<T>(),
            update_sql: update_sql::<T>(),
            delete_sql: format!("DELETE FROM {} WHERE id = ?1;", T::TABLE),
            _entity: PhantomData,
        })
    }
}

impl<T: Persisted> Repository<T> for SqliteRepository<T> {
    fn list(&self, query: &ListQuery) -> RepoResult<Vec<T>> {
        let mut sql = format!("{} WHERE 1 = 1", self.select_sql);
        let mut bind_values: Vec<Value> = Vec::new();

        if let Some(filter) = query.filter.as_ref() {
            let clause = filter.clause.trim();
            if clause.is_empty() {
                return Err(RepoError::InvalidQuery(
                    "filter clause cannot be empty".to_string(),
                ));
            }
            sql.push_str(" AND (");
            sql.push_str(clause);
            sql.push(')');
            bind_values.extend(filter.params.iter().cloned());
        }

        match query.order.as_ref() {
            Some(order) => {
                ensure_order_column::<T>(&order.column)?;
                sql.push_str(" ORDER BY ");
                sql.push_str(&order.column);
                sql.push(' ');
                sql.push_str(order.direction.sql());
            }
            None => sql.push_str(" ORDER BY id ASC"),
        }

        if let Some(limit) = query.limit {
            sql.push_str(" LIMIT ?");
            bind_values.push(Value::Integer(i64::from(limit)));
            if query.offset > 0 {
                sql.push_str(" OFFSET ?");
                bind_values.push(Value::Integer(i64::from(query.offset)));
            }
        } else if query.offset > 0 {
            sql.push_str(" LIMIT -1 OFFSET ?");
            bind_values.push(Value::Integer(i64::from(query.offset)));
        }

        self.ctx.read(|conn| {
            let mut stmt = conn.prepare(&sql)?;
            let mut rows = stmt.query(params_from_iter(bind_values))?;
            let mut entities = Vec::new();

            while let Some(row) = rows.next()? {
                let mut entity = T::from_row(row)?;
                for relation in &query.include {
                    entity.load_related(conn, relation)?;
                }
                entities.push(entity);
            }

            Ok(entities)
        })
    }

    fn get(&self, id: EntityId) -> RepoResult<Option<T>> {
        self.ctx.read(|conn| {
            let mut stmt = conn.prepare(&format!("{} WHERE id = ?1;", self.select_sql))?;
            let mut rows = stmt.query([id])?;

            if let Some(row) = rows.next()? {
                return Ok(Some(T::from_row(row)?));
            }

            Ok(None)
        })
    }

    fn insert(&self, mut entity: T) -> RepoResult<T> {
        let id = self.ctx.stage(|conn| {
            let staged = conn.execute(&self.insert_sql, params_from_iter(entity.bind_columns()))?;
            Ok::<_, RepoError>((staged, conn.last_insert_rowid()))
        })?;

        entity.assign_id(id);
        Ok(entity)
    }

    fn update(&self, entity: &T) -> RepoResult<()> {
        let id = entity.id().ok_or(RepoError::MissingId { entity: T::TABLE })?;

        self.ctx.stage(|conn| {
            let mut params = entity.bind_columns();
            params.push(Value::Integer(id));
            let changed = conn.execute(&self.update_sql, params_from_iter(params))?;

            if changed == 0 {
                return Err(RepoError::NotFound {
                    entity: T::TABLE,
                    id,
                });
            }

            Ok((changed, ()))
        })
    }

    fn delete_by_id(&self, id: EntityId) -> RepoResult<()> {
        self.ctx.stage(|conn| {
            let changed = conn.execute(&self.delete_sql, [id])?;

            if changed == 0 {
                return Err(RepoError::NotFound {
                    entity: T::TABLE,
                    id,
                });
            }

            Ok((changed, ()))
        })
    }

    fn delete(&self, entity: &T) -> RepoResult<()> {
        let id = entity.id().ok_or(RepoError::MissingId { entity: T::TABLE })?;
        self.delete_by_id(id)
    }
}

fn select_sql<T: Persisted>() -> String {
    let mut columns = String::from("id");
    for column in T::COLUMNS {
        columns.push_str(", ");
        columns.push_str(column);
    }
    format!("SELECT {columns} FROM {}", T::TABLE)
}

fn insert_sql<T: Persisted>() -> String {
    let mut columns = String::new();
    let mut placeholders = String::new();
    for (index, column) in T::COLUMNS.iter().enumerate() {
        if index > 0 {
            columns.push_str(", ");
            placeholders.push_str(", ");
        }
        columns.push_str(column);
        placeholders.push_str(&format!("?{}", index + 1));
    }
    format!(
        "INSERT INTO {} ({columns}) VALUES ({placeholders});",
        T::TABLE
    )
}

fn update_sql<T: Persisted>() -> String {
    let mut assignments = String::new();
    for (index, column) in T::COLUMNS.iter().enumerate() {
        if index > 0 {
            assignments.push_str(", ");
        }
        assignments.push_str(&format!("{column} = ?{}", index + 1));
    }
    format!(
        "UPDATE {} SET {assignments} WHERE id = ?{};",
        T::TABLE,
        T::COLUMNS.len() + 1
    )
}

fn ensure_order_column<T: Persisted>(column: &str) -> RepoResult<()> {
    if column == "id" || T::COLUMNS.contains(&column) {
        return Ok(());
    }

    Err(RepoError::InvalidQuery(format!(
        "unknown order column `{column}` for table `{}`",
        T::TABLE
    )))
}

fn ensure_connection_ready<T: Persisted>(conn: &Connection) -> RepoResult<()> {
    if !table_exists(conn, T::TABLE)? {
        return Err(RepoError::MissingRequiredTable(T::TABLE));
    }

    if !table_has_column(conn, T::TABLE, "id")? {
        return Err(RepoError::MissingRequiredColumn {
            table: T::TABLE,
            column: "id",
        });
    }

    for column in T::COLUMNS {
        if !table_has_column(conn, T::TABLE, column)? {
            return Err(RepoError::MissingRequiredColumn {
                table: T::TABLE,
                column,
            });
        }
    }

    Ok(())
}

fn table_exists(conn: &Connection, table: &str) -> RepoResult<bool> {
    let exists: i64 = conn.query_row(
        "SELECT EXISTS(
            SELECT 1
            FROM sqlite_master
            WHERE type = 'table' AND name = ?1
        );",
        [table],
        |row| row.get(0),
    )?;
    Ok(exists == 1)
}

fn table_has_column(conn: &Connection, table: &str, column: &str) -> RepoResult<bool> {
    let mut stmt = conn.prepare(&format!("PRAGMA table_info({table});"))?;
    let mut rows = stmt.query([])?;
    while let Some(row) = rows.next()? {
        let current: String = row.get(1)?;
        if current == column {
            return Ok(true);
        }
    }
    Ok(false)
}

#![allow(dead_code)]

use chassis_core::{
    DataContext, Dto, Entity, EntityId, Mapper, Migration, Persisted, RepoError, RepoResult,
};
use rusqlite::types::Value;
use rusqlite::{Connection, Row};
use serde::{Deserialize, Serialize};

pub const MIGRATIONS: &[Migration] = &[
    Migration {
        version: 1,
        sql: "CREATE TABLE tickets (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            title TEXT NOT NULL,
            status TEXT NOT NULL DEFAULT 'open',
            priority INTEGER NOT NULL DEFAULT 0
        );",
    },
    Migration {
        version: 2,
        sql: "CREATE TABLE comments (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            ticket_id INTEGER NOT NULL,
            body TEXT NOT NULL,
            FOREIGN KEY(ticket_id) REFERENCES tickets(id) ON DELETE CASCADE
        );
        CREATE INDEX idx_comments_ticket_id ON comments(ticket_id);",
    },
];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Ticket {
    pub id: Option<EntityId>,
    pub title: String,
    pub status: String,
    pub priority: i64,
    pub comments: Vec<Comment>,
}

impl Entity for Ticket {
    fn id(&self) -> Option<EntityId> {
        self.id
    }

    fn assign_id(&mut self, id: EntityId) {
        self.id = Some(id);
    }
}

impl Persisted for Ticket {
    const TABLE: &'static str = "tickets";
    const COLUMNS: &'static [&'static str] = &["title", "status", "priority"];

    fn bind_columns(&self) -> Vec<Value> {
        vec![
            Value::Text(self.title.clone()),
            Value::Text(self.status.clone()),
            Value::Integer(self.priority),
        ]
    }

    fn from_row(row: &Row<'_>) -> RepoResult<Self> {
        Ok(Self {
            id: Some(row.get("id")?),
            title: row.get("title")?,
            status: row.get("status")?,
            priority: row.get("priority")?,
            comments: Vec::new(),
        })
    }

    fn load_related(&mut self, conn: &Connection, relation: &str) -> RepoResult<()> {
        if relation != "comments" {
            return Err(RepoError::UnknownRelation {
                entity: Self::TABLE,
                relation: relation.to_string(),
            });
        }

        let id = self.id.ok_or(RepoError::MissingId {
            entity: Self::TABLE,
        })?;

        let mut stmt = conn.prepare(
            "SELECT id, ticket_id, body
             FROM comments
             WHERE ticket_id = ?1
             ORDER BY id ASC;",
        )?;
        let mut rows = stmt.query([id])?;

        self.comments.clear();
        while let Some(row) = rows.next()? {
            self.comments.push(Comment::from_row(row)?);
        }

        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Comment {
    pub id: Option<EntityId>,
    pub ticket_id: EntityId,
    pub body: String,
}

impl Entity for Comment {
    fn id(&self) -> Option<EntityId> {
        self.id
    }

    fn assign_id(&mut self, id: EntityId) {
        self.id = Some(id);
    }
}

impl Persisted for Comment {
    const TABLE: &'static str = "comments";
    const COLUMNS: &'static [&'static str] = &["ticket_id", "body"];

    fn bind_columns(&self) -> Vec<Value> {
        vec![Value::Integer(self.ticket_id), Value::Text(self.body.clone())]
    }

    fn from_row(row: &Row<'_>) -> RepoResult<Self> {
        Ok(Self {
            id: Some(row.get("id")?),
            ticket_id: row.get("ticket_id")?,
            body: row.get("body")?,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TicketDto {
    pub id: Option<EntityId>,
    pub title: String,
    pub status: String,
    pub priority: i64,
}

impl Dto for TicketDto {
    fn id(&self) -> Option<EntityId> {
        self.id
    }
}

pub struct TicketMapper;

impl Mapper<TicketDto, Ticket> for TicketMapper {
    fn to_entity(&self, dto: &TicketDto) -> Ticket {
        Ticket {
            id: dto.id,
            title: dto.title.clone(),
            status: dto.status.clone(),
            priority: dto.priority,
            comments: Vec::new(),
        }
    }

    fn to_dto(&self, entity: &Ticket) -> TicketDto {
        TicketDto {
            id: entity.id,
            title: entity.title.clone(),
            status: entity.status.clone(),
            priority: entity.priority,
        }
    }
}

pub fn open_store() -> DataContext {
    DataContext::open_in_memory(MIGRATIONS).unwrap()
}

pub fn ticket(title: &str, status: &str, priority: i64) -> Ticket {
    Ticket {
        id: None,
        title: title.to_string(),
        status: status.to_string(),
        priority,
        comments: Vec::new(),
    }
}

pub fn ticket_dto(title: &str, status: &str, priority: i64) -> TicketDto {
    TicketDto {
        id: None,
        title: title.to_string(),
        status: status.to_string(),
        priority,
    }
}

pub fn comment(ticket_id: EntityId, body: &str) -> Comment {
    Comment {
        id: None,
        ticket_id,
        body: body.to_string(),
    }
}

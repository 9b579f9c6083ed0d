//! Repository for the `events` table.

use ashley_core::types::DbId;
use sqlx::PgPool;

use crate::models::event::{CreateEvent, Event};

const COLUMNS: &str = "id, workspace_id, event_type, source_entity_type, source_entity_id, \
                       actor_user_id, payload, created_at";

pub struct EventRepo;

impl EventRepo {
    /// Persist one event. Returns the new row id.
    pub async fn insert(pool: &PgPool, input: &CreateEvent) -> Result<DbId, sqlx::Error> {
        let (id,): (DbId,) = sqlx::query_as(
            "INSERT INTO events
                (workspace_id, event_type, source_entity_type, source_entity_id,
                 actor_user_id, payload, created_at)
             VALUES ($1, $2, $3, $4, $5, $6, $7)
             RETURNING id",
        )
        .bind(input.workspace_id)
        .bind(&input.event_type)
        .bind(&input.source_entity_type)
        .bind(input.source_entity_id)
        .bind(input.actor_user_id)
        .bind(&input.payload)
        .bind(input.created_at)
        .fetch_one(pool)
        .await?;
        Ok(id)
    }

    /// Most recent events of a workspace, optionally filtered by type.
    pub async fn list_recent(
        pool: &PgPool,
        workspace_id: DbId,
        event_type: Option<&str>,
        limit: i64,
    ) -> Result<Vec<Event>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM events
             WHERE workspace_id = $1 AND ($2::TEXT IS NULL OR event_type = $2)
             ORDER BY created_at DESC, id DESC
             LIMIT $3"
        );
        sqlx::query_as::<_, Event>(&query)
            .bind(workspace_id)
            .bind(event_type)
            .bind(limit)
            .fetch_all(pool)
            .await
    }
}

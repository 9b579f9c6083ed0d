//! Repository for the append-only `audit_logs` table.

use ashley_core::types::DbId;
use sqlx::PgPool;

use crate::models::audit::{AuditLog, CreateAuditLog};

const COLUMNS: &str =
    "id, workspace_id, user_id, action, resource, resource_id, new_values, created_at";

pub struct AuditRepo;

impl AuditRepo {
    pub async fn create(pool: &PgPool, input: &CreateAuditLog) -> Result<AuditLog, sqlx::Error> {
        let query = format!(
            "INSERT INTO audit_logs (workspace_id, user_id, action, resource, resource_id, new_values)
             VALUES ($1, $2, $3, $4, $5, $6)
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, AuditLog>(&query)
            .bind(input.workspace_id)
            .bind(input.user_id)
            .bind(&input.action)
            .bind(&input.resource)
            .bind(input.resource_id)
            .bind(&input.new_values)
            .fetch_one(pool)
            .await
    }

    /// List a workspace's entries, newest first, with optional filters.
    pub async fn list(
        pool: &PgPool,
        workspace_id: DbId,
        resource: Option<&str>,
        action: Option<&str>,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<AuditLog>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM audit_logs
             WHERE workspace_id = $1
               AND ($2::TEXT IS NULL OR resource = $2)
               AND ($3::TEXT IS NULL OR action = $3)
             ORDER BY created_at DESC, id DESC
             LIMIT $4 OFFSET $5"
        );
        sqlx::query_as::<_, AuditLog>(&query)
            .bind(workspace_id)
            .bind(resource)
            .bind(action)
            .bind(limit)
            .bind(offset)
            .fetch_all(pool)
            .await
    }

    pub async fn count(
        pool: &PgPool,
        workspace_id: DbId,
        resource: Option<&str>,
        action: Option<&str>,
    ) -> Result<i64, sqlx::Error> {
        let (total,): (i64,) = sqlx::query_as(
            "SELECT COUNT(*) FROM audit_logs
             WHERE workspace_id = $1
               AND ($2::TEXT IS NULL OR resource = $2)
               AND ($3::TEXT IS NULL OR action = $3)",
        )
        .bind(workspace_id)
        .bind(resource)
        .bind(action)
        .fetch_one(pool)
        .await?;
        Ok(total)
    }
}

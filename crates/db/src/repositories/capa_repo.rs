//! Repository for CAPA tasks and their analytics.

use ashley_core::capa::{
    format_capa_number, STATUS_CLOSED, STATUS_OPEN, STATUS_PENDING_VERIFICATION, TREND_MONTHS,
};
use ashley_core::types::DbId;
use sqlx::{PgConnection, PgPool};

use crate::models::capa::{CapaTask, CountBy, CreateCapa, MonthlyTrend, UpdateCapa};

const COLUMNS: &str = "id, workspace_id, capa_number, title, description, capa_type, priority, \
                       source, status, root_cause, corrective_action, preventive_action, \
                       assigned_to, due_date, inspection_id, order_id, verified_by, verified_at, \
                       effectiveness, closed_at, created_by, created_at, updated_at";

/// `$1` workspace, `$2` status, `$3` priority, `$4` type, `$5` source.
const LIST_FILTER: &str = "workspace_id = $1
    AND ($2::TEXT IS NULL OR status = $2)
    AND ($3::TEXT IS NULL OR priority = $3)
    AND ($4::TEXT IS NULL OR capa_type = $4)
    AND ($5::TEXT IS NULL OR source = $5)";

pub struct CapaRepo;

impl CapaRepo {
    pub async fn create(
        pool: &PgPool,
        workspace_id: DbId,
        year: i32,
        input: &CreateCapa,
        created_by: Option<DbId>,
    ) -> Result<CapaTask, sqlx::Error> {
        let mut tx = pool.begin().await?;
        let capa = Self::insert_numbered(&mut tx, workspace_id, year, input, created_by).await?;
        tx.commit().await?;
        Ok(capa)
    }

    /// Insert a task with the next `CAPA-{year}-NNNN` number.
    ///
    /// Must run inside a transaction: the workspace row is locked while the
    /// sequence is read.
    pub async fn insert_numbered(
        conn: &mut PgConnection,
        workspace_id: DbId,
        year: i32,
        input: &CreateCapa,
        created_by: Option<DbId>,
    ) -> Result<CapaTask, sqlx::Error> {
        sqlx::query("SELECT id FROM workspaces WHERE id = $1 FOR UPDATE")
            .bind(workspace_id)
            .execute(&mut *conn)
            .await?;

        let (existing,): (i64,) = sqlx::query_as(
            "SELECT COUNT(*) FROM capa_tasks
             WHERE workspace_id = $1 AND EXTRACT(YEAR FROM created_at AT TIME ZONE 'UTC')::INT = $2",
        )
        .bind(workspace_id)
        .bind(year)
        .fetch_one(&mut *conn)
        .await?;

        let query = format!(
            "INSERT INTO capa_tasks
                (workspace_id, capa_number, title, description, capa_type, priority, source,
                 root_cause, corrective_action, preventive_action, assigned_to, due_date,
                 inspection_id, order_id, created_by)
             VALUES ($1, $2, $3, $4, $5, COALESCE($6, 'MEDIUM'), COALESCE($7, 'OTHER'),
                     $8, $9, $10, $11, $12, $13, $14, $15)
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, CapaTask>(&query)
            .bind(workspace_id)
            .bind(format_capa_number(year, existing + 1))
            .bind(&input.title)
            .bind(&input.description)
            .bind(&input.capa_type)
            .bind(&input.priority)
            .bind(&input.source)
            .bind(&input.root_cause)
            .bind(&input.corrective_action)
            .bind(&input.preventive_action)
            .bind(input.assigned_to)
            .bind(input.due_date)
            .bind(input.inspection_id)
            .bind(input.order_id)
            .bind(created_by)
            .fetch_one(&mut *conn)
            .await
    }

    pub async fn find_by_id(
        pool: &PgPool,
        workspace_id: DbId,
        id: DbId,
    ) -> Result<Option<CapaTask>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM capa_tasks WHERE id = $1 AND workspace_id = $2");
        sqlx::query_as::<_, CapaTask>(&query)
            .bind(id)
            .bind(workspace_id)
            .fetch_optional(pool)
            .await
    }

    #[allow(clippy::too_many_arguments)]
    pub async fn list(
        pool: &PgPool,
        workspace_id: DbId,
        status: Option<&str>,
        priority: Option<&str>,
        capa_type: Option<&str>,
        source: Option<&str>,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<CapaTask>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM capa_tasks
             WHERE {LIST_FILTER}
             ORDER BY created_at DESC, id DESC
             LIMIT $6 OFFSET $7"
        );
        sqlx::query_as::<_, CapaTask>(&query)
            .bind(workspace_id)
            .bind(status)
            .bind(priority)
            .bind(capa_type)
            .bind(source)
            .bind(limit)
            .bind(offset)
            .fetch_all(pool)
            .await
    }

    pub async fn count(
        pool: &PgPool,
        workspace_id: DbId,
        status: Option<&str>,
        priority: Option<&str>,
        capa_type: Option<&str>,
        source: Option<&str>,
    ) -> Result<i64, sqlx::Error> {
        let query = format!("SELECT COUNT(*) FROM capa_tasks WHERE {LIST_FILTER}");
        let (count,): (i64,) = sqlx::query_as(&query)
            .bind(workspace_id)
            .bind(status)
            .bind(priority)
            .bind(capa_type)
            .bind(source)
            .fetch_one(pool)
            .await?;
        Ok(count)
    }

    /// Partial update. Entering `CLOSED` stamps `closed_at`. Applies only
    /// while the task is still in `expected_status`.
    pub async fn update(
        pool: &PgPool,
        id: DbId,
        expected_status: &str,
        input: &UpdateCapa,
    ) -> Result<Option<CapaTask>, sqlx::Error> {
        let query = format!(
            "UPDATE capa_tasks SET
                title = COALESCE($2, title),
                description = COALESCE($3, description),
                priority = COALESCE($4, priority),
                status = COALESCE($5, status),
                root_cause = COALESCE($6, root_cause),
                corrective_action = COALESCE($7, corrective_action),
                preventive_action = COALESCE($8, preventive_action),
                assigned_to = COALESCE($9, assigned_to),
                due_date = COALESCE($10, due_date),
                closed_at = CASE WHEN $5 = $11 THEN NOW() ELSE closed_at END
             WHERE id = $1 AND status = $12
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, CapaTask>(&query)
            .bind(id)
            .bind(&input.title)
            .bind(&input.description)
            .bind(&input.priority)
            .bind(&input.status)
            .bind(&input.root_cause)
            .bind(&input.corrective_action)
            .bind(&input.preventive_action)
            .bind(input.assigned_to)
            .bind(input.due_date)
            .bind(STATUS_CLOSED)
            .bind(expected_status)
            .fetch_optional(pool)
            .await
    }

    /// Close a task pending verification.
    pub async fn verify(
        pool: &PgPool,
        id: DbId,
        verified_by: DbId,
        effectiveness: &str,
    ) -> Result<Option<CapaTask>, sqlx::Error> {
        let query = format!(
            "UPDATE capa_tasks SET
                status = $2,
                verified_by = $3,
                verified_at = NOW(),
                effectiveness = $4,
                closed_at = NOW()
             WHERE id = $1 AND status = $5
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, CapaTask>(&query)
            .bind(id)
            .bind(STATUS_CLOSED)
            .bind(verified_by)
            .bind(effectiveness)
            .bind(STATUS_PENDING_VERIFICATION)
            .fetch_optional(pool)
            .await
    }

    /// Return a closed task to `OPEN`, clearing verification.
    pub async fn reopen(
        pool: &PgPool,
        id: DbId,
        priority: &str,
    ) -> Result<Option<CapaTask>, sqlx::Error> {
        let query = format!(
            "UPDATE capa_tasks SET
                status = $2,
                priority = $3,
                verified_by = NULL,
                verified_at = NULL,
                effectiveness = NULL,
                closed_at = NULL
             WHERE id = $1 AND status = $4
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, CapaTask>(&query)
            .bind(id)
            .bind(STATUS_OPEN)
            .bind(priority)
            .bind(STATUS_CLOSED)
            .fetch_optional(pool)
            .await
    }

    // -----------------------------------------------------------------------
    // Analytics
    // -----------------------------------------------------------------------

    /// Counts grouped by one of `status`, `priority`, `capa_type`, `source`.
    pub async fn count_by(
        pool: &PgPool,
        workspace_id: DbId,
        column: CapaDimension,
    ) -> Result<Vec<CountBy>, sqlx::Error> {
        let col = column.as_column();
        let query = format!(
            "SELECT {col} AS key, COUNT(*) AS count
             FROM capa_tasks WHERE workspace_id = $1
             GROUP BY {col}
             ORDER BY count DESC, key"
        );
        sqlx::query_as::<_, CountBy>(&query)
            .bind(workspace_id)
            .fetch_all(pool)
            .await
    }

    /// Unresolved tasks with a due date before today.
    pub async fn count_overdue(pool: &PgPool, workspace_id: DbId) -> Result<i64, sqlx::Error> {
        let (count,): (i64,) = sqlx::query_as(
            "SELECT COUNT(*) FROM capa_tasks
             WHERE workspace_id = $1 AND status <> 'CLOSED' AND due_date < CURRENT_DATE",
        )
        .bind(workspace_id)
        .fetch_one(pool)
        .await?;
        Ok(count)
    }

    /// Mean days from creation to close across closed tasks (0 when none).
    pub async fn avg_completion_days(pool: &PgPool, workspace_id: DbId) -> Result<f64, sqlx::Error> {
        let (avg,): (f64,) = sqlx::query_as(
            "SELECT COALESCE(AVG(EXTRACT(EPOCH FROM (closed_at - created_at)) / 86400.0), 0)::FLOAT8
             FROM capa_tasks
             WHERE workspace_id = $1 AND status = 'CLOSED' AND closed_at IS NOT NULL",
        )
        .bind(workspace_id)
        .fetch_one(pool)
        .await?;
        Ok(avg)
    }

    /// Created/closed counts for each of the trailing months, oldest first.
    pub async fn monthly_trend(
        pool: &PgPool,
        workspace_id: DbId,
    ) -> Result<Vec<MonthlyTrend>, sqlx::Error> {
        sqlx::query_as::<_, MonthlyTrend>(
            "WITH months AS (
                SELECT generate_series(
                    date_trunc('month', NOW()) - make_interval(months => $2 - 1),
                    date_trunc('month', NOW()),
                    INTERVAL '1 month') AS month
             )
             SELECT to_char(m.month, 'YYYY-MM') AS month,
                    (SELECT COUNT(*) FROM capa_tasks c
                      WHERE c.workspace_id = $1
                        AND date_trunc('month', c.created_at) = m.month) AS created,
                    (SELECT COUNT(*) FROM capa_tasks c
                      WHERE c.workspace_id = $1
                        AND date_trunc('month', c.closed_at) = m.month) AS closed
             FROM months m
             ORDER BY m.month",
        )
        .bind(workspace_id)
        .bind(TREND_MONTHS as i32)
        .fetch_all(pool)
        .await
    }
}

/// Columns the analytics distribution can group by.
#[derive(Debug, Clone, Copy)]
pub enum CapaDimension {
    Status,
    Priority,
    Type,
    Source,
}

impl CapaDimension {
    fn as_column(self) -> &'static str {
        match self {
            Self::Status => "status",
            Self::Priority => "priority",
            Self::Type => "capa_type",
            Self::Source => "source",
        }
    }
}

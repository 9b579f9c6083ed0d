//! Repositories for sewing operations, piece rates and runs, plus the
//! reporting queries behind the sewing dashboard and operator reports.

use ashley_core::sewing::{STATUS_CREATED, STATUS_DONE, STATUS_IN_PROGRESS, STATUS_PAUSED};
use ashley_core::types::{Date, DbId, Timestamp};
use sqlx::PgPool;

use crate::models::sewing::{
    CreatePieceRate, CreateSewingOperation, CreateSewingRun, OperatorAggregate,
    OperatorDailyBreakdown, OperatorOperationBreakdown, OperatorPeriodTotals, PieceRate,
    RunCompletionRecord, SewingDayTotals, SewingOperation, SewingRun, SewingRunListItem,
};

const OPERATION_COLUMNS: &str = "id, workspace_id, product_type, name, standard_minutes, piece_rate, \
                                 depends_on, created_at, updated_at";

const RATE_COLUMNS: &str = "id, workspace_id, operation_name, brand_id, rate, effective_from, \
                            effective_to, created_at";

const RUN_COLUMNS: &str = "id, workspace_id, order_id, routing_step_id, operation_name, operator_id, \
                           bundle_id, status, started_at, paused_at, paused_minutes, ended_at, \
                           qty_good, qty_reject, reject_reason, reject_photo_url, actual_minutes, \
                           earned_minutes, efficiency_pct, piece_rate_pay, created_by, created_at, \
                           updated_at";

const RUN_COLUMNS_PREFIXED: &str = "r.id, r.workspace_id, r.order_id, r.routing_step_id, \
                                    r.operation_name, r.operator_id, r.bundle_id, r.status, \
                                    r.started_at, r.paused_at, r.paused_minutes, r.ended_at, \
                                    r.qty_good, r.qty_reject, r.reject_reason, r.reject_photo_url, \
                                    r.actual_minutes, r.earned_minutes, r.efficiency_pct, \
                                    r.piece_rate_pay, r.created_by, r.created_at, r.updated_at";

pub struct SewingOperationRepo;

impl SewingOperationRepo {
    pub async fn create(
        pool: &PgPool,
        workspace_id: DbId,
        input: &CreateSewingOperation,
    ) -> Result<SewingOperation, sqlx::Error> {
        let query = format!(
            "INSERT INTO sewing_operations
                (workspace_id, product_type, name, standard_minutes, piece_rate, depends_on)
             VALUES ($1, $2, $3, $4, $5, $6)
             RETURNING {OPERATION_COLUMNS}"
        );
        sqlx::query_as::<_, SewingOperation>(&query)
            .bind(workspace_id)
            .bind(&input.product_type)
            .bind(&input.name)
            .bind(input.standard_minutes)
            .bind(input.piece_rate)
            .bind(&input.depends_on)
            .fetch_one(pool)
            .await
    }

    pub async fn list(
        pool: &PgPool,
        workspace_id: DbId,
        product_type: Option<&str>,
    ) -> Result<Vec<SewingOperation>, sqlx::Error> {
        let query = format!(
            "SELECT {OPERATION_COLUMNS} FROM sewing_operations
             WHERE workspace_id = $1 AND ($2::TEXT IS NULL OR product_type = $2)
             ORDER BY product_type, name"
        );
        sqlx::query_as::<_, SewingOperation>(&query)
            .bind(workspace_id)
            .bind(product_type)
            .fetch_all(pool)
            .await
    }

    /// First operation with the given name, across product types.
    pub async fn find_by_name(
        pool: &PgPool,
        workspace_id: DbId,
        name: &str,
    ) -> Result<Option<SewingOperation>, sqlx::Error> {
        let query = format!(
            "SELECT {OPERATION_COLUMNS} FROM sewing_operations
             WHERE workspace_id = $1 AND name = $2
             ORDER BY id
             LIMIT 1"
        );
        sqlx::query_as::<_, SewingOperation>(&query)
            .bind(workspace_id)
            .bind(name)
            .fetch_optional(pool)
            .await
    }
}

pub struct PieceRateRepo;

impl PieceRateRepo {
    pub async fn create(
        pool: &PgPool,
        workspace_id: DbId,
        input: &CreatePieceRate,
    ) -> Result<PieceRate, sqlx::Error> {
        let query = format!(
            "INSERT INTO piece_rates
                (workspace_id, operation_name, brand_id, rate, effective_from, effective_to)
             VALUES ($1, $2, $3, $4, $5, $6)
             RETURNING {RATE_COLUMNS}"
        );
        sqlx::query_as::<_, PieceRate>(&query)
            .bind(workspace_id)
            .bind(&input.operation_name)
            .bind(input.brand_id)
            .bind(input.rate)
            .bind(input.effective_from)
            .bind(input.effective_to)
            .fetch_one(pool)
            .await
    }

    /// Rates filtered by operation and brand; with no operation filter
    /// this returns every rate in the workspace.
    pub async fn list(
        pool: &PgPool,
        workspace_id: DbId,
        operation_name: Option<&str>,
        brand_id: Option<DbId>,
    ) -> Result<Vec<PieceRate>, sqlx::Error> {
        let query = format!(
            "SELECT {RATE_COLUMNS} FROM piece_rates
             WHERE workspace_id = $1
               AND ($2::TEXT IS NULL OR operation_name = $2)
               AND ($3::BIGINT IS NULL OR brand_id = $3)
             ORDER BY operation_name, effective_from DESC"
        );
        sqlx::query_as::<_, PieceRate>(&query)
            .bind(workspace_id)
            .bind(operation_name)
            .bind(brand_id)
            .fetch_all(pool)
            .await
    }

    /// Every rate for an operation, for piece-rate resolution.
    pub async fn for_operation(
        pool: &PgPool,
        workspace_id: DbId,
        operation_name: &str,
    ) -> Result<Vec<PieceRate>, sqlx::Error> {
        Self::list(pool, workspace_id, Some(operation_name), None).await
    }
}

pub struct SewingRunRepo;

impl SewingRunRepo {
    pub async fn create(
        pool: &PgPool,
        workspace_id: DbId,
        input: &CreateSewingRun,
        created_by: DbId,
    ) -> Result<SewingRun, sqlx::Error> {
        let query = format!(
            "INSERT INTO sewing_runs
                (workspace_id, order_id, routing_step_id, operation_name, operator_id, bundle_id,
                 created_by)
             VALUES ($1, $2, $3, $4, $5, $6, $7)
             RETURNING {RUN_COLUMNS}"
        );
        sqlx::query_as::<_, SewingRun>(&query)
            .bind(workspace_id)
            .bind(input.order_id)
            .bind(input.routing_step_id)
            .bind(&input.operation_name)
            .bind(input.operator_id)
            .bind(input.bundle_id)
            .bind(created_by)
            .fetch_one(pool)
            .await
    }

    pub async fn find_by_id(
        pool: &PgPool,
        workspace_id: DbId,
        id: DbId,
    ) -> Result<Option<SewingRun>, sqlx::Error> {
        let query = format!("SELECT {RUN_COLUMNS} FROM sewing_runs WHERE id = $1 AND workspace_id = $2");
        sqlx::query_as::<_, SewingRun>(&query)
            .bind(id)
            .bind(workspace_id)
            .fetch_optional(pool)
            .await
    }

    pub async fn list(
        pool: &PgPool,
        workspace_id: DbId,
        status: Option<&str>,
        operator_id: Option<DbId>,
        order_id: Option<DbId>,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<SewingRunListItem>, sqlx::Error> {
        let query = format!(
            "SELECT {RUN_COLUMNS_PREFIXED}, e.first_name || ' ' || e.last_name AS operator_name
             FROM sewing_runs r
             JOIN employees e ON e.id = r.operator_id
             WHERE r.workspace_id = $1
               AND ($2::TEXT IS NULL OR r.status = $2)
               AND ($3::BIGINT IS NULL OR r.operator_id = $3)
               AND ($4::BIGINT IS NULL OR r.order_id = $4)
             ORDER BY r.created_at DESC, r.id DESC
             LIMIT $5 OFFSET $6"
        );
        sqlx::query_as::<_, SewingRunListItem>(&query)
            .bind(workspace_id)
            .bind(status)
            .bind(operator_id)
            .bind(order_id)
            .bind(limit)
            .bind(offset)
            .fetch_all(pool)
            .await
    }

    // Each transition only matches a run still in its source status, so
    // `None` means the run has moved on since it was read.

    /// CREATED → IN_PROGRESS, stamping `started_at`.
    pub async fn start(pool: &PgPool, id: DbId) -> Result<Option<SewingRun>, sqlx::Error> {
        let query = format!(
            "UPDATE sewing_runs SET status = $2, started_at = COALESCE(started_at, NOW())
             WHERE id = $1 AND status = $3
             RETURNING {RUN_COLUMNS}"
        );
        sqlx::query_as::<_, SewingRun>(&query)
            .bind(id)
            .bind(STATUS_IN_PROGRESS)
            .bind(STATUS_CREATED)
            .fetch_optional(pool)
            .await
    }

    /// IN_PROGRESS → PAUSED.
    pub async fn pause(pool: &PgPool, id: DbId) -> Result<Option<SewingRun>, sqlx::Error> {
        let query = format!(
            "UPDATE sewing_runs SET status = $2, paused_at = NOW()
             WHERE id = $1 AND status = $3
             RETURNING {RUN_COLUMNS}"
        );
        sqlx::query_as::<_, SewingRun>(&query)
            .bind(id)
            .bind(STATUS_PAUSED)
            .bind(STATUS_IN_PROGRESS)
            .fetch_optional(pool)
            .await
    }

    /// PAUSED → IN_PROGRESS, folding the paused span into `paused_minutes`.
    pub async fn resume(pool: &PgPool, id: DbId) -> Result<Option<SewingRun>, sqlx::Error> {
        let query = format!(
            "UPDATE sewing_runs SET
                status = $2,
                paused_minutes = paused_minutes
                    + COALESCE(EXTRACT(EPOCH FROM (NOW() - paused_at)) / 60.0, 0)::FLOAT8,
                paused_at = NULL
             WHERE id = $1 AND status = $3
             RETURNING {RUN_COLUMNS}"
        );
        sqlx::query_as::<_, SewingRun>(&query)
            .bind(id)
            .bind(STATUS_IN_PROGRESS)
            .bind(STATUS_PAUSED)
            .fetch_optional(pool)
            .await
    }

    pub async fn complete(
        pool: &PgPool,
        id: DbId,
        record: &RunCompletionRecord,
    ) -> Result<Option<SewingRun>, sqlx::Error> {
        let query = format!(
            "UPDATE sewing_runs SET
                status = $2,
                ended_at = $3,
                qty_good = $4,
                qty_reject = $5,
                reject_reason = $6,
                reject_photo_url = $7,
                actual_minutes = $8,
                earned_minutes = $9,
                efficiency_pct = $10,
                piece_rate_pay = $11,
                paused_at = NULL
             WHERE id = $1 AND status = $12
             RETURNING {RUN_COLUMNS}"
        );
        sqlx::query_as::<_, SewingRun>(&query)
            .bind(id)
            .bind(STATUS_DONE)
            .bind(record.ended_at)
            .bind(record.qty_good)
            .bind(record.qty_reject)
            .bind(&record.reject_reason)
            .bind(&record.reject_photo_url)
            .bind(record.actual_minutes)
            .bind(record.earned_minutes)
            .bind(record.efficiency_pct)
            .bind(record.piece_rate_pay)
            .bind(STATUS_IN_PROGRESS)
            .fetch_optional(pool)
            .await
    }

    // -----------------------------------------------------------------------
    // Dashboard
    // -----------------------------------------------------------------------

    pub async fn day_totals(
        pool: &PgPool,
        workspace_id: DbId,
        day_start: Timestamp,
    ) -> Result<SewingDayTotals, sqlx::Error> {
        sqlx::query_as::<_, SewingDayTotals>(
            "SELECT
                (SELECT COUNT(*) FROM sewing_runs
                  WHERE workspace_id = $1 AND status = 'IN_PROGRESS') AS active_runs,
                COUNT(*) AS completed_today,
                COALESCE(SUM(qty_good), 0)::BIGINT AS pieces_today,
                COALESCE(ROUND(AVG(efficiency_pct)::NUMERIC, 2), 0)::FLOAT8 AS avg_efficiency_today
             FROM sewing_runs
             WHERE workspace_id = $1 AND status = 'DONE' AND ended_at >= $2",
        )
        .bind(workspace_id)
        .bind(day_start)
        .fetch_one(pool)
        .await
    }

    /// Per-operator aggregates over done runs ended since `since`, best
    /// average efficiency first.
    pub async fn operator_aggregates(
        pool: &PgPool,
        workspace_id: DbId,
        since: Timestamp,
        limit: Option<i64>,
    ) -> Result<Vec<OperatorAggregate>, sqlx::Error> {
        sqlx::query_as::<_, OperatorAggregate>(
            "SELECT r.operator_id,
                    e.first_name || ' ' || e.last_name AS operator_name,
                    COUNT(*) AS total_runs,
                    COALESCE(SUM(r.qty_good), 0)::BIGINT AS total_pieces,
                    COALESCE(SUM(r.qty_reject), 0)::BIGINT AS total_rejects,
                    COALESCE(ROUND(AVG(r.efficiency_pct)::NUMERIC, 2), 0)::FLOAT8 AS avg_efficiency,
                    COALESCE(SUM(r.piece_rate_pay), 0)::FLOAT8 AS total_earnings
             FROM sewing_runs r
             JOIN employees e ON e.id = r.operator_id
             WHERE r.workspace_id = $1 AND r.status = 'DONE' AND r.ended_at >= $2
             GROUP BY r.operator_id, e.first_name, e.last_name
             ORDER BY avg_efficiency DESC, r.operator_id
             LIMIT $3",
        )
        .bind(workspace_id)
        .bind(since)
        .bind(limit)
        .fetch_all(pool)
        .await
    }

    /// Most recent done runs that recorded rejects.
    pub async fn recent_with_rejects(
        pool: &PgPool,
        workspace_id: DbId,
        limit: i64,
    ) -> Result<Vec<SewingRunListItem>, sqlx::Error> {
        let query = format!(
            "SELECT {RUN_COLUMNS_PREFIXED}, e.first_name || ' ' || e.last_name AS operator_name
             FROM sewing_runs r
             JOIN employees e ON e.id = r.operator_id
             WHERE r.workspace_id = $1 AND r.qty_reject > 0
             ORDER BY r.ended_at DESC NULLS LAST, r.id DESC
             LIMIT $2"
        );
        sqlx::query_as::<_, SewingRunListItem>(&query)
            .bind(workspace_id)
            .bind(limit)
            .fetch_all(pool)
            .await
    }

    // -----------------------------------------------------------------------
    // Operator reports
    // -----------------------------------------------------------------------

    /// Lifetime totals and average efficiency over an operator's done runs.
    pub async fn operator_lifetime(
        pool: &PgPool,
        workspace_id: DbId,
        operator_id: DbId,
    ) -> Result<(i64, i64, i64, f64, f64), sqlx::Error> {
        sqlx::query_as(
            "SELECT COUNT(*),
                    COALESCE(SUM(qty_good), 0)::BIGINT,
                    COALESCE(SUM(qty_reject), 0)::BIGINT,
                    COALESCE(SUM(piece_rate_pay), 0)::FLOAT8,
                    COALESCE(AVG(efficiency_pct), 0)::FLOAT8
             FROM sewing_runs
             WHERE workspace_id = $1 AND operator_id = $2 AND status = 'DONE'",
        )
        .bind(workspace_id)
        .bind(operator_id)
        .fetch_one(pool)
        .await
    }

    pub async fn operation_breakdown(
        pool: &PgPool,
        workspace_id: DbId,
        since: Timestamp,
    ) -> Result<Vec<OperatorOperationBreakdown>, sqlx::Error> {
        sqlx::query_as::<_, OperatorOperationBreakdown>(
            "SELECT operator_id, operation_name,
                    COUNT(*) AS runs,
                    COALESCE(SUM(qty_good), 0)::BIGINT AS pieces,
                    COALESCE(ROUND(AVG(efficiency_pct)::NUMERIC, 2), 0)::FLOAT8 AS avg_efficiency
             FROM sewing_runs
             WHERE workspace_id = $1 AND status = 'DONE' AND ended_at >= $2
             GROUP BY operator_id, operation_name
             ORDER BY operator_id, operation_name",
        )
        .bind(workspace_id)
        .bind(since)
        .fetch_all(pool)
        .await
    }

    /// Daily breakdown, optionally narrowed to one operator.
    pub async fn daily_breakdown(
        pool: &PgPool,
        workspace_id: DbId,
        operator_id: Option<DbId>,
        since: Timestamp,
    ) -> Result<Vec<OperatorDailyBreakdown>, sqlx::Error> {
        sqlx::query_as::<_, OperatorDailyBreakdown>(
            "SELECT operator_id,
                    (ended_at AT TIME ZONE 'UTC')::DATE AS day,
                    COUNT(*) AS runs,
                    COALESCE(SUM(qty_good), 0)::BIGINT AS pieces,
                    COALESCE(ROUND(AVG(efficiency_pct)::NUMERIC, 2), 0)::FLOAT8 AS avg_efficiency,
                    COALESCE(SUM(piece_rate_pay), 0)::FLOAT8 AS earnings
             FROM sewing_runs
             WHERE workspace_id = $1
               AND ($2::BIGINT IS NULL OR operator_id = $2)
               AND status = 'DONE' AND ended_at >= $3
             GROUP BY operator_id, day
             ORDER BY operator_id, day",
        )
        .bind(workspace_id)
        .bind(operator_id)
        .bind(since)
        .fetch_all(pool)
        .await
    }

    /// Per-operator piece earnings, distinct work days and minutes for runs
    /// ended within `[start, end]` (inclusive dates).
    pub async fn operator_period_totals(
        pool: &PgPool,
        workspace_id: DbId,
        start: Date,
        end: Date,
        operator_ids: Option<&[DbId]>,
    ) -> Result<Vec<OperatorPeriodTotals>, sqlx::Error> {
        sqlx::query_as::<_, OperatorPeriodTotals>(
            "SELECT r.operator_id,
                    e.first_name || ' ' || e.last_name AS operator_name,
                    e.salary_type,
                    e.base_salary,
                    COALESCE(SUM(r.piece_rate_pay), 0)::FLOAT8 AS piece_earnings,
                    COALESCE(SUM(r.qty_good), 0)::BIGINT AS piece_count,
                    COUNT(DISTINCT (r.ended_at AT TIME ZONE 'UTC')::DATE) AS days_worked,
                    COALESCE(SUM(r.actual_minutes), 0)::FLOAT8 AS total_minutes
             FROM sewing_runs r
             JOIN employees e ON e.id = r.operator_id
             WHERE r.workspace_id = $1 AND r.status = 'DONE'
               AND (r.ended_at AT TIME ZONE 'UTC')::DATE BETWEEN $2 AND $3
               AND ($4::BIGINT[] IS NULL OR r.operator_id = ANY($4))
             GROUP BY r.operator_id, e.first_name, e.last_name, e.salary_type, e.base_salary
             ORDER BY operator_name",
        )
        .bind(workspace_id)
        .bind(start)
        .bind(end)
        .bind(operator_ids)
        .fetch_all(pool)
        .await
    }
}

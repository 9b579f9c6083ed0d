//! Repositories for machines, print runs and run child records.

use ashley_core::printing::{STATUS_DONE, STATUS_IN_PROGRESS};
use ashley_core::types::DbId;
use sqlx::PgPool;

use crate::models::printing::{
    CreateMachine, CreatePrintReject, CreatePrintRun, CreatePrintRunMaterial, CreatePrintRunOutput,
    Machine, MethodCount, PrintMethodLog, PrintReject, PrintRun, PrintRunMaterial, PrintRunOutput,
    RecentPrintReject,
};

const MACHINE_COLUMNS: &str = "id, workspace_id, name, workcenter, is_active, created_at, updated_at";

const RUN_COLUMNS: &str = "id, workspace_id, order_id, routing_step_id, method, workcenter, \
                           machine_id, status, started_at, ended_at, created_by, created_at, updated_at";

pub struct MachineRepo;

impl MachineRepo {
    pub async fn create(
        pool: &PgPool,
        workspace_id: DbId,
        input: &CreateMachine,
    ) -> Result<Machine, sqlx::Error> {
        let query = format!(
            "INSERT INTO machines (workspace_id, name, workcenter, is_active)
             VALUES ($1, $2, $3, COALESCE($4, TRUE))
             RETURNING {MACHINE_COLUMNS}"
        );
        sqlx::query_as::<_, Machine>(&query)
            .bind(workspace_id)
            .bind(&input.name)
            .bind(&input.workcenter)
            .bind(input.is_active)
            .fetch_one(pool)
            .await
    }

    pub async fn find_by_id(
        pool: &PgPool,
        workspace_id: DbId,
        id: DbId,
    ) -> Result<Option<Machine>, sqlx::Error> {
        let query = format!("SELECT {MACHINE_COLUMNS} FROM machines WHERE id = $1 AND workspace_id = $2");
        sqlx::query_as::<_, Machine>(&query)
            .bind(id)
            .bind(workspace_id)
            .fetch_optional(pool)
            .await
    }

    pub async fn list(
        pool: &PgPool,
        workspace_id: DbId,
        workcenter: Option<&str>,
    ) -> Result<Vec<Machine>, sqlx::Error> {
        let query = format!(
            "SELECT {MACHINE_COLUMNS} FROM machines
             WHERE workspace_id = $1 AND ($2::TEXT IS NULL OR workcenter = $2)
             ORDER BY name"
        );
        sqlx::query_as::<_, Machine>(&query)
            .bind(workspace_id)
            .bind(workcenter)
            .fetch_all(pool)
            .await
    }
}

pub struct PrintRunRepo;

impl PrintRunRepo {
    pub async fn create(
        pool: &PgPool,
        workspace_id: DbId,
        input: &CreatePrintRun,
        created_by: DbId,
    ) -> Result<PrintRun, sqlx::Error> {
        let query = format!(
            "INSERT INTO print_runs
                (workspace_id, order_id, routing_step_id, method, workcenter, machine_id, created_by)
             VALUES ($1, $2, $3, $4, $5, $6, $7)
             RETURNING {RUN_COLUMNS}"
        );
        sqlx::query_as::<_, PrintRun>(&query)
            .bind(workspace_id)
            .bind(input.order_id)
            .bind(input.routing_step_id)
            .bind(&input.method)
            .bind(&input.workcenter)
            .bind(input.machine_id)
            .bind(created_by)
            .fetch_one(pool)
            .await
    }

    pub async fn find_by_id(
        pool: &PgPool,
        workspace_id: DbId,
        id: DbId,
    ) -> Result<Option<PrintRun>, sqlx::Error> {
        let query = format!("SELECT {RUN_COLUMNS} FROM print_runs WHERE id = $1 AND workspace_id = $2");
        sqlx::query_as::<_, PrintRun>(&query)
            .bind(id)
            .bind(workspace_id)
            .fetch_optional(pool)
            .await
    }

    pub async fn list(
        pool: &PgPool,
        workspace_id: DbId,
        status: Option<&str>,
        method: Option<&str>,
        order_id: Option<DbId>,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<PrintRun>, sqlx::Error> {
        let query = format!(
            "SELECT {RUN_COLUMNS} FROM print_runs
             WHERE workspace_id = $1
               AND ($2::TEXT IS NULL OR status = $2)
               AND ($3::TEXT IS NULL OR method = $3)
               AND ($4::BIGINT IS NULL OR order_id = $4)
             ORDER BY created_at DESC, id DESC
             LIMIT $5 OFFSET $6"
        );
        sqlx::query_as::<_, PrintRun>(&query)
            .bind(workspace_id)
            .bind(status)
            .bind(method)
            .bind(order_id)
            .bind(limit)
            .bind(offset)
            .fetch_all(pool)
            .await
    }

    /// Move a run from `from` to `status`, stamping `started_at` on first
    /// start and `ended_at` on completion. `None` when the run is no longer
    /// in `from`.
    pub async fn set_status(
        pool: &PgPool,
        id: DbId,
        from: &str,
        status: &str,
    ) -> Result<Option<PrintRun>, sqlx::Error> {
        let query = format!(
            "UPDATE print_runs SET
                status = $2,
                started_at = CASE WHEN $2 = $3 AND started_at IS NULL THEN NOW() ELSE started_at END,
                ended_at = CASE WHEN $2 = $4 THEN NOW() ELSE ended_at END
             WHERE id = $1 AND status = $5
             RETURNING {RUN_COLUMNS}"
        );
        sqlx::query_as::<_, PrintRun>(&query)
            .bind(id)
            .bind(status)
            .bind(STATUS_IN_PROGRESS)
            .bind(STATUS_DONE)
            .bind(from)
            .fetch_optional(pool)
            .await
    }

    pub async fn add_material(
        pool: &PgPool,
        run_id: DbId,
        input: &CreatePrintRunMaterial,
    ) -> Result<PrintRunMaterial, sqlx::Error> {
        sqlx::query_as::<_, PrintRunMaterial>(
            "INSERT INTO print_run_materials (run_id, item_name, uom, qty)
             VALUES ($1, $2, $3, $4)
             RETURNING id, run_id, item_name, uom, qty, created_at",
        )
        .bind(run_id)
        .bind(&input.item_name)
        .bind(&input.uom)
        .bind(input.qty)
        .fetch_one(pool)
        .await
    }

    pub async fn add_output(
        pool: &PgPool,
        run_id: DbId,
        input: &CreatePrintRunOutput,
    ) -> Result<PrintRunOutput, sqlx::Error> {
        sqlx::query_as::<_, PrintRunOutput>(
            "INSERT INTO print_run_outputs (run_id, bundle_id, qty_good, qty_reject)
             VALUES ($1, $2, $3, $4)
             RETURNING id, run_id, bundle_id, qty_good, qty_reject, created_at",
        )
        .bind(run_id)
        .bind(input.bundle_id)
        .bind(input.qty_good)
        .bind(input.qty_reject)
        .fetch_one(pool)
        .await
    }

    pub async fn add_reject(
        pool: &PgPool,
        run_id: DbId,
        input: &CreatePrintReject,
    ) -> Result<PrintReject, sqlx::Error> {
        sqlx::query_as::<_, PrintReject>(
            "INSERT INTO print_rejects (run_id, reason_code, qty, cost_attribution, photo_url)
             VALUES ($1, $2, $3, $4, $5)
             RETURNING id, run_id, reason_code, qty, cost_attribution, photo_url, created_at",
        )
        .bind(run_id)
        .bind(&input.reason_code)
        .bind(input.qty)
        .bind(&input.cost_attribution)
        .bind(&input.photo_url)
        .fetch_one(pool)
        .await
    }

    pub async fn add_log(
        pool: &PgPool,
        run_id: DbId,
        log_type: &str,
        data: &serde_json::Value,
    ) -> Result<PrintMethodLog, sqlx::Error> {
        sqlx::query_as::<_, PrintMethodLog>(
            "INSERT INTO print_method_logs (run_id, log_type, data)
             VALUES ($1, $2, $3)
             RETURNING id, run_id, log_type, data, created_at",
        )
        .bind(run_id)
        .bind(log_type)
        .bind(data)
        .fetch_one(pool)
        .await
    }

    pub async fn materials(pool: &PgPool, run_id: DbId) -> Result<Vec<PrintRunMaterial>, sqlx::Error> {
        sqlx::query_as::<_, PrintRunMaterial>(
            "SELECT id, run_id, item_name, uom, qty, created_at
             FROM print_run_materials WHERE run_id = $1 ORDER BY id",
        )
        .bind(run_id)
        .fetch_all(pool)
        .await
    }

    pub async fn outputs(pool: &PgPool, run_id: DbId) -> Result<Vec<PrintRunOutput>, sqlx::Error> {
        sqlx::query_as::<_, PrintRunOutput>(
            "SELECT id, run_id, bundle_id, qty_good, qty_reject, created_at
             FROM print_run_outputs WHERE run_id = $1 ORDER BY id",
        )
        .bind(run_id)
        .fetch_all(pool)
        .await
    }

    pub async fn rejects(pool: &PgPool, run_id: DbId) -> Result<Vec<PrintReject>, sqlx::Error> {
        sqlx::query_as::<_, PrintReject>(
            "SELECT id, run_id, reason_code, qty, cost_attribution, photo_url, created_at
             FROM print_rejects WHERE run_id = $1 ORDER BY id",
        )
        .bind(run_id)
        .fetch_all(pool)
        .await
    }

    pub async fn logs(pool: &PgPool, run_id: DbId) -> Result<Vec<PrintMethodLog>, sqlx::Error> {
        sqlx::query_as::<_, PrintMethodLog>(
            "SELECT id, run_id, log_type, data, created_at
             FROM print_method_logs WHERE run_id = $1 ORDER BY id",
        )
        .bind(run_id)
        .fetch_all(pool)
        .await
    }

    /// Earliest log of `log_type` for a run.
    pub async fn first_log(
        pool: &PgPool,
        run_id: DbId,
        log_type: &str,
    ) -> Result<Option<PrintMethodLog>, sqlx::Error> {
        sqlx::query_as::<_, PrintMethodLog>(
            "SELECT id, run_id, log_type, data, created_at
             FROM print_method_logs
             WHERE run_id = $1 AND log_type = $2
             ORDER BY created_at, id
             LIMIT 1",
        )
        .bind(run_id)
        .bind(log_type)
        .fetch_optional(pool)
        .await
    }

    /// Total good output and total rejected pieces for a run.
    ///
    /// Rejects count both the reject quantities on outputs and the
    /// separately logged rejects.
    pub async fn output_totals(pool: &PgPool, run_id: DbId) -> Result<(i64, i64), sqlx::Error> {
        sqlx::query_as(
            "SELECT
                (SELECT COALESCE(SUM(qty_good), 0)::BIGINT FROM print_run_outputs WHERE run_id = $1),
                (SELECT COALESCE(SUM(qty_reject), 0)::BIGINT FROM print_run_outputs WHERE run_id = $1)
                  + (SELECT COALESCE(SUM(qty), 0)::BIGINT FROM print_rejects WHERE run_id = $1)",
        )
        .bind(run_id)
        .fetch_one(pool)
        .await
    }

    pub async fn count_by_status(
        pool: &PgPool,
        workspace_id: DbId,
        status: &str,
    ) -> Result<i64, sqlx::Error> {
        let (count,): (i64,) =
            sqlx::query_as("SELECT COUNT(*) FROM print_runs WHERE workspace_id = $1 AND status = $2")
                .bind(workspace_id)
                .bind(status)
                .fetch_one(pool)
                .await?;
        Ok(count)
    }

    pub async fn count_created_since(
        pool: &PgPool,
        workspace_id: DbId,
        since: ashley_core::types::Timestamp,
    ) -> Result<i64, sqlx::Error> {
        let (count,): (i64,) = sqlx::query_as(
            "SELECT COUNT(*) FROM print_runs
             WHERE workspace_id = $1 AND created_at >= $2",
        )
        .bind(workspace_id)
        .bind(since)
        .fetch_one(pool)
        .await?;
        Ok(count)
    }

    pub async fn recent_rejects(
        pool: &PgPool,
        workspace_id: DbId,
        limit: i64,
    ) -> Result<Vec<RecentPrintReject>, sqlx::Error> {
        sqlx::query_as::<_, RecentPrintReject>(
            "SELECT r.id, r.run_id, r.reason_code, r.qty, r.cost_attribution, r.photo_url,
                    r.created_at, pr.method, pr.order_id
             FROM print_rejects r
             JOIN print_runs pr ON pr.id = r.run_id
             WHERE pr.workspace_id = $1
             ORDER BY r.created_at DESC, r.id DESC
             LIMIT $2",
        )
        .bind(workspace_id)
        .bind(limit)
        .fetch_all(pool)
        .await
    }

    pub async fn method_counts_since(
        pool: &PgPool,
        workspace_id: DbId,
        since: ashley_core::types::Timestamp,
    ) -> Result<Vec<MethodCount>, sqlx::Error> {
        sqlx::query_as::<_, MethodCount>(
            "SELECT method, COUNT(*) AS runs
             FROM print_runs
             WHERE workspace_id = $1 AND created_at >= $2
             GROUP BY method
             ORDER BY runs DESC, method",
        )
        .bind(workspace_id)
        .bind(since)
        .fetch_all(pool)
        .await
    }
}

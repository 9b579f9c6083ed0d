//! Repositories for assets, maintenance schedules and work orders.

use ashley_core::maintenance::{advance, format_work_order_number, WO_COMPLETED};
use ashley_core::types::{Date, DbId};
use sqlx::PgPool;

use crate::models::maintenance::{
    Asset, CreateAsset, CreateSchedule, MaintenanceSchedule, NewWorkOrder, UpdateAsset, WorkOrder,
};

const ASSET_COLUMNS: &str = "id, workspace_id, asset_number, name, asset_type, location, status, \
                             purchase_date, notes, created_at, updated_at";

const SCHEDULE_COLUMNS: &str = "id, workspace_id, asset_id, name, description, maintenance_type, \
                                frequency_type, frequency_value, priority, estimated_duration, \
                                assigned_to, last_completed_date, next_due_date, is_active, \
                                created_at, updated_at";

const WO_COLUMNS: &str = "id, workspace_id, wo_number, asset_id, schedule_id, title, description, \
                          priority, status, assigned_to, scheduled_date, completed_at, \
                          completion_notes, created_by, created_at, updated_at";

/// Result of deleting a schedule.
#[derive(Debug, PartialEq, Eq)]
pub enum ScheduleDeleteOutcome {
    Deleted,
    NotFound,
    /// Work orders that are not yet completed still reference the schedule.
    Blocked(i64),
}

pub struct AssetRepo;

impl AssetRepo {
    pub async fn create(
        pool: &PgPool,
        workspace_id: DbId,
        input: &CreateAsset,
    ) -> Result<Asset, sqlx::Error> {
        let query = format!(
            "INSERT INTO assets
                (workspace_id, asset_number, name, asset_type, location, status, purchase_date, notes)
             VALUES ($1, $2, $3, $4, $5, COALESCE($6, 'ACTIVE'), $7, $8)
             RETURNING {ASSET_COLUMNS}"
        );
        sqlx::query_as::<_, Asset>(&query)
            .bind(workspace_id)
            .bind(&input.asset_number)
            .bind(&input.name)
            .bind(&input.asset_type)
            .bind(&input.location)
            .bind(&input.status)
            .bind(input.purchase_date)
            .bind(&input.notes)
            .fetch_one(pool)
            .await
    }

    pub async fn find_by_id(
        pool: &PgPool,
        workspace_id: DbId,
        id: DbId,
    ) -> Result<Option<Asset>, sqlx::Error> {
        let query = format!("SELECT {ASSET_COLUMNS} FROM assets WHERE id = $1 AND workspace_id = $2");
        sqlx::query_as::<_, Asset>(&query)
            .bind(id)
            .bind(workspace_id)
            .fetch_optional(pool)
            .await
    }

    pub async fn list(
        pool: &PgPool,
        workspace_id: DbId,
        status: Option<&str>,
        asset_type: Option<&str>,
    ) -> Result<Vec<Asset>, sqlx::Error> {
        let query = format!(
            "SELECT {ASSET_COLUMNS} FROM assets
             WHERE workspace_id = $1
               AND ($2::TEXT IS NULL OR status = $2)
               AND ($3::TEXT IS NULL OR asset_type = $3)
             ORDER BY asset_number"
        );
        sqlx::query_as::<_, Asset>(&query)
            .bind(workspace_id)
            .bind(status)
            .bind(asset_type)
            .fetch_all(pool)
            .await
    }

    pub async fn update(
        pool: &PgPool,
        workspace_id: DbId,
        id: DbId,
        input: &UpdateAsset,
    ) -> Result<Option<Asset>, sqlx::Error> {
        let query = format!(
            "UPDATE assets SET
                name = COALESCE($3, name),
                asset_type = COALESCE($4, asset_type),
                location = COALESCE($5, location),
                status = COALESCE($6, status),
                purchase_date = COALESCE($7, purchase_date),
                notes = COALESCE($8, notes)
             WHERE id = $1 AND workspace_id = $2
             RETURNING {ASSET_COLUMNS}"
        );
        sqlx::query_as::<_, Asset>(&query)
            .bind(id)
            .bind(workspace_id)
            .bind(&input.name)
            .bind(&input.asset_type)
            .bind(&input.location)
            .bind(&input.status)
            .bind(input.purchase_date)
            .bind(&input.notes)
            .fetch_optional(pool)
            .await
    }
}

pub struct ScheduleRepo;

impl ScheduleRepo {
    pub async fn create(
        pool: &PgPool,
        workspace_id: DbId,
        input: &CreateSchedule,
        frequency_value: i32,
        priority: &str,
        next_due_date: Date,
    ) -> Result<MaintenanceSchedule, sqlx::Error> {
        let query = format!(
            "INSERT INTO maintenance_schedules
                (workspace_id, asset_id, name, description, maintenance_type, frequency_type,
                 frequency_value, priority, estimated_duration, assigned_to, next_due_date)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
             RETURNING {SCHEDULE_COLUMNS}"
        );
        sqlx::query_as::<_, MaintenanceSchedule>(&query)
            .bind(workspace_id)
            .bind(input.asset_id)
            .bind(&input.name)
            .bind(&input.description)
            .bind(&input.maintenance_type)
            .bind(&input.frequency_type)
            .bind(frequency_value)
            .bind(priority)
            .bind(input.estimated_duration)
            .bind(input.assigned_to)
            .bind(next_due_date)
            .fetch_one(pool)
            .await
    }

    pub async fn find_by_id(
        pool: &PgPool,
        workspace_id: DbId,
        id: DbId,
    ) -> Result<Option<MaintenanceSchedule>, sqlx::Error> {
        let query = format!(
            "SELECT {SCHEDULE_COLUMNS} FROM maintenance_schedules WHERE id = $1 AND workspace_id = $2"
        );
        sqlx::query_as::<_, MaintenanceSchedule>(&query)
            .bind(id)
            .bind(workspace_id)
            .fetch_optional(pool)
            .await
    }

    pub async fn list(
        pool: &PgPool,
        workspace_id: DbId,
        asset_id: Option<DbId>,
    ) -> Result<Vec<MaintenanceSchedule>, sqlx::Error> {
        let query = format!(
            "SELECT {SCHEDULE_COLUMNS} FROM maintenance_schedules
             WHERE workspace_id = $1 AND ($2::BIGINT IS NULL OR asset_id = $2)
             ORDER BY next_due_date, id"
        );
        sqlx::query_as::<_, MaintenanceSchedule>(&query)
            .bind(workspace_id)
            .bind(asset_id)
            .fetch_all(pool)
            .await
    }

    /// Delete a schedule unless unfinished work orders reference it.
    /// Completed work orders are detached first.
    pub async fn delete(
        pool: &PgPool,
        workspace_id: DbId,
        id: DbId,
    ) -> Result<ScheduleDeleteOutcome, sqlx::Error> {
        let mut tx = pool.begin().await?;

        let found: Option<(DbId,)> = sqlx::query_as(
            "SELECT id FROM maintenance_schedules WHERE id = $1 AND workspace_id = $2 FOR UPDATE",
        )
        .bind(id)
        .bind(workspace_id)
        .fetch_optional(&mut *tx)
        .await?;
        if found.is_none() {
            return Ok(ScheduleDeleteOutcome::NotFound);
        }

        let (open,): (i64,) = sqlx::query_as(
            "SELECT COUNT(*) FROM work_orders WHERE schedule_id = $1 AND status <> $2",
        )
        .bind(id)
        .bind(WO_COMPLETED)
        .fetch_one(&mut *tx)
        .await?;
        if open > 0 {
            return Ok(ScheduleDeleteOutcome::Blocked(open));
        }

        sqlx::query("UPDATE work_orders SET schedule_id = NULL WHERE schedule_id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;
        sqlx::query("DELETE FROM maintenance_schedules WHERE id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(ScheduleDeleteOutcome::Deleted)
    }
}

pub struct WorkOrderRepo;

impl WorkOrderRepo {
    /// Create a work order numbered `WO-{year}-NNNN`.
    pub async fn create(
        pool: &PgPool,
        input: &NewWorkOrder,
        year: i32,
    ) -> Result<WorkOrder, sqlx::Error> {
        let mut tx = pool.begin().await?;

        sqlx::query("SELECT id FROM workspaces WHERE id = $1 FOR UPDATE")
            .bind(input.workspace_id)
            .execute(&mut *tx)
            .await?;

        let (existing,): (i64,) = sqlx::query_as(
            "SELECT COUNT(*) FROM work_orders
             WHERE workspace_id = $1 AND EXTRACT(YEAR FROM created_at AT TIME ZONE 'UTC')::INT = $2",
        )
        .bind(input.workspace_id)
        .bind(year)
        .fetch_one(&mut *tx)
        .await?;

        let query = format!(
            "INSERT INTO work_orders
                (workspace_id, wo_number, asset_id, schedule_id, title, description, priority,
                 assigned_to, scheduled_date, created_by)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
             RETURNING {WO_COLUMNS}"
        );
        let wo = sqlx::query_as::<_, WorkOrder>(&query)
            .bind(input.workspace_id)
            .bind(format_work_order_number(year, existing + 1))
            .bind(input.asset_id)
            .bind(input.schedule_id)
            .bind(&input.title)
            .bind(&input.description)
            .bind(&input.priority)
            .bind(input.assigned_to)
            .bind(input.scheduled_date)
            .bind(input.created_by)
            .fetch_one(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(wo)
    }

    pub async fn find_by_id(
        pool: &PgPool,
        workspace_id: DbId,
        id: DbId,
    ) -> Result<Option<WorkOrder>, sqlx::Error> {
        let query = format!("SELECT {WO_COLUMNS} FROM work_orders WHERE id = $1 AND workspace_id = $2");
        sqlx::query_as::<_, WorkOrder>(&query)
            .bind(id)
            .bind(workspace_id)
            .fetch_optional(pool)
            .await
    }

    pub async fn list(
        pool: &PgPool,
        workspace_id: DbId,
        status: Option<&str>,
        asset_id: Option<DbId>,
    ) -> Result<Vec<WorkOrder>, sqlx::Error> {
        let query = format!(
            "SELECT {WO_COLUMNS} FROM work_orders
             WHERE workspace_id = $1
               AND ($2::TEXT IS NULL OR status = $2)
               AND ($3::BIGINT IS NULL OR asset_id = $3)
             ORDER BY created_at DESC, id DESC"
        );
        sqlx::query_as::<_, WorkOrder>(&query)
            .bind(workspace_id)
            .bind(status)
            .bind(asset_id)
            .fetch_all(pool)
            .await
    }

    /// Move a work order from `from` to a non-completed status.
    pub async fn set_status(
        pool: &PgPool,
        id: DbId,
        from: &str,
        status: &str,
    ) -> Result<Option<WorkOrder>, sqlx::Error> {
        let query = format!(
            "UPDATE work_orders SET status = $2 WHERE id = $1 AND status = $3 RETURNING {WO_COLUMNS}"
        );
        sqlx::query_as::<_, WorkOrder>(&query)
            .bind(id)
            .bind(status)
            .bind(from)
            .fetch_optional(pool)
            .await
    }

    /// Complete a work order. When it came from a schedule, the schedule's
    /// last completion is set to `completed_on` and its next due date is
    /// advanced by the schedule frequency. `None` when the work order had
    /// already left `from`.
    pub async fn complete(
        pool: &PgPool,
        id: DbId,
        from: &str,
        completion_notes: Option<&str>,
        completed_on: Date,
    ) -> Result<Option<(WorkOrder, Option<MaintenanceSchedule>)>, sqlx::Error> {
        let mut tx = pool.begin().await?;

        let query = format!(
            "UPDATE work_orders SET
                status = $2,
                completed_at = NOW(),
                completion_notes = COALESCE($3, completion_notes)
             WHERE id = $1 AND status = $4
             RETURNING {WO_COLUMNS}"
        );
        let Some(wo) = sqlx::query_as::<_, WorkOrder>(&query)
            .bind(id)
            .bind(WO_COMPLETED)
            .bind(completion_notes)
            .bind(from)
            .fetch_optional(&mut *tx)
            .await?
        else {
            return Ok(None);
        };

        let schedule = match wo.schedule_id {
            Some(schedule_id) => {
                let select = format!(
                    "SELECT {SCHEDULE_COLUMNS} FROM maintenance_schedules WHERE id = $1 FOR UPDATE"
                );
                let current = sqlx::query_as::<_, MaintenanceSchedule>(&select)
                    .bind(schedule_id)
                    .fetch_one(&mut *tx)
                    .await?;
                let next_due = advance(completed_on, &current.frequency_type, current.frequency_value)
                    .unwrap_or(current.next_due_date);

                let update = format!(
                    "UPDATE maintenance_schedules SET last_completed_date = $2, next_due_date = $3
                     WHERE id = $1
                     RETURNING {SCHEDULE_COLUMNS}"
                );
                Some(
                    sqlx::query_as::<_, MaintenanceSchedule>(&update)
                        .bind(schedule_id)
                        .bind(completed_on)
                        .bind(next_due)
                        .fetch_one(&mut *tx)
                        .await?,
                )
            }
            None => None,
        };

        tx.commit().await?;
        Ok(Some((wo, schedule)))
    }
}

//! Repositories for QC defect codes, checklists, inspections and defects.

use ashley_core::quality::{
    severity_counter_column, INSPECTION_COMPLETED, INSPECTION_IN_PROGRESS, INSPECTION_PENDING,
};
use ashley_core::types::DbId;
use sqlx::PgPool;

use crate::models::capa::{CapaTask, CreateCapa};
use crate::models::quality::{
    Checklist, CreateChecklist, CreateDefect, CreateDefectCode, CreateInspection, Defect,
    DefectCode, Inspection, NewInspection,
};
use crate::repositories::CapaRepo;

const CODE_COLUMNS: &str = "id, workspace_id, code, name, category, severity, description, created_at";

const CHECKLIST_COLUMNS: &str = "id, workspace_id, name, checklist_type, items, is_active, created_at";

const INSPECTION_COLUMNS: &str = "id, workspace_id, order_id, bundle_id, checklist_id, \
                                  inspection_type, lot_size, sample_size, aql_critical, aql_major, \
                                  aql_minor, acceptance_number, rejection_number, critical_found, \
                                  major_found, minor_found, status, result, inspector_id, notes, \
                                  started_at, completed_at, created_at, updated_at";

const DEFECT_COLUMNS: &str = "id, inspection_id, defect_code_id, quantity, severity, location, \
                              photo_url, notes, created_at";

/// `$1` workspace, `$2` status, `$3` result, `$4` order.
const LIST_FILTER: &str = "workspace_id = $1
    AND ($2::TEXT IS NULL OR status = $2)
    AND ($3::TEXT IS NULL OR result = $3)
    AND ($4::BIGINT IS NULL OR order_id = $4)";

pub struct DefectCodeRepo;

impl DefectCodeRepo {
    pub async fn create(
        pool: &PgPool,
        workspace_id: DbId,
        input: &CreateDefectCode,
    ) -> Result<DefectCode, sqlx::Error> {
        let query = format!(
            "INSERT INTO qc_defect_codes (workspace_id, code, name, category, severity, description)
             VALUES ($1, $2, $3, $4, $5, $6)
             RETURNING {CODE_COLUMNS}"
        );
        sqlx::query_as::<_, DefectCode>(&query)
            .bind(workspace_id)
            .bind(&input.code)
            .bind(&input.name)
            .bind(&input.category)
            .bind(&input.severity)
            .bind(&input.description)
            .fetch_one(pool)
            .await
    }

    pub async fn find_by_id(
        pool: &PgPool,
        workspace_id: DbId,
        id: DbId,
    ) -> Result<Option<DefectCode>, sqlx::Error> {
        let query = format!(
            "SELECT {CODE_COLUMNS} FROM qc_defect_codes WHERE id = $1 AND workspace_id = $2"
        );
        sqlx::query_as::<_, DefectCode>(&query)
            .bind(id)
            .bind(workspace_id)
            .fetch_optional(pool)
            .await
    }

    pub async fn list(pool: &PgPool, workspace_id: DbId) -> Result<Vec<DefectCode>, sqlx::Error> {
        let query = format!(
            "SELECT {CODE_COLUMNS} FROM qc_defect_codes WHERE workspace_id = $1 ORDER BY code"
        );
        sqlx::query_as::<_, DefectCode>(&query)
            .bind(workspace_id)
            .fetch_all(pool)
            .await
    }
}

pub struct ChecklistRepo;

impl ChecklistRepo {
    pub async fn create(
        pool: &PgPool,
        workspace_id: DbId,
        input: &CreateChecklist,
    ) -> Result<Checklist, sqlx::Error> {
        let query = format!(
            "INSERT INTO qc_checklists (workspace_id, name, checklist_type, items)
             VALUES ($1, $2, $3, $4)
             RETURNING {CHECKLIST_COLUMNS}"
        );
        let items = if input.items.is_null() {
            serde_json::Value::Array(Vec::new())
        } else {
            input.items.clone()
        };
        sqlx::query_as::<_, Checklist>(&query)
            .bind(workspace_id)
            .bind(&input.name)
            .bind(&input.checklist_type)
            .bind(items)
            .fetch_one(pool)
            .await
    }

    pub async fn list(
        pool: &PgPool,
        workspace_id: DbId,
        checklist_type: Option<&str>,
    ) -> Result<Vec<Checklist>, sqlx::Error> {
        let query = format!(
            "SELECT {CHECKLIST_COLUMNS} FROM qc_checklists
             WHERE workspace_id = $1 AND ($2::TEXT IS NULL OR checklist_type = $2)
             ORDER BY name"
        );
        sqlx::query_as::<_, Checklist>(&query)
            .bind(workspace_id)
            .bind(checklist_type)
            .fetch_all(pool)
            .await
    }
}

pub struct InspectionRepo;

impl InspectionRepo {
    pub async fn create(
        pool: &PgPool,
        workspace_id: DbId,
        input: &CreateInspection,
        plan: &NewInspection,
        inspector_id: DbId,
    ) -> Result<Inspection, sqlx::Error> {
        let query = format!(
            "INSERT INTO qc_inspections
                (workspace_id, order_id, bundle_id, checklist_id, inspection_type, lot_size,
                 sample_size, aql_critical, aql_major, aql_minor, acceptance_number,
                 rejection_number, inspector_id, notes)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14)
             RETURNING {INSPECTION_COLUMNS}"
        );
        sqlx::query_as::<_, Inspection>(&query)
            .bind(workspace_id)
            .bind(input.order_id)
            .bind(input.bundle_id)
            .bind(input.checklist_id)
            .bind(&input.inspection_type)
            .bind(input.lot_size)
            .bind(plan.sample_size)
            .bind(plan.aql_critical)
            .bind(plan.aql_major)
            .bind(plan.aql_minor)
            .bind(plan.acceptance_number)
            .bind(plan.rejection_number)
            .bind(inspector_id)
            .bind(&input.notes)
            .fetch_one(pool)
            .await
    }

    pub async fn find_by_id(
        pool: &PgPool,
        workspace_id: DbId,
        id: DbId,
    ) -> Result<Option<Inspection>, sqlx::Error> {
        let query = format!(
            "SELECT {INSPECTION_COLUMNS} FROM qc_inspections WHERE id = $1 AND workspace_id = $2"
        );
        sqlx::query_as::<_, Inspection>(&query)
            .bind(id)
            .bind(workspace_id)
            .fetch_optional(pool)
            .await
    }

    pub async fn list(
        pool: &PgPool,
        workspace_id: DbId,
        status: Option<&str>,
        result: Option<&str>,
        order_id: Option<DbId>,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<Inspection>, sqlx::Error> {
        let query = format!(
            "SELECT {INSPECTION_COLUMNS} FROM qc_inspections
             WHERE {LIST_FILTER}
             ORDER BY created_at DESC, id DESC
             LIMIT $5 OFFSET $6"
        );
        sqlx::query_as::<_, Inspection>(&query)
            .bind(workspace_id)
            .bind(status)
            .bind(result)
            .bind(order_id)
            .bind(limit)
            .bind(offset)
            .fetch_all(pool)
            .await
    }

    /// PENDING → IN_PROGRESS. `None` when the inspection is no longer pending.
    pub async fn start(pool: &PgPool, id: DbId) -> Result<Option<Inspection>, sqlx::Error> {
        let query = format!(
            "UPDATE qc_inspections SET status = $2, started_at = NOW()
             WHERE id = $1 AND status = $3
             RETURNING {INSPECTION_COLUMNS}"
        );
        sqlx::query_as::<_, Inspection>(&query)
            .bind(id)
            .bind(INSPECTION_IN_PROGRESS)
            .bind(INSPECTION_PENDING)
            .fetch_optional(pool)
            .await
    }

    /// Record a defect and bump the matching severity counter atomically.
    ///
    /// The inspection row is locked first; `None` means it was no longer
    /// in progress and nothing was written.
    pub async fn record_defect(
        pool: &PgPool,
        inspection_id: DbId,
        severity: &str,
        input: &CreateDefect,
    ) -> Result<Option<Defect>, sqlx::Error> {
        let column = severity_counter_column(severity)
            .ok_or_else(|| sqlx::Error::Protocol(format!("unknown severity '{severity}'")))?;

        let mut tx = pool.begin().await?;

        let locked: Option<(DbId,)> =
            sqlx::query_as("SELECT id FROM qc_inspections WHERE id = $1 AND status = $2 FOR UPDATE")
                .bind(inspection_id)
                .bind(INSPECTION_IN_PROGRESS)
                .fetch_optional(&mut *tx)
                .await?;
        if locked.is_none() {
            return Ok(None);
        }

        let query = format!(
            "INSERT INTO qc_defects
                (inspection_id, defect_code_id, quantity, severity, location, photo_url, notes)
             VALUES ($1, $2, $3, $4, $5, $6, $7)
             RETURNING {DEFECT_COLUMNS}"
        );
        let defect = sqlx::query_as::<_, Defect>(&query)
            .bind(inspection_id)
            .bind(input.defect_code_id)
            .bind(input.quantity)
            .bind(severity)
            .bind(&input.location)
            .bind(&input.photo_url)
            .bind(&input.notes)
            .fetch_one(&mut *tx)
            .await?;

        let update = format!("UPDATE qc_inspections SET {column} = {column} + $2 WHERE id = $1");
        sqlx::query(&update)
            .bind(inspection_id)
            .bind(input.quantity)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(Some(defect))
    }

    pub async fn defects(pool: &PgPool, inspection_id: DbId) -> Result<Vec<Defect>, sqlx::Error> {
        let query = format!(
            "SELECT {DEFECT_COLUMNS} FROM qc_defects WHERE inspection_id = $1 ORDER BY id"
        );
        sqlx::query_as::<_, Defect>(&query)
            .bind(inspection_id)
            .fetch_all(pool)
            .await
    }

    /// Complete an inspection with its result, creating the follow-up CAPA
    /// task in the same transaction when one is given.
    ///
    /// `evaluated` is the row the result was computed from. The update only
    /// applies while the inspection is still in progress with the same
    /// defect counts; otherwise nothing is written and `None` is returned.
    pub async fn complete(
        pool: &PgPool,
        workspace_id: DbId,
        evaluated: &Inspection,
        result: &str,
        notes: Option<&str>,
        follow_up: Option<(i32, &CreateCapa)>,
        actor: DbId,
    ) -> Result<Option<(Inspection, Option<CapaTask>)>, sqlx::Error> {
        let mut tx = pool.begin().await?;

        let query = format!(
            "UPDATE qc_inspections SET
                status = $2,
                result = $3,
                notes = COALESCE($4, notes),
                completed_at = NOW()
             WHERE id = $1 AND status = $5
               AND critical_found = $6 AND major_found = $7 AND minor_found = $8
             RETURNING {INSPECTION_COLUMNS}"
        );
        let Some(inspection) = sqlx::query_as::<_, Inspection>(&query)
            .bind(evaluated.id)
            .bind(INSPECTION_COMPLETED)
            .bind(result)
            .bind(notes)
            .bind(INSPECTION_IN_PROGRESS)
            .bind(evaluated.critical_found)
            .bind(evaluated.major_found)
            .bind(evaluated.minor_found)
            .fetch_optional(&mut *tx)
            .await?
        else {
            return Ok(None);
        };

        let capa = match follow_up {
            Some((year, input)) => {
                Some(CapaRepo::insert_numbered(&mut tx, workspace_id, year, input, Some(actor)).await?)
            }
            None => None,
        };

        tx.commit().await?;
        Ok(Some((inspection, capa)))
    }
}

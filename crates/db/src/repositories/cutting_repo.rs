//! Repositories for fabric batches, issues and cut lays.

use ashley_core::types::DbId;
use sqlx::PgPool;

use crate::models::cutting::{
    CreateCutLay, CreateFabricBatch, CreateFabricIssue, CutLay, CutLayOutput, CuttingTotals,
    FabricBatch, FabricIssue,
};

const BATCH_COLUMNS: &str = "id, workspace_id, lot_no, fabric_type, color, gsm, width_cm, uom, \
                             qty_on_hand, created_at, updated_at";

const ISSUE_COLUMNS: &str = "id, workspace_id, batch_id, order_id, qty_issued, uom, issued_by, created_at";

const LAY_COLUMNS: &str = "id, workspace_id, order_id, marker_name, marker_width_cm, lay_length_m, \
                           plies, gross_used, offcuts, defects, uom, created_by, created_at";

/// Result of attempting to draw fabric from a batch.
#[derive(Debug)]
pub enum IssueOutcome {
    Issued(FabricIssue),
    BatchNotFound,
    UomMismatch { batch_uom: String },
    Insufficient { on_hand: f64 },
}

pub struct FabricRepo;

impl FabricRepo {
    pub async fn create_batch(
        pool: &PgPool,
        workspace_id: DbId,
        input: &CreateFabricBatch,
    ) -> Result<FabricBatch, sqlx::Error> {
        let query = format!(
            "INSERT INTO fabric_batches
                (workspace_id, lot_no, fabric_type, color, gsm, width_cm, uom, qty_on_hand)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
             RETURNING {BATCH_COLUMNS}"
        );
        sqlx::query_as::<_, FabricBatch>(&query)
            .bind(workspace_id)
            .bind(&input.lot_no)
            .bind(&input.fabric_type)
            .bind(&input.color)
            .bind(input.gsm)
            .bind(input.width_cm)
            .bind(&input.uom)
            .bind(input.qty_on_hand)
            .fetch_one(pool)
            .await
    }

    pub async fn list_batches(
        pool: &PgPool,
        workspace_id: DbId,
    ) -> Result<Vec<FabricBatch>, sqlx::Error> {
        let query = format!(
            "SELECT {BATCH_COLUMNS} FROM fabric_batches
             WHERE workspace_id = $1
             ORDER BY created_at DESC"
        );
        sqlx::query_as::<_, FabricBatch>(&query)
            .bind(workspace_id)
            .fetch_all(pool)
            .await
    }

    /// Issue fabric to an order, decrementing the batch under a row lock.
    pub async fn issue(
        pool: &PgPool,
        workspace_id: DbId,
        input: &CreateFabricIssue,
        issued_by: DbId,
    ) -> Result<IssueOutcome, sqlx::Error> {
        let mut tx = pool.begin().await?;

        let batch: Option<(String, f64)> = sqlx::query_as(
            "SELECT uom, qty_on_hand FROM fabric_batches
             WHERE id = $1 AND workspace_id = $2
             FOR UPDATE",
        )
        .bind(input.batch_id)
        .bind(workspace_id)
        .fetch_optional(&mut *tx)
        .await?;

        let Some((batch_uom, on_hand)) = batch else {
            return Ok(IssueOutcome::BatchNotFound);
        };
        if batch_uom != input.uom {
            return Ok(IssueOutcome::UomMismatch { batch_uom });
        }
        if on_hand < input.qty {
            return Ok(IssueOutcome::Insufficient { on_hand });
        }

        sqlx::query("UPDATE fabric_batches SET qty_on_hand = qty_on_hand - $2 WHERE id = $1")
            .bind(input.batch_id)
            .bind(input.qty)
            .execute(&mut *tx)
            .await?;

        let query = format!(
            "INSERT INTO fabric_issues (workspace_id, batch_id, order_id, qty_issued, uom, issued_by)
             VALUES ($1, $2, $3, $4, $5, $6)
             RETURNING {ISSUE_COLUMNS}"
        );
        let issue = sqlx::query_as::<_, FabricIssue>(&query)
            .bind(workspace_id)
            .bind(input.batch_id)
            .bind(input.order_id)
            .bind(input.qty)
            .bind(&input.uom)
            .bind(issued_by)
            .fetch_one(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(IssueOutcome::Issued(issue))
    }
}

pub struct CutLayRepo;

impl CutLayRepo {
    /// Insert a lay and its outputs in one transaction.
    pub async fn create(
        pool: &PgPool,
        workspace_id: DbId,
        input: &CreateCutLay,
        created_by: DbId,
    ) -> Result<(CutLay, Vec<CutLayOutput>), sqlx::Error> {
        let mut tx = pool.begin().await?;

        let query = format!(
            "INSERT INTO cut_lays
                (workspace_id, order_id, marker_name, marker_width_cm, lay_length_m, plies,
                 gross_used, offcuts, defects, uom, created_by)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
             RETURNING {LAY_COLUMNS}"
        );
        let lay = sqlx::query_as::<_, CutLay>(&query)
            .bind(workspace_id)
            .bind(input.order_id)
            .bind(&input.marker_name)
            .bind(input.marker_width_cm)
            .bind(input.lay_length_m)
            .bind(input.plies)
            .bind(input.gross_used)
            .bind(input.offcuts)
            .bind(input.defects)
            .bind(&input.uom)
            .bind(created_by)
            .fetch_one(&mut *tx)
            .await?;

        let mut outputs = Vec::with_capacity(input.outputs.len());
        for output in &input.outputs {
            let row = sqlx::query_as::<_, CutLayOutput>(
                "INSERT INTO cut_lay_outputs (lay_id, size_code, qty)
                 VALUES ($1, $2, $3)
                 RETURNING id, lay_id, size_code, qty",
            )
            .bind(lay.id)
            .bind(&output.size_code)
            .bind(output.qty)
            .fetch_one(&mut *tx)
            .await?;
            outputs.push(row);
        }

        tx.commit().await?;
        Ok((lay, outputs))
    }

    pub async fn find_by_id(
        pool: &PgPool,
        workspace_id: DbId,
        id: DbId,
    ) -> Result<Option<CutLay>, sqlx::Error> {
        let query = format!("SELECT {LAY_COLUMNS} FROM cut_lays WHERE id = $1 AND workspace_id = $2");
        sqlx::query_as::<_, CutLay>(&query)
            .bind(id)
            .bind(workspace_id)
            .fetch_optional(pool)
            .await
    }

    pub async fn list(
        pool: &PgPool,
        workspace_id: DbId,
        order_id: Option<DbId>,
    ) -> Result<Vec<CutLay>, sqlx::Error> {
        let query = format!(
            "SELECT {LAY_COLUMNS} FROM cut_lays
             WHERE workspace_id = $1 AND ($2::BIGINT IS NULL OR order_id = $2)
             ORDER BY created_at DESC, id DESC"
        );
        sqlx::query_as::<_, CutLay>(&query)
            .bind(workspace_id)
            .bind(order_id)
            .fetch_all(pool)
            .await
    }

    /// Outputs for a set of lays, ordered by lay then size.
    pub async fn outputs_for(
        pool: &PgPool,
        lay_ids: &[DbId],
    ) -> Result<Vec<CutLayOutput>, sqlx::Error> {
        sqlx::query_as::<_, CutLayOutput>(
            "SELECT id, lay_id, size_code, qty FROM cut_lay_outputs
             WHERE lay_id = ANY($1)
             ORDER BY lay_id, id",
        )
        .bind(lay_ids)
        .fetch_all(pool)
        .await
    }

    /// Issued, used, cut and bundled totals for one order.
    pub async fn totals_for_order(
        pool: &PgPool,
        order_id: DbId,
    ) -> Result<CuttingTotals, sqlx::Error> {
        sqlx::query_as::<_, CuttingTotals>(
            "SELECT
                (SELECT COALESCE(SUM(qty_issued), 0)::FLOAT8 FROM fabric_issues WHERE order_id = $1)
                    AS total_fabric_issued,
                (SELECT COALESCE(SUM(gross_used), 0)::FLOAT8 FROM cut_lays WHERE order_id = $1)
                    AS total_gross_used,
                (SELECT COALESCE(SUM(o.qty), 0)::BIGINT
                   FROM cut_lay_outputs o JOIN cut_lays l ON l.id = o.lay_id
                  WHERE l.order_id = $1) AS total_pieces_cut,
                (SELECT COUNT(*) FROM bundles WHERE order_id = $1) AS total_bundles",
        )
        .bind(order_id)
        .fetch_one(pool)
        .await
    }
}

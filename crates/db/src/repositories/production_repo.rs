//! Repositories for bundles and the production summary.

use ashley_core::cutting::{bundle_qr_code, BundlePlan};
use ashley_core::types::DbId;
use sqlx::PgPool;

use crate::models::production::{Bundle, DepartmentActivity, ProductionCounts};

const COLUMNS: &str = "id, workspace_id, order_id, lay_id, bundle_no, size_code, qty, qr_code, \
                       status, created_at, updated_at";

pub struct BundleRepo;

impl BundleRepo {
    /// Create bundles for a lay, numbering them after the order's last bundle.
    ///
    /// Returns `None` when the lay has already produced bundles.
    pub async fn create_for_lay(
        pool: &PgPool,
        workspace_id: DbId,
        order_id: DbId,
        order_number: &str,
        lay_id: DbId,
        plan: &[BundlePlan],
    ) -> Result<Option<Vec<Bundle>>, sqlx::Error> {
        let mut tx = pool.begin().await?;

        sqlx::query("SELECT id FROM orders WHERE id = $1 FOR UPDATE")
            .bind(order_id)
            .execute(&mut *tx)
            .await?;

        let (existing,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM bundles WHERE lay_id = $1")
            .bind(lay_id)
            .fetch_one(&mut *tx)
            .await?;
        if existing > 0 {
            return Ok(None);
        }

        let (last_no,): (i32,) =
            sqlx::query_as("SELECT COALESCE(MAX(bundle_no), 0) FROM bundles WHERE order_id = $1")
                .bind(order_id)
                .fetch_one(&mut *tx)
                .await?;

        let query = format!(
            "INSERT INTO bundles (workspace_id, order_id, lay_id, bundle_no, size_code, qty, qr_code)
             VALUES ($1, $2, $3, $4, $5, $6, $7)
             RETURNING {COLUMNS}"
        );
        let mut created = Vec::with_capacity(plan.len());
        for (i, b) in plan.iter().enumerate() {
            let bundle_no = last_no + i as i32 + 1;
            let row = sqlx::query_as::<_, Bundle>(&query)
                .bind(workspace_id)
                .bind(order_id)
                .bind(lay_id)
                .bind(bundle_no)
                .bind(&b.size_code)
                .bind(b.qty)
                .bind(bundle_qr_code(order_number, bundle_no))
                .fetch_one(&mut *tx)
                .await?;
            created.push(row);
        }

        tx.commit().await?;
        Ok(Some(created))
    }

    pub async fn find_by_id(
        pool: &PgPool,
        workspace_id: DbId,
        id: DbId,
    ) -> Result<Option<Bundle>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM bundles WHERE id = $1 AND workspace_id = $2");
        sqlx::query_as::<_, Bundle>(&query)
            .bind(id)
            .bind(workspace_id)
            .fetch_optional(pool)
            .await
    }

    pub async fn list(
        pool: &PgPool,
        workspace_id: DbId,
        order_id: Option<DbId>,
        status: Option<&str>,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<Bundle>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM bundles
             WHERE workspace_id = $1
               AND ($2::BIGINT IS NULL OR order_id = $2)
               AND ($3::TEXT IS NULL OR status = $3)
             ORDER BY order_id, bundle_no
             LIMIT $4 OFFSET $5"
        );
        sqlx::query_as::<_, Bundle>(&query)
            .bind(workspace_id)
            .bind(order_id)
            .bind(status)
            .bind(limit)
            .bind(offset)
            .fetch_all(pool)
            .await
    }

    /// Move a bundle from `from` to `to`; `None` when it is no longer in `from`.
    pub async fn update_status(
        pool: &PgPool,
        id: DbId,
        from: &str,
        to: &str,
    ) -> Result<Option<Bundle>, sqlx::Error> {
        let query = format!(
            "UPDATE bundles SET status = $2 WHERE id = $1 AND status = $3 RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Bundle>(&query)
            .bind(id)
            .bind(to)
            .bind(from)
            .fetch_optional(pool)
            .await
    }
}

pub struct ProductionRepo;

impl ProductionRepo {
    pub async fn counts(pool: &PgPool, workspace_id: DbId) -> Result<ProductionCounts, sqlx::Error> {
        sqlx::query_as::<_, ProductionCounts>(
            "SELECT
                (SELECT COUNT(*) FROM orders
                  WHERE workspace_id = $1 AND status IN ('confirmed', 'in_progress')) AS active_orders,
                (SELECT COUNT(*) FROM orders
                  WHERE workspace_id = $1 AND status = 'completed') AS completed_orders,
                (SELECT COUNT(*) FROM bundles WHERE workspace_id = $1) AS total_bundles,
                (SELECT COUNT(*) FROM bundles
                  WHERE workspace_id = $1 AND status = 'IN_PROGRESS') AS bundles_in_progress,
                (SELECT COUNT(*) FROM qc_inspections
                  WHERE workspace_id = $1 AND status = 'PENDING') AS pending_inspections,
                (SELECT COUNT(*) FROM employees
                  WHERE workspace_id = $1 AND is_active) AS active_employees",
        )
        .bind(workspace_id)
        .fetch_one(pool)
        .await
    }

    /// In-progress routing steps per department.
    pub async fn department_activity(
        pool: &PgPool,
        workspace_id: DbId,
    ) -> Result<Vec<DepartmentActivity>, sqlx::Error> {
        sqlx::query_as::<_, DepartmentActivity>(
            "SELECT rs.department, COUNT(*) AS in_progress
             FROM routing_steps rs
             JOIN orders o ON o.id = rs.order_id
             WHERE o.workspace_id = $1 AND rs.status = 'in_progress'
             GROUP BY rs.department
             ORDER BY rs.department",
        )
        .bind(workspace_id)
        .fetch_all(pool)
        .await
    }
}

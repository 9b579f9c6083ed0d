//! Repository for design assets, versions and portal approvals.

use ashley_core::design::{
    APPROVAL_APPROVED, APPROVAL_CHANGES_REQUESTED, APPROVAL_SENT, ASSET_APPROVED, ASSET_DRAFT,
    ASSET_LOCKED, ASSET_PENDING_APPROVAL,
};
use ashley_core::types::{DbId, Timestamp};
use serde_json::{json, Value};
use sqlx::PgPool;

use crate::models::design::{
    DesignApproval, DesignAsset, DesignVersion, PortalOrderSummary, UploadDesign, UploadResult,
};

const ASSET_COLUMNS: &str = "id, workspace_id, order_id, name, method, status, current_version, \
                             created_by, created_at, updated_at";

const VERSION_COLUMNS: &str = "id, asset_id, version, files, placements, palette, meta, created_by, created_at";

const APPROVAL_COLUMNS: &str = "id, asset_id, version, client_id, status, token_hash, expires_at, \
                                comments, approver_name, responded_at, sent_by, created_at, updated_at";

const PORTAL_ORDER_COLUMNS: &str = "id, order_number, status, total_amount, currency, delivery_date, created_at";

/// JSON `null` becomes the column's empty default.
fn or_empty(value: &Value, empty: Value) -> Value {
    if value.is_null() {
        empty
    } else {
        value.clone()
    }
}

pub struct DesignRepo;

impl DesignRepo {
    /// Upload a design version.
    ///
    /// A new name on the order creates the asset at version 1; an existing
    /// name bumps `current_version`. Either way a version row is written.
    pub async fn upload(
        pool: &PgPool,
        workspace_id: DbId,
        input: &UploadDesign,
        created_by: DbId,
    ) -> Result<UploadResult, sqlx::Error> {
        let mut tx = pool.begin().await?;

        let select = format!(
            "SELECT {ASSET_COLUMNS} FROM design_assets
             WHERE workspace_id = $1 AND order_id = $2 AND name = $3
             FOR UPDATE"
        );
        let existing = sqlx::query_as::<_, DesignAsset>(&select)
            .bind(workspace_id)
            .bind(input.order_id)
            .bind(&input.name)
            .fetch_optional(&mut *tx)
            .await?;

        let asset = match existing {
            Some(asset) => {
                let query = format!(
                    "UPDATE design_assets SET
                        current_version = current_version + 1,
                        method = COALESCE($2, method)
                     WHERE id = $1
                     RETURNING {ASSET_COLUMNS}"
                );
                sqlx::query_as::<_, DesignAsset>(&query)
                    .bind(asset.id)
                    .bind(&input.method)
                    .fetch_one(&mut *tx)
                    .await?
            }
            None => {
                let query = format!(
                    "INSERT INTO design_assets (workspace_id, order_id, name, method, created_by)
                     VALUES ($1, $2, $3, $4, $5)
                     RETURNING {ASSET_COLUMNS}"
                );
                sqlx::query_as::<_, DesignAsset>(&query)
                    .bind(workspace_id)
                    .bind(input.order_id)
                    .bind(&input.name)
                    .bind(&input.method)
                    .bind(created_by)
                    .fetch_one(&mut *tx)
                    .await?
            }
        };

        let query = format!(
            "INSERT INTO design_versions (asset_id, version, files, placements, palette, meta, created_by)
             VALUES ($1, $2, $3, $4, $5, $6, $7)
             RETURNING {VERSION_COLUMNS}"
        );
        let version = sqlx::query_as::<_, DesignVersion>(&query)
            .bind(asset.id)
            .bind(asset.current_version)
            .bind(or_empty(&input.files, json!([])))
            .bind(or_empty(&input.placements, json!([])))
            .bind(or_empty(&input.palette, json!([])))
            .bind(or_empty(&input.meta, json!({})))
            .bind(created_by)
            .fetch_one(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(UploadResult { asset, version })
    }

    pub async fn find_by_id(
        pool: &PgPool,
        workspace_id: DbId,
        id: DbId,
    ) -> Result<Option<DesignAsset>, sqlx::Error> {
        let query = format!(
            "SELECT {ASSET_COLUMNS} FROM design_assets WHERE id = $1 AND workspace_id = $2"
        );
        sqlx::query_as::<_, DesignAsset>(&query)
            .bind(id)
            .bind(workspace_id)
            .fetch_optional(pool)
            .await
    }

    /// Lookup without a tenant scope, for portal requests that carry only a
    /// token.
    pub async fn find_by_id_unscoped(
        pool: &PgPool,
        id: DbId,
    ) -> Result<Option<DesignAsset>, sqlx::Error> {
        let query = format!("SELECT {ASSET_COLUMNS} FROM design_assets WHERE id = $1");
        sqlx::query_as::<_, DesignAsset>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    pub async fn list(
        pool: &PgPool,
        workspace_id: DbId,
        order_id: Option<DbId>,
    ) -> Result<Vec<DesignAsset>, sqlx::Error> {
        let query = format!(
            "SELECT {ASSET_COLUMNS} FROM design_assets
             WHERE workspace_id = $1 AND ($2::BIGINT IS NULL OR order_id = $2)
             ORDER BY updated_at DESC, id DESC"
        );
        sqlx::query_as::<_, DesignAsset>(&query)
            .bind(workspace_id)
            .bind(order_id)
            .fetch_all(pool)
            .await
    }

    pub async fn versions(pool: &PgPool, asset_id: DbId) -> Result<Vec<DesignVersion>, sqlx::Error> {
        let query = format!(
            "SELECT {VERSION_COLUMNS} FROM design_versions WHERE asset_id = $1 ORDER BY version DESC"
        );
        sqlx::query_as::<_, DesignVersion>(&query)
            .bind(asset_id)
            .fetch_all(pool)
            .await
    }

    pub async fn find_version(
        pool: &PgPool,
        asset_id: DbId,
        version: i32,
    ) -> Result<Option<DesignVersion>, sqlx::Error> {
        let query = format!(
            "SELECT {VERSION_COLUMNS} FROM design_versions WHERE asset_id = $1 AND version = $2"
        );
        sqlx::query_as::<_, DesignVersion>(&query)
            .bind(asset_id)
            .bind(version)
            .fetch_optional(pool)
            .await
    }

    pub async fn approvals(pool: &PgPool, asset_id: DbId) -> Result<Vec<DesignApproval>, sqlx::Error> {
        let query = format!(
            "SELECT {APPROVAL_COLUMNS} FROM design_approvals
             WHERE asset_id = $1
             ORDER BY created_at DESC, id DESC"
        );
        sqlx::query_as::<_, DesignApproval>(&query)
            .bind(asset_id)
            .fetch_all(pool)
            .await
    }

    pub async fn set_status(
        pool: &PgPool,
        id: DbId,
        from: &str,
        status: &str,
    ) -> Result<Option<DesignAsset>, sqlx::Error> {
        let query = format!(
            "UPDATE design_assets SET status = $2 WHERE id = $1 AND status = $3 RETURNING {ASSET_COLUMNS}"
        );
        sqlx::query_as::<_, DesignAsset>(&query)
            .bind(id)
            .bind(status)
            .bind(from)
            .fetch_optional(pool)
            .await
    }

    /// Record an approval request and move the asset to `PENDING_APPROVAL`.
    /// `None` when the asset was locked in the meantime.
    pub async fn send_approval(
        pool: &PgPool,
        asset_id: DbId,
        version: i32,
        client_id: DbId,
        token_hash: &str,
        expires_at: Timestamp,
        sent_by: DbId,
    ) -> Result<Option<DesignApproval>, sqlx::Error> {
        let mut tx = pool.begin().await?;

        let moved = sqlx::query("UPDATE design_assets SET status = $2 WHERE id = $1 AND status <> $3")
            .bind(asset_id)
            .bind(ASSET_PENDING_APPROVAL)
            .bind(ASSET_LOCKED)
            .execute(&mut *tx)
            .await?;
        if moved.rows_affected() == 0 {
            return Ok(None);
        }

        let query = format!(
            "INSERT INTO design_approvals (asset_id, version, client_id, token_hash, expires_at, sent_by)
             VALUES ($1, $2, $3, $4, $5, $6)
             RETURNING {APPROVAL_COLUMNS}"
        );
        let approval = sqlx::query_as::<_, DesignApproval>(&query)
            .bind(asset_id)
            .bind(version)
            .bind(client_id)
            .bind(token_hash)
            .bind(expires_at)
            .bind(sent_by)
            .fetch_one(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(Some(approval))
    }

    pub async fn find_approval_by_token_hash(
        pool: &PgPool,
        token_hash: &str,
    ) -> Result<Option<DesignApproval>, sqlx::Error> {
        let query = format!("SELECT {APPROVAL_COLUMNS} FROM design_approvals WHERE token_hash = $1");
        sqlx::query_as::<_, DesignApproval>(&query)
            .bind(token_hash)
            .fetch_optional(pool)
            .await
    }

    /// Approve through the portal. The asset becomes `APPROVED` and, when
    /// `order_move` is given, the order moves `from -> to` if it is still
    /// in `from`. `None` when the approval was already answered.
    pub async fn approve(
        pool: &PgPool,
        approval: &DesignApproval,
        order_id: DbId,
        comments: Option<&str>,
        approver_name: Option<&str>,
        order_move: Option<(&str, &str)>,
    ) -> Result<Option<DesignApproval>, sqlx::Error> {
        let mut tx = pool.begin().await?;

        let query = format!(
            "UPDATE design_approvals SET
                status = $2, comments = $3, approver_name = $4, responded_at = NOW()
             WHERE id = $1 AND status = $5
             RETURNING {APPROVAL_COLUMNS}"
        );
        let Some(updated) = sqlx::query_as::<_, DesignApproval>(&query)
            .bind(approval.id)
            .bind(APPROVAL_APPROVED)
            .bind(comments)
            .bind(approver_name)
            .bind(APPROVAL_SENT)
            .fetch_optional(&mut *tx)
            .await?
        else {
            return Ok(None);
        };

        sqlx::query("UPDATE design_assets SET status = $2 WHERE id = $1")
            .bind(approval.asset_id)
            .bind(ASSET_APPROVED)
            .execute(&mut *tx)
            .await?;

        if let Some((from, to)) = order_move {
            sqlx::query("UPDATE orders SET status = $2 WHERE id = $1 AND status = $3")
                .bind(order_id)
                .bind(to)
                .bind(from)
                .execute(&mut *tx)
                .await?;
        }

        tx.commit().await?;
        Ok(Some(updated))
    }

    /// Record a change request; the asset returns to `DRAFT`.
    pub async fn request_changes(
        pool: &PgPool,
        approval: &DesignApproval,
        comments: &str,
        approver_name: Option<&str>,
    ) -> Result<Option<DesignApproval>, sqlx::Error> {
        let mut tx = pool.begin().await?;

        let query = format!(
            "UPDATE design_approvals SET
                status = $2, comments = $3, approver_name = $4, responded_at = NOW()
             WHERE id = $1 AND status = $5
             RETURNING {APPROVAL_COLUMNS}"
        );
        let Some(updated) = sqlx::query_as::<_, DesignApproval>(&query)
            .bind(approval.id)
            .bind(APPROVAL_CHANGES_REQUESTED)
            .bind(comments)
            .bind(approver_name)
            .bind(APPROVAL_SENT)
            .fetch_optional(&mut *tx)
            .await?
        else {
            return Ok(None);
        };

        sqlx::query("UPDATE design_assets SET status = $2 WHERE id = $1")
            .bind(approval.asset_id)
            .bind(ASSET_DRAFT)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(Some(updated))
    }

    pub async fn portal_order(
        pool: &PgPool,
        order_id: DbId,
    ) -> Result<Option<PortalOrderSummary>, sqlx::Error> {
        let query = format!("SELECT {PORTAL_ORDER_COLUMNS} FROM orders WHERE id = $1");
        sqlx::query_as::<_, PortalOrderSummary>(&query)
            .bind(order_id)
            .fetch_optional(pool)
            .await
    }

    pub async fn portal_orders_for_client(
        pool: &PgPool,
        client_id: DbId,
    ) -> Result<Vec<PortalOrderSummary>, sqlx::Error> {
        let query = format!(
            "SELECT {PORTAL_ORDER_COLUMNS} FROM orders
             WHERE client_id = $1
             ORDER BY created_at DESC, id DESC"
        );
        sqlx::query_as::<_, PortalOrderSummary>(&query)
            .bind(client_id)
            .fetch_all(pool)
            .await
    }
}

//! Repositories for suppliers, materials, stock movements and purchase
//! orders.

use std::collections::HashMap;

use ashley_core::inventory::{
    format_po_number, line_total, reorder_quantity, DEFAULT_LEAD_TIME_DAYS, MOVEMENT_PURCHASE,
    MOVEMENT_USAGE, MOVEMENT_WASTE, OPEN_PO_STATUSES, PO_APPROVED, PO_RECEIVED,
};
use ashley_core::types::{Date, DbId, Timestamp};
use chrono::Days;
use sqlx::{PgConnection, PgPool};

use crate::models::inventory::{
    CreateMaterial, CreateSupplier, InventoryCounts, Material, MaterialUsage, NewPurchaseOrder,
    NewPurchaseOrderItem, PurchaseOrder, PurchaseOrderItem, StockMovement, Supplier,
    UpdateMaterial, UpdateSupplier,
};

const SUPPLIER_COLUMNS: &str = "id, workspace_id, name, contact_person, email, phone, address, \
                                payment_terms, lead_time_days, rating, is_active, created_at, updated_at";

const MATERIAL_COLUMNS: &str = "id, workspace_id, sku, name, category, unit_of_measure, current_stock, \
                                reorder_point, reorder_qty, max_stock_level, unit_cost, supplier_id, \
                                location, barcode, auto_reorder, last_restocked, created_at, updated_at";

const MOVEMENT_COLUMNS: &str = "id, workspace_id, material_id, movement_type, quantity, unit_cost, \
                                balance_after, purchase_order_id, notes, created_by, created_at";

const PO_COLUMNS: &str = "id, workspace_id, po_number, supplier_id, status, order_date, \
                          expected_delivery, actual_delivery, total_amount, is_auto, notes, \
                          created_by, approved_by, approved_at, created_at, updated_at";

const PO_ITEM_COLUMNS: &str = "id, purchase_order_id, material_id, quantity, unit_price, total_price, received_qty";

pub struct SupplierRepo;

impl SupplierRepo {
    pub async fn create(
        pool: &PgPool,
        workspace_id: DbId,
        input: &CreateSupplier,
    ) -> Result<Supplier, sqlx::Error> {
        let query = format!(
            "INSERT INTO suppliers
                (workspace_id, name, contact_person, email, phone, address, payment_terms,
                 lead_time_days, rating)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, COALESCE($9, 0))
             RETURNING {SUPPLIER_COLUMNS}"
        );
        sqlx::query_as::<_, Supplier>(&query)
            .bind(workspace_id)
            .bind(&input.name)
            .bind(&input.contact_person)
            .bind(&input.email)
            .bind(&input.phone)
            .bind(&input.address)
            .bind(&input.payment_terms)
            .bind(input.lead_time_days.unwrap_or(DEFAULT_LEAD_TIME_DAYS))
            .bind(input.rating)
            .fetch_one(pool)
            .await
    }

    pub async fn find_by_id(
        pool: &PgPool,
        workspace_id: DbId,
        id: DbId,
    ) -> Result<Option<Supplier>, sqlx::Error> {
        let query =
            format!("SELECT {SUPPLIER_COLUMNS} FROM suppliers WHERE id = $1 AND workspace_id = $2");
        sqlx::query_as::<_, Supplier>(&query)
            .bind(id)
            .bind(workspace_id)
            .fetch_optional(pool)
            .await
    }

    pub async fn list(
        pool: &PgPool,
        workspace_id: DbId,
        include_inactive: bool,
    ) -> Result<Vec<Supplier>, sqlx::Error> {
        let query = format!(
            "SELECT {SUPPLIER_COLUMNS} FROM suppliers
             WHERE workspace_id = $1 AND ($2 OR is_active)
             ORDER BY name"
        );
        sqlx::query_as::<_, Supplier>(&query)
            .bind(workspace_id)
            .bind(include_inactive)
            .fetch_all(pool)
            .await
    }

    pub async fn update(
        pool: &PgPool,
        workspace_id: DbId,
        id: DbId,
        input: &UpdateSupplier,
    ) -> Result<Option<Supplier>, sqlx::Error> {
        let query = format!(
            "UPDATE suppliers SET
                name = COALESCE($3, name),
                contact_person = COALESCE($4, contact_person),
                email = COALESCE($5, email),
                phone = COALESCE($6, phone),
                address = COALESCE($7, address),
                payment_terms = COALESCE($8, payment_terms),
                lead_time_days = COALESCE($9, lead_time_days),
                rating = COALESCE($10, rating),
                is_active = COALESCE($11, is_active)
             WHERE id = $1 AND workspace_id = $2
             RETURNING {SUPPLIER_COLUMNS}"
        );
        sqlx::query_as::<_, Supplier>(&query)
            .bind(id)
            .bind(workspace_id)
            .bind(&input.name)
            .bind(&input.contact_person)
            .bind(&input.email)
            .bind(&input.phone)
            .bind(&input.address)
            .bind(&input.payment_terms)
            .bind(input.lead_time_days)
            .bind(input.rating)
            .bind(input.is_active)
            .fetch_optional(pool)
            .await
    }
}

pub struct MaterialRepo;

impl MaterialRepo {
    pub async fn create(
        pool: &PgPool,
        workspace_id: DbId,
        input: &CreateMaterial,
    ) -> Result<Material, sqlx::Error> {
        let query = format!(
            "INSERT INTO materials
                (workspace_id, sku, name, category, unit_of_measure, current_stock, reorder_point,
                 reorder_qty, max_stock_level, unit_cost, supplier_id, location, barcode,
                 auto_reorder, last_restocked)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14,
                     CASE WHEN $6 > 0 THEN NOW() END)
             RETURNING {MATERIAL_COLUMNS}"
        );
        sqlx::query_as::<_, Material>(&query)
            .bind(workspace_id)
            .bind(&input.sku)
            .bind(&input.name)
            .bind(&input.category)
            .bind(&input.unit_of_measure)
            .bind(input.current_stock)
            .bind(input.reorder_point)
            .bind(input.reorder_qty)
            .bind(input.max_stock_level)
            .bind(input.unit_cost)
            .bind(input.supplier_id)
            .bind(&input.location)
            .bind(&input.barcode)
            .bind(input.auto_reorder)
            .fetch_one(pool)
            .await
    }

    pub async fn find_by_id(
        pool: &PgPool,
        workspace_id: DbId,
        id: DbId,
    ) -> Result<Option<Material>, sqlx::Error> {
        let query =
            format!("SELECT {MATERIAL_COLUMNS} FROM materials WHERE id = $1 AND workspace_id = $2");
        sqlx::query_as::<_, Material>(&query)
            .bind(id)
            .bind(workspace_id)
            .fetch_optional(pool)
            .await
    }

    /// Scanner lookup by barcode or SKU.
    pub async fn find_by_code(
        pool: &PgPool,
        workspace_id: DbId,
        code: &str,
    ) -> Result<Option<Material>, sqlx::Error> {
        let query = format!(
            "SELECT {MATERIAL_COLUMNS} FROM materials
             WHERE workspace_id = $1 AND (barcode = $2 OR sku = $2)
             ORDER BY (barcode = $2) DESC NULLS LAST
             LIMIT 1"
        );
        sqlx::query_as::<_, Material>(&query)
            .bind(workspace_id)
            .bind(code)
            .fetch_optional(pool)
            .await
    }

    pub async fn list(
        pool: &PgPool,
        workspace_id: DbId,
        category: Option<&str>,
        supplier_id: Option<DbId>,
        low_stock_only: bool,
    ) -> Result<Vec<Material>, sqlx::Error> {
        let query = format!(
            "SELECT {MATERIAL_COLUMNS} FROM materials
             WHERE workspace_id = $1
               AND ($2::TEXT IS NULL OR category = $2)
               AND ($3::BIGINT IS NULL OR supplier_id = $3)
               AND (NOT $4 OR current_stock <= reorder_point)
             ORDER BY name"
        );
        sqlx::query_as::<_, Material>(&query)
            .bind(workspace_id)
            .bind(category)
            .bind(supplier_id)
            .bind(low_stock_only)
            .fetch_all(pool)
            .await
    }

    pub async fn update(
        pool: &PgPool,
        workspace_id: DbId,
        id: DbId,
        input: &UpdateMaterial,
    ) -> Result<Option<Material>, sqlx::Error> {
        let query = format!(
            "UPDATE materials SET
                name = COALESCE($3, name),
                category = COALESCE($4, category),
                reorder_point = COALESCE($5, reorder_point),
                reorder_qty = COALESCE($6, reorder_qty),
                max_stock_level = COALESCE($7, max_stock_level),
                unit_cost = COALESCE($8, unit_cost),
                supplier_id = COALESCE($9, supplier_id),
                location = COALESCE($10, location),
                barcode = COALESCE($11, barcode),
                auto_reorder = COALESCE($12, auto_reorder)
             WHERE id = $1 AND workspace_id = $2
             RETURNING {MATERIAL_COLUMNS}"
        );
        sqlx::query_as::<_, Material>(&query)
            .bind(id)
            .bind(workspace_id)
            .bind(&input.name)
            .bind(&input.category)
            .bind(input.reorder_point)
            .bind(input.reorder_qty)
            .bind(input.max_stock_level)
            .bind(input.unit_cost)
            .bind(input.supplier_id)
            .bind(&input.location)
            .bind(&input.barcode)
            .bind(input.auto_reorder)
            .fetch_optional(pool)
            .await
    }

    /// Apply a signed stock change and log it. `None` when the change would
    /// take stock below zero; the balance check and the write are one
    /// statement, so concurrent movements cannot overdraw.
    pub async fn record_movement(
        pool: &PgPool,
        workspace_id: DbId,
        material_id: DbId,
        movement_type: &str,
        signed_qty: f64,
        notes: Option<&str>,
        actor: DbId,
    ) -> Result<Option<(Material, StockMovement)>, sqlx::Error> {
        let mut tx = pool.begin().await?;

        let query = format!(
            "UPDATE materials SET
                current_stock = current_stock + $3,
                last_restocked = CASE WHEN $3 > 0 AND $4 = '{MOVEMENT_PURCHASE}' THEN NOW()
                                      ELSE last_restocked END
             WHERE id = $1 AND workspace_id = $2 AND current_stock + $3 >= 0
             RETURNING {MATERIAL_COLUMNS}"
        );
        let Some(material) = sqlx::query_as::<_, Material>(&query)
            .bind(material_id)
            .bind(workspace_id)
            .bind(signed_qty)
            .bind(movement_type)
            .fetch_optional(&mut *tx)
            .await?
        else {
            return Ok(None);
        };

        let movement = insert_movement(
            &mut tx,
            &material,
            movement_type,
            signed_qty,
            None,
            notes,
            Some(actor),
        )
        .await?;

        tx.commit().await?;
        Ok(Some((material, movement)))
    }

    pub async fn movements(
        pool: &PgPool,
        material_id: DbId,
        limit: i64,
    ) -> Result<Vec<StockMovement>, sqlx::Error> {
        let query = format!(
            "SELECT {MOVEMENT_COLUMNS} FROM stock_movements
             WHERE material_id = $1
             ORDER BY created_at DESC, id DESC
             LIMIT $2"
        );
        sqlx::query_as::<_, StockMovement>(&query)
            .bind(material_id)
            .bind(limit)
            .fetch_all(pool)
            .await
    }

    /// Outbound usage and waste per material since `since`. Waste counts
    /// toward usage.
    pub async fn usage_since(
        pool: &PgPool,
        workspace_id: DbId,
        since: Timestamp,
    ) -> Result<Vec<MaterialUsage>, sqlx::Error> {
        sqlx::query_as::<_, MaterialUsage>(
            "SELECT material_id,
                    COALESCE(SUM(-quantity) FILTER (WHERE quantity < 0), 0)::FLOAT8 AS usage,
                    COALESCE(SUM(-quantity) FILTER (WHERE movement_type = $3), 0)::FLOAT8 AS waste
             FROM stock_movements
             WHERE workspace_id = $1 AND created_at >= $2
               AND movement_type IN ($3, $4)
             GROUP BY material_id",
        )
        .bind(workspace_id)
        .bind(since)
        .bind(MOVEMENT_WASTE)
        .bind(MOVEMENT_USAGE)
        .fetch_all(pool)
        .await
    }

    pub async fn counts(pool: &PgPool, workspace_id: DbId) -> Result<InventoryCounts, sqlx::Error> {
        sqlx::query_as::<_, InventoryCounts>(
            "SELECT
                COUNT(*) AS total_materials,
                COALESCE(ROUND(SUM(current_stock * unit_cost)::NUMERIC, 2), 0)::FLOAT8 AS total_value,
                COUNT(*) FILTER (WHERE current_stock > 0 AND current_stock <= reorder_point)
                    AS low_stock_count,
                COUNT(*) FILTER (WHERE current_stock <= 0) AS out_of_stock_count,
                (SELECT COUNT(*) FROM purchase_orders
                  WHERE workspace_id = $1 AND status = ANY($2)) AS pending_pos
             FROM materials
             WHERE workspace_id = $1",
        )
        .bind(workspace_id)
        .bind(OPEN_PO_STATUSES)
        .fetch_one(pool)
        .await
    }
}

async fn insert_movement(
    conn: &mut PgConnection,
    material: &Material,
    movement_type: &str,
    signed_qty: f64,
    purchase_order_id: Option<DbId>,
    notes: Option<&str>,
    actor: Option<DbId>,
) -> Result<StockMovement, sqlx::Error> {
    let query = format!(
        "INSERT INTO stock_movements
            (workspace_id, material_id, movement_type, quantity, unit_cost, balance_after,
             purchase_order_id, notes, created_by)
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
         RETURNING {MOVEMENT_COLUMNS}"
    );
    sqlx::query_as::<_, StockMovement>(&query)
        .bind(material.workspace_id)
        .bind(material.id)
        .bind(movement_type)
        .bind(signed_qty)
        .bind(material.unit_cost)
        .bind(material.current_stock)
        .bind(purchase_order_id)
        .bind(notes)
        .bind(actor)
        .fetch_one(conn)
        .await
}

/// Number and insert a purchase order with its lines. The workspace row
/// lock serialises numbering.
async fn insert_purchase_order(
    conn: &mut PgConnection,
    input: &NewPurchaseOrder,
    year: i32,
) -> Result<(PurchaseOrder, Vec<PurchaseOrderItem>), sqlx::Error> {
    sqlx::query("SELECT id FROM workspaces WHERE id = $1 FOR UPDATE")
        .bind(input.workspace_id)
        .execute(&mut *conn)
        .await?;

    let (existing,): (i64,) = sqlx::query_as(
        "SELECT COUNT(*) FROM purchase_orders
         WHERE workspace_id = $1 AND EXTRACT(YEAR FROM created_at AT TIME ZONE 'UTC')::INT = $2",
    )
    .bind(input.workspace_id)
    .bind(year)
    .fetch_one(&mut *conn)
    .await?;

    let total: f64 = input.items.iter().map(|i| i.total_price).sum();
    let query = format!(
        "INSERT INTO purchase_orders
            (workspace_id, po_number, supplier_id, expected_delivery, total_amount, is_auto,
             notes, created_by)
         VALUES ($1, $2, $3, $4, ROUND($5::NUMERIC, 2)::FLOAT8, $6, $7, $8)
         RETURNING {PO_COLUMNS}"
    );
    let po = sqlx::query_as::<_, PurchaseOrder>(&query)
        .bind(input.workspace_id)
        .bind(format_po_number(year, existing + 1))
        .bind(input.supplier_id)
        .bind(input.expected_delivery)
        .bind(total)
        .bind(input.is_auto)
        .bind(&input.notes)
        .bind(input.created_by)
        .fetch_one(&mut *conn)
        .await?;

    let item_query = format!(
        "INSERT INTO purchase_order_items (purchase_order_id, material_id, quantity, unit_price, total_price)
         VALUES ($1, $2, $3, $4, $5)
         RETURNING {PO_ITEM_COLUMNS}"
    );
    let mut items = Vec::with_capacity(input.items.len());
    for item in &input.items {
        let row = sqlx::query_as::<_, PurchaseOrderItem>(&item_query)
            .bind(po.id)
            .bind(item.material_id)
            .bind(item.quantity)
            .bind(item.unit_price)
            .bind(item.total_price)
            .fetch_one(&mut *conn)
            .await?;
        items.push(row);
    }

    Ok((po, items))
}

pub struct PurchaseOrderRepo;

impl PurchaseOrderRepo {
    /// Create a purchase order numbered `PO-{year}-NNNN`.
    pub async fn create(
        pool: &PgPool,
        input: &NewPurchaseOrder,
        year: i32,
    ) -> Result<(PurchaseOrder, Vec<PurchaseOrderItem>), sqlx::Error> {
        let mut tx = pool.begin().await?;
        let created = insert_purchase_order(&mut tx, input, year).await?;
        tx.commit().await?;
        Ok(created)
    }

    /// Draft a reorder for a material that has fallen to its reorder point.
    ///
    /// Returns `None` when the material has auto-reorder off, has no
    /// supplier, needs nothing, or already sits on an open purchase order.
    /// The material row is locked for the check so two movements cannot
    /// both draft one.
    pub async fn auto_reorder(
        pool: &PgPool,
        workspace_id: DbId,
        material_id: DbId,
        today: Date,
        year: i32,
    ) -> Result<Option<(PurchaseOrder, Vec<PurchaseOrderItem>)>, sqlx::Error> {
        let mut tx = pool.begin().await?;

        let query = format!(
            "SELECT {MATERIAL_COLUMNS} FROM materials
             WHERE id = $1 AND workspace_id = $2
             FOR UPDATE"
        );
        let Some(material) = sqlx::query_as::<_, Material>(&query)
            .bind(material_id)
            .bind(workspace_id)
            .fetch_optional(&mut *tx)
            .await?
        else {
            return Ok(None);
        };
        let Some(supplier_id) = material.supplier_id.filter(|_| material.auto_reorder) else {
            return Ok(None);
        };
        if material.current_stock > material.reorder_point {
            return Ok(None);
        }
        let Some(quantity) =
            reorder_quantity(material.reorder_point, material.current_stock, material.reorder_qty)
        else {
            return Ok(None);
        };

        let (already_open,): (bool,) = sqlx::query_as(
            "SELECT EXISTS (
                SELECT 1 FROM purchase_order_items i
                JOIN purchase_orders p ON p.id = i.purchase_order_id
                WHERE i.material_id = $1 AND p.status = ANY($2)
             )",
        )
        .bind(material_id)
        .bind(OPEN_PO_STATUSES)
        .fetch_one(&mut *tx)
        .await?;
        if already_open {
            return Ok(None);
        }

        let (lead_time,): (i32,) =
            sqlx::query_as("SELECT lead_time_days FROM suppliers WHERE id = $1")
                .bind(supplier_id)
                .fetch_one(&mut *tx)
                .await?;
        let expected = u64::try_from(lead_time)
            .ok()
            .and_then(|days| today.checked_add_days(Days::new(days)));

        let input = NewPurchaseOrder {
            workspace_id,
            supplier_id,
            expected_delivery: expected,
            notes: Some(format!("Auto-reorder for {} ({})", material.name, material.sku)),
            is_auto: true,
            created_by: None,
            items: vec![NewPurchaseOrderItem {
                material_id,
                quantity,
                unit_price: material.unit_cost,
                total_price: line_total(quantity, material.unit_cost),
            }],
        };
        let created = insert_purchase_order(&mut tx, &input, year).await?;

        tx.commit().await?;
        Ok(Some(created))
    }

    pub async fn find_by_id(
        pool: &PgPool,
        workspace_id: DbId,
        id: DbId,
    ) -> Result<Option<PurchaseOrder>, sqlx::Error> {
        let query =
            format!("SELECT {PO_COLUMNS} FROM purchase_orders WHERE id = $1 AND workspace_id = $2");
        sqlx::query_as::<_, PurchaseOrder>(&query)
            .bind(id)
            .bind(workspace_id)
            .fetch_optional(pool)
            .await
    }

    pub async fn list(
        pool: &PgPool,
        workspace_id: DbId,
        status: Option<&str>,
        supplier_id: Option<DbId>,
    ) -> Result<Vec<PurchaseOrder>, sqlx::Error> {
        let query = format!(
            "SELECT {PO_COLUMNS} FROM purchase_orders
             WHERE workspace_id = $1
               AND ($2::TEXT IS NULL OR status = $2)
               AND ($3::BIGINT IS NULL OR supplier_id = $3)
             ORDER BY created_at DESC, id DESC"
        );
        sqlx::query_as::<_, PurchaseOrder>(&query)
            .bind(workspace_id)
            .bind(status)
            .bind(supplier_id)
            .fetch_all(pool)
            .await
    }

    pub async fn items(pool: &PgPool, purchase_order_id: DbId) -> Result<Vec<PurchaseOrderItem>, sqlx::Error> {
        let query = format!(
            "SELECT {PO_ITEM_COLUMNS} FROM purchase_order_items
             WHERE purchase_order_id = $1
             ORDER BY id"
        );
        sqlx::query_as::<_, PurchaseOrderItem>(&query)
            .bind(purchase_order_id)
            .fetch_all(pool)
            .await
    }

    /// Move a purchase order out of `from`. Approval stamps the approver.
    pub async fn set_status(
        pool: &PgPool,
        id: DbId,
        from: &str,
        to: &str,
        actor: DbId,
    ) -> Result<Option<PurchaseOrder>, sqlx::Error> {
        let query = format!(
            "UPDATE purchase_orders SET
                status = $2,
                approved_by = CASE WHEN $2 = $4 THEN $5 ELSE approved_by END,
                approved_at = CASE WHEN $2 = $4 THEN NOW() ELSE approved_at END
             WHERE id = $1 AND status = $3
             RETURNING {PO_COLUMNS}"
        );
        sqlx::query_as::<_, PurchaseOrder>(&query)
            .bind(id)
            .bind(to)
            .bind(from)
            .bind(PO_APPROVED)
            .bind(actor)
            .fetch_optional(pool)
            .await
    }

    /// Receive an approved purchase order: every line's quantity (or its
    /// override in `received`) is added to stock and logged as a purchase.
    /// `None` when the order is no longer `APPROVED`.
    pub async fn receive(
        pool: &PgPool,
        id: DbId,
        received: &HashMap<DbId, f64>,
        delivered_on: Date,
        actor: DbId,
    ) -> Result<Option<(PurchaseOrder, Vec<Material>)>, sqlx::Error> {
        let mut tx = pool.begin().await?;

        let query = format!(
            "UPDATE purchase_orders SET status = $2, actual_delivery = $3
             WHERE id = $1 AND status = $4
             RETURNING {PO_COLUMNS}"
        );
        let Some(po) = sqlx::query_as::<_, PurchaseOrder>(&query)
            .bind(id)
            .bind(PO_RECEIVED)
            .bind(delivered_on)
            .bind(PO_APPROVED)
            .fetch_optional(&mut *tx)
            .await?
        else {
            return Ok(None);
        };

        let item_query = format!(
            "SELECT {PO_ITEM_COLUMNS} FROM purchase_order_items WHERE purchase_order_id = $1 ORDER BY id"
        );
        let items = sqlx::query_as::<_, PurchaseOrderItem>(&item_query)
            .bind(id)
            .fetch_all(&mut *tx)
            .await?;

        let stock_query = format!(
            "UPDATE materials SET current_stock = current_stock + $2, last_restocked = NOW()
             WHERE id = $1
             RETURNING {MATERIAL_COLUMNS}"
        );
        let mut materials = Vec::with_capacity(items.len());
        for item in &items {
            let qty = received.get(&item.id).copied().unwrap_or(item.quantity);
            sqlx::query("UPDATE purchase_order_items SET received_qty = $2 WHERE id = $1")
                .bind(item.id)
                .bind(qty)
                .execute(&mut *tx)
                .await?;
            if qty <= 0.0 {
                continue;
            }

            let note = format!("Received on {}", po.po_number);
            let material = sqlx::query_as::<_, Material>(&stock_query)
                .bind(item.material_id)
                .bind(qty)
                .fetch_one(&mut *tx)
                .await?;
            insert_movement(
                &mut tx,
                &material,
                MOVEMENT_PURCHASE,
                qty,
                Some(po.id),
                Some(&note),
                Some(actor),
            )
            .await?;
            materials.push(material);
        }

        tx.commit().await?;
        Ok(Some((po, materials)))
    }
}

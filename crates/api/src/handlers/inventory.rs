//! Handlers for `/inventory`: suppliers, materials, stock movements, alerts
//! and purchase orders.

use std::collections::HashMap;

use ashley_core::audit::{ACTION_APPROVE, ACTION_CREATE, ACTION_STATUS_CHANGE, ACTION_UPDATE};
use ashley_core::error::CoreError;
use ashley_core::inventory::{
    self, alert_message, costing, line_total, needs_reorder, severity_rank, signed_quantity,
    state_machine, stock_level, MaterialCosting, COSTING_WINDOW_DAYS, PO_APPROVED, PO_CANCELLED,
    PO_RECEIVED, PO_SUBMITTED,
};
use ashley_core::types::DbId;
use ashley_db::models::inventory::{
    CreateMaterial, CreatePurchaseOrder, CreateStockMovement, CreateSupplier, InventoryCounts,
    LookupQuery, Material, MaterialQuery, NewPurchaseOrder, NewPurchaseOrderItem, PurchaseOrder,
    PurchaseOrderDetail, PurchaseOrderQuery, ReceivePurchaseOrder, StockAlert, StockMovement,
    Supplier, UpdateMaterial, UpdateSupplier,
};
use ashley_db::repositories::{MaterialRepo, PurchaseOrderRepo, SupplierRepo};
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use chrono::{Datelike, Duration, Utc};
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::activity::{self, Activity};
use crate::error::{not_found, status_changed, AppError, AppResult};
use crate::middleware::auth::AuthUser;
use crate::middleware::rbac::RequireManager;
use crate::response::DataResponse;
use crate::state::AppState;

const MOVEMENT_HISTORY_LIMIT: i64 = 100;

#[derive(Debug, Default, Deserialize)]
pub struct SupplierQuery {
    #[serde(default)]
    pub include_inactive: bool,
}

/// Result of a stock movement: the new level, the logged movement, the
/// alert the level raises and any purchase order drafted for it.
#[derive(Debug, Serialize)]
pub struct MovementResult {
    pub material: Material,
    pub movement: StockMovement,
    pub alert: Option<StockAlert>,
    pub auto_purchase_order: Option<PurchaseOrderDetail>,
}

#[derive(Debug, Serialize)]
pub struct MaterialCostingRow {
    pub material_id: DbId,
    pub sku: String,
    pub name: String,
    #[serde(flatten)]
    pub costing: MaterialCosting,
}

#[derive(Debug, Serialize)]
pub struct InventorySummary {
    #[serde(flatten)]
    pub counts: InventoryCounts,
    pub alerts: Vec<StockAlert>,
}

fn alert_for(material: &Material) -> Option<StockAlert> {
    let level = stock_level(
        material.current_stock,
        material.reorder_point,
        material.max_stock_level,
    )?;
    Some(StockAlert {
        material_id: material.id,
        material_name: material.name.clone(),
        alert_type: level.alert_type,
        severity: level.severity,
        current_level: material.current_stock,
        threshold: level.threshold,
        message: alert_message(&material.name, &level, material.current_stock),
    })
}

fn sorted_alerts(materials: &[Material]) -> Vec<StockAlert> {
    let mut alerts: Vec<StockAlert> = materials.iter().filter_map(alert_for).collect();
    alerts.sort_by_key(|a| severity_rank(a.severity));
    alerts
}

async fn load_material(state: &AppState, workspace_id: DbId, id: DbId) -> AppResult<Material> {
    MaterialRepo::find_by_id(&state.pool, workspace_id, id)
        .await?
        .ok_or_else(|| not_found("Material", id))
}

async fn load_supplier(state: &AppState, workspace_id: DbId, id: DbId) -> AppResult<Supplier> {
    SupplierRepo::find_by_id(&state.pool, workspace_id, id)
        .await?
        .ok_or_else(|| not_found("Supplier", id))
}

async fn load_purchase_order(
    state: &AppState,
    workspace_id: DbId,
    id: DbId,
) -> AppResult<PurchaseOrder> {
    PurchaseOrderRepo::find_by_id(&state.pool, workspace_id, id)
        .await?
        .ok_or_else(|| not_found("PurchaseOrder", id))
}

async fn with_items(state: &AppState, purchase_order: PurchaseOrder) -> AppResult<PurchaseOrderDetail> {
    let items = PurchaseOrderRepo::items(&state.pool, purchase_order.id).await?;
    Ok(PurchaseOrderDetail {
        purchase_order,
        items,
    })
}

// ---------------------------------------------------------------------------
// Suppliers
// ---------------------------------------------------------------------------

/// POST /api/v1/inventory/suppliers
pub async fn create_supplier(
    auth: AuthUser,
    State(state): State<AppState>,
    Json(input): Json<CreateSupplier>,
) -> AppResult<(StatusCode, Json<DataResponse<Supplier>>)> {
    input.validate()?;
    if let Some(rating) = input.rating {
        inventory::validate_rating(rating).map_err(AppError::BadRequest)?;
    }

    let supplier = SupplierRepo::create(&state.pool, auth.workspace_id, &input).await?;

    tracing::info!(supplier_id = supplier.id, name = %supplier.name, "Supplier created");
    activity::record(
        &state,
        &auth,
        Activity {
            action: ACTION_CREATE,
            resource: "supplier",
            resource_id: supplier.id,
            event_type: "supplier.created",
        },
        serde_json::json!({ "name": supplier.name }),
    )
    .await;

    Ok((StatusCode::CREATED, Json(DataResponse { data: supplier })))
}

/// GET /api/v1/inventory/suppliers
pub async fn list_suppliers(
    auth: AuthUser,
    State(state): State<AppState>,
    Query(params): Query<SupplierQuery>,
) -> AppResult<Json<DataResponse<Vec<Supplier>>>> {
    let suppliers =
        SupplierRepo::list(&state.pool, auth.workspace_id, params.include_inactive).await?;
    Ok(Json(DataResponse { data: suppliers }))
}

/// GET /api/v1/inventory/suppliers/{id}
pub async fn get_supplier(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<Json<DataResponse<Supplier>>> {
    let supplier = load_supplier(&state, auth.workspace_id, id).await?;
    Ok(Json(DataResponse { data: supplier }))
}

/// PUT /api/v1/inventory/suppliers/{id}
pub async fn update_supplier(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
    Json(input): Json<UpdateSupplier>,
) -> AppResult<Json<DataResponse<Supplier>>> {
    input.validate()?;
    if let Some(rating) = input.rating {
        inventory::validate_rating(rating).map_err(AppError::BadRequest)?;
    }

    let supplier = SupplierRepo::update(&state.pool, auth.workspace_id, id, &input)
        .await?
        .ok_or_else(|| not_found("Supplier", id))?;

    tracing::info!(supplier_id = id, "Supplier updated");
    activity::record(
        &state,
        &auth,
        Activity {
            action: ACTION_UPDATE,
            resource: "supplier",
            resource_id: id,
            event_type: "supplier.updated",
        },
        serde_json::json!({ "name": supplier.name, "is_active": supplier.is_active }),
    )
    .await;

    Ok(Json(DataResponse { data: supplier }))
}

// ---------------------------------------------------------------------------
// Materials
// ---------------------------------------------------------------------------

/// POST /api/v1/inventory/materials
pub async fn create_material(
    auth: AuthUser,
    State(state): State<AppState>,
    Json(input): Json<CreateMaterial>,
) -> AppResult<(StatusCode, Json<DataResponse<Material>>)> {
    input.validate()?;
    inventory::validate_category(&input.category).map_err(AppError::BadRequest)?;
    inventory::validate_unit(&input.unit_of_measure).map_err(AppError::BadRequest)?;
    inventory::validate_levels(input.reorder_point, input.max_stock_level)
        .map_err(AppError::BadRequest)?;
    if let Some(supplier_id) = input.supplier_id {
        load_supplier(&state, auth.workspace_id, supplier_id).await?;
    }

    let material = MaterialRepo::create(&state.pool, auth.workspace_id, &input).await?;

    tracing::info!(material_id = material.id, sku = %material.sku, "Material created");
    activity::record(
        &state,
        &auth,
        Activity {
            action: ACTION_CREATE,
            resource: "material",
            resource_id: material.id,
            event_type: "material.created",
        },
        serde_json::json!({
            "sku": material.sku,
            "name": material.name,
            "current_stock": material.current_stock,
        }),
    )
    .await;

    Ok((StatusCode::CREATED, Json(DataResponse { data: material })))
}

/// GET /api/v1/inventory/materials
pub async fn list_materials(
    auth: AuthUser,
    State(state): State<AppState>,
    Query(params): Query<MaterialQuery>,
) -> AppResult<Json<DataResponse<Vec<Material>>>> {
    if let Some(category) = &params.category {
        inventory::validate_category(category).map_err(AppError::BadRequest)?;
    }
    let materials = MaterialRepo::list(
        &state.pool,
        auth.workspace_id,
        params.category.as_deref(),
        params.supplier_id,
        params.low_stock.unwrap_or(false),
    )
    .await?;
    Ok(Json(DataResponse { data: materials }))
}

/// GET /api/v1/inventory/materials/{id}
pub async fn get_material(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<Json<DataResponse<Material>>> {
    let material = load_material(&state, auth.workspace_id, id).await?;
    Ok(Json(DataResponse { data: material }))
}

/// GET /api/v1/inventory/materials/lookup?code=...
///
/// Matches a barcode first, then a SKU. Unknown codes are 404.
pub async fn lookup_material(
    auth: AuthUser,
    State(state): State<AppState>,
    Query(params): Query<LookupQuery>,
) -> AppResult<Json<DataResponse<Material>>> {
    let code = params.code.trim();
    if code.is_empty() {
        return Err(AppError::BadRequest("code is required".to_string()));
    }
    let material = MaterialRepo::find_by_code(&state.pool, auth.workspace_id, code)
        .await?
        .ok_or(AppError::Database(sqlx::Error::RowNotFound))?;
    Ok(Json(DataResponse { data: material }))
}

/// PUT /api/v1/inventory/materials/{id}
pub async fn update_material(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
    Json(input): Json<UpdateMaterial>,
) -> AppResult<Json<DataResponse<Material>>> {
    input.validate()?;
    let existing = load_material(&state, auth.workspace_id, id).await?;
    if let Some(category) = &input.category {
        inventory::validate_category(category).map_err(AppError::BadRequest)?;
    }
    inventory::validate_levels(
        input.reorder_point.unwrap_or(existing.reorder_point),
        input.max_stock_level.or(existing.max_stock_level),
    )
    .map_err(AppError::BadRequest)?;
    if let Some(supplier_id) = input.supplier_id {
        load_supplier(&state, auth.workspace_id, supplier_id).await?;
    }

    let material = MaterialRepo::update(&state.pool, auth.workspace_id, id, &input)
        .await?
        .ok_or_else(|| not_found("Material", id))?;

    tracing::info!(material_id = id, "Material updated");
    activity::record(
        &state,
        &auth,
        Activity {
            action: ACTION_UPDATE,
            resource: "material",
            resource_id: id,
            event_type: "material.updated",
        },
        serde_json::json!({
            "reorder_point": material.reorder_point,
            "unit_cost": material.unit_cost,
            "auto_reorder": material.auto_reorder,
        }),
    )
    .await;

    Ok(Json(DataResponse { data: material }))
}

/// POST /api/v1/inventory/materials/{id}/movements
///
/// Usage and waste that would take stock below zero are refused with 422.
/// A level at or below the reorder point drafts a purchase order when the
/// material has auto-reorder on.
pub async fn record_movement(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
    Json(input): Json<CreateStockMovement>,
) -> AppResult<(StatusCode, Json<DataResponse<MovementResult>>)> {
    let signed =
        signed_quantity(&input.movement_type, input.quantity).map_err(AppError::BadRequest)?;
    let before = load_material(&state, auth.workspace_id, id).await?;

    let (material, movement) = MaterialRepo::record_movement(
        &state.pool,
        auth.workspace_id,
        id,
        &input.movement_type,
        signed,
        input.notes.as_deref(),
        auth.user_id,
    )
    .await?
    .ok_or_else(|| {
        AppError::Core(CoreError::InvalidState(format!(
            "Insufficient stock for {}: {} {} on hand",
            before.sku, before.current_stock, before.unit_of_measure
        )))
    })?;

    tracing::info!(
        material_id = id,
        movement_type = %movement.movement_type,
        quantity = movement.quantity,
        balance = movement.balance_after,
        "Stock movement recorded"
    );

    let alert = alert_for(&material);
    let reorder = stock_level(
        material.current_stock,
        material.reorder_point,
        material.max_stock_level,
    )
    .is_some_and(|level| needs_reorder(&level));

    let auto_purchase_order = if reorder && material.auto_reorder {
        let now = Utc::now();
        PurchaseOrderRepo::auto_reorder(
            &state.pool,
            auth.workspace_id,
            id,
            now.date_naive(),
            now.year(),
        )
        .await?
        .map(|(purchase_order, items)| PurchaseOrderDetail {
            purchase_order,
            items,
        })
    } else {
        None
    };
    if let Some(po) = &auto_purchase_order {
        tracing::info!(
            material_id = id,
            po_number = %po.purchase_order.po_number,
            "Auto-reorder purchase order drafted"
        );
    }

    activity::record(
        &state,
        &auth,
        Activity {
            action: ACTION_CREATE,
            resource: "stock_movement",
            resource_id: movement.id,
            event_type: "stock_movement.recorded",
        },
        serde_json::json!({
            "material_id": id,
            "movement_type": movement.movement_type,
            "quantity": movement.quantity,
            "balance_after": movement.balance_after,
            "auto_purchase_order": auto_purchase_order.as_ref().map(|p| &p.purchase_order.po_number),
        }),
    )
    .await;

    Ok((
        StatusCode::CREATED,
        Json(DataResponse {
            data: MovementResult {
                material,
                movement,
                alert,
                auto_purchase_order,
            },
        }),
    ))
}

/// GET /api/v1/inventory/materials/{id}/movements
pub async fn list_movements(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<Json<DataResponse<Vec<StockMovement>>>> {
    load_material(&state, auth.workspace_id, id).await?;
    let movements = MaterialRepo::movements(&state.pool, id, MOVEMENT_HISTORY_LIMIT).await?;
    Ok(Json(DataResponse { data: movements }))
}

/// GET /api/v1/inventory/alerts
///
/// Critical alerts first.
pub async fn list_alerts(
    auth: AuthUser,
    State(state): State<AppState>,
) -> AppResult<Json<DataResponse<Vec<StockAlert>>>> {
    let materials = MaterialRepo::list(&state.pool, auth.workspace_id, None, None, false).await?;
    Ok(Json(DataResponse {
        data: sorted_alerts(&materials),
    }))
}

/// GET /api/v1/inventory/costing
///
/// Stock value, usage and waste over the last thirty days per material.
pub async fn costing_report(
    auth: AuthUser,
    State(state): State<AppState>,
) -> AppResult<Json<DataResponse<Vec<MaterialCostingRow>>>> {
    let since = Utc::now() - Duration::days(COSTING_WINDOW_DAYS);
    let usage: HashMap<DbId, (f64, f64)> =
        MaterialRepo::usage_since(&state.pool, auth.workspace_id, since)
            .await?
            .into_iter()
            .map(|u| (u.material_id, (u.usage, u.waste)))
            .collect();

    let rows = MaterialRepo::list(&state.pool, auth.workspace_id, None, None, false)
        .await?
        .into_iter()
        .map(|m| {
            let (used, wasted) = usage.get(&m.id).copied().unwrap_or((0.0, 0.0));
            MaterialCostingRow {
                material_id: m.id,
                costing: costing(m.current_stock, m.unit_cost, used, wasted),
                sku: m.sku,
                name: m.name,
            }
        })
        .collect();
    Ok(Json(DataResponse { data: rows }))
}

/// GET /api/v1/inventory/summary
pub async fn summary(
    auth: AuthUser,
    State(state): State<AppState>,
) -> AppResult<Json<DataResponse<InventorySummary>>> {
    let counts = MaterialRepo::counts(&state.pool, auth.workspace_id).await?;
    let materials = MaterialRepo::list(&state.pool, auth.workspace_id, None, None, true).await?;
    Ok(Json(DataResponse {
        data: InventorySummary {
            counts,
            alerts: sorted_alerts(&materials),
        },
    }))
}

// ---------------------------------------------------------------------------
// Purchase orders
// ---------------------------------------------------------------------------

/// POST /api/v1/inventory/purchase-orders
pub async fn create_purchase_order(
    auth: AuthUser,
    State(state): State<AppState>,
    Json(input): Json<CreatePurchaseOrder>,
) -> AppResult<(StatusCode, Json<DataResponse<PurchaseOrderDetail>>)> {
    input.validate()?;
    let supplier = load_supplier(&state, auth.workspace_id, input.supplier_id).await?;
    if !supplier.is_active {
        return Err(AppError::BadRequest(format!(
            "Supplier {} is inactive",
            supplier.id
        )));
    }

    let mut items = Vec::with_capacity(input.items.len());
    for item in &input.items {
        load_material(&state, auth.workspace_id, item.material_id).await?;
        items.push(NewPurchaseOrderItem {
            material_id: item.material_id,
            quantity: item.quantity,
            unit_price: item.unit_price,
            total_price: line_total(item.quantity, item.unit_price),
        });
    }

    let new = NewPurchaseOrder {
        workspace_id: auth.workspace_id,
        supplier_id: supplier.id,
        expected_delivery: input.expected_delivery,
        notes: input.notes.clone(),
        is_auto: false,
        created_by: Some(auth.user_id),
        items,
    };
    let (purchase_order, items) =
        PurchaseOrderRepo::create(&state.pool, &new, Utc::now().year()).await?;

    tracing::info!(
        purchase_order_id = purchase_order.id,
        po_number = %purchase_order.po_number,
        total = purchase_order.total_amount,
        "Purchase order created"
    );
    activity::record(
        &state,
        &auth,
        Activity {
            action: ACTION_CREATE,
            resource: "purchase_order",
            resource_id: purchase_order.id,
            event_type: "purchase_order.created",
        },
        serde_json::json!({
            "po_number": purchase_order.po_number,
            "supplier_id": purchase_order.supplier_id,
            "total_amount": purchase_order.total_amount,
        }),
    )
    .await;

    Ok((
        StatusCode::CREATED,
        Json(DataResponse {
            data: PurchaseOrderDetail {
                purchase_order,
                items,
            },
        }),
    ))
}

/// GET /api/v1/inventory/purchase-orders
pub async fn list_purchase_orders(
    auth: AuthUser,
    State(state): State<AppState>,
    Query(params): Query<PurchaseOrderQuery>,
) -> AppResult<Json<DataResponse<Vec<PurchaseOrder>>>> {
    if let Some(status) = &params.status {
        if !inventory::VALID_PO_STATUSES.contains(&status.as_str()) {
            return Err(AppError::BadRequest(format!(
                "Invalid purchase order status '{status}'"
            )));
        }
    }
    let orders = PurchaseOrderRepo::list(
        &state.pool,
        auth.workspace_id,
        params.status.as_deref(),
        params.supplier_id,
    )
    .await?;
    Ok(Json(DataResponse { data: orders }))
}

/// GET /api/v1/inventory/purchase-orders/{id}
pub async fn get_purchase_order(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<Json<DataResponse<PurchaseOrderDetail>>> {
    let po = load_purchase_order(&state, auth.workspace_id, id).await?;
    Ok(Json(DataResponse {
        data: with_items(&state, po).await?,
    }))
}

async fn move_purchase_order(
    state: &AppState,
    auth: &AuthUser,
    id: DbId,
    to: &str,
) -> AppResult<PurchaseOrderDetail> {
    let current = load_purchase_order(state, auth.workspace_id, id).await?;
    state_machine::validate_transition(&current.status, to)
        .map_err(|msg| AppError::Core(CoreError::InvalidState(msg)))?;

    let updated = PurchaseOrderRepo::set_status(&state.pool, id, &current.status, to, auth.user_id)
        .await?
        .ok_or_else(|| status_changed("PurchaseOrder", id, &current.status))?;

    tracing::info!(
        purchase_order_id = id,
        from = %current.status,
        to = %updated.status,
        "Purchase order status changed"
    );
    activity::record(
        state,
        auth,
        Activity {
            action: if to == PO_APPROVED {
                ACTION_APPROVE
            } else {
                ACTION_STATUS_CHANGE
            },
            resource: "purchase_order",
            resource_id: id,
            event_type: "purchase_order.status_changed",
        },
        serde_json::json!({
            "po_number": updated.po_number,
            "from": current.status,
            "to": updated.status,
        }),
    )
    .await;

    with_items(state, updated).await
}

/// POST /api/v1/inventory/purchase-orders/{id}/submit
pub async fn submit_purchase_order(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<Json<DataResponse<PurchaseOrderDetail>>> {
    let po = move_purchase_order(&state, &auth, id, PO_SUBMITTED).await?;
    Ok(Json(DataResponse { data: po }))
}

/// POST /api/v1/inventory/purchase-orders/{id}/approve
pub async fn approve_purchase_order(
    RequireManager(auth): RequireManager,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<Json<DataResponse<PurchaseOrderDetail>>> {
    let po = move_purchase_order(&state, &auth, id, PO_APPROVED).await?;
    Ok(Json(DataResponse { data: po }))
}

/// POST /api/v1/inventory/purchase-orders/{id}/cancel
pub async fn cancel_purchase_order(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<Json<DataResponse<PurchaseOrderDetail>>> {
    let po = move_purchase_order(&state, &auth, id, PO_CANCELLED).await?;
    Ok(Json(DataResponse { data: po }))
}

/// POST /api/v1/inventory/purchase-orders/{id}/receive
///
/// Adds every line to stock. Lines listed in `items` use the quantity
/// actually delivered instead of the ordered one.
pub async fn receive_purchase_order(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
    Json(input): Json<ReceivePurchaseOrder>,
) -> AppResult<Json<DataResponse<PurchaseOrderDetail>>> {
    let current = load_purchase_order(&state, auth.workspace_id, id).await?;
    state_machine::validate_transition(&current.status, PO_RECEIVED)
        .map_err(|msg| AppError::Core(CoreError::InvalidState(msg)))?;

    let lines = PurchaseOrderRepo::items(&state.pool, id).await?;
    let mut received = HashMap::with_capacity(input.items.len());
    for item in &input.items {
        if !lines.iter().any(|l| l.id == item.item_id) {
            return Err(AppError::BadRequest(format!(
                "Item {} is not on purchase order {}",
                item.item_id, current.po_number
            )));
        }
        if !item.quantity.is_finite() || item.quantity < 0.0 {
            return Err(AppError::BadRequest(
                "received quantity must not be negative".to_string(),
            ));
        }
        received.insert(item.item_id, item.quantity);
    }

    let delivered_on = input
        .actual_delivery
        .unwrap_or_else(|| Utc::now().date_naive());
    let (po, materials) =
        PurchaseOrderRepo::receive(&state.pool, id, &received, delivered_on, auth.user_id)
            .await?
            .ok_or_else(|| status_changed("PurchaseOrder", id, &current.status))?;

    tracing::info!(
        purchase_order_id = id,
        po_number = %po.po_number,
        materials = materials.len(),
        "Purchase order received"
    );
    activity::record(
        &state,
        &auth,
        Activity {
            action: ACTION_STATUS_CHANGE,
            resource: "purchase_order",
            resource_id: id,
            event_type: "purchase_order.received",
        },
        serde_json::json!({
            "po_number": po.po_number,
            "actual_delivery": po.actual_delivery,
            "restocked": materials
                .iter()
                .map(|m| serde_json::json!({ "material_id": m.id, "current_stock": m.current_stock }))
                .collect::<Vec<_>>(),
        }),
    )
    .await;

    Ok(Json(DataResponse {
        data: with_items(&state, po).await?,
    }))
}

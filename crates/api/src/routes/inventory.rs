//! Route definitions for the `/inventory` resource.

use axum::routing::{get, post};
use axum::Router;

use crate::handlers::inventory;
use crate::state::AppState;

/// Routes mounted at `/inventory`.
///
/// ```text
/// GET    /suppliers                       -> list_suppliers
/// POST   /suppliers                       -> create_supplier
/// GET    /suppliers/{id}                  -> get_supplier
/// PUT    /suppliers/{id}                  -> update_supplier
/// GET    /materials                       -> list_materials
/// POST   /materials                       -> create_material
/// GET    /materials/lookup?code=          -> lookup_material
/// GET    /materials/{id}                  -> get_material
/// PUT    /materials/{id}                  -> update_material
/// GET    /materials/{id}/movements        -> list_movements
/// POST   /materials/{id}/movements        -> record_movement
/// GET    /alerts                          -> list_alerts
/// GET    /costing                         -> costing_report
/// GET    /summary                         -> summary
/// GET    /purchase-orders                 -> list_purchase_orders
/// POST   /purchase-orders                 -> create_purchase_order
/// GET    /purchase-orders/{id}            -> get_purchase_order
/// POST   /purchase-orders/{id}/submit     -> submit_purchase_order
/// POST   /purchase-orders/{id}/approve    -> approve_purchase_order (manager)
/// POST   /purchase-orders/{id}/cancel     -> cancel_purchase_order
/// POST   /purchase-orders/{id}/receive    -> receive_purchase_order
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route(
            "/suppliers",
            get(inventory::list_suppliers).post(inventory::create_supplier),
        )
        .route(
            "/suppliers/{id}",
            get(inventory::get_supplier).put(inventory::update_supplier),
        )
        .route(
            "/materials",
            get(inventory::list_materials).post(inventory::create_material),
        )
        .route("/materials/lookup", get(inventory::lookup_material))
        .route(
            "/materials/{id}",
            get(inventory::get_material).put(inventory::update_material),
        )
        .route(
            "/materials/{id}/movements",
            get(inventory::list_movements).post(inventory::record_movement),
        )
        .route("/alerts", get(inventory::list_alerts))
        .route("/costing", get(inventory::costing_report))
        .route("/summary", get(inventory::summary))
        .route(
            "/purchase-orders",
            get(inventory::list_purchase_orders).post(inventory::create_purchase_order),
        )
        .route("/purchase-orders/{id}", get(inventory::get_purchase_order))
        .route(
            "/purchase-orders/{id}/submit",
            post(inventory::submit_purchase_order),
        )
        .route(
            "/purchase-orders/{id}/approve",
            post(inventory::approve_purchase_order),
        )
        .route(
            "/purchase-orders/{id}/cancel",
            post(inventory::cancel_purchase_order),
        )
        .route(
            "/purchase-orders/{id}/receive",
            post(inventory::receive_purchase_order),
        )
}

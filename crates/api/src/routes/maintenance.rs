//! Route definitions for the `/maintenance` resource.

use axum::routing::{delete, get, put};
use axum::Router;

use crate::handlers::maintenance;
use crate::state::AppState;

/// Routes mounted at `/maintenance`.
///
/// ```text
/// GET    /assets                   -> list_assets
/// POST   /assets                   -> create_asset
/// GET    /assets/{id}              -> get_asset
/// PUT    /assets/{id}              -> update_asset
/// GET    /schedules                -> list_schedules
/// POST   /schedules                -> create_schedule
/// DELETE /schedules/{id}           -> delete_schedule
/// GET    /work-orders              -> list_work_orders
/// POST   /work-orders              -> create_work_order
/// GET    /work-orders/{id}         -> get_work_order
/// PUT    /work-orders/{id}/status  -> update_work_order_status
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route(
            "/assets",
            get(maintenance::list_assets).post(maintenance::create_asset),
        )
        .route(
            "/assets/{id}",
            get(maintenance::get_asset).put(maintenance::update_asset),
        )
        .route(
            "/schedules",
            get(maintenance::list_schedules).post(maintenance::create_schedule),
        )
        .route("/schedules/{id}", delete(maintenance::delete_schedule))
        .route(
            "/work-orders",
            get(maintenance::list_work_orders).post(maintenance::create_work_order),
        )
        .route("/work-orders/{id}", get(maintenance::get_work_order))
        .route(
            "/work-orders/{id}/status",
            put(maintenance::update_work_order_status),
        )
}

//! Route definitions for the `/orders` resource.

use axum::routing::get;
use axum::Router;

use crate::handlers::orders;
use crate::state::AppState;

/// Routes mounted at `/orders`.
///
/// ```text
/// GET  /              -> list_orders
/// POST /              -> create_order
/// GET  /{id}          -> get_order
/// PUT  /{id}          -> update_order
/// GET  /{id}/routing  -> list_routing
/// POST /{id}/routing  -> generate_routing
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(orders::list_orders).post(orders::create_order))
        .route("/{id}", get(orders::get_order).put(orders::update_order))
        .route(
            "/{id}/routing",
            get(orders::list_routing).post(orders::generate_routing),
        )
}

//! Route definitions for the `/cutting` resource.

use axum::routing::{get, post};
use axum::Router;

use crate::handlers::cutting;
use crate::state::AppState;

/// Routes mounted at `/cutting`.
///
/// ```text
/// GET  /fabric-batches        -> list_batches
/// POST /fabric-batches        -> create_batch
/// POST /fabric-issues         -> issue_fabric
/// GET  /lays                  -> list_lays
/// POST /lays                  -> create_lay
/// POST /lays/{id}/bundles     -> create_bundles
/// GET  /orders/{id}/summary   -> order_summary
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route(
            "/fabric-batches",
            get(cutting::list_batches).post(cutting::create_batch),
        )
        .route("/fabric-issues", post(cutting::issue_fabric))
        .route("/lays", get(cutting::list_lays).post(cutting::create_lay))
        .route("/lays/{id}/bundles", post(cutting::create_bundles))
        .route("/orders/{id}/summary", get(cutting::order_summary))
}

//! Route definitions for the `/production` resource.

use axum::routing::{get, put};
use axum::Router;

use crate::handlers::production;
use crate::state::AppState;

/// Routes mounted at `/production`.
///
/// ```text
/// GET /summary                -> summary
/// PUT /routing-steps/{id}     -> update_routing_step
/// GET /bundles                -> list_bundles
/// GET /bundles/{id}           -> get_bundle
/// PUT /bundles/{id}/status    -> update_bundle_status
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/summary", get(production::summary))
        .route("/routing-steps/{id}", put(production::update_routing_step))
        .route("/bundles", get(production::list_bundles))
        .route("/bundles/{id}", get(production::get_bundle))
        .route("/bundles/{id}/status", put(production::update_bundle_status))
}

//! Route definitions for the public client portal.

use axum::routing::{get, post};
use axum::Router;

use crate::handlers::portal;
use crate::state::AppState;

/// Routes mounted at `/portal`. None of them take a bearer token; access is
/// granted by the approval token in the path or query.
///
/// ```text
/// GET  /approval/{token}                  -> get_approval
/// POST /approval/{token}/approve          -> approve
/// POST /approval/{token}/request-changes  -> request_changes
/// GET  /clients/{client_id}/orders        -> client_orders
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/approval/{token}", get(portal::get_approval))
        .route("/approval/{token}/approve", post(portal::approve))
        .route(
            "/approval/{token}/request-changes",
            post(portal::request_changes),
        )
        .route("/clients/{client_id}/orders", get(portal::client_orders))
}

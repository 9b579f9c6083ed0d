//! Route definitions for the `/designs` resource.

use axum::routing::{get, post};
use axum::Router;

use crate::handlers::designs;
use crate::state::AppState;

/// Routes mounted at `/designs`.
///
/// ```text
/// GET  /                     -> list_designs
/// POST /                     -> upload_design
/// GET  /{id}                 -> get_design
/// POST /{id}/send-approval   -> send_approval
/// POST /{id}/lock            -> lock_design (manager)
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(designs::list_designs).post(designs::upload_design))
        .route("/{id}", get(designs::get_design))
        .route("/{id}/send-approval", post(designs::send_approval))
        .route("/{id}/lock", post(designs::lock_design))
}

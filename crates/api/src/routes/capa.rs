//! Route definitions for the `/capa` resource.

use axum::routing::{get, post};
use axum::Router;

use crate::handlers::capa;
use crate::state::AppState;

/// Routes mounted at `/capa`.
///
/// ```text
/// GET  /              -> list_capa
/// POST /              -> create_capa
/// GET  /analytics     -> analytics
/// GET  /{id}          -> get_capa
/// PUT  /{id}          -> update_capa
/// POST /{id}/verify   -> verify_capa (manager)
/// POST /{id}/reopen   -> reopen_capa
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(capa::list_capa).post(capa::create_capa))
        .route("/analytics", get(capa::analytics))
        .route("/{id}", get(capa::get_capa).put(capa::update_capa))
        .route("/{id}/verify", post(capa::verify_capa))
        .route("/{id}/reopen", post(capa::reopen_capa))
}

//! Route definitions for the `/printing` resource.

use axum::routing::{get, post};
use axum::Router;

use crate::handlers::printing;
use crate::state::AppState;

/// Routes mounted at `/printing`.
///
/// ```text
/// GET  /machines                     -> list_machines
/// POST /machines                     -> create_machine
/// GET  /runs                         -> list_runs
/// POST /runs                         -> create_run
/// GET  /runs/{id}                    -> get_run
/// POST /runs/{id}/start              -> start_run
/// POST /runs/{id}/pause              -> pause_run
/// POST /runs/{id}/complete           -> complete_run
/// POST /runs/{id}/cancel             -> cancel_run
/// POST /runs/{id}/materials          -> add_material
/// POST /runs/{id}/outputs            -> add_output
/// POST /runs/{id}/rejects            -> add_reject
/// POST /runs/{id}/logs               -> add_log
/// POST /runs/{id}/efficiency-check   -> efficiency
/// GET  /dashboard                    -> dashboard
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route(
            "/machines",
            get(printing::list_machines).post(printing::create_machine),
        )
        .route("/runs", get(printing::list_runs).post(printing::create_run))
        .route("/runs/{id}", get(printing::get_run))
        .route("/runs/{id}/start", post(printing::start_run))
        .route("/runs/{id}/pause", post(printing::pause_run))
        .route("/runs/{id}/complete", post(printing::complete_run))
        .route("/runs/{id}/cancel", post(printing::cancel_run))
        .route("/runs/{id}/materials", post(printing::add_material))
        .route("/runs/{id}/outputs", post(printing::add_output))
        .route("/runs/{id}/rejects", post(printing::add_reject))
        .route("/runs/{id}/logs", post(printing::add_log))
        .route("/runs/{id}/efficiency-check", post(printing::efficiency))
        .route("/dashboard", get(printing::dashboard))
}

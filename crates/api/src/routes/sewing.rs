//! Route definitions for the `/sewing` resource.

use axum::routing::{get, post};
use axum::Router;

use crate::handlers::sewing;
use crate::state::AppState;

/// Routes mounted at `/sewing`.
///
/// ```text
/// GET  /operations                    -> list_operations
/// POST /operations                    -> create_operation
/// GET  /piece-rates                   -> list_piece_rates
/// POST /piece-rates                   -> create_piece_rate
/// GET  /runs                          -> list_runs
/// POST /runs                          -> create_run
/// GET  /runs/{id}                     -> get_run
/// POST /runs/{id}/start               -> start_run
/// POST /runs/{id}/pause               -> pause_run
/// POST /runs/{id}/resume              -> resume_run
/// POST /runs/{id}/complete            -> complete_sewing_run
/// POST /runs/{id}/efficiency-analysis -> efficiency_analysis
/// GET  /dashboard                     -> dashboard
/// GET  /operators/efficiency          -> operators_efficiency
/// POST /operators/payroll             -> operators_payroll
/// GET  /operators/{id}/performance    -> operator_performance
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route(
            "/operations",
            get(sewing::list_operations).post(sewing::create_operation),
        )
        .route(
            "/piece-rates",
            get(sewing::list_piece_rates).post(sewing::create_piece_rate),
        )
        .route("/runs", get(sewing::list_runs).post(sewing::create_run))
        .route("/runs/{id}", get(sewing::get_run))
        .route("/runs/{id}/start", post(sewing::start_run))
        .route("/runs/{id}/pause", post(sewing::pause_run))
        .route("/runs/{id}/resume", post(sewing::resume_run))
        .route("/runs/{id}/complete", post(sewing::complete_sewing_run))
        .route(
            "/runs/{id}/efficiency-analysis",
            post(sewing::efficiency_analysis),
        )
        .route("/dashboard", get(sewing::dashboard))
        .route("/operators/efficiency", get(sewing::operators_efficiency))
        .route("/operators/payroll", post(sewing::operators_payroll))
        .route(
            "/operators/{id}/performance",
            get(sewing::operator_performance),
        )
}

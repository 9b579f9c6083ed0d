//! Route definitions for the `/quality` resource.

use axum::routing::{get, post};
use axum::Router;

use crate::handlers::quality;
use crate::state::AppState;

/// Routes mounted at `/quality`.
///
/// ```text
/// GET  /defect-codes                 -> list_defect_codes
/// POST /defect-codes                 -> create_defect_code
/// GET  /checklists                   -> list_checklists
/// POST /checklists                   -> create_checklist
/// GET  /inspections                  -> list_inspections
/// POST /inspections                  -> create_inspection
/// GET  /inspections/{id}             -> get_inspection
/// POST /inspections/{id}/start       -> start_inspection
/// POST /inspections/{id}/defects     -> record_defect
/// POST /inspections/{id}/complete    -> complete_inspection
/// POST /aql/calculate-sample-size    -> calculate_sample_size
/// POST /aql/evaluate-result          -> evaluate_result
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route(
            "/defect-codes",
            get(quality::list_defect_codes).post(quality::create_defect_code),
        )
        .route(
            "/checklists",
            get(quality::list_checklists).post(quality::create_checklist),
        )
        .route(
            "/inspections",
            get(quality::list_inspections).post(quality::create_inspection),
        )
        .route("/inspections/{id}", get(quality::get_inspection))
        .route("/inspections/{id}/start", post(quality::start_inspection))
        .route("/inspections/{id}/defects", post(quality::record_defect))
        .route(
            "/inspections/{id}/complete",
            post(quality::complete_inspection),
        )
        .route(
            "/aql/calculate-sample-size",
            post(quality::calculate_sample_size),
        )
        .route("/aql/evaluate-result", post(quality::evaluate_result))
}

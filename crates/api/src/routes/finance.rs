//! Route definitions for the `/finance` resource.

use axum::routing::{get, post};
use axum::Router;

use crate::handlers::finance;
use crate::state::AppState;

/// Routes mounted at `/finance`.
///
/// ```text
/// GET  /invoices              -> list_invoices
/// POST /invoices              -> create_invoice
/// GET  /invoices/{id}         -> get_invoice
/// POST /invoices/{id}/cancel  -> cancel_invoice
/// POST /payments              -> record_payment
/// GET  /summary               -> summary
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route(
            "/invoices",
            get(finance::list_invoices).post(finance::create_invoice),
        )
        .route("/invoices/{id}", get(finance::get_invoice))
        .route("/invoices/{id}/cancel", post(finance::cancel_invoice))
        .route("/payments", post(finance::record_payment))
        .route("/summary", get(finance::summary))
}

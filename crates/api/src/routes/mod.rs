pub mod admin;
pub mod audit;
pub mod auth;
pub mod capa;
pub mod clients;
pub mod cutting;
pub mod designs;
pub mod finance;
pub mod health;
pub mod hr;
pub mod inventory;
pub mod maintenance;
pub mod orders;
pub mod portal;
pub mod printing;
pub mod production;
pub mod quality;
pub mod sewing;

use axum::Router;

use crate::state::AppState;

/// Build the `/api/v1` route tree.
///
/// Route hierarchy:
///
/// ```text
/// /auth/register, /auth/login, /auth/refresh       public
/// /auth/logout, /auth/me                           requires auth
///
/// /admin/users                                     list, create (admin only)
/// /audit-logs                                      list (admin only)
///
/// /clients                                         list, create
/// /clients/{id}                                    get, update, delete
/// /clients/{id}/brands                             list, create
///
/// /orders                                          list, create
/// /orders/{id}                                     get, update
/// /orders/{id}/routing                             list, generate
///
/// /production/summary                              stage counts
/// /production/routing-steps/{id}                   update status
/// /production/bundles[/{id}[/status]]              bundles
///
/// /cutting/...                                     fabric, lays, bundles
/// /printing/...                                    machines, runs, dashboard
/// /sewing/...                                      operations, rates, runs, operators
/// /quality/...                                     defect codes, checklists, inspections, AQL
/// /capa/...                                        corrective/preventive actions
/// /designs/...                                     versions, approvals, lock
///
/// /portal/...                                      client portal (token, no bearer)
///
/// /hr/employees, /hr/attendance                    people and time
/// /hr/payroll                                      payroll periods, export
///
/// /finance/invoices, /finance/payments             billing
/// /finance/summary                                 revenue summary
///
/// /maintenance/assets, /schedules, /work-orders    equipment upkeep
///
/// /inventory/suppliers, /materials                 raw materials and stock
/// /inventory/purchase-orders                       DRAFT -> SUBMITTED -> APPROVED -> RECEIVED
/// /inventory/alerts, /costing, /summary            stock reports
/// ```
pub fn api_routes() -> Router<AppState> {
    Router::new()
        // Authentication routes (register, login, refresh, logout, me).
        .nest("/auth", auth::router())
        // Admin routes.
        .nest("/admin", admin::router())
        .nest("/audit-logs", audit::router())
        // Clients and orders.
        .nest("/clients", clients::router())
        .nest("/orders", orders::router())
        // Shop floor.
        .nest("/production", production::router())
        .nest("/cutting", cutting::router())
        .nest("/printing", printing::router())
        .nest("/sewing", sewing::router())
        // Quality.
        .nest("/quality", quality::router())
        .nest("/capa", capa::router())
        // Design approvals and the public portal.
        .nest("/designs", designs::router())
        .nest("/portal", portal::router())
        // People and money.
        .nest("/hr", hr::router())
        .nest("/finance", finance::router())
        .nest("/maintenance", maintenance::router())
        .nest("/inventory", inventory::router())
}

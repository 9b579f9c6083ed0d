//! Handler for `/audit-logs` (admin only).

use ashley_core::audit::validate_action;
use ashley_core::pagination;
use ashley_db::models::audit::{AuditLog, AuditQuery};
use ashley_db::repositories::AuditRepo;
use axum::extract::{Query, State};
use axum::Json;

use crate::error::{AppError, AppResult};
use crate::middleware::rbac::RequireAdmin;
use crate::response::PaginatedResponse;
use crate::state::AppState;

/// GET /api/v1/audit-logs?resource=&action=&page=&limit=
pub async fn list_audit_logs(
    RequireAdmin(admin): RequireAdmin,
    State(state): State<AppState>,
    Query(params): Query<AuditQuery>,
) -> AppResult<Json<PaginatedResponse<AuditLog>>> {
    if let Some(action) = params.action.as_deref() {
        validate_action(action).map_err(AppError::BadRequest)?;
    }
    let (page, limit, offset) = pagination::resolve(params.page, params.limit);
    let resource = params.resource.as_deref();
    let action = params.action.as_deref();

    let logs = AuditRepo::list(&state.pool, admin.workspace_id, resource, action, limit, offset).await?;
    let total = AuditRepo::count(&state.pool, admin.workspace_id, resource, action).await?;

    Ok(Json(PaginatedResponse::new(logs, page, limit, total)))
}

//! Audit trail and platform events for mutations.
//!
//! Handlers call [`record`] after a successful write. The audit insert is
//! best-effort: a failure is logged and never turns a committed mutation
//! into an error response.

use ashley_core::types::DbId;
use ashley_db::models::audit::CreateAuditLog;
use ashley_db::repositories::AuditRepo;
use ashley_events::PlatformEvent;

use crate::middleware::auth::AuthUser;
use crate::state::AppState;

/// One mutation, described for both the audit log and the event bus.
pub struct Activity<'a> {
    /// Audit action, one of `ashley_core::audit::VALID_ACTIONS`.
    pub action: &'a str,
    /// Resource name, e.g. `"order"`. Also the event source type.
    pub resource: &'a str,
    pub resource_id: DbId,
    /// Dot-separated event name, e.g. `"order.created"`.
    pub event_type: &'a str,
}

pub async fn record(
    state: &AppState,
    user: &AuthUser,
    activity: Activity<'_>,
    values: serde_json::Value,
) {
    record_for(
        state,
        user.workspace_id,
        Some(user.user_id),
        activity,
        values,
    )
    .await;
}

/// Variant for callers without a JWT, such as the client portal.
pub async fn record_for(
    state: &AppState,
    workspace_id: DbId,
    user_id: Option<DbId>,
    activity: Activity<'_>,
    values: serde_json::Value,
) {
    let audit = CreateAuditLog {
        workspace_id,
        user_id,
        action: activity.action.to_string(),
        resource: activity.resource.to_string(),
        resource_id: Some(activity.resource_id),
        new_values: Some(values.clone()),
    };
    if let Err(e) = AuditRepo::create(&state.pool, &audit).await {
        tracing::warn!(
            error = %e,
            resource = activity.resource,
            resource_id = activity.resource_id,
            "Failed to write audit log"
        );
    }

    let mut event = PlatformEvent::new(activity.event_type)
        .in_workspace(workspace_id)
        .with_source(activity.resource, activity.resource_id)
        .with_payload(values);
    if let Some(user_id) = user_id {
        event = event.with_actor(user_id);
    }
    state.event_bus.publish(event);
}

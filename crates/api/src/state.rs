use std::sync::Arc;

use crate::config::ServerConfig;

/// Shared application state, cloned into every handler.
#[derive(Clone)]
pub struct AppState {
    pub pool: ashley_db::DbPool,
    pub config: Arc<ServerConfig>,
    pub event_bus: Arc<ashley_events::EventBus>,
}

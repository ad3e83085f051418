use std::sync::Arc;

use folio_cache::ResponseCache;
use folio_events::EventBus;

use crate::config::ServerConfig;
use crate::ws::WsManager;

/// Shared application state available to all Axum handlers via `State<AppState>`.
///
/// Cheap to clone: everything is behind an `Arc` or is already a handle.
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool.
    pub pool: folio_db::DbPool,
    /// Server configuration.
    pub config: Arc<ServerConfig>,
    /// WebSocket connection manager.
    pub ws_manager: Arc<WsManager>,
    /// Event bus feeding the WebSocket broadcaster.
    pub event_bus: Arc<EventBus>,
    /// Response cache for public read endpoints.
    pub cache: Arc<ResponseCache>,
}

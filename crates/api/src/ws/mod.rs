//! WebSocket infrastructure: connection and room management, heartbeat,
//! the collaboration protocol, and the HTTP upgrade handler.

mod handler;
mod heartbeat;
pub mod manager;
pub mod protocol;
pub mod session;

pub use handler::ws_handler;
pub use heartbeat::start_heartbeat;
pub use manager::{RealtimeStats, WsManager, WsUser};
pub use session::WsSession;

use std::sync::Arc;

use tokio::sync::mpsc;

use crate::config::ServerConfig;
use crate::monitor::Subscriber;

/// Shared application state available to all Axum handlers via `State<AppState>`.
///
/// This is cheaply cloneable (inner data is behind `Arc` or is already `Clone`).
#[derive(Clone)]
pub struct AppState {
    /// Server configuration.
    pub config: Arc<ServerConfig>,
    /// Join channel into the coordinator; delivering a [`Subscriber`] here
    /// is the only way a connection enters the system.
    pub joins: mpsc::Sender<Subscriber>,
}

use std::sync::Arc;

use crate::background::stock_sweeper::SweeperHandle;
use crate::config::ServerConfig;

/// Shared application state available to all Axum handlers via `State<AppState>`.
///
/// This is cheaply cloneable (inner data is behind `Arc` or is already `Clone`).
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool.
    pub pool: vitrine_db::DbPool,
    /// Server configuration.
    pub config: Arc<ServerConfig>,
    /// Shared status of the expiry sweeper (background task and manual
    /// trigger both report through this).
    pub sweeper: Arc<SweeperHandle>,
}

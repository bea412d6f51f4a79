//! Shared application state

use std::sync::Arc;

use anvil_cluster::ClusterClient;
use anvil_engine::EngineClient;

/// Handles shared by all request handlers
///
/// Both clients are constructed once at startup and never reconfigured
/// afterwards, so sharing them is plain reference counting.
#[derive(Clone)]
pub struct AppState {
    pub engine: Arc<EngineClient>,
    pub cluster: Arc<ClusterClient>,
}

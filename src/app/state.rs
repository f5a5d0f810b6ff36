//! Application state shared across routes

use std::sync::Arc;

use tokio::sync::Mutex;

use crate::config::Config;
use crate::game::World;
use crate::hub::HubHandle;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    /// The authoritative world, behind the single simulation mutex
    pub world: Arc<Mutex<World>>,
    pub hub: HubHandle,
}

impl AppState {
    pub fn new(config: Config, hub: HubHandle) -> Self {
        Self::with_seed(config, hub, rand::random())
    }

    /// Deterministic construction for tests
    pub fn with_seed(config: Config, hub: HubHandle, seed: u64) -> Self {
        Self {
            config: Arc::new(config),
            world: Arc::new(Mutex::new(World::new(seed))),
            hub,
        }
    }
}

pub mod config;
pub mod gateway;
pub mod id;

use std::sync::Arc;

use config::Config;
use gateway::registry::ClientRegistry;
use gateway::rooms::RoomDirectory;

/// Shared application state available to every connection task.
#[derive(Clone)]
pub struct AppState {
    pub clients: Arc<ClientRegistry>,
    pub rooms: Arc<RoomDirectory>,
    pub config: Arc<Config>,
}

impl AppState {
    pub fn new(config: Config) -> Self {
        Self {
            clients: Arc::new(ClientRegistry::new()),
            rooms: Arc::new(RoomDirectory::new()),
            config: Arc::new(config),
        }
    }
}

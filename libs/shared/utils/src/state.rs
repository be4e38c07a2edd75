use shared_config::AppConfig;

use crate::session::SessionRegistry;

/// Shared router state: configuration plus the live session registry.
#[derive(Debug)]
pub struct AppState {
    pub config: AppConfig,
    pub sessions: SessionRegistry,
}

impl AppState {
    pub fn new(config: AppConfig) -> Self {
        Self {
            config,
            sessions: SessionRegistry::new(),
        }
    }
}

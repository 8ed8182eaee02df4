//! Application state shared by all handlers.

use crate::services::ResourceService;
use memos_core::Config;

#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    pub resources: ResourceService,
}

impl AppState {
    pub fn new(config: Config, resources: ResourceService) -> Self {
        Self { config, resources }
    }
}

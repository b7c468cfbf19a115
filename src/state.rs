//! Shared, read-only state handed to every handler.

use crate::{
    config::AppConfig, models::landing::LandingPage, services::storage_service::StorageService,
};
use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub storage: StorageService,
    pub landing: LandingPage,
}

impl AppState {
    pub fn new(config: AppConfig, landing: LandingPage) -> Self {
        let storage = StorageService::new(config.storage_dir.clone());
        Self {
            config: Arc::new(config),
            storage,
            landing,
        }
    }
}

//! Shared application state for all routes: the storage collaborator and alert settings.

use crate::config::Settings;
use crate::error::ConfigError;
use crate::response::Alerts;
use crate::store::Repository;
use std::sync::Arc;

pub struct AppState<R> {
    pub repo: Arc<R>,
    pub alerts: Arc<Alerts>,
    pub settings: Arc<Settings>,
}

impl<R: Repository> AppState<R> {
    pub fn new(repo: R, settings: Settings) -> Result<Self, ConfigError> {
        let alerts = Alerts::new(&settings.app_name, settings.enable_translation)?;
        Ok(AppState {
            repo: Arc::new(repo),
            alerts: Arc::new(alerts),
            settings: Arc::new(settings),
        })
    }
}

// Manual impl: a derive would require `R: Clone`.
impl<R> Clone for AppState<R> {
    fn clone(&self) -> Self {
        AppState {
            repo: Arc::clone(&self.repo),
            alerts: Arc::clone(&self.alerts),
            settings: Arc::clone(&self.settings),
        }
    }
}

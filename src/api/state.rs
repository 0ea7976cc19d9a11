//! Application state - Dependency injection container.
//!
//! Provides centralized access to all application services and infrastructure.

use std::sync::Arc;

use crate::config::Config;
use crate::infra::Database;
use crate::services::{AuthService, CategoryService, ServiceContainer, Services};

/// Application state containing all services (DI container).
#[derive(Clone)]
pub struct AppState {
    /// Bearer token verification
    pub auth_service: Arc<dyn AuthService>,
    /// Category use cases
    pub category_service: Arc<dyn CategoryService>,
    /// Database connection
    pub database: Arc<Database>,
    pub config: Arc<Config>,
}

impl AppState {
    /// Create application state from database connection and config.
    pub fn from_config(database: Arc<Database>, config: Config) -> Self {
        let container = Services::from_connection(database.get_connection(), &config);
        Self::with_services(&container, database, config)
    }

    /// Create application state from an already built container.
    pub fn with_services(
        services: &dyn ServiceContainer,
        database: Arc<Database>,
        config: Config,
    ) -> Self {
        Self::new(services.auth(), services.categories(), database, config)
    }

    /// Create new application state with manually injected services.
    pub fn new(
        auth_service: Arc<dyn AuthService>,
        category_service: Arc<dyn CategoryService>,
        database: Arc<Database>,
        config: Config,
    ) -> Self {
        Self {
            auth_service,
            category_service,
            database,
            config: Arc::new(config),
        }
    }
}

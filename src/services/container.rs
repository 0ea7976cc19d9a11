//! Service Container - Centralized service access.
//!
//! Services are built once at startup and shared behind `Arc`; each service
//! call still runs in its own unit of work.

use std::sync::Arc;

use super::{AuthService, Authenticator, CategoryManager, CategoryService};
use crate::config::Config;
use crate::infra::{CategoryStore, ExecutionStrategy, Persistence};

#[cfg(any(test, feature = "test-utils"))]
use mockall::automock;

/// Service container trait for dependency injection.
#[cfg_attr(any(test, feature = "test-utils"), automock)]
pub trait ServiceContainer: Send + Sync {
    /// Get authentication service
    fn auth(&self) -> Arc<dyn AuthService>;

    /// Get category service
    fn categories(&self) -> Arc<dyn CategoryService>;
}

/// Concrete implementation of ServiceContainer
#[derive(Clone)]
pub struct Services {
    auth_service: Arc<dyn AuthService>,
    category_service: Arc<dyn CategoryService>,
}

impl Services {
    /// Create a new service container with all services initialized
    pub fn new(
        auth_service: Arc<dyn AuthService>,
        category_service: Arc<dyn CategoryService>,
    ) -> Self {
        Self {
            auth_service,
            category_service,
        }
    }

    /// Create service container from database connection and config
    pub fn from_connection(db: sea_orm::DatabaseConnection, config: &Config) -> Self {
        let persistence = Persistence::new(db, ExecutionStrategy::from_config(config));
        let categories = Arc::new(CategoryStore::new(persistence));

        Self {
            auth_service: Arc::new(Authenticator::new(config)),
            category_service: Arc::new(CategoryManager::new(categories)),
        }
    }
}

impl ServiceContainer for Services {
    fn auth(&self) -> Arc<dyn AuthService> {
        self.auth_service.clone()
    }

    fn categories(&self) -> Arc<dyn CategoryService> {
        self.category_service.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::MockCategoryService;

    #[test]
    fn test_container_hands_out_shared_services() {
        let config = Config::builder()
            .jwt("i", "a", "unit-test-secret-with-enough-length!")
            .build()
            .unwrap();
        let services = Services::new(
            Arc::new(Authenticator::new(&config)),
            Arc::new(MockCategoryService::new()),
        );

        assert!(Arc::ptr_eq(&services.categories(), &services.categories()));
    }
}

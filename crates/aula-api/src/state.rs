use std::sync::Arc;

use aula_core::{
    default_schemas, seed_admin, AuthService, Clock, DomainError, EntityStore, OrderService,
    ProductService, SessionStore, TaskService,
};
use aula_security::CredentialPair;
use aula_shared::config::AppConfig;
use aula_shared::constants::DEFAULT_ADMIN_AGE;
use chrono::Duration;

#[derive(Clone)]
pub struct AppState {
    pub store: Arc<EntityStore>,
    pub auth: Arc<AuthService>,
    pub tasks: Arc<TaskService>,
    pub orders: Arc<OrderService>,
    pub products: Arc<ProductService>,
    pub config: Arc<AppConfig>,
}

impl AppState {
    /// Builds the built-in collections, seeds the admin user and wires the
    /// session guard to it. Fails on a session ttl the session table rejects.
    pub fn build(config: AppConfig, clock: Arc<dyn Clock>) -> Result<Self, DomainError> {
        let ttl = Duration::try_seconds(config.auth.session_ttl_seconds).ok_or_else(|| {
            DomainError::Internal(format!(
                "session ttl {}s is out of range",
                config.auth.session_ttl_seconds
            ))
        })?;
        let sessions = SessionStore::new(ttl, clock.clone())?;

        let store = Arc::new(EntityStore::with_schemas(default_schemas(), clock));
        let admin_id = seed_admin(
            &store,
            &config.auth.admin_name,
            &config.auth.email,
            DEFAULT_ADMIN_AGE,
        )?;

        let credentials = CredentialPair::new(&config.auth.email, &config.auth.password)
            .map_err(|e| DomainError::Internal(e.to_string()))?;

        Ok(Self {
            auth: Arc::new(AuthService::new(credentials, admin_id, sessions)),
            tasks: Arc::new(TaskService::new(store.clone())),
            orders: Arc::new(OrderService::new(store.clone())),
            products: Arc::new(ProductService::new(store.clone())),
            store,
            config: Arc::new(config),
        })
    }
}

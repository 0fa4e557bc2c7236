use app_config::AppConfig;
use app_database::{ContactRepository, Database, UserRepository};
use app_middleware::JwtService;
use app_utils::Mailer;
use std::sync::Arc;

use crate::service::{AuthService, AuthServiceTrait, ContactService};

/// Shared, read-only handles every handler gets through `State`
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub auth: Arc<dyn AuthServiceTrait>,
    pub contacts: Arc<ContactService>,
    pub jwt: Arc<JwtService>,
}

impl AppState {
    pub fn new(config: AppConfig, db: &Database, mailer: Arc<dyn Mailer>) -> Self {
        let jwt = Arc::new(JwtService::from_config(&config.security.jwt));

        let auth = AuthService::new(
            Arc::new(UserRepository::new(db)),
            Arc::clone(&jwt),
            mailer,
            config.security.jwt.clone(),
            config.security.password.clone(),
            config.mail.base_url.clone(),
        );

        Self {
            auth: Arc::new(auth),
            contacts: Arc::new(ContactService::new(ContactRepository::new(db))),
            jwt,
            config: Arc::new(config),
        }
    }
}

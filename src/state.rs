use std::sync::Arc;

use crate::auth::Authenticator;
use crate::config::AppConfig;
use crate::database::Storage;
use crate::mail::Mailer;
use crate::ratelimiter::RateLimiter;

/// Shared application state handed to every handler and middleware.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub store: Storage,
    pub authenticator: Arc<dyn Authenticator>,
    pub mailer: Arc<dyn Mailer>,
    pub rate_limiter: Arc<dyn RateLimiter>,
}

impl AppState {
    pub fn new(
        config: AppConfig,
        store: Storage,
        authenticator: Arc<dyn Authenticator>,
        mailer: Arc<dyn Mailer>,
        rate_limiter: Arc<dyn RateLimiter>,
    ) -> Self {
        Self {
            config: Arc::new(config),
            store,
            authenticator,
            mailer,
            rate_limiter,
        }
    }

    /// Mail is only delivered for real in production.
    pub fn mail_sandboxed(&self) -> bool {
        !self.config.is_production()
    }
}

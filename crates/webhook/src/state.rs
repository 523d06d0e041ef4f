//! Process-wide configuration and shared state (§6.1).

use std::sync::Arc;

use scm::CredentialBroker;

use crate::rate_limit::{RateLimitConfig, RateLimiter};
use crate::results::ResultStore;

const DEFAULT_API_BASE: &str = "https://api.github.com";

/// Environment-derived configuration (§6.1).
#[derive(Clone)]
pub struct AppConfig {
    pub webhook_secret: Option<String>,
    pub gemini_api_key: Option<String>,
    pub target_url: Option<String>,
    pub development_mode: bool,
    pub api_base: String,
}

impl AppConfig {
    #[must_use]
    pub fn from_env() -> Self {
        let development_mode = std::env::var("NODE_ENV")
            .map(|v| v.eq_ignore_ascii_case("development"))
            .unwrap_or(false);

        Self {
            webhook_secret: std::env::var("GITHUB_WEBHOOK_SECRET").ok(),
            gemini_api_key: std::env::var("GEMINI_API_KEY").ok(),
            target_url: std::env::var("NEXTAUTH_URL").ok(),
            development_mode,
            api_base: DEFAULT_API_BASE.to_string(),
        }
    }
}

pub struct AppState {
    pub config: AppConfig,
    pub credentials: Arc<CredentialBroker>,
    pub store: Arc<dyn store::Store>,
    pub notifier: Arc<notify::Notifier>,
    pub rate_limiter: RateLimiter,
    pub results: ResultStore,
}

impl AppState {
    #[must_use]
    pub fn new(config: AppConfig, store: Arc<dyn store::Store>) -> Self {
        let credentials = Arc::new(CredentialBroker::from_env(config.api_base.clone()));
        let notifier = Arc::new(notify::Notifier::from_env());
        Self {
            config,
            credentials,
            store,
            notifier,
            rate_limiter: RateLimiter::new(RateLimitConfig::default()),
            results: ResultStore::new(),
        }
    }

    /// Build a forge client scoped to `installation_id` (or the
    /// fallback-token path when `None`).
    #[must_use]
    pub fn forge_client(&self, installation_id: Option<String>) -> scm::ForgeClient {
        scm::ForgeClient::new(self.config.api_base.clone(), Arc::clone(&self.credentials), installation_id)
    }
}

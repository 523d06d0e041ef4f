//! Installation credential minting and caching (§4.1).

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{encode, Algorithm, EncodingKey, Header};
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use crate::error::{ForgeError, ForgeResult};

/// Minimum remaining lifetime before a cached token is considered fresh.
const MIN_FRESH_SECS: i64 = 5 * 60;

/// Lifetime requested for app-level JWT assertions (GitHub caps this at 10m).
const APP_JWT_TTL_SECS: i64 = 9 * 60;

/// A cached bearer token with its expiry.
#[derive(Debug, Clone)]
struct CachedToken {
    token: String,
    expires_at: DateTime<Utc>,
}

impl CachedToken {
    fn is_fresh(&self) -> bool {
        (self.expires_at - Utc::now()).num_seconds() > MIN_FRESH_SECS
    }
}

#[derive(Debug, Serialize, Deserialize)]
struct AppClaims {
    iat: i64,
    exp: i64,
    iss: String,
}

#[derive(Debug, Deserialize)]
struct InstallationTokenResponse {
    token: String,
    expires_at: DateTime<Utc>,
}

/// Mints short-lived installation tokens from an app-level signing key,
/// falling back to a long-lived personal token when app credentials are
/// absent. Tokens are cached by installation id and refreshed under a
/// single-flight lock so concurrent callers never double-mint.
pub struct CredentialBroker {
    app_id: Option<String>,
    private_key_pem: Option<Vec<u8>>,
    fallback_token: Option<String>,
    api_base: String,
    http: reqwest::Client,
    cache: Mutex<HashMap<String, CachedToken>>,
}

/// Key used for the fallback-token cache slot (no installation id).
const FALLBACK_KEY: &str = "__fallback__";

impl CredentialBroker {
    /// Build a broker from explicit credential material.
    #[must_use]
    pub fn new(
        app_id: Option<String>,
        private_key_pem: Option<Vec<u8>>,
        fallback_token: Option<String>,
        api_base: impl Into<String>,
    ) -> Self {
        Self {
            app_id,
            private_key_pem,
            fallback_token,
            api_base: api_base.into(),
            http: reqwest::Client::new(),
            cache: Mutex::new(HashMap::new()),
        }
    }

    /// Build a broker from the standard environment variables.
    #[must_use]
    pub fn from_env(api_base: impl Into<String>) -> Self {
        let app_id = std::env::var("GITHUB_APP_ID").ok();
        let private_key_pem = std::env::var("GITHUB_APP_PRIVATE_KEY")
            .ok()
            .map(String::into_bytes);
        let fallback_token = std::env::var("GITHUB_TOKEN").ok();
        Self::new(app_id, private_key_pem, fallback_token, api_base)
    }

    /// Mint (or reuse a cached) bearer token valid for at least 55 minutes.
    ///
    /// # Errors
    /// Returns [`ForgeError::AuthUnconfigured`] if neither app credentials
    /// nor a fallback token are available, or [`ForgeError::Upstream`] if
    /// the installation-token exchange fails.
    pub async fn token(&self, installation_id: Option<&str>) -> ForgeResult<String> {
        let cache_key = installation_id.unwrap_or(FALLBACK_KEY).to_string();

        {
            let cache = self.cache.lock().await;
            if let Some(cached) = cache.get(&cache_key) {
                if cached.is_fresh() {
                    debug!(installation_id, "reusing cached installation token");
                    return Ok(cached.token.clone());
                }
            }
        }

        // Single-flight: hold the lock across the refresh so concurrent
        // callers for the same installation don't double-mint.
        let mut cache = self.cache.lock().await;
        if let Some(cached) = cache.get(&cache_key) {
            if cached.is_fresh() {
                return Ok(cached.token.clone());
            }
        }

        let fresh = self.mint(installation_id).await?;
        cache.insert(cache_key, fresh.clone());
        Ok(fresh.token)
    }

    async fn mint(&self, installation_id: Option<&str>) -> ForgeResult<CachedToken> {
        if let (Some(app_id), Some(key), Some(installation_id)) =
            (&self.app_id, &self.private_key_pem, installation_id)
        {
            return self.mint_installation_token(app_id, key, installation_id).await;
        }

        if let Some(token) = &self.fallback_token {
            warn!("no app credentials configured, using fallback GITHUB_TOKEN");
            return Ok(CachedToken {
                token: token.clone(),
                expires_at: Utc::now() + Duration::hours(8),
            });
        }

        Err(ForgeError::AuthUnconfigured)
    }

    async fn mint_installation_token(
        &self,
        app_id: &str,
        private_key_pem: &[u8],
        installation_id: &str,
    ) -> ForgeResult<CachedToken> {
        let jwt = Self::sign_app_jwt(app_id, private_key_pem)?;

        let url = format!(
            "{}/app/installations/{installation_id}/access_tokens",
            self.api_base
        );

        let resp = self
            .http
            .post(&url)
            .bearer_auth(jwt)
            .header("Accept", "application/vnd.github+json")
            .send()
            .await
            .map_err(|e| ForgeError::Upstream(e.to_string()))?;

        if !resp.status().is_success() {
            let status = resp.status();
            return Err(ForgeError::Upstream(format!(
                "installation token mint failed: {status}"
            )));
        }

        let body: InstallationTokenResponse = resp
            .json()
            .await
            .map_err(|e| ForgeError::Upstream(e.to_string()))?;

        info!(installation_id, "minted installation token");

        Ok(CachedToken {
            token: body.token,
            expires_at: body.expires_at,
        })
    }

    fn sign_app_jwt(app_id: &str, private_key_pem: &[u8]) -> ForgeResult<String> {
        let now = Utc::now();
        let claims = AppClaims {
            iat: (now - Duration::seconds(60)).timestamp(),
            exp: (now + Duration::seconds(APP_JWT_TTL_SECS)).timestamp(),
            iss: app_id.to_string(),
        };

        let key = EncodingKey::from_rsa_pem(private_key_pem)?;
        let header = Header::new(Algorithm::RS256);
        Ok(encode(&header, &claims, &key)?)
    }
}

/// Shared handle, cloned cheaply across the process.
pub type SharedCredentialBroker = Arc<CredentialBroker>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cached_token_freshness() {
        let fresh = CachedToken {
            token: "t".into(),
            expires_at: Utc::now() + Duration::minutes(56),
        };
        assert!(fresh.is_fresh());

        let stale = CachedToken {
            token: "t".into(),
            expires_at: Utc::now() + Duration::minutes(2),
        };
        assert!(!stale.is_fresh());
    }

    #[tokio::test]
    async fn fallback_token_used_when_no_app_creds() {
        let broker = CredentialBroker::new(
            None,
            None,
            Some("ghp_fallback".to_string()),
            "https://api.github.test",
        );
        let token = broker.token(None).await.unwrap();
        assert_eq!(token, "ghp_fallback");
    }

    #[tokio::test]
    async fn auth_unconfigured_without_any_credentials() {
        let broker = CredentialBroker::new(None, None, None, "https://api.github.test");
        let err = broker.token(Some("123")).await.unwrap_err();
        assert!(matches!(err, ForgeError::AuthUnconfigured));
    }
}

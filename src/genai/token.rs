// src/genai/token.rs
//! Injectable credential cache for the generative client.
//!
//! The cached token is the only cross-request mutable state in the engine.
//! It self-invalidates by timestamp comparison on each access; concurrent
//! refreshes are a benign race (any two fetches converge on equivalent
//! tokens), so a plain mutex around the slot is enough.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tracing::debug;

use crate::error::EngineError;

/// Refresh no later than 55 minutes after a fetch (5 minutes before the
/// provider's usual one-hour expiry).
pub const TOKEN_TTL: Duration = Duration::from_secs(55 * 60);
const EXPIRY_MARGIN: Duration = Duration::from_secs(5 * 60);

/// Credential as returned by the provider.
#[derive(Debug, Clone)]
pub struct AccessToken {
    pub token: String,
    /// Provider's approximate expiry instant.
    pub expires_at: DateTime<Utc>,
}

/// Collaborator that mints fresh access tokens.
#[async_trait]
pub trait CredentialSource: Send + Sync {
    async fn fetch_token(&self) -> anyhow::Result<AccessToken>;
}

pub type DynCredentialSource = Arc<dyn CredentialSource>;

#[derive(Debug, Clone)]
struct CachedToken {
    token: String,
    refresh_after: DateTime<Utc>,
}

/// Process-wide token cache with `get()`/`invalidate()`. A failed fetch
/// surfaces as an authentication error and leaves any cached state
/// untouched.
pub struct TokenCache {
    source: DynCredentialSource,
    slot: Mutex<Option<CachedToken>>,
}

impl TokenCache {
    pub fn new(source: DynCredentialSource) -> Self {
        Self {
            source,
            slot: Mutex::new(None),
        }
    }

    pub async fn get(&self) -> Result<String, EngineError> {
        let now = Utc::now();
        {
            let slot = self.slot.lock().expect("token slot poisoned");
            if let Some(cached) = slot.as_ref() {
                if now < cached.refresh_after {
                    return Ok(cached.token.clone());
                }
            }
        }

        // Lock is released across the await; a concurrent refresh is fine.
        let fresh = self
            .source
            .fetch_token()
            .await
            .map_err(|e| EngineError::Authentication(e.to_string()))?;

        let ttl_deadline = now + chrono::Duration::from_std(TOKEN_TTL).expect("ttl fits");
        let margin = chrono::Duration::from_std(EXPIRY_MARGIN).expect("margin fits");
        let refresh_after = ttl_deadline.min(fresh.expires_at - margin);

        debug!(refresh_after = %refresh_after, "access token refreshed");
        let mut slot = self.slot.lock().expect("token slot poisoned");
        *slot = Some(CachedToken {
            token: fresh.token.clone(),
            refresh_after,
        });
        Ok(fresh.token)
    }

    pub fn invalidate(&self) {
        let mut slot = self.slot.lock().expect("token slot poisoned");
        *slot = None;
    }

    /// Backdate the cached deadline so expiry paths can be tested without
    /// waiting out the TTL.
    #[cfg(test)]
    fn expire_now(&self) {
        let mut slot = self.slot.lock().expect("token slot poisoned");
        if let Some(cached) = slot.as_mut() {
            cached.refresh_after = Utc::now() - chrono::Duration::seconds(1);
        }
    }
}

/// Fetches tokens from the GCP metadata server (the credential collaborator
/// used in deployment). Expects `{access_token, expires_in}`.
pub struct MetadataCredentialSource {
    http: reqwest::Client,
    url: String,
}

impl MetadataCredentialSource {
    const DEFAULT_URL: &'static str = "http://metadata.google.internal/computeMetadata/v1/instance/service-accounts/default/token";

    pub fn new(url: Option<&str>) -> anyhow::Result<Self> {
        let http = reqwest::Client::builder()
            .connect_timeout(Duration::from_secs(2))
            .timeout(Duration::from_secs(5))
            .build()?;
        Ok(Self {
            http,
            url: url.unwrap_or(Self::DEFAULT_URL).to_string(),
        })
    }
}

#[async_trait]
impl CredentialSource for MetadataCredentialSource {
    async fn fetch_token(&self) -> anyhow::Result<AccessToken> {
        #[derive(serde::Deserialize)]
        struct Reply {
            access_token: String,
            expires_in: i64,
        }
        let reply: Reply = self
            .http
            .get(&self.url)
            .header("Metadata-Flavor", "Google")
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;
        Ok(AccessToken {
            token: reply.access_token,
            expires_at: Utc::now() + chrono::Duration::seconds(reply.expires_in.max(0)),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct CountingSource {
        calls: AtomicUsize,
        fail: bool,
    }

    #[async_trait]
    impl CredentialSource for CountingSource {
        async fn fetch_token(&self) -> anyhow::Result<AccessToken> {
            let n = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
            if self.fail {
                anyhow::bail!("metadata server unreachable");
            }
            Ok(AccessToken {
                token: format!("tok-{n}"),
                expires_at: Utc::now() + chrono::Duration::hours(1),
            })
        }
    }

    #[tokio::test]
    async fn second_call_within_ttl_reuses_token() {
        let source = Arc::new(CountingSource {
            calls: AtomicUsize::new(0),
            fail: false,
        });
        let cache = TokenCache::new(source.clone());

        let a = cache.get().await.unwrap();
        let b = cache.get().await.unwrap();
        assert_eq!(a, b);
        assert_eq!(source.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn invalidate_forces_exactly_one_refetch() {
        let source = Arc::new(CountingSource {
            calls: AtomicUsize::new(0),
            fail: false,
        });
        let cache = TokenCache::new(source.clone());

        let a = cache.get().await.unwrap();
        cache.invalidate();
        let b = cache.get().await.unwrap();
        assert_ne!(a, b);
        assert_eq!(source.calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn expired_deadline_triggers_exactly_one_refetch() {
        let source = Arc::new(CountingSource {
            calls: AtomicUsize::new(0),
            fail: false,
        });
        let cache = TokenCache::new(source.clone());

        cache.get().await.unwrap();
        cache.expire_now();
        let b = cache.get().await.unwrap();
        cache.get().await.unwrap();
        assert_eq!(b, "tok-2");
        assert_eq!(source.calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn fetch_failure_is_an_authentication_error() {
        let source = Arc::new(CountingSource {
            calls: AtomicUsize::new(0),
            fail: true,
        });
        let cache = TokenCache::new(source);

        let err = cache.get().await.unwrap_err();
        assert_eq!(err.code(), "AUTHENTICATION_ERROR");
    }
}

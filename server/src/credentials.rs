// Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
// SPDX-License-Identifier: MIT-0

//! Tenant access token caching.
//!
//! [`CredentialCache`] hands out the upstream bearer token to every record
//! query. The token is refreshed through a [`TokenSource`] once its age
//! passes `ttl - refresh_margin`, so callers never race an in-flight
//! request against the real expiry.
//!
//! # Concurrency
//!
//! Readers take a shared lock on the fast path. A refresh holds the write
//! lock for the duration of the upstream call; callers that arrive while it
//! is in flight queue on the lock and re-check freshness once they acquire
//! it, so a stale window triggers exactly one upstream call.
//!
//! A failed refresh leaves the cache empty-handed: nothing is stored, the
//! stale token is not served, and the next caller retries immediately.

use std::fmt;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;
use zeroize::{ZeroizeOnDrop, Zeroizing};

use crate::constants;
use crate::errors::AppError;

#[derive(Clone, ZeroizeOnDrop)]
pub struct Credential {
    token: String,
    #[zeroize(skip)]
    issued_at: Instant,
    #[zeroize(skip)]
    ttl: Duration,
}

impl Credential {
    pub fn new(token: String, ttl: Duration) -> Self {
        Self {
            token,
            issued_at: Instant::now(),
            ttl,
        }
    }

    pub fn token(&self) -> &str {
        &self.token
    }

    pub fn issued_at(&self) -> Instant {
        self.issued_at
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    pub fn age(&self) -> Duration {
        self.issued_at.elapsed()
    }

    /// A credential is fresh while `age <= ttl - margin`.
    pub fn is_fresh(&self, refresh_margin: Duration) -> bool {
        self.age() <= self.ttl.saturating_sub(refresh_margin)
    }
}

// Custom Debug implementation to prevent accidental logging of the bearer token
impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credential")
            .field("token", &"[REDACTED]")
            .field("issued_at", &self.issued_at)
            .field("ttl", &self.ttl)
            .finish()
    }
}

/// A token as returned by the upstream auth endpoint.
pub struct IssuedToken {
    pub token: String,
    /// Lifetime reported by the upstream, if any
    pub expires_in: Option<Duration>,
}

impl fmt::Debug for IssuedToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("IssuedToken")
            .field("token", &"[REDACTED]")
            .field("expires_in", &self.expires_in)
            .finish()
    }
}

#[async_trait]
pub trait TokenSource: Send + Sync {
    async fn fetch_token(&self) -> Result<IssuedToken, AppError>;
}

#[derive(Serialize)]
struct TokenRequest<'a> {
    app_id: &'a str,
    app_secret: &'a str,
}

#[derive(Deserialize)]
struct TokenResponse {
    #[serde(default)]
    code: i64,
    #[serde(default)]
    msg: String,
    #[serde(default)]
    tenant_access_token: Option<String>,
    #[serde(default)]
    expire: Option<u64>,
}

/// Obtains tenant access tokens from the Feishu internal-app auth endpoint.
pub struct FeishuTokenSource {
    client: reqwest::Client,
    url: String,
    app_id: String,
    app_secret: Zeroizing<String>,
    timeout: Duration,
}

impl FeishuTokenSource {
    pub fn new(
        client: reqwest::Client,
        base_url: &str,
        app_id: String,
        app_secret: String,
        timeout: Duration,
    ) -> Self {
        Self {
            client,
            url: format!(
                "{}{}",
                base_url.trim_end_matches('/'),
                constants::TENANT_TOKEN_PATH
            ),
            app_id,
            app_secret: Zeroizing::new(app_secret),
            timeout,
        }
    }
}

#[async_trait]
impl TokenSource for FeishuTokenSource {
    #[tracing::instrument(skip(self), fields(app_id = %self.app_id))]
    async fn fetch_token(&self) -> Result<IssuedToken, AppError> {
        let request = TokenRequest {
            app_id: &self.app_id,
            app_secret: self.app_secret.as_str(),
        };

        let response = self
            .client
            .post(&self.url)
            .timeout(self.timeout)
            .json(&request)
            .send()
            .await
            .map_err(|err| {
                tracing::error!("[server] token request failed: {}", err);
                AppError::AuthFailure(format!("token request failed: {err}"))
            })?;

        let status = response.status();
        if !status.is_success() {
            tracing::error!("[server] token endpoint returned {}", status);
            return Err(AppError::AuthFailure(format!(
                "token endpoint returned {status}"
            )));
        }

        let payload: TokenResponse = response.json().await.map_err(|err| {
            tracing::error!("[server] malformed token response: {}", err);
            AppError::AuthFailure(format!("malformed token response: {err}"))
        })?;

        if payload.code != 0 {
            tracing::error!(
                "[server] token endpoint rejected credentials: {} {}",
                payload.code,
                payload.msg
            );
            return Err(AppError::AuthFailure(format!(
                "token endpoint returned code {}: {}",
                payload.code, payload.msg
            )));
        }

        let token = payload
            .tenant_access_token
            .filter(|token| !token.is_empty())
            .ok_or_else(|| AppError::AuthFailure("token missing from response".to_string()))?;

        Ok(IssuedToken {
            token,
            expires_in: payload
                .expire
                .filter(|secs| *secs > 0)
                .map(Duration::from_secs),
        })
    }
}

pub struct CredentialCache {
    source: Box<dyn TokenSource>,
    default_ttl: Duration,
    refresh_margin: Duration,
    cached: RwLock<Option<Credential>>,
}

impl CredentialCache {
    pub fn new(
        source: impl TokenSource + 'static,
        default_ttl: Duration,
        refresh_margin: Duration,
    ) -> Self {
        Self {
            source: Box::new(source),
            default_ttl,
            refresh_margin,
            cached: RwLock::new(None),
        }
    }

    /// Returns the cached credential if fresh, otherwise fetches a new one
    pub async fn get_token(&self) -> Result<Credential, AppError> {
        // Fast path: check if the cached credential is still fresh
        {
            let cache = self.cached.read().await;
            if let Some(cached) = cache.as_ref() {
                if cached.is_fresh(self.refresh_margin) {
                    return Ok(cached.clone());
                }
            }
        }

        // Slow path: refresh the credential
        self.refresh().await
    }

    /// Drops the cached credential if it still holds `token`.
    ///
    /// Used when the upstream rejects a token before its expected expiry.
    /// A credential that was already replaced by a concurrent refresh is
    /// left untouched.
    pub async fn invalidate(&self, token: &str) {
        let mut cache = self.cached.write().await;
        if cache.as_ref().is_some_and(|cached| cached.token() == token) {
            tracing::warn!("[server] invalidating rejected tenant access token");
            *cache = None;
        }
    }

    async fn refresh(&self) -> Result<Credential, AppError> {
        let mut cache = self.cached.write().await;

        // Double-check after acquiring write lock (another task may have refreshed)
        if let Some(cached) = cache.as_ref() {
            if cached.is_fresh(self.refresh_margin) {
                return Ok(cached.clone());
            }
        }

        // Never serve a stale token, even if the refresh below fails
        *cache = None;

        let issued = self.source.fetch_token().await?;
        let ttl = issued.expires_in.unwrap_or(self.default_ttl);
        let credential = Credential::new(issued.token, ttl);

        tracing::debug!("[server] refreshed tenant access token, ttl: {:?}", ttl);

        *cache = Some(credential.clone());

        Ok(credential)
    }
}

//! Core authorization-code flow
//!
//! Framework-free: operations return explicit [`FlowError`] variants and the
//! HTTP router maps them to status codes at a single boundary. The identity
//! provider sits behind a trait so the flow can be exercised with fakes.

use std::time::{SystemTime, UNIX_EPOCH};

use async_trait::async_trait;
use serde::Deserialize;
use thiserror::Error;
use url::form_urlencoded;

use super::redirect;
use crate::config::GoogleOAuthConfig;

/// Gmail read-only scope. Required for OAuth verification.
pub const GMAIL_READONLY_SCOPE: &str = "https://www.googleapis.com/auth/gmail.readonly";

/// Google authorization endpoint
const AUTH_ENDPOINT: &str = "https://accounts.google.com/o/oauth2/v2/auth";

/// Tokens produced by the code exchange.
///
/// Request-scoped: consumed by the profile fetch and dropped. Never
/// serialized into a response.
#[derive(Debug, Clone)]
pub struct TokenPayload {
    /// Access token
    pub access_token: String,
    /// Refresh token, present only when Google grants offline access
    pub refresh_token: Option<String>,
    /// Granted scopes
    pub scope: Option<String>,
    /// Expiry as epoch milliseconds, derived from `expires_in`
    pub expiry_epoch_ms: Option<u64>,
}

impl TokenPayload {
    /// Build a payload from token-endpoint response fields.
    #[must_use]
    pub fn from_parts(
        access_token: String,
        refresh_token: Option<String>,
        scope: Option<String>,
        expires_in: Option<u64>,
    ) -> Self {
        let expiry_epoch_ms = expires_in.map(|secs| {
            let now_ms = SystemTime::now()
                .duration_since(UNIX_EPOCH)
                .unwrap_or_default()
                .as_secs()
                .saturating_mul(1000);
            now_ms.saturating_add(secs.saturating_mul(1000))
        });

        Self {
            access_token,
            refresh_token,
            scope,
            expiry_epoch_ms,
        }
    }
}

/// The caller's Gmail profile, proof that the granted scope works.
#[derive(Debug, Clone)]
pub struct Profile {
    /// Email address of the authenticated user
    pub email_address: String,
}

/// Query parameters Google sends to the callback endpoint.
#[derive(Debug, Default, Deserialize)]
pub struct AuthCallback {
    /// Authorization code
    pub code: Option<String>,
    /// Error code when the user denied or the provider failed
    pub error: Option<String>,
    /// Opaque state passed through from the begin leg
    pub state: Option<String>,
}

/// Failures of the two flow operations, mapped to HTTP at the router.
#[derive(Debug, Error)]
pub enum FlowError {
    /// Client id or secret missing; operator intervention required.
    #[error("Google OAuth not configured")]
    NotConfigured,

    /// Google reported denial or failure on callback.
    #[error("OAuth denied or error: {provider_error}")]
    Denied {
        /// Error string from the provider, passed through verbatim
        provider_error: String,
        /// State echoed back to the caller when present
        state: Option<String>,
    },

    /// Callback arrived without a code and without an error.
    #[error("The authorization code was not returned by Google")]
    MissingCode,

    /// Token exchange or profile fetch failed.
    #[error("Token exchange or Gmail API failed: {0}")]
    Exchange(String),
}

/// Identity provider collaborators of the callback leg.
///
/// The real implementation is [`super::GoogleProvider`]; tests inject
/// counting fakes.
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    /// Exchange an authorization code for tokens.
    async fn exchange_code(&self, code: &str, redirect_uri: &str) -> crate::Result<TokenPayload>;

    /// Fetch the authenticated user's profile.
    async fn fetch_profile(&self, tokens: &TokenPayload) -> crate::Result<Profile>;
}

/// The two-operation OAuth flow for one provider.
pub struct OAuthFlow<'a> {
    config: &'a GoogleOAuthConfig,
    port: u16,
    provider_name: &'a str,
}

impl<'a> OAuthFlow<'a> {
    /// Create a flow over the given configuration.
    ///
    /// `port` feeds the localhost fallback of the redirect-URI resolver.
    #[must_use]
    pub fn new(config: &'a GoogleOAuthConfig, port: u16, provider_name: &'a str) -> Self {
        Self {
            config,
            port,
            provider_name,
        }
    }

    /// Whether the flow is usable.
    #[must_use]
    pub fn is_configured(&self) -> bool {
        self.config.is_configured()
    }

    /// Redirect URI for this provider's callback. Pure and deterministic.
    #[must_use]
    pub fn redirect_uri(&self) -> String {
        redirect::redirect_uri(self.config, self.port, self.provider_name)
    }

    /// Build the authorization URL the caller is redirected to.
    ///
    /// `state` is passed through uninterpreted. `prompt=consent` forces the
    /// consent screen so a refresh token is issued even for returning users.
    /// No network I/O and no server-side state; state correlation is the
    /// caller's responsibility.
    pub fn begin(&self, state: Option<&str>) -> Result<String, FlowError> {
        let Some(client_id) = self.config.client_id.as_deref() else {
            return Err(FlowError::NotConfigured);
        };
        if self.config.client_secret.is_none() {
            return Err(FlowError::NotConfigured);
        }

        let mut query = form_urlencoded::Serializer::new(String::new());
        query.append_pair("response_type", "code");
        query.append_pair("client_id", client_id);
        query.append_pair("redirect_uri", &self.redirect_uri());
        query.append_pair("scope", GMAIL_READONLY_SCOPE);
        query.append_pair("access_type", "offline");
        query.append_pair("prompt", "consent");
        if let Some(state) = state {
            query.append_pair("state", state);
        }

        Ok(format!("{AUTH_ENDPOINT}?{}", query.finish()))
    }

    /// Handle the provider callback: exchange the code, verify the grant by
    /// fetching the profile.
    ///
    /// Branch order is part of the contract: configuration gate, provider
    /// error, missing code, exchange, profile fetch. Earlier branches perform
    /// no network I/O. Exactly one attempt per leg, no retries.
    pub async fn handle_callback(
        &self,
        provider: &dyn IdentityProvider,
        callback: AuthCallback,
    ) -> Result<Profile, FlowError> {
        if !self.is_configured() {
            return Err(FlowError::NotConfigured);
        }

        if let Some(provider_error) = callback.error {
            return Err(FlowError::Denied {
                provider_error,
                state: callback.state,
            });
        }

        let Some(code) = callback.code else {
            return Err(FlowError::MissingCode);
        };

        let redirect_uri = self.redirect_uri();
        let tokens = provider
            .exchange_code(&code, &redirect_uri)
            .await
            .map_err(|e| FlowError::Exchange(e.to_string()))?;

        let profile = provider
            .fetch_profile(&tokens)
            .await
            .map_err(|e| FlowError::Exchange(e.to_string()))?;

        Ok(profile)
    }
}

//! Google identity provider
//!
//! Real [`IdentityProvider`] over reqwest: authorization-code exchange at the
//! Google token endpoint, grant verification against the Gmail profile API.

use std::collections::HashMap;

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use tracing::debug;

use super::flow::{IdentityProvider, Profile, TokenPayload};
use crate::config::GoogleOAuthConfig;
use crate::{Error, Result};

/// Google token endpoint
const TOKEN_ENDPOINT: &str = "https://oauth2.googleapis.com/token";

/// Gmail profile endpoint for the authenticated user
const PROFILE_ENDPOINT: &str = "https://gmail.googleapis.com/gmail/v1/users/me/profile";

/// Google OAuth client, cheap to construct per request.
pub struct GoogleProvider {
    /// HTTP client for token and profile requests
    http_client: Client,
    client_id: String,
    client_secret: String,
}

/// OAuth token response
#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    #[allow(dead_code)]
    token_type: Option<String>,
    expires_in: Option<u64>,
    refresh_token: Option<String>,
    scope: Option<String>,
}

/// Gmail profile response
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GmailProfile {
    email_address: String,
}

impl GoogleProvider {
    /// Create a provider from configuration.
    ///
    /// Returns `None` when the flow is not configured; callers map that to
    /// the not-configured error.
    #[must_use]
    pub fn from_config(config: &GoogleOAuthConfig, http_client: Client) -> Option<Self> {
        let client_id = config.client_id.clone()?;
        let client_secret = config.client_secret.clone()?;

        Some(Self {
            http_client,
            client_id,
            client_secret,
        })
    }
}

#[async_trait]
impl IdentityProvider for GoogleProvider {
    async fn exchange_code(&self, code: &str, redirect_uri: &str) -> Result<TokenPayload> {
        let mut params = HashMap::new();
        params.insert("grant_type", "authorization_code");
        params.insert("code", code);
        params.insert("redirect_uri", redirect_uri);
        params.insert("client_id", self.client_id.as_str());
        params.insert("client_secret", self.client_secret.as_str());

        let response = self
            .http_client
            .post(TOKEN_ENDPOINT)
            .form(&params)
            .send()
            .await
            .map_err(|e| Error::Internal(format!("Token request failed: {e}")))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(Error::Internal(format!(
                "Token exchange failed: HTTP {status} - {body}"
            )));
        }

        let token_response: TokenResponse = response
            .json()
            .await
            .map_err(|e| Error::Internal(format!("Failed to parse token response: {e}")))?;

        debug!(
            has_refresh_token = token_response.refresh_token.is_some(),
            "Authorization code exchanged"
        );

        Ok(TokenPayload::from_parts(
            token_response.access_token,
            token_response.refresh_token,
            token_response.scope,
            token_response.expires_in,
        ))
    }

    async fn fetch_profile(&self, tokens: &TokenPayload) -> Result<Profile> {
        let response = self
            .http_client
            .get(PROFILE_ENDPOINT)
            .bearer_auth(&tokens.access_token)
            .send()
            .await
            .map_err(|e| Error::Internal(format!("Profile request failed: {e}")))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(Error::Internal(format!(
                "Gmail profile fetch failed: HTTP {status} - {body}"
            )));
        }

        let profile: GmailProfile = response
            .json()
            .await
            .map_err(|e| Error::Internal(format!("Failed to parse profile response: {e}")))?;

        Ok(Profile {
            email_address: profile.email_address,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_config_requires_both_credentials() {
        let mut config = GoogleOAuthConfig {
            client_id: Some("id".to_string()),
            client_secret: None,
            base_url: None,
            deploy_domain: None,
        };
        assert!(GoogleProvider::from_config(&config, Client::new()).is_none());

        config.client_secret = Some("secret".to_string());
        assert!(GoogleProvider::from_config(&config, Client::new()).is_some());
    }

    #[test]
    fn token_response_tolerates_missing_optional_fields() {
        let parsed: TokenResponse =
            serde_json::from_str(r#"{"access_token":"tok1"}"#).unwrap();
        assert_eq!(parsed.access_token, "tok1");
        assert!(parsed.refresh_token.is_none());
        assert!(parsed.expires_in.is_none());
    }

    #[test]
    fn gmail_profile_uses_camel_case() {
        let parsed: GmailProfile =
            serde_json::from_str(r#"{"emailAddress":"user@example.com","messagesTotal":42}"#)
                .unwrap();
        assert_eq!(parsed.email_address, "user@example.com");
    }
}

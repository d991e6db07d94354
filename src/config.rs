//! Configuration management

use std::{env, path::Path, time::Duration};

use figment::{
    Figment,
    providers::{Env, Format, Yaml},
};
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::{Error, Result};

/// Main configuration
///
/// Loaded once at startup and shared read-only; nothing mutates it after
/// process start.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct Config {
    /// Environment files to load after the config file is read.
    /// Loaded in order, earlier files win for already-set variables.
    pub env_files: Vec<String>,
    /// Server configuration
    pub server: ServerConfig,
    /// Outbound HTTP client configuration
    pub http: HttpClientConfig,
    /// Google OAuth configuration
    pub google: GoogleOAuthConfig,
    /// Offer synthesis configuration
    pub offers: OffersConfig,
}

/// Server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Host to bind to
    pub host: String,
    /// Port to listen on
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 5000,
        }
    }
}

/// Outbound HTTP client configuration
///
/// One shared `reqwest` client is built from this at startup; the timeout
/// applies to every upstream call (token exchange, profile fetch, LLM).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct HttpClientConfig {
    /// Request timeout for upstream calls
    #[serde(with = "humantime_serde")]
    pub timeout: Duration,
}

impl Default for HttpClientConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(30),
        }
    }
}

/// Google OAuth configuration
///
/// The flow is usable iff both `client_id` and `client_secret` are present.
/// `base_url` and `deploy_domain` feed the redirect-URI resolver chain.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct GoogleOAuthConfig {
    /// OAuth client ID (falls back to `GOOGLE_CLIENT_ID`)
    pub client_id: Option<String>,
    /// OAuth client secret (falls back to `GOOGLE_CLIENT_SECRET`)
    pub client_secret: Option<String>,
    /// Explicit base URL override for the redirect URI (falls back to `BASE_URL`)
    pub base_url: Option<String>,
    /// Deployment-provided hostname, wrapped in https:// when used
    /// (falls back to `DEPLOYMENT_DOMAIN`)
    pub deploy_domain: Option<String>,
}

impl GoogleOAuthConfig {
    /// Whether the OAuth flow is usable
    #[must_use]
    pub fn is_configured(&self) -> bool {
        self.client_id.is_some() && self.client_secret.is_some()
    }
}

/// Offer synthesis configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OffersConfig {
    /// Anthropic API key (falls back to `ANTHROPIC_API_KEY`)
    pub api_key: Option<String>,
    /// Model used for offer synthesis
    pub model: String,
    /// Anthropic API base URL
    pub base_url: String,
    /// Token budget for one synthesis call
    pub max_tokens: u32,
}

impl Default for OffersConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            model: "claude-3-5-haiku-20241022".to_string(),
            base_url: "https://api.anthropic.com".to_string(),
            max_tokens: 2048,
        }
    }
}

impl OffersConfig {
    /// Whether offer synthesis is usable
    #[must_use]
    pub fn is_configured(&self) -> bool {
        self.api_key.is_some()
    }
}

impl Config {
    /// Load configuration from an optional YAML file and the environment.
    ///
    /// Precedence: `CARDHUB_GATEWAY_`-prefixed environment variables over the
    /// config file over built-in defaults. After extraction, any `env_files`
    /// are loaded into the process environment and the conventional
    /// unprefixed variables (`GOOGLE_CLIENT_ID`, `GOOGLE_CLIENT_SECRET`,
    /// `BASE_URL`, `DEPLOYMENT_DOMAIN`, `ANTHROPIC_API_KEY`) fill any
    /// still-unset fields.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut figment = Figment::new();

        // Load from file if provided
        if let Some(p) = path {
            if !p.exists() {
                return Err(Error::Config(format!(
                    "Config file not found: {}",
                    p.display()
                )));
            }
            figment = figment.merge(Yaml::file(p));
        }

        // Merge environment variables (CARDHUB_GATEWAY_ prefix)
        figment = figment.merge(Env::prefixed("CARDHUB_GATEWAY_").split("__"));

        let mut config: Self = figment
            .extract()
            .map_err(|e| Error::Config(e.to_string()))?;

        // Load env files into process environment (before fallback resolution)
        config.load_env_files();

        config.apply_env_fallbacks();

        Ok(config)
    }

    /// Load configured dotenv files into the process environment.
    fn load_env_files(&self) {
        for file in &self.env_files {
            if let Err(e) = dotenvy::from_path(file) {
                warn!(file = %file, error = %e, "Failed to load env file");
            }
        }
    }

    /// Fill unset fields from the conventional unprefixed environment variables.
    fn apply_env_fallbacks(&mut self) {
        if self.google.client_id.is_none() {
            self.google.client_id = env_non_empty("GOOGLE_CLIENT_ID");
        }
        if self.google.client_secret.is_none() {
            self.google.client_secret = env_non_empty("GOOGLE_CLIENT_SECRET");
        }
        if self.google.base_url.is_none() {
            self.google.base_url = env_non_empty("BASE_URL");
        }
        if self.google.deploy_domain.is_none() {
            self.google.deploy_domain = env_non_empty("DEPLOYMENT_DOMAIN");
        }
        if self.offers.api_key.is_none() {
            self.offers.api_key = env_non_empty("ANTHROPIC_API_KEY");
        }
    }
}

/// Read an environment variable, treating empty values as absent.
fn env_non_empty(key: &str) -> Option<String> {
    env::var(key).ok().filter(|v| !v.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.server.host, "0.0.0.0");
        assert_eq!(config.server.port, 5000);
        assert_eq!(config.http.timeout, Duration::from_secs(30));
        assert_eq!(config.offers.base_url, "https://api.anthropic.com");
        assert!(config.env_files.is_empty());
    }

    #[test]
    fn oauth_configured_requires_both_credentials() {
        let mut google = GoogleOAuthConfig::default();
        assert!(!google.is_configured());

        google.client_id = Some("id".to_string());
        assert!(!google.is_configured());

        google.client_secret = Some("secret".to_string());
        assert!(google.is_configured());

        google.client_id = None;
        assert!(!google.is_configured());
    }

    #[test]
    fn offers_configured_requires_api_key() {
        let mut offers = OffersConfig::default();
        assert!(!offers.is_configured());

        offers.api_key = Some("sk-test".to_string());
        assert!(offers.is_configured());
    }

    #[test]
    fn missing_config_file_is_an_error() {
        let result = Config::load(Some(Path::new("/nonexistent/gateway.yaml")));
        assert!(matches!(result, Err(Error::Config(_))));
    }
}

//! Redirect URI derivation
//!
//! The base URL resolves through an ordered chain of resolvers, first
//! present value wins:
//!
//! 1. explicit override from configuration (trailing slash stripped)
//! 2. deployment-provided hostname, wrapped in `https://`
//! 3. `http://localhost:<port>`
//!
//! The derived redirect URI must match what is registered with Google out
//! of band; the gateway does not negotiate it.

use crate::config::GoogleOAuthConfig;

/// Resolve the public base URL of this gateway.
#[must_use]
pub fn resolve_base_url(config: &GoogleOAuthConfig, port: u16) -> String {
    let resolvers: [fn(&GoogleOAuthConfig) -> Option<String>; 2] =
        [explicit_override, deploy_domain];

    resolvers
        .iter()
        .find_map(|resolve| resolve(config))
        .unwrap_or_else(|| format!("http://localhost:{port}"))
}

/// Redirect URI for the OAuth callback of `provider`.
#[must_use]
pub fn redirect_uri(config: &GoogleOAuthConfig, port: u16, provider: &str) -> String {
    format!(
        "{}/api/auth/{provider}/callback",
        resolve_base_url(config, port)
    )
}

fn explicit_override(config: &GoogleOAuthConfig) -> Option<String> {
    config
        .base_url
        .as_deref()
        .map(|url| url.trim_end_matches('/').to_string())
}

fn deploy_domain(config: &GoogleOAuthConfig) -> Option<String> {
    config
        .deploy_domain
        .as_deref()
        .map(|domain| format!("https://{domain}"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn config(base_url: Option<&str>, deploy_domain: Option<&str>) -> GoogleOAuthConfig {
        GoogleOAuthConfig {
            client_id: Some("id".to_string()),
            client_secret: Some("secret".to_string()),
            base_url: base_url.map(String::from),
            deploy_domain: deploy_domain.map(String::from),
        }
    }

    #[test]
    fn explicit_override_wins_over_deploy_domain() {
        let cfg = config(Some("https://api.cardhub.app"), Some("preview.cardhub.app"));
        assert_eq!(resolve_base_url(&cfg, 5000), "https://api.cardhub.app");
    }

    #[test]
    fn explicit_override_strips_trailing_slash() {
        let cfg = config(Some("https://api.cardhub.app/"), None);
        assert_eq!(resolve_base_url(&cfg, 5000), "https://api.cardhub.app");
    }

    #[test]
    fn deploy_domain_is_wrapped_in_https() {
        let cfg = config(None, Some("preview.cardhub.app"));
        assert_eq!(resolve_base_url(&cfg, 5000), "https://preview.cardhub.app");
    }

    #[test]
    fn falls_back_to_localhost_with_port() {
        let cfg = config(None, None);
        assert_eq!(resolve_base_url(&cfg, 5000), "http://localhost:5000");
        assert_eq!(resolve_base_url(&cfg, 8080), "http://localhost:8080");
    }

    #[test]
    fn redirect_uri_appends_callback_path() {
        let cfg = config(Some("https://api.cardhub.app"), None);
        assert_eq!(
            redirect_uri(&cfg, 5000, "google"),
            "https://api.cardhub.app/api/auth/google/callback"
        );
    }

    #[test]
    fn redirect_uri_is_deterministic() {
        let cfg = config(None, Some("preview.cardhub.app"));
        assert_eq!(
            redirect_uri(&cfg, 5000, "google"),
            redirect_uri(&cfg, 5000, "google")
        );
    }
}

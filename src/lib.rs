//! CardHub Gateway Library
//!
//! Backend gateway for the CardHub mobile client.
//!
//! # Features
//!
//! - **Google OAuth verification**: three-legged authorization-code flow for
//!   the `gmail.readonly` scope, verified by fetching the Gmail profile.
//!   No credential persistence.
//! - **Offer synthesis**: proxies a single LLM call that produces card offer
//!   data for a bank/card pair.
//! - **Stateless**: every request runs to completion on its own; the only
//!   shared state is the read-only process configuration.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod cli;
pub mod config;
pub mod error;
pub mod gateway;
pub mod oauth;
pub mod offers;

pub use error::{Error, Result};

use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

/// Setup tracing/logging
pub fn setup_tracing(level: &str, format: Option<&str>) -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    let subscriber = tracing_subscriber::registry().with(filter);

    match format {
        Some("json") => {
            subscriber.with(fmt::layer().json()).init();
        }
        _ => {
            subscriber.with(fmt::layer()).init();
        }
    }

    Ok(())
}

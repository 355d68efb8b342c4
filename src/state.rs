//! Application state management
//!
//! This module defines the AppState structure that holds:
//! - Server configuration, and the rewrite/guard settings derived from it
//! - The upstream HTTP client
//! - The session service client
//! - Metrics

use academy_gate_lib::{GuardRoutes, RewriteOptions};

use crate::config::ServerConfig;
use crate::error::{RedirectRefused, Result};
use crate::metrics::Metrics;
use crate::session::SessionClient;

const MAX_REDIRECTS: usize = 10;

/// Application state shared across all handlers
pub struct AppState {
    /// Server configuration
    pub config: ServerConfig,

    /// Playlist rewrite settings
    pub rewrite_options: RewriteOptions,

    /// Guard redirect targets
    pub guard_routes: GuardRoutes,

    /// Client for CDN fetches. Redirects are only followed to allowed hosts.
    pub http_client: reqwest::Client,

    /// Session service client
    pub session: SessionClient,

    /// Request and decision counters
    pub metrics: Metrics,
}

impl AppState {
    /// Create a new AppState with the given configuration
    pub fn new(config: ServerConfig) -> Result<Self> {
        let proxy = config.proxy.clone();
        let http_client = client_builder(&config)
            .redirect(reqwest::redirect::Policy::custom(move |attempt| {
                if attempt.previous().len() >= MAX_REDIRECTS {
                    return attempt.error("too many redirects");
                }
                let host = attempt.url().host_str().unwrap_or_default().to_string();
                if proxy.host_allowed(&host) {
                    attempt.follow()
                } else {
                    attempt.error(RedirectRefused(host))
                }
            }))
            .build()?;

        // The session service is trusted configuration, not a proxy target.
        let session_client = client_builder(&config)
            .redirect(reqwest::redirect::Policy::limited(MAX_REDIRECTS))
            .build()?;
        let session = SessionClient::new(
            config.guard.session_url.clone(),
            session_client,
            config.proxy.upstream_timeout(),
        );

        Ok(Self {
            rewrite_options: config.rewrite_options(),
            guard_routes: config.guard_routes(),
            http_client,
            session,
            metrics: Metrics::new(),
            config,
        })
    }

    /// Create AppState with default configuration
    #[cfg(test)]
    pub fn with_defaults() -> Result<Self> {
        Self::new(ServerConfig::default())
    }
}

fn client_builder(config: &ServerConfig) -> reqwest::ClientBuilder {
    let timeout = config.proxy.upstream_timeout();
    let mut builder = reqwest::Client::builder()
        .connect_timeout(timeout)
        .read_timeout(timeout);
    if let Some(user_agent) = &config.proxy.user_agent {
        builder = builder.user_agent(user_agent.clone());
    }
    builder
}

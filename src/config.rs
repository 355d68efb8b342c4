//! Server configuration

use academy_gate_lib::{GuardRoutes, RewriteOptions};
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::error::{Result, ServerError};

/// Video proxy configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProxyConfig {
    /// Route path of the proxy; rewritten playlists point here
    pub endpoint: String,

    /// Route references through the proxy. When false, playlists are
    /// only made absolute so players fetch straight from the CDN.
    pub enabled: bool,

    /// Connect and read timeout for upstream requests in seconds
    pub upstream_timeout_secs: u64,

    /// User-Agent sent upstream
    pub user_agent: Option<String>,

    /// Extensions that mark a playlist line as a media reference
    pub media_extensions: Vec<String>,

    /// Hosts the proxy may fetch from. Empty allows any host.
    /// A leading `*.` matches any subdomain.
    pub allowed_hosts: Vec<String>,
}

impl Default for ProxyConfig {
    fn default() -> Self {
        Self {
            endpoint: "/api/video-proxy".to_string(),
            enabled: true,
            upstream_timeout_secs: 30,
            user_agent: None,
            media_extensions: vec!["m3u8".to_string(), "ts".to_string()],
            allowed_hosts: Vec::new(),
        }
    }
}

impl ProxyConfig {
    pub fn upstream_timeout(&self) -> Duration {
        Duration::from_secs(self.upstream_timeout_secs)
    }

    /// Check an upstream host against `allowed_hosts`
    pub fn host_allowed(&self, host: &str) -> bool {
        if self.allowed_hosts.is_empty() {
            return true;
        }
        let host = host.to_ascii_lowercase();
        self.allowed_hosts.iter().any(|allowed| {
            let allowed = allowed.to_ascii_lowercase();
            match allowed.strip_prefix("*.") {
                Some(domain) => host
                    .strip_suffix(domain)
                    .is_some_and(|sub| sub.ends_with('.')),
                None => host == allowed,
            }
        })
    }
}

/// Page guard configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GuardConfig {
    /// Session service URL returning the signed-in user. Without it every
    /// guard request is treated as signed out.
    pub session_url: Option<String>,

    /// Redirect for callers without a session
    pub sign_in_path: String,

    /// Redirect for signed-in users lacking the module
    pub upgrade_path: String,
}

impl Default for GuardConfig {
    fn default() -> Self {
        Self {
            session_url: None,
            sign_in_path: "/login".to_string(),
            upgrade_path: "/plans".to_string(),
        }
    }
}

/// Paths routed by the server itself; the proxy endpoint may not reuse them.
const RESERVED_PATHS: [&str; 3] = ["/health", "/version", "/metrics"];

/// Server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Host address to bind to
    pub host: String,

    /// Port to listen on
    pub port: u16,

    /// Enable CORS
    pub cors_enabled: bool,

    /// Log level (trace, debug, info, warn, error)
    pub log_level: String,

    /// Log output format (pretty, json)
    pub log_format: String,

    /// Video proxy configuration
    pub proxy: ProxyConfig,

    /// Page guard configuration
    pub guard: GuardConfig,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 3000,
            cors_enabled: true,
            log_level: "info".to_string(),
            log_format: "pretty".to_string(),
            proxy: ProxyConfig::default(),
            guard: GuardConfig::default(),
        }
    }
}

impl ServerConfig {
    /// Get the socket address string
    pub fn socket_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Options handed to the playlist rewriter
    pub fn rewrite_options(&self) -> RewriteOptions {
        RewriteOptions {
            proxy_endpoint: self.proxy.endpoint.clone(),
            proxy_enabled: self.proxy.enabled,
            media_extensions: self.proxy.media_extensions.clone(),
        }
    }

    /// Redirect targets handed to the page guard
    pub fn guard_routes(&self) -> GuardRoutes {
        GuardRoutes {
            sign_in: self.guard.sign_in_path.clone(),
            upgrade: self.guard.upgrade_path.clone(),
        }
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        let endpoint = &self.proxy.endpoint;
        if !endpoint.starts_with('/') {
            return Err(ServerError::Config(format!(
                "proxy endpoint must be a path starting with '/': {}",
                endpoint
            )));
        }
        if endpoint.contains(['?', '#', '{', '}']) {
            return Err(ServerError::Config(format!(
                "proxy endpoint must be a plain path: {}",
                endpoint
            )));
        }
        if RESERVED_PATHS.contains(&endpoint.as_str()) || endpoint.starts_with("/api/access/") {
            return Err(ServerError::Config(format!(
                "proxy endpoint collides with a built-in route: {}",
                endpoint
            )));
        }
        if self.proxy.media_extensions.is_empty() {
            return Err(ServerError::Config(
                "proxy media_extensions must not be empty".to_string(),
            ));
        }
        if let Some(url) = &self.guard.session_url {
            if !url.starts_with("http://") && !url.starts_with("https://") {
                return Err(ServerError::Config(format!(
                    "session_url must start with http:// or https://: {}",
                    url
                )));
            }
        }
        for path in [&self.guard.sign_in_path, &self.guard.upgrade_path] {
            if !path.starts_with('/') {
                return Err(ServerError::Config(format!(
                    "guard redirect must be a path starting with '/': {}",
                    path
                )));
            }
        }
        match self.log_format.as_str() {
            "pretty" | "json" => Ok(()),
            other => Err(ServerError::Config(format!("unknown log format: {}", other))),
        }
    }
}

//! Configuration file support
//!
//! Loads server configuration from TOML files.

use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::config::{GuardConfig, ProxyConfig, ServerConfig};

/// Configuration file format
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConfigFile {
    /// Server settings
    pub server: ServerSettings,
    /// Video proxy settings
    pub proxy: Option<ProxySettings>,
    /// Page guard settings
    pub guard: Option<GuardSettings>,
    /// Logging settings
    pub logging: Option<LoggingSettings>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerSettings {
    /// Host address to bind to
    pub host: String,
    /// Port to listen on
    pub port: u16,
    /// Enable CORS
    pub cors_enabled: Option<bool>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProxySettings {
    /// Route path of the proxy
    pub endpoint: Option<String>,
    /// Route playlist references through the proxy
    pub enabled: Option<bool>,
    /// Upstream connect timeout in seconds
    pub upstream_timeout_secs: Option<u64>,
    /// User-Agent sent upstream
    pub user_agent: Option<String>,
    /// Media reference extensions
    pub media_extensions: Option<Vec<String>>,
    /// Hosts the proxy may fetch from
    pub allowed_hosts: Option<Vec<String>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GuardSettings {
    /// Session service URL
    pub session_url: Option<String>,
    /// Redirect for callers without a session
    pub sign_in_path: Option<String>,
    /// Redirect for users lacking access
    pub upgrade_path: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingSettings {
    /// Log level (trace, debug, info, warn, error)
    pub level: String,
    /// Output format (json, pretty)
    pub format: Option<String>,
}

impl ConfigFile {
    /// Load configuration from a TOML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, Box<dyn std::error::Error>> {
        let content = std::fs::read_to_string(path.as_ref())?;
        let config: ConfigFile = toml::from_str(&content)?;
        Ok(config)
    }

    /// Save configuration to a TOML file
    pub fn to_file<P: AsRef<Path>>(&self, path: P) -> Result<(), Box<dyn std::error::Error>> {
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path.as_ref(), content)?;
        Ok(())
    }

    /// Generate default configuration file
    pub fn default_config() -> Self {
        let proxy = ProxyConfig::default();
        let guard = GuardConfig::default();
        Self {
            server: ServerSettings {
                host: "0.0.0.0".to_string(),
                port: 3000,
                cors_enabled: Some(true),
            },
            proxy: Some(ProxySettings {
                endpoint: Some(proxy.endpoint),
                enabled: Some(proxy.enabled),
                upstream_timeout_secs: Some(proxy.upstream_timeout_secs),
                user_agent: None,
                media_extensions: Some(proxy.media_extensions),
                allowed_hosts: Some(proxy.allowed_hosts),
            }),
            guard: Some(GuardSettings {
                session_url: None,
                sign_in_path: Some(guard.sign_in_path),
                upgrade_path: Some(guard.upgrade_path),
            }),
            logging: Some(LoggingSettings {
                level: "info".to_string(),
                format: Some("pretty".to_string()),
            }),
        }
    }

    /// Convert to ServerConfig
    pub fn into_server_config(self) -> ServerConfig {
        let defaults = ServerConfig::default();

        let proxy = match self.proxy {
            Some(p) => ProxyConfig {
                endpoint: p.endpoint.unwrap_or(defaults.proxy.endpoint),
                enabled: p.enabled.unwrap_or(defaults.proxy.enabled),
                upstream_timeout_secs: p
                    .upstream_timeout_secs
                    .unwrap_or(defaults.proxy.upstream_timeout_secs),
                user_agent: p.user_agent,
                media_extensions: p
                    .media_extensions
                    .unwrap_or(defaults.proxy.media_extensions),
                allowed_hosts: p.allowed_hosts.unwrap_or_default(),
            },
            None => defaults.proxy,
        };

        let guard = match self.guard {
            Some(g) => GuardConfig {
                session_url: g.session_url,
                sign_in_path: g.sign_in_path.unwrap_or(defaults.guard.sign_in_path),
                upgrade_path: g.upgrade_path.unwrap_or(defaults.guard.upgrade_path),
            },
            None => defaults.guard,
        };

        let (log_level, log_format) = match self.logging {
            Some(l) => (l.level, l.format.unwrap_or(defaults.log_format)),
            None => (defaults.log_level, defaults.log_format),
        };

        ServerConfig {
            host: self.server.host,
            port: self.server.port,
            cors_enabled: self.server.cors_enabled.unwrap_or(true),
            log_level,
            log_format,
            proxy,
            guard,
        }
    }
}

/// Generate default configuration file at the specified path
pub fn generate_default_config<P: AsRef<Path>>(path: P) -> Result<(), Box<dyn std::error::Error>> {
    let config = ConfigFile::default_config();
    config.to_file(path)?;
    Ok(())
}

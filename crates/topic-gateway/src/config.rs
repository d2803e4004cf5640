// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Gateway configuration.
//!
//! Loaded once at startup from a TOML file and handed to the gateway
//! explicitly; nothing reads it ambiently afterwards.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// Gateway configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GatewayConfig {
    /// Log level (trace, debug, info, warn, error) or an env-filter directive.
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Environment used when a request carries no `environment` header.
    #[serde(default)]
    pub default_environment: Option<String>,

    #[serde(default)]
    pub server: ServerConfig,

    #[serde(default)]
    pub peek: PeekConfig,

    #[serde(default)]
    pub tls: TlsConfig,

    #[serde(default)]
    pub auth: AuthConfig,

    #[serde(default)]
    pub broker: BrokerConfig,

    /// Broker environments requests can target.
    #[serde(default)]
    pub environments: Vec<EnvironmentConfig>,
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_true() -> bool {
    true
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            default_environment: None,
            server: ServerConfig::default(),
            peek: PeekConfig::default(),
            tls: TlsConfig::default(),
            auth: AuthConfig::default(),
            broker: BrokerConfig::default(),
            environments: Vec::new(),
        }
    }
}

impl GatewayConfig {
    /// Load and validate configuration from a TOML file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml(&content)
    }

    /// Parse and validate configuration from TOML text.
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Single-environment configuration pointing at a local standalone broker.
    pub fn example() -> Self {
        Self {
            default_environment: Some("standalone".into()),
            environments: vec![EnvironmentConfig::new(
                "standalone",
                "http://127.0.0.1:8080",
            )],
            ..Default::default()
        }
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.environments.is_empty() {
            return Err(ConfigError::Invalid("No environments configured".into()));
        }

        let mut names = HashSet::new();
        for (i, env) in self.environments.iter().enumerate() {
            if env.name.is_empty() {
                return Err(ConfigError::Invalid(format!(
                    "Environment {} has an empty name",
                    i
                )));
            }
            if !names.insert(env.name.as_str()) {
                return Err(ConfigError::Invalid(format!(
                    "Environment '{}' is defined more than once",
                    env.name
                )));
            }
            match reqwest::Url::parse(&env.service_url) {
                Ok(url) if matches!(url.scheme(), "http" | "https") => {}
                Ok(url) => {
                    return Err(ConfigError::Invalid(format!(
                        "Environment '{}' has unsupported service URL scheme '{}'",
                        env.name,
                        url.scheme()
                    )))
                }
                Err(e) => {
                    return Err(ConfigError::Invalid(format!(
                        "Environment '{}' has invalid service URL: {}",
                        env.name, e
                    )))
                }
            }
        }

        if let Some(default) = &self.default_environment {
            if !names.contains(default.as_str()) {
                return Err(ConfigError::Invalid(format!(
                    "Default environment '{}' is not configured",
                    default
                )));
            }
        }

        if self.tls.enabled && self.tls.trust_certs_path.is_none() {
            return Err(ConfigError::Invalid(
                "TLS is enabled but tls.trust_certs_path is not set".into(),
            ));
        }

        if self.broker.connect_timeout_secs == 0 || self.broker.request_timeout_secs == 0 {
            return Err(ConfigError::Invalid(
                "Broker timeouts must be greater than zero".into(),
            ));
        }

        let base = &self.server.base_path;
        if !base.is_empty() && (!base.starts_with('/') || base.ends_with('/')) {
            return Err(ConfigError::Invalid(format!(
                "server.base_path '{}' must start with '/' and not end with '/'",
                base
            )));
        }

        Ok(())
    }
}

/// HTTP listener settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Bind address
    #[serde(default = "default_bind")]
    pub bind: String,

    /// HTTP port
    #[serde(default = "default_port")]
    pub port: u16,

    /// Prefix of the topic and peek routes.
    #[serde(default = "default_base_path")]
    pub base_path: String,
}

fn default_bind() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    7750
}

fn default_base_path() -> String {
    "/pulsar-manager/admin/v2".to_string()
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: default_bind(),
            port: default_port(),
            base_path: default_base_path(),
        }
    }
}

/// Message peek feature switch.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PeekConfig {
    #[serde(default)]
    pub enabled: bool,
}

/// TLS settings for broker admin connections.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TlsConfig {
    #[serde(default)]
    pub enabled: bool,

    /// CA bundle (PEM) used to verify the broker.
    #[serde(default)]
    pub trust_certs_path: Option<PathBuf>,

    #[serde(default = "default_true")]
    pub hostname_verification: bool,
}

impl Default for TlsConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            trust_certs_path: None,
            hostname_verification: true,
        }
    }
}

/// Broker authentication.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AuthConfig {
    /// Bearer token sent to the broker, ignored when empty.
    #[serde(default)]
    pub token: Option<String>,
}

impl AuthConfig {
    pub fn token(&self) -> Option<&str> {
        self.token.as_deref().filter(|t| !t.is_empty())
    }
}

/// Broker client timeouts.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BrokerConfig {
    #[serde(default = "default_connect_timeout")]
    pub connect_timeout_secs: u64,

    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,
}

fn default_connect_timeout() -> u64 {
    5
}

fn default_request_timeout() -> u64 {
    30
}

impl Default for BrokerConfig {
    fn default() -> Self {
        Self {
            connect_timeout_secs: default_connect_timeout(),
            request_timeout_secs: default_request_timeout(),
        }
    }
}

impl BrokerConfig {
    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_secs)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

/// A named broker environment.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EnvironmentConfig {
    pub name: String,

    /// Base URL of the broker's admin REST API.
    pub service_url: String,
}

impl EnvironmentConfig {
    pub fn new(name: impl Into<String>, service_url: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            service_url: service_url.into(),
        }
    }
}

// Copyright (c) 2026 Flynn Controller gRPC Contributors
// SPDX-License-Identifier: BSD-3-Clause

// Gateway Configuration
//
// Defines the configuration for a gateway process:
// - Controller API location and credentials
// - Listener address
// - CORS preflight cache lifetime
//
// Values come from an optional YAML file and are then overridden by the
// environment (CONTROLLER_DOMAIN, CONTROLLER_AUTH_KEY, PORT).

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const CONFIG_PATH_ENV: &str = "CONTROLLER_GRPC_CONFIG_PATH";
pub const CONTROLLER_DOMAIN_ENV: &str = "CONTROLLER_DOMAIN";
pub const CONTROLLER_AUTH_KEY_ENV: &str = "CONTROLLER_AUTH_KEY";
pub const PORT_ENV: &str = "PORT";

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GatewayConfig {
    #[serde(default)]
    pub controller: ControllerConfig,

    #[serde(default)]
    pub server: ServerConfig,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ControllerConfig {
    /// Base URL of the controller API, e.g. `http://controller.example.com`
    #[serde(default)]
    pub url: String,

    /// Controller auth key, sent as the basic-auth password
    #[serde(default)]
    pub auth_key: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,

    /// How long browsers may cache a CORS preflight response
    #[serde(default = "default_cors_max_age_secs")]
    pub cors_max_age_secs: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            cors_max_age_secs: default_cors_max_age_secs(),
        }
    }
}

impl ServerConfig {
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    pub fn cors_max_age(&self) -> Duration {
        Duration::from_secs(self.cors_max_age_secs)
    }
}

impl GatewayConfig {
    /// Load configuration from YAML file
    pub fn from_yaml_file(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_yaml_str(&content)
    }

    /// Parse configuration from YAML string
    pub fn from_yaml_str(yaml: &str) -> anyhow::Result<Self> {
        let config = serde_yaml::from_str(yaml)?;
        Ok(config)
    }

    /// Discover configuration file using precedence order
    /// 1. CONTROLLER_GRPC_CONFIG_PATH environment variable
    /// 2. ./controller-grpc.yaml (working directory)
    pub fn discover_config() -> Option<PathBuf> {
        if let Ok(path) = std::env::var(CONFIG_PATH_ENV) {
            let path = PathBuf::from(path);
            if path.exists() {
                return Some(path);
            }
        }

        let cwd = PathBuf::from("./controller-grpc.yaml");
        if cwd.exists() {
            return Some(cwd);
        }

        None
    }

    /// Load configuration with discovery, fallback to default
    pub fn load_or_default(cli_path: Option<PathBuf>) -> anyhow::Result<Self> {
        // Explicit path must exist and parse
        let mut config = if let Some(path) = cli_path {
            tracing::info!("Loading configuration from explicit path: {:?}", path);
            Self::from_yaml_file(&path).map_err(|e| {
                anyhow::anyhow!("Failed to load config at {:?}: {}", path, e)
            })?
        } else if let Some(path) = Self::discover_config() {
            tracing::info!("Loading configuration from discovered path: {:?}", path);
            Self::from_yaml_file(path)?
        } else {
            tracing::debug!("No configuration file found, using environment only");
            Self::default()
        };

        config.apply_env_overrides(|key| std::env::var(key).ok());
        Ok(config)
    }

    /// Apply environment overrides using `lookup` to read variables
    pub fn apply_env_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(domain) = lookup(CONTROLLER_DOMAIN_ENV).filter(|v| !v.is_empty()) {
            self.controller.url = if domain.contains("://") {
                domain
            } else {
                format!("http://{}", domain)
            };
        }

        if let Some(key) = lookup(CONTROLLER_AUTH_KEY_ENV).filter(|v| !v.is_empty()) {
            self.controller.auth_key = key;
        }

        if let Some(port) = lookup(PORT_ENV).filter(|v| !v.is_empty()) {
            match port.parse() {
                Ok(port) => self.server.port = port,
                Err(_) => tracing::warn!(
                    "Invalid value for {}: '{}'. Expected a port number. Ignoring.",
                    PORT_ENV,
                    port
                ),
            }
        }
    }

    /// Validate configuration
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.controller.url.is_empty() {
            anyhow::bail!(
                "controller.url is required (set {} or the config file)",
                CONTROLLER_DOMAIN_ENV
            );
        }

        if !self.controller.url.starts_with("http://") && !self.controller.url.starts_with("https://")
        {
            anyhow::bail!(
                "controller.url must be an http(s) URL, got '{}'",
                self.controller.url
            );
        }

        if self.controller.auth_key.is_empty() {
            anyhow::bail!(
                "controller.auth_key is required (set {} or the config file)",
                CONTROLLER_AUTH_KEY_ENV
            );
        }

        Ok(())
    }
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    3000
}

fn default_cors_max_age_secs() -> u64 {
    3600
}

//! Configuration for the Roblox login demo.
//!
//! Values are read from an optional TOML file (`roblox-login.toml`, or the
//! path in `ROBLOX_LOGIN_CONFIG_FILE`) and then from environment variables
//! with the `ROBLOX` prefix, e.g. `ROBLOX__OAUTH__CLIENT_ID` or
//! `ROBLOX__SERVER__PORT`. Environment variables win over the file.

use anyhow::{Context, Result};
use config::{Config as ConfigBuilder, Environment, File};
use ras_identity_roblox::RobloxConfig;
use serde::Deserialize;
use std::net::IpAddr;
use tracing::{debug, info};

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,

    /// Roblox OAuth2 application settings
    pub oauth: RobloxConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: IpAddr,
    pub port: u16,
    /// Mark cookies `Secure`; enable when served over HTTPS
    pub secure_cookies: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: IpAddr::from([127, 0, 0, 1]),
            port: 3000,
            secure_cookies: false,
        }
    }
}

impl Config {
    pub fn load() -> Result<Self> {
        let mut builder = ConfigBuilder::builder();

        let config_path = std::env::var("ROBLOX_LOGIN_CONFIG_FILE")
            .unwrap_or_else(|_| "roblox-login.toml".to_string());
        if std::path::Path::new(&config_path).exists() {
            info!("Loading configuration from {}", config_path);
            builder = builder.add_source(File::with_name(&config_path));
        } else {
            debug!("No config file found at {}, using environment only", config_path);
        }

        // ROBLOX__OAUTH__CLIENT_ID -> oauth.client_id
        builder = builder.add_source(Environment::with_prefix("ROBLOX").separator("__"));

        let settings: Config = builder
            .build()
            .context("Failed to build configuration")?
            .try_deserialize()
            .context("Failed to deserialize configuration")?;

        settings.validate()?;
        Ok(settings)
    }

    pub fn validate(&self) -> Result<()> {
        if self.server.port == 0 {
            anyhow::bail!("Server port cannot be 0");
        }

        self.oauth
            .validate()
            .context("Invalid Roblox OAuth2 configuration")?;

        if self.oauth.state_ttl_seconds == 0 {
            anyhow::bail!("State cookie TTL must be positive");
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(port: u16, client_id: &str) -> Config {
        Config {
            server: ServerConfig {
                port,
                ..ServerConfig::default()
            },
            oauth: RobloxConfig::new(client_id, "secret", "http://localhost:3000/auth/roblox/callback"),
        }
    }

    #[test]
    fn test_valid_config() {
        assert!(config(3000, "cid").validate().is_ok());
    }

    #[test]
    fn test_invalid_config() {
        assert!(config(0, "cid").validate().is_err());
        assert!(config(3000, "").validate().is_err());

        let mut no_ttl = config(3000, "cid");
        no_ttl.oauth.state_ttl_seconds = 0;
        assert!(no_ttl.validate().is_err());
    }

    #[test]
    fn test_deserialize_from_toml() {
        let settings: Config = ConfigBuilder::builder()
            .add_source(config::File::from_str(
                r#"
                [server]
                port = 8080

                [oauth]
                client_id = "cid"
                client_secret = "secret"
                callback_url = "http://localhost:8080/auth/roblox/callback"
                scopes = ["openid", "profile"]
                "#,
                config::FileFormat::Toml,
            ))
            .build()
            .unwrap()
            .try_deserialize()
            .unwrap();

        assert_eq!(settings.server.port, 8080);
        assert!(!settings.server.secure_cookies);
        assert_eq!(settings.oauth.scopes(), vec!["openid", "profile"]);
        assert_eq!(settings.oauth.state_ttl_seconds, 600);
        assert!(settings.validate().is_ok());
    }
}

//! Roblox driver configuration.

use crate::error::{OAuth2Error, OAuth2Result};
use serde::{Deserialize, Serialize};

pub const DEFAULT_AUTHORIZE_URL: &str = "https://apis.roblox.com/oauth/v1/authorize";
pub const DEFAULT_ACCESS_TOKEN_URL: &str = "https://apis.roblox.com/oauth/v1/token";
pub const DEFAULT_USER_INFO_URL: &str = "https://apis.roblox.com/oauth/v1/userinfo";

/// Scopes sent when neither the caller nor the configuration name any.
pub const DEFAULT_SCOPES: &[&str] = &["openid"];

/// Configuration accepted by the Roblox driver.
///
/// Endpoint overrides are optional; when absent the public Roblox endpoints
/// are used.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RobloxConfig {
    pub client_id: String,
    pub client_secret: String,
    pub callback_url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub authorize_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub access_token_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_info_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scopes: Option<Vec<String>>,
    /// Lifetime of the state cookie.
    #[serde(default = "default_state_ttl")]
    pub state_ttl_seconds: u64,
}

fn default_state_ttl() -> u64 {
    600
}

impl RobloxConfig {
    pub fn new(
        client_id: impl Into<String>,
        client_secret: impl Into<String>,
        callback_url: impl Into<String>,
    ) -> Self {
        Self {
            client_id: client_id.into(),
            client_secret: client_secret.into(),
            callback_url: callback_url.into(),
            authorize_url: None,
            access_token_url: None,
            user_info_url: None,
            scopes: None,
            state_ttl_seconds: default_state_ttl(),
        }
    }

    pub fn with_authorize_url(mut self, url: impl Into<String>) -> Self {
        self.authorize_url = Some(url.into());
        self
    }

    pub fn with_access_token_url(mut self, url: impl Into<String>) -> Self {
        self.access_token_url = Some(url.into());
        self
    }

    pub fn with_user_info_url(mut self, url: impl Into<String>) -> Self {
        self.user_info_url = Some(url.into());
        self
    }

    pub fn with_scopes<I, S>(mut self, scopes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.scopes = Some(scopes.into_iter().map(Into::into).collect());
        self
    }

    pub fn with_state_ttl(mut self, seconds: u64) -> Self {
        self.state_ttl_seconds = seconds;
        self
    }

    pub fn authorize_url(&self) -> &str {
        self.authorize_url.as_deref().unwrap_or(DEFAULT_AUTHORIZE_URL)
    }

    pub fn access_token_url(&self) -> &str {
        self.access_token_url
            .as_deref()
            .unwrap_or(DEFAULT_ACCESS_TOKEN_URL)
    }

    pub fn user_info_url(&self) -> &str {
        self.user_info_url.as_deref().unwrap_or(DEFAULT_USER_INFO_URL)
    }

    /// Configured scopes, falling back to [`DEFAULT_SCOPES`].
    pub fn scopes(&self) -> Vec<String> {
        match &self.scopes {
            Some(scopes) if !scopes.is_empty() => scopes.clone(),
            _ => DEFAULT_SCOPES.iter().map(|s| s.to_string()).collect(),
        }
    }

    pub fn validate(&self) -> OAuth2Result<()> {
        let required = [
            ("client_id", &self.client_id),
            ("client_secret", &self.client_secret),
            ("callback_url", &self.callback_url),
        ];

        for (field, value) in required {
            if value.trim().is_empty() {
                return Err(OAuth2Error::ConfigError(format!("{} must not be empty", field)));
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_and_overrides() {
        let config = RobloxConfig::new("id", "secret", "http://localhost:3000/callback");
        assert_eq!(config.authorize_url(), DEFAULT_AUTHORIZE_URL);
        assert_eq!(config.access_token_url(), DEFAULT_ACCESS_TOKEN_URL);
        assert_eq!(config.user_info_url(), DEFAULT_USER_INFO_URL);
        assert_eq!(config.scopes(), vec!["openid".to_string()]);

        let config = config
            .with_access_token_url("http://mock/token")
            .with_scopes(["openid", "profile"]);
        assert_eq!(config.access_token_url(), "http://mock/token");
        assert_eq!(config.scopes(), vec!["openid".to_string(), "profile".to_string()]);
    }

    #[test]
    fn test_empty_scopes_fall_back_to_default() {
        let config = RobloxConfig::new("id", "secret", "cb").with_scopes(Vec::<String>::new());
        assert_eq!(config.scopes(), vec!["openid".to_string()]);
    }

    #[test]
    fn test_validate_rejects_missing_fields() {
        assert!(RobloxConfig::new("id", "secret", "cb").validate().is_ok());

        let result = RobloxConfig::new("", "secret", "cb").validate();
        assert!(matches!(result, Err(OAuth2Error::ConfigError(msg)) if msg.contains("client_id")));

        let result = RobloxConfig::new("id", "  ", "cb").validate();
        assert!(matches!(result, Err(OAuth2Error::ConfigError(msg)) if msg.contains("client_secret")));

        let result = RobloxConfig::new("id", "secret", "").validate();
        assert!(matches!(result, Err(OAuth2Error::ConfigError(msg)) if msg.contains("callback_url")));
    }

    #[test]
    fn test_deserialize_from_json() {
        let config: RobloxConfig = serde_json::from_value(serde_json::json!({
            "client_id": "id",
            "client_secret": "secret",
            "callback_url": "http://localhost/cb",
            "scopes": ["openid", "profile"]
        }))
        .unwrap();

        assert_eq!(config.state_ttl_seconds, 600);
        assert_eq!(config.user_info_url, None);
        assert_eq!(config.scopes(), vec!["openid".to_string(), "profile".to_string()]);
    }
}

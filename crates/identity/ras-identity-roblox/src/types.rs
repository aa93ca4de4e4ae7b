//! OAuth2 protocol and profile types.

use serde::{Deserialize, Serialize};

/// Token type carried by [`AccessToken`]. The driver only issues bearer tokens.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TokenType {
    #[default]
    Bearer,
}

/// Access token obtained from the token endpoint or supplied by the caller.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccessToken {
    pub token: String,
    #[serde(rename = "type")]
    pub token_type: TokenType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub refresh_token: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expires_in: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scope: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id_token: Option<String>,
}

impl AccessToken {
    /// Bearer token with no extra metadata.
    pub fn bearer(token: impl Into<String>) -> Self {
        Self {
            token: token.into(),
            token_type: TokenType::Bearer,
            refresh_token: None,
            expires_in: None,
            scope: None,
            id_token: None,
        }
    }
}

/// Token endpoint response body.
#[derive(Debug, Clone, Deserialize)]
pub(crate) struct TokenResponse {
    pub access_token: String,
    pub expires_in: Option<u64>,
    pub refresh_token: Option<String>,
    pub scope: Option<String>,
    pub id_token: Option<String>,
}

impl From<TokenResponse> for AccessToken {
    fn from(response: TokenResponse) -> Self {
        Self {
            token: response.access_token,
            token_type: TokenType::Bearer,
            refresh_token: response.refresh_token,
            expires_in: response.expires_in,
            scope: response.scope,
            id_token: response.id_token,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EmailVerificationState {
    Verified,
    Unverified,
    /// The provider did not say.
    Unsupported,
}

/// Normalized user profile.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    pub id: String,
    pub name: Option<String>,
    pub nick_name: Option<String>,
    pub email: Option<String>,
    pub email_verification_state: EmailVerificationState,
    pub avatar_url: String,
    /// Raw user info payload as returned by the provider.
    pub original: serde_json::Value,
}

/// Result of a completed flow: the profile together with the token used to fetch it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OAuth2User {
    #[serde(flatten)]
    pub profile: UserProfile,
    pub token: AccessToken,
}

/// Callback query as sent back by the provider.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthorizationResponse {
    pub code: Option<String>,
    pub state: Option<String>,
    pub error: Option<String>,
    pub error_description: Option<String>,
}

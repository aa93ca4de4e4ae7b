//! Identity provider for Roblox access tokens obtained out of band.

use crate::config::RobloxConfig;
use crate::error::OAuth2Result;
use crate::flow::AuthorizationCodeFlow;
use crate::http::HttpClient;
use crate::roblox::{PROVIDER_NAME, roblox_flow};
use crate::types::UserProfile;
use async_trait::async_trait;
use ras_identity_core::{IdentityError, IdentityProvider, IdentityResult, VerifiedIdentity};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::info;

/// Payload accepted by [`RobloxIdentityProvider::verify`].
#[derive(Debug, Serialize, Deserialize)]
pub struct RobloxAuthPayload {
    pub access_token: String,
}

/// Verifies Roblox access tokens against the user info endpoint.
#[derive(Clone)]
pub struct RobloxIdentityProvider {
    flow: AuthorizationCodeFlow,
}

impl RobloxIdentityProvider {
    pub fn new(config: &RobloxConfig, http: Arc<dyn HttpClient>) -> OAuth2Result<Self> {
        Ok(Self {
            flow: roblox_flow(config, http)?,
        })
    }

    fn to_identity(&self, profile: UserProfile) -> VerifiedIdentity {
        VerifiedIdentity {
            provider_id: PROVIDER_NAME.to_string(),
            subject: profile.id,
            email: profile.email,
            display_name: profile.name,
            metadata: Some(serde_json::json!({
                "nickname": profile.nick_name,
                "avatar_url": profile.avatar_url,
                "email_verification_state": profile.email_verification_state,
                "claims": profile.original,
            })),
        }
    }
}

#[async_trait]
impl IdentityProvider for RobloxIdentityProvider {
    fn provider_id(&self) -> &str {
        PROVIDER_NAME
    }

    async fn verify(&self, auth_payload: serde_json::Value) -> IdentityResult<VerifiedIdentity> {
        let payload: RobloxAuthPayload =
            serde_json::from_value(auth_payload).map_err(|_| IdentityError::InvalidPayload)?;

        let profile = self
            .flow
            .fetch_user(&payload.access_token, None)
            .await
            .map_err(|e| IdentityError::ProviderError(e.to_string()))?;

        info!("Verified Roblox identity for subject: {}", profile.id);
        Ok(self.to_identity(profile))
    }
}

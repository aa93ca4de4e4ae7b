//! Host-facing driver interface and registration.

use crate::config::RobloxConfig;
use crate::context::RequestContext;
use crate::error::OAuth2Result;
use crate::flow::RequestCustomizer;
use crate::http::HttpClient;
use crate::redirect::RedirectCustomizer;
use crate::roblox::{PROVIDER_NAME, RobloxDriver};
use crate::types::OAuth2User;
use async_trait::async_trait;
use ras_identity_core::{DriverRegistry, IdentityError};
use std::sync::Arc;

/// Social login driver bound to one request.
#[async_trait]
pub trait SocialDriver: Send + Sync {
    fn redirect_url(&self, scopes: Option<Vec<String>>) -> OAuth2Result<String>;

    fn redirect_url_with(&self, customizer: RedirectCustomizer<'_>) -> OAuth2Result<String>;

    fn access_denied(&self) -> bool;

    fn has_error(&self) -> bool;

    fn error(&self) -> Option<String>;

    fn state_mismatch(&self) -> bool;

    async fn user(&self, customizer: Option<RequestCustomizer<'_>>) -> OAuth2Result<OAuth2User>;

    async fn user_from_token(
        &self,
        access_token: &str,
        customizer: Option<RequestCustomizer<'_>>,
    ) -> OAuth2Result<OAuth2User>;
}

/// Registry of social drivers keyed by provider name.
pub type SocialDriverRegistry = DriverRegistry<Arc<dyn RequestContext>, dyn SocialDriver>;

#[async_trait]
impl SocialDriver for RobloxDriver {
    fn redirect_url(&self, scopes: Option<Vec<String>>) -> OAuth2Result<String> {
        self.redirect(scopes)
    }

    fn redirect_url_with(&self, customizer: RedirectCustomizer<'_>) -> OAuth2Result<String> {
        self.redirect_with(customizer)
    }

    fn access_denied(&self) -> bool {
        RobloxDriver::access_denied(self)
    }

    fn has_error(&self) -> bool {
        RobloxDriver::has_error(self)
    }

    fn error(&self) -> Option<String> {
        RobloxDriver::error(self)
    }

    fn state_mismatch(&self) -> bool {
        RobloxDriver::state_mismatch(self)
    }

    async fn user(&self, customizer: Option<RequestCustomizer<'_>>) -> OAuth2Result<OAuth2User> {
        RobloxDriver::user(self, customizer).await
    }

    async fn user_from_token(
        &self,
        access_token: &str,
        customizer: Option<RequestCustomizer<'_>>,
    ) -> OAuth2Result<OAuth2User> {
        RobloxDriver::user_from_token(self, access_token, customizer).await
    }
}

/// Register the Roblox driver under [`PROVIDER_NAME`].
///
/// The factory deserializes a [`RobloxConfig`] from the driver configuration
/// passed to [`DriverRegistry::create`].
pub fn register(registry: &mut SocialDriverRegistry, http: Arc<dyn HttpClient>) {
    registry.register(
        PROVIDER_NAME,
        move |ctx: Arc<dyn RequestContext>, config: &serde_json::Value| {
            let config: RobloxConfig = serde_json::from_value(config.clone())
                .map_err(|e| IdentityError::InvalidConfig(e.to_string()))?;
            let driver = RobloxDriver::new(ctx, &config, http.clone())
                .map_err(|e| IdentityError::InvalidConfig(e.to_string()))?;
            Ok(Box::new(driver) as Box<dyn SocialDriver>)
        },
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::InMemoryRequestContext;
    use crate::http::ReqwestHttpClient;
    use crate::roblox::STATE_COOKIE_NAME;

    fn registry() -> SocialDriverRegistry {
        let http = Arc::new(ReqwestHttpClient::new(5).unwrap());
        let mut registry = SocialDriverRegistry::new();
        register(&mut registry, http);
        registry
    }

    #[test]
    fn test_roblox_is_registered() {
        assert_eq!(registry().names(), vec![PROVIDER_NAME]);
    }

    #[test]
    fn test_create_from_json_config() {
        let ctx = Arc::new(InMemoryRequestContext::new());
        let config = serde_json::json!({
            "client_id": "cid",
            "client_secret": "secret",
            "callback_url": "http://localhost:3000/callback"
        });

        let driver = registry().create("roblox", ctx.clone(), &config).unwrap();
        let url = driver.redirect_url(None).unwrap();

        assert!(url.contains("client_id=cid"));
        assert!(ctx.cookie(STATE_COOKIE_NAME).is_some());
    }

    #[test]
    fn test_invalid_config() {
        let ctx: Arc<dyn RequestContext> = Arc::new(InMemoryRequestContext::new());
        let registry = registry();

        let missing_field = registry.create("roblox", ctx.clone(), &serde_json::json!({"client_id": "cid"}));
        assert!(matches!(missing_field, Err(IdentityError::InvalidConfig(_))));

        let empty_secret = registry.create(
            "roblox",
            ctx,
            &serde_json::json!({"client_id": "cid", "client_secret": "", "callback_url": "cb"}),
        );
        assert!(matches!(empty_secret, Err(IdentityError::InvalidConfig(_))));
    }
}

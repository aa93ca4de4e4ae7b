//! Roblox driver.

use crate::config::RobloxConfig;
use crate::context::RequestContext;
use crate::error::OAuth2Result;
use crate::flow::{AuthorizationCodeFlow, FlowSettings, RequestCustomizer};
use crate::http::{ApiRequest, HttpClient};
use crate::redirect::RedirectCustomizer;
use crate::types::{AccessToken, EmailVerificationState, OAuth2User, UserProfile};
use base64::{Engine, engine::general_purpose::STANDARD};
use std::sync::Arc;
use std::time::Duration;
use tracing::info;
use url::form_urlencoded;

pub const PROVIDER_NAME: &str = "roblox";
pub const STATE_COOKIE_NAME: &str = "roblox_oauth_state";
pub const USER_DENIED_ERROR: &str = "user_denied";

const AVATAR_BASE_URL: &str = "https://www.roblox.com/headshot-thumbnail/image";

/// Roblox OAuth2 driver for a single request.
///
/// Created per inbound request from the shared configuration and HTTP
/// client; all callback inspection goes through the request context.
pub struct RobloxDriver {
    ctx: Arc<dyn RequestContext>,
    flow: AuthorizationCodeFlow,
}

impl RobloxDriver {
    pub fn new(
        ctx: Arc<dyn RequestContext>,
        config: &RobloxConfig,
        http: Arc<dyn HttpClient>,
    ) -> OAuth2Result<Self> {
        Ok(Self {
            ctx,
            flow: roblox_flow(config, http)?,
        })
    }

    /// Build from an already assembled flow, sharing it across requests.
    pub fn with_flow(ctx: Arc<dyn RequestContext>, flow: AuthorizationCodeFlow) -> Self {
        Self { ctx, flow }
    }

    /// Authorization URL for the given scopes (configured scopes when `None`
    /// or empty). Stores the state cookie as a side effect.
    pub fn redirect(&self, scopes: Option<Vec<String>>) -> OAuth2Result<String> {
        self.flow.redirect_url(self.ctx.as_ref(), scopes, None)
    }

    /// Authorization URL, letting the caller adjust scopes and parameters.
    pub fn redirect_with(&self, customizer: RedirectCustomizer<'_>) -> OAuth2Result<String> {
        self.flow.redirect_url(self.ctx.as_ref(), None, Some(customizer))
    }

    /// Whether the user declined the authorization request.
    pub fn access_denied(&self) -> bool {
        self.flow.access_denied(self.ctx.as_ref())
    }

    pub fn has_error(&self) -> bool {
        self.error().is_some()
    }

    /// Raw error code from the callback, if any.
    pub fn error(&self) -> Option<String> {
        self.flow.callback(self.ctx.as_ref()).error
    }

    pub fn code(&self) -> Option<String> {
        self.flow.callback(self.ctx.as_ref()).code
    }

    pub fn state_mismatch(&self) -> bool {
        self.flow.state_mismatch(self.ctx.as_ref())
    }

    /// Complete the callback and fetch the user.
    pub async fn user(&self, customizer: Option<RequestCustomizer<'_>>) -> OAuth2Result<OAuth2User> {
        let token = self.flow.access_token(self.ctx.as_ref()).await?;
        let profile = self.flow.fetch_user(&token.token, customizer).await?;

        info!("Authenticated Roblox user {}", profile.id);
        Ok(OAuth2User { profile, token })
    }

    /// Fetch the user for an access token obtained out of band. Neither the
    /// state cookie nor the token endpoint is touched.
    pub async fn user_from_token(
        &self,
        access_token: &str,
        customizer: Option<RequestCustomizer<'_>>,
    ) -> OAuth2Result<OAuth2User> {
        let profile = self.flow.fetch_user(access_token, customizer).await?;

        Ok(OAuth2User {
            profile,
            token: AccessToken::bearer(access_token),
        })
    }
}

/// Assemble the authorization code flow with the Roblox endpoints, the
/// bearer-encoded client credentials and the Roblox claim mapping.
pub fn roblox_flow(
    config: &RobloxConfig,
    http: Arc<dyn HttpClient>,
) -> OAuth2Result<AuthorizationCodeFlow> {
    config.validate()?;

    let mut settings = FlowSettings::new(
        config.client_id.as_str(),
        config.client_secret.as_str(),
        config.callback_url.as_str(),
    );
    settings.authorize_url = config.authorize_url().to_string();
    settings.access_token_url = config.access_token_url().to_string();
    settings.user_info_url = config.user_info_url().to_string();
    settings.scopes = config.scopes();
    settings.access_denied_error = USER_DENIED_ERROR.to_string();
    settings.state_cookie = STATE_COOKIE_NAME.to_string();
    settings.state_ttl = Duration::from_secs(config.state_ttl_seconds);

    let authorization = client_authorization(&config.client_id, &config.client_secret);

    let flow = AuthorizationCodeFlow::new(settings, http, Arc::new(map_claims))
        .with_token_request_hook(Arc::new(move |request: &mut ApiRequest| {
            request.header("Authorization", authorization.as_str());
        }));

    Ok(flow)
}

/// `Bearer <base64(client_id:client_secret)>`. Roblox expects the client
/// credentials in this form on the token endpoint.
pub fn client_authorization(client_id: &str, client_secret: &str) -> String {
    let credentials = format!("{}:{}", client_id, client_secret);
    format!("Bearer {}", STANDARD.encode(credentials))
}

/// Headshot thumbnail URL for a user id.
pub fn avatar_url(user_id: &str) -> String {
    let user_id: String = form_urlencoded::byte_serialize(user_id.as_bytes()).collect();
    format!(
        "{}?userId={}&width=420&height=420&format=png",
        AVATAR_BASE_URL, user_id
    )
}

/// Map Roblox user info claims onto a [`UserProfile`].
///
/// Fails when the payload is not an object or `sub` is missing, empty or
/// neither a string nor a number, since the profile id and avatar URL are
/// derived from it. The flow reports that as
/// [`OAuth2Error::UserInfoFetchFailed`](crate::OAuth2Error::UserInfoFetchFailed).
pub fn map_claims(claims: serde_json::Value) -> Result<UserProfile, String> {
    let id = match claims.get("sub") {
        Some(serde_json::Value::String(sub)) if !sub.is_empty() => sub.clone(),
        Some(serde_json::Value::Number(sub)) => sub.to_string(),
        Some(_) => return Err("the \"sub\" claim is not a string or number".to_string()),
        None if claims.is_object() => return Err("missing \"sub\" claim".to_string()),
        None => return Err("user info payload is not a JSON object".to_string()),
    };

    let email_verification_state = match claims.get("verified") {
        Some(verified) if is_truthy(verified) => EmailVerificationState::Verified,
        Some(_) => EmailVerificationState::Unverified,
        None => EmailVerificationState::Unsupported,
    };

    let text = |key: &str| {
        claims
            .get(key)
            .and_then(|v| v.as_str())
            .map(String::from)
    };

    Ok(UserProfile {
        name: text("name"),
        nick_name: text("nickname"),
        email: text("email"),
        email_verification_state,
        avatar_url: avatar_url(&id),
        id,
        original: claims,
    })
}

fn is_truthy(value: &serde_json::Value) -> bool {
    match value {
        serde_json::Value::Null => false,
        serde_json::Value::Bool(b) => *b,
        serde_json::Value::Number(n) => n.as_f64().is_some_and(|n| n != 0.0 && !n.is_nan()),
        serde_json::Value::String(s) => !s.is_empty(),
        serde_json::Value::Array(_) | serde_json::Value::Object(_) => true,
    }
}

//! Provider-agnostic OAuth2 authorization code flow.
//!
//! [`AuthorizationCodeFlow`] carries the protocol mechanics (redirect URL,
//! state verification, code exchange, user info fetch). Provider drivers
//! plug in their specifics as data ([`FlowSettings`]) and strategy closures:
//! how the redirect and token requests are configured, and how raw claims
//! are mapped onto a [`UserProfile`].

use crate::context::RequestContext;
use crate::error::{OAuth2Error, OAuth2Result};
use crate::http::{ApiRequest, HttpClient, HttpResponse};
use crate::redirect::{RedirectCustomizer, RedirectRequest};
use crate::state::StateToken;
use crate::types::{AccessToken, AuthorizationResponse, TokenResponse, UserProfile};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, info, warn};

/// Caller hook for adjusting an outgoing API request right before dispatch.
pub type RequestCustomizer<'a> = Box<dyn FnOnce(&mut ApiRequest) + Send + 'a>;

/// Provider hook applied to every redirect request.
pub type RedirectHook = Arc<dyn Fn(&mut RedirectRequest) + Send + Sync>;

/// Provider hook applied to every token request.
pub type TokenRequestHook = Arc<dyn Fn(&mut ApiRequest) + Send + Sync>;

/// Maps the raw user info payload onto a profile. The error string ends up
/// in [`OAuth2Error::UserInfoFetchFailed`].
pub type ClaimMapper = Arc<dyn Fn(serde_json::Value) -> Result<UserProfile, String> + Send + Sync>;

/// Endpoints, credentials and protocol names for one provider.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FlowSettings {
    pub client_id: String,
    pub client_secret: String,
    pub redirect_uri: String,
    pub authorize_url: String,
    pub access_token_url: String,
    pub user_info_url: String,
    pub scopes: Vec<String>,
    pub scope_param: String,
    pub scope_separator: String,
    pub code_param: String,
    pub state_param: String,
    pub error_param: String,
    pub error_description_param: String,
    /// Error code the provider sends back when the user declines consent.
    pub access_denied_error: String,
    pub state_cookie: String,
    pub state_ttl: Duration,
}

impl FlowSettings {
    /// Settings with the conventional OAuth2 parameter names.
    pub fn new(
        client_id: impl Into<String>,
        client_secret: impl Into<String>,
        redirect_uri: impl Into<String>,
    ) -> Self {
        Self {
            client_id: client_id.into(),
            client_secret: client_secret.into(),
            redirect_uri: redirect_uri.into(),
            authorize_url: String::new(),
            access_token_url: String::new(),
            user_info_url: String::new(),
            scopes: Vec::new(),
            scope_param: "scope".to_string(),
            scope_separator: " ".to_string(),
            code_param: "code".to_string(),
            state_param: "state".to_string(),
            error_param: "error".to_string(),
            error_description_param: "error_description".to_string(),
            access_denied_error: "access_denied".to_string(),
            state_cookie: "oauth_state".to_string(),
            state_ttl: Duration::from_secs(600),
        }
    }
}

/// Authorization code flow engine, shared by all requests of one provider.
#[derive(Clone)]
pub struct AuthorizationCodeFlow {
    settings: Arc<FlowSettings>,
    http: Arc<dyn HttpClient>,
    configure_redirect: Option<RedirectHook>,
    configure_token_request: Option<TokenRequestHook>,
    map_claims: ClaimMapper,
}

impl AuthorizationCodeFlow {
    pub fn new(settings: FlowSettings, http: Arc<dyn HttpClient>, map_claims: ClaimMapper) -> Self {
        Self {
            settings: Arc::new(settings),
            http,
            configure_redirect: None,
            configure_token_request: None,
            map_claims,
        }
    }

    pub fn with_redirect_hook(mut self, hook: RedirectHook) -> Self {
        self.configure_redirect = Some(hook);
        self
    }

    pub fn with_token_request_hook(mut self, hook: TokenRequestHook) -> Self {
        self.configure_token_request = Some(hook);
        self
    }

    pub fn settings(&self) -> &FlowSettings {
        &self.settings
    }

    fn state_token(&self) -> StateToken<'_> {
        StateToken::new(&self.settings.state_cookie, self.settings.state_ttl)
    }

    /// Build the authorization URL and store a fresh state token in the
    /// state cookie.
    ///
    /// `scopes` replaces the configured scopes when non-empty. The customizer
    /// runs after the provider hook, so it sees (and may change) everything
    /// except `response_type` and the fixed client and state parameters.
    pub fn redirect_url(
        &self,
        ctx: &dyn RequestContext,
        scopes: Option<Vec<String>>,
        customizer: Option<RedirectCustomizer<'_>>,
    ) -> OAuth2Result<String> {
        let settings = &self.settings;
        let mut request = RedirectRequest::new(
            settings.authorize_url.as_str(),
            settings.scope_param.as_str(),
            settings.scope_separator.as_str(),
        );

        match scopes {
            Some(scopes) if !scopes.is_empty() => request.scopes(scopes),
            _ => request.scopes(settings.scopes.iter().cloned()),
        };

        if let Some(hook) = &self.configure_redirect {
            hook(&mut request);
        }
        if let Some(customizer) = customizer {
            customizer(&mut request);
        }

        let state = self.state_token().generate(ctx);
        let url = request.build(&[
            ("response_type", "code"),
            ("client_id", settings.client_id.as_str()),
            ("redirect_uri", settings.redirect_uri.as_str()),
            (settings.state_param.as_str(), state.as_str()),
        ])?;

        debug!(
            "Generated authorization URL with scopes [{}]",
            request.requested_scopes().join(", ")
        );
        Ok(url)
    }

    /// Callback parameters as received on the current request.
    pub fn callback(&self, ctx: &dyn RequestContext) -> AuthorizationResponse {
        let settings = &self.settings;
        AuthorizationResponse {
            code: ctx.input(&settings.code_param),
            state: ctx.input(&settings.state_param),
            error: ctx.input(&settings.error_param),
            error_description: ctx.input(&settings.error_description_param),
        }
    }

    pub fn access_denied(&self, ctx: &dyn RequestContext) -> bool {
        ctx.input(&self.settings.error_param).as_deref()
            == Some(self.settings.access_denied_error.as_str())
    }

    pub fn state_mismatch(&self, ctx: &dyn RequestContext) -> bool {
        let callback_state = ctx.input(&self.settings.state_param);
        self.state_token().is_mismatch(ctx, callback_state.as_deref())
    }

    /// Complete the callback: verify (and consume) the state, reject
    /// provider errors and exchange the authorization code.
    pub async fn access_token(&self, ctx: &dyn RequestContext) -> OAuth2Result<AccessToken> {
        let callback = self.callback(ctx);

        self.state_token().verify(ctx, callback.state.as_deref())?;

        if let Some(code) = callback.error {
            if code == self.settings.access_denied_error {
                info!("User denied the authorization request");
                return Err(OAuth2Error::AccessDenied);
            }
            warn!("Provider returned error on callback: {}", code);
            return Err(OAuth2Error::ProviderError {
                code,
                description: callback.error_description,
            });
        }

        let code = callback
            .code
            .filter(|code| !code.is_empty())
            .ok_or(OAuth2Error::MissingAuthorizationCode)?;

        self.exchange_code(&code).await
    }

    /// Exchange an authorization code for an access token.
    pub async fn exchange_code(&self, code: &str) -> OAuth2Result<AccessToken> {
        let settings = &self.settings;
        let mut request = ApiRequest::post(settings.access_token_url.as_str());
        request
            .header("Accept", "application/json")
            .field("grant_type", "authorization_code")
            .field("redirect_uri", settings.redirect_uri.as_str())
            .field(settings.code_param.as_str(), code);

        if let Some(hook) = &self.configure_token_request {
            hook(&mut request);
        }

        let response = self.http.send(request).await.map_err(|e| {
            error!("Token exchange request failed: {}", e);
            OAuth2Error::TokenExchangeFailed {
                status: None,
                body: e.to_string(),
            }
        })?;

        if !response.is_success() {
            error!("Token exchange failed with status {}: {}", response.status, response.body);
            return Err(token_failure(response));
        }

        let token: TokenResponse = match response.json() {
            Ok(token) => token,
            Err(e) => {
                error!("Invalid token response: {}", e);
                return Err(token_failure(response));
            }
        };

        info!("Successfully exchanged code for tokens");
        Ok(token.into())
    }

    /// Fetch the user info for `access_token` and map it onto a profile.
    pub async fn fetch_user(
        &self,
        access_token: &str,
        customizer: Option<RequestCustomizer<'_>>,
    ) -> OAuth2Result<UserProfile> {
        let mut request = ApiRequest::get(self.settings.user_info_url.as_str());
        request
            .header("Authorization", format!("Bearer {}", access_token))
            .header("Accept", "application/json");

        if let Some(customizer) = customizer {
            customizer(&mut request);
        }

        let response = self.http.send(request).await.map_err(|e| {
            error!("User info request failed: {}", e);
            OAuth2Error::UserInfoFetchFailed {
                status: None,
                body: e.to_string(),
            }
        })?;

        if !response.is_success() {
            error!("User info request failed with status {}: {}", response.status, response.body);
            return Err(user_info_failure(response.status, response.body));
        }

        let claims: serde_json::Value = match response.json() {
            Ok(claims) => claims,
            Err(e) => {
                error!("Invalid user info response: {}", e);
                return Err(user_info_failure(response.status, response.body));
            }
        };

        let profile = (self.map_claims)(claims).map_err(|reason| {
            error!("Invalid user info payload: {}", reason);
            user_info_failure(response.status, reason)
        })?;

        debug!("Successfully retrieved user info for subject: {}", profile.id);
        Ok(profile)
    }
}

fn token_failure(response: HttpResponse) -> OAuth2Error {
    OAuth2Error::TokenExchangeFailed {
        status: Some(response.status),
        body: response.body,
    }
}

fn user_info_failure(status: u16, body: String) -> OAuth2Error {
    OAuth2Error::UserInfoFetchFailed {
        status: Some(status),
        body,
    }
}

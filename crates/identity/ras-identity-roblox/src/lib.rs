//! Roblox OAuth2 driver.
//!
//! Implements the authorization code flow against the Roblox OAuth2 API:
//! building the authorization redirect, defending it with a cookie-bound
//! state token, exchanging the authorization code for an access token and
//! normalizing the user info claims into a [`UserProfile`].
//!
//! The protocol mechanics live in the provider-agnostic
//! [`AuthorizationCodeFlow`]; [`RobloxDriver`] configures it with the Roblox
//! endpoints, credential header and claim mapping. The host supplies the
//! per-request [`RequestContext`] and an [`HttpClient`].

mod config;
mod context;
mod driver;
mod error;
mod flow;
mod http;
mod provider;
mod redirect;
mod roblox;
mod state;
mod types;


pub use config::{
    DEFAULT_ACCESS_TOKEN_URL, DEFAULT_AUTHORIZE_URL, DEFAULT_SCOPES, DEFAULT_USER_INFO_URL,
    RobloxConfig,
};
pub use context::{InMemoryRequestContext, RequestContext};
pub use driver::{SocialDriver, SocialDriverRegistry, register};
pub use error::{HttpError, OAuth2Error, OAuth2Result};
pub use flow::{
    AuthorizationCodeFlow, ClaimMapper, FlowSettings, RedirectHook, RequestCustomizer,
    TokenRequestHook,
};
pub use http::{ApiRequest, HttpClient, HttpResponse, ReqwestHttpClient};
pub use provider::{RobloxAuthPayload, RobloxIdentityProvider};
pub use redirect::{RedirectCustomizer, RedirectRequest};
pub use reqwest::Method;
pub use roblox::{
    PROVIDER_NAME, RobloxDriver, STATE_COOKIE_NAME, USER_DENIED_ERROR, avatar_url,
    client_authorization, map_claims, roblox_flow,
};
pub use state::StateToken;
pub use types::{
    AccessToken, AuthorizationResponse, EmailVerificationState, OAuth2User, TokenType,
    UserProfile,
};

// Re-export common types for convenience
pub use ras_identity_core::{DriverRegistry, IdentityProvider, VerifiedIdentity};

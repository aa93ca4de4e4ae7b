//! Roblox login demo
//!
//! A minimal axum host for the Roblox OAuth2 driver:
//! - `GET /auth/roblox/redirect` sends the browser to Roblox
//! - `GET /auth/roblox/callback` completes the flow and returns the user
//! - `POST /auth/roblox/token` verifies an access token obtained elsewhere
//!
//! Configure with `ROBLOX__OAUTH__CLIENT_ID`, `ROBLOX__OAUTH__CLIENT_SECRET`
//! and `ROBLOX__OAUTH__CALLBACK_URL` (a `.env` file is honored).

mod config;
mod context;

use anyhow::{Context, Result};
use axum::{
    Json, Router,
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Redirect, Response},
    routing::{get, post},
};
use axum_extra::extract::cookie::CookieJar;
use ras_identity_core::IdentityError;
use ras_identity_roblox::{
    HttpClient, IdentityProvider, OAuth2Error, PROVIDER_NAME, ReqwestHttpClient,
    RobloxIdentityProvider, SocialDriver, SocialDriverRegistry,
};
use serde_json::json;
use std::{collections::HashMap, net::SocketAddr, sync::Arc};
use tower_http::trace::TraceLayer;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use crate::config::Config;
use crate::context::CookieContext;

#[derive(Clone)]
struct AppState {
    drivers: Arc<SocialDriverRegistry>,
    driver_config: Arc<serde_json::Value>,
    identity: Arc<RobloxIdentityProvider>,
    secure_cookies: bool,
}

impl AppState {
    fn driver(
        &self,
        query: HashMap<String, String>,
        jar: CookieJar,
    ) -> Result<(Arc<CookieContext>, Box<dyn SocialDriver>), AppError> {
        let ctx = Arc::new(CookieContext::new(query, jar, self.secure_cookies));
        let driver = self
            .drivers
            .create(PROVIDER_NAME, ctx.clone(), &self.driver_config)
            .map_err(AppError::from)?;
        Ok((ctx, driver))
    }
}

#[derive(Debug)]
struct AppError {
    status: StatusCode,
    message: String,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        (self.status, Json(json!({ "error": self.message }))).into_response()
    }
}

impl From<OAuth2Error> for AppError {
    fn from(error: OAuth2Error) -> Self {
        let status = match &error {
            OAuth2Error::StateMismatch
            | OAuth2Error::MissingAuthorizationCode
            | OAuth2Error::ProviderError { .. } => StatusCode::BAD_REQUEST,
            OAuth2Error::AccessDenied => StatusCode::FORBIDDEN,
            OAuth2Error::TokenExchangeFailed { .. } | OAuth2Error::UserInfoFetchFailed { .. } => {
                StatusCode::BAD_GATEWAY
            }
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };
        warn!("Roblox login failed: {}", error);
        Self {
            status,
            message: error.to_string(),
        }
    }
}

impl From<IdentityError> for AppError {
    fn from(error: IdentityError) -> Self {
        let status = match &error {
            IdentityError::InvalidPayload => StatusCode::BAD_REQUEST,
            IdentityError::ProviderError(_) => StatusCode::UNAUTHORIZED,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };
        warn!("Identity verification failed: {}", error);
        Self {
            status,
            message: error.to_string(),
        }
    }
}

async fn redirect_handler(
    State(state): State<AppState>,
    Query(query): Query<HashMap<String, String>>,
    jar: CookieJar,
) -> Result<impl IntoResponse, AppError> {
    // Optional space separated override, e.g. ?scope=openid+profile
    let scopes: Option<Vec<String>> = query
        .get("scope")
        .map(|scope| scope.split_whitespace().map(String::from).collect());

    let (ctx, driver) = state.driver(query, jar)?;
    let url = driver.redirect_url(scopes)?;

    Ok((ctx.jar(), Redirect::to(&url)))
}

async fn callback_handler(
    State(state): State<AppState>,
    Query(query): Query<HashMap<String, String>>,
    jar: CookieJar,
) -> Result<Response, AppError> {
    let (ctx, driver) = state.driver(query, jar)?;

    // Verifies and consumes the state before looking at the outcome
    let result = driver.user(None).await;
    let jar = ctx.jar();

    Ok(match result {
        Ok(user) => {
            info!("Roblox user {} logged in", user.profile.id);
            (jar, Json(user)).into_response()
        }
        Err(OAuth2Error::AccessDenied) => {
            info!("User cancelled the Roblox login");
            (
                StatusCode::FORBIDDEN,
                jar,
                Json(json!({ "error": "login cancelled" })),
            )
                .into_response()
        }
        Err(e) => (jar, AppError::from(e)).into_response(),
    })
}

async fn token_handler(
    State(state): State<AppState>,
    Json(payload): Json<serde_json::Value>,
) -> Result<impl IntoResponse, AppError> {
    let identity = state.identity.verify(payload).await?;
    Ok(Json(identity))
}

fn app_state(config: &Config, http: Arc<dyn HttpClient>) -> Result<AppState> {
    let mut drivers = SocialDriverRegistry::new();
    ras_identity_roblox::register(&mut drivers, http.clone());

    Ok(AppState {
        drivers: Arc::new(drivers),
        driver_config: Arc::new(
            serde_json::to_value(&config.oauth).context("Failed to encode driver config")?,
        ),
        identity: Arc::new(
            RobloxIdentityProvider::new(&config.oauth, http)
                .context("Failed to create identity provider")?,
        ),
        secure_cookies: config.server.secure_cookies,
    })
}

fn router(state: AppState) -> Router {
    Router::new()
        .route("/auth/roblox/redirect", get(redirect_handler))
        .route("/auth/roblox/callback", get(callback_handler))
        .route("/auth/roblox/token", post(token_handler))
        .route("/health", get(|| async { "OK" }))
        .with_state(state)
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info,ras_identity_roblox=debug")),
        )
        .with_target(false)
        .init();

    dotenvy::dotenv().ok();

    let config = Config::load()?;

    let http: Arc<dyn HttpClient> = Arc::new(
        ReqwestHttpClient::new(ReqwestHttpClient::DEFAULT_TIMEOUT_SECONDS)
            .context("Failed to create HTTP client")?,
    );

    let state = app_state(&config, http)?;

    let app = router(state).layer(TraceLayer::new_for_http());

    let addr = SocketAddr::from((config.server.host, config.server.port));
    info!("Roblox login demo listening on http://{}", addr);
    info!("Start a login at http://{}/auth/roblox/redirect", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

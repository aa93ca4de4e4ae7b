//! Outgoing API requests and the HTTP transport seam.

use crate::error::{HttpError, OAuth2Error, OAuth2Result};
use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use reqwest::{Client, Method};
use serde::de::DeserializeOwned;
use std::time::Duration;
use tracing::debug;

/// Mutable description of a request to a provider API.
///
/// This is the handle passed to request customizers, so everything the
/// driver sends (headers, query parameters, form fields) can be inspected
/// and changed before dispatch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiRequest {
    method: Method,
    url: String,
    headers: Vec<(String, String)>,
    params: Vec<(String, String)>,
    fields: Vec<(String, String)>,
}

impl ApiRequest {
    pub fn new(method: Method, url: impl Into<String>) -> Self {
        Self {
            method,
            url: url.into(),
            headers: Vec::new(),
            params: Vec::new(),
            fields: Vec::new(),
        }
    }

    pub fn get(url: impl Into<String>) -> Self {
        Self::new(Method::GET, url)
    }

    pub fn post(url: impl Into<String>) -> Self {
        Self::new(Method::POST, url)
    }

    /// Set a header, replacing any header with the same (case-insensitive) name.
    pub fn header(&mut self, name: impl Into<String>, value: impl Into<String>) -> &mut Self {
        let name = name.into();
        self.headers.retain(|(n, _)| !n.eq_ignore_ascii_case(&name));
        self.headers.push((name, value.into()));
        self
    }

    pub fn clear_header(&mut self, name: &str) -> &mut Self {
        self.headers.retain(|(n, _)| !n.eq_ignore_ascii_case(name));
        self
    }

    /// Set a query-string parameter.
    pub fn param(&mut self, name: impl Into<String>, value: impl Into<String>) -> &mut Self {
        upsert(&mut self.params, name.into(), value.into());
        self
    }

    /// Set a form field sent as an `application/x-www-form-urlencoded` body.
    pub fn field(&mut self, name: impl Into<String>, value: impl Into<String>) -> &mut Self {
        upsert(&mut self.fields, name.into(), value.into());
        self
    }

    pub fn method(&self) -> &Method {
        &self.method
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn header_value(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(n, _)| n.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    pub fn headers(&self) -> &[(String, String)] {
        &self.headers
    }

    pub fn params(&self) -> &[(String, String)] {
        &self.params
    }

    pub fn fields(&self) -> &[(String, String)] {
        &self.fields
    }
}

fn upsert(pairs: &mut Vec<(String, String)>, name: String, value: String) {
    match pairs.iter_mut().find(|(n, _)| *n == name) {
        Some((_, existing)) => *existing = value,
        None => pairs.push((name, value)),
    }
}

/// Status and raw body of a provider response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpResponse {
    pub status: u16,
    pub body: String,
}

impl HttpResponse {
    pub fn new(status: u16, body: impl Into<String>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    pub fn json<T: DeserializeOwned>(&self) -> serde_json::Result<T> {
        serde_json::from_str(&self.body)
    }
}

/// Transport used for the token and user info calls.
///
/// Timeouts, retries and cancellation are the transport's business; any
/// failure to obtain a response is reported as an [`HttpError`].
#[async_trait]
pub trait HttpClient: Send + Sync {
    async fn send(&self, request: ApiRequest) -> Result<HttpResponse, HttpError>;
}

/// [`HttpClient`] backed by `reqwest`.
#[derive(Debug, Clone)]
pub struct ReqwestHttpClient {
    client: Client,
}

impl ReqwestHttpClient {
    pub const DEFAULT_TIMEOUT_SECONDS: u64 = 30;

    pub fn new(http_timeout_seconds: u64) -> OAuth2Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(http_timeout_seconds))
            .build()
            .map_err(|e| OAuth2Error::ConfigError(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self { client })
    }

    pub fn with_client(client: Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl HttpClient for ReqwestHttpClient {
    async fn send(&self, request: ApiRequest) -> Result<HttpResponse, HttpError> {
        let mut headers = HeaderMap::new();
        for (name, value) in request.headers() {
            let name = HeaderName::from_bytes(name.as_bytes())
                .map_err(|e| HttpError::InvalidHeader(format!("{}: {}", name, e)))?;
            let value = HeaderValue::from_str(value)
                .map_err(|e| HttpError::InvalidHeader(format!("{}: {}", name, e)))?;
            headers.insert(name, value);
        }

        let mut builder = self
            .client
            .request(request.method().clone(), request.url())
            .headers(headers);

        if !request.params().is_empty() {
            builder = builder.query(request.params());
        }
        if !request.fields().is_empty() {
            builder = builder.form(request.fields());
        }

        debug!("Sending {} {}", request.method(), request.url());

        let response = builder.send().await?;
        let status = response.status().as_u16();
        let body = response.text().await?;

        Ok(HttpResponse { status, body })
    }
}

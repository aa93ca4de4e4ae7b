//! Per-request HTTP context supplied by the host.

use std::collections::{HashMap, HashSet};
use std::sync::Mutex;
use std::time::Duration;

/// Access to the inbound request's query string and the cookie jar of the
/// request/response pair currently being handled.
///
/// Implementations are scoped to one request; cookie writes must be visible
/// to subsequent reads through the same context.
pub trait RequestContext: Send + Sync {
    /// Query-string input by name.
    fn input(&self, name: &str) -> Option<String>;

    fn cookie(&self, name: &str) -> Option<String>;

    fn set_cookie(&self, name: &str, value: &str, max_age: Duration);

    fn clear_cookie(&self, name: &str);
}

#[derive(Debug, Default)]
struct CookieJar {
    written: HashMap<String, (String, Duration)>,
    cleared: HashSet<String>,
}

/// In-memory [`RequestContext`] for hosts that buffer cookie changes and
/// write them onto the response afterwards.
#[derive(Debug, Default)]
pub struct InMemoryRequestContext {
    query: HashMap<String, String>,
    inbound_cookies: HashMap<String, String>,
    jar: Mutex<CookieJar>,
}

impl InMemoryRequestContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a context from the inbound query parameters and request cookies.
    pub fn from_parts<Q, C, K, V, N, W>(query: Q, cookies: C) -> Self
    where
        Q: IntoIterator<Item = (K, V)>,
        C: IntoIterator<Item = (N, W)>,
        K: Into<String>,
        V: Into<String>,
        N: Into<String>,
        W: Into<String>,
    {
        let query = query
            .into_iter()
            .map(|(k, v)| (k.into(), v.into()))
            .collect();
        let inbound_cookies = cookies
            .into_iter()
            .map(|(k, v)| (k.into(), v.into()))
            .collect();

        Self {
            query,
            inbound_cookies,
            jar: Mutex::default(),
        }
    }

    pub fn with_input(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.query.insert(name.into(), value.into());
        self
    }

    /// Add a cookie as if the browser had sent it with the request.
    pub fn with_cookie(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.inbound_cookies.insert(name.into(), value.into());
        self
    }

    /// Max-age recorded for a cookie written during this request.
    pub fn cookie_max_age(&self, name: &str) -> Option<Duration> {
        self.jar().written.get(name).map(|(_, max_age)| *max_age)
    }

    /// Whether the cookie was cleared and not written again afterwards.
    pub fn is_cleared(&self, name: &str) -> bool {
        self.jar().cleared.contains(name)
    }

    /// Cookies to set on the response, as `(name, value, max_age)`.
    pub fn pending_cookies(&self) -> Vec<(String, String, Duration)> {
        let mut cookies: Vec<_> = self
            .jar()
            .written
            .iter()
            .map(|(name, (value, max_age))| (name.clone(), value.clone(), *max_age))
            .collect();
        cookies.sort_by(|a, b| a.0.cmp(&b.0));
        cookies
    }

    /// Cookies to expire on the response.
    pub fn cleared_cookies(&self) -> Vec<String> {
        let mut names: Vec<String> = self.jar().cleared.iter().cloned().collect();
        names.sort();
        names
    }

    fn jar(&self) -> std::sync::MutexGuard<'_, CookieJar> {
        self.jar.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl RequestContext for InMemoryRequestContext {
    fn input(&self, name: &str) -> Option<String> {
        self.query.get(name).cloned()
    }

    fn cookie(&self, name: &str) -> Option<String> {
        let jar = self.jar();
        if jar.cleared.contains(name) {
            return None;
        }
        jar.written
            .get(name)
            .map(|(value, _)| value.clone())
            .or_else(|| self.inbound_cookies.get(name).cloned())
    }

    fn set_cookie(&self, name: &str, value: &str, max_age: Duration) {
        let mut jar = self.jar();
        jar.cleared.remove(name);
        jar.written
            .insert(name.to_string(), (value.to_string(), max_age));
    }

    fn clear_cookie(&self, name: &str) {
        let mut jar = self.jar();
        jar.written.remove(name);
        jar.cleared.insert(name.to_string());
    }
}

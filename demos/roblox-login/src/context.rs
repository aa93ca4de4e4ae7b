//! [`RequestContext`] backed by the axum-extra cookie jar.

use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use ras_identity_roblox::RequestContext;
use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};
use std::time::Duration;

/// Query parameters and cookies of one inbound request. Cookie writes are
/// buffered in the jar and returned with the response via [`Self::jar`].
pub struct CookieContext {
    query: HashMap<String, String>,
    jar: Mutex<CookieJar>,
    secure: bool,
}

impl CookieContext {
    pub fn new(query: HashMap<String, String>, jar: CookieJar, secure: bool) -> Self {
        Self {
            query,
            jar: Mutex::new(jar),
            secure,
        }
    }

    /// The jar including every cookie set or removed so far.
    pub fn jar(&self) -> CookieJar {
        self.lock().clone()
    }

    fn lock(&self) -> MutexGuard<'_, CookieJar> {
        self.jar.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl RequestContext for CookieContext {
    fn input(&self, name: &str) -> Option<String> {
        self.query.get(name).cloned()
    }

    fn cookie(&self, name: &str) -> Option<String> {
        self.lock().get(name).map(|cookie| cookie.value().to_string())
    }

    fn set_cookie(&self, name: &str, value: &str, max_age: Duration) {
        let max_age = i64::try_from(max_age.as_secs()).unwrap_or(i64::MAX);
        let cookie = Cookie::build((name.to_string(), value.to_string()))
            .path("/")
            .http_only(true)
            .same_site(SameSite::Lax)
            .secure(self.secure)
            .max_age(time::Duration::seconds(max_age))
            .build();

        let mut jar = self.lock();
        *jar = jar.clone().add(cookie);
    }

    fn clear_cookie(&self, name: &str) {
        let mut jar = self.lock();
        *jar = jar
            .clone()
            .remove(Cookie::build((name.to_string(), "")).path("/"));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn context(cookies: &[(&str, &str)]) -> CookieContext {
        let jar = cookies.iter().fold(CookieJar::new(), |jar, (name, value)| {
            jar.add(Cookie::new(name.to_string(), value.to_string()))
        });
        let query = HashMap::from([("state".to_string(), "s1".to_string())]);
        CookieContext::new(query, jar, false)
    }

    #[test]
    fn test_reads_query_and_cookies() {
        let ctx = context(&[("roblox_oauth_state", "s1")]);

        assert_eq!(ctx.input("state").as_deref(), Some("s1"));
        assert_eq!(ctx.input("code"), None);
        assert_eq!(ctx.cookie("roblox_oauth_state").as_deref(), Some("s1"));
    }

    #[test]
    fn test_set_cookie_attributes() {
        let ctx = context(&[]);
        ctx.set_cookie("roblox_oauth_state", "abc", Duration::from_secs(600));

        let jar = ctx.jar();
        let cookie = jar.get("roblox_oauth_state").unwrap();
        assert_eq!(cookie.value(), "abc");
        assert_eq!(cookie.http_only(), Some(true));
        assert_eq!(cookie.same_site(), Some(SameSite::Lax));
        assert_eq!(cookie.max_age(), Some(time::Duration::seconds(600)));
    }

    #[test]
    fn test_clear_cookie() {
        let ctx = context(&[("roblox_oauth_state", "s1")]);
        ctx.clear_cookie("roblox_oauth_state");

        assert_eq!(ctx.cookie("roblox_oauth_state"), None);
    }
}

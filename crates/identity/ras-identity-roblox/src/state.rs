//! Cookie-bound state tokens for CSRF protection.

use crate::context::RequestContext;
use crate::error::{OAuth2Error, OAuth2Result};
use base64::{Engine, engine::general_purpose::URL_SAFE_NO_PAD};
use rand::{Rng, thread_rng};
use std::time::Duration;
use tracing::{debug, warn};

/// Single-use state token stored in a cookie during the redirect and echoed
/// back by the provider on the callback.
#[derive(Debug, Clone, Copy)]
pub struct StateToken<'a> {
    cookie_name: &'a str,
    ttl: Duration,
}

impl<'a> StateToken<'a> {
    pub fn new(cookie_name: &'a str, ttl: Duration) -> Self {
        Self { cookie_name, ttl }
    }

    /// Generate a fresh token and store it in the state cookie.
    pub fn generate(&self, ctx: &dyn RequestContext) -> String {
        let token = Self::random_token();
        ctx.set_cookie(self.cookie_name, &token, self.ttl);
        debug!("Issued state token in cookie {}", self.cookie_name);
        token
    }

    /// Compare the stored token against the callback value and clear the
    /// cookie, whatever the outcome.
    pub fn verify(&self, ctx: &dyn RequestContext, callback_state: Option<&str>) -> OAuth2Result<()> {
        let stored = ctx.cookie(self.cookie_name);
        ctx.clear_cookie(self.cookie_name);

        match (stored.as_deref(), callback_state) {
            (Some(stored), Some(received)) if !stored.is_empty() && stored == received => Ok(()),
            (None, _) => {
                warn!("State cookie {} missing on callback", self.cookie_name);
                Err(OAuth2Error::StateMismatch)
            }
            _ => {
                warn!("State parameter does not match cookie {}", self.cookie_name);
                Err(OAuth2Error::StateMismatch)
            }
        }
    }

    /// Whether the callback state differs from the stored one. Does not consume the cookie.
    pub fn is_mismatch(&self, ctx: &dyn RequestContext, callback_state: Option<&str>) -> bool {
        match (ctx.cookie(self.cookie_name), callback_state) {
            (Some(stored), Some(received)) => stored.is_empty() || stored != received,
            _ => true,
        }
    }

    fn random_token() -> String {
        let bytes: [u8; 32] = thread_rng().r#gen();
        URL_SAFE_NO_PAD.encode(bytes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::InMemoryRequestContext;

    const COOKIE: &str = "test_oauth_state";

    fn token() -> StateToken<'static> {
        StateToken::new(COOKIE, Duration::from_secs(600))
    }

    #[test]
    fn test_generate_stores_cookie() {
        let ctx = InMemoryRequestContext::new();
        let state = token().generate(&ctx);

        assert_eq!(ctx.cookie(COOKIE), Some(state.clone()));
        assert_eq!(ctx.cookie_max_age(COOKIE), Some(Duration::from_secs(600)));
        // 32 bytes, base64 without padding
        assert_eq!(state.len(), 43);
    }

    #[test]
    fn test_generated_tokens_are_unique() {
        let ctx = InMemoryRequestContext::new();
        let first = token().generate(&ctx);
        let second = token().generate(&ctx);

        assert_ne!(first, second);
        assert_eq!(ctx.cookie(COOKIE), Some(second));
    }

    #[test]
    fn test_verify_matching_state() {
        let ctx = InMemoryRequestContext::new().with_cookie(COOKIE, "abc");

        assert!(token().verify(&ctx, Some("abc")).is_ok());
        assert!(ctx.is_cleared(COOKIE));
    }

    #[test]
    fn test_verify_is_single_use() {
        let ctx = InMemoryRequestContext::new().with_cookie(COOKIE, "abc");

        assert!(token().verify(&ctx, Some("abc")).is_ok());
        let replay = token().verify(&ctx, Some("abc"));
        assert!(matches!(replay, Err(OAuth2Error::StateMismatch)));
    }

    #[test]
    fn test_verify_mismatches_clear_cookie() {
        let cases: [(Option<&str>, Option<&str>); 5] = [
            (None, Some("abc")),
            (Some("abc"), None),
            (Some("abc"), Some("abd")),
            (Some("abc"), Some("ABC")),
            (Some(""), Some("")),
        ];

        for (stored, received) in cases {
            let ctx = match stored {
                Some(value) => InMemoryRequestContext::new().with_cookie(COOKIE, value),
                None => InMemoryRequestContext::new(),
            };

            let result = token().verify(&ctx, received);
            assert!(
                matches!(result, Err(OAuth2Error::StateMismatch)),
                "expected mismatch for {:?} / {:?}",
                stored,
                received
            );
            assert!(ctx.is_cleared(COOKIE));
        }
    }

    #[test]
    fn test_is_mismatch_does_not_consume() {
        let ctx = InMemoryRequestContext::new().with_cookie(COOKIE, "abc");

        assert!(!token().is_mismatch(&ctx, Some("abc")));
        assert!(token().is_mismatch(&ctx, Some("xyz")));
        assert!(token().is_mismatch(&ctx, None));
        assert_eq!(ctx.cookie(COOKIE), Some("abc".to_string()));
    }
}

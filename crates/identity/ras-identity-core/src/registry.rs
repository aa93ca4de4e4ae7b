//! Named driver factories.

use crate::{IdentityError, IdentityResult};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use tracing::debug;

/// Builds a driver for one request from the request context and the raw
/// driver configuration.
pub type DriverFactory<C, D> =
    Arc<dyn Fn(C, &serde_json::Value) -> IdentityResult<Box<D>> + Send + Sync>;

/// Registry of driver factories keyed by provider name.
///
/// `C` is the per-request context handed to every factory and `D` is the
/// (usually unsized) driver interface the host talks to.
pub struct DriverRegistry<C, D: ?Sized> {
    factories: HashMap<String, DriverFactory<C, D>>,
}

impl<C, D: ?Sized> DriverRegistry<C, D> {
    pub fn new() -> Self {
        Self {
            factories: HashMap::new(),
        }
    }

    /// Register a factory under `name`, replacing any previous one.
    pub fn register<F>(&mut self, name: impl Into<String>, factory: F) -> &mut Self
    where
        F: Fn(C, &serde_json::Value) -> IdentityResult<Box<D>> + Send + Sync + 'static,
    {
        let name = name.into();
        debug!("Registering driver factory: {}", name);
        self.factories.insert(name, Arc::new(factory));
        self
    }

    pub fn contains(&self, name: &str) -> bool {
        self.factories.contains_key(name)
    }

    /// Registered provider names, sorted.
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.factories.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    /// Build the driver registered under `name`.
    pub fn create(
        &self,
        name: &str,
        context: C,
        config: &serde_json::Value,
    ) -> IdentityResult<Box<D>> {
        let factory = self
            .factories
            .get(name)
            .ok_or_else(|| IdentityError::ProviderNotFound(name.to_string()))?;
        factory(context, config)
    }
}

impl<C, D: ?Sized> Default for DriverRegistry<C, D> {
    fn default() -> Self {
        Self::new()
    }
}

impl<C, D: ?Sized> fmt::Debug for DriverRegistry<C, D> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DriverRegistry")
            .field("names", &self.names())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    trait Greeter {
        fn greet(&self) -> String;
    }

    struct Fixed {
        prefix: String,
        who: String,
    }

    impl Greeter for Fixed {
        fn greet(&self) -> String {
            format!("{} {}", self.prefix, self.who)
        }
    }

    fn registry() -> DriverRegistry<String, dyn Greeter> {
        let mut registry: DriverRegistry<String, dyn Greeter> = DriverRegistry::new();
        registry.register("hello", |who: String, config: &serde_json::Value| {
            let prefix = config
                .get("prefix")
                .and_then(|v| v.as_str())
                .ok_or_else(|| IdentityError::InvalidConfig("missing prefix".to_string()))?;
            Ok(Box::new(Fixed {
                prefix: prefix.to_string(),
                who,
            }) as Box<dyn Greeter>)
        });
        registry
    }

    #[test]
    fn test_create_registered_driver() {
        let registry = registry();
        let driver = registry
            .create("hello", "world".to_string(), &serde_json::json!({"prefix": "hi"}))
            .unwrap();

        assert_eq!(driver.greet(), "hi world");
        assert!(registry.contains("hello"));
        assert_eq!(registry.names(), vec!["hello"]);
    }

    #[test]
    fn test_unknown_driver() {
        let registry = registry();
        let result = registry.create("missing", "world".to_string(), &serde_json::json!({}));

        assert!(matches!(result, Err(IdentityError::ProviderNotFound(name)) if name == "missing"));
    }

    #[test]
    fn test_factory_errors_are_returned() {
        let registry = registry();
        let result = registry.create("hello", "world".to_string(), &serde_json::json!({}));

        assert!(matches!(result, Err(IdentityError::InvalidConfig(_))));
    }
}

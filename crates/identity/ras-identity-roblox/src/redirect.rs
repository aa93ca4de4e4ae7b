//! Authorization redirect URL construction.

use crate::error::OAuth2Result;
use url::Url;

/// Caller hook for adjusting the redirect request before the URL is built.
pub type RedirectCustomizer<'a> = Box<dyn FnOnce(&mut RedirectRequest) + Send + 'a>;

/// Builder for the authorization URL the user agent is sent to.
///
/// Scopes and extra query parameters are freely adjustable. The parameters
/// identifying the client and the attempt (`client_id`, `redirect_uri`,
/// `state`) are fixed when the URL is built and cannot be overridden.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RedirectRequest {
    base_url: String,
    scope_param: String,
    scope_separator: String,
    scopes: Vec<String>,
    params: Vec<(String, String)>,
}

impl RedirectRequest {
    pub fn new(
        base_url: impl Into<String>,
        scope_param: impl Into<String>,
        scope_separator: impl Into<String>,
    ) -> Self {
        Self {
            base_url: base_url.into(),
            scope_param: scope_param.into(),
            scope_separator: scope_separator.into(),
            scopes: Vec::new(),
            params: Vec::new(),
        }
    }

    /// Replace the requested scopes.
    pub fn scopes<I, S>(&mut self, scopes: I) -> &mut Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.scopes = scopes.into_iter().map(Into::into).collect();
        self
    }

    /// Add scopes, skipping ones already requested.
    pub fn merge_scopes<I, S>(&mut self, scopes: I) -> &mut Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        for scope in scopes {
            let scope = scope.into();
            if !self.scopes.contains(&scope) {
                self.scopes.push(scope);
            }
        }
        self
    }

    pub fn param(&mut self, name: impl Into<String>, value: impl Into<String>) -> &mut Self {
        let name = name.into();
        let value = value.into();
        match self.params.iter_mut().find(|(n, _)| *n == name) {
            Some((_, existing)) => *existing = value,
            None => self.params.push((name, value)),
        }
        self
    }

    pub fn clear_param(&mut self, name: &str) -> &mut Self {
        self.params.retain(|(n, _)| n != name);
        self
    }

    pub fn requested_scopes(&self) -> &[String] {
        &self.scopes
    }

    pub fn params(&self) -> &[(String, String)] {
        &self.params
    }

    /// Build the final URL. `fixed` parameters are appended after the custom
    /// ones and replace any custom parameter of the same name; the scope
    /// parameter goes right before the last fixed parameter (the state).
    pub fn build(&self, fixed: &[(&str, &str)]) -> OAuth2Result<String> {
        let mut url = Url::parse(&self.base_url)?;
        let scope = self.scopes.join(&self.scope_separator);

        {
            let mut query = url.query_pairs_mut();

            for (name, value) in &self.params {
                let overridden = name == &self.scope_param
                    || fixed.iter().any(|(fixed_name, _)| *fixed_name == name.as_str());
                if !overridden {
                    query.append_pair(name, value);
                }
            }

            let (last, leading) = match fixed.split_last() {
                Some((last, leading)) => (Some(last), leading),
                None => (None, fixed),
            };

            for (name, value) in leading {
                query.append_pair(name, value);
            }
            if !scope.is_empty() {
                query.append_pair(&self.scope_param, &scope);
            }
            if let Some((name, value)) = last {
                query.append_pair(name, value);
            }
        }

        Ok(url.to_string())
    }
}

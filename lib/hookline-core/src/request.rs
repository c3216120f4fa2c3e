//! Request configuration.
//!
//! [`RequestConfig`] is the mutable description of a request as it flows
//! through request interceptors. [`RequestOptions`] is the override bag
//! accepted by the verb helpers (`get`, `post`, ...); it cannot carry a
//! method, URL or body, so those stay under the helper's control.
//!
//! # Example
//!
//! ```
//! use hookline_core::{Method, RequestConfig};
//! use std::time::Duration;
//!
//! let config = RequestConfig::new(Method::Get, "/users")
//!     .param("page", "1")
//!     .header("Accept", "application/json")
//!     .timeout(Duration::from_secs(2));
//!
//! assert_eq!(config.url, "/users");
//! assert_eq!(config.params, vec![("page".to_string(), "1".to_string())]);
//! ```

use std::collections::HashMap;
use std::time::Duration;

use serde_json::Value;

use crate::Method;

/// Description of a single request, as seen by request interceptors.
///
/// Every field is public: interceptors receive the config by value and
/// return the config that replaces it for all downstream stages. Cloning
/// copies `headers` and `params`, so a derived request never aliases the
/// caller's maps.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RequestConfig {
    /// HTTP method. Defaults to GET.
    pub method: Method,
    /// Request URL, relative to the client's base URL when one is set.
    pub url: String,
    /// JSON payload. `None` means no body is sent.
    pub data: Option<Value>,
    /// Query parameters, encoded in insertion order.
    pub params: Vec<(String, String)>,
    /// Per-call headers. These take precedence over the client defaults.
    pub headers: HashMap<String, String>,
    /// Per-call timeout. Falls back to the client timeout when `None`.
    pub timeout: Option<Duration>,
}

impl RequestConfig {
    /// Creates a config for `method` and `url`.
    #[must_use]
    pub fn new(method: Method, url: impl Into<String>) -> Self {
        Self {
            method,
            url: url.into(),
            ..Self::default()
        }
    }

    /// Shorthand for a GET config.
    #[must_use]
    pub fn get(url: impl Into<String>) -> Self {
        Self::new(Method::Get, url)
    }

    /// Sets the method.
    #[must_use]
    pub const fn method(mut self, method: Method) -> Self {
        self.method = method;
        self
    }

    /// Sets the JSON payload. A JSON `null` clears it.
    #[must_use]
    pub fn data(mut self, data: Value) -> Self {
        self.data = (!data.is_null()).then_some(data);
        self
    }

    /// Serializes `value` and sets it as the JSON payload.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn json<T: serde::Serialize + ?Sized>(self, value: &T) -> crate::Result<Self> {
        let data = serde_json::to_value(value)?;
        Ok(self.data(data))
    }

    /// Appends a query parameter.
    #[must_use]
    pub fn param(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.params.push((name.into(), value.into()));
        self
    }

    /// Sets a header, replacing any previous value under the same name
    /// (compared case-insensitively).
    #[must_use]
    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        insert_header(&mut self.headers, name, value);
        self
    }

    /// Sets the timeout.
    #[must_use]
    pub const fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Single header value by name, case-insensitive.
    #[must_use]
    pub fn header_value(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }

    /// Applies verb-helper overrides on top of this config.
    ///
    /// Params are appended after existing ones; headers replace same-named
    /// entries; a timeout in `options` wins.
    #[must_use]
    pub fn with_options(mut self, options: RequestOptions) -> Self {
        self.params.extend(options.params);
        for (name, value) in options.headers {
            insert_header(&mut self.headers, name, value);
        }
        if options.timeout.is_some() {
            self.timeout = options.timeout;
        }
        self
    }
}

/// Per-call overrides accepted by the verb helpers.
///
/// There is deliberately no method, URL or data here: the helper decides those.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RequestOptions {
    /// Query parameters, encoded in insertion order.
    pub params: Vec<(String, String)>,
    /// Per-call headers.
    pub headers: HashMap<String, String>,
    /// Per-call timeout.
    pub timeout: Option<Duration>,
}

impl RequestOptions {
    /// Creates empty options.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a query parameter.
    #[must_use]
    pub fn param(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.params.push((name.into(), value.into()));
        self
    }

    /// Sets a header.
    #[must_use]
    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        insert_header(&mut self.headers, name, value);
        self
    }

    /// Sets the timeout.
    #[must_use]
    pub const fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }
}

/// Inserts a header, first removing any entry whose name matches
/// case-insensitively.
pub fn insert_header(
    headers: &mut HashMap<String, String>,
    name: impl Into<String>,
    value: impl Into<String>,
) {
    let name = name.into();
    headers.retain(|key, _| !key.eq_ignore_ascii_case(&name));
    headers.insert(name, value.into());
}

/// Builds the final request URL.
///
/// The base URL and `url` are concatenated verbatim, without any slash
/// normalization. Non-empty `params` are appended after a `?` as an
/// `application/x-www-form-urlencoded` query string, in iteration order.
/// Malformed URLs are left for the transport to reject.
///
/// # Example
///
/// ```
/// use hookline_core::build_url;
///
/// let params = vec![("a".to_string(), "1".to_string()), ("b".to_string(), "2".to_string())];
/// let url = build_url(Some("https://api.test"), "/users", &params);
/// assert_eq!(url, "https://api.test/users?a=1&b=2");
/// ```
#[must_use]
pub fn build_url(base_url: Option<&str>, url: &str, params: &[(String, String)]) -> String {
    let mut full = match base_url {
        Some(base) => format!("{base}{url}"),
        None => url.to_string(),
    };

    if !params.is_empty() {
        let query = url::form_urlencoded::Serializer::new(String::new())
            .extend_pairs(params)
            .finish();
        full.push('?');
        full.push_str(&query);
    }

    full
}

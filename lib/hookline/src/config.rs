//! Client configuration types.

use std::collections::HashMap;
use std::time::Duration;

use hookline_core::{JSON_CONTENT_TYPE, insert_header};

/// Timeout applied when neither the request nor the client sets one.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// Instance-level configuration: base URL, default headers and timeout.
///
/// Used by [`crate::Client::with_transport`], [`crate::Client::create`] and
/// the [`crate::ClientBuilder`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    /// Prefix concatenated verbatim in front of every request URL.
    pub base_url: Option<String>,
    /// Headers sent with every request unless overridden per call.
    ///
    /// A client built from this config always carries a `Content-Type`;
    /// these entries are merged over the default one.
    pub headers: HashMap<String, String>,
    /// Timeout for requests that do not set their own.
    pub timeout: Duration,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: None,
            headers: default_headers(),
            timeout: DEFAULT_TIMEOUT,
        }
    }
}

impl ClientConfig {
    /// Create a new configuration builder.
    #[must_use]
    pub fn builder() -> ClientConfigBuilder {
        ClientConfigBuilder::default()
    }
}

fn default_headers() -> HashMap<String, String> {
    HashMap::from([("Content-Type".to_string(), JSON_CONTENT_TYPE.to_string())])
}

/// Applies `headers` in order over the default `Content-Type`; a later name
/// replaces any earlier one differing only in case.
pub(crate) fn over_default_headers(
    headers: impl IntoIterator<Item = (String, String)>,
) -> HashMap<String, String> {
    let mut merged = default_headers();
    for (name, value) in headers {
        insert_header(&mut merged, name, value);
    }
    merged
}

/// Builder for [`ClientConfig`].
///
/// Headers given here are merged over the default `Content-Type:
/// application/json`; a header with the same name (any case) replaces it.
#[derive(Debug, Clone, Default)]
pub struct ClientConfigBuilder {
    base_url: Option<String>,
    headers: Vec<(String, String)>,
    timeout: Option<Duration>,
}

impl ClientConfigBuilder {
    /// Set the base URL.
    #[must_use]
    pub fn base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = Some(base_url.into());
        self
    }

    /// Add a default header.
    #[must_use]
    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    /// Add several default headers.
    #[must_use]
    pub fn headers(mut self, headers: impl IntoIterator<Item = (String, String)>) -> Self {
        self.headers.extend(headers);
        self
    }

    /// Set the default request timeout.
    #[must_use]
    pub const fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Build the configuration.
    #[must_use]
    pub fn build(self) -> ClientConfig {
        ClientConfig {
            base_url: self.base_url,
            headers: over_default_headers(self.headers),
            timeout: self.timeout.unwrap_or(DEFAULT_TIMEOUT),
        }
    }
}

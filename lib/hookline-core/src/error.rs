//! Error types for hookline.
//!
//! Every failure of a request pass is one [`Error`] variant, so error
//! interceptors can tell an HTTP error from a timeout or a decode failure by
//! matching instead of probing a dynamic value.

use derive_more::{Display, Error, From};
use http::HeaderMap;
use serde_json::Value;

use crate::RequestConfig;

// ============================================================================
// HTTP Error
// ============================================================================

/// A non-2xx response, normalized.
#[derive(Debug, Clone, Display)]
#[display("HTTP error {status}: {status_text}")]
pub struct HttpError {
    /// HTTP status code.
    pub status: u16,
    /// Status reason phrase.
    pub status_text: String,
    /// Best-effort decoded body; an empty object when absent or not JSON.
    pub data: Value,
    /// Response headers.
    pub headers: HeaderMap,
    /// The request config in effect when the request failed.
    pub config: RequestConfig,
}

impl std::error::Error for HttpError {}

// ============================================================================
// Error Type
// ============================================================================

/// Main error type for hookline operations.
#[derive(Debug, Display, Error, From)]
pub enum Error {
    /// HTTP-level errors (non-2xx status codes).
    #[display("{_0}")]
    #[from(skip)]
    Http(#[error(not(source))] Box<HttpError>),

    /// The per-request timer fired before the transport answered.
    #[display("request timed out after {timeout_ms}ms")]
    #[from(skip)]
    Timeout {
        /// Effective timeout, in milliseconds.
        #[error(not(source))]
        timeout_ms: u64,
    },

    /// Network/connection errors.
    #[display("connection error: {_0}")]
    #[from(skip)]
    Connection(#[error(not(source))] String),

    /// Invalid request configuration (URL, header, method).
    #[display("invalid request: {_0}")]
    #[from(skip)]
    InvalidRequest(#[error(not(source))] String),

    /// JSON serialization error.
    #[display("JSON serialization error: {_0}")]
    #[from]
    JsonSerialization(serde_json::Error),

    /// JSON deserialization error with path context.
    #[display("JSON deserialization error at '{path}': {message}")]
    #[from(skip)]
    JsonDeserialization {
        /// JSON path to the error (e.g., "user.address.city").
        path: String,
        /// Error message.
        message: String,
    },

    /// Failure raised by a plugin's own logic.
    #[display("plugin error: {_0}")]
    #[from(skip)]
    Plugin(#[error(not(source))] String),
}

/// Result type alias using [`crate::Error`].
pub type Result<T> = std::result::Result<T, Error>;

impl From<HttpError> for Error {
    fn from(error: HttpError) -> Self {
        Self::Http(Box::new(error))
    }
}

impl Error {
    /// Create an HTTP error with an empty body and no headers.
    #[must_use]
    pub fn http(status: u16, status_text: impl Into<String>, config: RequestConfig) -> Self {
        HttpError {
            status,
            status_text: status_text.into(),
            data: Value::Object(serde_json::Map::new()),
            headers: HeaderMap::new(),
            config,
        }
        .into()
    }

    /// Create a timeout error.
    #[must_use]
    pub fn timeout(timeout: std::time::Duration) -> Self {
        Self::Timeout {
            timeout_ms: u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX),
        }
    }

    /// Create a connection error.
    #[must_use]
    pub fn connection(message: impl Into<String>) -> Self {
        Self::Connection(message.into())
    }

    /// Create an invalid request error.
    #[must_use]
    pub fn invalid_request(message: impl Into<String>) -> Self {
        Self::InvalidRequest(message.into())
    }

    /// Create a JSON deserialization error with path context.
    #[must_use]
    pub fn json_deserialization(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self::JsonDeserialization {
            path: path.into(),
            message: message.into(),
        }
    }

    /// Create a plugin error.
    #[must_use]
    pub fn plugin(message: impl Into<String>) -> Self {
        Self::Plugin(message.into())
    }

    /// Returns `true` if this is a timeout error.
    #[must_use]
    pub const fn is_timeout(&self) -> bool {
        matches!(self, Self::Timeout { .. })
    }

    /// Returns `true` if this is a connection error.
    #[must_use]
    pub const fn is_connection(&self) -> bool {
        matches!(self, Self::Connection(_))
    }

    /// The HTTP error details, if this is an HTTP error.
    #[must_use]
    pub fn http_error(&self) -> Option<&HttpError> {
        match self {
            Self::Http(error) => Some(error),
            _ => None,
        }
    }

    /// Returns the HTTP status code if this is an HTTP error.
    #[must_use]
    pub fn status(&self) -> Option<u16> {
        self.http_error().map(|error| error.status)
    }

    /// Returns `true` if this is a 401 Unauthorized error.
    #[must_use]
    pub fn is_unauthorized(&self) -> bool {
        self.status() == Some(401)
    }

    /// Returns `true` if this is a client error (4xx).
    #[must_use]
    pub fn is_client_error(&self) -> bool {
        self.status().is_some_and(|s| (400..500).contains(&s))
    }

    /// Returns `true` if this is a server error (5xx).
    #[must_use]
    pub fn is_server_error(&self) -> bool {
        self.status().is_some_and(|s| (500..600).contains(&s))
    }

    /// The request config that failed, if this is an HTTP error.
    #[must_use]
    pub fn config(&self) -> Option<&RequestConfig> {
        self.http_error().map(|error| &error.config)
    }

    /// Try to decode the HTTP error body into a typed value.
    ///
    /// Returns `None` if this is not an HTTP error.
    ///
    /// # Example
    ///
    /// ```ignore
    /// #[derive(Debug, Deserialize)]
    /// struct ApiError {
    ///     code: String,
    /// }
    ///
    /// if let Err(e) = client.get::<User>("/users/1", RequestOptions::new()).await {
    ///     if let Some(Ok(api_error)) = e.decode_body::<ApiError>() {
    ///         println!("API error: {}", api_error.code);
    ///     }
    /// }
    /// ```
    pub fn decode_body<T: serde::de::DeserializeOwned>(&self) -> Option<Result<T>> {
        self.http_error()
            .map(|error| crate::decode_value(error.data.clone()))
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use serde_json::json;

    use super::*;

    #[test]
    fn error_display() {
        let err = Error::http(404, "Not Found", RequestConfig::get("/x"));
        assert_eq!(err.to_string(), "HTTP error 404: Not Found");

        let err = Error::timeout(Duration::from_millis(1500));
        assert_eq!(err.to_string(), "request timed out after 1500ms");

        let err = Error::connection("failed to connect");
        assert_eq!(err.to_string(), "connection error: failed to connect");

        let err = Error::plugin("no refresh token available");
        assert_eq!(err.to_string(), "plugin error: no refresh token available");

        let err = Error::json_deserialization("user.address.city", "missing field `city`");
        assert_eq!(
            err.to_string(),
            "JSON deserialization error at 'user.address.city': missing field `city`"
        );
    }

    #[test]
    fn error_status() {
        let err = Error::http(401, "Unauthorized", RequestConfig::get("/me"));
        assert_eq!(err.status(), Some(401));
        assert!(err.is_unauthorized());
        assert!(err.is_client_error());
        assert!(!err.is_server_error());

        let err = Error::http(503, "Service Unavailable", RequestConfig::get("/me"));
        assert!(err.is_server_error());
        assert!(!err.is_unauthorized());

        let err = Error::timeout(Duration::from_secs(1));
        assert_eq!(err.status(), None);
        assert!(!err.is_client_error());
    }

    #[test]
    fn error_kind_checks() {
        assert!(Error::timeout(Duration::from_millis(1)).is_timeout());
        assert!(Error::connection("refused").is_connection());
        assert!(!Error::connection("refused").is_timeout());
    }

    #[test]
    fn error_config_echoes_request() {
        let config = RequestConfig::get("/me").header("Authorization", "Bearer old");
        let err = Error::http(401, "Unauthorized", config.clone());
        assert_eq!(err.config(), Some(&config));
        assert!(Error::plugin("x").config().is_none());
    }

    #[test]
    fn error_decode_body() {
        #[derive(Debug, PartialEq, serde::Deserialize)]
        struct ApiError {
            error: String,
        }

        let err: Error = HttpError {
            status: 400,
            status_text: "Bad Request".to_string(),
            data: json!({"error": "bad input"}),
            headers: HeaderMap::new(),
            config: RequestConfig::get("/x"),
        }
        .into();

        let decoded = err
            .decode_body::<ApiError>()
            .expect("http error")
            .expect("decodes");
        assert_eq!(
            decoded,
            ApiError {
                error: "bad input".to_string()
            }
        );

        assert!(Error::connection("x").decode_body::<ApiError>().is_none());
    }
}

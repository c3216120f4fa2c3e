//! HTTP response types.
//!
//! - [`RawResponse`] is what a [`crate::Transport`] hands back: status, headers, bytes.
//! - [`Response`] is what the pipeline produces: decoded data plus the config that
//!   produced it.

use bytes::Bytes;
use http::HeaderMap;
use serde_json::Value;

use crate::RequestConfig;

// ============================================================================
// Raw Response
// ============================================================================

/// Undecoded response as returned by a transport.
#[derive(Debug, Clone)]
pub struct RawResponse {
    status: u16,
    status_text: String,
    headers: HeaderMap,
    body: Bytes,
}

impl RawResponse {
    /// Creates a raw response.
    #[must_use]
    pub fn new(
        status: u16,
        status_text: impl Into<String>,
        headers: HeaderMap,
        body: impl Into<Bytes>,
    ) -> Self {
        Self {
            status,
            status_text: status_text.into(),
            headers,
            body: body.into(),
        }
    }

    /// HTTP status code.
    #[must_use]
    pub const fn status(&self) -> u16 {
        self.status
    }

    /// Status reason phrase.
    #[must_use]
    pub fn status_text(&self) -> &str {
        &self.status_text
    }

    /// Response headers.
    #[must_use]
    pub const fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    /// Response body.
    #[must_use]
    pub const fn body(&self) -> &Bytes {
        &self.body
    }

    /// Status is 2xx.
    #[must_use]
    pub const fn is_success(&self) -> bool {
        self.status >= 200 && self.status < 300
    }

    /// Consume into (status, status text, headers, body).
    #[must_use]
    pub fn into_parts(self) -> (u16, String, HeaderMap, Bytes) {
        (self.status, self.status_text, self.headers, self.body)
    }
}

// ============================================================================
// Decoded Response
// ============================================================================

/// Decoded response flowing through response interceptors.
///
/// `config` echoes the request config *after* request interceptors ran.
#[derive(Debug, Clone)]
pub struct Response<T = Value> {
    /// Decoded body.
    pub data: T,
    /// HTTP status code.
    pub status: u16,
    /// Status reason phrase.
    pub status_text: String,
    /// Response headers (case-insensitive lookup).
    pub headers: HeaderMap,
    /// The request config that produced this response.
    pub config: RequestConfig,
}

impl<T> Response<T> {
    /// Status is 2xx.
    #[must_use]
    pub const fn is_success(&self) -> bool {
        self.status >= 200 && self.status < 300
    }

    /// Single header value by name, case-insensitive.
    #[must_use]
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|value| value.to_str().ok())
    }

    /// Transform the data with a function.
    pub fn map_data<F, U>(self, f: F) -> Response<U>
    where
        F: FnOnce(T) -> U,
    {
        Response {
            data: f(self.data),
            status: self.status,
            status_text: self.status_text,
            headers: self.headers,
            config: self.config,
        }
    }
}

impl Response<Value> {
    /// Decode the JSON data into a typed payload.
    ///
    /// # Errors
    ///
    /// Returns a deserialization error naming the offending JSON path.
    pub fn decode<T: serde::de::DeserializeOwned>(self) -> crate::Result<Response<T>> {
        let data = crate::decode_value(self.data)?;
        Ok(Response {
            data,
            status: self.status,
            status_text: self.status_text,
            headers: self.headers,
            config: self.config,
        })
    }

    /// String field of the JSON data, if the data is an object holding one.
    #[must_use]
    pub fn data_str(&self, field: &str) -> Option<&str> {
        self.data.get(field).and_then(Value::as_str)
    }
}

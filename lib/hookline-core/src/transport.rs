//! Transport abstraction.
//!
//! A [`Transport`] performs one network round-trip for a fully-resolved
//! [`TransportRequest`]. It knows nothing about interceptors, base URLs or
//! default headers; the client resolves all of that before calling it.
//!
//! Implement [`Transport`] to plug in a custom HTTP stack or a test double.

use std::future::Future;
use std::pin::Pin;

use bytes::Bytes;
use http::HeaderMap;
use tokio_util::sync::CancellationToken;

use crate::{Method, RawResponse, Result};

/// A boxed, sendable future.
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// Fully-resolved request handed to a [`Transport`].
#[derive(Debug, Clone)]
pub struct TransportRequest {
    /// HTTP method.
    pub method: Method,
    /// Absolute URL, including the query string.
    pub url: String,
    /// Merged headers.
    pub headers: HeaderMap,
    /// Encoded body, if any.
    pub body: Option<Bytes>,
    /// Fired when the request's timeout expires.
    ///
    /// The client also drops the pending `send` future at that point; the
    /// token lets transports that hand work to other tasks stop it too.
    pub cancellation: CancellationToken,
}

/// Low-level HTTP execution.
///
/// Non-2xx statuses are *not* errors at this level: return them as a
/// [`RawResponse`]. Errors are reserved for failures to obtain a response
/// at all (connection refused, TLS failure, malformed URL).
pub trait Transport: Send + Sync + 'static {
    /// Send the request and return the undecoded response.
    fn send(&self, request: TransportRequest) -> BoxFuture<'_, Result<RawResponse>>;
}

impl<T: Transport + ?Sized> Transport for std::sync::Arc<T> {
    fn send(&self, request: TransportRequest) -> BoxFuture<'_, Result<RawResponse>> {
        (**self).send(request)
    }
}

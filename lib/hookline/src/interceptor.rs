//! Request/response interceptors.
//!
//! A client keeps three ordered, append-only handler lists:
//!
//! - request handlers transform the [`RequestConfig`] before it is sent;
//! - response handlers transform a successful [`Response`];
//! - error handlers see every failure and may recover from it.
//!
//! Handlers run strictly in registration order. Each one receives what the
//! previous one produced. An error handler that returns `Ok` ends the chain
//! and its response becomes the result of the request; one that returns
//! `Err` passes that error on to the next handler.
//!
//! Implement the traits for stateful handlers, or wrap async closures with
//! [`request_fn`], [`response_fn`] and [`error_fn`]:
//!
//! ```ignore
//! use hookline::interceptor::{error_fn, request_fn};
//!
//! client
//!     .intercept_request(request_fn(|config| async move {
//!         Ok(config.header("X-Request-Source", "docs"))
//!     }))
//!     .intercept_error(error_fn(|_client, error| async move { Err(error) }));
//! ```

use std::future::Future;
use std::sync::{Arc, PoisonError, RwLock};

use hookline_core::BoxFuture;

use crate::{Client, Error, RequestConfig, Response, Result};

// ============================================================================
// Interceptor Traits
// ============================================================================

/// Transforms a request config before it reaches the transport.
pub trait RequestInterceptor: Send + Sync + 'static {
    /// Return the config to use for all later stages.
    ///
    /// Returning an error skips the transport and enters the error chain.
    fn intercept(&self, config: RequestConfig) -> BoxFuture<'_, Result<RequestConfig>>;
}

/// Transforms a successful response.
pub trait ResponseInterceptor: Send + Sync + 'static {
    /// Return the response to hand to the next handler.
    fn intercept(&self, response: Response) -> BoxFuture<'_, Result<Response>>;
}

/// Handles a failed request.
pub trait ErrorInterceptor: Send + Sync + 'static {
    /// Recover with `Ok(response)`, or pass an error on with `Err`.
    ///
    /// `client` is the instance the request was made through, so a handler
    /// can issue follow-up requests (e.g. a retry).
    fn intercept<'a>(&'a self, client: &'a Client, error: Error)
    -> BoxFuture<'a, Result<Response>>;
}

// ============================================================================
// Closure Adapters
// ============================================================================

/// Request interceptor backed by an async closure. See [`request_fn`].
#[derive(Debug, Clone, Copy)]
pub struct RequestFn<F>(F);

/// Wrap an async closure as a [`RequestInterceptor`].
pub fn request_fn<F, Fut>(f: F) -> RequestFn<F>
where
    F: Fn(RequestConfig) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<RequestConfig>> + Send + 'static,
{
    RequestFn(f)
}

impl<F, Fut> RequestInterceptor for RequestFn<F>
where
    F: Fn(RequestConfig) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<RequestConfig>> + Send + 'static,
{
    fn intercept(&self, config: RequestConfig) -> BoxFuture<'_, Result<RequestConfig>> {
        Box::pin((self.0)(config))
    }
}

/// Response interceptor backed by an async closure. See [`response_fn`].
#[derive(Debug, Clone, Copy)]
pub struct ResponseFn<F>(F);

/// Wrap an async closure as a [`ResponseInterceptor`].
pub fn response_fn<F, Fut>(f: F) -> ResponseFn<F>
where
    F: Fn(Response) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<Response>> + Send + 'static,
{
    ResponseFn(f)
}

impl<F, Fut> ResponseInterceptor for ResponseFn<F>
where
    F: Fn(Response) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<Response>> + Send + 'static,
{
    fn intercept(&self, response: Response) -> BoxFuture<'_, Result<Response>> {
        Box::pin((self.0)(response))
    }
}

/// Error interceptor backed by an async closure. See [`error_fn`].
#[derive(Debug, Clone, Copy)]
pub struct ErrorFn<F>(F);

/// Wrap an async closure as an [`ErrorInterceptor`].
///
/// The closure receives a cloned [`Client`] handle to the instance the
/// request was made through.
pub fn error_fn<F, Fut>(f: F) -> ErrorFn<F>
where
    F: Fn(Client, Error) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<Response>> + Send + 'static,
{
    ErrorFn(f)
}

impl<F, Fut> ErrorInterceptor for ErrorFn<F>
where
    F: Fn(Client, Error) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<Response>> + Send + 'static,
{
    fn intercept<'a>(
        &'a self,
        client: &'a Client,
        error: Error,
    ) -> BoxFuture<'a, Result<Response>> {
        Box::pin((self.0)(client.clone(), error))
    }
}

// ============================================================================
// Registry
// ============================================================================

type Chain<T> = RwLock<Vec<Arc<T>>>;

/// The three handler chains of one client instance.
#[derive(Default)]
pub(crate) struct Interceptors {
    request: Chain<dyn RequestInterceptor>,
    response: Chain<dyn ResponseInterceptor>,
    error: Chain<dyn ErrorInterceptor>,
}

impl std::fmt::Debug for Interceptors {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Interceptors")
            .field("request", &snapshot(&self.request).len())
            .field("response", &snapshot(&self.response).len())
            .field("error", &snapshot(&self.error).len())
            .finish()
    }
}

// Handlers registered while a phase is running apply from the next request on.
fn snapshot<T: ?Sized>(chain: &Chain<T>) -> Vec<Arc<T>> {
    chain
        .read()
        .unwrap_or_else(PoisonError::into_inner)
        .clone()
}

fn push<T: ?Sized>(chain: &Chain<T>, handler: Arc<T>) {
    chain
        .write()
        .unwrap_or_else(PoisonError::into_inner)
        .push(handler);
}

impl Interceptors {
    pub(crate) fn push_request(&self, handler: Arc<dyn RequestInterceptor>) {
        push(&self.request, handler);
    }

    pub(crate) fn push_response(&self, handler: Arc<dyn ResponseInterceptor>) {
        push(&self.response, handler);
    }

    pub(crate) fn push_error(&self, handler: Arc<dyn ErrorInterceptor>) {
        push(&self.error, handler);
    }

    pub(crate) async fn apply_request(&self, mut config: RequestConfig) -> Result<RequestConfig> {
        for handler in snapshot(&self.request) {
            config = handler.intercept(config).await?;
        }
        Ok(config)
    }

    pub(crate) async fn apply_response(&self, mut response: Response) -> Result<Response> {
        for handler in snapshot(&self.response) {
            response = handler.intercept(response).await?;
        }
        Ok(response)
    }

    pub(crate) async fn apply_error(&self, client: &Client, mut error: Error) -> Result<Response> {
        for handler in snapshot(&self.error) {
            match handler.intercept(client, error).await {
                Ok(response) => return Ok(response),
                Err(next) => error = next,
            }
        }
        Err(error)
    }
}

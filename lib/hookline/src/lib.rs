//! Async HTTP client with interceptors and plugins.
//!
//! Every request runs through three ordered handler chains: request
//! interceptors shape the outgoing [`RequestConfig`], response interceptors
//! see successful [`Response`]s, and error interceptors see every failure
//! and may recover from it. Plugins bundle interceptors into reusable units
//! that follow a client into every instance derived with [`Client::create`].
//!
//! # Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use hookline::prelude::*;
//!
//! #[derive(Debug, Deserialize)]
//! pub struct User {
//!     id: u64,
//!     name: String,
//! }
//!
//! let store = Arc::new(MemoryTokenStore::new());
//! let client = Client::builder()
//!     .base_url("https://api.example.com")
//!     .plugin(AuthPlugin::builder(Arc::clone(&store)).build())
//!     .build();
//!
//! client.intercept_request(request_fn(|config| async move {
//!     Ok(config.header("X-Request-Source", "example"))
//! }));
//!
//! let user: Response<User> = client.get("/users/42", RequestOptions::new()).await?;
//! ```

mod client;
mod config;
pub mod interceptor;
mod plugin;
pub mod plugins;
pub mod prelude;
mod service;
mod transport;

pub use client::{Client, ClientBuilder};
pub use config::{ClientConfig, ClientConfigBuilder, DEFAULT_TIMEOUT};
pub use interceptor::{ErrorInterceptor, RequestInterceptor, ResponseInterceptor};
pub use plugin::Plugin;
pub use service::ServiceTransport;
pub use transport::{DEFAULT_POOL_IDLE_TIMEOUT, DEFAULT_POOL_MAX_IDLE_PER_HOST, HyperTransport};

// Re-export tower for transport composition
pub use tower;

// Re-export core types
pub use hookline_core::{
    BoxFuture, CancellationToken, Error, HttpError, JSON_CONTENT_TYPE, Method, RawResponse,
    RequestConfig, RequestOptions, Response, Result, Transport, TransportRequest, build_url,
    from_json, to_json,
};

// Re-export http types for status codes and headers
pub use hookline_core::{HeaderMap, StatusCode, header};

//! Tower integration: use any `tower::Service` as a [`Transport`].
//!
//! This lets tower layers (concurrency limits, buffers, custom routing)
//! sit between the client pipeline and the network:
//!
//! ```ignore
//! use hookline::{Client, HyperTransport, ServiceTransport};
//! use tower::ServiceBuilder;
//!
//! let service = ServiceBuilder::new()
//!     .concurrency_limit(8)
//!     .service(HyperTransport::new());
//!
//! let client = Client::builder()
//!     .transport(ServiceTransport::new(service))
//!     .build();
//! ```

use std::sync::{Mutex, PoisonError};

use hookline_core::{BoxFuture, RawResponse, TransportRequest};
use tower::ServiceExt;
use tower_service::Service;

use crate::{Error, Result, Transport};

/// Adapter from a cloneable tower service to [`Transport`].
///
/// The service sits behind a mutex so that `!Sync` services work. Each
/// request locks, clones the service, releases the lock and drives the
/// clone with `oneshot`.
#[derive(Debug)]
pub struct ServiceTransport<S> {
    service: Mutex<S>,
}

impl<S> ServiceTransport<S> {
    /// Wrap a service.
    pub const fn new(service: S) -> Self {
        Self {
            service: Mutex::new(service),
        }
    }
}

impl<S> Transport for ServiceTransport<S>
where
    S: Service<TransportRequest, Response = RawResponse> + Clone + Send + 'static,
    S::Error: Into<Error>,
    S::Future: Send,
{
    fn send(&self, request: TransportRequest) -> BoxFuture<'_, Result<RawResponse>> {
        let service = self
            .service
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone();
        Box::pin(async move { service.oneshot(request).await.map_err(Into::into) })
    }
}

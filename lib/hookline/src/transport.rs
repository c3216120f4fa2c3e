//! Default transport: hyper-util client over rustls.

use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll};
use std::time::Duration;

use bytes::Bytes;
use http_body_util::{BodyExt, Full};
use hookline_core::{BoxFuture, RawResponse, TransportRequest};
use hyper_rustls::{HttpsConnector, HttpsConnectorBuilder};
use hyper_util::{
    client::legacy::{Client, connect::HttpConnector},
    rt::TokioExecutor,
};
use tower_service::Service;

use crate::{Error, Result, Transport};

/// Idle pooled connections are closed after this long.
pub const DEFAULT_POOL_IDLE_TIMEOUT: Duration = Duration::from_secs(90);

/// Maximum idle connections kept per host.
pub const DEFAULT_POOL_MAX_IDLE_PER_HOST: usize = 32;

/// HTTP/1.1 and HTTP/2 over TLS with the Mozilla root certificates;
/// plain `http://` is allowed.
fn https_connector() -> HttpsConnector<HttpConnector> {
    let root_store: rustls::RootCertStore =
        webpki_roots::TLS_SERVER_ROOTS.iter().cloned().collect();

    let tls_config = rustls::ClientConfig::builder()
        .with_root_certificates(root_store)
        .with_no_client_auth();

    HttpsConnectorBuilder::new()
        .with_tls_config(tls_config)
        .https_or_http()
        .enable_http1()
        .enable_http2()
        .build()
}

/// Connection-pooling transport backed by hyper-util.
///
/// Clones share the same connection pool.
#[derive(Clone)]
pub struct HyperTransport {
    inner: Client<HttpsConnector<HttpConnector>, Full<Bytes>>,
}

impl std::fmt::Debug for HyperTransport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HyperTransport").finish_non_exhaustive()
    }
}

impl Default for HyperTransport {
    fn default() -> Self {
        Self::new()
    }
}

impl HyperTransport {
    /// Create a transport with default pool settings.
    #[must_use]
    pub fn new() -> Self {
        Self::with_pool(DEFAULT_POOL_IDLE_TIMEOUT, DEFAULT_POOL_MAX_IDLE_PER_HOST)
    }

    /// Create a transport with custom pool settings.
    #[must_use]
    pub fn with_pool(idle_timeout: Duration, max_idle_per_host: usize) -> Self {
        let inner = Client::builder(TokioExecutor::new())
            .pool_idle_timeout(idle_timeout)
            .pool_max_idle_per_host(max_idle_per_host)
            .build(https_connector());

        Self { inner }
    }

    fn build_hyper_request(
        request: &TransportRequest,
        body: Option<Bytes>,
    ) -> Result<http::Request<Full<Bytes>>> {
        let uri: http::Uri = request
            .url
            .parse()
            .map_err(|e| Error::invalid_request(format!("invalid URL {:?}: {e}", request.url)))?;
        if uri.scheme().is_none() || uri.host().is_none() {
            return Err(Error::invalid_request(format!(
                "URL must be absolute: {:?}",
                request.url
            )));
        }

        let mut http_request = http::Request::builder()
            .method(http::Method::from(request.method))
            .uri(uri)
            .body(body.map_or_else(Full::default, Full::new))
            .map_err(|e| Error::invalid_request(e.to_string()))?;
        *http_request.headers_mut() = request.headers.clone();

        Ok(http_request)
    }

    async fn execute(&self, mut request: TransportRequest) -> Result<RawResponse> {
        let body = request.body.take();
        let hyper_request = Self::build_hyper_request(&request, body)?;
        let cancellation = request.cancellation;

        let exchange = async {
            let response = self
                .inner
                .request(hyper_request)
                .await
                .map_err(Self::map_hyper_error)?;

            let status = response.status();
            let status_text = status.canonical_reason().unwrap_or_default();
            let (parts, body) = response.into_parts();
            let body = body
                .collect()
                .await
                .map_err(|e| Error::connection(e.to_string()))?
                .to_bytes();

            Ok(RawResponse::new(status.as_u16(), status_text, parts.headers, body))
        };

        tokio::select! {
            result = exchange => result,
            () = cancellation.cancelled() => Err(Error::connection("request cancelled")),
        }
    }

    #[allow(clippy::needless_pass_by_value)]
    fn map_hyper_error(err: hyper_util::client::legacy::Error) -> Error {
        if err.is_connect() {
            return Error::connection(format!("connection failed: {err}"));
        }
        Error::connection(err.to_string())
    }
}

impl Transport for HyperTransport {
    fn send(&self, request: TransportRequest) -> BoxFuture<'_, Result<RawResponse>> {
        Box::pin(self.execute(request))
    }
}

impl Service<TransportRequest> for HyperTransport {
    type Response = RawResponse;
    type Error = Error;
    type Future = Pin<Box<dyn Future<Output = Result<RawResponse>> + Send + 'static>>;

    fn poll_ready(&mut self, _cx: &mut Context<'_>) -> Poll<Result<()>> {
        Poll::Ready(Ok(()))
    }

    fn call(&mut self, request: TransportRequest) -> Self::Future {
        let transport = self.clone();
        Box::pin(async move { transport.execute(request).await })
    }
}

#[cfg(test)]
mod tests {
    use http::HeaderMap;
    use hookline_core::{CancellationToken, Method};

    use super::*;

    fn request(url: &str) -> TransportRequest {
        TransportRequest {
            method: Method::Get,
            url: url.to_string(),
            headers: HeaderMap::new(),
            body: None,
            cancellation: CancellationToken::new(),
        }
    }

    #[test]
    fn relative_url_is_rejected() {
        let err = HyperTransport::build_hyper_request(&request("/users"), None)
            .expect_err("no scheme");
        assert!(matches!(err, Error::InvalidRequest(_)), "{err}");
    }

    #[test]
    fn builds_request_with_method_and_headers() {
        let mut req = request("https://api.test/users?page=2");
        req.method = Method::Post;
        req.headers
            .insert(http::header::AUTHORIZATION, "Bearer t".parse().expect("valid"));

        let built = HyperTransport::build_hyper_request(&req, Some(Bytes::from_static(b"{}")))
            .expect("valid request");
        assert_eq!(built.method(), http::Method::POST);
        assert_eq!(built.uri().path(), "/users");
        assert_eq!(built.uri().query(), Some("page=2"));
        assert_eq!(built.headers()["authorization"], "Bearer t");
    }

    #[tokio::test]
    async fn cancelled_request_stops() {
        let transport = HyperTransport::new();
        let req = request("http://10.255.255.1:81/unroutable");
        req.cancellation.cancel();

        let err = transport.send(req).await.expect_err("cancelled");
        assert!(err.is_connection(), "{err}");
    }
}

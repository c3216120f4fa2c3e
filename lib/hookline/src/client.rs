//! The client: request orchestration, verb helpers and plugin registry.

use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, PoisonError, RwLock};
use std::time::{Duration, Instant};

use http::{HeaderMap, HeaderName, HeaderValue};
use hookline_core::{
    CancellationToken, HttpError, RawResponse, TransportRequest, build_url, decode_error_body,
    decode_success_body, to_json,
};
use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::{Instrument, Level, debug, info, span, warn};

use crate::{
    ClientConfig, Error, HyperTransport, Method, RequestConfig, RequestOptions, Response, Result,
    Transport,
    config::{ClientConfigBuilder, over_default_headers},
    interceptor::{ErrorInterceptor, Interceptors, RequestInterceptor, ResponseInterceptor},
    plugin::Plugin,
};

// ============================================================================
// Client
// ============================================================================

/// HTTP client with interceptor chains and plugins.
///
/// `Client` is a cheap handle: cloning it shares the same instance
/// (interceptors, plugins, defaults). Use [`Client::create`] to derive an
/// independent instance that inherits the registered plugins.
///
/// # Example
///
/// ```ignore
/// use hookline::{Client, RequestOptions};
///
/// let client = Client::builder().base_url("https://api.example.com").build();
/// let user: hookline::Response<User> = client.get("/users/42", RequestOptions::new()).await?;
/// ```
#[derive(Clone)]
pub struct Client {
    inner: Arc<ClientInner>,
}

struct ClientInner {
    base_url: Option<String>,
    default_headers: HashMap<String, String>,
    timeout: Duration,
    transport: Arc<dyn Transport>,
    interceptors: Interceptors,
    plugins: RwLock<Vec<Arc<dyn Plugin>>>,
}

impl fmt::Debug for Client {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Client")
            .field("base_url", &self.inner.base_url)
            .field("default_headers", &self.inner.default_headers)
            .field("timeout", &self.inner.timeout)
            .field("interceptors", &self.inner.interceptors)
            .field("plugins", &self.plugins().len())
            .finish_non_exhaustive()
    }
}

impl Client {
    /// Create a client with default configuration over the hyper transport.
    #[must_use]
    pub fn new() -> Self {
        Self::builder().build()
    }

    /// Create a new client builder.
    #[must_use]
    pub fn builder() -> ClientBuilder {
        ClientBuilder::default()
    }

    /// Create a client over a custom transport.
    #[must_use]
    pub fn with_transport(transport: impl Transport, config: ClientConfig) -> Self {
        Self::from_parts(config, Arc::new(transport))
    }

    /// Headers of a hand-built `config` are merged over the default
    /// `Content-Type`, sorted by name so case-only duplicates resolve the
    /// same way on every run.
    fn from_parts(config: ClientConfig, transport: Arc<dyn Transport>) -> Self {
        let mut headers: Vec<_> = config.headers.into_iter().collect();
        headers.sort();

        Self {
            inner: Arc::new(ClientInner {
                base_url: config.base_url,
                default_headers: over_default_headers(headers),
                timeout: config.timeout,
                transport,
                interceptors: Interceptors::default(),
                plugins: RwLock::new(Vec::new()),
            }),
        }
    }

    /// Base URL prefixed to every request URL.
    #[must_use]
    pub fn base_url(&self) -> Option<&str> {
        self.inner.base_url.as_deref()
    }

    /// Headers sent with every request unless overridden per call.
    #[must_use]
    pub fn default_headers(&self) -> &HashMap<String, String> {
        &self.inner.default_headers
    }

    /// Timeout for requests that do not set their own.
    #[must_use]
    pub fn timeout(&self) -> Duration {
        self.inner.timeout
    }

    /// Returns `true` if both handles point to the same instance.
    #[must_use]
    pub fn same_instance(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }

    // ========================================================================
    // Interceptors
    // ========================================================================

    /// Append a request interceptor.
    pub fn intercept_request<I: RequestInterceptor>(&self, interceptor: I) -> &Self {
        self.inner.interceptors.push_request(Arc::new(interceptor));
        self
    }

    /// Append a response interceptor (success path only).
    pub fn intercept_response<I: ResponseInterceptor>(&self, interceptor: I) -> &Self {
        self.inner.interceptors.push_response(Arc::new(interceptor));
        self
    }

    /// Append an error interceptor.
    pub fn intercept_error<I: ErrorInterceptor>(&self, interceptor: I) -> &Self {
        self.inner.interceptors.push_error(Arc::new(interceptor));
        self
    }

    // ========================================================================
    // Plugins
    // ========================================================================

    /// Register a plugin and apply it to this instance immediately.
    ///
    /// The plugin is also applied to every instance created later with
    /// [`Client::create`].
    pub fn use_plugin<P: Plugin>(&self, plugin: P) {
        self.install(Arc::new(plugin));
    }

    fn install(&self, plugin: Arc<dyn Plugin>) {
        self.inner
            .plugins
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .push(Arc::clone(&plugin));
        plugin.apply(self);
    }

    fn plugins(&self) -> Vec<Arc<dyn Plugin>> {
        self.inner
            .plugins
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Derive a new instance with its own configuration.
    ///
    /// The new instance shares this client's transport, starts with empty
    /// interceptor chains, and then has every plugin registered so far
    /// applied to it in registration order. Plugins registered on either
    /// instance afterwards do not propagate.
    #[must_use]
    pub fn create(&self, config: ClientConfig) -> Self {
        let child = Self::from_parts(config, Arc::clone(&self.inner.transport));
        for plugin in self.plugins() {
            child.install(plugin);
        }
        child
    }

    // ========================================================================
    // Requests
    // ========================================================================

    /// Run a request through the full pipeline.
    ///
    /// Request interceptors, transport, then response interceptors on
    /// success. Any failure goes through the error interceptors; if one of
    /// them recovers, its response is returned instead.
    ///
    /// # Errors
    ///
    /// Returns the last error of the error chain when no interceptor
    /// recovers. A recovered response whose data does not decode into `T`
    /// is returned as [`Error::JsonDeserialization`] without running the
    /// error interceptors a second time.
    pub async fn request<T: DeserializeOwned>(
        &self,
        config: RequestConfig,
    ) -> Result<Response<T>> {
        let span = span!(
            Level::INFO,
            "http_request",
            method = %config.method,
            url = %config.url
        );

        async move {
            let result = self.dispatch(config).await;
            let error = match result.and_then(|response| response.decode()) {
                Ok(response) => return Ok(response),
                Err(error) => error,
            };

            debug!(error = %error, "request failed, running error interceptors");
            self.inner
                .interceptors
                .apply_error(self, error)
                .await
                .inspect_err(|error| warn!(error = %error, "request failed"))?
                .decode()
        }
        .instrument(span)
        .await
    }

    /// Send a GET request.
    pub async fn get<T: DeserializeOwned>(
        &self,
        url: &str,
        options: RequestOptions,
    ) -> Result<Response<T>> {
        self.request(RequestConfig::new(Method::Get, url).with_options(options))
            .await
    }

    /// Send a DELETE request.
    pub async fn delete<T: DeserializeOwned>(
        &self,
        url: &str,
        options: RequestOptions,
    ) -> Result<Response<T>> {
        self.request(RequestConfig::new(Method::Delete, url).with_options(options))
            .await
    }

    /// Send a POST request with a JSON body.
    pub async fn post<T, B>(
        &self,
        url: &str,
        data: &B,
        options: RequestOptions,
    ) -> Result<Response<T>>
    where
        T: DeserializeOwned,
        B: Serialize + ?Sized,
    {
        self.send_with_body(Method::Post, url, data, options).await
    }

    /// Send a PUT request with a JSON body.
    pub async fn put<T, B>(
        &self,
        url: &str,
        data: &B,
        options: RequestOptions,
    ) -> Result<Response<T>>
    where
        T: DeserializeOwned,
        B: Serialize + ?Sized,
    {
        self.send_with_body(Method::Put, url, data, options).await
    }

    /// Send a PATCH request with a JSON body.
    pub async fn patch<T, B>(
        &self,
        url: &str,
        data: &B,
        options: RequestOptions,
    ) -> Result<Response<T>>
    where
        T: DeserializeOwned,
        B: Serialize + ?Sized,
    {
        self.send_with_body(Method::Patch, url, data, options).await
    }

    async fn send_with_body<T, B>(
        &self,
        method: Method,
        url: &str,
        data: &B,
        options: RequestOptions,
    ) -> Result<Response<T>>
    where
        T: DeserializeOwned,
        B: Serialize + ?Sized,
    {
        let config = RequestConfig::new(method, url)
            .json(data)?
            .with_options(options);
        self.request(config).await
    }

    /// Request interceptors, transport, status check, response interceptors.
    async fn dispatch(&self, config: RequestConfig) -> Result<Response> {
        let config = self.inner.interceptors.apply_request(config).await?;

        let start = Instant::now();
        let raw = self.send(&config).await?;
        let elapsed_ms = u64::try_from(start.elapsed().as_millis()).unwrap_or(u64::MAX);
        let (status, status_text, headers, body) = raw.into_parts();
        info!(status, elapsed_ms, "request completed");

        if !(200..300).contains(&status) {
            return Err(HttpError {
                status,
                status_text,
                data: decode_error_body(&body),
                headers,
                config,
            }
            .into());
        }

        let response = Response {
            data: decode_success_body(&body)?,
            status,
            status_text,
            headers,
            config,
        };
        self.inner.interceptors.apply_response(response).await
    }

    /// Resolve the config into a transport request and race it against the timeout.
    async fn send(&self, config: &RequestConfig) -> Result<RawResponse> {
        let timeout = config.timeout.unwrap_or(self.inner.timeout);
        let cancellation = CancellationToken::new();
        let request = TransportRequest {
            method: config.method,
            url: build_url(self.base_url(), &config.url, &config.params),
            headers: self.merge_headers(&config.headers)?,
            body: config.data.as_ref().map(to_json).transpose()?,
            cancellation: cancellation.clone(),
        };

        debug!(url = %request.url, ?timeout, "sending request");

        tokio::select! {
            result = self.inner.transport.send(request) => result,
            () = tokio::time::sleep(timeout) => {
                cancellation.cancel();
                Err(Error::timeout(timeout))
            }
        }
    }

    /// Default headers overridden by per-call headers, compared case-insensitively.
    fn merge_headers(&self, overrides: &HashMap<String, String>) -> Result<HeaderMap> {
        let defaults = &self.inner.default_headers;
        let mut headers = HeaderMap::with_capacity(defaults.len() + overrides.len());

        for (name, value) in defaults.iter().chain(overrides) {
            let header_name = HeaderName::from_bytes(name.as_bytes()).map_err(|e| {
                Error::invalid_request(format!("invalid header name {name:?}: {e}"))
            })?;
            let header_value = HeaderValue::from_str(value).map_err(|e| {
                Error::invalid_request(format!("invalid value for header {name:?}: {e}"))
            })?;
            headers.insert(header_name, header_value);
        }

        Ok(headers)
    }
}

impl Default for Client {
    fn default() -> Self {
        Self::new()
    }
}

// ============================================================================
// Builder
// ============================================================================

/// Builder for [`Client`].
///
/// # Example
///
/// ```ignore
/// use hookline::Client;
/// use std::time::Duration;
///
/// let client = Client::builder()
///     .base_url("https://api.example.com")
///     .header("X-Api-Version", "2")
///     .timeout(Duration::from_secs(5))
///     .plugin(auth_plugin)
///     .build();
/// ```
#[derive(Default)]
pub struct ClientBuilder {
    config: ClientConfigBuilder,
    transport: Option<Arc<dyn Transport>>,
    plugins: Vec<Arc<dyn Plugin>>,
}

impl fmt::Debug for ClientBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClientBuilder")
            .field("config", &self.config)
            .field("custom_transport", &self.transport.is_some())
            .field("plugins_count", &self.plugins.len())
            .finish()
    }
}

impl ClientBuilder {
    /// Set the base URL.
    #[must_use]
    pub fn base_url(mut self, base_url: impl Into<String>) -> Self {
        self.config = self.config.base_url(base_url);
        self
    }

    /// Add a default header.
    #[must_use]
    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.config = self.config.header(name, value);
        self
    }

    /// Set the default request timeout.
    #[must_use]
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.config = self.config.timeout(timeout);
        self
    }

    /// Use a custom transport instead of [`HyperTransport`].
    #[must_use]
    pub fn transport(mut self, transport: impl Transport) -> Self {
        self.transport = Some(Arc::new(transport));
        self
    }

    /// Register a plugin on the built client.
    #[must_use]
    pub fn plugin<P: Plugin>(mut self, plugin: P) -> Self {
        self.plugins.push(Arc::new(plugin));
        self
    }

    /// Build the client, applying plugins in the order they were added.
    #[must_use]
    pub fn build(self) -> Client {
        let transport = self
            .transport
            .unwrap_or_else(|| Arc::new(HyperTransport::new()));
        let client = Client::from_parts(self.config.build(), transport);
        for plugin in self.plugins {
            client.install(plugin);
        }
        client
    }
}

#[cfg(test)]
mod tests {
    use hookline_core::BoxFuture;

    use super::*;

    struct Unreachable;

    impl Transport for Unreachable {
        fn send(&self, _request: TransportRequest) -> BoxFuture<'_, Result<RawResponse>> {
            Box::pin(async { Err(Error::connection("unreachable")) })
        }
    }

    fn client(config: ClientConfig) -> Client {
        Client::with_transport(Unreachable, config)
    }

    #[test]
    fn merge_headers_per_call_wins() {
        let client = client(ClientConfig::default());
        let overrides = HashMap::from([("content-type".to_string(), "text/plain".to_string())]);

        let headers = client.merge_headers(&overrides).expect("valid headers");
        assert_eq!(headers.len(), 1);
        assert_eq!(
            headers.get("Content-Type").map(HeaderValue::as_bytes),
            Some(&b"text/plain"[..])
        );
    }

    #[test]
    fn merge_headers_keeps_defaults() {
        let client = client(ClientConfig::builder().header("X-Api-Key", "k").build());

        let headers = client.merge_headers(&HashMap::new()).expect("valid headers");
        assert_eq!(headers.len(), 2);
        assert!(headers.contains_key("content-type"));
        assert!(headers.contains_key("x-api-key"));
    }

    #[test]
    fn merge_headers_rejects_invalid_name() {
        let client = client(ClientConfig::default());
        let overrides = HashMap::from([("bad header".to_string(), "x".to_string())]);

        let err = client.merge_headers(&overrides).expect_err("space in name");
        assert!(matches!(err, Error::InvalidRequest(_)), "{err}");
    }

    #[test]
    fn clone_shares_instance_create_does_not() {
        let client = client(ClientConfig::default());
        let handle = client.clone();
        let derived = client.create(ClientConfig::default());

        assert!(client.same_instance(&handle));
        assert!(!client.same_instance(&derived));
    }

    #[test]
    fn builder_applies_config() {
        let client = Client::builder()
            .base_url("https://api.test")
            .timeout(Duration::from_millis(500))
            .transport(Unreachable)
            .build();

        assert_eq!(client.base_url(), Some("https://api.test"));
        assert_eq!(client.timeout(), Duration::from_millis(500));
        assert_eq!(
            client.default_headers().get("Content-Type").map(String::as_str),
            Some("application/json")
        );
    }

    #[test]
    fn hand_built_config_keeps_default_content_type() {
        let client = client(ClientConfig {
            headers: HashMap::from([("X-Key".to_string(), "1".to_string())]),
            ..ClientConfig::default()
        });

        let headers = client.default_headers();
        assert_eq!(headers.len(), 2);
        assert_eq!(headers.get("Content-Type").map(String::as_str), Some("application/json"));
        assert_eq!(headers.get("X-Key").map(String::as_str), Some("1"));
    }

    #[test]
    fn case_only_duplicate_headers_resolve_by_name_order() {
        let client = client(ClientConfig {
            headers: HashMap::from([
                ("x-key".to_string(), "lower".to_string()),
                ("X-Key".to_string(), "upper".to_string()),
            ]),
            ..ClientConfig::default()
        });

        // "X-Key" sorts before "x-key", so the lowercase entry is applied last.
        let headers = client.default_headers();
        assert_eq!(headers.get("x-key").map(String::as_str), Some("lower"));
        assert!(!headers.contains_key("X-Key"));
    }

    #[test]
    fn client_is_debug() {
        let client = client(ClientConfig::default());
        let debug = format!("{client:?}");
        assert!(debug.contains("Client"));
        assert!(debug.contains("Interceptors"));
    }

    #[tokio::test]
    async fn transport_error_reaches_caller_unchanged() {
        let client = client(ClientConfig::default());

        let err = client
            .get::<serde_json::Value>("http://localhost/x", RequestOptions::new())
            .await
            .expect_err("transport fails");
        assert!(err.is_connection(), "{err}");
    }
}

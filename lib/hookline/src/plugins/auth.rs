//! Bearer token authentication with refresh on `401 Unauthorized`.
//!
//! Applying an [`AuthPlugin`] to a client registers three interceptors that
//! share one per-instance refresh counter:
//!
//! - a request interceptor adding `Authorization: Bearer <token>` when the
//!   store has a non-empty access token;
//! - a response interceptor storing the access token from a `200` response
//!   to the login path;
//! - an error interceptor that, on a `401`, posts the refresh token to the
//!   refresh path, stores the new tokens and retries the failed request.
//!
//! The number of refreshes is bounded by `max_refresh` for the lifetime of
//! the instance. Refreshes are serialized: a request that failed with a
//! token that has since been replaced is retried once without refreshing
//! again. Requests the plugin issues itself (the refresh call and retries)
//! are never retried through that shortcut, so a store whose token keeps
//! changing cannot loop.

use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use hookline_core::BoxFuture;
use serde_json::{Value, json};
use tokio::sync::Mutex;
use tracing::{debug, warn};

use crate::{
    Client, Error, RequestConfig, RequestOptions, Response, Result,
    interceptor::{ErrorInterceptor, RequestInterceptor, ResponseInterceptor},
    plugin::Plugin,
    plugins::TokenStore,
};

/// Default path the refresh token is posted to.
pub const DEFAULT_REFRESH_PATH: &str = "/refresh";

/// Default path whose successful response carries the access token.
pub const DEFAULT_LOGIN_PATH: &str = "/login";

const BEARER_PREFIX: &str = "Bearer ";

type ErrorCallback = Arc<dyn Fn(&Error) + Send + Sync>;

static NEXT_STATE_ID: AtomicU64 = AtomicU64::new(0);

/// Kind of request an auth state issued on its own behalf.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Pass {
    /// The refresh call.
    Refresh,
    /// A replay of a request that failed with `401`.
    Retry,
}

tokio::task_local! {
    /// Owner id and kind of the plugin-issued request being awaited.
    static NESTED_PASS: (u64, Pass);
}

// ============================================================================
// Plugin
// ============================================================================

/// Authentication plugin.
///
/// # Example
///
/// ```ignore
/// use std::sync::Arc;
/// use hookline::{Client, plugins::{AuthPlugin, MemoryTokenStore}};
///
/// let store = Arc::new(MemoryTokenStore::new());
/// let client = Client::builder().base_url("https://api.example.com").build();
/// client.use_plugin(
///     AuthPlugin::builder(Arc::clone(&store))
///         .on_refresh_error(|error| tracing::error!(%error, "session expired"))
///         .build(),
/// );
/// ```
#[derive(Clone)]
pub struct AuthPlugin {
    settings: Arc<AuthSettings>,
}

struct AuthSettings {
    store: Arc<dyn TokenStore>,
    refresh_path: String,
    login_path: String,
    max_refresh: u32,
    on_error: Option<ErrorCallback>,
    on_refresh_error: Option<ErrorCallback>,
}

impl fmt::Debug for AuthPlugin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AuthPlugin")
            .field("refresh_path", &self.settings.refresh_path)
            .field("login_path", &self.settings.login_path)
            .field("max_refresh", &self.settings.max_refresh)
            .finish_non_exhaustive()
    }
}

impl AuthPlugin {
    /// Create a builder around a token store.
    #[must_use]
    pub fn builder(store: impl TokenStore) -> AuthPluginBuilder {
        AuthPluginBuilder::new(store)
    }
}

impl Plugin for AuthPlugin {
    fn apply(&self, client: &Client) {
        let state = Arc::new(AuthState {
            id: NEXT_STATE_ID.fetch_add(1, Ordering::Relaxed),
            settings: Arc::clone(&self.settings),
            refresh_attempts: Mutex::new(0),
        });

        client
            .intercept_request(BearerInjector(Arc::clone(&state)))
            .intercept_response(LoginCapture(Arc::clone(&state)))
            .intercept_error(RefreshOnUnauthorized(state));
    }
}

/// Builder for [`AuthPlugin`].
pub struct AuthPluginBuilder {
    store: Arc<dyn TokenStore>,
    refresh_path: String,
    login_path: String,
    max_refresh: u32,
    on_error: Option<ErrorCallback>,
    on_refresh_error: Option<ErrorCallback>,
}

impl fmt::Debug for AuthPluginBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AuthPluginBuilder")
            .field("refresh_path", &self.refresh_path)
            .field("login_path", &self.login_path)
            .field("max_refresh", &self.max_refresh)
            .field("on_error", &self.on_error.is_some())
            .field("on_refresh_error", &self.on_refresh_error.is_some())
            .finish_non_exhaustive()
    }
}

impl AuthPluginBuilder {
    /// Create a builder with default paths and a refresh budget of 1.
    #[must_use]
    pub fn new(store: impl TokenStore) -> Self {
        Self {
            store: Arc::new(store),
            refresh_path: DEFAULT_REFRESH_PATH.to_string(),
            login_path: DEFAULT_LOGIN_PATH.to_string(),
            max_refresh: 1,
            on_error: None,
            on_refresh_error: None,
        }
    }

    /// Path the refresh token is posted to (relative to the base URL).
    #[must_use]
    pub fn refresh_path(mut self, path: impl Into<String>) -> Self {
        self.refresh_path = path.into();
        self
    }

    /// Path whose `200` response carries a fresh access token.
    #[must_use]
    pub fn login_path(mut self, path: impl Into<String>) -> Self {
        self.login_path = path.into();
        self
    }

    /// Maximum number of refreshes per client instance.
    #[must_use]
    pub const fn max_refresh(mut self, max_refresh: u32) -> Self {
        self.max_refresh = max_refresh;
        self
    }

    /// Called with every error the plugin does not handle.
    #[must_use]
    pub fn on_error<F>(mut self, callback: F) -> Self
    where
        F: Fn(&Error) + Send + Sync + 'static,
    {
        self.on_error = Some(Arc::new(callback));
        self
    }

    /// Called when refreshing the access token fails.
    #[must_use]
    pub fn on_refresh_error<F>(mut self, callback: F) -> Self
    where
        F: Fn(&Error) + Send + Sync + 'static,
    {
        self.on_refresh_error = Some(Arc::new(callback));
        self
    }

    /// Build the plugin.
    #[must_use]
    pub fn build(self) -> AuthPlugin {
        AuthPlugin {
            settings: Arc::new(AuthSettings {
                store: self.store,
                refresh_path: self.refresh_path,
                login_path: self.login_path,
                max_refresh: self.max_refresh,
                on_error: self.on_error,
                on_refresh_error: self.on_refresh_error,
            }),
        }
    }
}

// ============================================================================
// Per-instance State
// ============================================================================

/// State created each time the plugin is applied to an instance.
struct AuthState {
    id: u64,
    settings: Arc<AuthSettings>,
    /// Refreshes performed so far; the lock is held for the whole refresh.
    refresh_attempts: Mutex<u32>,
}

impl AuthState {
    fn notify_error(&self, error: &Error) {
        if let Some(callback) = &self.settings.on_error {
            callback(error);
        }
    }

    fn notify_refresh_error(&self, error: &Error) {
        if let Some(callback) = &self.settings.on_refresh_error {
            callback(error);
        }
    }

    /// Kind of request this state issued and is currently awaiting, if any.
    fn nested_pass(&self) -> Option<Pass> {
        NESTED_PASS
            .try_with(|&(owner, pass)| (owner == self.id).then_some(pass))
            .ok()
            .flatten()
    }

    async fn refresh(&self, client: &Client) -> Result<()> {
        let token = self
            .settings
            .store
            .refresh_token()
            .ok_or_else(|| Error::plugin("no refresh token available"))?;

        let body = json!({ "refreshToken": token });
        let call = client.post::<Value, _>(
            &self.settings.refresh_path,
            &body,
            RequestOptions::new(),
        );
        let response = NESTED_PASS.scope((self.id, Pass::Refresh), call).await?;

        self.settings.store.set_access_token(&response);
        self.settings.store.set_refresh_token(&response);
        Ok(())
    }

    async fn retry(&self, client: &Client, config: RequestConfig) -> Result<Response> {
        NESTED_PASS
            .scope((self.id, Pass::Retry), client.request(config))
            .await
    }

    async fn recover(&self, client: &Client, error: Error) -> Result<Response> {
        let nested = self.nested_pass();

        // The refresh call's own failures are reported, never recovered:
        // the outer pass holds the refresh lock.
        if nested == Some(Pass::Refresh) {
            self.notify_error(&error);
            return Err(error);
        }

        let Some(failed) = error.http_error() else {
            self.notify_error(&error);
            return Err(error);
        };

        if failed.status != 401 {
            self.notify_error(&error);
            return Err(error);
        }

        let config = failed.config.clone();
        let mut attempts = self.refresh_attempts.lock().await;

        if nested.is_none() {
            let current = self.settings.store.access_token().filter(|token| !token.is_empty());
            if current.is_some() && current.as_deref() != bearer_token(&config) {
                drop(attempts);
                debug!(url = %config.url, "access token replaced since request was sent, retrying");
                return self.retry(client, config).await;
            }
        }

        if *attempts >= self.settings.max_refresh {
            drop(attempts);
            self.notify_error(&error);
            return Err(error);
        }
        *attempts += 1;

        debug!(attempt = *attempts, "refreshing access token");
        if let Err(refresh_error) = self.refresh(client).await {
            drop(attempts);
            warn!(error = %refresh_error, "access token refresh failed");
            self.notify_refresh_error(&refresh_error);
            return Err(refresh_error);
        }
        drop(attempts);

        self.retry(client, config).await
    }
}

fn bearer_token(config: &RequestConfig) -> Option<&str> {
    config
        .header_value("Authorization")
        .and_then(|value| value.strip_prefix(BEARER_PREFIX))
}

// ============================================================================
// Interceptors
// ============================================================================

struct BearerInjector(Arc<AuthState>);

impl RequestInterceptor for BearerInjector {
    fn intercept(&self, config: RequestConfig) -> BoxFuture<'_, Result<RequestConfig>> {
        Box::pin(async move {
            let token = self.0.settings.store.access_token();
            Ok(match token.filter(|token| !token.is_empty()) {
                Some(token) => config.header("Authorization", format!("{BEARER_PREFIX}{token}")),
                None => config,
            })
        })
    }
}

struct LoginCapture(Arc<AuthState>);

impl ResponseInterceptor for LoginCapture {
    fn intercept(&self, response: Response) -> BoxFuture<'_, Result<Response>> {
        Box::pin(async move {
            if response.config.url == self.0.settings.login_path && response.status == 200 {
                debug!("storing access token from login response");
                self.0.settings.store.set_access_token(&response);
            }
            Ok(response)
        })
    }
}

struct RefreshOnUnauthorized(Arc<AuthState>);

impl ErrorInterceptor for RefreshOnUnauthorized {
    fn intercept<'a>(
        &'a self,
        client: &'a Client,
        error: Error,
    ) -> BoxFuture<'a, Result<Response>> {
        Box::pin(self.0.recover(client, error))
    }
}

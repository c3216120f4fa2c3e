//! Token storage for the auth plugin.

use std::sync::{Arc, PoisonError, RwLock};

use crate::Response;

/// Field read from a login or refresh response to set the access token.
const ACCESS_TOKEN_FIELD: &str = "access_token";

/// Field read from a refresh response to set the refresh token.
const REFRESH_TOKEN_FIELD: &str = "refresh_token";

/// Read/write access to the tokens used by [`crate::plugins::AuthPlugin`].
///
/// The setters receive the whole response so an implementation can pick the
/// token out of whatever shape the server returns.
pub trait TokenStore: Send + Sync + 'static {
    /// Current access token, if any.
    fn access_token(&self) -> Option<String>;

    /// Store the access token carried by a login or refresh response.
    fn set_access_token(&self, response: &Response);

    /// Current refresh token, if any.
    fn refresh_token(&self) -> Option<String>;

    /// Store the refresh token carried by a refresh response.
    fn set_refresh_token(&self, response: &Response);
}

impl<T: TokenStore + ?Sized> TokenStore for Arc<T> {
    fn access_token(&self) -> Option<String> {
        (**self).access_token()
    }

    fn set_access_token(&self, response: &Response) {
        (**self).set_access_token(response);
    }

    fn refresh_token(&self) -> Option<String> {
        (**self).refresh_token()
    }

    fn set_refresh_token(&self, response: &Response) {
        (**self).set_refresh_token(response);
    }
}

/// In-memory [`TokenStore`].
///
/// Setters read the `access_token` / `refresh_token` string fields of the
/// response body and leave the stored value untouched when the field is
/// missing. Share it with `Arc` to inspect tokens from outside the plugin.
#[derive(Debug, Default)]
pub struct MemoryTokenStore {
    access: RwLock<Option<String>>,
    refresh: RwLock<Option<String>>,
}

impl MemoryTokenStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store holding the given tokens.
    #[must_use]
    pub fn with_tokens(access: impl Into<String>, refresh: impl Into<String>) -> Self {
        Self {
            access: RwLock::new(Some(access.into())),
            refresh: RwLock::new(Some(refresh.into())),
        }
    }

    /// Replace both tokens.
    pub fn set_tokens(&self, access: Option<String>, refresh: Option<String>) {
        *write(&self.access) = access;
        *write(&self.refresh) = refresh;
    }

    /// Forget both tokens.
    pub fn clear(&self) {
        self.set_tokens(None, None);
    }
}

fn read(slot: &RwLock<Option<String>>) -> Option<String> {
    slot.read().unwrap_or_else(PoisonError::into_inner).clone()
}

fn write(slot: &RwLock<Option<String>>) -> std::sync::RwLockWriteGuard<'_, Option<String>> {
    slot.write().unwrap_or_else(PoisonError::into_inner)
}

impl TokenStore for MemoryTokenStore {
    fn access_token(&self) -> Option<String> {
        read(&self.access)
    }

    fn set_access_token(&self, response: &Response) {
        if let Some(token) = response.data_str(ACCESS_TOKEN_FIELD) {
            *write(&self.access) = Some(token.to_string());
        }
    }

    fn refresh_token(&self) -> Option<String> {
        read(&self.refresh)
    }

    fn set_refresh_token(&self, response: &Response) {
        if let Some(token) = response.data_str(REFRESH_TOKEN_FIELD) {
            *write(&self.refresh) = Some(token.to_string());
        }
    }
}

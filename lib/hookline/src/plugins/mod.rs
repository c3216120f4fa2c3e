//! Bundled plugins.
//!
//! - [`AuthPlugin`] - bearer token injection, login capture and refresh on 401
//! - [`TokenStore`] / [`MemoryTokenStore`] - where the auth plugin keeps its tokens

mod auth;
mod token_store;

pub use auth::{AuthPlugin, AuthPluginBuilder, DEFAULT_LOGIN_PATH, DEFAULT_REFRESH_PATH};
pub use token_store::{MemoryTokenStore, TokenStore};

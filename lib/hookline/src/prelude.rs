//! Prelude module for convenient imports.
//!
//! This module re-exports the most commonly used types and functions for
//! easy glob importing:
//!
//! ```ignore
//! use hookline::prelude::*;
//! ```

pub use crate::{
    Client, ClientConfig, Error, HttpError, Method, Plugin, RequestConfig, RequestOptions,
    Response, Result, StatusCode, header,
    interceptor::{error_fn, request_fn, response_fn},
    plugins::{AuthPlugin, MemoryTokenStore, TokenStore},
};
pub use serde::{Deserialize, Serialize};

//! Prelude module for convenient imports.
//!
//! ```ignore
//! use hookline_core::prelude::*;
//! ```

pub use crate::{
    Error, HttpError, Method, RawResponse, RequestConfig, RequestOptions, Response, Result,
    Transport, TransportRequest,
};

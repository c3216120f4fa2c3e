//! Core types and traits for the hookline HTTP client.
//!
//! This crate provides the transport-agnostic building blocks:
//! - [`Method`] - HTTP method enum
//! - [`RequestConfig`] and [`RequestOptions`] - request descriptions
//! - [`Response`] and [`RawResponse`] - decoded and undecoded responses
//! - [`Error`], [`HttpError`] and [`Result`] - error handling
//! - [`Transport`] and [`TransportRequest`] - the network boundary
//! - [`build_url`] - base URL + query string assembly

mod body;
mod error;
mod method;
pub mod prelude;
mod request;
mod response;
mod transport;

pub use body::{
    JSON_CONTENT_TYPE, decode_error_body, decode_success_body, decode_value, from_json, to_json,
};
pub use error::{Error, HttpError, Result};
pub use method::Method;
pub use request::{RequestConfig, RequestOptions, build_url, insert_header};
pub use response::{RawResponse, Response};
pub use transport::{BoxFuture, Transport, TransportRequest};

// Re-export http types for status codes and headers
pub use http::{HeaderMap, StatusCode, header};

// Re-export the cancellation primitive carried by `TransportRequest`
pub use tokio_util::sync::CancellationToken;

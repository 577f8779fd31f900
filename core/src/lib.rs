//! Synchronous client core for JSON web services that use HTTP Basic auth.
//!
//! # Overview
//! `Client` builds authenticated requests, hands them to a `Transport`, and
//! classifies the `(status, content type, body)` triple that comes back into
//! a decoded JSON value or a typed `ServiceError`.
//!
//! # Design
//! - `Client` is configured once and shared; calls make a single attempt and
//!   leave the client untouched.
//! - `Transport` is a two-method trait. `UreqTransport` is the bundled
//!   implementation; tests and embedders can supply their own.
//! - Classification lives in `response::classify`, a pure function, so the
//!   decision table can be tested without a network.

pub mod client;
pub mod config;
pub mod error;
pub mod http;
pub mod response;
pub mod transport;

pub use client::{Client, LIBRARY_TOKEN};
pub use config::{ClientOptions, Credentials, TransportOptions, DEFAULT_HOST};
pub use error::{ConfigError, ServiceError, TransportError};
pub use http::{Header, HttpMethod, HttpRequest, HttpResponse, Transport};
pub use response::{classify, is_json_content_type};
pub use transport::{UreqTransport, MAX_BODY_BYTES, TRANSPORT_TOKEN};

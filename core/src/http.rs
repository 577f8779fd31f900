//! HTTP transport types and the transport capability.
//!
//! # Design
//! Requests and responses are plain data. The client builds an `HttpRequest`,
//! hands its parts to a `Transport`, and classifies the `HttpResponse` that
//! comes back. Anything that can perform a GET and a POST satisfies
//! `Transport`: the bundled ureq implementation, or a test double.

use crate::error::TransportError;

/// A single `(name, value)` header pair, in transmission order.
pub type Header = (String, String);

/// HTTP method for a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HttpMethod {
    Get,
    Post,
}

impl HttpMethod {
    pub fn as_str(self) -> &'static str {
        match self {
            HttpMethod::Get => "GET",
            HttpMethod::Post => "POST",
        }
    }
}

/// An HTTP request described as plain data.
///
/// Built by `Client::build_get` / `Client::build_post` and discarded once the
/// transport has been called.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpRequest {
    pub method: HttpMethod,
    pub url: String,
    pub headers: Vec<Header>,
    /// JSON-encoded body. Present only for POST.
    pub body: Option<String>,
}

impl HttpRequest {
    /// Look up a header value by case-insensitive name.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(n, _)| n.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }
}

/// The `(status, content type, body)` triple a transport returns.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HttpResponse {
    pub status: u16,
    pub content_type: Option<String>,
    pub body: Option<String>,
}

impl HttpResponse {
    pub fn new(status: u16, content_type: Option<&str>, body: Option<&str>) -> Self {
        Self {
            status,
            content_type: content_type.map(str::to_string),
            body: body.map(str::to_string),
        }
    }
}

/// Something that can perform one HTTP exchange.
///
/// Implementations may keep a connection handle alive between calls; they
/// must tolerate being called from several threads when the owning `Client`
/// is shared.
pub trait Transport: Send + Sync {
    fn get(&self, url: &str, headers: &[Header]) -> Result<HttpResponse, TransportError>;

    fn post(&self, url: &str, headers: &[Header], body: &str) -> Result<HttpResponse, TransportError>;
}

impl<T: Transport + ?Sized> Transport for Box<T> {
    fn get(&self, url: &str, headers: &[Header]) -> Result<HttpResponse, TransportError> {
        (**self).get(url, headers)
    }

    fn post(&self, url: &str, headers: &[Header], body: &str) -> Result<HttpResponse, TransportError> {
        (**self).post(url, headers, body)
    }
}

impl<T: Transport + ?Sized> Transport for std::sync::Arc<T> {
    fn get(&self, url: &str, headers: &[Header]) -> Result<HttpResponse, TransportError> {
        (**self).get(url, headers)
    }

    fn post(&self, url: &str, headers: &[Header], body: &str) -> Result<HttpResponse, TransportError> {
        (**self).post(url, headers, body)
    }
}

//! Authenticated request builder and call facade.
//!
//! # Design
//! `Client` holds credentials, configuration and a transport, and carries no
//! mutable state between calls. Each call is split into a `build_*` step that
//! produces an `HttpRequest` and a classification step that consumes the
//! transport's `HttpResponse`; `get` and `post` run both around one
//! transport call.

use serde::Serialize;
use serde_json::Value;

use crate::config::{ClientOptions, Credentials};
use crate::error::{ConfigError, ServiceError};
use crate::http::{Header, HttpMethod, HttpRequest, Transport};
use crate::response::classify;
use crate::transport::{UreqTransport, TRANSPORT_TOKEN};

/// Library product token used in the `User-Agent` header.
pub const LIBRARY_TOKEN: &str = concat!("MaxMind-WS-API/", env!("CARGO_PKG_VERSION"));

/// Synchronous client for a JSON web service using HTTP Basic auth.
///
/// Safe to share between threads; every call makes exactly one attempt.
pub struct Client {
    credentials: Credentials,
    options: ClientOptions,
    user_agent: String,
    transport: Box<dyn Transport>,
}

impl std::fmt::Debug for Client {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Client")
            .field("credentials", &self.credentials)
            .field("options", &self.options)
            .field("user_agent", &self.user_agent)
            .finish_non_exhaustive()
    }
}

impl Client {
    /// Build a client that uses the bundled ureq transport.
    pub fn new(
        account_id: u64,
        license_key: impl Into<String>,
        options: ClientOptions,
    ) -> Result<Self, ConfigError> {
        let transport = UreqTransport::new(options.transport_options()?);
        Self::with_transport(account_id, license_key, options, transport)
    }

    /// Build a client around a caller-supplied transport. Transport-related
    /// options are validated but otherwise left to the caller.
    pub fn with_transport(
        account_id: u64,
        license_key: impl Into<String>,
        options: ClientOptions,
        transport: impl Transport + 'static,
    ) -> Result<Self, ConfigError> {
        let credentials = Credentials::new(account_id, license_key)?;
        options.validate()?;
        let user_agent = match options.user_agent.as_deref() {
            Some(prefix) if !prefix.is_empty() => {
                format!("{prefix} {LIBRARY_TOKEN} {TRANSPORT_TOKEN}")
            }
            _ => format!("{LIBRARY_TOKEN} {TRANSPORT_TOKEN}"),
        };
        Ok(Self {
            credentials,
            options,
            user_agent,
            transport: Box::new(transport),
        })
    }

    pub fn options(&self) -> &ClientOptions {
        &self.options
    }

    pub fn user_agent(&self) -> &str {
        &self.user_agent
    }

    /// The URL queried for `path`.
    pub fn url_for(&self, path: &str) -> String {
        format!("{}://{}{}", self.options.scheme(), self.options.host, path)
    }

    fn headers(&self) -> Vec<Header> {
        vec![
            ("Content-Type".to_string(), "application/json".to_string()),
            ("Authorization".to_string(), self.credentials.authorization()),
            ("Accept".to_string(), "application/json".to_string()),
            ("User-Agent".to_string(), self.user_agent.clone()),
        ]
    }

    pub fn build_get(&self, path: &str) -> HttpRequest {
        HttpRequest {
            method: HttpMethod::Get,
            url: self.url_for(path),
            headers: self.headers(),
            body: None,
        }
    }

    pub fn build_post<T: Serialize + ?Sized>(
        &self,
        path: &str,
        content: &T,
    ) -> Result<HttpRequest, ServiceError> {
        let body = serde_json::to_string(content).map_err(|e| ServiceError::InvalidInput {
            message: format!("Error encoding input as JSON: {e}"),
        })?;
        Ok(HttpRequest {
            method: HttpMethod::Post,
            url: self.url_for(path),
            headers: self.headers(),
            body: Some(body),
        })
    }

    /// GET `path`. `service` names the remote operation in error messages.
    pub fn get(&self, service: &str, path: &str) -> Result<Option<Value>, ServiceError> {
        self.execute(service, self.build_get(path))
    }

    /// POST `content` as JSON to `path`.
    pub fn post<T: Serialize + ?Sized>(
        &self,
        service: &str,
        path: &str,
        content: &T,
    ) -> Result<Option<Value>, ServiceError> {
        let request = self.build_post(path, content)?;
        self.execute(service, request)
    }

    fn execute(&self, service: &str, request: HttpRequest) -> Result<Option<Value>, ServiceError> {
        tracing::debug!(
            service,
            method = request.method.as_str(),
            url = %request.url,
            "sending request"
        );

        let result = match (&request.method, &request.body) {
            (HttpMethod::Get, _) => self.transport.get(&request.url, &request.headers),
            (HttpMethod::Post, body) => self.transport.post(
                &request.url,
                &request.headers,
                body.as_deref().unwrap_or(""),
            ),
        };
        let response = result.map_err(|e| {
            tracing::warn!(service, url = %e.url, error = %e.message, "transport failed");
            ServiceError::from(e)
        })?;

        tracing::debug!(service, status = response.status, "received response");
        classify(&response, service, &request.url)
    }
}

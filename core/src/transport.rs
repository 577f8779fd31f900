//! The bundled `Transport`, backed by a ureq `Agent`.
//!
//! # Design
//! The agent owns the connection pool, so keeping one agent alive lets
//! consecutive calls reuse connections and TLS sessions. It is created on
//! first use from `TransportOptions` and stored behind a `Mutex`; each call
//! clones the handle out of the lock and performs the exchange unlocked.
//! `close` drops the agent explicitly; dropping the transport does the same.

use std::fmt;
use std::sync::{Mutex, MutexGuard};

use thiserror::Error;
use ureq::tls::{parse_pem, PemItem, RootCerts, TlsConfig};
use ureq::{Agent, Proxy};

use crate::config::TransportOptions;
use crate::error::TransportError;
use crate::http::{Header, HttpResponse, Transport};

/// Product token appended to the user agent for this transport.
pub const TRANSPORT_TOKEN: &str = "ureq/3";

/// Largest response body read before the exchange fails.
pub const MAX_BODY_BYTES: u64 = 64 * 1024 * 1024;

#[derive(Debug, Error)]
enum AgentSetupError {
    #[error("invalid proxy: {0}")]
    Proxy(#[source] ureq::Error),

    #[error("could not read CA bundle {path}: {source}")]
    CaBundleRead {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("could not parse CA bundle {path}: {source}")]
    CaBundleParse {
        path: String,
        #[source]
        source: ureq::Error,
    },
}

/// HTTP transport with a lazily created, reused ureq agent.
pub struct UreqTransport {
    options: TransportOptions,
    agent: Mutex<Option<Agent>>,
}

impl fmt::Debug for UreqTransport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UreqTransport")
            .field("options", &self.options)
            .field("open", &self.is_open())
            .finish()
    }
}

impl UreqTransport {
    pub fn new(options: TransportOptions) -> Self {
        Self {
            options,
            agent: Mutex::new(None),
        }
    }

    pub fn options(&self) -> &TransportOptions {
        &self.options
    }

    /// Whether a connection agent is currently held.
    pub fn is_open(&self) -> bool {
        self.slot().is_some()
    }

    /// Release the agent and its pooled connections. The next call builds a
    /// new one.
    pub fn close(&self) {
        if self.slot().take().is_some() {
            tracing::debug!("released HTTP agent");
        }
    }

    fn slot(&self) -> MutexGuard<'_, Option<Agent>> {
        // The guarded value is only ever replaced whole, so a poisoned lock
        // still holds a usable handle.
        self.agent.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn agent(&self, url: &str) -> Result<Agent, TransportError> {
        let mut slot = self.slot();
        if let Some(agent) = slot.as_ref() {
            return Ok(agent.clone());
        }
        let agent = build_agent(&self.options).map_err(|e| TransportError::new(e.to_string(), url))?;
        tracing::debug!("created HTTP agent");
        *slot = Some(agent.clone());
        Ok(agent)
    }
}

impl Transport for UreqTransport {
    fn get(&self, url: &str, headers: &[Header]) -> Result<HttpResponse, TransportError> {
        let agent = self.agent(url)?;
        let mut request = agent.get(url);
        for (name, value) in headers {
            request = request.header(name.as_str(), value.as_str());
        }
        let response = request.call().map_err(|e| TransportError::new(e.to_string(), url))?;
        read_response(response, url)
    }

    fn post(&self, url: &str, headers: &[Header], body: &str) -> Result<HttpResponse, TransportError> {
        let agent = self.agent(url)?;
        let mut request = agent.post(url);
        for (name, value) in headers {
            request = request.header(name.as_str(), value.as_str());
        }
        let response = request
            .send(body.as_bytes())
            .map_err(|e| TransportError::new(e.to_string(), url))?;
        read_response(response, url)
    }
}

fn read_response(
    mut response: ureq::http::Response<ureq::Body>,
    url: &str,
) -> Result<HttpResponse, TransportError> {
    let status = response.status().as_u16();
    let content_type = response
        .headers()
        .get(ureq::http::header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);
    let body = response
        .body_mut()
        .with_config()
        .limit(MAX_BODY_BYTES)
        .read_to_string()
        .map_err(|e| TransportError::new(e.to_string(), url))?;

    Ok(HttpResponse {
        status,
        content_type,
        body: Some(body),
    })
}

fn build_agent(options: &TransportOptions) -> Result<Agent, AgentSetupError> {
    // Statuses are classified by the client, and redirects are reported
    // rather than followed.
    let mut config = Agent::config_builder()
        .http_status_as_error(false)
        .max_redirects(0)
        .max_redirects_will_error(false)
        .timeout_connect(options.connect_timeout)
        .timeout_global(options.timeout);

    if let Some(proxy) = &options.proxy {
        let proxy = Proxy::new(proxy).map_err(AgentSetupError::Proxy)?;
        config = config.proxy(Some(proxy));
    }

    let tls = TlsConfig::builder().root_certs(root_certs(options)?).build();
    config = config.tls_config(tls);

    Ok(config.build().new_agent())
}

/// Trusted roots for TLS: the configured PEM bundle, or the operating
/// system's verifier when none is set.
fn root_certs(options: &TransportOptions) -> Result<RootCerts, AgentSetupError> {
    let Some(path) = &options.ca_bundle else {
        return Ok(RootCerts::PlatformVerifier);
    };
    let display = path.display().to_string();
    let pem = std::fs::read(path).map_err(|source| AgentSetupError::CaBundleRead {
        path: display.clone(),
        source,
    })?;
    let mut certs = Vec::new();
    for item in parse_pem(&pem) {
        match item {
            Ok(PemItem::Certificate(cert)) => certs.push(cert.to_owned()),
            Ok(_) => {}
            Err(source) => {
                return Err(AgentSetupError::CaBundleParse {
                    path: display,
                    source,
                })
            }
        }
    }
    Ok(RootCerts::new_with_certs(&certs))
}

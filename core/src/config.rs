//! Credentials and client options.
//!
//! `ClientOptions` can be built in code with the `with_*` setters or loaded
//! from any serde format. Validation happens once, when the client is built.

use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use serde::Deserialize;

use crate::error::ConfigError;

pub const DEFAULT_HOST: &str = "api.maxmind.com";

/// Account ID and license key used for HTTP Basic authentication.
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    account_id: u64,
    license_key: String,
}

impl Credentials {
    pub fn new(account_id: u64, license_key: impl Into<String>) -> Result<Self, ConfigError> {
        let license_key = license_key.into();
        if account_id == 0 {
            return Err(ConfigError::InvalidAccountId);
        }
        if license_key.is_empty() {
            return Err(ConfigError::EmptyLicenseKey);
        }
        Ok(Self {
            account_id,
            license_key,
        })
    }

    pub fn account_id(&self) -> u64 {
        self.account_id
    }

    /// Value of the `Authorization` header.
    pub fn authorization(&self) -> String {
        let token = STANDARD.encode(format!("{}:{}", self.account_id, self.license_key));
        format!("Basic {token}")
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("account_id", &self.account_id)
            .field("license_key", &"<redacted>")
            .finish()
    }
}

/// Per-client settings. Every field is optional.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ClientOptions {
    pub host: String,
    /// `false` switches to plain HTTP. Meant for local testing.
    pub use_https: bool,
    /// Prefix for the library's own user agent.
    pub user_agent: Option<String>,
    /// Seconds. `None` leaves the transport default in place and `0`
    /// disables the limit.
    pub connect_timeout: Option<f64>,
    /// Seconds, for the whole exchange. `0` disables the limit.
    pub timeout: Option<f64>,
    pub proxy: Option<String>,
    /// PEM file with trusted roots. `None` uses the platform trust store.
    pub ca_bundle: Option<PathBuf>,
}

impl Default for ClientOptions {
    fn default() -> Self {
        Self {
            host: DEFAULT_HOST.to_string(),
            use_https: true,
            user_agent: None,
            connect_timeout: None,
            timeout: None,
            proxy: None,
            ca_bundle: None,
        }
    }
}

impl ClientOptions {
    pub fn with_host(mut self, host: impl Into<String>) -> Self {
        self.host = host.into();
        self
    }

    pub fn with_https(mut self, use_https: bool) -> Self {
        self.use_https = use_https;
        self
    }

    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = Some(user_agent.into());
        self
    }

    pub fn with_connect_timeout(mut self, seconds: f64) -> Self {
        self.connect_timeout = Some(seconds);
        self
    }

    pub fn with_timeout(mut self, seconds: f64) -> Self {
        self.timeout = Some(seconds);
        self
    }

    pub fn with_proxy(mut self, proxy: impl Into<String>) -> Self {
        self.proxy = Some(proxy.into());
        self
    }

    pub fn with_ca_bundle(mut self, path: impl Into<PathBuf>) -> Self {
        self.ca_bundle = Some(path.into());
        self
    }

    pub fn scheme(&self) -> &'static str {
        if self.use_https {
            "https"
        } else {
            "http"
        }
    }

    pub(crate) fn validate(&self) -> Result<(), ConfigError> {
        if self.host.trim().is_empty() {
            return Err(ConfigError::EmptyHost);
        }
        seconds("connect_timeout", self.connect_timeout)?;
        seconds("timeout", self.timeout)?;
        Ok(())
    }

    /// The subset of options the bundled transport consumes.
    pub fn transport_options(&self) -> Result<TransportOptions, ConfigError> {
        Ok(TransportOptions {
            connect_timeout: seconds("connect_timeout", self.connect_timeout)?,
            timeout: seconds("timeout", self.timeout)?,
            proxy: self.proxy.clone(),
            ca_bundle: self.ca_bundle.clone(),
        })
    }
}

/// Settings threaded through to the transport without interpretation by the
/// client.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TransportOptions {
    pub connect_timeout: Option<Duration>,
    pub timeout: Option<Duration>,
    pub proxy: Option<String>,
    pub ca_bundle: Option<PathBuf>,
}

/// Zero means "no limit", so it maps to `None` like an absent value.
fn seconds(name: &'static str, value: Option<f64>) -> Result<Option<Duration>, ConfigError> {
    match value {
        None => Ok(None),
        Some(v) => Duration::try_from_secs_f64(v)
            .map(|d| Some(d).filter(|d| !d.is_zero()))
            .map_err(|_| ConfigError::InvalidTimeout { name, value: v }),
    }
}

//! Client configuration structures
//!
//! Timeouts and proxies are normalized once here and then rendered into the
//! two transport representations: the *simple* one used by the blocking
//! transport and the *pooled* one used by the connection-pooling transport.

use std::collections::BTreeMap;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::constants::DEFAULT_TIMEOUT_SECS;
use crate::credentials::Credential;
use crate::errors::{Result, WeaveError};

/// Timeout as written in configuration: one value for both phases or a
/// `(connect, read)` pair, in seconds.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum TimeoutSetting {
    Uniform(f64),
    Pair(f64, f64),
}

/// Normalized per-request timeout.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "TimeoutSetting", into = "TimeoutSetting")]
pub struct TimeoutConfig {
    connect: Duration,
    read: Duration,
}

/// Timeout rendered for the pooled transport.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PooledTimeout {
    pub connect: Duration,
    pub total: Duration,
}

impl TimeoutConfig {
    pub fn new(connect: Duration, read: Duration) -> Self {
        Self { connect, read }
    }

    /// Same timeout for connecting and reading.
    pub fn from_secs(secs: u64) -> Self {
        let value = Duration::from_secs(secs);
        Self { connect: value, read: value }
    }

    pub fn connect(&self) -> Duration {
        self.connect
    }

    pub fn read(&self) -> Duration {
        self.read
    }

    /// `(connect, read)` for the blocking transport.
    pub fn simple(&self) -> (Duration, Duration) {
        (self.connect, self.read)
    }

    /// Connect timeout plus an overall budget of `connect + read`.
    pub fn pooled(&self) -> PooledTimeout {
        PooledTimeout { connect: self.connect, total: self.connect.saturating_add(self.read) }
    }
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self::from_secs(DEFAULT_TIMEOUT_SECS)
    }
}

impl TryFrom<TimeoutSetting> for TimeoutConfig {
    type Error = WeaveError;

    fn try_from(setting: TimeoutSetting) -> Result<Self> {
        let (connect, read) = match setting {
            TimeoutSetting::Uniform(value) => (value, value),
            TimeoutSetting::Pair(connect, read) => (connect, read),
        };
        Ok(Self { connect: positive_secs(connect, "connect")?, read: positive_secs(read, "read")? })
    }
}

impl From<TimeoutConfig> for TimeoutSetting {
    fn from(config: TimeoutConfig) -> Self {
        let (connect, read) = (config.connect.as_secs_f64(), config.read.as_secs_f64());
        if config.connect == config.read {
            Self::Uniform(connect)
        } else {
            Self::Pair(connect, read)
        }
    }
}

fn positive_secs(value: f64, name: &str) -> Result<Duration> {
    let invalid = || {
        WeaveError::InvalidInput(format!(
            "'{name}' timeout must be a positive number of seconds, given: {value}"
        ))
    };
    if !value.is_finite() || value <= 0.0 {
        return Err(invalid());
    }
    Duration::try_from_secs_f64(value).map_err(|_| invalid())
}

/// Proxy as written in configuration: one URL for both schemes or an explicit
/// per-scheme map.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ProxySetting {
    Url(String),
    Schemes {
        #[serde(default)]
        http: Option<String>,
        #[serde(default)]
        https: Option<String>,
    },
}

/// Normalized proxy configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProxyConfig {
    http: Option<String>,
    https: Option<String>,
}

impl ProxyConfig {
    /// No proxy at all.
    pub fn none() -> Self {
        Self::default()
    }

    /// Same proxy for both schemes.
    pub fn from_url(url: impl Into<String>) -> Self {
        let url = url.into();
        Self { http: Some(url.clone()), https: Some(url) }
    }

    pub fn from_schemes(http: Option<String>, https: Option<String>) -> Self {
        Self { http: non_empty(http), https: non_empty(https) }
    }

    /// Resolves the proxy from an explicit setting or, when allowed, from the
    /// process environment.
    ///
    /// An explicit setting always wins over `trust_env`.
    pub fn resolve(explicit: Option<&ProxySetting>, trust_env: bool) -> Self {
        Self::resolve_with(explicit, trust_env, |key| std::env::var(key).ok())
    }

    /// Same as [`ProxyConfig::resolve`] with an injectable variable lookup.
    pub fn resolve_with<F>(explicit: Option<&ProxySetting>, trust_env: bool, lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        match explicit {
            Some(ProxySetting::Url(url)) => return Self::from_url(url.clone()),
            Some(ProxySetting::Schemes { http, https }) => {
                return Self::from_schemes(http.clone(), https.clone());
            }
            None => {}
        }
        if !trust_env {
            return Self::none();
        }

        let first = |upper: &str, lower: &str| {
            non_empty(lookup(upper)).or_else(|| non_empty(lookup(lower)))
        };
        Self { http: first("HTTP_PROXY", "http_proxy"), https: first("HTTPS_PROXY", "https_proxy") }
    }

    pub fn http(&self) -> Option<&str> {
        self.http.as_deref()
    }

    pub fn https(&self) -> Option<&str> {
        self.https.as_deref()
    }

    /// Single proxy for the pooled transport, preferring the https one.
    pub fn pooled(&self) -> Option<&str> {
        self.https().or_else(|| self.http())
    }

    pub fn is_empty(&self) -> bool {
        self.http.is_none() && self.https.is_none()
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

/// Batch settings as written in configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BatchSettings {
    /// `None` keeps the batch in manual mode.
    pub batch_size: Option<usize>,
    pub dynamic: bool,
    pub target_latency_secs: f64,
    pub timeout_retries: u32,
    pub rolling_window_size: usize,
    pub raise_on_item_error: bool,
}

impl Default for BatchSettings {
    fn default() -> Self {
        Self {
            batch_size: None,
            dynamic: false,
            target_latency_secs: crate::constants::DEFAULT_TARGET_LATENCY_SECS,
            timeout_retries: 0,
            rolling_window_size: crate::constants::DEFAULT_ROLLING_WINDOW_SIZE,
            raise_on_item_error: true,
        }
    }
}

/// Complete client configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct ClientConfig {
    pub url: String,
    #[serde(default)]
    pub timeout: TimeoutConfig,
    #[serde(default)]
    pub proxy: Option<ProxySetting>,
    #[serde(default)]
    pub trust_env: bool,
    #[serde(default)]
    pub additional_headers: BTreeMap<String, String>,
    #[serde(default)]
    pub credentials: Option<Credential>,
    #[serde(default)]
    pub batch: BatchSettings,
}

impl ClientConfig {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            timeout: TimeoutConfig::default(),
            proxy: None,
            trust_env: false,
            additional_headers: BTreeMap::new(),
            credentials: None,
            batch: BatchSettings::default(),
        }
    }

    /// Proxy after applying `trust_env`.
    pub fn resolved_proxy(&self) -> ProxyConfig {
        ProxyConfig::resolve(self.proxy.as_ref(), self.trust_env)
    }
}

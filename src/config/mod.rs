//! Configuration for the IPFS client and transport.

use crate::errors::{ConfigurationError, IpfsError, IpfsResult};
use crate::transport::fault::{FailureStrategy, NeverFail};
use std::sync::Arc;
use std::time::Duration;
use tracing::warn;
use url::Url;

/// Default daemon API port.
pub const DEFAULT_PORT: u16 = 5001;

/// Default API path on the daemon.
pub const DEFAULT_API_PATH: &str = "/api/v0";

/// Default wait per poll iteration while a fetch is in flight.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(40);

/// Configuration for the IPFS client.
#[derive(Clone, Debug)]
pub struct IpfsConfig {
    /// Daemon host name or address.
    pub host: String,

    /// Daemon API port.
    pub port: u16,

    /// URL scheme prefix, `http://` or `https://`.
    pub protocol: String,

    /// API path on the daemon.
    pub api_path: String,

    /// Server-side timeout as a daemon duration string (e.g. `2m`), sent as a
    /// request parameter. The client does not enforce it.
    pub timeout: Option<String>,

    /// Enables wire-level trace logging on the connection.
    pub verbose: bool,

    /// Maximum wait per poll iteration; bounds cancellation latency.
    pub poll_interval: Duration,

    /// Connection timeout.
    pub connect_timeout: Option<Duration>,

    /// TCP keepalive interval.
    pub tcp_keepalive: Duration,

    /// User agent string.
    pub user_agent: String,

    /// Fault injection for error-path tests. [`NeverFail`] in production.
    pub failure_strategy: Arc<dyn FailureStrategy>,
}

impl IpfsConfig {
    /// Creates a new configuration builder.
    pub fn builder() -> IpfsConfigBuilder {
        IpfsConfigBuilder::new()
    }

    /// The prefix every endpoint URL starts with, e.g. `http://localhost:5001/api/v0`.
    pub fn url_prefix(&self) -> String {
        format!("{}{}:{}{}", self.protocol, self.host, self.port, self.api_path)
    }

    /// Validates the configuration.
    pub fn validate(&self) -> IpfsResult<()> {
        if self.host.is_empty() {
            return Err(IpfsError::configuration("Host must not be empty"));
        }

        if self.port == 0 {
            return Err(IpfsError::configuration("Port must not be 0"));
        }

        if self.protocol != "http://" && self.protocol != "https://" {
            return Err(IpfsError::configuration(format!(
                "Protocol must be http:// or https://, got {:?}",
                self.protocol
            )));
        }

        if !self.api_path.is_empty() && !self.api_path.starts_with('/') {
            return Err(IpfsError::configuration("API path must start with '/'"));
        }

        if self.poll_interval.is_zero() {
            return Err(IpfsError::configuration("Poll interval must be positive"));
        }

        if let Some(timeout) = &self.timeout {
            if !is_daemon_duration(timeout) {
                return Err(IpfsError::Configuration(ConfigurationError::InvalidTimeout(
                    timeout.clone(),
                )));
            }
        }

        Url::parse(&self.url_prefix())
            .map_err(|e| IpfsError::configuration(format!("Invalid daemon URL: {}", e)))?;

        Ok(())
    }
}

impl Default for IpfsConfig {
    fn default() -> Self {
        IpfsConfigBuilder::new().into_config()
    }
}

/// Checks the daemon's duration syntax: one or more `<number><unit>` pairs.
fn is_daemon_duration(value: &str) -> bool {
    // Longer units first so "ms" is not read as "m".
    const UNITS: [&str; 7] = ["ns", "us", "µs", "ms", "h", "m", "s"];

    if value == "0" {
        return true;
    }

    let mut rest = value;
    if rest.is_empty() {
        return false;
    }

    while !rest.is_empty() {
        let number_len = rest
            .find(|c: char| !(c.is_ascii_digit() || c == '.'))
            .unwrap_or(rest.len());
        if number_len == 0 || !rest[..number_len].chars().any(|c| c.is_ascii_digit()) {
            return false;
        }
        rest = &rest[number_len..];

        match UNITS.iter().find(|unit| rest.starts_with(*unit)) {
            Some(unit) => rest = &rest[unit.len()..],
            None => return false,
        }
    }

    true
}

/// Builder for IpfsConfig.
pub struct IpfsConfigBuilder {
    host: String,
    port: u16,
    protocol: String,
    api_path: String,
    timeout: Option<String>,
    verbose: bool,
    poll_interval: Duration,
    connect_timeout: Option<Duration>,
    tcp_keepalive: Duration,
    user_agent: Option<String>,
    failure_strategy: Arc<dyn FailureStrategy>,
}

impl IpfsConfigBuilder {
    /// Creates a new builder.
    pub fn new() -> Self {
        Self {
            host: "localhost".to_string(),
            port: DEFAULT_PORT,
            protocol: "http://".to_string(),
            api_path: DEFAULT_API_PATH.to_string(),
            timeout: None,
            verbose: false,
            poll_interval: DEFAULT_POLL_INTERVAL,
            connect_timeout: Some(Duration::from_secs(30)),
            tcp_keepalive: Duration::from_secs(30),
            user_agent: None,
            failure_strategy: Arc::new(NeverFail),
        }
    }

    /// Overrides settings from `IPFS_HOST`, `IPFS_PORT`, `IPFS_TIMEOUT` and
    /// `IPFS_VERBOSE` when they are set.
    pub fn from_env(mut self) -> Self {
        if let Ok(host) = std::env::var("IPFS_HOST") {
            self.host = host;
        }

        if let Ok(port) = std::env::var("IPFS_PORT") {
            match port.parse() {
                Ok(port) => self.port = port,
                Err(_) => warn!(value = %port, "ignoring unparsable IPFS_PORT"),
            }
        }

        if let Ok(timeout) = std::env::var("IPFS_TIMEOUT") {
            self.timeout = Some(timeout);
        }

        if let Ok(val) = std::env::var("IPFS_VERBOSE") {
            self.verbose = val.to_lowercase() == "true" || val == "1";
        }

        self
    }

    /// Sets the daemon host.
    pub fn host(mut self, host: impl Into<String>) -> Self {
        self.host = host.into();
        self
    }

    /// Sets the daemon API port.
    pub fn port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    /// Sets the URL scheme prefix (`http://` or `https://`).
    pub fn protocol(mut self, protocol: impl Into<String>) -> Self {
        self.protocol = protocol.into();
        self
    }

    /// Sets the API path.
    pub fn api_path(mut self, api_path: impl Into<String>) -> Self {
        self.api_path = api_path.into();
        self
    }

    /// Sets the server-side timeout (e.g. `30s`, `2m`).
    pub fn timeout(mut self, timeout: impl Into<String>) -> Self {
        self.timeout = Some(timeout.into());
        self
    }

    /// Enables verbose connection logging.
    pub fn verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }

    /// Sets the poll interval.
    pub fn poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    /// Sets the connection timeout. `None` waits for the OS.
    pub fn connect_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.connect_timeout = timeout;
        self
    }

    /// Sets the TCP keepalive interval.
    pub fn tcp_keepalive(mut self, interval: Duration) -> Self {
        self.tcp_keepalive = interval;
        self
    }

    /// Sets the user agent string.
    pub fn user_agent(mut self, ua: impl Into<String>) -> Self {
        self.user_agent = Some(ua.into());
        self
    }

    /// Installs a fault-injection strategy.
    pub fn failure_strategy<F: FailureStrategy + 'static>(mut self, strategy: F) -> Self {
        self.failure_strategy = Arc::new(strategy);
        self
    }

    fn into_config(self) -> IpfsConfig {
        let user_agent = self
            .user_agent
            .unwrap_or_else(|| format!("integrations-ipfs/{}", env!("CARGO_PKG_VERSION")));

        IpfsConfig {
            host: self.host,
            port: self.port,
            protocol: self.protocol,
            api_path: self.api_path,
            timeout: self.timeout,
            verbose: self.verbose,
            poll_interval: self.poll_interval,
            connect_timeout: self.connect_timeout,
            tcp_keepalive: self.tcp_keepalive,
            user_agent,
            failure_strategy: self.failure_strategy,
        }
    }

    /// Builds the configuration.
    pub fn build(self) -> IpfsResult<IpfsConfig> {
        let config = self.into_config();
        config.validate()?;
        Ok(config)
    }
}

impl Default for IpfsConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}

//! Connection configuration for the openHAB REST API.
//!
//! Loads defaults, then environment variables, then lets command line flags
//! override individual fields.

use std::env;
use std::time::Duration;

/// Basic-auth credentials.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Credentials {
    pub username: String,
    pub password: Option<String>,
}

/// Where and how to reach the REST API.
#[derive(Debug, Clone)]
pub struct ConnectionConfig {
    /// Host name or address (default: "localhost")
    pub host: String,
    /// TCP port (default: 8080)
    pub port: u16,
    /// Use https (default: false)
    pub ssl: bool,
    /// REST base path (default: "rest")
    pub path: String,
    pub credentials: Option<Credentials>,
    /// Per-request timeout (default: 10s)
    pub timeout: Duration,
    /// Accept self-signed certificates
    pub insecure: bool,
}

impl Default for ConnectionConfig {
    fn default() -> Self {
        Self {
            host: "localhost".to_string(),
            port: 8080,
            ssl: false,
            path: "rest".to_string(),
            credentials: None,
            timeout: Duration::from_secs(10),
            insecure: false,
        }
    }
}

impl ConnectionConfig {
    /// Load configuration from environment variables.
    ///
    /// Environment variables:
    /// - `OPENHAB_HOST`: host name (default: "localhost")
    /// - `OPENHAB_PORT`: port (default: 8080)
    /// - `OPENHAB_SSL`: "1" or "true" to use https
    /// - `OPENHAB_USERNAME` / `OPENHAB_PASSWORD`: basic-auth credentials
    /// - `OPENHAB_TIMEOUT`: request timeout in seconds (default: 10)
    pub fn load() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut cfg = Self::default();

        if let Some(host) = lookup("OPENHAB_HOST") {
            cfg.host = host;
        }

        if let Some(port_str) = lookup("OPENHAB_PORT") {
            if let Ok(port) = port_str.parse() {
                cfg.port = port;
            }
        }

        if let Some(ssl) = lookup("OPENHAB_SSL") {
            cfg.ssl = matches!(ssl.to_ascii_lowercase().as_str(), "1" | "true" | "yes");
        }

        if let Some(username) = lookup("OPENHAB_USERNAME") {
            cfg.credentials = Some(Credentials {
                username,
                password: lookup("OPENHAB_PASSWORD"),
            });
        }

        if let Some(timeout_str) = lookup("OPENHAB_TIMEOUT") {
            if let Ok(secs) = timeout_str.parse::<f64>() {
                match Duration::try_from_secs_f64(secs) {
                    Ok(timeout) if !timeout.is_zero() => cfg.timeout = timeout,
                    _ => {}
                }
            }
        }

        cfg
    }

    /// `scheme://host:port/path`, without a trailing slash.
    pub fn base_url(&self) -> String {
        let scheme = if self.ssl { "https" } else { "http" };
        let path = self.path.trim_matches('/');
        if path.is_empty() {
            format!("{}://{}:{}", scheme, self.host, self.port)
        } else {
            format!("{}://{}:{}/{}", scheme, self.host, self.port, path)
        }
    }

    pub fn item_url(&self, name: &str) -> String {
        format!("{}/items/{}", self.base_url(), name)
    }

    pub fn thing_url(&self, uid: &str) -> String {
        format!("{}/things/{}", self.base_url(), uid)
    }
}

//! Listener, TLS, and HTTP limits of the attempt API.
//!
//! Service-level settings (which operations are retired) live in
//! [`crate::service::ServerConfig`]; this file only covers the transport.

use std::path::PathBuf;
use std::time::Duration;

/// How the attempt API listens and how long it lets calls run.
#[derive(Debug, Clone)]
pub struct NetworkConfig {
    pub host: String,
    /// `0` lets the OS pick; `NetworkModule::start` reports the bound port.
    pub port: u16,
    /// Serve HTTPS when set, plain HTTP otherwise.
    pub tls: Option<TlsConfig>,
    /// Browser origins allowed to call the API. `"*"` allows any.
    pub cors_origins: Vec<String>,
    /// Deadline for one HTTP call; the client gets `408` past it. The
    /// operation itself keeps running and stays counted as in flight.
    pub request_timeout: Duration,
    /// Upper bound on waiting for in-flight operations at shutdown.
    pub drain_timeout: Duration,
}

impl NetworkConfig {
    /// `host:port` string handed to the TCP listener.
    #[must_use]
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 0,
            tls: None,
            cors_origins: vec!["*".to_string()],
            request_timeout: Duration::from_secs(30),
            drain_timeout: Duration::from_secs(30),
        }
    }
}

/// PEM files for HTTPS. Both are read once, when `serve` starts.
#[derive(Debug, Clone)]
pub struct TlsConfig {
    pub cert_path: PathBuf,
    pub key_path: PathBuf,
}

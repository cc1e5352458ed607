//! Client configuration.
//!
//! All client behaviour is controlled through [`ClientConfig`], built via
//! its [`ClientConfigBuilder`]. The CLI maps its flags onto the same builder.

use crate::error::StegError;
use crate::mode::Mode;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Default server the CLI talks to (the service's development address).
pub const DEFAULT_BASE_URL: &str = "http://127.0.0.1:5000";

/// Request-size limit enforced by the service (16 MiB).
pub const DEFAULT_MAX_UPLOAD_BYTES: usize = 16 * 1024 * 1024;

/// How long an object URL for a file result stays resolvable.
pub const DEFAULT_OBJECT_URL_TTL_SECS: u64 = 60;

/// Configuration for a [`crate::client::StegClient`].
///
/// # Example
/// ```rust
/// use stegweb::ClientConfig;
///
/// let config = ClientConfig::builder()
///     .base_url("http://stego.local:8080")
///     .request_timeout_secs(Some(30))
///     .build()
///     .unwrap();
/// assert_eq!(config.endpoint(stegweb::Mode::Decode), "http://stego.local:8080/decode");
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClientConfig {
    /// Scheme, host and port of the service. Default: [`DEFAULT_BASE_URL`].
    pub base_url: String,

    /// Path of the encode endpoint. Default: `/encode`.
    pub encode_path: String,

    /// Path of the decode endpoint. Default: `/decode`.
    pub decode_path: String,

    /// Per-request timeout in seconds. Default: 120.
    ///
    /// `None` waits forever, which is how the browser form behaves; a hung
    /// server then hangs the workflow too.
    pub request_timeout_secs: Option<u64>,

    /// Seconds before a file result's object URL is released. Default: 60.
    ///
    /// Must be non-zero.
    pub object_url_ttl_secs: u64,

    /// Largest upload (carrier + secret) accepted before submission. Default: 16 MiB.
    pub max_upload_bytes: usize,

    /// Directory that auto-initiated downloads are written to. Default: `.`.
    pub download_dir: PathBuf,

    /// Permit a second submission while one is in flight. Default: false.
    ///
    /// When enabled, concurrent results overwrite each other in the view
    /// (last write wins).
    pub allow_overlapping: bool,

    /// `User-Agent` header sent with every request.
    pub user_agent: String,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            encode_path: "/encode".to_string(),
            decode_path: "/decode".to_string(),
            request_timeout_secs: Some(120),
            object_url_ttl_secs: DEFAULT_OBJECT_URL_TTL_SECS,
            max_upload_bytes: DEFAULT_MAX_UPLOAD_BYTES,
            download_dir: PathBuf::from("."),
            allow_overlapping: false,
            user_agent: concat!("stegweb/", env!("CARGO_PKG_VERSION")).to_string(),
        }
    }
}

impl ClientConfig {
    /// Create a new builder for `ClientConfig`.
    pub fn builder() -> ClientConfigBuilder {
        ClientConfigBuilder {
            config: Self::default(),
        }
    }

    /// Full URL of the endpoint serving `mode`.
    pub fn endpoint(&self, mode: Mode) -> String {
        let path = match mode {
            Mode::Encode => &self.encode_path,
            Mode::Decode => &self.decode_path,
        };
        join_url(&self.base_url, path)
    }
}

/// Builder for [`ClientConfig`].
#[derive(Debug)]
pub struct ClientConfigBuilder {
    config: ClientConfig,
}

impl ClientConfigBuilder {
    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.config.base_url = url.into();
        self
    }

    pub fn encode_path(mut self, path: impl Into<String>) -> Self {
        self.config.encode_path = path.into();
        self
    }

    pub fn decode_path(mut self, path: impl Into<String>) -> Self {
        self.config.decode_path = path.into();
        self
    }

    pub fn request_timeout_secs(mut self, secs: Option<u64>) -> Self {
        self.config.request_timeout_secs = secs;
        self
    }

    pub fn object_url_ttl_secs(mut self, secs: u64) -> Self {
        self.config.object_url_ttl_secs = secs;
        self
    }

    pub fn max_upload_bytes(mut self, n: usize) -> Self {
        self.config.max_upload_bytes = n;
        self
    }

    pub fn download_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.config.download_dir = dir.into();
        self
    }

    pub fn allow_overlapping(mut self, v: bool) -> Self {
        self.config.allow_overlapping = v;
        self
    }

    pub fn user_agent(mut self, ua: impl Into<String>) -> Self {
        self.config.user_agent = ua.into();
        self
    }

    /// Build the configuration, validating constraints.
    pub fn build(self) -> Result<ClientConfig, StegError> {
        let c = &self.config;
        if !(c.base_url.starts_with("http://") || c.base_url.starts_with("https://")) {
            return Err(StegError::InvalidConfig(format!(
                "Server URL must start with http:// or https://, got '{}'",
                c.base_url
            )));
        }
        if reqwest::Url::parse(&c.base_url).is_err() {
            return Err(StegError::InvalidConfig(format!(
                "Server URL '{}' is not a valid URL",
                c.base_url
            )));
        }
        if c.request_timeout_secs == Some(0) {
            return Err(StegError::InvalidConfig(
                "Request timeout must be ≥ 1 second (omit it to wait forever)".into(),
            ));
        }
        if c.object_url_ttl_secs == 0 {
            return Err(StegError::InvalidConfig(
                "Object URL lifetime must be ≥ 1 second".into(),
            ));
        }
        if c.max_upload_bytes == 0 {
            return Err(StegError::InvalidConfig(
                "Upload limit must be ≥ 1 byte".into(),
            ));
        }
        Ok(self.config)
    }
}

/// Join a base URL and an endpoint path with exactly one slash between them.
fn join_url(base: &str, path: &str) -> String {
    format!(
        "{}/{}",
        base.trim_end_matches('/'),
        path.trim_start_matches('/')
    )
}

use std::path::Path;
use std::time::Duration;

use anyhow::Context;
use serde::Deserialize;

use crate::handlers::DEFAULT_VIDEO_PATH;
use crate::http::parser::ReadLimits;
use crate::server::ServerOptions;

/// Environment variable naming an optional YAML config file.
pub const CONFIG_ENV: &str = "RAWHTTP_CONFIG";
/// Environment variable overriding the listen address.
pub const LISTEN_ENV: &str = "LISTEN";

const DEFAULT_LISTEN_ADDR: &str = "127.0.0.1:42069";

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Config {
    pub listen_addr: String,
    /// One of `trace`, `debug`, `info`, `warn`, `error`.
    pub log_level: String,
    pub read_timeout_secs: Option<u64>,
    pub max_request_bytes: Option<usize>,
    /// Base URL the `/httpbin/` route relays to.
    pub upstream: String,
    /// File served by the `/video` route.
    pub video_path: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            listen_addr: DEFAULT_LISTEN_ADDR.to_string(),
            log_level: "info".to_string(),
            read_timeout_secs: None,
            max_request_bytes: None,
            upstream: "http://httpbin.org".to_string(),
            video_path: DEFAULT_VIDEO_PATH.to_string(),
        }
    }
}

impl Config {
    /// Loads the file named by `RAWHTTP_CONFIG` (if set), then applies `LISTEN`.
    pub fn load() -> anyhow::Result<Self> {
        let mut cfg = match std::env::var(CONFIG_ENV) {
            Ok(path) => Self::from_file(&path)?,
            Err(_) => Self::default(),
        };

        if let Ok(addr) = std::env::var(LISTEN_ENV) {
            cfg.listen_addr = addr;
        }
        Ok(cfg)
    }

    pub fn from_file(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        Self::from_yaml(&raw)
            .with_context(|| format!("Invalid config file {}", path.display()))
    }

    pub fn from_yaml(raw: &str) -> anyhow::Result<Self> {
        let cfg: Config = serde_yaml::from_str(raw)?;
        cfg.log_level()?;
        Ok(cfg)
    }

    pub fn log_level(&self) -> anyhow::Result<tracing::Level> {
        self.log_level
            .parse()
            .map_err(|_| anyhow::anyhow!("Unknown log level {:?}", self.log_level))
    }

    pub fn server_options(&self) -> ServerOptions {
        ServerOptions {
            read_timeout: self.read_timeout_secs.map(Duration::from_secs),
            limits: ReadLimits {
                max_request_bytes: self.max_request_bytes,
                ..ReadLimits::default()
            },
        }
    }
}

//! Shared configuration for the scenelink daemon.
//!
//! Values are layered by [`ortho_config`]: built-in defaults first, then an
//! optional TOML file (`--config-path` or `SCENELINK_CONFIG_PATH`), then
//! `SCENELINK_*` environment variables, and finally command-line flags.

mod defaults;
mod endpoint;
mod logging;

use std::time::Duration;

use ortho_config::OrthoConfig;
use serde::{Deserialize, Serialize};

pub use defaults::{
    DEFAULT_IDLE_POLL_MS, DEFAULT_INVOCATION_TIMEOUT_MS, DEFAULT_LISTEN_HOST, DEFAULT_LOG_FILTER,
    DEFAULT_MAX_FRAME_BYTES, DEFAULT_PORT, default_idle_poll_ms, default_invocation_timeout_ms,
    default_listen_endpoint, default_log_filter, default_log_filter_string, default_log_format,
    default_max_frame_bytes,
};
pub use endpoint::{EndpointParseError, ListenEndpoint};
pub use logging::{LogFormat, LogFormatParseError};

/// Resolved daemon configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize, OrthoConfig)]
#[ortho_config(prefix = "SCENELINK")]
pub struct Config {
    /// Address the daemon listens on, written as `tcp://host:port`.
    #[serde(default = "default_listen_endpoint")]
    #[ortho_config(default = default_listen_endpoint())]
    pub listen: ListenEndpoint,
    /// `tracing` filter expression.
    #[serde(default = "default_log_filter_string")]
    #[ortho_config(default = default_log_filter_string())]
    pub log_filter: String,
    /// Log output format.
    #[serde(default = "default_log_format")]
    #[ortho_config(default = default_log_format())]
    pub log_format: LogFormat,
    /// Milliseconds the network thread waits for the host to run an
    /// invocation before answering with an internal error.
    #[serde(default = "default_invocation_timeout_ms")]
    #[ortho_config(default = default_invocation_timeout_ms())]
    pub invocation_timeout_ms: u64,
    /// Milliseconds the poll loop sleeps when there is nothing to do.
    #[serde(default = "default_idle_poll_ms")]
    #[ortho_config(default = default_idle_poll_ms())]
    pub idle_poll_ms: u64,
    /// Largest accepted request line in bytes.
    #[serde(default = "default_max_frame_bytes")]
    #[ortho_config(default = default_max_frame_bytes())]
    pub max_frame_bytes: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            listen: default_listen_endpoint(),
            log_filter: default_log_filter_string(),
            log_format: default_log_format(),
            invocation_timeout_ms: default_invocation_timeout_ms(),
            idle_poll_ms: default_idle_poll_ms(),
            max_frame_bytes: default_max_frame_bytes(),
        }
    }
}

impl Config {
    /// Endpoint the daemon binds.
    #[must_use]
    pub fn listen(&self) -> &ListenEndpoint {
        &self.listen
    }

    /// Log filter expression.
    #[must_use]
    pub fn log_filter(&self) -> &str {
        &self.log_filter
    }

    /// Log output format.
    #[must_use]
    pub fn log_format(&self) -> LogFormat {
        self.log_format
    }

    /// Bound on the bridge rendezvous. Never zero.
    #[must_use]
    pub fn invocation_timeout(&self) -> Duration {
        Duration::from_millis(self.invocation_timeout_ms.max(1))
    }

    /// Sleep between idle poll loop iterations.
    #[must_use]
    pub fn idle_poll_interval(&self) -> Duration {
        Duration::from_millis(self.idle_poll_ms)
    }

    /// Largest accepted request line in bytes.
    #[must_use]
    pub fn max_frame_bytes(&self) -> usize {
        self.max_frame_bytes
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_listen_on_well_known_port() {
        let config = Config::default();
        assert_eq!(config.listen().port(), 55557);
        assert_eq!(config.listen().host(), "0.0.0.0");
    }

    #[test]
    fn zero_timeout_is_clamped() {
        let config = Config {
            invocation_timeout_ms: 0,
            ..Config::default()
        };
        assert_eq!(config.invocation_timeout(), Duration::from_millis(1));
    }

    #[test]
    fn default_timeout_is_thirty_seconds() {
        assert_eq!(
            Config::default().invocation_timeout(),
            Duration::from_secs(30)
        );
    }
}

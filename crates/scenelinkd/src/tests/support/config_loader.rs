//! Configuration loaders for scenarios covering success and failure paths.

use std::ffi::OsString;
use std::sync::Arc;

use ortho_config::{OrthoConfig, OrthoError};

use scenelink_config::{Config, ListenEndpoint};

use crate::bootstrap::ConfigLoader;

/// Configuration bound to an ephemeral loopback port with a short timeout.
#[must_use]
pub fn loopback_config() -> Config {
    Config {
        listen: ListenEndpoint::new("127.0.0.1", 0),
        invocation_timeout_ms: 500,
        idle_poll_ms: 2,
        ..Config::default()
    }
}

/// Loader that always yields [`loopback_config`].
#[derive(Debug, Default, Clone, Copy)]
pub struct TestConfigLoader;

impl ConfigLoader for TestConfigLoader {
    fn load(&self) -> Result<Config, Arc<OrthoError>> {
        Ok(loopback_config())
    }
}

/// Loader that intentionally fails by passing an unsupported endpoint.
#[derive(Debug, Default, Clone, Copy)]
pub struct FailingConfigLoader;

impl ConfigLoader for FailingConfigLoader {
    fn load(&self) -> Result<Config, Arc<OrthoError>> {
        let args = vec![
            OsString::from("scenelinkd"),
            OsString::from("--listen"),
            OsString::from("invalid://endpoint"),
        ];
        Config::load_from_iter(args)
    }
}

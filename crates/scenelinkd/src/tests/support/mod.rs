//! Shared doubles and helpers for the scenelinkd test suites.

mod client;
mod config_loader;
mod context;
mod registry;
mod reporter;

pub use client::TestClient;
pub use config_loader::{FailingConfigLoader, TestConfigLoader, loopback_config};
pub use context::InlineContext;
pub use registry::{PAUSE, paced_registry, test_registry};
pub use reporter::{HealthEvent, RecordingHealthReporter};

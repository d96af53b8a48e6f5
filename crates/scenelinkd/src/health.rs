//! Structured health reporting for server lifecycle events.

use std::net::SocketAddr;
use std::sync::Arc;

use scenelink_config::Config;

use crate::bootstrap::BootstrapError;
use crate::transport::{ConnectionId, Disconnect};

const HEALTH_TARGET: &str = concat!(env!("CARGO_PKG_NAME"), "::health");

/// Observer trait used to surface lifecycle events to telemetry sinks.
pub trait HealthReporter: Send + Sync {
    /// Invoked before configuration loading begins.
    fn bootstrap_starting(&self);

    /// Invoked after bootstrap completes successfully.
    fn bootstrap_succeeded(&self, config: &Config);

    /// Invoked when bootstrap fails.
    fn bootstrap_failed(&self, error: &BootstrapError);

    /// Invoked once the listening socket is bound.
    fn server_listening(&self, addr: SocketAddr);

    /// Invoked when a client connection is adopted.
    fn client_connected(&self, id: ConnectionId, peer: SocketAddr);

    /// Invoked when a newer client replaces the current one.
    fn client_displaced(&self, disconnect: &Disconnect);

    /// Invoked when the current client goes away for any other reason.
    fn client_disconnected(&self, disconnect: &Disconnect);

    /// Invoked when the network thread exits.
    fn server_stopped(&self);
}

impl<T> HealthReporter for Arc<T>
where
    T: HealthReporter,
{
    fn bootstrap_starting(&self) {
        (**self).bootstrap_starting();
    }

    fn bootstrap_succeeded(&self, config: &Config) {
        (**self).bootstrap_succeeded(config);
    }

    fn bootstrap_failed(&self, error: &BootstrapError) {
        (**self).bootstrap_failed(error);
    }

    fn server_listening(&self, addr: SocketAddr) {
        (**self).server_listening(addr);
    }

    fn client_connected(&self, id: ConnectionId, peer: SocketAddr) {
        (**self).client_connected(id, peer);
    }

    fn client_displaced(&self, disconnect: &Disconnect) {
        (**self).client_displaced(disconnect);
    }

    fn client_disconnected(&self, disconnect: &Disconnect) {
        (**self).client_disconnected(disconnect);
    }

    fn server_stopped(&self) {
        (**self).server_stopped();
    }
}

/// Default reporter that records lifecycle events using `tracing`.
#[derive(Debug, Default, Clone, Copy)]
pub struct StructuredHealthReporter;

impl StructuredHealthReporter {
    /// Builds a new reporter.
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

impl HealthReporter for StructuredHealthReporter {
    fn bootstrap_starting(&self) {
        tracing::info!(
            target: HEALTH_TARGET,
            event = "bootstrap_starting",
            "starting server bootstrap"
        );
    }

    fn bootstrap_succeeded(&self, config: &Config) {
        tracing::info!(
            target: HEALTH_TARGET,
            event = "bootstrap_succeeded",
            listen = %config.listen(),
            log_filter = %config.log_filter(),
            log_format = %config.log_format(),
            invocation_timeout = ?config.invocation_timeout(),
            "server bootstrap completed"
        );
    }

    fn bootstrap_failed(&self, error: &BootstrapError) {
        tracing::error!(
            target: HEALTH_TARGET,
            event = "bootstrap_failed",
            error = %error,
            "server bootstrap failed"
        );
    }

    fn server_listening(&self, addr: SocketAddr) {
        tracing::info!(
            target: HEALTH_TARGET,
            event = "server_listening",
            addr = %addr,
            "listening for automation clients"
        );
    }

    fn client_connected(&self, id: ConnectionId, peer: SocketAddr) {
        tracing::info!(
            target: HEALTH_TARGET,
            event = "client_connected",
            connection = %id,
            peer = %peer,
            "client connected"
        );
    }

    fn client_displaced(&self, disconnect: &Disconnect) {
        tracing::info!(
            target: HEALTH_TARGET,
            event = "client_displaced",
            connection = %disconnect.id,
            peer = %disconnect.peer,
            "client replaced by a newer connection"
        );
    }

    fn client_disconnected(&self, disconnect: &Disconnect) {
        tracing::info!(
            target: HEALTH_TARGET,
            event = "client_disconnected",
            connection = %disconnect.id,
            peer = %disconnect.peer,
            reason = %disconnect.reason,
            "client disconnected"
        );
    }

    fn server_stopped(&self) {
        tracing::info!(
            target: HEALTH_TARGET,
            event = "server_stopped",
            "server stopped"
        );
    }
}

//! Test double for [`HealthReporter`] that records lifecycle events.

use std::net::SocketAddr;
use std::sync::Mutex;

use scenelink_config::Config;

use crate::bootstrap::BootstrapError;
use crate::health::HealthReporter;
use crate::transport::{CloseReason, ConnectionId, Disconnect};

/// Health events tracked during scenarios.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HealthEvent {
    /// Bootstrap started.
    BootstrapStarting,
    /// Bootstrap completed successfully.
    BootstrapSucceeded,
    /// Bootstrap failed with an error description.
    BootstrapFailed(String),
    /// The listener bound its socket.
    Listening(SocketAddr),
    /// A client was adopted.
    ClientConnected(ConnectionId),
    /// A client was replaced by a newer one.
    ClientDisplaced(ConnectionId),
    /// A client went away.
    ClientDisconnected(ConnectionId, CloseReason),
    /// The network thread exited.
    ServerStopped,
}

/// Records health events for assertions.
#[derive(Debug, Default)]
pub struct RecordingHealthReporter {
    events: Mutex<Vec<HealthEvent>>,
}

impl RecordingHealthReporter {
    /// Captures a copy of the recorded events.
    #[must_use]
    pub fn events(&self) -> Vec<HealthEvent> {
        self.events
            .lock()
            .expect("health reporter mutex poisoned")
            .clone()
    }

    fn record(&self, event: HealthEvent) {
        self.events
            .lock()
            .expect("health reporter mutex poisoned")
            .push(event);
    }
}

impl HealthReporter for RecordingHealthReporter {
    fn bootstrap_starting(&self) {
        self.record(HealthEvent::BootstrapStarting);
    }

    fn bootstrap_succeeded(&self, _config: &Config) {
        self.record(HealthEvent::BootstrapSucceeded);
    }

    fn bootstrap_failed(&self, error: &BootstrapError) {
        self.record(HealthEvent::BootstrapFailed(error.to_string()));
    }

    fn server_listening(&self, addr: SocketAddr) {
        self.record(HealthEvent::Listening(addr));
    }

    fn client_connected(&self, id: ConnectionId, _peer: SocketAddr) {
        self.record(HealthEvent::ClientConnected(id));
    }

    fn client_displaced(&self, disconnect: &Disconnect) {
        self.record(HealthEvent::ClientDisplaced(disconnect.id));
    }

    fn client_disconnected(&self, disconnect: &Disconnect) {
        self.record(HealthEvent::ClientDisconnected(
            disconnect.id,
            disconnect.reason.clone(),
        ));
    }

    fn server_stopped(&self) {
        self.record(HealthEvent::ServerStopped);
    }
}

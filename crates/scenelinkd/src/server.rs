//! The network thread: accept, read, dispatch, reply.

use std::net::SocketAddr;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;
use std::time::Duration;

use tracing::{debug, info, warn};

use scenelink_config::{Config, ListenEndpoint};
use scenelink_protocol::Response;

use crate::bridge::ExecutionBridge;
use crate::dispatch::ProtocolEngine;
use crate::health::HealthReporter;
use crate::transport::{Accepted, ConnectionManager, ListenerError};

const SERVER_TARGET: &str = concat!(env!("CARGO_PKG_NAME"), "::server");

/// Automation endpoint server, not yet started.
///
/// Everything the server owns moves onto the network thread when it starts.
/// Restarting is `shutdown`, `join`, then a fresh `start`.
pub struct BridgeServer {
    endpoint: ListenEndpoint,
    manager: ConnectionManager,
    engine: ProtocolEngine,
    reporter: Arc<dyn HealthReporter>,
    idle_poll: Duration,
}

impl BridgeServer {
    /// Prepares a server from the resolved configuration.
    #[must_use]
    pub fn new(
        config: &Config,
        bridge: ExecutionBridge,
        reporter: Arc<dyn HealthReporter>,
    ) -> Self {
        Self {
            endpoint: config.listen().clone(),
            manager: ConnectionManager::new(config.max_frame_bytes()),
            engine: ProtocolEngine::new(bridge),
            reporter,
            idle_poll: config.idle_poll_interval(),
        }
    }

    /// Binds the endpoint and spawns the network thread.
    ///
    /// # Errors
    ///
    /// Returns the bind failure; the process keeps running and the caller
    /// may retry with a different endpoint.
    pub fn start(mut self) -> Result<ServerHandle, ListenerError> {
        let local_addr = self.manager.start(&self.endpoint)?;
        self.reporter.server_listening(local_addr);
        let shutdown = Arc::new(AtomicBool::new(false));
        let flag = Arc::clone(&shutdown);
        let handle = thread::Builder::new()
            .name(String::from("scenelink-network"))
            .spawn(move || self.run(&flag))
            .map_err(|source| ListenerError::Spawn { source })?;
        Ok(ServerHandle {
            shutdown,
            handle: Some(handle),
            local_addr,
        })
    }

    fn run(mut self, shutdown: &AtomicBool) {
        info!(
            target: SERVER_TARGET,
            endpoint = %self.endpoint,
            "server loop running"
        );
        while !shutdown.load(Ordering::SeqCst) {
            if !self.tick() {
                thread::sleep(self.idle_poll);
            }
        }
        if let Some(closed) = self.manager.stop() {
            self.reporter.client_disconnected(&closed);
        }
        self.reporter.server_stopped();
    }

    /// One pass of the loop. Returns whether any work was done.
    fn tick(&mut self) -> bool {
        let mut busy = self.accept();

        let batch = self.manager.read_available();
        if let Some(closed) = &batch.closed {
            self.reporter.client_disconnected(closed);
        }
        let Some(connection) = batch.connection else {
            return busy;
        };

        let total = batch.frames.len();
        for (handled, frame) in batch.frames.into_iter().enumerate() {
            busy = true;
            if let Some(response) = self.engine.handle_frame(frame.as_bytes()) {
                self.reply(&response);
            }
            // A long invocation may have let a newer client queue up. Once it
            // takes over, the old connection's remaining requests never run.
            self.accept();
            if self.manager.current_connection() != Some(connection) {
                let abandoned = total - handled - 1;
                if abandoned > 0 {
                    debug!(
                        target: SERVER_TARGET,
                        connection = %connection,
                        abandoned,
                        "requests from a released connection abandoned"
                    );
                }
                break;
            }
        }
        busy
    }

    fn reply(&mut self, response: &Response) {
        match response.to_line() {
            Ok(line) => {
                self.manager.send(&line);
            }
            Err(error) => warn!(
                target: SERVER_TARGET,
                error = %error,
                "failed to encode reply"
            ),
        }
    }

    fn accept(&mut self) -> bool {
        let Some(accepted) = self.manager.poll() else {
            return false;
        };
        let Accepted {
            id,
            peer,
            displaced,
        } = accepted;
        if let Some(displaced) = &displaced {
            self.reporter.client_displaced(displaced);
        }
        self.reporter.client_connected(id, peer);
        true
    }
}

/// Handle to the running network thread.
///
/// Dropping the handle signals shutdown without waiting.
pub struct ServerHandle {
    shutdown: Arc<AtomicBool>,
    handle: Option<thread::JoinHandle<()>>,
    local_addr: SocketAddr,
}

impl ServerHandle {
    /// Address the server is listening on.
    #[must_use]
    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    /// Asks the network thread to stop after its current iteration.
    pub fn shutdown(&self) {
        self.shutdown.store(true, Ordering::SeqCst);
    }

    /// Waits for the network thread to exit.
    ///
    /// # Errors
    ///
    /// Returns [`ListenerError::ThreadPanic`] if the thread panicked.
    pub fn join(mut self) -> Result<(), ListenerError> {
        match self.handle.take() {
            Some(handle) => handle.join().map_err(|_| ListenerError::ThreadPanic),
            None => Ok(()),
        }
    }
}

impl Drop for ServerHandle {
    fn drop(&mut self) {
        self.shutdown.store(true, Ordering::SeqCst);
    }
}

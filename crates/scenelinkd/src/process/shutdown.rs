//! Termination signals and the bounded drain that follows them.

use std::io;
use std::thread;
use std::time::{Duration, Instant};

use crossbeam_channel::{RecvTimeoutError, bounded};
use signal_hook::consts::signal::{SIGHUP, SIGINT, SIGQUIT, SIGTERM};
use signal_hook::iterator::Signals;
use thiserror::Error;
use tracing::{debug, info, warn};

use super::PROCESS_TARGET;

const TERMINATION_SIGNALS: [i32; 4] = [SIGTERM, SIGINT, SIGQUIT, SIGHUP];
const DRAIN_THREAD_NAME: &str = "scenelink-drain";

/// Blocks the launch sequence until the process is asked to stop.
pub trait ShutdownSignal: Send + Sync {
    /// Returns once shutdown should begin.
    ///
    /// # Errors
    ///
    /// Returns [`ShutdownError::Install`] when the notification source cannot
    /// be set up.
    fn wait(&self) -> Result<(), ShutdownError>;
}

/// Failures while waiting for, or carrying out, shutdown.
#[derive(Debug, Error)]
pub enum ShutdownError {
    /// Installing signal handlers failed.
    #[error("failed to install signal handlers: {source}")]
    Install {
        /// Underlying IO error.
        #[source]
        source: io::Error,
    },
    /// The drain thread could not be created.
    #[error("failed to spawn the shutdown drain: {source}")]
    Spawn {
        /// Thread creation error.
        #[source]
        source: io::Error,
    },
    /// Stopping the server and the host did not finish within the budget.
    #[error("shutdown did not finish within {}ms", budget.as_millis())]
    DrainTimedOut {
        /// Budget that was exceeded.
        budget: Duration,
    },
    /// The drain panicked before reporting back.
    #[error("shutdown drain panicked")]
    DrainPanicked,
}

/// Waits for SIGTERM, SIGINT, SIGQUIT, or SIGHUP.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemShutdownSignal;

impl ShutdownSignal for SystemShutdownSignal {
    fn wait(&self) -> Result<(), ShutdownError> {
        let mut signals = Signals::new(TERMINATION_SIGNALS)
            .map_err(|source| ShutdownError::Install { source })?;
        if let Some(signal) = signals.forever().next() {
            info!(target: PROCESS_TARGET, signal, "shutdown signal received");
        }
        Ok(())
    }
}

/// Runs `drain` on its own thread and waits at most `budget` for it.
///
/// A drain that overruns is left behind; the process is about to exit and
/// a wedged host thread must not keep it alive.
pub(crate) fn drain_within<T, F>(budget: Duration, drain: F) -> Result<T, ShutdownError>
where
    T: Send + 'static,
    F: FnOnce() -> T + Send + 'static,
{
    let (done, finished) = bounded(1);
    let started = Instant::now();
    thread::Builder::new()
        .name(String::from(DRAIN_THREAD_NAME))
        .spawn(move || {
            if done.send(drain()).is_err() {
                debug!(target: PROCESS_TARGET, "drain finished after the launcher gave up");
            }
        })
        .map_err(|source| ShutdownError::Spawn { source })?;

    match finished.recv_timeout(budget) {
        Ok(value) => {
            info!(
                target: PROCESS_TARGET,
                elapsed_ms = started.elapsed().as_millis(),
                "drain finished"
            );
            Ok(value)
        }
        Err(RecvTimeoutError::Timeout) => {
            warn!(
                target: PROCESS_TARGET,
                budget_ms = budget.as_millis(),
                "drain overran its budget; abandoning it"
            );
            Err(ShutdownError::DrainTimedOut { budget })
        }
        Err(RecvTimeoutError::Disconnected) => Err(ShutdownError::DrainPanicked),
    }
}

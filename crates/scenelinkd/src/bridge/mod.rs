//! Cross-thread hand-off from the network thread to the privileged context.
//!
//! The network thread never touches host state. For each `tools/call` it
//! packages the request as a [`PendingInvocation`], submits it to the
//! [`ExecutionContext`], and waits on a single-use channel for the rendered
//! text. The wait is always bounded; a result that arrives after the caller
//! gave up is dropped.

mod context;
mod errors;

use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use std::time::{Duration, Instant};

use crossbeam_channel::{RecvTimeoutError, Sender, bounded};
use tracing::{debug, warn};

use crate::registry::{Arguments, OperationRegistry};

pub use self::context::{
    ContextClosed, ExecutionContext, Task, TaskPump, TaskQueue, WorkerContext, task_queue,
};
pub use self::errors::BridgeError;

pub(crate) use self::context::panic_message;

const BRIDGE_TARGET: &str = concat!(env!("CARGO_PKG_NAME"), "::bridge");

/// One in-flight call travelling to the privileged context.
///
/// The completion channel is written at most once. If the invocation is
/// dropped without running, the waiting caller observes the disconnection.
pub struct PendingInvocation {
    name: String,
    arguments: Arguments,
    completion: Sender<String>,
}

impl PendingInvocation {
    /// Looks up and runs the operation, then publishes its text.
    ///
    /// Failures never escape: an unknown name, an operation error, and a
    /// panic are all rendered as text.
    pub fn complete(self, registry: &OperationRegistry) {
        let text = render(registry, &self.name, &self.arguments);
        if self.completion.send(text).is_err() {
            debug!(
                target: BRIDGE_TARGET,
                operation = %self.name,
                "caller stopped waiting; late result discarded"
            );
        }
    }
}

fn render(registry: &OperationRegistry, name: &str, arguments: &Arguments) -> String {
    let Some(operation) = registry.get(name) else {
        return format!("Unknown tool: {name}");
    };
    match panic::catch_unwind(AssertUnwindSafe(|| operation.invoke(arguments))) {
        Ok(Ok(text)) => text,
        Ok(Err(error)) => format!("Error: {error}"),
        Err(payload) => {
            let message = panic_message(payload.as_ref());
            warn!(
                target: BRIDGE_TARGET,
                operation = %name,
                panic = %message,
                "operation panicked"
            );
            format!("Error: operation '{name}' panicked: {message}")
        }
    }
}

/// Runs registry operations on a privileged context and waits for them.
#[derive(Clone)]
pub struct ExecutionBridge {
    registry: Arc<OperationRegistry>,
    context: Arc<dyn ExecutionContext>,
    timeout: Duration,
}

impl ExecutionBridge {
    /// Builds a bridge that waits at most `timeout` per invocation.
    #[must_use]
    pub fn new(
        registry: Arc<OperationRegistry>,
        context: Arc<dyn ExecutionContext>,
        timeout: Duration,
    ) -> Self {
        Self {
            registry,
            context,
            timeout,
        }
    }

    /// The operation table served by this bridge.
    #[must_use]
    pub fn registry(&self) -> &OperationRegistry {
        &self.registry
    }

    /// Upper bound on a single invocation.
    #[must_use]
    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Invokes `name` on the privileged context and waits for its text.
    ///
    /// # Errors
    ///
    /// Returns [`BridgeError::ContextClosed`] when the context refuses the
    /// task, [`BridgeError::TimedOut`] when no result arrives in time, and
    /// [`BridgeError::Abandoned`] when the task is dropped without running.
    pub fn invoke(&self, name: &str, arguments: Arguments) -> Result<String, BridgeError> {
        let (completion, receiver) = bounded(1);
        let invocation = PendingInvocation {
            name: name.to_owned(),
            arguments,
            completion,
        };
        let registry = Arc::clone(&self.registry);
        let started = Instant::now();
        self.context
            .submit(Box::new(move || invocation.complete(&registry)))
            .map_err(|_| BridgeError::ContextClosed {
                name: name.to_owned(),
            })?;

        match receiver.recv_timeout(self.timeout) {
            Ok(text) => {
                debug!(
                    target: BRIDGE_TARGET,
                    operation = %name,
                    elapsed_ms = started.elapsed().as_millis(),
                    "invocation completed"
                );
                Ok(text)
            }
            Err(RecvTimeoutError::Timeout) => {
                warn!(
                    target: BRIDGE_TARGET,
                    operation = %name,
                    timeout_ms = self.timeout.as_millis(),
                    "invocation timed out"
                );
                Err(BridgeError::TimedOut {
                    name: name.to_owned(),
                    timeout: self.timeout,
                })
            }
            Err(RecvTimeoutError::Disconnected) => Err(BridgeError::Abandoned {
                name: name.to_owned(),
            }),
        }
    }
}

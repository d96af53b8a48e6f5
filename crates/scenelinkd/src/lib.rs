//! Remote-control server for a stateful host application.
//!
//! `scenelinkd` accepts one automation client at a time over TCP and speaks
//! line-delimited JSON-RPC 2.0 with it: `initialize`,
//! `notifications/initialized`, `tools/list`, and `tools/call`. The network
//! thread never touches host state. Each `tools/call` is handed to a
//! privileged execution context through the [`ExecutionBridge`], and the reply
//! waits for that context to finish or for the configured timeout.
//!
//! Operation failures never become JSON-RPC errors. Unknown operations,
//! operation errors, and panics are all rendered into the text of a successful
//! `tools/call` result, so a misbehaving operation cannot wedge the client.
//!
//! The binary wires these parts to an in-memory demo [`scene`]; embedders
//! supply their own [`OperationRegistry`] and [`ExecutionContext`].

pub mod bootstrap;
pub mod bridge;
pub mod dispatch;
mod health;
mod process;
pub mod registry;
pub mod scene;
pub mod server;
mod telemetry;
pub mod transport;

pub use bootstrap::{
    BootstrapError, ConfigLoader, Daemon, StaticConfigLoader, SystemConfigLoader, bootstrap_with,
};
pub use bridge::{BridgeError, ExecutionBridge, ExecutionContext, TaskQueue, WorkerContext};
pub use dispatch::{ProtocolEngine, ProtocolError};
pub use health::{HealthReporter, StructuredHealthReporter};
pub use process::{LaunchError, ShutdownError, ShutdownSignal, SystemShutdownSignal, run_daemon};
pub use registry::{Operation, OperationError, OperationRegistry};
pub use server::{BridgeServer, ServerHandle};
pub use telemetry::{TelemetryError, TelemetryHandle};

#[cfg(test)]
mod tests;

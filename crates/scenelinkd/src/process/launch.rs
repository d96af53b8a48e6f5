//! Supervises launch sequencing and runtime orchestration.

use std::sync::Arc;
use std::time::Duration;

use tracing::info;

use crate::bootstrap::{ConfigLoader, SystemConfigLoader, bootstrap_with};
use crate::bridge::{ExecutionBridge, WorkerContext};
use crate::health::{HealthReporter, StructuredHealthReporter};
use crate::scene::{Scene, SceneState, scene_registry};
use crate::server::BridgeServer;

use super::errors::LaunchError;
use super::shutdown::{ShutdownSignal, SystemShutdownSignal, drain_within};
use super::{PROCESS_TARGET, SHUTDOWN_TIMEOUT};

const WORKER_THREAD_NAME: &str = "scenelink-host";

/// Collaborators required to launch the server runtime.
pub(crate) struct LaunchPlan<L, S> {
    pub(crate) loader: L,
    pub(crate) reporter: Arc<dyn HealthReporter>,
    pub(crate) shutdown: S,
    pub(crate) scene: SceneState,
    /// Upper bound on stopping the server and the host after the signal.
    pub(crate) drain_budget: Duration,
}

/// Runs the server using the production collaborators.
///
/// # Errors
///
/// Returns [`LaunchError`] when any start-up stage fails or the shutdown
/// signal cannot be awaited.
pub fn run_daemon() -> Result<(), LaunchError> {
    let plan = LaunchPlan {
        loader: SystemConfigLoader,
        reporter: Arc::new(StructuredHealthReporter::new()),
        shutdown: SystemShutdownSignal,
        scene: SceneState::demo(),
        drain_budget: SHUTDOWN_TIMEOUT,
    };
    run_daemon_with(plan)
}

/// Runs the server with injected collaborators.
pub(crate) fn run_daemon_with<L, S>(plan: LaunchPlan<L, S>) -> Result<(), LaunchError>
where
    L: ConfigLoader,
    S: ShutdownSignal,
{
    let LaunchPlan {
        loader,
        reporter,
        shutdown,
        scene,
        drain_budget,
    } = plan;

    let daemon = bootstrap_with(&loader, reporter)?;
    let config = daemon.config();
    info!(
        target: PROCESS_TARGET,
        listen = %config.listen(),
        "starting server runtime"
    );

    let worker =
        WorkerContext::spawn(WORKER_THREAD_NAME).map_err(|source| LaunchError::Worker { source })?;
    let registry = scene_registry(&Scene::new(scene))?;
    let bridge = ExecutionBridge::new(
        Arc::new(registry),
        Arc::new(worker.queue()),
        config.invocation_timeout(),
    );
    let server = BridgeServer::new(config, bridge, daemon.reporter()).start()?;

    let waited = shutdown.wait();
    server.shutdown();
    let drained = drain_within(drain_budget, move || {
        let joined = server.join();
        worker.shutdown();
        joined
    });
    waited?;
    drained??;
    info!(
        target: PROCESS_TARGET,
        "shutdown sequence completed"
    );
    Ok(())
}

mod actor;
mod endpoint;
mod event;
mod options;
mod registry;

use std::cmp;
use std::collections::HashMap;
use std::env;
use std::sync::Arc;

use bosun_actor::actor::ActorHandle;
use bosun_common::config::{ClusterConfigEnv, ConfigKeyValue, CONFIG_ENV_PREFIX};
use tokio::sync::oneshot;
use tokio::time::timeout;

pub use endpoint::ExecutorEndpoint;
pub use options::BackendOptions;
pub use registry::{ExecutorRecord, ExecutorRegistry};

use crate::backend::actor::{CoordinatorActor, CoordinatorOptions};
use crate::backend::event::CoordinatorEvent;
use crate::error::{ExecutionError, ExecutionResult};
use crate::id::ExecutorId;
use crate::launcher::TaskLauncher;
use crate::scheduler::TaskScheduler;
use crate::task::TaskDescription;

/// The standalone scheduler backend: the process-local intermediary
/// between the in-process cluster scheduler and remote executors.
///
/// The backend makes no placement decisions of its own. It keeps the
/// executor registry, turns free cores into resource offers, ships launch
/// commands, and reclaims the slots of executors that go away. All state
/// is in memory and rebuilt from scratch on restart.
pub struct StandaloneBackend {
    options: BackendOptions,
    scheduler: Arc<dyn TaskScheduler>,
    registry: ExecutorRegistry,
    coordinator: Option<ActorHandle<CoordinatorActor>>,
    launcher: Option<TaskLauncher>,
}

impl StandaloneBackend {
    pub fn new(scheduler: Arc<dyn TaskScheduler>, options: BackendOptions) -> Self {
        Self {
            options,
            scheduler,
            registry: ExecutorRegistry::default(),
            coordinator: None,
            launcher: None,
        }
    }

    /// Snapshot the forwarded configuration, spawn the coordinator, and
    /// start the launch pump. Must be called exactly once per instance.
    pub fn start(&mut self) -> ExecutionResult<()> {
        if self.coordinator.is_some() {
            return Err(ExecutionError::InternalError(
                "the backend has already been started".to_string(),
            ));
        }
        let (launcher, launch_queue) = TaskLauncher::new();
        let handle = ActorHandle::new(CoordinatorOptions {
            scheduler: Arc::clone(&self.scheduler),
            registry: self.registry.clone(),
            properties: forwarded_properties(),
            launch_queue,
        });
        self.coordinator = Some(handle);
        self.launcher = Some(launcher);
        Ok(())
    }

    /// Request a graceful coordinator shutdown and wait for the
    /// acknowledgement up to the ask timeout. The launch pump is owned by
    /// the coordinator and stops with it; in-flight launches may be lost.
    pub async fn stop(&self) -> ExecutionResult<()> {
        let handle = self.coordinator()?;
        let (tx, rx) = oneshot::channel();
        handle.send(CoordinatorEvent::Stop { result: tx }).await?;
        timeout(self.options.ask_timeout, async {
            rx.await?;
            // The acknowledgement precedes the mailbox teardown; wait for
            // the event loop to exit so no later request can sneak in.
            handle.clone().wait_for_stop().await;
            Ok::<_, ExecutionError>(())
        })
        .await??;
        Ok(())
    }

    /// Enqueue a launch command; never blocks.
    pub fn launch_task(&self, task: TaskDescription) -> ExecutionResult<()> {
        let launcher = self.launcher.as_ref().ok_or_else(|| {
            ExecutionError::InternalError("the backend has not been started".to_string())
        })?;
        launcher.launch(task)
    }

    /// Ask the coordinator to regenerate offers for every executor with
    /// free cores. Used when the scheduler has new work.
    pub async fn revive_offers(&self) -> ExecutionResult<()> {
        self.coordinator()?.send(CoordinatorEvent::ReviveOffers).await?;
        Ok(())
    }

    /// Remove an executor on behalf of higher layers and wait for the
    /// acknowledgement up to the ask timeout.
    pub async fn remove_executor(
        &self,
        executor_id: ExecutorId,
        reason: impl Into<String>,
    ) -> ExecutionResult<()> {
        let (tx, rx) = oneshot::channel();
        self.coordinator()?
            .send(CoordinatorEvent::RemoveExecutor {
                executor_id,
                reason: reason.into(),
                result: tx,
            })
            .await?;
        timeout(self.options.ask_timeout, rx).await??;
        Ok(())
    }

    /// Restore cores the scheduler declined or never launched on.
    pub async fn free_cores(&self, cores: HashMap<ExecutorId, usize>) -> ExecutionResult<()> {
        self.coordinator()?
            .send(CoordinatorEvent::FreeCores { cores })
            .await?;
        Ok(())
    }

    /// The configured override if set, otherwise derived from the cores
    /// currently registered in the cluster.
    pub fn default_parallelism(&self) -> usize {
        self.options
            .default_parallelism
            .unwrap_or_else(|| cmp::max(self.registry.total_cores(), 2))
    }

    /// The aggregate core count; readable from any thread without a lock.
    pub fn total_cores(&self) -> usize {
        self.registry.total_cores()
    }

    /// The surface handed to the transport layer.
    pub fn endpoint(&self) -> ExecutionResult<ExecutorEndpoint> {
        Ok(ExecutorEndpoint {
            handle: self.coordinator()?.clone(),
        })
    }

    fn coordinator(&self) -> ExecutionResult<&ActorHandle<CoordinatorActor>> {
        self.coordinator.as_ref().ok_or_else(|| {
            ExecutionError::InternalError("the backend has not been started".to_string())
        })
    }
}

/// Snapshot of the process configuration forwarded to each registering
/// executor. The backend's own advertised address stays local.
fn forwarded_properties() -> Vec<ConfigKeyValue> {
    env::vars()
        .filter(|(key, _)| {
            key.starts_with(CONFIG_ENV_PREFIX) && key.as_str() != ClusterConfigEnv::HOST_PORT
        })
        .map(|(key, value)| ConfigKeyValue {
            key,
            value: Some(value),
        })
        .collect()
}

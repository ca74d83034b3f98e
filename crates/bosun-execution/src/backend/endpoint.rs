use bosun_actor::actor::ActorHandle;

use crate::backend::actor::CoordinatorActor;
use crate::backend::event::CoordinatorEvent;
use crate::error::ExecutionResult;
use crate::id::{ExecutorId, PeerId, TaskId};
use crate::scheduler::TaskState;
use crate::transport::{ExecutorPeer, PeerAddr};

/// The surface the transport layer drives: inbound executor messages and
/// connection liveness events, all funneled into the coordinator's
/// mailbox in arrival order.
#[derive(Clone)]
pub struct ExecutorEndpoint {
    pub(super) handle: ActorHandle<CoordinatorActor>,
}

impl ExecutorEndpoint {
    /// An executor announces itself and offers `cores` compute slots.
    /// The coordinator replies on `peer` with either `RegisteredExecutor`
    /// or `RegisterExecutorFailed`.
    pub async fn register_executor(
        &self,
        executor_id: ExecutorId,
        host_port: String,
        cores: usize,
        peer: ExecutorPeer,
    ) -> ExecutionResult<()> {
        self.handle
            .send(CoordinatorEvent::RegisterExecutor {
                executor_id,
                host_port,
                cores,
                peer,
            })
            .await?;
        Ok(())
    }

    /// A progress report for a previously launched task.
    pub async fn status_update(
        &self,
        executor_id: ExecutorId,
        task_id: TaskId,
        state: TaskState,
        data: Vec<u8>,
    ) -> ExecutionResult<()> {
        self.handle
            .send(CoordinatorEvent::StatusUpdate {
                executor_id,
                task_id,
                state,
                data,
            })
            .await?;
        Ok(())
    }

    /// The remote actor exited cleanly.
    pub async fn peer_terminated(&self, peer: PeerId) -> ExecutionResult<()> {
        self.handle
            .send(CoordinatorEvent::PeerTerminated { peer })
            .await?;
        Ok(())
    }

    /// The remote transport connection dropped.
    pub async fn peer_disconnected(&self, addr: PeerAddr) -> ExecutionResult<()> {
        self.handle
            .send(CoordinatorEvent::PeerDisconnected { addr })
            .await?;
        Ok(())
    }

    /// The remote transport shut down.
    pub async fn peer_shutdown(&self, addr: PeerAddr) -> ExecutionResult<()> {
        self.handle
            .send(CoordinatorEvent::PeerShutdown { addr })
            .await?;
        Ok(())
    }
}

use std::collections::HashMap;

use bosun_actor::actor::{ActorAction, ActorContext};
use log::{info, warn};
use tokio::sync::oneshot;

use crate::backend::actor::CoordinatorActor;
use crate::backend::registry::ExecutorRecord;
use crate::id::{ExecutorId, PeerId, TaskId};
use crate::scheduler::{ExecutorLossReason, TaskState, WorkerOffer};
use crate::transport::{parse_host_port, ExecutorMessage, ExecutorPeer, PeerAddr};

impl CoordinatorActor {
    pub(super) fn handle_register_executor(
        &mut self,
        _ctx: &mut ActorContext<Self>,
        executor_id: ExecutorId,
        host_port: String,
        cores: usize,
        peer: ExecutorPeer,
    ) -> ActorAction {
        if parse_host_port(&host_port).is_none() {
            warn!("rejecting executor {executor_id} with malformed address {host_port:?}");
            Self::reply(
                &peer,
                ExecutorMessage::RegisterExecutorFailed {
                    reason: format!("invalid host and port: {host_port}"),
                },
            );
            return ActorAction::Continue;
        }
        let record = ExecutorRecord {
            executor_id: executor_id.clone(),
            host_port,
            peer: peer.clone(),
            cores,
        };
        match self.registry.insert(record) {
            Ok(()) => {
                info!("registered executor {executor_id} with {cores} cores");
                Self::reply(
                    &peer,
                    ExecutorMessage::RegisteredExecutor {
                        properties: self.properties.clone(),
                    },
                );
                self.make_offers();
            }
            Err(e) => {
                warn!("rejecting executor registration: {e}");
                Self::reply(
                    &peer,
                    ExecutorMessage::RegisterExecutorFailed {
                        reason: e.to_string(),
                    },
                );
            }
        }
        ActorAction::Continue
    }

    pub(super) fn handle_status_update(
        &mut self,
        _ctx: &mut ActorContext<Self>,
        executor_id: ExecutorId,
        task_id: TaskId,
        state: TaskState,
        data: Vec<u8>,
    ) -> ActorAction {
        // The scheduler owns the task-to-executor map, so the update is
        // forwarded even when the executor is unknown here.
        self.scheduler.status_update(task_id, state, data);
        if state.is_finished() {
            // One terminal update releases exactly one core.
            self.registry.adjust_free(&executor_id, 1);
            self.make_offer(&executor_id);
        }
        ActorAction::Continue
    }

    pub(super) fn handle_revive_offers(&mut self, _ctx: &mut ActorContext<Self>) -> ActorAction {
        self.make_offers();
        ActorAction::Continue
    }

    pub(super) fn handle_remove_executor(
        &mut self,
        _ctx: &mut ActorContext<Self>,
        executor_id: ExecutorId,
        reason: String,
        result: oneshot::Sender<()>,
    ) -> ActorAction {
        self.remove_executor(&executor_id, &reason);
        if result.send(()).is_err() {
            warn!("failed to acknowledge the removal of executor {executor_id}");
        }
        ActorAction::Continue
    }

    pub(super) fn handle_free_cores(
        &mut self,
        _ctx: &mut ActorContext<Self>,
        cores: HashMap<ExecutorId, usize>,
    ) -> ActorAction {
        for (executor_id, delta) in cores {
            self.registry.adjust_free(&executor_id, delta);
        }
        ActorAction::Continue
    }

    pub(super) fn handle_peer_terminated(
        &mut self,
        _ctx: &mut ActorContext<Self>,
        peer: PeerId,
    ) -> ActorAction {
        if let Some(executor_id) = self.registry.lookup_by_peer(peer) {
            self.remove_executor(&executor_id, "peer terminated");
        }
        ActorAction::Continue
    }

    pub(super) fn handle_peer_gone(
        &mut self,
        _ctx: &mut ActorContext<Self>,
        addr: PeerAddr,
        reason: &str,
    ) -> ActorAction {
        if let Some(executor_id) = self.registry.lookup_by_address(&addr) {
            self.remove_executor(&executor_id, reason);
        }
        ActorAction::Continue
    }

    /// Remove the executor and tell the scheduler it is gone. Idempotent:
    /// a liveness event may race with an explicit removal, and the loss
    /// upcall must be delivered at most once per registration.
    fn remove_executor(&mut self, executor_id: &ExecutorId, reason: &str) {
        if self.registry.remove(executor_id).is_some() {
            info!("executor {executor_id} removed: {reason}");
            self.scheduler
                .executor_lost(executor_id, ExecutorLossReason::SlaveLost(reason.to_string()));
        }
    }

    /// Offer the free cores of every executor. The cores are zeroed in
    /// the same lock hold that reads them, so they count as reserved from
    /// this moment and no later round can offer them again. Executors
    /// with nothing free still appear with a zero-core offer.
    fn make_offers(&mut self) {
        let offers = self
            .registry
            .take_free_all()
            .into_iter()
            .map(|(executor_id, host_port, cores)| WorkerOffer {
                executor_id,
                host_port,
                cores,
            })
            .collect::<Vec<_>>();
        self.scheduler.add_resource_offers(offers);
    }

    /// Same reservation discipline for a single executor.
    fn make_offer(&mut self, executor_id: &ExecutorId) {
        if let Some((host_port, cores)) = self.registry.take_free(executor_id) {
            self.scheduler.add_resource_offer(WorkerOffer {
                executor_id: executor_id.clone(),
                host_port,
                cores,
            });
        }
    }

    fn reply(peer: &ExecutorPeer, message: ExecutorMessage) {
        if let Err(e) = peer.send(message) {
            warn!("failed to reply to executor registration: {e}");
        }
    }
}

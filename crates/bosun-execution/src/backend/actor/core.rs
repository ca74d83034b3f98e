use bosun_actor::actor::{Actor, ActorAction, ActorContext};
use log::warn;

use crate::backend::actor::{CoordinatorActor, CoordinatorOptions};
use crate::backend::event::CoordinatorEvent;
use crate::launcher;

impl Actor for CoordinatorActor {
    type Message = CoordinatorEvent;
    type Options = CoordinatorOptions;

    fn name() -> &'static str {
        "StandaloneScheduler"
    }

    fn new(options: CoordinatorOptions) -> Self {
        Self {
            scheduler: options.scheduler,
            registry: options.registry,
            properties: options.properties,
            launch_queue: Some(options.launch_queue),
        }
    }

    fn start(&mut self, ctx: &mut ActorContext<Self>) {
        let Some(queue) = self.launch_queue.take() else {
            warn!("the launch queue has already been taken");
            return;
        };
        ctx.spawn(launcher::run_launcher(self.registry.clone(), queue));
    }

    fn receive(&mut self, ctx: &mut ActorContext<Self>, message: CoordinatorEvent) -> ActorAction {
        match message {
            CoordinatorEvent::RegisterExecutor {
                executor_id,
                host_port,
                cores,
                peer,
            } => self.handle_register_executor(ctx, executor_id, host_port, cores, peer),
            CoordinatorEvent::StatusUpdate {
                executor_id,
                task_id,
                state,
                data,
            } => self.handle_status_update(ctx, executor_id, task_id, state, data),
            CoordinatorEvent::ReviveOffers => self.handle_revive_offers(ctx),
            CoordinatorEvent::RemoveExecutor {
                executor_id,
                reason,
                result,
            } => self.handle_remove_executor(ctx, executor_id, reason, result),
            CoordinatorEvent::FreeCores { cores } => self.handle_free_cores(ctx, cores),
            CoordinatorEvent::PeerTerminated { peer } => self.handle_peer_terminated(ctx, peer),
            CoordinatorEvent::PeerDisconnected { addr } => {
                self.handle_peer_gone(ctx, addr, "peer disconnected")
            }
            CoordinatorEvent::PeerShutdown { addr } => {
                self.handle_peer_gone(ctx, addr, "peer shutdown")
            }
            CoordinatorEvent::Stop { result } => {
                if result.send(()).is_err() {
                    warn!("failed to acknowledge the stop request");
                }
                ActorAction::Stop
            }
        }
    }
}

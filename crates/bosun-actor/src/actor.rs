use log::{error, info};
use tokio::sync::{mpsc, watch};
use tokio::task::{AbortHandle, JoinSet};

const ACTOR_CHANNEL_SIZE: usize = 8;

/// A single-consumer event handler. All messages sent to the actor are
/// processed sequentially by [Actor::receive] on one task, so the actor
/// state needs no internal synchronization.
pub trait Actor: Sized + Send + 'static {
    type Message: Send + 'static;
    type Options;

    /// The well-known name of the actor, used in logs.
    fn name() -> &'static str;

    fn new(options: Self::Options) -> Self;

    /// Called once before the first message is processed.
    fn start(&mut self, _ctx: &mut ActorContext<Self>) {}

    /// Process one message and return the next action.
    /// This method is infallible on purpose: handlers must deal with
    /// recoverable errors internally (usually by logging them) so that a
    /// single bad message can never terminate the event loop.
    /// This method must not block, otherwise the event loop would stall
    /// since all messages are processed sequentially. Slow work belongs in
    /// tasks spawned via [ActorContext::spawn].
    fn receive(&mut self, ctx: &mut ActorContext<Self>, message: Self::Message) -> ActorAction;

    /// Called after the event loop has stopped.
    fn stop(self) {}
}

pub enum ActorAction {
    Continue,
    Stop,
}

pub struct ActorContext<T: Actor> {
    handle: ActorHandle<T>,
    /// Tasks spawned by the actor. All of them are aborted
    /// when the actor stops and the context is dropped.
    tasks: JoinSet<()>,
}

impl<T: Actor> ActorContext<T> {
    fn new(handle: &ActorHandle<T>) -> Self {
        Self {
            handle: handle.clone(),
            tasks: JoinSet::new(),
        }
    }

    pub fn handle(&self) -> &ActorHandle<T> {
        &self.handle
    }

    /// Spawn a task owned by the actor.
    pub fn spawn(
        &mut self,
        task: impl std::future::Future<Output = ()> + Send + 'static,
    ) -> AbortHandle {
        self.tasks.spawn(task)
    }

    /// Join tasks that have completed since the last message.
    /// Tasks are expected to handle their own errors; anything that
    /// still fails to join (e.g. a panic) is logged here.
    fn reap(&mut self) {
        while let Some(result) = self.tasks.try_join_next() {
            if let Err(e) = result {
                if !e.is_cancelled() {
                    error!("failed to join task spawned by {}: {e}", T::name());
                }
            }
        }
    }
}

pub struct ActorHandle<T: Actor> {
    sender: mpsc::Sender<T::Message>,
    stopped: watch::Receiver<bool>,
}

impl<T: Actor> Clone for ActorHandle<T> {
    fn clone(&self) -> Self {
        Self {
            sender: self.sender.clone(),
            stopped: self.stopped.clone(),
        }
    }
}

impl<T: Actor> ActorHandle<T> {
    /// Create the actor and spawn its event loop on the current runtime.
    /// The event loop runs detached and stops by itself when a handler
    /// returns [ActorAction::Stop].
    pub fn new(options: T::Options) -> Self {
        let (tx, rx) = mpsc::channel(ACTOR_CHANNEL_SIZE);
        let (stopped_tx, stopped_rx) = watch::channel::<bool>(false);
        let handle = Self {
            sender: tx,
            stopped: stopped_rx,
        };
        let runner = ActorRunner {
            actor: T::new(options),
            ctx: ActorContext::new(&handle),
            receiver: rx,
            stopped: stopped_tx,
        };
        tokio::spawn(runner.run());
        handle
    }

    pub async fn send(
        &self,
        message: T::Message,
    ) -> Result<(), mpsc::error::SendError<T::Message>> {
        self.sender.send(message).await
    }

    /// Wait until the actor event loop has exited.
    pub async fn wait_for_stop(mut self) {
        // The receiver error is ignored since the sender must have been
        // dropped in this case, which means the actor has stopped.
        let _ = self.stopped.wait_for(|x| *x).await;
    }
}

struct ActorRunner<T: Actor> {
    actor: T,
    ctx: ActorContext<T>,
    receiver: mpsc::Receiver<T::Message>,
    stopped: watch::Sender<bool>,
}

impl<T: Actor> ActorRunner<T> {
    async fn run(mut self) {
        self.actor.start(&mut self.ctx);
        info!("{} has started", T::name());
        while let Some(message) = self.receiver.recv().await {
            match self.actor.receive(&mut self.ctx, message) {
                ActorAction::Continue => {}
                ActorAction::Stop => break,
            }
            self.ctx.reap();
        }
        // Refuse further sends before the stop flag is raised, so that a
        // handle observing the stop cannot enqueue into a dead mailbox.
        self.receiver.close();
        self.actor.stop();
        info!("{} has stopped", T::name());
        let _ = self.stopped.send(true);
    }
}

#[cfg(test)]
mod tests {
    use tokio::sync::oneshot;

    use super::*;

    struct Accumulator {
        total: i64,
    }

    enum AccumulatorMessage {
        Add {
            value: i64,
        },
        Total {
            reply: oneshot::Sender<i64>,
        },
        /// Double the total in a spawned task and send the result back
        /// through the actor's own mailbox.
        Fork,
        Stop,
    }

    impl Actor for Accumulator {
        type Message = AccumulatorMessage;
        type Options = i64;

        fn name() -> &'static str {
            "Accumulator"
        }

        fn new(options: i64) -> Self {
            Self { total: options }
        }

        fn receive(
            &mut self,
            ctx: &mut ActorContext<Self>,
            message: Self::Message,
        ) -> ActorAction {
            match message {
                AccumulatorMessage::Add { value } => {
                    self.total += value;
                    ActorAction::Continue
                }
                AccumulatorMessage::Total { reply } => {
                    let _ = reply.send(self.total);
                    ActorAction::Continue
                }
                AccumulatorMessage::Fork => {
                    let handle = ctx.handle().clone();
                    let value = self.total;
                    ctx.spawn(async move {
                        let _ = handle.send(AccumulatorMessage::Add { value }).await;
                    });
                    ActorAction::Continue
                }
                AccumulatorMessage::Stop => ActorAction::Stop,
            }
        }
    }

    async fn total(handle: &ActorHandle<Accumulator>) -> i64 {
        let (tx, rx) = oneshot::channel();
        handle
            .send(AccumulatorMessage::Total { reply: tx })
            .await
            .unwrap();
        rx.await.unwrap()
    }

    #[tokio::test]
    async fn test_actor_processes_messages_in_order() {
        let handle = ActorHandle::<Accumulator>::new(1);
        handle
            .send(AccumulatorMessage::Add { value: 2 })
            .await
            .unwrap();
        handle
            .send(AccumulatorMessage::Add { value: 3 })
            .await
            .unwrap();
        assert_eq!(total(&handle).await, 6);
    }

    #[tokio::test]
    async fn test_actor_spawned_task_can_send_to_mailbox() {
        let handle = ActorHandle::<Accumulator>::new(21);
        handle.send(AccumulatorMessage::Fork).await.unwrap();
        // The spawned task races with the query, so poll until it lands.
        for _ in 0..100 {
            if total(&handle).await == 42 {
                return;
            }
            tokio::time::sleep(std::time::Duration::from_millis(10)).await;
        }
        panic!("the forked addition never arrived");
    }

    #[tokio::test]
    async fn test_actor_handle_wait_for_stop() {
        let handle = ActorHandle::<Accumulator>::new(0);
        handle.send(AccumulatorMessage::Stop).await.unwrap();
        handle.clone().wait_for_stop().await;
        // Multiple handles can wait for the same actor to stop.
        handle.wait_for_stop().await;
    }

    #[tokio::test]
    async fn test_actor_send_fails_after_stop() {
        let handle = ActorHandle::<Accumulator>::new(0);
        handle.send(AccumulatorMessage::Stop).await.unwrap();
        handle.clone().wait_for_stop().await;
        let result = handle.send(AccumulatorMessage::Add { value: 1 }).await;
        assert!(result.is_err());
    }
}

use log::{debug, warn};
use tokio::sync::mpsc;

use crate::backend::ExecutorRegistry;
use crate::error::{ExecutionError, ExecutionResult};
use crate::task::TaskDescription;
use crate::transport::ExecutorMessage;

/// The sending half of the launch queue. The cluster scheduler may call
/// `launch` from within a critical section, so enqueueing never blocks
/// and never touches the network; the pump worker does the rest.
pub(crate) struct TaskLauncher {
    queue: mpsc::UnboundedSender<TaskDescription>,
}

impl TaskLauncher {
    pub fn new() -> (Self, mpsc::UnboundedReceiver<TaskDescription>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { queue: tx }, rx)
    }

    pub fn launch(&self, task: TaskDescription) -> ExecutionResult<()> {
        self.queue
            .send(task)
            .map_err(|_| ExecutionError::InternalError("the launch queue is closed".to_string()))
    }
}

/// Drain the launch queue one task at a time and forward each launch
/// command to its target executor. Tasks for executors that are gone by
/// send time are dropped, as are tasks whose peer send fails; the loop
/// itself never exits on an error.
pub(crate) async fn run_launcher(
    registry: ExecutorRegistry,
    mut queue: mpsc::UnboundedReceiver<TaskDescription>,
) {
    while let Some(task) = queue.recv().await {
        let Some(record) = registry.lookup(&task.executor_id) else {
            warn!(
                "dropping task {} for unknown executor {}",
                task.task_id, task.executor_id
            );
            continue;
        };
        debug!("launching task {} on executor {}", task.task_id, task.executor_id);
        // TODO: reschedule the task when the send fails
        if let Err(e) = record.peer.send(ExecutorMessage::LaunchTask { task }) {
            warn!("failed to send launch command: {e}");
        }
    }
}

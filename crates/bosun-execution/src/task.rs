use crate::id::{ExecutorId, TaskId};

/// A launch command for one task on a specific executor.
/// The payload is an opaque serialized task; the backend never inspects it.
/// Descriptions have no persistent identity: they traverse the launch
/// queue once and are discarded after the send.
#[derive(Debug, Clone)]
pub struct TaskDescription {
    pub task_id: TaskId,
    pub executor_id: ExecutorId,
    pub payload: Vec<u8>,
}

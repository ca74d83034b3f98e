use std::collections::HashMap;

use tokio::sync::oneshot;

use crate::id::{ExecutorId, PeerId, TaskId};
use crate::scheduler::TaskState;
use crate::transport::{ExecutorPeer, PeerAddr};

/// Events serialized through the coordinator's mailbox: wire messages
/// from executors, requests from the cluster scheduler side, and liveness
/// events from the transport. They are processed one at a time.
pub enum CoordinatorEvent {
    RegisterExecutor {
        executor_id: ExecutorId,
        host_port: String,
        cores: usize,
        /// The connection the registration arrived on; the reply goes
        /// back through it.
        peer: ExecutorPeer,
    },
    StatusUpdate {
        executor_id: ExecutorId,
        task_id: TaskId,
        state: TaskState,
        /// Opaque bytes surfaced to the cluster scheduler.
        data: Vec<u8>,
    },
    ReviveOffers,
    RemoveExecutor {
        executor_id: ExecutorId,
        reason: String,
        result: oneshot::Sender<()>,
    },
    /// Bulk restoration of cores after the scheduler declined an offer
    /// or a launch never happened.
    FreeCores {
        cores: HashMap<ExecutorId, usize>,
    },
    PeerTerminated {
        peer: PeerId,
    },
    PeerDisconnected {
        addr: PeerAddr,
    },
    PeerShutdown {
        addr: PeerAddr,
    },
    Stop {
        result: oneshot::Sender<()>,
    },
}

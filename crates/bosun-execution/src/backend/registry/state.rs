use std::collections::HashMap;

use crate::id::{ExecutorId, PeerId};
use crate::transport::{ExecutorPeer, PeerAddr};

/// A registered executor. Created by a successful registration and
/// destroyed on termination, disconnect, shutdown, or explicit removal.
#[derive(Debug, Clone)]
pub struct ExecutorRecord {
    pub executor_id: ExecutorId,
    /// The host and port the executor announced at registration.
    pub host_port: String,
    pub peer: ExecutorPeer,
    /// The number of compute slots the executor offered at registration.
    pub cores: usize,
}

/// The registry indices. Transport liveness events carry a peer id or an
/// address but never an executor id, so both reverse indices are kept to
/// resolve them in constant time. Every executor id present in one index
/// is present in all of them.
#[derive(Default)]
pub(super) struct RegistryState {
    pub records: HashMap<ExecutorId, ExecutorRecord>,
    pub free_cores: HashMap<ExecutorId, usize>,
    pub executor_by_peer: HashMap<PeerId, ExecutorId>,
    pub executor_by_address: HashMap<PeerAddr, ExecutorId>,
}

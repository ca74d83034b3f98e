use std::sync::atomic::{AtomicU64, Ordering};

use bosun_common::config::ConfigKeyValue;
use tokio::sync::mpsc;

use crate::error::{ExecutionError, ExecutionResult};
use crate::id::PeerId;
use crate::task::TaskDescription;

/// The transport-level remote address of a connected executor.
/// Liveness events carry an address rather than an executor id,
/// so the registry keeps an index keyed by it.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PeerAddr(String);

impl From<String> for PeerAddr {
    fn from(addr: String) -> Self {
        Self(addr)
    }
}

impl From<&str> for PeerAddr {
    fn from(addr: &str) -> Self {
        Self(addr.to_string())
    }
}

impl std::fmt::Display for PeerAddr {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Wire messages sent from the backend to an executor.
#[derive(Debug, Clone)]
pub enum ExecutorMessage {
    RegisteredExecutor { properties: Vec<ConfigKeyValue> },
    RegisterExecutorFailed { reason: String },
    LaunchTask { task: TaskDescription },
}

static NEXT_PEER_ID: AtomicU64 = AtomicU64::new(1);

/// A handle to one connected executor. The handle is cheap to clone and
/// enqueues outbound messages onto the transport; it never blocks.
/// Two handles are equal when they address the same connection.
#[derive(Debug, Clone)]
pub struct ExecutorPeer {
    id: PeerId,
    addr: PeerAddr,
    sender: mpsc::UnboundedSender<ExecutorMessage>,
}

impl ExecutorPeer {
    /// Create a peer handle together with the receiving half owned by the
    /// transport. Each call yields a distinct peer id.
    pub fn channel(addr: PeerAddr) -> (Self, mpsc::UnboundedReceiver<ExecutorMessage>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let id = PeerId::from(NEXT_PEER_ID.fetch_add(1, Ordering::Relaxed));
        (
            Self {
                id,
                addr,
                sender: tx,
            },
            rx,
        )
    }

    pub fn id(&self) -> PeerId {
        self.id
    }

    pub fn addr(&self) -> &PeerAddr {
        &self.addr
    }

    pub fn send(&self, message: ExecutorMessage) -> ExecutionResult<()> {
        self.sender.send(message).map_err(|_| {
            ExecutionError::InternalError(format!("peer {} at {} is gone", self.id, self.addr))
        })
    }
}

impl PartialEq for ExecutorPeer {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for ExecutorPeer {}

/// Split an executor-announced address into host and port.
/// The host must be non-empty and the port numeric.
pub(crate) fn parse_host_port(host_port: &str) -> Option<(&str, u16)> {
    let (host, port) = host_port.rsplit_once(':')?;
    if host.is_empty() {
        return None;
    }
    let port = port.parse::<u16>().ok()?;
    Some((host, port))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_host_port() {
        assert_eq!(parse_host_port("worker-1:7070"), Some(("worker-1", 7070)));
        assert_eq!(parse_host_port("10.0.0.3:0"), Some(("10.0.0.3", 0)));
        assert_eq!(parse_host_port("worker-1"), None);
        assert_eq!(parse_host_port(":7070"), None);
        assert_eq!(parse_host_port("worker-1:"), None);
        assert_eq!(parse_host_port("worker-1:port"), None);
        assert_eq!(parse_host_port("worker-1:70700"), None);
    }

    #[test]
    fn test_peer_ids_are_unique() {
        let (a, _rx_a) = ExecutorPeer::channel(PeerAddr::from("a"));
        let (b, _rx_b) = ExecutorPeer::channel(PeerAddr::from("a"));
        assert_ne!(a.id(), b.id());
        assert_ne!(a, b);
    }

    #[test]
    fn test_send_to_dropped_peer_fails() {
        let (peer, rx) = ExecutorPeer::channel(PeerAddr::from("a"));
        drop(rx);
        let result = peer.send(ExecutorMessage::RegisterExecutorFailed {
            reason: "unused".to_string(),
        });
        assert!(result.is_err());
    }
}

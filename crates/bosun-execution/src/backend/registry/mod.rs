mod state;

use std::mem;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

use log::warn;

pub use state::ExecutorRecord;
use state::RegistryState;

use crate::error::{ExecutionError, ExecutionResult};
use crate::id::{ExecutorId, PeerId};
use crate::transport::PeerAddr;

/// The in-memory registry of connected executors.
///
/// The coordinator is the only writer; the launch pump performs read-only
/// lookups through a clone of this handle. All indices live under one
/// mutex so they stay consistent at every observable moment. The
/// aggregate core counter is atomic and readable without the lock, so
/// `default_parallelism` can be answered from any thread.
#[derive(Clone, Default)]
pub struct ExecutorRegistry {
    state: Arc<Mutex<RegistryState>>,
    total_cores: Arc<AtomicUsize>,
}

impl ExecutorRegistry {
    fn state(&self) -> MutexGuard<'_, RegistryState> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Install a newly registered executor in all indices and grow the
    /// aggregate core counter by its announced cores.
    pub fn insert(&self, record: ExecutorRecord) -> ExecutionResult<()> {
        let mut state = self.state();
        if state.records.contains_key(&record.executor_id) {
            return Err(ExecutionError::DuplicateExecutor(record.executor_id));
        }
        let executor_id = record.executor_id.clone();
        state
            .executor_by_peer
            .insert(record.peer.id(), executor_id.clone());
        state
            .executor_by_address
            .insert(record.peer.addr().clone(), executor_id.clone());
        state.free_cores.insert(executor_id.clone(), record.cores);
        self.total_cores.fetch_add(record.cores, Ordering::SeqCst);
        state.records.insert(executor_id, record);
        Ok(())
    }

    pub fn lookup(&self, executor_id: &ExecutorId) -> Option<ExecutorRecord> {
        self.state().records.get(executor_id).cloned()
    }

    pub fn lookup_by_peer(&self, peer: PeerId) -> Option<ExecutorId> {
        self.state().executor_by_peer.get(&peer).cloned()
    }

    pub fn lookup_by_address(&self, addr: &PeerAddr) -> Option<ExecutorId> {
        self.state().executor_by_address.get(addr).cloned()
    }

    /// Drop the executor from all indices and return its record.
    /// The aggregate counter shrinks by the executor's *current* free
    /// cores, not its announced cores: cores out on tasks never return
    /// to the aggregate when their executor dies.
    pub fn remove(&self, executor_id: &ExecutorId) -> Option<ExecutorRecord> {
        let mut state = self.state();
        let record = state.records.remove(executor_id)?;
        state.executor_by_peer.remove(&record.peer.id());
        state.executor_by_address.remove(record.peer.addr());
        let free = state.free_cores.remove(executor_id).unwrap_or(0);
        self.total_cores.fetch_sub(free, Ordering::SeqCst);
        Some(record)
    }

    pub fn adjust_free(&self, executor_id: &ExecutorId, delta: usize) {
        let mut state = self.state();
        match state.free_cores.get_mut(executor_id) {
            Some(free) => *free += delta,
            None => warn!("cannot adjust free cores of unknown executor {executor_id}"),
        }
    }

    /// Atomically snapshot one executor's free cores and set them to zero.
    /// Returns the announced host:port along with the snapshot.
    pub fn take_free(&self, executor_id: &ExecutorId) -> Option<(String, usize)> {
        let mut state = self.state();
        let host_port = state.records.get(executor_id)?.host_port.clone();
        let cores = state.free_cores.get_mut(executor_id).map(mem::take)?;
        Some((host_port, cores))
    }

    /// Atomically snapshot-and-zero the free cores of every executor,
    /// in one lock hold so no concurrent mutation can split an offer
    /// round. Executors with zero free cores are included.
    pub fn take_free_all(&self) -> Vec<(ExecutorId, String, usize)> {
        let mut state = self.state();
        let executors = state
            .records
            .iter()
            .map(|(id, record)| (id.clone(), record.host_port.clone()))
            .collect::<Vec<_>>();
        executors
            .into_iter()
            .map(|(executor_id, host_port)| {
                let cores = state
                    .free_cores
                    .get_mut(&executor_id)
                    .map(mem::take)
                    .unwrap_or(0);
                (executor_id, host_port, cores)
            })
            .collect()
    }

    /// The aggregate core counter; lock-free.
    pub fn total_cores(&self) -> usize {
        self.total_cores.load(Ordering::SeqCst)
    }

    pub fn len(&self) -> usize {
        self.state().records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.state().records.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transport::ExecutorPeer;

    fn record(executor_id: &str, cores: usize) -> ExecutorRecord {
        let (peer, _rx) = ExecutorPeer::channel(PeerAddr::from(format!("addr-{executor_id}")));
        ExecutorRecord {
            executor_id: ExecutorId::from(executor_id),
            host_port: format!("{executor_id}:7070"),
            peer,
            cores,
        }
    }

    #[test]
    fn test_insert_tracks_total_cores() {
        let registry = ExecutorRegistry::default();
        registry.insert(record("a", 4)).unwrap();
        registry.insert(record("b", 2)).unwrap();
        assert_eq!(registry.total_cores(), 6);
        assert_eq!(registry.len(), 2);
    }

    #[test]
    fn test_insert_rejects_duplicate_executor_id() {
        let registry = ExecutorRegistry::default();
        registry.insert(record("a", 4)).unwrap();
        let result = registry.insert(record("a", 2));
        assert!(matches!(result, Err(ExecutionError::DuplicateExecutor(_))));
        // The rejected registration must not disturb the indices.
        assert_eq!(registry.total_cores(), 4);
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_indices_stay_consistent() {
        let registry = ExecutorRegistry::default();
        let record = record("a", 4);
        let peer = record.peer.clone();
        registry.insert(record).unwrap();

        let executor_id = ExecutorId::from("a");
        assert_eq!(registry.lookup_by_peer(peer.id()), Some(executor_id.clone()));
        assert_eq!(registry.lookup_by_address(peer.addr()), Some(executor_id.clone()));
        assert!(registry.lookup(&executor_id).is_some());

        registry.remove(&executor_id).unwrap();
        assert_eq!(registry.lookup_by_peer(peer.id()), None);
        assert_eq!(registry.lookup_by_address(peer.addr()), None);
        assert!(registry.lookup(&executor_id).is_none());
        assert!(registry.is_empty());
    }

    #[test]
    fn test_remove_subtracts_only_free_cores() {
        let registry = ExecutorRegistry::default();
        registry.insert(record("a", 4)).unwrap();
        let executor_id = ExecutorId::from("a");
        // Offer all cores, then lose the executor: the cores that were
        // reserved by the offer stay in the aggregate.
        let taken = registry.take_free(&executor_id);
        assert_eq!(taken, Some(("a:7070".to_string(), 4)));
        registry.remove(&executor_id).unwrap();
        assert_eq!(registry.total_cores(), 4);

        // A fully idle executor returns everything.
        registry.insert(record("b", 2)).unwrap();
        registry.remove(&ExecutorId::from("b")).unwrap();
        assert_eq!(registry.total_cores(), 4);
    }

    #[test]
    fn test_remove_is_idempotent() {
        let registry = ExecutorRegistry::default();
        registry.insert(record("a", 4)).unwrap();
        let executor_id = ExecutorId::from("a");
        assert!(registry.remove(&executor_id).is_some());
        assert!(registry.remove(&executor_id).is_none());
    }

    #[test]
    fn test_take_free_all_includes_idle_executors() {
        let registry = ExecutorRegistry::default();
        registry.insert(record("a", 4)).unwrap();
        registry.insert(record("b", 0)).unwrap();
        let mut all = registry.take_free_all();
        all.sort();
        assert_eq!(
            all,
            vec![
                (ExecutorId::from("a"), "a:7070".to_string(), 4),
                (ExecutorId::from("b"), "b:7070".to_string(), 0),
            ]
        );
        // A second round sees everything as reserved.
        let mut again = registry.take_free_all();
        again.sort();
        assert_eq!(
            again,
            vec![
                (ExecutorId::from("a"), "a:7070".to_string(), 0),
                (ExecutorId::from("b"), "b:7070".to_string(), 0),
            ]
        );
    }

    #[test]
    fn test_adjust_free_restores_cores() {
        let registry = ExecutorRegistry::default();
        registry.insert(record("a", 4)).unwrap();
        let executor_id = ExecutorId::from("a");
        registry.take_free(&executor_id);
        registry.adjust_free(&executor_id, 3);
        assert_eq!(registry.take_free(&executor_id), Some(("a:7070".to_string(), 3)));
        // Unknown executors are ignored.
        registry.adjust_free(&ExecutorId::from("ghost"), 1);
        assert_eq!(registry.total_cores(), 4);
    }
}

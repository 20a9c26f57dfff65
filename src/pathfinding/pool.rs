//! Bounded-concurrency pathfinding pool (`spec.md` §4.6 "Concurrency").
//! `pool_size` worker threads pull jobs from a shared channel, so at most
//! `pool_size` A* computations run at once; additional requests simply
//! wait in the channel in FIFO order. The terrain grid is handed to each
//! worker behind an `Arc` (copy-on-read per `spec.md` §5).

use crate::ids::AgentId;
use crate::pathfinding::astar;
use crate::world::terrain::TerrainGrid;
use glam::IVec2;
use std::collections::HashSet;
use std::sync::mpsc::{channel, Receiver, Sender};
use std::sync::{Arc, Mutex};
use std::thread::JoinHandle;

pub struct PathRequest {
    pub id: u64,
    pub owner: AgentId,
    pub from: IVec2,
    pub to: IVec2,
    pub grid: Arc<TerrainGrid>,
    pub max_expanded: usize,
}

pub struct PathResult {
    pub id: u64,
    pub owner: AgentId,
    pub path: Option<Vec<IVec2>>,
}

/// A fixed-size worker pool. Workers live for the lifetime of the pool;
/// dropping it closes the job channel, which ends every worker thread
/// once its current job (if any) finishes.
pub struct PathfindingPool {
    job_tx: Sender<PathRequest>,
    result_rx: Receiver<PathResult>,
    _workers: Vec<JoinHandle<()>>,
    pending_keys: HashSet<(AgentId, IVec2, IVec2)>,
    pending_by_id: std::collections::HashMap<u64, (AgentId, IVec2, IVec2)>,
    cancelled: HashSet<AgentId>,
    next_id: u64,
}

impl PathfindingPool {
    pub fn new(pool_size: usize) -> Self {
        let pool_size = pool_size.max(1);
        let (job_tx, job_rx) = channel::<PathRequest>();
        let job_rx = Arc::new(Mutex::new(job_rx));
        let (result_tx, result_rx) = channel::<PathResult>();

        let workers = (0..pool_size)
            .map(|_| {
                let job_rx = Arc::clone(&job_rx);
                let result_tx = result_tx.clone();
                std::thread::spawn(move || loop {
                    let job = {
                        let rx = job_rx.lock().expect("pathfinding job channel poisoned");
                        rx.recv()
                    };
                    let Ok(job) = job else {
                        break;
                    };
                    let path = astar::find_path(&job.grid, job.from, job.to, job.max_expanded);
                    if result_tx.send(PathResult { id: job.id, owner: job.owner, path }).is_err() {
                        break;
                    }
                })
            })
            .collect();

        Self {
            job_tx,
            result_rx,
            _workers: workers,
            pending_keys: HashSet::new(),
            pending_by_id: std::collections::HashMap::new(),
            cancelled: HashSet::new(),
            next_id: 0,
        }
    }

    /// Enqueues a path request. Returns `false` without enqueuing if an
    /// identical (owner, from, to) request is already pending — the
    /// dedup the teacher's `PathfindingQueue` performs via
    /// `pending_requests`.
    pub fn submit(&mut self, owner: AgentId, from: IVec2, to: IVec2, grid: Arc<TerrainGrid>, max_expanded: usize) -> bool {
        let key = (owner, from, to);
        if self.pending_keys.contains(&key) {
            return false;
        }
        self.next_id += 1;
        let id = self.next_id;
        let sent = self
            .job_tx
            .send(PathRequest { id, owner, from, to, grid, max_expanded })
            .is_ok();
        if sent {
            self.pending_keys.insert(key);
            self.pending_by_id.insert(id, key);
        }
        sent
    }

    /// Marks an owner's in-flight requests for discard; already-computed
    /// results are dropped instead of delivered once they arrive.
    pub fn cancel_owner(&mut self, owner: AgentId) {
        self.cancelled.insert(owner);
    }

    /// Drains whatever results have arrived since the last poll, in
    /// arrival order, discarding any belonging to a cancelled owner.
    pub fn poll_results(&mut self) -> Vec<PathResult> {
        let mut out = Vec::new();
        while let Ok(result) = self.result_rx.try_recv() {
            if let Some(key) = self.pending_by_id.remove(&result.id) {
                self.pending_keys.remove(&key);
            }
            if self.cancelled.contains(&result.owner) {
                continue;
            }
            out.push(result);
        }
        out
    }

    pub fn pending_count(&self) -> usize {
        self.pending_keys.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::world::terrain::TileType;
    use std::time::{Duration, Instant};

    #[test]
    fn submitted_request_eventually_resolves() {
        let mut pool = PathfindingPool::new(2);
        let grid = Arc::new(TerrainGrid::new_flat(16, 16, TileType::Grass));
        let owner = AgentId::from_raw(1);
        assert!(pool.submit(owner, IVec2::new(0, 0), IVec2::new(5, 5), grid, 4096));

        let deadline = Instant::now() + Duration::from_secs(2);
        let mut results = Vec::new();
        while results.is_empty() && Instant::now() < deadline {
            results = pool.poll_results();
        }
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].owner, owner);
        assert!(results[0].path.is_some());
    }

    #[test]
    fn duplicate_request_is_deduplicated() {
        let mut pool = PathfindingPool::new(1);
        let grid = Arc::new(TerrainGrid::new_flat(16, 16, TileType::Grass));
        let owner = AgentId::from_raw(1);
        assert!(pool.submit(owner, IVec2::ZERO, IVec2::new(3, 3), Arc::clone(&grid), 4096));
        assert!(!pool.submit(owner, IVec2::ZERO, IVec2::new(3, 3), grid, 4096));
    }
}

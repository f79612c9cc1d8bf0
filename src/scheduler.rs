//! Batches path, range and vision queries and runs them against one grid snapshot.
//!
//! Queries never mutate the grid, so a drained batch runs in parallel against a shared
//! [`Arc<Grid>`]. Edits go through [`GridJobScheduler::edit`], which copies the grid if a
//! snapshot is still held elsewhere, so in-flight readers keep the version they started with.
use std::sync::{
    mpsc::{self, Receiver, Sender},
    Arc,
};

use bevy::log::{debug, warn};
#[cfg(feature = "parallel")]
use rayon::prelude::*;
use rustc_hash::FxHashMap;
use slab::Slab;
use thiserror::Error;

use crate::{
    coord::Coord,
    grid::{Grid, SearchError},
    neighbor::MoveSettings,
    path::{Path, PathSettings},
    visibility::ViewCone,
    CoordSet,
};

/// Pending jobs a scheduler accepts before [`GridJobScheduler::enqueue`] starts refusing.
pub const DEFAULT_CAPACITY: usize = 64;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum SchedulerError {
    #[error("job queue is full ({capacity} pending)")]
    QueueFull { capacity: usize },
    #[error("job {id} was cancelled or its scheduler dropped")]
    Dropped { id: u64 },
}

/// A query waiting to run.
#[derive(Clone, Debug, PartialEq)]
pub enum JobRequest {
    Path {
        start: Coord,
        goal: Coord,
        settings: PathSettings,
    },
    Range {
        center: Coord,
        range: u32,
        moves: MoveSettings,
        include_start: bool,
    },
    Vision {
        center: Coord,
        cone: ViewCone,
    },
}

impl JobRequest {
    /// Runs the query against `grid` on the calling thread.
    pub fn execute(&self, grid: &Grid) -> JobResult {
        match self {
            JobRequest::Path {
                start,
                goal,
                settings,
            } => JobResult::Path(grid.find_path(*start, *goal, settings)),
            JobRequest::Range {
                center,
                range,
                moves,
                include_start,
            } => JobResult::Range(grid.range_field(*center, *range, moves, *include_start)),
            JobRequest::Vision { center, cone } => {
                JobResult::Vision(grid.visibility(*center, cone))
            }
        }
    }
}

/// Outcome of a [`JobRequest`], same variant as the request.
#[derive(Clone, Debug, PartialEq)]
pub enum JobResult {
    Path(Result<Path, SearchError>),
    Range(Result<CoordSet, SearchError>),
    Vision(Result<CoordSet, SearchError>),
}

/// Handle to a queued job. The result arrives once the scheduler drains.
///
/// Ids are never reused by the scheduler that issued them.
#[derive(Debug)]
pub struct JobTicket {
    id: u64,
    receiver: Receiver<JobResult>,
}

impl JobTicket {
    pub fn id(&self) -> u64 {
        self.id
    }

    /// The result if the job already ran.
    pub fn try_result(&self) -> Option<JobResult> {
        self.receiver.try_recv().ok()
    }

    /// Blocks until the job has run.
    pub fn wait(self) -> Result<JobResult, SchedulerError> {
        self.receiver
            .recv()
            .map_err(|_| SchedulerError::Dropped { id: self.id })
    }
}

#[derive(Debug)]
struct PendingJob {
    id: u64,
    request: JobRequest,
    sender: Sender<JobResult>,
}

impl PendingJob {
    fn run(self, grid: &Grid) {
        // The ticket may have been dropped; nobody is waiting then.
        self.sender.send(self.request.execute(grid)).ok();
    }
}

#[cfg(feature = "parallel")]
fn run_all(jobs: Vec<PendingJob>, grid: &Grid) {
    jobs.into_par_iter().for_each(|job| job.run(grid));
}

#[cfg(not(feature = "parallel"))]
fn run_all(jobs: Vec<PendingJob>, grid: &Grid) {
    jobs.into_iter().for_each(|job| job.run(grid));
}

/// Owns the published grid and a bounded queue of jobs against it.
///
/// ```
/// use tactical_grid::prelude::*;
///
/// let mut grid = Grid::new(&GridSettingsBuilder::new(8, 1, 8).build()).unwrap();
/// ConnectivityBuilder::build(&mut grid, &SampleMap::new());
///
/// let mut scheduler = GridJobScheduler::new(grid);
/// let ticket = scheduler
///     .enqueue(JobRequest::Path {
///         start: Coord::new(0, 0, 0),
///         goal: Coord::new(7, 0, 7),
///         settings: PathSettings::default(),
///     })
///     .unwrap();
///
/// assert_eq!(scheduler.drain(), 1);
/// let JobResult::Path(Ok(path)) = ticket.wait().unwrap() else {
///     panic!("expected a path");
/// };
/// assert_eq!(path.len(), 7);
/// ```
#[derive(Debug)]
pub struct GridJobScheduler {
    grid: Arc<Grid>,
    pending: Slab<PendingJob>,
    keys: FxHashMap<u64, usize>,
    next_id: u64,
    capacity: usize,
}

impl GridJobScheduler {
    pub fn new(grid: Grid) -> Self {
        GridJobScheduler::with_capacity(grid, DEFAULT_CAPACITY)
    }

    pub fn with_capacity(grid: Grid, capacity: usize) -> Self {
        GridJobScheduler {
            grid: Arc::new(grid),
            pending: Slab::with_capacity(capacity),
            keys: FxHashMap::default(),
            next_id: 0,
            capacity,
        }
    }

    /// Queues a job for the next [`drain`](Self::drain).
    pub fn enqueue(&mut self, request: JobRequest) -> Result<JobTicket, SchedulerError> {
        if self.pending.len() >= self.capacity {
            warn!("Grid job queue full, refusing {:?}", request);
            return Err(SchedulerError::QueueFull {
                capacity: self.capacity,
            });
        }

        let (sender, receiver) = mpsc::channel();
        let id = self.next_id;
        self.next_id += 1;

        let key = self.pending.insert(PendingJob {
            id,
            request,
            sender,
        });
        self.keys.insert(id, key);
        Ok(JobTicket { id, receiver })
    }

    /// Removes a job that hasn't run yet. Its ticket's [`JobTicket::wait`] then fails.
    /// Ids of jobs that already ran or were cancelled are ignored.
    pub fn cancel(&mut self, id: u64) -> bool {
        let Some(key) = self.keys.remove(&id) else {
            return false;
        };

        match self.pending.try_remove(key) {
            Some(job) => {
                debug!("Cancelled grid job {}", job.id);
                true
            }
            None => false,
        }
    }

    pub fn pending(&self) -> usize {
        self.pending.len()
    }

    /// Runs every pending job against the current snapshot and returns how many ran.
    pub fn drain(&mut self) -> usize {
        self.keys.clear();
        let jobs: Vec<PendingJob> = self.pending.drain().collect();
        let count = jobs.len();
        if count == 0 {
            return 0;
        }

        let grid = Arc::clone(&self.grid);
        timed!("Grid job drain", {
            run_all(jobs, &grid);
        });

        debug!("Ran {} grid jobs", count);
        count
    }

    /// The published grid. Holding it pins that version against later edits.
    pub fn snapshot(&self) -> Arc<Grid> {
        Arc::clone(&self.grid)
    }

    /// Replaces the published grid.
    pub fn publish(&mut self, grid: Grid) {
        self.grid = Arc::new(grid);
    }

    /// Edits the published grid in place, or a copy of it if a snapshot is still held.
    pub fn edit<R>(&mut self, f: impl FnOnce(&mut Grid) -> R) -> R {
        f(Arc::make_mut(&mut self.grid))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        connectivity::{ConnectivityBuilder, SampleMap},
        grid::GridSettingsBuilder,
        tile::Occupancy,
    };

    fn flat(x: u32, z: u32) -> Grid {
        let mut grid = Grid::new(&GridSettingsBuilder::new(x, 1, z).build()).unwrap();
        ConnectivityBuilder::build(&mut grid, &SampleMap::new());
        grid
    }

    #[test]
    fn test_drain_runs_every_kind() {
        let grid = flat(5, 5);
        let mut scheduler = GridJobScheduler::new(grid.clone());

        let requests = [
            JobRequest::Path {
                start: Coord::new(0, 0, 0),
                goal: Coord::new(4, 0, 4),
                settings: PathSettings::default(),
            },
            JobRequest::Range {
                center: Coord::new(2, 0, 2),
                range: 2,
                moves: MoveSettings::default(),
                include_start: true,
            },
            JobRequest::Vision {
                center: Coord::new(2, 0, 2),
                cone: ViewCone::around(2),
            },
            JobRequest::Path {
                start: Coord::new(0, 0, 0),
                goal: Coord::new(9, 0, 0),
                settings: PathSettings::default(),
            },
        ];

        let tickets: Vec<JobTicket> = requests
            .iter()
            .map(|request| scheduler.enqueue(request.clone()).unwrap())
            .collect();

        assert_eq!(scheduler.pending(), 4);
        assert!(tickets[0].try_result().is_none());
        assert_eq!(scheduler.drain(), 4);
        assert_eq!(scheduler.pending(), 0);
        assert_eq!(scheduler.drain(), 0);

        for (request, ticket) in requests.iter().zip(tickets) {
            assert_eq!(ticket.wait().unwrap(), request.execute(&grid));
        }
    }

    #[test]
    fn test_snapshot_survives_edit() {
        let mut scheduler = GridJobScheduler::new(flat(3, 3));
        let center = Coord::new(1, 0, 1);

        let before = scheduler.snapshot();
        scheduler
            .edit(|grid| grid.set_occupancy(center, Occupancy::Blocked))
            .unwrap();

        assert!(!before.tile_at_coord(center).unwrap().is_terrain());
        assert!(scheduler.snapshot().tile_at_coord(center).unwrap().is_terrain());

        scheduler.publish(flat(3, 3));
        assert!(!scheduler.snapshot().tile_at_coord(center).unwrap().is_terrain());
    }

    #[test]
    fn test_queue_full() {
        let mut scheduler = GridJobScheduler::with_capacity(flat(3, 3), 2);
        let request = JobRequest::Vision {
            center: Coord::new(1, 0, 1),
            cone: ViewCone::around(1),
        };

        scheduler.enqueue(request.clone()).unwrap();
        scheduler.enqueue(request.clone()).unwrap();
        assert_eq!(
            scheduler.enqueue(request.clone()).unwrap_err(),
            SchedulerError::QueueFull { capacity: 2 }
        );

        scheduler.drain();
        assert!(scheduler.enqueue(request).is_ok());
    }

    #[test]
    fn test_cancel() {
        let mut scheduler = GridJobScheduler::new(flat(3, 3));
        let ticket = scheduler
            .enqueue(JobRequest::Range {
                center: Coord::new(1, 0, 1),
                range: 1,
                moves: MoveSettings::default(),
                include_start: false,
            })
            .unwrap();
        let id = ticket.id();

        assert!(scheduler.cancel(id));
        assert!(!scheduler.cancel(id));
        assert_eq!(scheduler.drain(), 0);
        assert_eq!(ticket.wait(), Err(SchedulerError::Dropped { id }));
    }

    #[test]
    fn test_cancel_stale_id() {
        let mut scheduler = GridJobScheduler::new(flat(3, 3));
        let request = JobRequest::Vision {
            center: Coord::new(1, 0, 1),
            cone: ViewCone::around(1),
        };

        let first = scheduler.enqueue(request.clone()).unwrap();
        let first_id = first.id();
        assert_eq!(scheduler.drain(), 1);
        assert!(first.wait().is_ok());

        let second = scheduler.enqueue(request.clone()).unwrap();
        assert_ne!(second.id(), first_id);

        assert!(!scheduler.cancel(first_id));
        assert_eq!(scheduler.pending(), 1);
        assert_eq!(scheduler.drain(), 1);
        assert_eq!(second.wait().unwrap(), request.execute(&flat(3, 3)));
    }
}

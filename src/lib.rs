//! Movement connectivity, pathfinding, movement range and field of view over a small 3D tile
//! grid, for turn based tactics.
//!
//! Build a [`Grid`](grid::Grid), derive its connectivity once with
//! [`ConnectivityBuilder`](connectivity::ConnectivityBuilder), then query it:
//!
//! ```
//! use tactical_grid::prelude::*;
//!
//! let mut grid = Grid::new(&GridSettingsBuilder::new(5, 1, 5).build()).unwrap();
//! let samples = SampleMap::new().block(Coord::new(2, 0, 2));
//! ConnectivityBuilder::build(&mut grid, &samples);
//!
//! let path = grid
//!     .find_path(Coord::new(0, 0, 0), Coord::new(4, 0, 4), &PathSettings::default())
//!     .unwrap();
//! assert!(!path.contains(Coord::new(2, 0, 2)));
//!
//! let range = grid
//!     .range_field(Coord::new(0, 0, 0), 2, &MoveSettings::default(), false)
//!     .unwrap();
//! assert!(range.contains(&Coord::new(0, 0, 2)));
//!
//! let visible = grid.visibility(Coord::new(0, 0, 0), &ViewCone::around(4)).unwrap();
//! assert!(!visible.contains(&Coord::new(3, 0, 3)));
//! ```
use std::hash::BuildHasherDefault;

use indexmap::IndexSet;
use rustc_hash::FxHasher;

use crate::coord::Coord;

#[macro_use]
mod macros;

mod astar;
pub mod connectivity;
pub mod coord;
mod dijkstra;
pub mod dir;
pub mod grid;
pub mod heuristic;
pub mod neighbor;
pub mod path;
mod raycast;
pub mod scheduler;
mod shadowcast;
pub mod tile;
pub mod visibility;

pub mod prelude {
    pub use crate::connectivity::{ConnectivityBuilder, EnvironmentSampler, SampleMap};
    pub use crate::coord::Coord;
    pub use crate::dir::{Dir, Edges};
    pub use crate::grid::{
        CostSettings, Grid, GridError, GridRecord, GridSettings, GridSettingsBuilder, SearchError,
        TileRecord,
    };
    pub use crate::heuristic::heuristic;
    pub use crate::neighbor::{has_passage, MoveSettings, NeighborRule, Neighbors};
    pub use crate::path::{Path, PathSettings};
    pub use crate::scheduler::{
        GridJobScheduler, JobRequest, JobResult, JobTicket, SchedulerError,
    };
    pub use crate::tile::{Occupancy, Sight, Tile, TileType, WallType, Walls};
    pub use crate::visibility::{sight_clear, ViewCone, VisionMethod};
    pub use crate::CoordSet;
}

pub type FxIndexSet<T> = IndexSet<T, BuildHasherDefault<FxHasher>>;

/// Deduplicating, insertion ordered set of tiles returned by range and vision queries.
pub type CoordSet = FxIndexSet<Coord>;

//! Turns raw environment samples into walls, tile tags and edges.
use std::time::Instant;

use bevy::{
    log::{debug, info},
    math::IVec3,
};
#[cfg(feature = "parallel")]
use rayon::prelude::*;
use rustc_hash::{FxHashMap, FxHashSet};

use crate::{
    coord::Coord,
    dir::*,
    grid::Grid,
    neighbor::has_passage,
    tile::{Occupancy, TileType, WallType, Walls},
};

/// Source of the raw per-tile facts the builder consumes.
///
/// In a game this wraps the physics probes against obstacle, cover and climb layers. The
/// builder only ever asks for grid coordinates that exist.
pub trait EnvironmentSampler {
    /// Whether the tile volume is solid, open or climbable.
    fn occupancy(&self, coord: Coord) -> Occupancy;

    /// Whether a sightline from the tile centre toward `dir` hits cover. Only asked for the
    /// six cubic directions.
    fn is_cover(&self, coord: Coord, dir: Dir) -> bool;
}

/// An [`EnvironmentSampler`] backed by hash maps, for layouts already known in memory.
///
/// Every coordinate not mentioned is open with no cover.
#[derive(Clone, Debug, Default)]
pub struct SampleMap {
    occupancy: FxHashMap<Coord, Occupancy>,
    covers: FxHashSet<(Coord, Dir)>,
}

impl SampleMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Marks a tile as solid.
    pub fn block(mut self, coord: Coord) -> Self {
        self.occupancy.insert(coord, Occupancy::Blocked);
        self
    }

    /// Marks a tile as climbable, e.g. a ladder standing against a wall.
    pub fn climbable(mut self, coord: Coord) -> Self {
        self.occupancy.insert(coord, Occupancy::Climbable);
        self
    }

    /// Puts cover on one face of a tile.
    pub fn cover(mut self, coord: Coord, dir: Dir) -> Self {
        self.covers.insert((coord, dir));
        self
    }
}

impl EnvironmentSampler for SampleMap {
    fn occupancy(&self, coord: Coord) -> Occupancy {
        self.occupancy.get(&coord).copied().unwrap_or_default()
    }

    fn is_cover(&self, coord: Coord, dir: Dir) -> bool {
        self.covers.contains(&(coord, dir))
    }
}

/// Derives a grid's connectivity.
///
/// Building happens in three sweeps over the tiles:
/// 1. sample occupancy and cover for every tile;
/// 2. classify: seal terrain, merge each face with the neighbour's opposite face, lay floors
///    and tag floorless tiles as [`TileType::JUMP`];
/// 3. connect: derive edges from the classified walls.
///
/// Sweeps 2 and 3 read neighbours, so each finishes for every tile before the next starts.
pub struct ConnectivityBuilder;

impl ConnectivityBuilder {
    /// Samples the environment for every tile and derives the grid's connectivity.
    pub fn build<S: EnvironmentSampler + Sync>(grid: &mut Grid, sampler: &S) {
        let start = Instant::now();

        let all: Vec<usize> = (0..grid.len()).collect();
        let snapshot: &Grid = grid;
        let samples = map_tiles(&all, |index| {
            let coord = snapshot.tile_at(index).coord();
            let mut covers = Walls::OPEN;
            for dir in Dir::cubic() {
                if sampler.is_cover(coord, dir) {
                    covers.set(dir, WallType::Full);
                }
            }
            (sampler.occupancy(coord), covers)
        });

        for (index, (occupancy, covers)) in samples.into_iter().enumerate() {
            let tile = grid.tile_at_mut(index);
            tile.occupancy = occupancy;
            tile.covers = covers;
        }

        derive(grid, &all);

        info!(
            "Built connectivity for {} tiles in {:?}",
            grid.len(),
            start.elapsed()
        );
    }

    /// Re-derives every tile from the occupancy and cover already stored in the grid.
    pub fn rebuild(grid: &mut Grid) {
        let all: Vec<usize> = (0..grid.len()).collect();
        derive(grid, &all);
    }

    /// Re-derives the tiles an edit at `index` can affect.
    ///
    /// Classification reads direct neighbours and edges read the classification of their
    /// neighbours, so everything within two steps is refreshed.
    pub(crate) fn rebuild_around(grid: &mut Grid, index: usize) {
        let region = region(grid, index, 2);
        derive(grid, &region);
        debug!("Re-derived {} tiles around tile {}", region.len(), index);
    }
}

fn map_tiles<T, F>(indices: &[usize], f: F) -> Vec<T>
where
    T: Send,
    F: Fn(usize) -> T + Sync + Send,
{
    #[cfg(feature = "parallel")]
    {
        indices.par_iter().map(|&index| f(index)).collect()
    }

    #[cfg(not(feature = "parallel"))]
    {
        indices.iter().map(|&index| f(index)).collect()
    }
}

fn derive(grid: &mut Grid, indices: &[usize]) {
    let snapshot: &Grid = grid;
    let classified = map_tiles(indices, |index| classify(snapshot, index));
    for (&index, (walls, kind)) in indices.iter().zip(classified) {
        let tile = grid.tile_at_mut(index);
        tile.walls = walls;
        tile.kind = kind;
    }

    let snapshot: &Grid = grid;
    let edges = map_tiles(indices, |index| connect(snapshot, index));
    for (&index, edges) in indices.iter().zip(edges) {
        grid.tile_at_mut(index).edges = edges;
    }
}

/// Tiles within Chebyshev distance `radius` of `index`, in flat order.
fn region(grid: &Grid, index: usize, radius: i32) -> Vec<usize> {
    let Some(center) = grid.coord_of(index) else {
        return Vec::new();
    };

    let center = center.as_ivec3();
    let mut indices = Vec::new();
    for z in -radius..=radius {
        for y in -radius..=radius {
            for x in -radius..=radius {
                if let Some(i) =
                    Coord::from_ivec3(center + IVec3::new(x, y, z)).and_then(|c| grid.index(c))
                {
                    indices.push(i);
                }
            }
        }
    }

    indices
}

fn classify(grid: &Grid, index: usize) -> (Walls, TileType) {
    let tile = grid.tile_at(index);
    let occupied = tile.kind() & TileType::OCCUPIED;

    let mut kind = match tile.occupancy() {
        Occupancy::Blocked => return (Walls::SEALED, TileType::TERRAIN | occupied),
        Occupancy::Open => TileType::EMPTY,
        Occupancy::Climbable => TileType::CLIMB,
    };

    let mut walls = Walls::OPEN;
    for dir in Dir::cubic() {
        let own = tile.covers().get(dir);
        let wall = match grid.neighbor(index, dir).map(|n| grid.tile_at(n)) {
            // The bottom of the grid is solid ground.
            None if dir == DOWN => WallType::Full,
            None => own,
            Some(neighbor) if neighbor.occupancy() == Occupancy::Blocked => {
                if tile.occupancy() == Occupancy::Climbable && dir.is_cardinal() {
                    WallType::Climbable
                } else {
                    WallType::Full
                }
            }
            Some(neighbor) => own.max(neighbor.covers().get(dir.opposite())),
        };
        walls.set(dir, wall);
    }

    if walls.get(DOWN) != WallType::Full {
        kind |= TileType::JUMP;
    }

    (walls, kind | occupied)
}

fn connect(grid: &Grid, index: usize) -> Edges {
    let tile = grid.tile_at(index);
    if tile.is_terrain() {
        return Edges::empty();
    }

    let mut edges = Edges::empty();
    if tile.has_floor() {
        for dir in Dir::lateral() {
            if has_passage(grid, index, dir) {
                edges |= dir.bit();
            }
        }
    } else if tile.is_movable(DOWN) {
        edges |= Edges::DOWN;
    }

    if tile.has_climbable() && has_passage(grid, index, UP) {
        edges |= Edges::UP;
    }

    edges | climb_egress(grid, index)
}

/// Lateral edges a floorless tile inherits from a climbable tile below it, pointing over
/// the terrain the climb leans against, so the top of a climb has a way off.
fn climb_egress(grid: &Grid, index: usize) -> Edges {
    if !grid.tile_at(index).kind().contains(TileType::JUMP) {
        return Edges::empty();
    }

    let Some(below) = grid.neighbor(index, DOWN) else {
        return Edges::empty();
    };

    if !grid.tile_at(below).has_climbable() || !has_passage(grid, below, UP) {
        return Edges::empty();
    }

    Dir::cardinal()
        .filter(|&dir| {
            grid.neighbor(below, dir)
                .is_some_and(|n| grid.tile_at(n).is_terrain())
                && has_passage(grid, index, dir)
        })
        .fold(Edges::empty(), |edges, dir| edges | dir.bit())
}

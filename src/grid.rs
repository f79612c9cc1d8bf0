//! This module contains the [`Grid`], the tile store every query runs against.
use bevy::{
    log::{debug, warn},
    math::{UVec3, Vec3},
};
use ndarray::{s, Array3, ArrayView2, ArrayView3};
use thiserror::Error;

use crate::{
    astar::astar_grid,
    connectivity::ConnectivityBuilder,
    coord::Coord,
    dijkstra::range_grid,
    dir::*,
    neighbor::MoveSettings,
    path::{Path, PathSettings},
    tile::{Occupancy, Tile, TileType, WallType, Walls},
    visibility::{visible_tiles, ViewCone},
    CoordSet,
};

/// Largest number of tiles a grid may hold. Bounds the scratch memory of a single search.
pub const MAX_TILES: usize = 65_536;

/// Largest size of one axis, so every tile stays addressable with `i8` coordinates.
pub const MAX_AXIS: u32 = 128;

/// Errors raised while constructing or editing a [`Grid`].
#[derive(Debug, Error, Clone, PartialEq)]
pub enum GridError {
    #[error("grid dimensions {dimensions} contain a zero axis")]
    ZeroDimension { dimensions: UVec3 },
    #[error("grid dimensions {dimensions} exceed {max} tiles on an axis")]
    AxisTooLarge { dimensions: UVec3, max: u32 },
    #[error("grid of {count} tiles exceeds the {max} tile limit")]
    TooManyTiles { count: usize, max: usize },
    #[error("expected {expected} tiles, found {actual}")]
    TileCountMismatch { expected: usize, actual: usize },
    #[error("coordinate {0} is outside the grid")]
    OutOfBounds(Coord),
    #[error("{0} is not a tile face")]
    NotCubic(Dir),
}

/// Why a query produced no result.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum SearchError {
    #[error("coordinate {0} is outside the grid")]
    OutOfBounds(Coord),
    #[error("tile {0} is blocked")]
    Blocked(Coord),
    #[error("search frontier reached {limit} entries before the goal")]
    FrontierExhausted { limit: usize },
    #[error("goal is unreachable")]
    Unreachable,
}

/// Movement costs charged per step.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct CostSettings {
    /// Cost of a lateral cardinal step.
    pub direct: u32,
    /// Cost of a lateral diagonal step.
    pub diagonal: u32,
    /// Cost of any step that gains height.
    pub up: u32,
}

impl Default for CostSettings {
    fn default() -> Self {
        CostSettings {
            direct: 10,
            diagonal: 14,
            up: 20,
        }
    }
}

/// World placement of the grid. Only used by the coordinate transforms.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct WorldSettings {
    pub cell_size: Vec3,
    pub offset: Vec3,
}

impl Default for WorldSettings {
    fn default() -> Self {
        WorldSettings {
            cell_size: Vec3::ONE,
            offset: Vec3::ZERO,
        }
    }
}

/// Holder for internal crate settings.
#[derive(Clone, Debug)]
pub struct GridSettings(pub(crate) GridInternalSettings);

/// Builder for [`GridSettings`].
///
/// ```
/// use tactical_grid::prelude::*;
///
/// let settings = GridSettingsBuilder::new(16, 4, 16)
///     .direct_cost(10)
///     .diagonal_cost(14)
///     .up_cost(25)
///     .build();
///
/// let grid = Grid::new(&settings).unwrap();
/// assert_eq!(grid.len(), 16 * 4 * 16);
/// ```
#[derive(Clone, Debug)]
pub struct GridSettingsBuilder {
    dimensions: UVec3,
    costs: CostSettings,
    world: WorldSettings,
    frontier_per_axis: usize,
}

impl GridSettingsBuilder {
    /// Starts a builder for a grid of `size_x * size_y * size_z` tiles, `y` being the height.
    /// Dimensions are validated by [`Grid::new`].
    pub fn new(size_x: u32, size_y: u32, size_z: u32) -> Self {
        GridSettingsBuilder {
            dimensions: UVec3::new(size_x, size_y, size_z),
            costs: CostSettings::default(),
            world: WorldSettings::default(),
            frontier_per_axis: 32,
        }
    }

    pub fn direct_cost(mut self, cost: u32) -> Self {
        self.costs.direct = cost;
        self
    }

    pub fn diagonal_cost(mut self, cost: u32) -> Self {
        self.costs.diagonal = cost;
        self
    }

    pub fn up_cost(mut self, cost: u32) -> Self {
        self.costs.up = cost;
        self
    }

    /// Pass in a full [`CostSettings`] instead of setting each cost.
    pub fn cost_settings(mut self, costs: CostSettings) -> Self {
        self.costs = costs;
        self
    }

    /// World size of one tile.
    pub fn cell_size(mut self, cell_size: Vec3) -> Self {
        self.world.cell_size = cell_size;
        self
    }

    /// World position of the corner of tile `(0, 0, 0)`.
    pub fn world_offset(mut self, offset: Vec3) -> Self {
        self.world.offset = offset;
        self
    }

    /// Path searches give up once their frontier holds `frontier_per_axis` entries per tile
    /// of the grid's longest axis.
    pub fn frontier_per_axis(mut self, frontier_per_axis: usize) -> Self {
        self.frontier_per_axis = frontier_per_axis.max(1);
        self
    }

    pub fn build(self) -> GridSettings {
        GridSettings(GridInternalSettings {
            dimensions: self.dimensions,
            costs: self.costs,
            world: self.world,
            frontier_per_axis: self.frontier_per_axis,
        })
    }
}

#[derive(Clone, Debug)]
pub(crate) struct GridInternalSettings {
    pub(crate) dimensions: UVec3,
    pub(crate) costs: CostSettings,
    pub(crate) world: WorldSettings,
    pub(crate) frontier_per_axis: usize,
}

/// Persisted form of a grid: the header plus every tile's raw and derived state in flat
/// index order. Loading it does not re-run the connectivity builder.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct GridRecord {
    pub dimensions: [u32; 3],
    pub costs: CostSettings,
    pub cell_size: [f32; 3],
    pub world_offset: [f32; 3],
    pub frontier_per_axis: usize,
    pub tiles: Vec<TileRecord>,
}

/// A tile's persisted state. Its index and coordinate come from its position in
/// [`GridRecord::tiles`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct TileRecord {
    pub occupancy: Occupancy,
    pub covers: Walls,
    pub walls: Walls,
    pub edges: Edges,
    pub kind: TileType,
}

/// A fixed size 3D tile grid.
///
/// Tiles live in an [`Array3`] shaped `(z, y, x)`, so the array's logical order is the flat
/// index order `z * size_x * size_y + y * size_x + x`.
///
/// A fresh grid holds open tiles with no walls or edges. Run
/// [`ConnectivityBuilder::build`] once to derive them, then share the grid between any number
/// of queries. Edits re-derive the tiles around the edited one.
#[derive(Clone, Debug)]
pub struct Grid {
    settings: GridInternalSettings,
    tiles: Array3<Tile>,
}

fn validate(dimensions: UVec3) -> Result<usize, GridError> {
    if dimensions.min_element() == 0 {
        return Err(GridError::ZeroDimension { dimensions });
    }

    if dimensions.max_element() > MAX_AXIS {
        return Err(GridError::AxisTooLarge {
            dimensions,
            max: MAX_AXIS,
        });
    }

    let count = dimensions.x as usize * dimensions.y as usize * dimensions.z as usize;
    if count > MAX_TILES {
        return Err(GridError::TooManyTiles {
            count,
            max: MAX_TILES,
        });
    }

    Ok(count)
}

impl Grid {
    /// Creates a grid of open tiles.
    ///
    /// # Arguments
    /// * `settings` - [`GridSettings`] built with [`GridSettingsBuilder`].
    ///
    /// # Returns
    /// * [`GridError`] if an axis is zero or too long, or the grid holds more than
    ///   [`MAX_TILES`] tiles. Nothing is allocated in that case.
    pub fn new(settings: &GridSettings) -> Result<Self, GridError> {
        validate(settings.0.dimensions)?;

        let dims = settings.0.dimensions;
        let (sx, sy, sz) = (dims.x as usize, dims.y as usize, dims.z as usize);
        let tiles = Array3::from_shape_fn((sz, sy, sx), |(z, y, x)| {
            Tile::new(
                Coord::new(x as i8, y as i8, z as i8),
                z * sx * sy + y * sx + x,
            )
        });

        debug!("Created grid {} with {} tiles", dims, tiles.len());

        Ok(Grid {
            settings: settings.0.clone(),
            tiles,
        })
    }

    /// Rebuilds a grid from a [`GridRecord`] without re-running connectivity.
    pub fn from_record(record: &GridRecord) -> Result<Self, GridError> {
        let [x, y, z] = record.dimensions;
        let settings = GridSettingsBuilder::new(x, y, z)
            .cost_settings(record.costs)
            .cell_size(Vec3::from_array(record.cell_size))
            .world_offset(Vec3::from_array(record.world_offset))
            .frontier_per_axis(record.frontier_per_axis)
            .build();

        let expected = validate(settings.0.dimensions)?;
        if record.tiles.len() != expected {
            return Err(GridError::TileCountMismatch {
                expected,
                actual: record.tiles.len(),
            });
        }

        let mut grid = Grid::new(&settings)?;
        for (tile, saved) in grid.tiles.iter_mut().zip(&record.tiles) {
            tile.occupancy = saved.occupancy;
            tile.covers = saved.covers;
            tile.walls = saved.walls;
            tile.edges = saved.edges;
            tile.kind = saved.kind;
        }

        Ok(grid)
    }

    pub fn to_record(&self) -> GridRecord {
        GridRecord {
            dimensions: self.settings.dimensions.to_array(),
            costs: self.settings.costs,
            cell_size: self.settings.world.cell_size.to_array(),
            world_offset: self.settings.world.offset.to_array(),
            frontier_per_axis: self.settings.frontier_per_axis,
            tiles: self
                .tiles
                .iter()
                .map(|tile| TileRecord {
                    occupancy: tile.occupancy,
                    covers: tile.covers,
                    walls: tile.walls,
                    edges: tile.edges,
                    kind: tile.kind,
                })
                .collect(),
        }
    }

    pub fn dimensions(&self) -> UVec3 {
        self.settings.dimensions
    }

    pub fn costs(&self) -> &CostSettings {
        &self.settings.costs
    }

    pub fn world(&self) -> &WorldSettings {
        &self.settings.world
    }

    pub fn len(&self) -> usize {
        self.tiles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tiles.is_empty()
    }

    /// Size a path search frontier may reach before the search is abandoned.
    pub fn max_frontier(&self) -> usize {
        self.settings.dimensions.max_element() as usize * self.settings.frontier_per_axis
    }

    /// Flat index of `coord`, or `None` when it lies outside the grid.
    pub fn index(&self, coord: Coord) -> Option<usize> {
        if coord.x < 0 || coord.y < 0 || coord.z < 0 {
            return None;
        }

        let dims = self.settings.dimensions;
        let (x, y, z) = (coord.x as u32, coord.y as u32, coord.z as u32);
        if x >= dims.x || y >= dims.y || z >= dims.z {
            return None;
        }

        Some(((z * dims.y + y) * dims.x + x) as usize)
    }

    pub fn coord_of(&self, index: usize) -> Option<Coord> {
        self.tile(index).map(Tile::coord)
    }

    pub fn tile(&self, index: usize) -> Option<&Tile> {
        (index < self.len()).then(|| self.tile_at(index))
    }

    pub fn tile_at_coord(&self, coord: Coord) -> Option<&Tile> {
        self.index(coord).map(|index| self.tile_at(index))
    }

    fn slot(&self, index: usize) -> [usize; 3] {
        let dims = self.settings.dimensions;
        let (sx, sy) = (dims.x as usize, dims.y as usize);
        [index / (sx * sy), (index / sx) % sy, index % sx]
    }

    /// Tile at a known valid index.
    pub(crate) fn tile_at(&self, index: usize) -> &Tile {
        &self.tiles[self.slot(index)]
    }

    pub(crate) fn tile_at_mut(&mut self, index: usize) -> &mut Tile {
        let slot = self.slot(index);
        &mut self.tiles[slot]
    }

    /// Index of the tile one step from `index` in `dir`, or `None` at the grid boundary.
    pub fn neighbor(&self, index: usize, dir: Dir) -> Option<usize> {
        let coord = self.tile(index)?.coord();
        self.index(coord.step(dir)?)
    }

    /// Tiles in flat index order.
    pub fn tiles(&self) -> impl Iterator<Item = &Tile> {
        self.tiles.iter()
    }

    pub fn view(&self) -> ArrayView3<Tile> {
        self.tiles.view()
    }

    /// One horizontal level, indexed `[z, x]`.
    pub fn layer(&self, y: usize) -> ArrayView2<Tile> {
        self.tiles.slice(s![.., y, ..])
    }

    /// Cost of moving from one tile to another in a single move.
    ///
    /// Gaining height costs `up`. Landing on a floorless tile is free. Otherwise the lateral
    /// offset decides between `diagonal` and `direct`, so a drop only pays for the step off
    /// the ledge.
    pub fn step_cost(&self, from: usize, to: usize) -> u32 {
        let costs = &self.settings.costs;
        let target = self.tile_at(to);
        let delta = target.coord().delta(self.tile_at(from).coord());

        if delta.y > 0 {
            costs.up
        } else if target.kind().contains(TileType::JUMP) {
            0
        } else if delta.x != 0 && delta.z != 0 {
            costs.diagonal
        } else {
            costs.direct
        }
    }

    /// World position of the centre of a tile's floor.
    pub fn tile_to_world(&self, coord: Coord) -> Vec3 {
        let world = &self.settings.world;
        let cell = world.cell_size;
        world.offset + coord.as_ivec3().as_vec3() * cell + Vec3::new(cell.x * 0.5, 0.0, cell.z * 0.5)
    }

    /// Tile containing a world position. Height snaps to the nearest level.
    pub fn world_to_tile(&self, position: Vec3) -> Option<Coord> {
        let world = &self.settings.world;
        let local = (position - world.offset) / world.cell_size;
        let coord = Coord::from_ivec3(bevy::math::IVec3::new(
            local.x.floor() as i32,
            local.y.round() as i32,
            local.z.floor() as i32,
        ))?;

        self.index(coord).map(|_| coord)
    }

    /// Finds a route from `start` to `goal`.
    ///
    /// # Arguments
    /// * `start` - The starting tile.
    /// * `goal` - The tile to reach.
    /// * `settings` - Movement limits and result options, see [`PathSettings`].
    ///
    /// # Returns
    /// * The [`Path`] in goal to start order, or a [`SearchError`] telling why there is none.
    pub fn find_path(
        &self,
        start: Coord,
        goal: Coord,
        settings: &PathSettings,
    ) -> Result<Path, SearchError> {
        let start_index = self.index(start).ok_or(SearchError::OutOfBounds(start))?;
        let goal_index = self.index(goal).ok_or(SearchError::OutOfBounds(goal))?;

        if self.tile_at(start_index).is_terrain() {
            return Err(SearchError::Blocked(start));
        }

        if self.tile_at(goal_index).is_blocked() && !settings.partial {
            return Err(SearchError::Blocked(goal));
        }

        astar_grid(self, start_index, goal_index, settings)
    }

    /// Every tile reachable from `center` for at most `range * direct` movement cost.
    pub fn range_field(
        &self,
        center: Coord,
        range: u32,
        moves: &MoveSettings,
        include_start: bool,
    ) -> Result<CoordSet, SearchError> {
        let center_index = self.index(center).ok_or(SearchError::OutOfBounds(center))?;
        Ok(range_grid(self, center_index, range, moves, include_start))
    }

    /// Tiles visible from `center` within the given [`ViewCone`].
    pub fn visibility(&self, center: Coord, cone: &ViewCone) -> Result<CoordSet, SearchError> {
        let center_index = self.index(center).ok_or(SearchError::OutOfBounds(center))?;
        Ok(visible_tiles(self, center_index, cone))
    }

    fn edit_index(&self, coord: Coord) -> Result<usize, GridError> {
        self.index(coord).ok_or_else(|| {
            warn!("Ignoring edit at {}, outside grid {}", coord, self.dimensions());
            GridError::OutOfBounds(coord)
        })
    }

    /// Replaces the sampled occupancy of one tile and re-derives the tiles around it.
    pub fn set_occupancy(&mut self, coord: Coord, occupancy: Occupancy) -> Result<(), GridError> {
        let index = self.edit_index(coord)?;
        self.tile_at_mut(index).occupancy = occupancy;
        ConnectivityBuilder::rebuild_around(self, index);
        Ok(())
    }

    /// Replaces the cover on one face of a tile and re-derives the tiles around it.
    pub fn set_cover(&mut self, coord: Coord, dir: Dir, wall: WallType) -> Result<(), GridError> {
        if dir.is_diagonal() {
            return Err(GridError::NotCubic(dir));
        }

        let index = self.edit_index(coord)?;
        self.tile_at_mut(index).covers.set(dir, wall);
        ConnectivityBuilder::rebuild_around(self, index);
        Ok(())
    }

    /// Marks a tile as taken by an agent. Connectivity is left untouched; searches skip
    /// occupied tiles on their own.
    pub fn set_occupied(&mut self, coord: Coord, occupied: bool) -> Result<(), GridError> {
        let index = self.edit_index(coord)?;
        let tile = self.tile_at_mut(index);
        if occupied {
            tile.kind.insert(TileType::OCCUPIED);
        } else {
            tile.kind.remove(TileType::OCCUPIED);
        }
        Ok(())
    }
}

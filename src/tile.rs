//! Tile state: wall classifications, raw samples and derived tags.
use crate::{
    coord::Coord,
    dir::{Dir, Edges, DOWN},
};

/// Classification of one face of a tile.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum WallType {
    /// Open in both senses.
    #[default]
    None,
    /// Blocks movement, not sight.
    Movable,
    /// Blocks movement and makes a diagonal sightline around it non-open.
    Partial,
    /// Blocks movement and sight.
    Full,
    /// Blocks lateral movement but allows climbing up or down along the face.
    Climbable,
}

/// How a face treats a sightline.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub enum Sight {
    Clear,
    Partial,
    Blocked,
}

impl WallType {
    fn rank(self) -> u8 {
        match self {
            WallType::None => 0,
            WallType::Movable => 1,
            WallType::Climbable => 2,
            WallType::Partial => 3,
            WallType::Full => 4,
        }
    }

    /// The stronger of two classifications, used when two tiles disagree about a shared face.
    pub fn max(self, other: WallType) -> WallType {
        if other.rank() > self.rank() {
            other
        } else {
            self
        }
    }

    pub fn is_open(self) -> bool {
        self == WallType::None
    }

    pub fn sight(self) -> Sight {
        match self {
            WallType::None | WallType::Movable | WallType::Climbable => Sight::Clear,
            WallType::Partial => Sight::Partial,
            WallType::Full => Sight::Blocked,
        }
    }
}

/// One [`WallType`] per cubic face, indexed by [`Dir::wall_slot`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Walls([WallType; 6]);

impl Walls {
    pub const OPEN: Walls = Walls([WallType::None; 6]);
    pub const SEALED: Walls = Walls([WallType::Full; 6]);

    /// Diagonal directions have no face of their own and always read as [`WallType::None`].
    pub fn get(&self, dir: Dir) -> WallType {
        dir.wall_slot()
            .map_or(WallType::None, |slot| self.0[slot])
    }

    /// Sets a face. Diagonal directions are ignored.
    pub fn set(&mut self, dir: Dir, wall: WallType) {
        if let Some(slot) = dir.wall_slot() {
            self.0[slot] = wall;
        }
    }

    /// Faces carrying exactly `wall`, as a direction mask.
    pub fn mask(&self, wall: WallType) -> Edges {
        Dir::cubic()
            .filter(|dir| self.get(*dir) == wall)
            .fold(Edges::empty(), |mask, dir| mask | dir.bit())
    }

    pub fn any(&self, wall: WallType) -> bool {
        self.0.contains(&wall)
    }
}

/// Raw per-tile classification coming from an environment sampler.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Occupancy {
    #[default]
    Open,
    Blocked,
    Climbable,
}

bitflags::bitflags! {
    /// Coarse tags derived by [`crate::connectivity::ConnectivityBuilder`].
    #[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
    #[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
    pub struct TileType: u8 {
        const EMPTY = 1 << 0;
        /// Solid volume; never walkable.
        const TERRAIN = 1 << 1;
        /// Has an upward affordance on at least one face.
        const CLIMB = 1 << 2;
        /// No floor; sits over open space.
        const JUMP = 1 << 3;
        /// Temporarily taken by an agent.
        const OCCUPIED = 1 << 4;
    }
}

impl TileType {
    pub const WALKABLE: TileType = TileType::EMPTY.union(TileType::CLIMB).union(TileType::JUMP);
    pub const BLOCKED: TileType = TileType::TERRAIN.union(TileType::OCCUPIED);
}

/// A single grid cell.
///
/// `coord` and `index` are fixed when the grid allocates the tile and can't be changed
/// afterwards, so a tile always agrees with the slot it lives in.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Tile {
    coord: Coord,
    index: usize,
    pub(crate) occupancy: Occupancy,
    pub(crate) covers: Walls,
    pub(crate) walls: Walls,
    pub(crate) edges: Edges,
    pub(crate) kind: TileType,
}

impl Tile {
    pub(crate) fn new(coord: Coord, index: usize) -> Self {
        Tile {
            coord,
            index,
            occupancy: Occupancy::Open,
            covers: Walls::OPEN,
            walls: Walls::OPEN,
            edges: Edges::empty(),
            kind: TileType::EMPTY,
        }
    }

    pub fn coord(&self) -> Coord {
        self.coord
    }

    pub fn index(&self) -> usize {
        self.index
    }

    pub fn occupancy(&self) -> Occupancy {
        self.occupancy
    }

    /// Cover as sampled or edited, before neighbours and floors are merged in.
    pub fn covers(&self) -> &Walls {
        &self.covers
    }

    pub fn walls(&self) -> &Walls {
        &self.walls
    }

    pub fn wall(&self, dir: Dir) -> WallType {
        self.walls.get(dir)
    }

    pub fn edges(&self) -> Edges {
        self.edges
    }

    pub fn has_edge(&self, dir: Dir) -> bool {
        self.edges.has(dir)
    }

    pub fn kind(&self) -> TileType {
        self.kind
    }

    pub fn is_terrain(&self) -> bool {
        self.kind.contains(TileType::TERRAIN)
    }

    pub fn is_occupied(&self) -> bool {
        self.kind.contains(TileType::OCCUPIED)
    }

    /// Terrain or occupied.
    pub fn is_blocked(&self) -> bool {
        self.kind.intersects(TileType::BLOCKED)
    }

    pub fn is_walkable(&self) -> bool {
        !self.is_blocked() && self.kind.intersects(TileType::WALKABLE)
    }

    /// Whether the face toward `dir` lets an agent through. Only meaningful for cubic
    /// directions; diagonal passage is decided by [`crate::neighbor::has_passage`].
    pub fn is_movable(&self, dir: Dir) -> bool {
        self.walls.get(dir).is_open()
    }

    pub fn has_floor(&self) -> bool {
        self.walls.get(DOWN) == WallType::Full
    }

    pub fn has_climbable(&self) -> bool {
        self.walls.any(WallType::Climbable)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dir::*;

    #[test]
    fn test_wall_max() {
        assert_eq!(WallType::None.max(WallType::Partial), WallType::Partial);
        assert_eq!(WallType::Full.max(WallType::Climbable), WallType::Full);
        assert_eq!(WallType::Climbable.max(WallType::Movable), WallType::Climbable);
    }

    #[test]
    fn test_walls_ignore_diagonals() {
        let mut walls = Walls::OPEN;
        walls.set(NORTHEAST, WallType::Full);
        assert_eq!(walls, Walls::OPEN);
        assert_eq!(walls.get(NORTHEAST), WallType::None);

        walls.set(EAST, WallType::Climbable);
        walls.set(DOWN, WallType::Full);
        assert_eq!(walls.mask(WallType::Climbable), Edges::EAST);
        assert_eq!(walls.mask(WallType::Full), Edges::DOWN);
        assert!(walls.any(WallType::Climbable));
    }

    #[test]
    fn test_tile_flags() {
        let mut tile = Tile::new(Coord::new(1, 2, 3), 7);
        assert!(tile.is_walkable());
        assert!(!tile.has_floor());

        tile.walls.set(DOWN, WallType::Full);
        assert!(tile.has_floor());
        assert!(!tile.is_movable(DOWN));

        tile.kind |= TileType::OCCUPIED;
        assert!(tile.is_blocked());
        assert!(!tile.is_walkable());
        assert!(!tile.is_terrain());
    }

    #[test]
    fn test_sight_classes() {
        assert_eq!(WallType::Movable.sight(), Sight::Clear);
        assert_eq!(WallType::Partial.sight(), Sight::Partial);
        assert_eq!(WallType::Full.sight(), Sight::Blocked);
    }
}

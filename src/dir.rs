//! The ten tile directions and the [`Edges`] bitmask built over them.
use bevy::math::IVec3;
use strum::{Display, EnumCount, EnumIter, IntoEnumIterator};

/// A step direction. The discriminant is the bit position in [`Edges`] and, for the six cubic
/// directions, the slot in [`crate::tile::Walls`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Display, EnumIter, EnumCount)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Dir {
    NORTH = 0,
    EAST = 1,
    SOUTH = 2,
    WEST = 3,
    UP = 4,
    DOWN = 5,
    NORTHEAST = 6,
    SOUTHEAST = 7,
    SOUTHWEST = 8,
    NORTHWEST = 9,
}

pub use self::Dir::*;

impl Dir {
    pub fn cardinal() -> std::iter::Copied<std::slice::Iter<'static, Dir>> {
        [NORTH, EAST, SOUTH, WEST].iter().copied()
    }

    pub fn diagonal() -> std::iter::Copied<std::slice::Iter<'static, Dir>> {
        [NORTHEAST, SOUTHEAST, SOUTHWEST, NORTHWEST].iter().copied()
    }

    /// Cardinal then diagonal directions; everything on the same level.
    pub fn lateral() -> std::iter::Copied<std::slice::Iter<'static, Dir>> {
        [
            NORTH, EAST, SOUTH, WEST, NORTHEAST, SOUTHEAST, SOUTHWEST, NORTHWEST,
        ]
        .iter()
        .copied()
    }

    /// The six faces of a tile.
    pub fn cubic() -> std::iter::Copied<std::slice::Iter<'static, Dir>> {
        [NORTH, EAST, SOUTH, WEST, UP, DOWN].iter().copied()
    }

    /// All ten directions in bit order.
    pub fn all() -> DirIter {
        Dir::iter()
    }

    pub fn vector(self) -> IVec3 {
        match self {
            NORTH => IVec3::new(0, 0, 1),
            EAST => IVec3::new(1, 0, 0),
            SOUTH => IVec3::new(0, 0, -1),
            WEST => IVec3::new(-1, 0, 0),
            UP => IVec3::new(0, 1, 0),
            DOWN => IVec3::new(0, -1, 0),
            NORTHEAST => IVec3::new(1, 0, 1),
            SOUTHEAST => IVec3::new(1, 0, -1),
            SOUTHWEST => IVec3::new(-1, 0, -1),
            NORTHWEST => IVec3::new(-1, 0, 1),
        }
    }

    pub fn opposite(self) -> Dir {
        match self {
            NORTH => SOUTH,
            EAST => WEST,
            SOUTH => NORTH,
            WEST => EAST,
            UP => DOWN,
            DOWN => UP,
            NORTHEAST => SOUTHWEST,
            SOUTHEAST => NORTHWEST,
            SOUTHWEST => NORTHEAST,
            NORTHWEST => SOUTHEAST,
        }
    }

    /// The two cardinal directions that make up a diagonal.
    pub fn flanks(self) -> Option<(Dir, Dir)> {
        match self {
            NORTHEAST => Some((NORTH, EAST)),
            SOUTHEAST => Some((SOUTH, EAST)),
            SOUTHWEST => Some((SOUTH, WEST)),
            NORTHWEST => Some((NORTH, WEST)),
            _ => None,
        }
    }

    pub fn is_diagonal(self) -> bool {
        matches!(self, NORTHEAST | SOUTHEAST | SOUTHWEST | NORTHWEST)
    }

    pub fn is_cardinal(self) -> bool {
        matches!(self, NORTH | EAST | SOUTH | WEST)
    }

    pub fn is_vertical(self) -> bool {
        matches!(self, UP | DOWN)
    }

    /// Wall slot for the six cubic directions.
    pub fn wall_slot(self) -> Option<usize> {
        if self.is_diagonal() {
            None
        } else {
            Some(self as usize)
        }
    }

    pub fn bit(self) -> Edges {
        Edges::from_bits_truncate(1 << self as u16)
    }

    /// Direction of a unit step, if `v` is one of the ten direction vectors.
    pub fn from_vector(v: IVec3) -> Option<Dir> {
        Dir::iter().find(|dir| dir.vector() == v)
    }

    /// Rounds the lateral offset `(dx, dz)` to the nearest of the eight lateral directions.
    ///
    /// The offset is normalised first, so `(-1, -2)` rounds to `SOUTH` while `(-1, -1)` is
    /// `SOUTHWEST`. A zero offset has no direction.
    pub fn toward(dx: i32, dz: i32) -> Option<Dir> {
        if dx == 0 && dz == 0 {
            return None;
        }

        let length = ((dx * dx + dz * dz) as f32).sqrt();
        let x = (dx as f32 / length).round() as i32;
        let z = (dz as f32 / length).round() as i32;
        Dir::from_vector(IVec3::new(x, 0, z))
    }
}

bitflags::bitflags! {
    /// One bit per [`Dir`]; a set bit is a traversable edge from a tile in that direction.
    #[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
    #[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
    pub struct Edges: u16 {
        const NORTH = 1 << 0;
        const EAST = 1 << 1;
        const SOUTH = 1 << 2;
        const WEST = 1 << 3;
        const UP = 1 << 4;
        const DOWN = 1 << 5;
        const NORTHEAST = 1 << 6;
        const SOUTHEAST = 1 << 7;
        const SOUTHWEST = 1 << 8;
        const NORTHWEST = 1 << 9;
    }
}

impl Edges {
    pub const CARDINAL: Edges = Edges::NORTH
        .union(Edges::EAST)
        .union(Edges::SOUTH)
        .union(Edges::WEST);
    pub const DIAGONAL: Edges = Edges::NORTHEAST
        .union(Edges::SOUTHEAST)
        .union(Edges::SOUTHWEST)
        .union(Edges::NORTHWEST);
    pub const LATERAL: Edges = Edges::CARDINAL.union(Edges::DIAGONAL);

    pub fn has(self, dir: Dir) -> bool {
        self.contains(dir.bit())
    }

    /// The directions set in this mask, in bit order.
    pub fn dirs(self) -> impl Iterator<Item = Dir> {
        Dir::iter().filter(move |dir| self.has(*dir))
    }
}

impl From<Dir> for Edges {
    fn from(dir: Dir) -> Self {
        dir.bit()
    }
}

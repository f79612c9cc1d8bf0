//! Signed tile coordinates. `y` is up, north is `+z` and east is `+x`.
use std::fmt;

use bevy::math::IVec3;

use crate::dir::Dir;

/// A tile position inside a [`crate::grid::Grid`].
///
/// Components are `i8` so a grid axis can hold at most 128 tiles. Coordinates compare for
/// equality only; there is no meaningful ordering between two tiles.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Coord {
    pub x: i8,
    pub y: i8,
    pub z: i8,
}

impl Coord {
    pub const ZERO: Coord = Coord::new(0, 0, 0);

    pub const fn new(x: i8, y: i8, z: i8) -> Self {
        Coord { x, y, z }
    }

    /// Converts an `IVec3`, returning `None` if any component does not fit in an `i8`.
    pub fn from_ivec3(v: IVec3) -> Option<Self> {
        Some(Coord {
            x: i8::try_from(v.x).ok()?,
            y: i8::try_from(v.y).ok()?,
            z: i8::try_from(v.z).ok()?,
        })
    }

    pub fn as_ivec3(self) -> IVec3 {
        IVec3::new(self.x as i32, self.y as i32, self.z as i32)
    }

    /// The coordinate one step away in `dir`, or `None` if it leaves the `i8` range.
    pub fn step(self, dir: Dir) -> Option<Self> {
        Self::from_ivec3(self.as_ivec3() + dir.vector())
    }

    /// Component-wise difference `self - other` widened to `IVec3`.
    pub fn delta(self, other: Coord) -> IVec3 {
        self.as_ivec3() - other.as_ivec3()
    }
}

impl From<Coord> for IVec3 {
    fn from(coord: Coord) -> Self {
        coord.as_ivec3()
    }
}

impl fmt::Display for Coord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {}, {})", self.x, self.y, self.z)
    }
}

//! Field of view: which tiles a unit standing on a tile can see.
//!
//! Sight follows looser rules than movement. A cubic face blocks sight only when it is
//! [`WallType::Full`] on either side, and a diagonal sightline only needs one of its two
//! flanking routes to be clear.
//!
//! [`WallType::Full`]: crate::tile::WallType::Full
use bevy::math::Vec2;

use crate::{
    coord::Coord,
    dir::Dir,
    grid::Grid,
    raycast::sightlines,
    shadowcast::shadowcast,
    tile::Sight,
    CoordSet,
};

/// How [`Grid::visibility`] scans for visible tiles.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub enum VisionMethod {
    /// Recursive octant shadowcasting over the whole circle, filtered to the cone afterwards.
    #[default]
    Shadowcast,
    /// Rays fanned across the cone, each walked until it hits something.
    Sightlines,
}

/// The area a [`Grid::visibility`] query looks into.
///
/// `forward` points the cone and its horizontal length is the view range in tiles.
///
/// ```
/// use tactical_grid::prelude::*;
///
/// let cone = ViewCone::new(Coord::new(0, 0, 6), 90.0);
/// assert_eq!(cone.range(), 6.0);
///
/// let all_around = ViewCone::around(4).include_center();
/// assert!(all_around.contains(Coord::ZERO, Coord::new(-3, 0, -1)));
/// ```
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct ViewCone {
    pub forward: Coord,
    /// Full opening angle in degrees. 360 or more sees all around.
    pub angle_width: f32,
    pub method: VisionMethod,
    /// Whether the viewer's own tile belongs to the result.
    pub include_center: bool,
}

impl ViewCone {
    pub fn new(forward: Coord, angle_width: f32) -> Self {
        ViewCone {
            forward,
            angle_width,
            method: VisionMethod::default(),
            include_center: false,
        }
    }

    /// A full circle of the given radius.
    pub fn around(range: i8) -> Self {
        ViewCone::new(Coord::new(0, 0, range), 360.0)
    }

    pub fn with_method(mut self, method: VisionMethod) -> Self {
        self.method = method;
        self
    }

    pub fn include_center(mut self) -> Self {
        self.include_center = true;
        self
    }

    /// View range in tiles.
    pub fn range(&self) -> f32 {
        self.heading().length()
    }

    fn heading(&self) -> Vec2 {
        Vec2::new(self.forward.x as f32, self.forward.z as f32)
    }

    /// Whether `coord` lies within the cone's angle when viewed from `center`. Range is not
    /// checked.
    pub fn contains(&self, center: Coord, coord: Coord) -> bool {
        if self.angle_width >= 360.0 {
            return true;
        }

        let delta = coord.delta(center);
        let offset = Vec2::new(delta.x as f32, delta.z as f32);
        if offset == Vec2::ZERO {
            return true;
        }

        let cos = self
            .heading()
            .normalize_or_zero()
            .dot(offset.normalize_or_zero())
            .clamp(-1.0, 1.0);
        cos.acos().to_degrees() <= self.angle_width * 0.5 + 1e-3
    }
}

/// How the shared face between two adjacent tiles treats a sightline.
fn face_sight(grid: &Grid, from: usize, to: usize, dir: Dir) -> Sight {
    let near = grid.tile_at(from).wall(dir).sight();
    let far = grid.tile_at(to).wall(dir.opposite()).sight();
    near.max(far)
}

/// Two cubic steps around the corner of a diagonal, both fully clear.
fn flank_route(grid: &Grid, index: usize, first: Dir, second: Dir) -> bool {
    let Some(mid) = grid.neighbor(index, first) else {
        return false;
    };
    let Some(end) = grid.neighbor(mid, second) else {
        return false;
    };

    face_sight(grid, index, mid, first) == Sight::Clear
        && face_sight(grid, mid, end, second) == Sight::Clear
}

/// Whether sight passes from the tile at `index` into its neighbor toward `dir`.
///
/// A cubic step is clear unless either side of the shared face is `Full`. A diagonal step is
/// clear when at least one of the two routes around its corner is clear on all four faces it
/// crosses. A `Partial` face doesn't stop a cubic sightline but does close a corner route.
pub fn sight_clear(grid: &Grid, index: usize, dir: Dir) -> bool {
    let Some(target) = grid.neighbor(index, dir) else {
        return false;
    };

    match dir.flanks() {
        None => face_sight(grid, index, target, dir) != Sight::Blocked,
        Some((a, b)) => flank_route(grid, index, a, b) || flank_route(grid, index, b, a),
    }
}

pub(crate) fn visible_tiles(grid: &Grid, center: usize, cone: &ViewCone) -> CoordSet {
    let origin = grid.tile_at(center).coord();

    let mut visible = timed!("Visibility", {
        match cone.method {
            VisionMethod::Shadowcast => shadowcast(grid, center, cone.range()),
            VisionMethod::Sightlines => sightlines(grid, center, cone),
        }
    });

    visible.retain(|&coord| cone.contains(origin, coord));
    if cone.include_center {
        visible.insert(origin);
    }

    visible
}

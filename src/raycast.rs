//! Sightline sweep: rays fanned across a view cone and walked tile by tile.
use std::f32::consts::{PI, TAU};

use bevy::math::IVec3;

use crate::{
    coord::Coord,
    dir::Dir,
    grid::Grid,
    visibility::{sight_clear, ViewCone},
    CoordSet,
};

/// Tiles on `center`'s level hit by a fan of rays across `cone`.
///
/// Rays are `atan(1 / range)` radians apart, so adjacent rays drift at most one tile apart
/// by the end of the range.
pub(crate) fn sightlines(grid: &Grid, center: usize, cone: &ViewCone) -> CoordSet {
    let mut visible = CoordSet::default();
    let range = cone.range();
    if range <= 0.0 {
        return visible;
    }

    let heading = (cone.forward.x as f32).atan2(cone.forward.z as f32);
    let (first, sweep) = if cone.angle_width >= 360.0 {
        (heading - PI, TAU)
    } else {
        let half = cone.angle_width.max(0.0).to_radians() * 0.5;
        (heading - half, half * 2.0)
    };

    let step = range.recip().atan();
    let rays = (sweep / step).ceil() as u32;
    for ray in 0..=rays {
        let angle = first + (ray as f32 * step).min(sweep);
        trace(grid, center, angle, range, &mut visible);
    }

    visible
}

/// Walks one ray from `center` until it leaves the range, the grid or the line of sight.
fn trace(grid: &Grid, center: usize, angle: f32, range: f32, visible: &mut CoordSet) {
    let dx = angle.sin() * range;
    let dz = angle.cos() * range;
    let steps = dx.abs().max(dz.abs()).ceil();
    if steps < 1.0 {
        return;
    }

    let origin = grid.tile_at(center).coord();
    let (x_step, z_step) = (dx / steps, dz / steps);
    let (mut x, mut z) = (0.0f32, 0.0f32);

    let mut current = center;
    let mut last = origin;

    for _ in 0..steps as u32 {
        x += x_step;
        z += z_step;

        let offset = IVec3::new(x.round() as i32, 0, z.round() as i32);
        if (offset.x * offset.x + offset.z * offset.z) as f32 > range * range {
            return;
        }

        let Some(coord) = Coord::from_ivec3(origin.as_ivec3() + offset) else {
            return;
        };
        if coord == last {
            continue;
        }

        let Some(dir) = Dir::from_vector(coord.delta(last)) else {
            return;
        };
        if !sight_clear(grid, current, dir) {
            return;
        }
        let Some(next) = grid.neighbor(current, dir) else {
            return;
        };

        visible.insert(coord);
        current = next;
        last = coord;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        connectivity::{ConnectivityBuilder, SampleMap},
        dir::*,
        grid::GridSettingsBuilder,
    };

    fn built(x: u32, y: u32, z: u32, samples: &SampleMap) -> Grid {
        let mut grid = Grid::new(&GridSettingsBuilder::new(x, y, z).build()).unwrap();
        ConnectivityBuilder::build(&mut grid, samples);
        grid
    }

    #[test]
    fn test_single_ray() {
        let grid = built(5, 1, 5, &SampleMap::new());
        let center = grid.index(Coord::new(2, 0, 0)).unwrap();
        let mut visible = CoordSet::default();

        trace(&grid, center, 0.0, 4.0, &mut visible);
        let seen: Vec<Coord> = visible.into_iter().collect();
        assert_eq!(
            seen,
            vec![
                Coord::new(2, 0, 1),
                Coord::new(2, 0, 2),
                Coord::new(2, 0, 3),
                Coord::new(2, 0, 4)
            ]
        );
    }

    #[test]
    fn test_ray_stops_at_cover() {
        let grid = built(5, 1, 5, &SampleMap::new().cover(Coord::new(2, 0, 2), NORTH));
        let center = grid.index(Coord::new(2, 0, 0)).unwrap();
        let mut visible = CoordSet::default();

        trace(&grid, center, 0.0, 4.0, &mut visible);
        assert_eq!(visible.len(), 2);
        assert!(!visible.contains(&Coord::new(2, 0, 3)));
    }

    #[test]
    fn test_ray_stops_at_edge() {
        let grid = built(3, 1, 3, &SampleMap::new());
        let center = grid.index(Coord::new(1, 0, 1)).unwrap();
        let mut visible = CoordSet::default();

        trace(&grid, center, PI * 0.5, 5.0, &mut visible);
        assert_eq!(visible.len(), 1);
        assert!(visible.contains(&Coord::new(2, 0, 1)));
    }

    #[test]
    fn test_narrow_cone_sweep() {
        let grid = built(7, 1, 7, &SampleMap::new());
        let center = grid.index(Coord::new(3, 0, 0)).unwrap();
        let cone = ViewCone::new(Coord::new(0, 0, 5), 10.0);

        let visible = sightlines(&grid, center, &cone);
        assert!(visible.contains(&Coord::new(3, 0, 5)));
        assert!(visible.iter().all(|c| c.x == 3));
    }
}

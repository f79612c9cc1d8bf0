//! Recursive octant shadowcasting on the viewer's level.
use bevy::math::IVec3;

use crate::{coord::Coord, dir::Dir, grid::Grid, visibility::sight_clear, CoordSet};

/// Multipliers `[xx, xy, zx, zy]` taking an octant's `(col, row)` to a grid `(x, z)` offset.
/// The octants run counter-clockwise starting at east.
const OCTANTS: [[i32; 4]; 8] = [
    [1, 0, 0, 1],
    [0, 1, 1, 0],
    [0, -1, 1, 0],
    [-1, 0, 0, 1],
    [-1, 0, 0, -1],
    [0, -1, -1, 0],
    [0, 1, -1, 0],
    [1, 0, 0, -1],
];

struct Caster<'a> {
    grid: &'a Grid,
    origin: Coord,
    radius_sq: f32,
    ceiling: i32,
    visible: CoordSet,
}

/// Tiles on `center`'s level visible within `range` tiles, in every direction.
pub(crate) fn shadowcast(grid: &Grid, center: usize, range: f32) -> CoordSet {
    let mut caster = Caster {
        grid,
        origin: grid.tile_at(center).coord(),
        radius_sq: range * range,
        ceiling: range.max(0.0).ceil() as i32,
        visible: CoordSet::default(),
    };

    for octant in &OCTANTS {
        caster.cast_light(octant, 1, 1.0, 0.0);
    }

    caster.visible
}

impl Caster<'_> {
    /// Whether the tile at `index` sees back toward the origin across its first step.
    fn lit(&self, index: usize, coord: Coord) -> bool {
        let back = self.origin.delta(coord);
        Dir::toward(back.x, back.z).is_some_and(|dir| sight_clear(self.grid, index, dir))
    }

    /// Scans one octant outward from `start_col`, within the wedge between the slopes
    /// `right_view` and `left_view`.
    ///
    /// A run of blocked cells splits the wedge: the part left of the run is scanned by a
    /// recursive call and this call carries on below the run.
    fn cast_light(
        &mut self,
        octant: &[i32; 4],
        start_col: i32,
        mut left_view: f32,
        right_view: f32,
    ) {
        let [xx, xy, zx, zy] = *octant;
        let origin = self.origin.as_ivec3();

        let mut prev_blocked = false;
        let mut saved_right = 0.0;

        for col in start_col..=self.ceiling {
            for row in (0..=col).rev() {
                let cell = IVec3::new(
                    origin.x + col * xx + row * xy,
                    origin.y,
                    origin.z + col * zx + row * zy,
                );

                let Some((coord, index)) = Coord::from_ivec3(cell)
                    .and_then(|coord| self.grid.index(coord).map(|index| (coord, index)))
                else {
                    continue;
                };

                let left_block = (row as f32 + 1.0) / col as f32;
                let right_block = row as f32 / (col as f32 + 1.0);

                if right_block > left_view {
                    continue;
                }
                if left_block < right_view {
                    break;
                }

                let in_range = (col * col + row * row) as f32 <= self.radius_sq;
                let blocked = !(in_range && self.lit(index, coord));
                if !blocked {
                    self.visible.insert(coord);
                }

                if prev_blocked {
                    if blocked {
                        saved_right = right_block;
                    } else {
                        prev_blocked = false;
                        left_view = saved_right;
                    }
                } else if blocked {
                    if left_block <= left_view {
                        self.cast_light(octant, col + 1, left_view, left_block);
                    }
                    prev_blocked = true;
                    saved_right = right_block;
                }
            }

            if prev_blocked {
                break;
            }
        }
    }
}

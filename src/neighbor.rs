//! Movement affordances shared by path and range searches.
//!
//! [`NeighborRule`] answers "where can an agent on this tile get to in one move", taking
//! walls, corner cutting, drops, jumps and climbs into account.
use smallvec::SmallVec;

use crate::{
    dir::*,
    grid::Grid,
    tile::WallType,
};

/// Neighbor buffer; a tile never has more than one target per direction.
pub type Neighbors = SmallVec<[usize; 10]>;

/// Limits on vertical movement.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct MoveSettings {
    /// How many levels a drop may fall looking for a floor.
    pub drop_depth: u8,
    /// How many levels a jump may rise looking for a landing.
    pub jump_height: u8,
}

impl Default for MoveSettings {
    fn default() -> Self {
        MoveSettings {
            drop_depth: 2,
            jump_height: 1,
        }
    }
}

/// Whether an agent can leave the tile at `index` toward `dir`.
///
/// Cubic directions need an open face and an in-bounds, non-terrain tile beyond it. A
/// diagonal additionally needs both flanking faces open on this tile, and each flank tile
/// open toward the other flank, so a single blocked corner can't be cut.
pub fn has_passage(grid: &Grid, index: usize, dir: Dir) -> bool {
    let Some(target) = grid.neighbor(index, dir) else {
        return false;
    };

    if grid.tile_at(target).is_terrain() {
        return false;
    }

    let tile = grid.tile_at(index);
    let Some((a, b)) = dir.flanks() else {
        return tile.is_movable(dir);
    };

    if !tile.is_movable(a) || !tile.is_movable(b) {
        return false;
    }

    match (grid.neighbor(index, a), grid.neighbor(index, b)) {
        (Some(flank_a), Some(flank_b)) => {
            grid.tile_at(flank_a).is_movable(b) && grid.tile_at(flank_b).is_movable(a)
        }
        _ => false,
    }
}

/// Resolves single moves on a grid.
#[derive(Clone, Copy)]
pub struct NeighborRule<'a> {
    grid: &'a Grid,
    moves: MoveSettings,
}

impl<'a> NeighborRule<'a> {
    pub fn new(grid: &'a Grid, moves: MoveSettings) -> Self {
        NeighborRule { grid, moves }
    }

    /// Fills `out` with every tile reachable from `index` in one move.
    ///
    /// Directions are tried in [`Dir`] order. A lateral step onto a floorless tile drops to the
    /// first floor below it; a step up prefers a jump landing over a climb.
    pub fn neighbors(&self, index: usize, out: &mut Neighbors) {
        out.clear();
        let grid = self.grid;

        for dir in Dir::all() {
            if !has_passage(grid, index, dir) {
                continue;
            }

            let Some(next) = grid.neighbor(index, dir) else {
                continue;
            };

            let neighbor = grid.tile_at(next);
            if neighbor.is_blocked() {
                continue;
            }

            let target = match dir {
                UP => self
                    .jump_target(next)
                    .or_else(|| self.can_climb(index, next).then_some(next)),
                DOWN => self.can_climb(index, next).then_some(next),
                _ if neighbor.has_floor() => Some(next),
                _ => self.drop_target(next).or_else(|| {
                    (dir.is_cardinal() && self.can_climb(index, next)).then_some(next)
                }),
            };

            if let Some(target) = target {
                if !out.contains(&target) {
                    out.push(target);
                }
            }
        }
    }

    /// First tile with a floor straight below `index`, at most `drop_depth` levels down.
    fn drop_target(&self, index: usize) -> Option<usize> {
        let grid = self.grid;
        let mut current = index;

        for _ in 0..self.moves.drop_depth {
            if grid.tile_at(current).wall(DOWN) == WallType::Full {
                return None;
            }

            let below = grid.neighbor(current, DOWN)?;
            let tile = grid.tile_at(below);
            if tile.is_blocked() {
                return None;
            }

            if tile.has_floor() {
                return Some(below);
            }

            current = below;
        }

        None
    }

    /// Landing spot for a jump through the floorless tile `above`.
    ///
    /// Each level from `above` upward, at most `jump_height` of them, is scanned for a lateral
    /// neighbor with a floor.
    fn jump_target(&self, above: usize) -> Option<usize> {
        let grid = self.grid;
        let mut level = above;

        for height in 0..self.moves.jump_height {
            let tile = grid.tile_at(level);
            if tile.has_floor() || tile.is_blocked() {
                return None;
            }

            let landing = Dir::lateral()
                .filter(|&dir| has_passage(grid, level, dir))
                .filter_map(|dir| grid.neighbor(level, dir))
                .find(|&n| {
                    let landing = grid.tile_at(n);
                    landing.has_floor() && !landing.is_blocked()
                });

            if landing.is_some() {
                return landing;
            }

            if height + 1 < self.moves.jump_height {
                if !has_passage(grid, level, UP) {
                    return None;
                }
                level = grid.neighbor(level, UP)?;
            }
        }

        None
    }

    /// Climb legality between two adjacent tiles.
    ///
    /// Going up needs a climbable face on the departure tile, going down needs one on the
    /// destination. Stepping sideways onto a floorless tile needs the tile under it to have a
    /// climbable face turned back toward `from`.
    fn can_climb(&self, from: usize, to: usize) -> bool {
        let grid = self.grid;
        let origin = grid.tile_at(from);
        let target = grid.tile_at(to);
        let delta = origin.coord().delta(target.coord());

        if delta.y < 0 {
            return origin.has_climbable();
        }

        if delta.y > 0 {
            return target.has_climbable();
        }

        let Some(back) = Dir::from_vector(delta) else {
            return false;
        };

        grid.neighbor(to, DOWN)
            .is_some_and(|below| grid.tile_at(below).wall(back) == WallType::Climbable)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        connectivity::{ConnectivityBuilder, SampleMap},
        coord::Coord,
        grid::GridSettingsBuilder,
    };

    fn built(x: u32, y: u32, z: u32, samples: &SampleMap) -> Grid {
        let mut grid = Grid::new(&GridSettingsBuilder::new(x, y, z).build()).unwrap();
        ConnectivityBuilder::build(&mut grid, samples);
        grid
    }

    fn neighbors_of(grid: &Grid, coord: Coord, moves: MoveSettings) -> Vec<Coord> {
        let mut out = Neighbors::new();
        let index = grid.index(coord).unwrap();
        NeighborRule::new(grid, moves).neighbors(index, &mut out);
        out.iter().map(|&n| grid.tile_at(n).coord()).collect()
    }

    fn moves(drop_depth: u8, jump_height: u8) -> MoveSettings {
        MoveSettings {
            drop_depth,
            jump_height,
        }
    }

    #[test]
    fn test_corner_cut_is_blocked() {
        let grid = built(3, 1, 3, &SampleMap::new().block(Coord::new(1, 0, 0)));
        let index = grid.index(Coord::new(0, 0, 1)).unwrap();

        assert!(!has_passage(&grid, index, SOUTHEAST));
        assert!(has_passage(&grid, index, NORTHEAST));
        assert!(has_passage(&grid, index, SOUTH));
        assert!(!has_passage(&grid, index, WEST));
    }

    #[test]
    fn test_corner_cut_through_cover() {
        let grid = built(3, 1, 3, &SampleMap::new().cover(Coord::new(1, 0, 0), NORTH));
        let index = grid.index(Coord::new(0, 0, 0)).unwrap();

        // East flank is open on this tile but the east tile can't reach north.
        assert!(has_passage(&grid, index, EAST));
        assert!(has_passage(&grid, index, NORTH));
        assert!(!has_passage(&grid, index, NORTHEAST));
    }

    #[test]
    fn test_flat_neighbors() {
        let grid = built(3, 1, 3, &SampleMap::new());
        let found = neighbors_of(&grid, Coord::new(1, 0, 1), MoveSettings::default());
        assert_eq!(found.len(), 8);
        assert_eq!(found[0], Coord::new(1, 0, 2));
        assert_eq!(found[4], Coord::new(2, 0, 2));
    }

    #[test]
    fn test_occupied_neighbors_are_skipped() {
        let mut grid = built(3, 1, 3, &SampleMap::new());
        grid.set_occupied(Coord::new(1, 0, 2), true).unwrap();

        let found = neighbors_of(&grid, Coord::new(1, 0, 1), MoveSettings::default());
        assert_eq!(found.len(), 7);
        assert!(!found.contains(&Coord::new(1, 0, 2)));
    }

    /// Origin on a two block pillar; the column east of it is floorless down to the ground.
    fn pillar() -> Grid {
        let samples = SampleMap::new()
            .block(Coord::new(0, 0, 0))
            .block(Coord::new(0, 1, 0));
        built(3, 3, 1, &samples)
    }

    #[test]
    fn test_drop_within_depth() {
        let grid = pillar();
        let floorless = grid.tile_at_coord(Coord::new(1, 2, 0)).unwrap();
        assert_eq!(floorless.edges(), Edges::DOWN);

        let found = neighbors_of(&grid, Coord::new(0, 2, 0), moves(2, 1));
        assert_eq!(found, vec![Coord::new(1, 0, 0)]);
    }

    #[test]
    fn test_drop_too_deep() {
        let grid = pillar();
        let found = neighbors_of(&grid, Coord::new(0, 2, 0), moves(1, 1));
        assert!(found.is_empty());
    }

    #[test]
    fn test_jump_onto_ledge() {
        let grid = built(2, 2, 1, &SampleMap::new().block(Coord::new(1, 0, 0)));

        let found = neighbors_of(&grid, Coord::new(0, 0, 0), moves(2, 1));
        assert_eq!(found, vec![Coord::new(1, 1, 0)]);

        let found = neighbors_of(&grid, Coord::new(0, 0, 0), moves(2, 0));
        assert!(found.is_empty());
    }

    #[test]
    fn test_jump_height_two() {
        let samples = SampleMap::new()
            .block(Coord::new(1, 0, 0))
            .block(Coord::new(1, 1, 0));
        let grid = built(2, 3, 1, &samples);

        assert!(neighbors_of(&grid, Coord::new(0, 0, 0), moves(2, 1)).is_empty());
        assert_eq!(
            neighbors_of(&grid, Coord::new(0, 0, 0), moves(2, 2)),
            vec![Coord::new(1, 2, 0)]
        );
    }

    fn ladder() -> Grid {
        let samples = SampleMap::new()
            .block(Coord::new(1, 0, 0))
            .block(Coord::new(1, 1, 0))
            .climbable(Coord::new(0, 0, 0))
            .climbable(Coord::new(0, 1, 0));
        built(2, 3, 1, &samples)
    }

    #[test]
    fn test_climb_up() {
        let grid = ladder();

        let found = neighbors_of(&grid, Coord::new(0, 0, 0), moves(2, 1));
        assert_eq!(found, vec![Coord::new(0, 1, 0)]);

        // A jump landing wins over the climb once the top is in reach.
        let found = neighbors_of(&grid, Coord::new(0, 1, 0), moves(2, 1));
        assert_eq!(found, vec![Coord::new(1, 2, 0), Coord::new(0, 0, 0)]);
    }

    #[test]
    fn test_climb_down_from_ledge() {
        let grid = ladder();

        // Deep enough to drop straight onto the ladder's foot.
        let found = neighbors_of(&grid, Coord::new(1, 2, 0), moves(2, 1));
        assert_eq!(found, vec![Coord::new(0, 0, 0)]);

        // Otherwise step onto the ladder from the top.
        let found = neighbors_of(&grid, Coord::new(1, 2, 0), moves(1, 1));
        assert_eq!(found, vec![Coord::new(0, 2, 0)]);

        let found = neighbors_of(&grid, Coord::new(0, 2, 0), moves(1, 1));
        assert!(found.contains(&Coord::new(0, 1, 0)));
    }
}

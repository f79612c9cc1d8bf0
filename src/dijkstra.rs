//! Cost bounded flood fill used for movement range.
use crate::{
    grid::Grid,
    heuristic::{heuristic, Frontier},
    neighbor::{MoveSettings, NeighborRule, Neighbors},
    CoordSet,
};

/// Every tile reachable from `center` for at most `range * direct` cost.
///
/// Tiles are drained nearest first by the heuristic to the center. A tile's cost is relaxed
/// whenever a cheaper route turns up, so the result is exactly the set of tiles whose cheapest
/// route fits the budget, and a larger range always yields a superset.
///
/// # Arguments
/// * `grid` - The grid to search.
/// * `center` - Index of the starting tile.
/// * `range` - Budget in direct steps.
/// * `moves` - Drop and jump limits.
/// * `include_start` - Whether the center itself belongs to the result.
pub(crate) fn range_grid(
    grid: &Grid,
    center: usize,
    range: u32,
    moves: &MoveSettings,
    include_start: bool,
) -> CoordSet {
    let costs = grid.costs();
    let max_cost = range.saturating_mul(costs.direct);
    let center_coord = grid.tile_at(center).coord();
    let rule = NeighborRule::new(grid, *moves);

    let mut reachable = CoordSet::default();
    if include_start {
        reachable.insert(center_coord);
    }

    let mut cost_so_far = vec![u32::MAX; grid.len()];
    cost_so_far[center] = 0;

    let mut frontier = Frontier::with_capacity(grid.max_frontier());
    frontier.push(0, 0, center);

    let mut neighbors = Neighbors::new();
    while let Some(entry) = frontier.pop() {
        let current = entry.index;
        if entry.cost > cost_so_far[current] {
            continue;
        }

        rule.neighbors(current, &mut neighbors);
        for &next in neighbors.iter() {
            let new_cost = cost_so_far[current].saturating_add(grid.step_cost(current, next));
            if new_cost > max_cost || new_cost >= cost_so_far[next] {
                continue;
            }

            cost_so_far[next] = new_cost;
            let coord = grid.tile_at(next).coord();
            if next != center {
                reachable.insert(coord);
            }
            frontier.push(heuristic(costs, coord, center_coord), new_cost, next);
        }
    }

    reachable
}

#[cfg(test)]
mod tests {
    use crate::{
        connectivity::{ConnectivityBuilder, SampleMap},
        coord::Coord,
        dir::EAST,
        grid::{Grid, GridSettingsBuilder, SearchError},
        neighbor::MoveSettings,
    };

    fn built(x: u32, y: u32, z: u32, samples: &SampleMap) -> Grid {
        let mut grid = Grid::new(&GridSettingsBuilder::new(x, y, z).build()).unwrap();
        ConnectivityBuilder::build(&mut grid, samples);
        grid
    }

    #[test]
    fn test_range_zero() {
        let grid = built(5, 1, 5, &SampleMap::new());
        let center = Coord::new(2, 0, 2);
        let moves = MoveSettings::default();

        let with_start = grid.range_field(center, 0, &moves, true).unwrap();
        assert_eq!(with_start.len(), 1);
        assert!(with_start.contains(&center));

        let without = grid.range_field(center, 0, &moves, false).unwrap();
        assert!(without.is_empty());
    }

    #[test]
    fn test_range_one_on_flat_grid() {
        let grid = built(5, 1, 5, &SampleMap::new());
        let center = Coord::new(2, 0, 2);
        let field = grid
            .range_field(center, 1, &MoveSettings::default(), false)
            .unwrap();

        // Diagonals cost more than one direct step.
        assert_eq!(field.len(), 4);
        assert!(field.contains(&Coord::new(2, 0, 3)));
        assert!(!field.contains(&Coord::new(3, 0, 3)));
        assert!(!field.contains(&center));
    }

    #[test]
    fn test_range_respects_walls() {
        let samples = SampleMap::new()
            .block(Coord::new(1, 0, 0))
            .block(Coord::new(1, 0, 1))
            .block(Coord::new(1, 0, 2))
            .block(Coord::new(1, 0, 3));
        let grid = built(5, 1, 5, &samples);
        let field = grid
            .range_field(Coord::new(0, 0, 0), 4, &MoveSettings::default(), false)
            .unwrap();

        assert!(field.contains(&Coord::new(0, 0, 4)));
        assert!(!field.contains(&Coord::new(2, 0, 0)));
        assert!(field.iter().all(|c| c.x == 0 || c.z == 4));
    }

    #[test]
    fn test_range_is_monotonic() {
        let samples = SampleMap::new()
            .block(Coord::new(2, 0, 1))
            .block(Coord::new(2, 0, 2))
            .block(Coord::new(3, 0, 2))
            .block(Coord::new(4, 0, 4))
            .block(Coord::new(4, 1, 4))
            .cover(Coord::new(1, 0, 4), EAST);
        let grid = built(6, 2, 6, &samples);
        let center = Coord::new(1, 0, 1);
        let moves = MoveSettings::default();

        let mut previous = grid.range_field(center, 0, &moves, true).unwrap();
        for range in 1..8 {
            let field = grid.range_field(center, range, &moves, true).unwrap();
            assert!(previous.iter().all(|c| field.contains(c)), "range {range}");
            previous = field;
        }
    }

    #[test]
    fn test_range_reaches_drop() {
        let samples = SampleMap::new()
            .block(Coord::new(0, 0, 0))
            .block(Coord::new(0, 1, 0));
        let grid = built(3, 3, 1, &samples);

        let field = grid
            .range_field(Coord::new(0, 2, 0), 1, &MoveSettings::default(), false)
            .unwrap();
        assert_eq!(field.len(), 1);
        assert!(field.contains(&Coord::new(1, 0, 0)));
    }

    #[test]
    fn test_range_out_of_bounds() {
        let grid = built(3, 1, 3, &SampleMap::new());
        assert_eq!(
            grid.range_field(Coord::new(0, 0, 9), 2, &MoveSettings::default(), true),
            Err(SearchError::OutOfBounds(Coord::new(0, 0, 9)))
        );
    }
}

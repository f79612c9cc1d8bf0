//! Heuristic ordered A* over the tile grid.
use bevy::log::debug;
use rand::{rngs::StdRng, seq::SliceRandom, SeedableRng};

use crate::{
    coord::Coord,
    grid::{Grid, SearchError},
    heuristic::{heuristic, Frontier},
    neighbor::{NeighborRule, Neighbors},
    path::{Path, PathSettings},
};

/// Seed for the neighbor shuffle, fixed per start tile so repeated searches agree.
pub(crate) fn search_seed(start: Coord) -> u64 {
    let x = start.x.unsigned_abs() as u64;
    let y = start.y.unsigned_abs() as u64;
    let z = start.z.unsigned_abs() as u64;
    x * y * z + 1
}

/// A* search between two tiles of a [`Grid`].
///
/// The frontier is ordered by the heuristic to the goal alone rather than `cost + heuristic`.
/// This keeps the frontier small but the returned path is not guaranteed to be the cheapest
/// one in irregular terrain.
///
/// # Arguments
/// * `grid` - The grid to search.
/// * `start` - Index of the starting tile.
/// * `goal` - Index of the goal tile.
/// * `settings` - Movement limits and result options.
///
/// # Returns
/// * The [`Path`] from goal back to start. A [`SearchError::FrontierExhausted`] if the frontier
///   outgrew [`Grid::max_frontier`], or [`SearchError::Unreachable`] if it ran dry, unless
///   `settings.partial` asks for the way to the closest tile instead.
pub(crate) fn astar_grid(
    grid: &Grid,
    start: usize,
    goal: usize,
    settings: &PathSettings,
) -> Result<Path, SearchError> {
    let costs = grid.costs();
    let limit = grid.max_frontier();
    let goal_coord = grid.tile_at(goal).coord();
    let start_coord = grid.tile_at(start).coord();
    let estimate = |index: usize| heuristic(costs, grid.tile_at(index).coord(), goal_coord);

    let mut rng = StdRng::seed_from_u64(search_seed(start_coord));
    let rule = NeighborRule::new(grid, settings.moves);

    let mut cost_so_far = vec![u32::MAX; grid.len()];
    let mut came_from = vec![usize::MAX; grid.len()];
    cost_so_far[start] = 0;
    came_from[start] = start;

    let mut frontier = Frontier::with_capacity(limit);
    frontier.push(estimate(start), 0, start);

    let mut closest = (estimate(start), start);
    let mut neighbors = Neighbors::new();
    let mut outcome = Err(SearchError::Unreachable);

    while let Some(entry) = frontier.pop() {
        let current = entry.index;
        if entry.cost > cost_so_far[current] {
            continue;
        }

        if current == goal {
            outcome = Ok(goal);
            break;
        }

        if frontier.len() >= limit {
            debug!(
                "Path search from {} to {} gave up at {} frontier entries",
                start_coord, goal_coord, limit
            );
            outcome = Err(SearchError::FrontierExhausted { limit });
            break;
        }

        if entry.estimate < closest.0 {
            closest = (entry.estimate, current);
        }

        rule.neighbors(current, &mut neighbors);
        neighbors.shuffle(&mut rng);

        for &next in neighbors.iter() {
            let new_cost = cost_so_far[current].saturating_add(grid.step_cost(current, next));
            if new_cost < cost_so_far[next] {
                cost_so_far[next] = new_cost;
                came_from[next] = current;
                frontier.push(estimate(next), new_cost, next);
            }
        }
    }

    let end = match outcome {
        Ok(end) => end,
        Err(_) if settings.partial && closest.1 != start => closest.1,
        Err(err) => return Err(err),
    };

    let mut steps = Vec::new();
    let mut current = end;
    while current != start {
        steps.push(grid.tile_at(current).coord());
        current = came_from[current];
    }

    if settings.include_start {
        steps.push(start_coord);
    }

    let path = Path::new(steps, cost_so_far[end]);
    Ok(if end == goal { path } else { path.into_partial() })
}

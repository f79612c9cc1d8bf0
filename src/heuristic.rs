//! Distance estimate and the binary heap frontier used by the searches.
use std::cmp::Ordering;
use std::collections::BinaryHeap;

use crate::{coord::Coord, grid::CostSettings};

/// Octile style estimate of the cost from `from` to `to`.
///
/// The smaller lateral delta is charged at the diagonal cost and the larger at the direct
/// cost. Height is charged at the up cost when `to` is above `from`, and half the direct
/// cost per level when it is below.
pub fn heuristic(costs: &CostSettings, from: Coord, to: Coord) -> u32 {
    let delta = to.delta(from);
    let dx = delta.x.unsigned_abs();
    let dz = delta.z.unsigned_abs();

    let vertical = if delta.y > 0 {
        costs.up.saturating_mul(delta.y.unsigned_abs())
    } else {
        (costs.direct / 2).saturating_mul(delta.y.unsigned_abs())
    };

    costs
        .diagonal
        .saturating_mul(dx.min(dz))
        .saturating_add(costs.direct.saturating_mul(dx.max(dz)))
        .saturating_add(vertical)
}

/// A frontier entry: the tile, the cost it was reached with and its priority.
#[derive(Clone, Copy, Debug)]
pub(crate) struct FrontierEntry {
    pub(crate) estimate: u32,
    pub(crate) cost: u32,
    pub(crate) index: usize,
}

impl PartialEq for FrontierEntry {
    fn eq(&self, other: &Self) -> bool {
        self.estimate == other.estimate && self.cost == other.cost
    }
}

impl Eq for FrontierEntry {}

impl PartialOrd for FrontierEntry {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

// Reversed so the max-heap pops the smallest estimate first.
impl Ord for FrontierEntry {
    fn cmp(&self, other: &Self) -> Ordering {
        match other.estimate.cmp(&self.estimate) {
            Ordering::Equal => self.cost.cmp(&other.cost),
            s => s,
        }
    }
}

/// Min-heap of tiles still to expand. Duplicate entries for a tile are allowed; the search
/// drops an entry on pop if its cost has since been beaten.
#[derive(Debug, Default)]
pub(crate) struct Frontier {
    heap: BinaryHeap<FrontierEntry>,
}

impl Frontier {
    pub(crate) fn with_capacity(capacity: usize) -> Self {
        Frontier {
            heap: BinaryHeap::with_capacity(capacity),
        }
    }

    pub(crate) fn push(&mut self, estimate: u32, cost: u32, index: usize) {
        self.heap.push(FrontierEntry {
            estimate,
            cost,
            index,
        });
    }

    pub(crate) fn pop(&mut self) -> Option<FrontierEntry> {
        self.heap.pop()
    }

    pub(crate) fn len(&self) -> usize {
        self.heap.len()
    }
}

//! This module defines [`Path`], the result of a path search, and its options.
use std::collections::VecDeque;

use crate::{coord::Coord, neighbor::MoveSettings};

/// Options for [`crate::grid::Grid::find_path`].
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct PathSettings {
    /// Drop and jump limits.
    pub moves: MoveSettings,
    /// Put the start tile at the end of the path.
    pub include_start: bool,
    /// When the goal can't be reached, return the way to the closest tile found instead of an
    /// error.
    pub partial: bool,
}

impl PathSettings {
    pub fn with_moves(mut self, moves: MoveSettings) -> Self {
        self.moves = moves;
        self
    }

    pub fn include_start(mut self) -> Self {
        self.include_start = true;
        self
    }

    pub fn partial(mut self) -> Self {
        self.partial = true;
        self
    }
}

/// An ordered list of tiles produced by a path search.
///
/// Searches emit tiles from the goal back toward the start. Call [`Path::reverse`] to walk it
/// from the start.
#[derive(Debug, Clone)]
pub struct Path {
    path: VecDeque<Coord>,
    cost: u32,
    is_reversed: bool,
    is_partial: bool,
}

impl Path {
    /// Create a new path from a vector of coordinates.
    /// # Arguments
    /// * `path` - The tiles, goal first.
    /// * `cost` - The total movement cost of the path
    ///
    pub fn new(path: Vec<Coord>, cost: u32) -> Self {
        Path {
            path: path.into(),
            cost,
            is_reversed: false,
            is_partial: false,
        }
    }

    pub(crate) fn into_partial(mut self) -> Self {
        self.is_partial = true;
        self
    }

    /// Returns true if the path contains the given tile.
    pub fn contains(&self, coord: Coord) -> bool {
        self.path.contains(&coord)
    }

    /// Returns the path as a slice of coordinates.
    ///
    /// ```
    /// use tactical_grid::prelude::*;
    ///
    /// let path = Path::new(vec![Coord::new(1, 0, 2), Coord::new(1, 0, 1)], 20);
    /// assert_eq!(path.path(), &[Coord::new(1, 0, 2), Coord::new(1, 0, 1)]);
    /// ```
    pub fn path(&self) -> &[Coord] {
        self.path.as_slices().0
    }

    /// Returns the movement cost of the path.
    pub fn cost(&self) -> u32 {
        self.cost
    }

    pub fn len(&self) -> usize {
        self.path.len()
    }

    pub fn is_empty(&self) -> bool {
        self.path.is_empty()
    }

    /// True if the path is in start to goal order.
    pub fn is_reversed(&self) -> bool {
        self.is_reversed
    }

    /// True if the search gave up and this path ends at the closest tile it found.
    pub fn is_partial(&self) -> bool {
        self.is_partial
    }

    /// Reverse the path in place.
    pub fn reverse(&mut self) {
        self.path.make_contiguous().reverse();
        self.is_reversed = !self.is_reversed;
    }

    /// Pops the first tile of the path.
    pub fn pop(&mut self) -> Option<Coord> {
        self.path.pop_front()
    }

    /// Returns the first tile of the path without removing it.
    pub fn next(&self) -> Option<Coord> {
        self.path.front().copied()
    }
}

impl PartialEq for Path {
    fn eq(&self, other: &Self) -> bool {
        self.path == other.path && self.cost == other.cost
    }
}

impl Eq for Path {}

impl IntoIterator for Path {
    type Item = Coord;
    type IntoIter = std::collections::vec_deque::IntoIter<Coord>;

    fn into_iter(self) -> Self::IntoIter {
        self.path.into_iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Path {
        Path::new(
            vec![Coord::new(2, 0, 2), Coord::new(1, 0, 1), Coord::new(0, 0, 0)],
            28,
        )
    }

    #[test]
    fn test_path_accessors() {
        let path = sample();
        assert_eq!(path.len(), 3);
        assert_eq!(path.cost(), 28);
        assert!(!path.is_empty());
        assert!(path.contains(Coord::new(1, 0, 1)));
        assert!(!path.contains(Coord::new(1, 0, 0)));
        assert_eq!(path.next(), Some(Coord::new(2, 0, 2)));
        assert!(!path.is_partial());
    }

    #[test]
    fn test_path_reverse_and_pop() {
        let mut path = sample();
        path.reverse();
        assert!(path.is_reversed());
        assert_eq!(
            path.path(),
            &[Coord::new(0, 0, 0), Coord::new(1, 0, 1), Coord::new(2, 0, 2)]
        );

        assert_eq!(path.pop(), Some(Coord::new(0, 0, 0)));
        assert_eq!(path.len(), 2);

        let rest: Vec<Coord> = path.into_iter().collect();
        assert_eq!(rest, vec![Coord::new(1, 0, 1), Coord::new(2, 0, 2)]);
    }
}

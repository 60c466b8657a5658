//! Fog-of-war bookkeeping.
//! Cells are revealed around the agent after every completed move and never hidden again.

use serde::{Deserialize, Serialize};

use crate::{Position, map::Grid};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VisibilityTracker {
    explored: Grid<bool>,
}

impl VisibilityTracker {
    /// A fully fogged mask.
    pub fn new(width: usize, height: usize) -> Self {
        VisibilityTracker {
            explored: Grid::new(width, height),
        }
    }

    /// Marks `center` and its eight neighbours as explored, clipped to the grid.
    ///
    /// Returns how many cells were newly revealed.
    pub fn reveal(&mut self, center: Position) -> usize {
        let mut revealed = 0;
        for dy in -1..=1 {
            for dx in -1..=1 {
                let Some(cell) = center.offset(dx, dy) else {
                    continue;
                };
                if let Some(explored) = self.explored.get_mut(cell) {
                    if !*explored {
                        *explored = true;
                        revealed += 1;
                    }
                }
            }
        }
        revealed
    }

    /// Whether `position` has been revealed. Out-of-bounds positions never are.
    pub fn is_explored(&self, position: Position) -> bool {
        self.explored.get(position).copied().unwrap_or(false)
    }

    /// Number of revealed cells.
    pub fn explored_count(&self) -> usize {
        self.explored.iter().filter(|e| **e).count()
    }

    /// The explored mask, `true` for revealed cells.
    pub fn mask(&self) -> &Grid<bool> {
        &self.explored
    }
}

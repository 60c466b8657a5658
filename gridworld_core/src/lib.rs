use serde::{Deserialize, Serialize};

pub mod agent;
pub mod arbiter;
pub mod config;
pub mod entities;
pub mod environment;
pub mod events;
pub mod map;
pub mod pathfinding;
pub mod simulation;
pub mod visibility;

pub use agent::{Agent, Inventory, Phase, TickOutcome};
pub use arbiter::{CandidatePool, Goal, GoalArbiter, Selection, UnreachableSet};
pub use config::{MemoPolicy, SimConfig};
pub use entities::{Door, EntityRegistry, Key};
pub use environment::{LayoutError, World};
pub use events::{EventLog, LoggedEvent, SimEvent, Thought};
pub use map::{Grid, GridError, GridMap};
pub use pathfinding::PathFinder;
pub use simulation::{Simulation, SimulationView};
pub use visibility::VisibilityTracker;

/// Represents a 2D coordinate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Position {
    pub x: usize,
    pub y: usize,
}

impl Position {
    pub const fn new(x: usize, y: usize) -> Self {
        Position { x, y }
    }

    /// Returns the position shifted by `(dx, dy)`, or `None` on underflow.
    ///
    /// The result is not bounds-checked against any grid.
    pub fn offset(self, dx: isize, dy: isize) -> Option<Position> {
        Some(Position {
            x: self.x.checked_add_signed(dx)?,
            y: self.y.checked_add_signed(dy)?,
        })
    }
}

impl std::fmt::Display for Position {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}

/// The color shared by a key and the door it opens.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum KeyColor {
    Red,
    Blue,
    Green,
    Yellow,
}

impl KeyColor {
    /// Palette order used by the standard layout.
    pub const ALL: [KeyColor; 4] = [
        KeyColor::Red,
        KeyColor::Blue,
        KeyColor::Green,
        KeyColor::Yellow,
    ];

    pub fn name(self) -> &'static str {
        match self {
            KeyColor::Red => "red",
            KeyColor::Blue => "blue",
            KeyColor::Green => "green",
            KeyColor::Yellow => "yellow",
        }
    }
}

impl std::fmt::Display for KeyColor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

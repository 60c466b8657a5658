//! Goal arbitration under fog of war.
//!
//! Candidates are drawn from four pools in strict priority order: visible
//! keys, visible doors the agent can open, unexplored cells while an
//! openable door is still unaccounted for, and finally any unexplored cell.
//! Each pool is shuffled with the caller's RNG, tested for reachability,
//! and every dead candidate is memoized so later passes skip it.

use std::cell::OnceCell;
use std::collections::{BTreeSet, HashSet};

use rand::{Rng, seq::SliceRandom};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::{
    KeyColor, Position, agent::Inventory, entities::EntityRegistry, map::GridMap,
    pathfinding::PathFinder, visibility::VisibilityTracker,
};

/// What the agent is currently heading for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Goal {
    Key { at: Position, color: KeyColor },
    Door { at: Position, color: KeyColor },
    Explore { at: Position },
}

impl Goal {
    pub fn position(&self) -> Position {
        match *self {
            Goal::Key { at, .. } | Goal::Door { at, .. } | Goal::Explore { at } => at,
        }
    }

    pub fn color(&self) -> Option<KeyColor> {
        match *self {
            Goal::Key { color, .. } | Goal::Door { color, .. } => Some(color),
            Goal::Explore { .. } => None,
        }
    }
}

/// The candidate pool a goal was drawn from, highest priority first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CandidatePool {
    VisibleKey,
    VisibleDoor,
    /// Exploring because an openable door has not been found yet.
    SeekDoor,
    Frontier,
}

/// A goal together with the pool that produced it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Selection {
    pub goal: Goal,
    pub pool: CandidatePool,
}

/// Cells already proven unreachable in this run.
///
/// A cache, not ground truth: entries may go stale when the inventory grows.
/// The simulation decides when to wipe it (see [`MemoPolicy`](crate::MemoPolicy)).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnreachableSet {
    cells: BTreeSet<Position>,
}

impl UnreachableSet {
    /// Returns `true` if the cell was not already marked.
    pub fn mark(&mut self, position: Position) -> bool {
        self.cells.insert(position)
    }

    pub fn contains(&self, position: Position) -> bool {
        self.cells.contains(&position)
    }

    pub fn clear(&mut self) {
        self.cells.clear();
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }
}

/// Reachability from the agent, flooded at most once per selection pass.
struct Reachability<'a> {
    finder: PathFinder<'a>,
    from: Position,
    cells: OnceCell<HashSet<Position>>,
}

impl Reachability<'_> {
    fn contains(&self, position: Position) -> bool {
        self.cells
            .get_or_init(|| self.finder.reachable_from(self.from))
            .contains(&position)
    }
}

/// One goal-selection pass over a frozen world.
pub struct GoalArbiter<'a> {
    map: &'a GridMap,
    entities: &'a EntityRegistry,
    visibility: &'a VisibilityTracker,
    inventory: &'a Inventory,
    from: Position,
}

impl<'a> GoalArbiter<'a> {
    pub fn new(
        map: &'a GridMap,
        entities: &'a EntityRegistry,
        visibility: &'a VisibilityTracker,
        inventory: &'a Inventory,
        from: Position,
    ) -> Self {
        GoalArbiter {
            map,
            entities,
            visibility,
            inventory,
            from,
        }
    }

    fn finder(&self) -> PathFinder<'a> {
        PathFinder::new(self.map, self.entities, self.inventory)
    }

    /// Picks the next goal, or `None` once every pool is exhausted.
    pub fn select<R: Rng + ?Sized>(
        &self,
        unreachable: &mut UnreachableSet,
        rng: &mut R,
    ) -> Option<Selection> {
        let reach = Reachability {
            finder: self.finder(),
            from: self.from,
            cells: OnceCell::new(),
        };

        let keys = self.visible_keys(unreachable);
        if let Some(goal) = first_reachable(keys, &reach, unreachable, rng) {
            return Some(Selection {
                goal,
                pool: CandidatePool::VisibleKey,
            });
        }

        let doors = self.visible_openable_doors(unreachable);
        if let Some(goal) = first_reachable(doors, &reach, unreachable, rng) {
            return Some(Selection {
                goal,
                pool: CandidatePool::VisibleDoor,
            });
        }

        let pool = if self.has_unlocated_openable_door(unreachable) {
            CandidatePool::SeekDoor
        } else {
            CandidatePool::Frontier
        };
        let cells = self.unexplored_cells(unreachable);
        first_reachable(cells, &reach, unreachable, rng).map(|goal| Selection { goal, pool })
    }

    fn visible_keys(&self, unreachable: &UnreachableSet) -> Vec<Goal> {
        self.entities
            .loose_keys()
            .iter()
            .filter(|k| self.visibility.is_explored(k.position) && !unreachable.contains(k.position))
            .map(|k| Goal::Key {
                at: k.position,
                color: k.color,
            })
            .collect()
    }

    fn visible_openable_doors(&self, unreachable: &UnreachableSet) -> Vec<Goal> {
        self.entities
            .doors()
            .iter()
            .filter(|d| {
                !d.is_open
                    && self.inventory.holds(d.color)
                    && self.visibility.is_explored(d.position)
                    && !unreachable.contains(d.position)
            })
            .map(|d| Goal::Door {
                at: d.position,
                color: d.color,
            })
            .collect()
    }

    fn has_unlocated_openable_door(&self, unreachable: &UnreachableSet) -> bool {
        self.entities.doors().iter().any(|d| {
            !d.is_open && self.inventory.holds(d.color) && !unreachable.contains(d.position)
        })
    }

    fn unexplored_cells(&self, unreachable: &UnreachableSet) -> Vec<Goal> {
        let finder = self.finder();
        self.visibility
            .mask()
            .positions()
            .filter(|&p| {
                !self.visibility.is_explored(p) && finder.can_traverse(p) && !unreachable.contains(p)
            })
            .map(|at| Goal::Explore { at })
            .collect()
    }
}

/// Shuffles `candidates`, memoizes the unreachable ones in front of the first
/// reachable candidate, and returns that candidate.
fn first_reachable<R: Rng + ?Sized>(
    mut candidates: Vec<Goal>,
    reach: &Reachability<'_>,
    unreachable: &mut UnreachableSet,
    rng: &mut R,
) -> Option<Goal> {
    candidates.shuffle(rng);
    for goal in candidates {
        if reach.contains(goal.position()) {
            return Some(goal);
        }
        let at = goal.position();
        if unreachable.mark(at) {
            debug!(x = at.x, y = at.y, ?goal, "memoized unreachable candidate");
        }
    }
    None
}

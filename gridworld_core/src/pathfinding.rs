//! Breadth-first shortest paths over the 4-connected grid.
//! Closed doors are passable for whoever holds their key; opening them is left to the mover.

use std::collections::{HashMap, HashSet, VecDeque};

use crate::{Position, agent::Inventory, entities::EntityRegistry, map::GridMap};

/// Expansion order: left, right, up, down.
const DIRECTIONS: [(isize, isize); 4] = [(-1, 0), (1, 0), (0, -1), (0, 1)];

/// Path queries against a frozen world state and inventory.
#[derive(Debug, Clone, Copy)]
pub struct PathFinder<'a> {
    map: &'a GridMap,
    entities: &'a EntityRegistry,
    inventory: &'a Inventory,
}

impl<'a> PathFinder<'a> {
    pub fn new(map: &'a GridMap, entities: &'a EntityRegistry, inventory: &'a Inventory) -> Self {
        PathFinder {
            map,
            entities,
            inventory,
        }
    }

    /// Whether the agent may stand on `position`.
    ///
    /// A door decides for its own cell regardless of the wall mask: open
    /// doors always pass, closed ones only with the matching key held.
    pub fn can_traverse(&self, position: Position) -> bool {
        if !self.map.in_bounds(position) {
            return false;
        }
        if let Some(door) = self.entities.door_at(position) {
            return door.is_open || self.inventory.holds(door.color);
        }
        !self.map.is_wall(position)
    }

    fn neighbors(&self, position: Position) -> impl Iterator<Item = Position> + '_ {
        DIRECTIONS
            .iter()
            .filter_map(move |&(dx, dy)| position.offset(dx, dy))
            .filter(move |next| self.can_traverse(*next))
    }

    /// Shortest path from `start` to `goal`, both inclusive.
    ///
    /// Returns an empty vector when `goal` cannot be reached. The same world
    /// state always yields the same path.
    pub fn find_path(&self, start: Position, goal: Position) -> Vec<Position> {
        if start == goal {
            return vec![start];
        }

        let mut came_from: HashMap<Position, Position> = HashMap::new();
        let mut visited: HashSet<Position> = HashSet::from([start]);
        let mut queue = VecDeque::from([start]);

        while let Some(current) = queue.pop_front() {
            for next in self.neighbors(current) {
                if !visited.insert(next) {
                    continue;
                }
                came_from.insert(next, current);
                if next == goal {
                    return reconstruct_path(&came_from, start, goal);
                }
                queue.push_back(next);
            }
        }

        Vec::new()
    }

    /// Every cell reachable from `start`, `start` included.
    ///
    /// Membership here is equivalent to `find_path(start, cell)` being
    /// non-empty, so one flood fill can answer a whole batch of reachability
    /// questions.
    pub fn reachable_from(&self, start: Position) -> HashSet<Position> {
        let mut visited = HashSet::from([start]);
        let mut queue = VecDeque::from([start]);

        while let Some(current) = queue.pop_front() {
            for next in self.neighbors(current) {
                if visited.insert(next) {
                    queue.push_back(next);
                }
            }
        }

        visited
    }
}

fn reconstruct_path(
    came_from: &HashMap<Position, Position>,
    start: Position,
    goal: Position,
) -> Vec<Position> {
    let mut path = vec![goal];
    let mut current = goal;
    while current != start {
        match came_from.get(&current) {
            Some(prev) => current = *prev,
            None => return Vec::new(),
        }
        path.push(current);
    }
    path.reverse();
    path
}

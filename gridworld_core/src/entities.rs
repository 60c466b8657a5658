//! Keys on the ground and the doors they open.

use serde::{Deserialize, Serialize};

use crate::{KeyColor, Position, agent::Inventory};

/// A collectible key. Lives either loose in the world or in the agent's inventory.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Key {
    pub position: Position,
    pub color: KeyColor,
}

/// A door gating one cell. Once opened it stays open.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Door {
    pub position: Position,
    pub color: KeyColor,
    pub is_open: bool,
}

/// Mutable key and door state of a world.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntityRegistry {
    loose_keys: Vec<Key>,
    doors: Vec<Door>,
}

impl EntityRegistry {
    /// Wraps explicit key and door lists, as produced by a parsed layout.
    pub fn new(loose_keys: Vec<Key>, doors: Vec<Door>) -> Self {
        EntityRegistry { loose_keys, doors }
    }

    /// The standard four-key, four-door layout for a `width` x `height` grid.
    ///
    /// Keys sit two cells in from each corner; doors sit on the arms of the
    /// cross walls, each matching the key found on the approaching side.
    pub fn standard(width: usize, height: usize) -> Self {
        let key_spots = [
            Position::new(2, 2),
            Position::new(width.saturating_sub(3), 2),
            Position::new(2, height.saturating_sub(3)),
            Position::new(width.saturating_sub(3), height.saturating_sub(3)),
        ];
        let door_spots = [
            Position::new(width / 2, 3),
            Position::new(3, height / 2),
            Position::new(width / 2, height.saturating_sub(4)),
            Position::new(width.saturating_sub(4), height / 2),
        ];

        let loose_keys = key_spots
            .into_iter()
            .zip(KeyColor::ALL)
            .map(|(position, color)| Key { position, color })
            .collect();
        let doors = door_spots
            .into_iter()
            .zip(KeyColor::ALL)
            .map(|(position, color)| Door {
                position,
                color,
                is_open: false,
            })
            .collect();

        EntityRegistry { loose_keys, doors }
    }

    /// Keys still lying in the world.
    pub fn loose_keys(&self) -> &[Key] {
        &self.loose_keys
    }

    pub fn doors(&self) -> &[Door] {
        &self.doors
    }

    /// The first loose key on `position`, if any.
    pub fn key_at(&self, position: Position) -> Option<&Key> {
        self.loose_keys.iter().find(|k| k.position == position)
    }

    /// The first door on `position`, open or closed.
    pub fn door_at(&self, position: Position) -> Option<&Door> {
        self.doors.iter().find(|d| d.position == position)
    }

    /// Removes the first loose key lying on `position` and hands it over.
    pub fn pickup_key_at(&mut self, position: Position) -> Option<Key> {
        let index = self.loose_keys.iter().position(|k| k.position == position)?;
        Some(self.loose_keys.remove(index))
    }

    /// Opens the closed door on `position` if `held` carries its color.
    ///
    /// Returns the door's color when it was opened by this call.
    pub fn try_open_door_at(&mut self, position: Position, held: &Inventory) -> Option<KeyColor> {
        let door = self
            .doors
            .iter_mut()
            .find(|d| d.position == position && !d.is_open)?;
        if !held.holds(door.color) {
            return None;
        }
        door.is_open = true;
        Some(door.color)
    }
}

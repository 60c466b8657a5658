use serde::{Deserialize, Serialize};

use crate::{
    KeyColor, Position,
    entities::{Door, EntityRegistry, Key},
    map::{Grid, GridMap},
};

/// Errors produced while parsing a text layout.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LayoutError {
    #[error("Layout string is empty")]
    Empty,
    #[error("Inconsistent width at row {row}: expected {expected}, found {found}")]
    InconsistentWidth {
        row: usize,
        expected: usize,
        found: usize,
    },
    #[error("Unknown layout code '{code}' at {position}")]
    UnknownToken { code: String, position: Position },
    #[error("Multiple start positions ('ST') found, second at {0}")]
    MultipleStarts(Position),
    #[error("No start position ('ST') found in layout")]
    MissingStart,
    #[error("A {color} key appears twice, second at {position}")]
    DuplicateKey { color: KeyColor, position: Position },
    #[error("A {color} door appears twice, second at {position}")]
    DuplicateDoor { color: KeyColor, position: Position },
}

/// Static walls plus the keys and doors placed on them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct World {
    pub map: GridMap,
    pub entities: EntityRegistry,
}

impl World {
    /// The standard cross-walled layout with four keys and four doors.
    pub fn standard(width: usize, height: usize) -> Self {
        World {
            map: GridMap::standard(width, height),
            entities: EntityRegistry::standard(width, height),
        }
    }

    pub fn width(&self) -> usize {
        self.map.width()
    }

    pub fn height(&self) -> usize {
        self.map.height()
    }

    /// Parses a whitespace-separated token grid into a world and a start cell.
    ///
    /// | Token | Cell |
    /// |---|---|
    /// | `ST` | start (floor) |
    /// | `BL` | floor |
    /// | `WL`, `WA` | wall |
    /// | `KR` `KB` `KG` `KY` | floor with a loose key |
    /// | `DR` `DB` `DG` `DY` | closed door set in a wall |
    pub fn from_layout(layout: &str) -> Result<(World, Position), LayoutError> {
        let rows: Vec<Vec<&str>> = layout
            .trim()
            .lines()
            .map(|line| line.split_whitespace().collect())
            .collect();
        if rows.is_empty() {
            return Err(LayoutError::Empty);
        }

        // Trimming guarantees the first row holds at least one token.
        let width = rows[0].len();
        for (row, tokens) in rows.iter().enumerate() {
            if tokens.len() != width {
                return Err(LayoutError::InconsistentWidth {
                    row,
                    expected: width,
                    found: tokens.len(),
                });
            }
        }

        let height = rows.len();
        let mut walls: Grid<bool> = Grid::new(width, height);
        let mut keys: Vec<Key> = Vec::new();
        let mut doors: Vec<Door> = Vec::new();
        let mut start: Option<Position> = None;

        for (y, tokens) in rows.iter().enumerate() {
            for (x, token) in tokens.iter().enumerate() {
                let position = Position { x, y };
                match *token {
                    "ST" => {
                        if start.is_some() {
                            return Err(LayoutError::MultipleStarts(position));
                        }
                        start = Some(position);
                    }
                    "BL" => {}
                    "WL" | "WA" => walls[position] = true,
                    code => match parse_entity(code) {
                        Some((EntityCode::Key, color)) => {
                            if keys.iter().any(|k| k.color == color) {
                                return Err(LayoutError::DuplicateKey { color, position });
                            }
                            keys.push(Key { position, color });
                        }
                        Some((EntityCode::Door, color)) => {
                            if doors.iter().any(|d| d.color == color) {
                                return Err(LayoutError::DuplicateDoor { color, position });
                            }
                            walls[position] = true;
                            doors.push(Door {
                                position,
                                color,
                                is_open: false,
                            });
                        }
                        None => {
                            return Err(LayoutError::UnknownToken {
                                code: code.to_string(),
                                position,
                            });
                        }
                    },
                }
            }
        }

        let start = start.ok_or(LayoutError::MissingStart)?;
        let world = World {
            map: GridMap::from_walls(walls),
            entities: EntityRegistry::new(keys, doors),
        };
        Ok((world, start))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum EntityCode {
    Key,
    Door,
}

fn parse_entity(code: &str) -> Option<(EntityCode, KeyColor)> {
    let mut chars = code.chars();
    let kind = match chars.next()? {
        'K' => EntityCode::Key,
        'D' => EntityCode::Door,
        _ => return None,
    };
    let color = match chars.next()? {
        'R' => KeyColor::Red,
        'B' => KeyColor::Blue,
        'G' => KeyColor::Green,
        'Y' => KeyColor::Yellow,
        _ => return None,
    };
    chars.next().is_none().then_some((kind, color))
}

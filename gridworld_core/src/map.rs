use std::ops::{Index, IndexMut};

use serde::{Deserialize, Serialize};

use crate::Position;

/// Errors raised when writing outside a grid.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum GridError {
    #[error("Position {position} is out of bounds for grid size ({width}, {height})")]
    OutOfBounds {
        position: Position,
        width: usize,
        height: usize,
    },
}

/// A dense 2D grid stored row-major.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Grid<T> {
    width: usize,
    height: usize,
    cells: Vec<T>,
}

impl<T> Grid<T> {
    /// Creates a grid filled with `T::default()`.
    pub fn new(width: usize, height: usize) -> Self
    where
        T: Default + Clone,
    {
        Grid {
            width,
            height,
            cells: vec![T::default(); width * height],
        }
    }

    /// Creates a grid whose cells are produced by `f(position)`, row by row.
    pub fn from_fn<F>(width: usize, height: usize, mut f: F) -> Self
    where
        F: FnMut(Position) -> T,
    {
        let mut cells = Vec::with_capacity(width * height);
        for y in 0..height {
            for x in 0..width {
                cells.push(f(Position { x, y }));
            }
        }
        Grid {
            width,
            height,
            cells,
        }
    }

    /// Returns the width of the grid.
    #[inline]
    pub fn width(&self) -> usize {
        self.width
    }

    /// Returns the height of the grid.
    #[inline]
    pub fn height(&self) -> usize {
        self.height
    }

    /// Checks if `position` lies within the grid boundaries.
    #[inline]
    pub fn contains(&self, position: Position) -> bool {
        position.x < self.width && position.y < self.height
    }

    #[inline]
    fn index_of(&self, position: Position) -> Option<usize> {
        self.contains(position)
            .then(|| position.y * self.width + position.x)
    }

    /// Gets an immutable reference to the cell at `position`.
    ///
    /// Returns `None` if the position is out of bounds.
    pub fn get(&self, position: Position) -> Option<&T> {
        self.index_of(position).map(|idx| &self.cells[idx])
    }

    /// Gets a mutable reference to the cell at `position`.
    ///
    /// Returns `None` if the position is out of bounds.
    pub fn get_mut(&mut self, position: Position) -> Option<&mut T> {
        self.index_of(position).map(move |idx| &mut self.cells[idx])
    }

    /// Sets the value of the cell at `position`.
    ///
    /// Returns `Ok(())` on success, or `Err(GridError::OutOfBounds)` if the
    /// position is outside the grid.
    pub fn set(&mut self, position: Position, value: T) -> Result<(), GridError> {
        let idx = self.index_of(position).ok_or(GridError::OutOfBounds {
            position,
            width: self.width,
            height: self.height,
        })?;
        self.cells[idx] = value;
        Ok(())
    }

    /// Yields every position in row-major order.
    pub fn positions(&self) -> impl Iterator<Item = Position> {
        let width = self.width;
        (0..self.cells.len()).map(move |idx| Position {
            x: idx % width,
            y: idx / width,
        })
    }

    /// Yields `(position, &cell)` pairs in row-major order.
    pub fn enumerate(&self) -> impl Iterator<Item = (Position, &T)> {
        let width = self.width;
        self.cells.iter().enumerate().map(move |(idx, cell)| {
            (
                Position {
                    x: idx % width,
                    y: idx / width,
                },
                cell,
            )
        })
    }

    /// Returns an iterator over the cells of the grid in row-major order.
    pub fn iter(&self) -> impl Iterator<Item = &T> {
        self.cells.iter()
    }
}

/// # Panics
///
/// Indexing panics if the position is out of bounds. Use [`Grid::get`] when
/// the position may fall outside the grid.
impl<T> Index<Position> for Grid<T> {
    type Output = T;

    #[inline]
    fn index(&self, position: Position) -> &Self::Output {
        match self.index_of(position) {
            Some(idx) => &self.cells[idx],
            None => panic!(
                "Grid index {} out of bounds for grid size ({}, {})",
                position, self.width, self.height
            ),
        }
    }
}

impl<T> IndexMut<Position> for Grid<T> {
    #[inline]
    fn index_mut(&mut self, position: Position) -> &mut Self::Output {
        let (width, height) = (self.width, self.height);
        match self.index_of(position) {
            Some(idx) => &mut self.cells[idx],
            None => panic!(
                "Grid index {} out of bounds for grid size ({}, {})",
                position, width, height
            ),
        }
    }
}

/// Interior cross walls are only laid when both sides reach this size.
pub const CROSS_WALL_MIN_SIZE: usize = 12;

/// The static wall layout of the world.
///
/// Never mutated after construction. Doors are tracked separately by the
/// [`EntityRegistry`](crate::EntityRegistry); their cells may or may not be
/// walls here.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GridMap {
    walls: Grid<bool>,
}

impl GridMap {
    /// Builds the standard layout: a full border, plus one wall row at
    /// `height / 2` and one wall column at `width / 2` when both dimensions
    /// are at least [`CROSS_WALL_MIN_SIZE`].
    pub fn standard(width: usize, height: usize) -> Self {
        let cross = width >= CROSS_WALL_MIN_SIZE && height >= CROSS_WALL_MIN_SIZE;
        let (mid_x, mid_y) = (width / 2, height / 2);
        let walls = Grid::from_fn(width, height, |p| {
            let border = p.x == 0 || p.y == 0 || p.x + 1 == width || p.y + 1 == height;
            border || (cross && (p.x == mid_x || p.y == mid_y))
        });
        GridMap { walls }
    }

    /// Wraps an explicit wall mask.
    pub fn from_walls(walls: Grid<bool>) -> Self {
        GridMap { walls }
    }

    #[inline]
    pub fn width(&self) -> usize {
        self.walls.width()
    }

    #[inline]
    pub fn height(&self) -> usize {
        self.walls.height()
    }

    /// Checks if `position` lies inside the map.
    #[inline]
    pub fn in_bounds(&self, position: Position) -> bool {
        self.walls.contains(position)
    }

    /// Out-of-bounds positions count as walls.
    pub fn is_wall(&self, position: Position) -> bool {
        self.walls.get(position).copied().unwrap_or(true)
    }

    /// The raw wall mask, `true` where a wall stands.
    pub fn walls(&self) -> &Grid<bool> {
        &self.walls
    }
}

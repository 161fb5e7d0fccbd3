//! Tile grid
//!
//! The level is a square grid of tiles stored row-major. Concrete tiles never
//! change; rubble turns walkable when destroyed and may reveal a power-up.

use serde::{Deserialize, Serialize};

use super::entity::Direction;
use super::powerup::PowerUpKind;
use super::rect::Rect;
use crate::cell_origin;
use crate::consts::TILE_SIZE;
use crate::error::SimError;

/// Grid coordinate
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Cell {
    pub row: usize,
    pub col: usize,
}

impl Cell {
    pub const fn new(row: usize, col: usize) -> Self {
        Self { row, col }
    }

    /// Neighbouring cell in `dir`, or None past the grid edge
    pub fn step(self, dir: Direction, size: usize) -> Option<Cell> {
        let (row, col) = match dir {
            Direction::Up => (self.row.checked_sub(1)?, self.col),
            Direction::Down => (self.row + 1, self.col),
            Direction::Left => (self.row, self.col.checked_sub(1)?),
            Direction::Right => (self.row, self.col + 1),
        };
        (row < size && col < size).then_some(Cell::new(row, col))
    }
}

/// Tile types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum TileType {
    #[default]
    Walkable,
    Rubble,
    Concrete,
    DoorClosed,
    DoorOpened,
}

impl TileType {
    /// Tiles that stop entity movement
    pub fn is_blocking(self) -> bool {
        matches!(self, TileType::Rubble | TileType::Concrete | TileType::DoorClosed)
    }
}

/// One grid cell
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tile {
    pub cell: Cell,
    pub kind: TileType,
    /// Hidden while the tile is rubble, collectible once it is walkable
    pub power_up: Option<PowerUpKind>,
}

impl Tile {
    pub fn new(cell: Cell, kind: TileType, power_up: Option<PowerUpKind>) -> Self {
        Self { cell, kind, power_up }
    }

    pub fn rect(&self) -> Rect {
        Rect::from_origin(cell_origin(self.cell), TILE_SIZE)
    }

    /// A revealed power-up that can be picked up
    pub fn collectible(&self) -> Option<PowerUpKind> {
        match self.kind {
            TileType::Walkable => self.power_up,
            _ => None,
        }
    }

    pub fn is_door(&self) -> bool {
        matches!(self.kind, TileType::DoorClosed | TileType::DoorOpened)
    }

    /// Destroy rubble, returning true if the tile changed
    pub fn destroy(&mut self) -> bool {
        if self.kind == TileType::Rubble {
            self.kind = TileType::Walkable;
            true
        } else {
            false
        }
    }
}

/// Square tile grid (row-major)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Grid {
    size: usize,
    tiles: Vec<Tile>,
}

impl Grid {
    pub fn new(size: usize, tiles: Vec<Tile>) -> Self {
        Self { size, tiles }
    }

    /// Grid where every tile has the same type
    pub fn filled(size: usize, kind: TileType) -> Self {
        let tiles = (0..size)
            .flat_map(|row| (0..size).map(move |col| Tile::new(Cell::new(row, col), kind, None)))
            .collect();
        Self { size, tiles }
    }

    /// Tiles per side
    pub fn size(&self) -> usize {
        self.size
    }

    pub fn tiles(&self) -> &[Tile] {
        &self.tiles
    }

    fn index(&self, cell: Cell) -> Option<usize> {
        (cell.row < self.size && cell.col < self.size).then_some(cell.row * self.size + cell.col)
    }

    pub fn get(&self, cell: Cell) -> Option<&Tile> {
        self.index(cell).and_then(|i| self.tiles.get(i))
    }

    pub fn get_mut(&mut self, cell: Cell) -> Option<&mut Tile> {
        let i = self.index(cell)?;
        self.tiles.get_mut(i)
    }

    pub fn kind_at(&self, cell: Cell) -> Option<TileType> {
        self.get(cell).map(|t| t.kind)
    }

    /// Rectangles of every tile that blocks movement
    pub fn blocking_rects(&self) -> Vec<Rect> {
        self.tiles
            .iter()
            .filter(|t| t.kind.is_blocking())
            .map(Tile::rect)
            .collect()
    }

    /// Walkable tiles carrying a revealed power-up
    pub fn power_up_tiles(&self) -> Vec<Tile> {
        self.tiles
            .iter()
            .filter(|t| t.collectible().is_some())
            .cloned()
            .collect()
    }

    pub fn door(&self) -> Option<&Tile> {
        self.tiles.iter().find(|t| t.is_door())
    }

    /// Open the door; returns false if there is no closed door
    pub fn open_door(&mut self) -> bool {
        match self.tiles.iter_mut().find(|t| t.kind == TileType::DoorClosed) {
            Some(door) => {
                door.kind = TileType::DoorOpened;
                true
            }
            None => false,
        }
    }

    /// Take the power-up off a tile
    pub fn take_power_up(&mut self, cell: Cell) -> Option<PowerUpKind> {
        let tile = self.get_mut(cell)?;
        let kind = tile.collectible()?;
        tile.power_up = None;
        Some(kind)
    }

    pub fn count(&self, kind: TileType) -> usize {
        self.tiles.iter().filter(|t| t.kind == kind).count()
    }

    /// Check the tile count matches the grid size
    pub fn validate(&self) -> Result<(), SimError> {
        let expected = self.size * self.size;
        if self.tiles.len() != expected {
            return Err(SimError::CorruptGrid {
                expected,
                found: self.tiles.len(),
            });
        }
        Ok(())
    }
}

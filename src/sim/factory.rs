//! Level layout generation
//!
//! Concrete on the border and on every (even, even) cell, random rubble
//! elsewhere (never on the hero's entry cells), power-ups hidden under some
//! rubble, one closed door on a free tile and the key under one rubble tile.
//! All randomness comes from the RNG passed in.

use rand::Rng;
use rand::seq::IteratorRandom;

use super::powerup::PowerUpKind;
use super::state::unit_interval;
use super::tile::{Cell, Grid, Tile, TileType};
use crate::is_entry_point;

#[derive(Debug, Clone, Copy)]
pub struct TileFactory {
    size: usize,
    rubble_density: f64,
    power_up_density: f64,
}

impl TileFactory {
    pub fn new(size: usize, rubble_density: f64, power_up_density: f64) -> Self {
        Self {
            size,
            rubble_density: unit_interval(rubble_density),
            power_up_density: unit_interval(power_up_density),
        }
    }

    /// Build a complete level: tiles, door and key
    pub fn generate<R: Rng + ?Sized>(&self, rng: &mut R) -> Grid {
        let tiles = (0..self.size)
            .flat_map(|row| (0..self.size).map(move |col| (row, col)))
            .map(|(row, col)| self.create_for_coordinates(row, col, rng))
            .collect();
        let mut grid = Grid::new(self.size, tiles);
        Self::set_door(&mut grid, rng);
        Self::set_key(&mut grid, rng);
        log::info!(
            "Level {}x{}: {} rubble, {} power-ups hidden",
            self.size,
            self.size,
            grid.count(TileType::Rubble),
            grid.tiles().iter().filter(|t| t.power_up.is_some()).count()
        );
        grid
    }

    /// Create the tile for one grid coordinate
    pub fn create_for_coordinates<R: Rng + ?Sized>(&self, row: usize, col: usize, rng: &mut R) -> Tile {
        let kind = self.type_for_coordinates(row, col, rng);
        let power_up = self.power_up_for(kind, rng);
        Tile::new(Cell::new(row, col), kind, power_up)
    }

    fn type_for_coordinates<R: Rng + ?Sized>(&self, row: usize, col: usize, rng: &mut R) -> TileType {
        if self.is_concrete(row, col) {
            TileType::Concrete
        } else if !is_entry_point(row, col) && rng.random_bool(self.rubble_density) {
            TileType::Rubble
        } else {
            TileType::Walkable
        }
    }

    pub fn is_concrete(&self, row: usize, col: usize) -> bool {
        let last = self.size.saturating_sub(1);
        row == 0 || col == 0 || row == last || col == last
            || (row % 2 == 0 && col % 2 == 0)
    }

    fn power_up_for<R: Rng + ?Sized>(&self, kind: TileType, rng: &mut R) -> Option<PowerUpKind> {
        if kind != TileType::Rubble || !rng.random_bool(self.power_up_density) {
            return None;
        }
        let hidden = PowerUpKind::HIDDEN;
        Some(hidden[rng.random_range(0..hidden.len())])
    }

    /// Turn one free walkable tile into the closed door. Falls back to a
    /// rubble tile when the layout has no free tile.
    pub fn set_door<R: Rng + ?Sized>(grid: &mut Grid, rng: &mut R) {
        let pick = |grid: &Grid, kind: TileType, rng: &mut R| {
            grid.tiles()
                .iter()
                .filter(|t| t.kind == kind && t.power_up.is_none())
                .filter(|t| !is_entry_point(t.cell.row, t.cell.col))
                .map(|t| t.cell)
                .choose(rng)
        };
        let cell = pick(grid, TileType::Walkable, rng).or_else(|| pick(grid, TileType::Rubble, rng));
        if let Some(tile) = cell.and_then(|c| grid.get_mut(c)) {
            tile.kind = TileType::DoorClosed;
        } else {
            log::warn!("No tile available for the door");
        }
    }

    /// Hide the key under one rubble tile (replacing any power-up there)
    pub fn set_key<R: Rng + ?Sized>(grid: &mut Grid, rng: &mut R) {
        let cell = grid
            .tiles()
            .iter()
            .filter(|t| t.kind == TileType::Rubble)
            .map(|t| t.cell)
            .choose(rng);
        if let Some(tile) = cell.and_then(|c| grid.get_mut(c)) {
            tile.power_up = Some(PowerUpKind::Key);
        }
    }
}

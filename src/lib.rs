//! Bomb Grid - a real-time tile-grid bomb game core
//!
//! Core modules:
//! - `sim`: Deterministic simulation (grid, collisions, bombs, entities)
//! - `game_loop`: Two-activity scheduler (model ticks and view ticks)
//! - `game`: Session facade publishing snapshots to readers
//! - `settings`: Data-driven configuration

pub mod error;
pub mod game;
pub mod game_loop;
pub mod settings;
pub mod sim;

pub use error::{ConfigError, LoopError, PlantError, SimError, TickError};
pub use game::{Command, Game};
pub use game_loop::{GameLoop, LoopState, PausePolicy, Ticker};
pub use settings::GameConfig;

use glam::IVec2;

use sim::Cell;

/// Game configuration constants
pub mod consts {
    /// Side of one grid tile in pixels
    pub const TILE_SIZE: i32 = 32;
    /// Side of an entity hitbox (smaller than a tile so corridors can be walked)
    pub const HITBOX_SIZE: i32 = 24;

    /// Pixels moved per model tick
    pub const HERO_SPEED: i32 = 4;
    pub const ENEMY_SPEED: i32 = 2;

    /// Level defaults (tiles per side, must be odd)
    pub const DEFAULT_LEVEL_SIZE: usize = 15;
    pub const MIN_LEVEL_SIZE: usize = 5;

    /// Chance for a free tile to become rubble
    pub const RUBBLE_DENSITY: f64 = 0.5;
    /// Chance for a rubble tile to hide a power-up
    pub const POWER_UP_DENSITY: f64 = 0.25;

    /// Bomb fuse and flame lifetime
    pub const BOMB_FUSE_MS: u64 = 3000;
    pub const FLAME_MS: u64 = 500;

    /// Detonator starts with one bomb of range one
    pub const INITIAL_BOMB_CAPACITY: u32 = 1;
    pub const INITIAL_BOMB_RANGE: u32 = 1;

    pub const HERO_LIVES: u32 = 3;
    pub const ENEMY_LIVES: u32 = 1;
    pub const ENEMY_SCORE: u64 = 100;
    pub const DEFAULT_ENEMY_COUNT: usize = 4;

    /// Invulnerability window after the hero takes damage
    pub const HURT_COOLDOWN_MS: u64 = 1500;

    /// Default model and view rates (ticks per second)
    pub const DEFAULT_FPS: u32 = 60;
    /// The simulation clock counts whole milliseconds, so every model tick
    /// must advance it by at least one
    pub const MAX_MODEL_FPS: u32 = 1000;
}

use consts::*;

/// Pixel coordinate of a grid row or column
#[inline]
pub fn grid_to_pixel(index: usize) -> i32 {
    index as i32 * TILE_SIZE
}

/// Top-left pixel of a cell
#[inline]
pub fn cell_origin(cell: Cell) -> IVec2 {
    IVec2::new(grid_to_pixel(cell.col), grid_to_pixel(cell.row))
}

/// Cell containing a pixel point (negative coordinates clamp to zero)
#[inline]
pub fn pixel_to_cell(point: IVec2) -> Cell {
    Cell::new(
        point.y.max(0).div_euclid(TILE_SIZE) as usize,
        point.x.max(0).div_euclid(TILE_SIZE) as usize,
    )
}

/// Hitbox origin that centers a hitbox inside a cell
#[inline]
pub fn centered_in_cell(cell: Cell) -> IVec2 {
    cell_origin(cell) + IVec2::splat((TILE_SIZE - HITBOX_SIZE) / 2)
}

/// Cells around the hero spawn that must stay free of rubble
#[inline]
pub fn is_entry_point(row: usize, col: usize) -> bool {
    matches!((row, col), (1, 1) | (1, 2) | (2, 1))
}

/// Hero spawn cell
pub const HERO_SPAWN: Cell = Cell { row: 1, col: 1 };

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_grid_pixel_round_trip_on_cell_corner() {
        let cell = Cell::new(3, 7);
        let origin = cell_origin(cell);
        assert_eq!(origin, IVec2::new(7 * TILE_SIZE, 3 * TILE_SIZE));
        assert_eq!(pixel_to_cell(origin), cell);
        assert_eq!(pixel_to_cell(origin + IVec2::splat(TILE_SIZE - 1)), cell);
    }

    #[test]
    fn test_negative_pixels_clamp() {
        assert_eq!(pixel_to_cell(IVec2::new(-5, -40)), Cell::new(0, 0));
    }

    #[test]
    fn test_entry_points() {
        assert!(is_entry_point(1, 1));
        assert!(is_entry_point(1, 2));
        assert!(is_entry_point(2, 1));
        assert!(!is_entry_point(2, 2));
        assert!(!is_entry_point(3, 1));
    }

    #[test]
    fn test_centered_hitbox_stays_in_cell() {
        let cell = Cell::new(1, 1);
        let pos = centered_in_cell(cell);
        assert_eq!(pixel_to_cell(pos), cell);
        assert_eq!(pixel_to_cell(pos + IVec2::splat(HITBOX_SIZE - 1)), cell);
    }
}

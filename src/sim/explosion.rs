//! Explosion propagation
//!
//! A detonating bomb burns its own cell, then spreads independently in the
//! four cardinal directions one tile per step:
//! - concrete stops the arm before the tile
//! - rubble is burnt (destroyed) and stops the arm
//! - anything else burns and the arm continues until `range` tiles
//!
//! Planning is read-only; `apply` performs the rubble destruction.

use serde::{Deserialize, Serialize};

use super::entity::Direction;
use super::rect::Rect;
use super::tile::{Cell, Grid, TileType};
use crate::cell_origin;
use crate::consts::TILE_SIZE;

/// One burning tile
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Flame {
    pub cell: Cell,
    /// Propagation step (0 = bomb cell)
    pub step: u32,
    /// Arm this flame belongs to (None for the center)
    pub direction: Option<Direction>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Explosion {
    pub origin: Cell,
    pub range: u32,
    /// Ordered by propagation step
    pub flames: Vec<Flame>,
    /// Rubble tiles this explosion destroys
    pub destroyed: Vec<Cell>,
    pub started_at_ms: u64,
}

impl Explosion {
    /// Compute the affected tiles without touching the grid
    pub fn plan(grid: &Grid, origin: Cell, range: u32, now_ms: u64) -> Self {
        let mut flames = vec![Flame {
            cell: origin,
            step: 0,
            direction: None,
        }];
        let mut destroyed = Vec::new();

        // Per-arm cursor; None once the arm has stopped
        let mut arms: [Option<Cell>; 4] = [Some(origin); 4];

        for step in 1..=range {
            for (dir, cursor) in Direction::ALL.into_iter().zip(arms.iter_mut()) {
                let Some(from) = *cursor else { continue };
                let next = from.step(dir, grid.size());
                *cursor = None;
                let Some(cell) = next else { continue };
                match grid.kind_at(cell) {
                    None | Some(TileType::Concrete) => {}
                    Some(TileType::Rubble) => {
                        flames.push(Flame {
                            cell,
                            step,
                            direction: Some(dir),
                        });
                        destroyed.push(cell);
                    }
                    Some(_) => {
                        flames.push(Flame {
                            cell,
                            step,
                            direction: Some(dir),
                        });
                        *cursor = Some(cell);
                    }
                }
            }
        }

        Self {
            origin,
            range,
            flames,
            destroyed,
            started_at_ms: now_ms,
        }
    }

    /// Destroy the rubble reached by this explosion, revealing hidden power-ups
    pub fn apply(&self, grid: &mut Grid) {
        for &cell in &self.destroyed {
            if let Some(tile) = grid.get_mut(cell) {
                tile.destroy();
            }
        }
    }

    pub fn contains(&self, cell: Cell) -> bool {
        self.flames.iter().any(|f| f.cell == cell)
    }

    /// Pixel rectangles of the burning tiles
    pub fn rects(&self) -> impl Iterator<Item = Rect> + '_ {
        self.flames
            .iter()
            .map(|f| Rect::from_origin(cell_origin(f.cell), TILE_SIZE))
    }

    pub fn hits(&self, rect: &Rect) -> bool {
        self.rects().any(|r| r.intersects(rect))
    }

    /// Number of tiles reached along one arm
    pub fn reach(&self, dir: Direction) -> usize {
        self.flames.iter().filter(|f| f.direction == Some(dir)).count()
    }

    pub fn is_expired(&self, now_ms: u64, flame_ms: u64) -> bool {
        now_ms.saturating_sub(self.started_at_ms) >= flame_ms
    }
}

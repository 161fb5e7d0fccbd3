//! Bomb inventory for the hero
//!
//! The detonator owns the planted (unexploded) bombs. Capacity and range only
//! ever grow; bombs leave the detonator when their fuse expires.

use glam::IVec2;
use serde::{Deserialize, Serialize};

use super::rect::Rect;
use super::tile::Cell;
use crate::consts::*;
use crate::error::PlantError;
use crate::{cell_origin, pixel_to_cell};

/// A planted bomb
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Bomb {
    pub id: u32,
    pub cell: Cell,
    pub planted_at_ms: u64,
    pub fuse_ms: u64,
    pub range: u32,
}

impl Bomb {
    pub fn rect(&self) -> Rect {
        Rect::from_origin(cell_origin(self.cell), TILE_SIZE)
    }

    pub fn is_expired(&self, now_ms: u64) -> bool {
        now_ms.saturating_sub(self.planted_at_ms) >= self.fuse_ms
    }

    pub fn remaining_ms(&self, now_ms: u64) -> u64 {
        self.fuse_ms.saturating_sub(now_ms.saturating_sub(self.planted_at_ms))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Detonator {
    planted: Vec<Bomb>,
    capacity: u32,
    range: u32,
    fuse_ms: u64,
    next_id: u32,
}

impl Detonator {
    pub fn new(fuse_ms: u64) -> Self {
        Self {
            planted: Vec::new(),
            capacity: INITIAL_BOMB_CAPACITY,
            range: INITIAL_BOMB_RANGE,
            fuse_ms,
            next_id: 1,
        }
    }

    pub fn planted(&self) -> &[Bomb] {
        &self.planted
    }

    pub fn capacity(&self) -> u32 {
        self.capacity
    }

    pub fn range(&self) -> u32 {
        self.range
    }

    pub fn fuse_ms(&self) -> u64 {
        self.fuse_ms
    }

    pub fn has_bomb(&self) -> bool {
        (self.planted.len() as u32) < self.capacity
    }

    pub fn increase_capacity(&mut self) {
        self.capacity = self.capacity.saturating_add(1);
    }

    pub fn increase_range(&mut self) {
        self.range = self.range.saturating_add(1);
    }

    /// Check whether a bomb may go on `cell`
    pub fn can_plant(&self, cell: Cell) -> Result<(), PlantError> {
        if self.planted.iter().any(|b| b.cell == cell) {
            return Err(PlantError::CellOccupied);
        }
        if !self.has_bomb() {
            return Err(PlantError::CapacityReached);
        }
        Ok(())
    }

    /// Plant a bomb on the cell containing `position`
    pub fn plant_at(&mut self, position: IVec2, now_ms: u64) -> Result<&Bomb, PlantError> {
        let cell = pixel_to_cell(position);
        self.can_plant(cell)?;
        let id = self.next_id;
        self.next_id += 1;
        self.planted.push(Bomb {
            id,
            cell,
            planted_at_ms: now_ms,
            fuse_ms: self.fuse_ms,
            range: self.range,
        });
        log::debug!("Bomb {} planted at {:?}", id, cell);
        Ok(&self.planted[self.planted.len() - 1])
    }

    /// Remove and return every bomb whose fuse has burnt out, oldest first
    pub fn take_expired(&mut self, now_ms: u64) -> Vec<Bomb> {
        let (expired, live): (Vec<Bomb>, Vec<Bomb>) =
            self.planted.drain(..).partition(|b| b.is_expired(now_ms));
        self.planted = live;
        expired
    }

    /// Remove the bomb on `cell` (chain detonation)
    pub fn take_at(&mut self, cell: Cell) -> Option<Bomb> {
        let index = self.planted.iter().position(|b| b.cell == cell)?;
        Some(self.planted.remove(index))
    }
}

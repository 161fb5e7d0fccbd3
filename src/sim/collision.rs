//! Collision detection for grid movement
//!
//! An entity proposes a one-step move; the tentative hitbox is tested against
//! blocking tiles, bombs and power-up tiles. Each predicate answers "clear to
//! proceed". Only when all hold is the move committed.

use super::entity::{Direction, Entity};
use super::rect::Rect;
use super::tile::{Cell, Tile};

/// Tentative-move tester bound to one entity's hitbox
#[derive(Debug, Clone, Copy)]
pub struct Collision {
    current: Rect,
    tentative: Rect,
}

impl Collision {
    pub fn new(entity: &Entity) -> Self {
        Self {
            current: entity.rect,
            tentative: entity.rect,
        }
    }

    /// Hitbox translated `speed` pixels in `dir` (not committed)
    pub fn update_entity_rect(&mut self, dir: Direction, speed: i32) {
        self.tentative = self.current.translated(dir.delta() * speed);
    }

    pub fn tentative(&self) -> Rect {
        self.tentative
    }

    /// True iff no wall or rubble overlaps the tentative hitbox
    pub fn block_collision(&self, blocks: &[Rect]) -> bool {
        !blocks.iter().any(|b| b.intersects(&self.tentative))
    }

    /// True iff no bomb overlaps the tentative hitbox.
    /// Bombs already under the current hitbox are ignored so an entity can
    /// walk off a bomb it is standing on.
    pub fn bomb_collision(&self, bombs: &[Rect]) -> bool {
        !bombs
            .iter()
            .filter(|b| !b.intersects(&self.current))
            .any(|b| b.intersects(&self.tentative))
    }

    /// True iff no power-up tile overlaps the tentative hitbox
    pub fn power_up_collision(&self, tiles: &[Tile]) -> bool {
        !tiles.iter().any(|t| t.rect().intersects(&self.tentative))
    }

    /// Power-up cells the tentative hitbox touches
    pub fn touched_power_ups<'a>(&'a self, tiles: &'a [Tile]) -> impl Iterator<Item = Cell> + 'a {
        tiles
            .iter()
            .filter(|t| t.rect().intersects(&self.tentative))
            .map(|t| t.cell)
    }

    /// True iff the committed hitbox overlaps the open door (never blocks)
    pub fn open_door_collision(&self, door: &Rect) -> bool {
        self.current.intersects(door)
    }
}

/// Everything a move is tested against
#[derive(Debug, Clone, Copy)]
pub struct Obstacles<'a> {
    pub blocks: &'a [Rect],
    pub bombs: &'a [Rect],
    /// None for entities that walk over power-ups
    pub power_ups: Option<&'a [Tile]>,
}

/// Outcome of a move attempt
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct MoveResult {
    pub moved: bool,
    /// Power-up cells touched by the refused step
    pub touched_power_ups: Vec<Cell>,
}

/// Attempt a one-step move. On success the hitbox is committed and the
/// moving flag set; otherwise the position is unchanged and the flag cleared.
/// Confusion is applied before the test.
pub fn try_move(entity: &mut Entity, requested: Direction, obstacles: &Obstacles) -> MoveResult {
    if entity.is_dead() {
        entity.moving = false;
        return MoveResult::default();
    }

    let dir = entity.correct_direction(requested);
    entity.direction = dir;

    let mut collision = Collision::new(entity);
    collision.update_entity_rect(dir, entity.speed);

    let mut touched_power_ups = Vec::new();
    let power_ups_clear = match obstacles.power_ups {
        Some(tiles) => {
            touched_power_ups.extend(collision.touched_power_ups(tiles));
            touched_power_ups.is_empty()
        }
        None => true,
    };

    let moved = collision.block_collision(obstacles.blocks)
        && collision.bomb_collision(obstacles.bombs)
        && power_ups_clear;

    if moved {
        entity.rect = collision.tentative();
    }
    entity.moving = moved;

    MoveResult {
        moved,
        touched_power_ups,
    }
}

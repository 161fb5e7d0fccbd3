//! Hero and enemy state
//!
//! Both share one `Entity` type (movement, life, attack, score). Hero-only
//! capabilities live in an optional attached `HeroParts`.

use glam::IVec2;
use serde::{Deserialize, Serialize};

use super::detonator::Detonator;
use super::rect::Rect;
use super::tile::Cell;
use crate::consts::*;
use crate::error::PlantError;
use crate::pixel_to_cell;

/// Movement direction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Direction {
    Up,
    Down,
    Left,
    Right,
}

impl Direction {
    pub const ALL: [Direction; 4] = [Direction::Up, Direction::Down, Direction::Left, Direction::Right];

    pub fn opposite(self) -> Direction {
        match self {
            Direction::Up => Direction::Down,
            Direction::Down => Direction::Up,
            Direction::Left => Direction::Right,
            Direction::Right => Direction::Left,
        }
    }

    /// Unit step in pixel space (y grows downward)
    pub fn delta(self) -> IVec2 {
        match self {
            Direction::Up => IVec2::new(0, -1),
            Direction::Down => IVec2::new(0, 1),
            Direction::Left => IVec2::new(-1, 0),
            Direction::Right => IVec2::new(1, 0),
        }
    }
}

/// Components only the hero carries
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HeroParts {
    pub detonator: Detonator,
    /// Inverts requested movement
    pub confused: bool,
    pub has_key: bool,
    /// Simulation time until which damage is ignored
    pub invulnerable_until_ms: u64,
}

impl HeroParts {
    pub fn new(fuse_ms: u64) -> Self {
        Self {
            detonator: Detonator::new(fuse_ms),
            confused: false,
            has_key: false,
            invulnerable_until_ms: 0,
        }
    }
}

/// A moving unit on the grid
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Entity {
    pub id: u32,
    /// Hitbox in pixels
    pub rect: Rect,
    pub direction: Direction,
    pub lives: u32,
    pub attack: u32,
    pub moving: bool,
    /// Hero: accumulated score. Enemy: score awarded on death.
    pub score: u64,
    /// Pixels per move step
    pub speed: i32,
    pub hero: Option<HeroParts>,
}

impl Entity {
    pub const HERO_ID: u32 = 0;

    pub fn hero(pos: IVec2, lives: u32) -> Self {
        Self {
            id: Self::HERO_ID,
            rect: Rect::from_origin(pos, HITBOX_SIZE),
            direction: Direction::Down,
            lives,
            attack: 1,
            moving: false,
            score: 0,
            speed: HERO_SPEED,
            hero: Some(HeroParts::new(BOMB_FUSE_MS)),
        }
    }

    pub fn enemy(id: u32, pos: IVec2, direction: Direction) -> Self {
        Self {
            id,
            rect: Rect::from_origin(pos, HITBOX_SIZE),
            direction,
            lives: ENEMY_LIVES,
            attack: 1,
            moving: false,
            score: ENEMY_SCORE,
            speed: ENEMY_SPEED,
            hero: None,
        }
    }

    /// Replace the fuse delay of a fresh hero's detonator
    pub fn with_fuse(mut self, fuse_ms: u64) -> Self {
        if let Some(hero) = self.hero.as_mut() {
            hero.detonator = Detonator::new(fuse_ms);
        }
        self
    }

    pub fn is_hero(&self) -> bool {
        self.hero.is_some()
    }

    #[inline]
    pub fn position(&self) -> IVec2 {
        self.rect.pos
    }

    /// Cell under the hitbox center
    pub fn cell(&self) -> Cell {
        pixel_to_cell(self.rect.center())
    }

    /// Add (or remove, when negative) lives; never drops below zero
    pub fn modify_life(&mut self, change: i32) {
        self.lives = self.lives.saturating_add_signed(change);
        if self.lives == 0 {
            self.moving = false;
        }
    }

    pub fn is_dead(&self) -> bool {
        self.lives == 0
    }

    pub fn increase_attack(&mut self, amount: u32) {
        self.attack = self.attack.saturating_add(amount);
    }

    pub fn add_score(&mut self, amount: u64) {
        self.score = self.score.saturating_add(amount);
    }

    pub fn set_confused(&mut self, confused: bool) {
        if let Some(hero) = self.hero.as_mut() {
            hero.confused = confused;
        }
    }

    pub fn is_confused(&self) -> bool {
        self.hero.as_ref().is_some_and(|h| h.confused)
    }

    pub fn has_key(&self) -> bool {
        self.hero.as_ref().is_some_and(|h| h.has_key)
    }

    /// Direction the entity actually moves when asked for `dir`
    pub fn correct_direction(&self, dir: Direction) -> Direction {
        if self.is_confused() { dir.opposite() } else { dir }
    }

    pub fn is_invulnerable(&self, now_ms: u64) -> bool {
        self.hero.as_ref().is_some_and(|h| now_ms < h.invulnerable_until_ms)
    }

    /// Apply one hit unless invulnerable; heroes then get a grace window.
    /// Returns true if lives were lost.
    pub fn take_hit(&mut self, damage: u32, now_ms: u64) -> bool {
        if self.is_dead() || self.is_invulnerable(now_ms) {
            return false;
        }
        self.lives = self.lives.saturating_sub(damage);
        if let Some(hero) = self.hero.as_mut() {
            hero.invulnerable_until_ms = now_ms + HURT_COOLDOWN_MS;
        }
        if self.lives == 0 {
            self.moving = false;
        }
        true
    }

    /// Plant a bomb on the cell under the hitbox center
    pub fn plant_bomb(&mut self, now_ms: u64) -> Result<Cell, PlantError> {
        if self.is_dead() {
            return Err(PlantError::Dead);
        }
        let center = self.rect.center();
        let hero = self.hero.as_mut().ok_or(PlantError::NoDetonator)?;
        hero.detonator.plant_at(center, now_ms).map(|bomb| bomb.cell)
    }

    /// Carry stats into a new level at `pos`
    pub fn next_level(&mut self, pos: IVec2) {
        self.rect = Rect::from_origin(pos, HITBOX_SIZE);
        self.direction = Direction::Down;
        self.moving = false;
        if let Some(hero) = self.hero.as_mut() {
            let fuse_ms = hero.detonator.fuse_ms();
            *hero = HeroParts::new(fuse_ms);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lives_never_negative() {
        let mut hero = Entity::hero(IVec2::ZERO, 2);
        hero.modify_life(-5);
        assert_eq!(hero.lives, 0);
        assert!(hero.is_dead());
    }

    #[test]
    fn test_confusion_inverts_direction() {
        let mut hero = Entity::hero(IVec2::ZERO, 3);
        assert_eq!(hero.correct_direction(Direction::Left), Direction::Left);
        hero.set_confused(true);
        for dir in Direction::ALL {
            assert_eq!(hero.correct_direction(dir), dir.opposite());
        }
    }

    #[test]
    fn test_enemy_ignores_hero_only_state() {
        let mut enemy = Entity::enemy(1, IVec2::ZERO, Direction::Up);
        enemy.set_confused(true);
        assert!(!enemy.is_confused());
        assert_eq!(enemy.correct_direction(Direction::Up), Direction::Up);
        assert_eq!(enemy.plant_bomb(0), Err(PlantError::NoDetonator));
    }

    #[test]
    fn test_hit_grants_grace_window() {
        let mut hero = Entity::hero(IVec2::ZERO, 3);
        assert!(hero.take_hit(1, 100));
        assert_eq!(hero.lives, 2);
        assert!(!hero.take_hit(1, 100 + HURT_COOLDOWN_MS - 1));
        assert!(hero.take_hit(1, 100 + HURT_COOLDOWN_MS));
        assert_eq!(hero.lives, 1);
    }

    #[test]
    fn test_dead_hero_cannot_plant() {
        let mut hero = Entity::hero(IVec2::new(36, 36), 1);
        hero.modify_life(-1);
        assert_eq!(hero.plant_bomb(0), Err(PlantError::Dead));
    }

    #[test]
    fn test_next_level_keeps_stats_resets_detonator() {
        let mut hero = Entity::hero(IVec2::new(36, 36), 3);
        hero.increase_attack(2);
        hero.add_score(500);
        hero.plant_bomb(0).unwrap();
        if let Some(parts) = hero.hero.as_mut() {
            parts.has_key = true;
        }

        hero.next_level(IVec2::new(36, 36));
        assert_eq!(hero.attack, 3);
        assert_eq!(hero.score, 500);
        assert_eq!(hero.lives, 3);
        assert!(!hero.has_key());
        assert!(hero.hero.as_ref().unwrap().detonator.planted().is_empty());
    }
}

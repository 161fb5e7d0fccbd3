//! Model tick
//!
//! Advances the simulation by one fixed step. Everything a tick does (moves,
//! pickups, fuses, explosions, damage, removals) is finished before it
//! returns, so a snapshot taken afterwards is self-consistent.

use std::collections::VecDeque;

use rand::Rng;

use super::collision::{Collision, Obstacles, try_move};
use super::entity::Direction;
use super::explosion::Explosion;
use super::powerup::PowerUpKind;
use super::state::{GameEvent, GamePhase, GameState};
use super::tile::TileType;
use crate::error::SimError;

/// Input commands for a single tick (deterministic)
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TickInput {
    /// Requested hero movement (held)
    pub direction: Option<Direction>,
    /// Plant a bomb under the hero (one-shot)
    pub plant_bomb: bool,
}

/// Advance the game state by one model tick (`1 / tick_hz` seconds)
pub fn tick(state: &mut GameState, input: &TickInput) -> Result<(), SimError> {
    state.events.clear();
    state.validate()?;

    // Don't tick once the level is decided
    if state.phase != GamePhase::Playing {
        return Ok(());
    }

    let now = state.advance_clock();

    if input.plant_bomb {
        match state.hero.plant_bomb(now) {
            Ok(cell) => state.events.push(GameEvent::BombPlanted { cell }),
            Err(err) => log::debug!("Cannot plant: {}", err),
        }
    }

    move_hero(state, input.direction);
    move_enemies(state);
    detonate_expired(state, now);
    resolve_contacts(state, now);

    let flame_ms = state.params.flame_ms;
    state.explosions.retain(|e| !e.is_expired(now, flame_ms));

    finish_tick(state);
    Ok(())
}

fn move_hero(state: &mut GameState, direction: Option<Direction>) {
    let Some(dir) = direction else {
        state.hero.moving = false;
        return;
    };

    let blocks = state.grid.blocking_rects();
    let bombs = state.bomb_rects();
    let power_ups = state.grid.power_up_tiles();
    let obstacles = Obstacles {
        blocks: &blocks,
        bombs: &bombs,
        power_ups: Some(&power_ups),
    };
    let result = try_move(&mut state.hero, dir, &obstacles);

    for cell in result.touched_power_ups {
        if let Some(kind) = state.grid.take_power_up(cell) {
            let applied = kind.apply(&mut state.hero, &mut state.rng);
            log::debug!("Power-up {:?} -> {:?}: {}", kind, applied, applied.message());
            state.events.push(GameEvent::PowerUpCollected { kind: applied });
            if applied == PowerUpKind::Hurt {
                state.events.push(GameEvent::HeroHurt {
                    lives: state.hero.lives,
                });
            }
        }
    }

    if state.hero.has_key() && state.grid.open_door() {
        log::info!("Door opened");
        state.events.push(GameEvent::DoorOpened);
    }
}

fn move_enemies(state: &mut GameState) {
    let blocks = state.grid.blocking_rects();
    let bombs = state.bomb_rects();
    let obstacles = Obstacles {
        blocks: &blocks,
        bombs: &bombs,
        power_ups: None,
    };

    for enemy in state.enemies.iter_mut().filter(|e| !e.is_dead()) {
        let dir = enemy.direction;
        if !try_move(enemy, dir, &obstacles).moved {
            // Keep the old heading; a new one is tried next tick
            enemy.direction = Direction::ALL[state.rng.random_range(0..Direction::ALL.len())];
        }
    }
}

fn detonate_expired(state: &mut GameState, now: u64) {
    let Some(hero_parts) = state.hero.hero.as_mut() else {
        return;
    };
    let mut pending: VecDeque<_> = hero_parts.detonator.take_expired(now).into();

    while let Some(bomb) = pending.pop_front() {
        let explosion = Explosion::plan(&state.grid, bomb.cell, bomb.range, now);
        explosion.apply(&mut state.grid);
        log::debug!(
            "Bomb {} exploded at {:?}: {} tiles, {} rubble",
            bomb.id,
            bomb.cell,
            explosion.flames.len(),
            explosion.destroyed.len()
        );
        state.events.push(GameEvent::BombExploded { cell: bomb.cell });
        state
            .events
            .extend(explosion.destroyed.iter().map(|&cell| GameEvent::RubbleDestroyed { cell }));

        if state.params.chain_reactions {
            if let Some(hero_parts) = state.hero.hero.as_mut() {
                let caught: Vec<_> = hero_parts
                    .detonator
                    .planted()
                    .iter()
                    .filter(|b| explosion.contains(b.cell))
                    .map(|b| b.cell)
                    .collect();
                pending.extend(caught.into_iter().filter_map(|cell| hero_parts.detonator.take_at(cell)));
            }
        }

        apply_flame_damage(state, &explosion, now);
        state.explosions.push(explosion);
    }
}

fn apply_flame_damage(state: &mut GameState, explosion: &Explosion, now: u64) {
    if explosion.hits(&state.hero.rect) && state.hero.take_hit(1, now) {
        state.events.push(GameEvent::HeroHurt {
            lives: state.hero.lives,
        });
    }

    let attack = state.hero.attack;
    for enemy in state.enemies.iter_mut().filter(|e| !e.is_dead()) {
        if explosion.hits(&enemy.rect) {
            enemy.take_hit(attack, now);
        }
    }
}

fn resolve_contacts(state: &mut GameState, now: u64) {
    if state.hero.is_dead() {
        return;
    }
    let touched = state
        .enemies
        .iter()
        .any(|e| !e.is_dead() && e.rect.intersects(&state.hero.rect));
    if touched && state.hero.take_hit(1, now) {
        state.events.push(GameEvent::HeroHurt {
            lives: state.hero.lives,
        });
    }
}

/// Award scores, drop dead enemies and settle the phase
fn finish_tick(state: &mut GameState) {
    for enemy in state.enemies.iter().filter(|e| e.is_dead()) {
        state.hero.add_score(enemy.score);
        log::debug!("Enemy {} killed (+{})", enemy.id, enemy.score);
        state.events.push(GameEvent::EnemyKilled {
            id: enemy.id,
            score: enemy.score,
        });
    }
    state.enemies.retain(|e| !e.is_dead());

    if state.hero.is_dead() {
        state.phase = GamePhase::GameOver;
        log::info!("Game over at level {} with score {}", state.level, state.hero.score);
        state.events.push(GameEvent::GameOver {
            score: state.hero.score,
        });
        return;
    }

    let at_open_door = state
        .grid
        .door()
        .filter(|d| d.kind == TileType::DoorOpened)
        .is_some_and(|door| Collision::new(&state.hero).open_door_collision(&door.rect()));
    if at_open_door {
        state.phase = GamePhase::LevelComplete;
        log::info!("Level {} complete", state.level);
        state.events.push(GameEvent::LevelComplete { level: state.level });
    }
}

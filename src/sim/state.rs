//! Game state and core simulation types
//!
//! `GameState` is owned by the model activity. Readers only ever see an
//! immutable `Snapshot` cloned from it at the end of a tick.

use glam::IVec2;
use rand::{Rng, SeedableRng};
use rand::seq::IteratorRandom;
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};

use super::detonator::Bomb;
use super::entity::{Direction, Entity};
use super::explosion::Explosion;
use super::factory::TileFactory;
use super::powerup::PowerUpKind;
use super::rect::Rect;
use super::tile::{Cell, Grid, Tile, TileType};
use crate::consts::*;
use crate::error::SimError;
use crate::{HERO_SPAWN, centered_in_cell, is_entry_point};

/// Current phase of gameplay
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GamePhase {
    /// Active gameplay
    Playing,
    /// Hero reached the open door; the next level starts on the following tick
    LevelComplete,
    /// Hero ran out of lives
    GameOver,
}

/// Something that happened during the last tick (for presentation)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum GameEvent {
    BombPlanted { cell: Cell },
    BombExploded { cell: Cell },
    RubbleDestroyed { cell: Cell },
    PowerUpCollected { kind: PowerUpKind },
    DoorOpened,
    HeroHurt { lives: u32 },
    EnemyKilled { id: u32, score: u64 },
    LevelComplete { level: u32 },
    GameOver { score: u64 },
}

/// Level generation and rule parameters
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LevelParams {
    pub size: usize,
    pub rubble_density: f64,
    pub power_up_density: f64,
    pub enemy_count: usize,
    pub fuse_ms: u64,
    pub flame_ms: u64,
    pub hero_lives: u32,
    pub chain_reactions: bool,
    /// Model ticks per simulated second
    pub tick_hz: u32,
}

impl Default for LevelParams {
    fn default() -> Self {
        Self {
            size: DEFAULT_LEVEL_SIZE,
            rubble_density: RUBBLE_DENSITY,
            power_up_density: POWER_UP_DENSITY,
            enemy_count: DEFAULT_ENEMY_COUNT,
            fuse_ms: BOMB_FUSE_MS,
            flame_ms: FLAME_MS,
            hero_lives: HERO_LIVES,
            chain_reactions: false,
            tick_hz: DEFAULT_FPS,
        }
    }
}

impl LevelParams {
    /// Copy with every value forced into the range the simulation supports
    pub fn sanitized(self) -> Self {
        let size = self.size.max(MIN_LEVEL_SIZE);
        Self {
            size: size | 1,
            rubble_density: unit_interval(self.rubble_density),
            power_up_density: unit_interval(self.power_up_density),
            hero_lives: self.hero_lives.max(1),
            tick_hz: self.tick_hz.clamp(1, MAX_MODEL_FPS),
            ..self
        }
    }

    /// Simulated milliseconds after `ticks` model ticks
    pub fn elapsed_ms(&self, ticks: u64) -> u64 {
        ticks * 1000 / u64::from(self.tick_hz.max(1))
    }
}

/// Clamp a probability to [0, 1]; NaN counts as 0
pub(crate) fn unit_interval(p: f64) -> f64 {
    if p.is_nan() { 0.0 } else { p.clamp(0.0, 1.0) }
}

fn sanitize(params: LevelParams) -> LevelParams {
    let sanitized = params.sanitized();
    if sanitized != params {
        log::warn!("Level parameters adjusted: {:?} -> {:?}", params, sanitized);
    }
    sanitized
}

/// Minimum Manhattan distance between an enemy spawn and the hero spawn
const ENEMY_SPAWN_DISTANCE: usize = 4;

/// Complete simulation state (deterministic for a given seed and input stream)
#[derive(Debug, Clone)]
pub struct GameState {
    /// Run seed for reproducibility
    pub seed: u64,
    pub params: LevelParams,
    /// 1-based level number
    pub level: u32,
    /// Simulation clock, derived from `time_ticks` and the tick rate
    /// (advances only while ticking)
    pub time_ms: u64,
    pub time_ticks: u64,
    pub phase: GamePhase,
    pub grid: Grid,
    pub hero: Entity,
    pub enemies: Vec<Entity>,
    /// Explosions still burning
    pub explosions: Vec<Explosion>,
    /// Events produced by the last tick
    pub events: Vec<GameEvent>,
    pub(crate) rng: Pcg32,
    next_id: u32,
}

impl GameState {
    /// Create a new run with the given seed
    pub fn new(params: LevelParams, seed: u64) -> Self {
        let params = sanitize(params);
        let mut rng = Pcg32::seed_from_u64(seed);
        let grid = TileFactory::new(params.size, params.rubble_density, params.power_up_density)
            .generate(&mut rng);
        let hero = Entity::hero(centered_in_cell(HERO_SPAWN), params.hero_lives).with_fuse(params.fuse_ms);

        let mut state = Self {
            seed,
            params,
            level: 1,
            time_ms: 0,
            time_ticks: 0,
            phase: GamePhase::Playing,
            grid,
            hero,
            enemies: Vec::new(),
            explosions: Vec::new(),
            events: Vec::new(),
            rng,
            next_id: Entity::HERO_ID + 1,
        };
        state.spawn_enemies();
        state
    }

    /// Build a state around a prepared grid (no enemies)
    pub fn with_grid(params: LevelParams, grid: Grid, seed: u64) -> Self {
        // The grid decides the size, whatever it is
        let params = LevelParams {
            size: grid.size(),
            ..sanitize(LevelParams {
                size: grid.size(),
                ..params
            })
        };
        let hero = Entity::hero(centered_in_cell(HERO_SPAWN), params.hero_lives).with_fuse(params.fuse_ms);
        Self {
            seed,
            params,
            level: 1,
            time_ms: 0,
            time_ticks: 0,
            phase: GamePhase::Playing,
            grid,
            hero,
            enemies: Vec::new(),
            explosions: Vec::new(),
            events: Vec::new(),
            rng: Pcg32::seed_from_u64(seed),
            next_id: Entity::HERO_ID + 1,
        }
    }

    /// Allocate a new entity ID
    pub fn next_entity_id(&mut self) -> u32 {
        let id = self.next_id;
        self.next_id += 1;
        id
    }

    /// Place an enemy centred in `cell`
    pub fn spawn_enemy(&mut self, cell: Cell, direction: Direction) -> u32 {
        let id = self.next_entity_id();
        self.enemies.push(Entity::enemy(id, centered_in_cell(cell), direction));
        id
    }

    fn spawn_enemies(&mut self) {
        let cells = self
            .grid
            .tiles()
            .iter()
            .filter(|t| t.kind == TileType::Walkable && !is_entry_point(t.cell.row, t.cell.col))
            .filter(|t| t.cell.row + t.cell.col >= HERO_SPAWN.row + HERO_SPAWN.col + ENEMY_SPAWN_DISTANCE)
            .map(|t| t.cell)
            .choose_multiple(&mut self.rng, self.params.enemy_count);
        if cells.len() < self.params.enemy_count {
            log::warn!(
                "Only {} of {} enemies fit on level {}",
                cells.len(),
                self.params.enemy_count,
                self.level
            );
        }
        for cell in cells {
            let dir = Direction::ALL[self.rng.random_range(0..Direction::ALL.len())];
            self.spawn_enemy(cell, dir);
        }
    }

    /// Generate the next level, carrying hero lives, attack and score
    pub fn next_level(&mut self) {
        self.level += 1;
        let level_seed: u64 = self.rng.random();
        let mut level_rng = Pcg32::seed_from_u64(level_seed);
        self.grid = TileFactory::new(self.params.size, self.params.rubble_density, self.params.power_up_density)
            .generate(&mut level_rng);
        self.hero.next_level(centered_in_cell(HERO_SPAWN));
        self.enemies.clear();
        self.explosions.clear();
        self.phase = GamePhase::Playing;
        self.spawn_enemies();
        log::info!(
            "Level {} started (lives {}, attack {}, score {})",
            self.level,
            self.hero.lives,
            self.hero.attack,
            self.hero.score
        );
    }

    /// Bombs not yet exploded
    pub fn planted_bombs(&self) -> &[Bomb] {
        self.hero
            .hero
            .as_ref()
            .map(|h| h.detonator.planted())
            .unwrap_or(&[])
    }

    pub fn bomb_rects(&self) -> Vec<Rect> {
        self.planted_bombs().iter().map(Bomb::rect).collect()
    }

    pub fn fuse_ms(&self) -> u64 {
        self.params.fuse_ms
    }

    /// Advance the clock by one model tick
    pub(crate) fn advance_clock(&mut self) -> u64 {
        self.time_ticks += 1;
        self.time_ms = self.params.elapsed_ms(self.time_ticks);
        self.time_ms
    }

    /// Check invariants the tick relies on
    pub fn validate(&self) -> Result<(), SimError> {
        self.grid.validate()
    }

    /// Immutable copy for readers
    pub fn snapshot(&self) -> Snapshot {
        Snapshot {
            tick: self.time_ticks,
            time_ms: self.time_ms,
            level: self.level,
            phase: self.phase,
            fuse_ms: self.params.fuse_ms,
            grid: self.grid.clone(),
            hero: self.hero.clone(),
            enemies: self.enemies.clone(),
            bombs: self.planted_bombs().to_vec(),
            explosions: self.explosions.clone(),
            events: self.events.clone(),
        }
    }
}

/// What the view sees: a consistent picture as of the end of one model tick
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Snapshot {
    pub tick: u64,
    pub time_ms: u64,
    pub level: u32,
    pub phase: GamePhase,
    pub fuse_ms: u64,
    pub grid: Grid,
    pub hero: Entity,
    pub enemies: Vec<Entity>,
    pub bombs: Vec<Bomb>,
    pub explosions: Vec<Explosion>,
    pub events: Vec<GameEvent>,
}

impl Snapshot {
    pub fn tiles(&self) -> &[Tile] {
        self.grid.tiles()
    }

    pub fn power_up_tiles(&self) -> Vec<Tile> {
        self.grid.power_up_tiles()
    }

    pub fn level_size(&self) -> usize {
        self.grid.size()
    }

    /// Text rendering, one character per tile
    pub fn render_ascii(&self) -> String {
        let size = self.grid.size();
        let mut rows: Vec<Vec<char>> = (0..size)
            .map(|row| {
                (0..size)
                    .map(|col| match self.grid.get(Cell::new(row, col)) {
                        Some(t) if t.collectible().is_some() => '+',
                        Some(t) => match t.kind {
                            TileType::Walkable => '.',
                            TileType::Rubble => '%',
                            TileType::Concrete => '#',
                            TileType::DoorClosed => 'D',
                            TileType::DoorOpened => 'O',
                        },
                        None => ' ',
                    })
                    .collect()
            })
            .collect();

        let mut mark = |cell: Cell, c: char| {
            if let Some(slot) = rows.get_mut(cell.row).and_then(|r| r.get_mut(cell.col)) {
                *slot = c;
            }
        };
        for ex in &self.explosions {
            for flame in &ex.flames {
                mark(flame.cell, '*');
            }
        }
        for bomb in &self.bombs {
            mark(bomb.cell, 'B');
        }
        for enemy in &self.enemies {
            mark(enemy.cell(), 'E');
        }
        if !self.hero.is_dead() {
            mark(self.hero.cell(), 'H');
        }

        rows.into_iter()
            .map(|r| r.into_iter().collect::<String>())
            .collect::<Vec<_>>()
            .join("\n")
    }
}

/// Pixel origin used for the hero at the start of every level
pub fn hero_spawn_position() -> IVec2 {
    centered_in_cell(HERO_SPAWN)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_state_is_deterministic() {
        let a = GameState::new(LevelParams::default(), 1234);
        let b = GameState::new(LevelParams::default(), 1234);
        assert_eq!(a.grid, b.grid);
        assert_eq!(a.enemies.len(), b.enemies.len());
        for (ea, eb) in a.enemies.iter().zip(&b.enemies) {
            assert_eq!(ea.rect, eb.rect);
            assert_eq!(ea.direction, eb.direction);
        }
    }

    #[test]
    fn test_enemies_spawn_away_from_hero_on_free_tiles() {
        let state = GameState::new(LevelParams::default(), 77);
        assert_eq!(state.enemies.len(), DEFAULT_ENEMY_COUNT);
        for enemy in &state.enemies {
            let cell = enemy.cell();
            assert_eq!(state.grid.kind_at(cell), Some(TileType::Walkable));
            assert!(cell.row + cell.col >= 2 + ENEMY_SPAWN_DISTANCE);
            assert!(!enemy.is_hero());
        }
        let mut ids: Vec<u32> = state.enemies.iter().map(|e| e.id).collect();
        ids.dedup();
        assert_eq!(ids.len(), DEFAULT_ENEMY_COUNT);
    }

    #[test]
    fn test_hero_starts_at_spawn() {
        let state = GameState::new(LevelParams::default(), 5);
        assert_eq!(state.hero.position(), hero_spawn_position());
        assert_eq!(state.hero.cell(), HERO_SPAWN);
        assert_eq!(state.hero.lives, HERO_LIVES);
    }

    #[test]
    fn test_next_level_carries_stats() {
        let mut state = GameState::new(LevelParams::default(), 9);
        state.hero.add_score(300);
        state.hero.increase_attack(1);
        state.hero.modify_life(-1);
        let old_grid = state.grid.clone();

        state.next_level();
        assert_eq!(state.level, 2);
        assert_eq!(state.hero.score, 300);
        assert_eq!(state.hero.attack, 2);
        assert_eq!(state.hero.lives, HERO_LIVES - 1);
        assert_eq!(state.hero.position(), hero_spawn_position());
        assert_ne!(state.grid, old_grid);
        assert_eq!(state.phase, GamePhase::Playing);
    }

    #[test]
    fn test_snapshot_render() {
        let state = GameState::new(LevelParams::default(), 3);
        let snap = state.snapshot();
        let text = snap.render_ascii();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), DEFAULT_LEVEL_SIZE);
        assert!(lines[0].chars().all(|c| c == '#'));
        assert_eq!(lines[1].chars().nth(1), Some('H'));
        assert_eq!(snap.level_size(), DEFAULT_LEVEL_SIZE);
    }

    #[test]
    fn test_out_of_range_params_are_sanitized() {
        let state = GameState::new(
            LevelParams {
                size: 0,
                rubble_density: f64::NAN,
                power_up_density: 7.0,
                tick_hz: 5000,
                ..LevelParams::default()
            },
            4,
        );
        assert_eq!(state.params.size, MIN_LEVEL_SIZE);
        assert_eq!(state.grid.size(), MIN_LEVEL_SIZE);
        assert_eq!(state.params.rubble_density, 0.0);
        assert_eq!(state.params.power_up_density, 1.0);
        assert_eq!(state.params.tick_hz, MAX_MODEL_FPS);
        assert_eq!(state.grid.count(TileType::Rubble), 0);

        let even = LevelParams {
            size: 10,
            ..LevelParams::default()
        };
        assert_eq!(even.sanitized().size, 11);
        assert_eq!(LevelParams::default().sanitized(), LevelParams::default());
    }

    #[test]
    fn test_clock_is_exact_at_any_rate() {
        let params = LevelParams {
            tick_hz: 60,
            ..LevelParams::default()
        };
        assert_eq!(params.elapsed_ms(1), 16);
        assert_eq!(params.elapsed_ms(3), 50);
        assert_eq!(params.elapsed_ms(180), 3000);
        // No per-tick rounding drift
        assert_eq!(params.elapsed_ms(60 * 3600), 3_600_000);
    }

    #[test]
    fn test_snapshot_serializes() {
        let snap = GameState::new(LevelParams::default(), 3).snapshot();
        let json = serde_json::to_string(&snap).unwrap();
        let back: Snapshot = serde_json::from_str(&json).unwrap();
        assert_eq!(back.grid, snap.grid);
        assert_eq!(back.enemies.len(), snap.enemies.len());
    }
}

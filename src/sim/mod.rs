//! Deterministic simulation module
//!
//! All gameplay logic lives here. This module must be pure and deterministic:
//! - Fixed timestep only
//! - Seeded RNG only
//! - Stable iteration order (by entity ID)
//! - No threading or presentation dependencies

pub mod collision;
pub mod detonator;
pub mod entity;
pub mod explosion;
pub mod factory;
pub mod powerup;
pub mod rect;
pub mod state;
pub mod tick;
pub mod tile;

pub use collision::{Collision, MoveResult, Obstacles, try_move};
pub use detonator::{Bomb, Detonator};
pub use entity::{Direction, Entity, HeroParts};
pub use explosion::{Explosion, Flame};
pub use factory::TileFactory;
pub use powerup::PowerUpKind;
pub use rect::Rect;
pub use state::{GameEvent, GamePhase, GameState, LevelParams, Snapshot, hero_spawn_position};
pub use tick::{TickInput, tick};
pub use tile::{Cell, Grid, Tile, TileType};

//! Power-ups and their effects
//!
//! Effects are looked up in a dispatch table keyed by kind. `Mystery` has no
//! table entry: it resolves to one of the other kinds first.

use rand::Rng;
use serde::{Deserialize, Serialize};

use super::entity::Entity;

/// Power-up types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PowerUpKind {
    Attack,
    Life,
    Bomb,
    Range,
    Hurt,
    ConfusionOn,
    ConfusionOff,
    Key,
    Mystery,
}

type Effect = fn(&mut Entity);

/// Kind -> effect. Mystery is deliberately absent.
const EFFECTS: [(PowerUpKind, Effect); 8] = [
    (PowerUpKind::Attack, attack_up),
    (PowerUpKind::Life, life_up),
    (PowerUpKind::Bomb, bomb_up),
    (PowerUpKind::Range, range_up),
    (PowerUpKind::Hurt, hurt),
    (PowerUpKind::ConfusionOn, confuse),
    (PowerUpKind::ConfusionOff, unconfuse),
    (PowerUpKind::Key, pick_key),
];

fn attack_up(e: &mut Entity) {
    e.increase_attack(1);
}

fn life_up(e: &mut Entity) {
    e.modify_life(1);
}

fn bomb_up(e: &mut Entity) {
    if let Some(hero) = e.hero.as_mut() {
        hero.detonator.increase_capacity();
    }
}

fn range_up(e: &mut Entity) {
    if let Some(hero) = e.hero.as_mut() {
        hero.detonator.increase_range();
    }
}

fn hurt(e: &mut Entity) {
    e.modify_life(-1);
}

fn confuse(e: &mut Entity) {
    e.set_confused(true);
}

fn unconfuse(e: &mut Entity) {
    e.set_confused(false);
}

fn pick_key(e: &mut Entity) {
    if let Some(hero) = e.hero.as_mut() {
        hero.has_key = true;
    }
}

impl PowerUpKind {
    /// Every kind a mystery power-up can turn into
    pub const RESOLVABLE: [PowerUpKind; 8] = [
        PowerUpKind::Attack,
        PowerUpKind::Life,
        PowerUpKind::Bomb,
        PowerUpKind::Range,
        PowerUpKind::Hurt,
        PowerUpKind::ConfusionOn,
        PowerUpKind::ConfusionOff,
        PowerUpKind::Key,
    ];

    /// Kinds that may be hidden under random rubble (the key is placed once per level)
    pub const HIDDEN: [PowerUpKind; 8] = [
        PowerUpKind::Attack,
        PowerUpKind::Life,
        PowerUpKind::Bomb,
        PowerUpKind::Range,
        PowerUpKind::Hurt,
        PowerUpKind::ConfusionOn,
        PowerUpKind::ConfusionOff,
        PowerUpKind::Mystery,
    ];

    /// Concrete kind this power-up acts as; never returns `Mystery`
    pub fn resolve<R: Rng + ?Sized>(self, rng: &mut R) -> PowerUpKind {
        match self {
            PowerUpKind::Mystery => Self::RESOLVABLE[rng.random_range(0..Self::RESOLVABLE.len())],
            kind => kind,
        }
    }

    /// Apply to an entity, returning the kind that actually took effect
    pub fn apply<R: Rng + ?Sized>(self, target: &mut Entity, rng: &mut R) -> PowerUpKind {
        let kind = self.resolve(rng);
        if let Some((_, effect)) = EFFECTS.iter().find(|(k, _)| *k == kind) {
            effect(target);
        }
        kind
    }

    /// Short pickup message for the HUD
    pub fn message(self) -> &'static str {
        match self {
            PowerUpKind::Attack => "Attack increased!",
            PowerUpKind::Life => "Extra life!",
            PowerUpKind::Bomb => "One more bomb!",
            PowerUpKind::Range => "Bigger blasts!",
            PowerUpKind::Hurt => "Ouch!",
            PowerUpKind::ConfusionOn => "You feel confused...",
            PowerUpKind::ConfusionOff => "Your head clears.",
            PowerUpKind::Key => "You found the key!",
            PowerUpKind::Mystery => "Mystery...",
        }
    }
}

//! Game configuration
//!
//! Loaded from a JSON file; every field is optional and falls back to its
//! default.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::consts::*;
use crate::error::ConfigError;
use crate::game_loop::{LoopConfig, PausePolicy};
use crate::sim::LevelParams;

/// Rates, level generation and rule parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GameConfig {
    // === Scheduler ===
    /// Model ticks per second
    pub model_fps: u32,
    /// View ticks per second
    pub view_fps: u32,
    pub pause_policy: PausePolicy,

    // === Level ===
    /// Tiles per side (odd, at least 5)
    pub level_size: usize,
    /// Run seed; random when absent
    pub seed: Option<u64>,
    /// Chance a free tile becomes rubble
    pub rubble_density: f64,
    /// Chance a rubble tile hides a power-up
    pub power_up_density: f64,
    pub enemy_count: usize,

    // === Rules ===
    pub bomb_fuse_ms: u64,
    /// How long flames stay visible
    pub flame_ms: u64,
    pub hero_lives: u32,
    /// Bombs caught in a blast detonate immediately
    pub chain_reactions: bool,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            model_fps: DEFAULT_FPS,
            view_fps: DEFAULT_FPS,
            pause_policy: PausePolicy::ModelOnly,

            level_size: DEFAULT_LEVEL_SIZE,
            seed: None,
            rubble_density: RUBBLE_DENSITY,
            power_up_density: POWER_UP_DENSITY,
            enemy_count: DEFAULT_ENEMY_COUNT,

            bomb_fuse_ms: BOMB_FUSE_MS,
            flame_ms: FLAME_MS,
            hero_lives: HERO_LIVES,
            chain_reactions: false,
        }
    }
}

impl GameConfig {
    /// Read and validate a JSON config file
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let json = fs::read_to_string(path)?;
        Self::from_json(&json)
    }

    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Load from `path`, falling back to defaults on any error
    pub fn load_or_default(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref();
        match Self::load(path) {
            Ok(config) => {
                log::info!("Loaded config from {}", path.display());
                config
            }
            Err(err) => {
                log::warn!("Using default config ({}): {}", path.display(), err);
                Self::default()
            }
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.model_fps == 0 || self.view_fps == 0 {
            return Err(ConfigError::Invalid("tick rates must be positive".into()));
        }
        if self.model_fps > MAX_MODEL_FPS {
            return Err(ConfigError::Invalid(format!(
                "model_fps must be at most {}, got {}",
                MAX_MODEL_FPS, self.model_fps
            )));
        }
        if self.level_size < MIN_LEVEL_SIZE || self.level_size % 2 == 0 {
            return Err(ConfigError::Invalid(format!(
                "level_size must be odd and at least {}, got {}",
                MIN_LEVEL_SIZE, self.level_size
            )));
        }
        for (name, value) in [
            ("rubble_density", self.rubble_density),
            ("power_up_density", self.power_up_density),
        ] {
            if !(0.0..=1.0).contains(&value) {
                return Err(ConfigError::Invalid(format!("{name} must be within [0, 1], got {value}")));
            }
        }
        if self.bomb_fuse_ms == 0 {
            return Err(ConfigError::Invalid("bomb_fuse_ms must be positive".into()));
        }
        if self.hero_lives == 0 {
            return Err(ConfigError::Invalid("hero_lives must be positive".into()));
        }
        Ok(())
    }

    pub fn level_params(&self) -> LevelParams {
        LevelParams {
            size: self.level_size,
            rubble_density: self.rubble_density,
            power_up_density: self.power_up_density,
            enemy_count: self.enemy_count,
            fuse_ms: self.bomb_fuse_ms,
            flame_ms: self.flame_ms,
            hero_lives: self.hero_lives,
            chain_reactions: self.chain_reactions,
            tick_hz: self.model_fps,
        }
    }

    pub fn loop_config(&self) -> LoopConfig {
        LoopConfig {
            model_fps: self.model_fps,
            view_fps: self.view_fps,
            pause_policy: self.pause_policy,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        let config = GameConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.level_params(), LevelParams::default());
    }

    #[test]
    fn test_partial_json_fills_defaults() {
        let config = GameConfig::from_json(r#"{ "model_fps": 30, "seed": 7, "pause_policy": "ModelAndView" }"#).unwrap();
        assert_eq!(config.model_fps, 30);
        assert_eq!(config.seed, Some(7));
        assert_eq!(config.pause_policy, PausePolicy::ModelAndView);
        assert_eq!(config.view_fps, DEFAULT_FPS);
        assert_eq!(config.level_size, DEFAULT_LEVEL_SIZE);
        assert_eq!(config.level_params().tick_hz, 30);
    }

    #[test]
    fn test_rejects_invalid_values() {
        for json in [
            r#"{ "model_fps": 0 }"#,
            r#"{ "model_fps": 2000 }"#,
            r#"{ "level_size": 14 }"#,
            r#"{ "level_size": 3 }"#,
            r#"{ "rubble_density": 1.5 }"#,
            r#"{ "power_up_density": -0.1 }"#,
            r#"{ "bomb_fuse_ms": 0 }"#,
        ] {
            assert!(matches!(GameConfig::from_json(json), Err(ConfigError::Invalid(_))), "{json}");
        }
    }

    #[test]
    fn test_rejects_nan_density() {
        let config = GameConfig {
            rubble_density: f64::NAN,
            ..GameConfig::default()
        };
        assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn test_malformed_json() {
        assert!(matches!(GameConfig::from_json("{ not json"), Err(ConfigError::Parse(_))));
    }

    #[test]
    fn test_missing_file_falls_back() {
        let path = std::env::temp_dir().join("bomb-grid-missing-config.json");
        assert!(matches!(GameConfig::load(&path), Err(ConfigError::Io(_))));
        assert_eq!(GameConfig::load_or_default(&path), GameConfig::default());
    }

    #[test]
    fn test_round_trip_through_file() {
        let path = std::env::temp_dir().join(format!("bomb-grid-config-{}.json", std::process::id()));
        let config = GameConfig {
            level_size: 9,
            chain_reactions: true,
            ..GameConfig::default()
        };
        fs::write(&path, serde_json::to_string_pretty(&config).unwrap()).unwrap();
        assert_eq!(GameConfig::load(&path).unwrap(), config);
        let _ = fs::remove_file(&path);
    }
}

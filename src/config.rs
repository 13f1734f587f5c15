//! Tunable engine constants, loadable from a TOML file.
//!
//! Every field has a default, so a config file only needs to list the values
//! it wants to change:
//!
//! ```toml
//! [world]
//! width = 1024.0
//! enemy_spawn_interval = 1.5
//!
//! [game]
//! max_fps = 60
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::entities::{
    DEFAULT_ENEMY_DAMAGE, DEFAULT_ENEMY_RADIUS, DEFAULT_ENEMY_SPEED, DEFAULT_ITEM_RADIUS,
    DEFAULT_PLAYER_HEALTH, DEFAULT_PLAYER_RADIUS, DEFAULT_PLAYER_SPEED,
};

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("malformed config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("invalid config value: {0}")]
    Invalid(&'static str),
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub world: WorldConfig,
    pub game: GameConfig,
}

/// World bounds, per-kind stats and spawn cadence.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WorldConfig {
    pub width: f32,
    pub height: f32,

    pub player_radius: f32,
    pub player_health: i32,
    pub player_speed: f32,

    pub enemy_radius: f32,
    pub enemy_damage: i32,
    pub enemy_speed: f32,

    pub item_radius: f32,

    /// Seconds between automatic enemy spawns; `0` disables them.
    pub enemy_spawn_interval: f32,
    /// Seconds between automatic item spawns; `0` disables them.
    pub item_spawn_interval: f32,
    pub max_enemies: usize,
    pub max_items: usize,

    /// Spawned by `GameWorld::initialize`.
    pub initial_enemies: usize,
    pub initial_items: usize,
}

impl Default for WorldConfig {
    fn default() -> Self {
        Self {
            width: 800.0,
            height: 600.0,
            player_radius: DEFAULT_PLAYER_RADIUS,
            player_health: DEFAULT_PLAYER_HEALTH,
            player_speed: DEFAULT_PLAYER_SPEED,
            enemy_radius: DEFAULT_ENEMY_RADIUS,
            enemy_damage: DEFAULT_ENEMY_DAMAGE,
            enemy_speed: DEFAULT_ENEMY_SPEED,
            item_radius: DEFAULT_ITEM_RADIUS,
            enemy_spawn_interval: 3.0,
            item_spawn_interval: 5.0,
            max_enemies: 12,
            max_items: 6,
            initial_enemies: 3,
            initial_items: 2,
        }
    }
}

impl WorldConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.width.is_finite() && self.height.is_finite()) {
            return Err(ConfigError::Invalid("world bounds must be finite"));
        }
        if self.width < 0.0 || self.height < 0.0 {
            return Err(ConfigError::Invalid("world bounds must be non-negative"));
        }
        let radii = [self.player_radius, self.enemy_radius, self.item_radius];
        if radii.iter().any(|r| !r.is_finite() || *r < 0.0) {
            return Err(ConfigError::Invalid("collision radii must be non-negative"));
        }
        let intervals = [self.enemy_spawn_interval, self.item_spawn_interval];
        if intervals.iter().any(|t| t.is_nan() || *t < 0.0) {
            return Err(ConfigError::Invalid("spawn intervals must be non-negative"));
        }
        let speeds = [self.player_speed, self.enemy_speed];
        if speeds.iter().any(|v| !v.is_finite() || *v < 0.0) {
            return Err(ConfigError::Invalid("speeds must be finite and non-negative"));
        }
        if self.enemy_damage < 0 {
            return Err(ConfigError::Invalid("enemy damage must be non-negative"));
        }
        if self.player_health <= 0 {
            return Err(ConfigError::Invalid("player health must be positive"));
        }
        Ok(())
    }
}

/// Frame loop settings.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GameConfig {
    /// Frame-rate cap; `None` runs uncapped (pure variable timestep).
    pub max_fps: Option<u32>,
    /// Seconds after which the FPS average restarts.
    pub fps_window: f32,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            max_fps: Some(30),
            fps_window: 1.0,
        }
    }
}

impl EngineConfig {
    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        let config: EngineConfig = toml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path)?;
        Self::from_toml_str(&text)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.world.validate()?;
        if self.game.fps_window.is_nan() || self.game.fps_window <= 0.0 {
            return Err(ConfigError::Invalid("fps_window must be positive"));
        }
        if self.game.max_fps == Some(0) {
            return Err(ConfigError::Invalid("max_fps must be at least 1"));
        }
        Ok(())
    }
}

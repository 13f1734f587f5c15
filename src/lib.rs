//! A small 2D game-engine core: entities, a world that steps and collides
//! them, event channels for gameplay reactions and a variable-timestep
//! frame loop.  Drawing and input are left to a [`game::Frontend`].

pub mod config;
pub mod entities;
pub mod error;
pub mod events;
pub mod game;
pub mod vector;
pub mod world;

pub use config::{EngineConfig, GameConfig, WorldConfig};
pub use entities::{Entity, EntityId, EntityKind, GameState};
pub use error::GameError;
pub use events::{CollisionEvent, EventSystem, ScoreEvent};
pub use game::{Frontend, Game, InputCommand};
pub use vector::Vector2D;
pub use world::{GameWorld, Renderer, WorldStats};

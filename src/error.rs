//! Recoverable error conditions surfaced by world and entity operations.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum GameError {
    /// A coordinate was NaN or infinite.
    #[error("invalid position: ({x}, {y})")]
    InvalidPosition { x: f32, y: f32 },

    /// Lookup or removal by name found nothing.
    #[error("game object not found: {0}")]
    ObjectNotFound(String),

    #[error("invalid world bounds: {width} x {height}")]
    InvalidBounds { width: f32, height: f32 },

    /// `set_player` was handed an enemy or an item.
    #[error("entity '{0}' is not a player")]
    NotAPlayer(String),

    #[error("frontend I/O failed: {0}")]
    Io(#[from] std::io::Error),
}

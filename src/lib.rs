// Library crate for the word tile game server
// This file exposes the public API for integration tests

pub mod bag;
pub mod board;
pub mod config;
pub mod dictionary;
pub mod event;
pub mod game;
pub mod rack;
pub mod scheduler;
pub mod score;
pub mod shared;

// Re-export commonly used types for easier access in tests
pub use config::GameConfig;
pub use event::{EventBus, EventPublisher, GameEvent};
pub use game::{GameModel, GameService, GameStatus};
pub use shared::{AppError, AppState};

// Public API
pub use handlers::routes;
pub use logic::TurnEnd;
pub use models::{
    ActionModel, ActionType, GameModel, GameStatus, PlayerModel, WordModel, MAX_PLAYERS,
    MIN_PLAYERS,
};
pub use repository::{
    ActionRepository, GameRepository, InMemoryActionRepository, InMemoryGameRepository,
    InMemoryPlayerRepository, InMemoryWordRepository, PlayerRepository, PostgresGameRepository,
    WordRepository,
};
pub use service::{GameService, GameServiceBuilder};
pub use types::{
    ChatMessage, CreateGameRequest, ExchangeResult, ExchangeTilesRequest, PlayMoveRequest,
    PlayResult, PlayedWord, TilePlacement,
};

// Internal modules
mod handlers;
mod logic;
mod models;
mod repository;
mod service;
mod turns;
mod types;

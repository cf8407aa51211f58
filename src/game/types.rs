use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::models::GameModel;
use crate::bag::Language;
use crate::rack::{VirtualRack, VirtualTile};
use crate::score::Bonus;

/// Request payload for creating a game. Omitted fields use the configured defaults.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateGameRequest {
    pub owner_id: String,
    #[serde(default)]
    pub language: Language,
    pub rows: Option<usize>,
    pub columns: Option<usize>,
    pub expected_player_count: u32,
    pub duration_seconds: Option<u64>,
}

/// Body of join, leave, terminate and other user-scoped calls
#[derive(Debug, Clone, Deserialize)]
pub struct UserRequest {
    pub user_id: String,
}

/// Where one rack tile goes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TilePlacement {
    pub tile_number: u8,
    pub row: usize,
    pub column: usize,
}

/// A move: the rack as the client sees it, with played tiles sealed,
/// plus the target cell of every sealed tile
#[derive(Debug, Clone, Deserialize)]
pub struct PlayMoveRequest {
    pub user_id: String,
    pub rack: Vec<VirtualTile>,
    pub placements: Vec<TilePlacement>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ExchangeTilesRequest {
    pub player_number: u32,
    pub round_number: u32,
    pub tile_numbers: Vec<u8>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ChatRequest {
    pub user_id: String,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlayedWord {
    pub text: String,
    pub definition: Option<String>,
    pub score: u32,
}

/// Outcome of an accepted move
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlayResult {
    pub game: GameModel,
    pub words: Vec<PlayedWord>,
    pub bonuses: Vec<Bonus>,
    pub points: u32,
    /// The mover's refilled rack for their next turn
    pub rack: VirtualRack,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExchangeResult {
    pub game: GameModel,
    pub rack: VirtualRack,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub game_id: String,
    pub user_id: String,
    pub message: String,
    pub sent_at: DateTime<Utc>,
}

#[derive(Debug, Default, Deserialize)]
pub struct BoardQuery {
    pub version: Option<i64>,
}

#[derive(Debug, Default, Deserialize)]
pub struct RackQuery {
    pub round: Option<u32>,
}

#[derive(Debug, Default, Deserialize)]
pub struct ActionsQuery {
    #[serde(default)]
    pub since: i64,
}

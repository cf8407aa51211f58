use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum_macros::{Display, EnumString};
use uuid::Uuid;

use crate::bag::Language;

pub const MIN_PLAYERS: u32 = 2;
pub const MAX_PLAYERS: u32 = 4;

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum GameStatus {
    NoStatus,
    Waiting,
    ReadyToStart,
    InProgress,
    LastRound,
    ReadyToEnd,
    Ended,
    Terminated,
    Deleted,
}

impl GameStatus {
    /// Statuses in which moves, skips and exchanges are accepted
    pub fn is_playable(&self) -> bool {
        matches!(self, GameStatus::InProgress | GameStatus::LastRound)
    }

    /// Games in these statuses are reported as missing
    pub fn is_removed(&self) -> bool {
        matches!(self, GameStatus::Terminated | GameStatus::Deleted)
    }

    pub fn is_closed(&self) -> bool {
        matches!(
            self,
            GameStatus::Ended | GameStatus::Terminated | GameStatus::Deleted
        )
    }
}

/// Database model for games table
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GameModel {
    pub id: String,
    pub owner_id: String,
    pub language: Language,
    pub rows: usize,
    pub columns: usize,
    pub expected_player_count: u32,
    pub active_player_count: u32,
    pub status: GameStatus,
    pub current_player_number: u32,
    /// 0 until the game starts
    pub round_number: u32,
    /// Compare-and-swap token for writers
    pub version: i64,
    /// Public sequence clients poll against
    pub action_counter: i64,
    pub duration_seconds: u64,
    pub consecutive_skips: u32,
    pub created_at: DateTime<Utc>,
    pub started_at: Option<DateTime<Utc>>,
    pub ended_at: Option<DateTime<Utc>>,
}

/// Database model for players table
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlayerModel {
    pub id: String,
    pub game_id: String,
    pub user_id: String,
    pub player_number: u32,
    pub score: u32,
    pub joined_at: DateTime<Utc>,
    pub left_at: Option<DateTime<Utc>>,
}

impl PlayerModel {
    pub fn new(game_id: &str, user_id: &str, player_number: u32) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            game_id: game_id.to_string(),
            user_id: user_id.to_string(),
            player_number,
            score: 0,
            joined_at: Utc::now(),
            left_at: None,
        }
    }

    pub fn is_active(&self) -> bool {
        self.left_at.is_none()
    }
}

/// A word accepted by a move. Written once.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WordModel {
    pub id: String,
    pub game_id: String,
    pub player_number: u32,
    pub user_id: String,
    pub round_number: u32,
    pub text: String,
    pub definition: Option<String>,
    pub score: u32,
    pub created_at: DateTime<Utc>,
}

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum ActionType {
    Create,
    Join,
    Leave,
    Start,
    Play,
    Skip,
    End,
    Terminate,
}

/// Event log row recording the game state a transition produced
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActionModel {
    pub id: String,
    pub game_id: String,
    pub action_type: ActionType,
    pub user_id: Option<String>,
    pub player_number: Option<u32>,
    pub status: GameStatus,
    pub version: i64,
    pub action_counter: i64,
    pub round_number: u32,
    pub points: u32,
    pub created_at: DateTime<Utc>,
}

impl ActionModel {
    pub fn record(game: &GameModel, action_type: ActionType) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            game_id: game.id.clone(),
            action_type,
            user_id: None,
            player_number: None,
            status: game.status,
            version: game.version,
            action_counter: game.action_counter,
            round_number: game.round_number,
            points: 0,
            created_at: Utc::now(),
        }
    }

    pub fn by(mut self, user_id: &str, player_number: u32) -> Self {
        self.user_id = Some(user_id.to_string());
        self.player_number = Some(player_number);
        self
    }

    pub fn with_points(mut self, points: u32) -> Self {
        self.points = points;
        self
    }
}

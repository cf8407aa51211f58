use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::game::ActionModel;

/// Facts published to whatever gateway fans game state out to clients
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum GameEvent {
    /// A state-changing action was committed
    ActionRecorded { game_id: String, action: ActionModel },

    /// A move was accepted
    WordsPlayed {
        game_id: String,
        player_number: u32,
        words: Vec<String>,
        points: u32,
    },

    ChatPosted {
        game_id: String,
        user_id: String,
        message: String,
        sent_at: DateTime<Utc>,
    },
}

impl GameEvent {
    pub fn game_id(&self) -> &str {
        match self {
            GameEvent::ActionRecorded { game_id, .. }
            | GameEvent::WordsPlayed { game_id, .. }
            | GameEvent::ChatPosted { game_id, .. } => game_id,
        }
    }

    /// Topic the gateway subscribes to
    pub fn topic(&self) -> &'static str {
        match self {
            GameEvent::ActionRecorded { .. } | GameEvent::WordsPlayed { .. } => "actions",
            GameEvent::ChatPosted { .. } => "chats",
        }
    }
}

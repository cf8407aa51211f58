use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{broadcast, RwLock};
use tracing::debug;

use super::events::GameEvent;

const GAME_CHANNEL_CAPACITY: usize = 100;

/// Outbound notifications of committed game state
#[async_trait]
pub trait EventPublisher: Send + Sync {
    async fn publish(&self, event: GameEvent);

    /// Called once a game is over; nothing more is published for it
    async fn close(&self, game_id: &str);
}

/// Per-game broadcast channels, created on first use
#[derive(Debug, Clone, Default)]
pub struct EventBus {
    game_channels: Arc<RwLock<HashMap<String, broadcast::Sender<GameEvent>>>>,
}

impl EventBus {
    pub fn new() -> Self {
        Self::default()
    }

    async fn sender(&self, game_id: &str) -> broadcast::Sender<GameEvent> {
        if let Some(sender) = self.game_channels.read().await.get(game_id) {
            return sender.clone();
        }

        let mut channels = self.game_channels.write().await;
        channels
            .entry(game_id.to_string())
            .or_insert_with(|| {
                debug!(game_id = %game_id, "Creating game channel");
                broadcast::channel(GAME_CHANNEL_CAPACITY).0
            })
            .clone()
    }

    pub async fn emit_to_game(&self, event: GameEvent) {
        let game_id = event.game_id().to_string();
        let topic = event.topic();

        match self.sender(&game_id).await.send(event) {
            Ok(receivers) => debug!(game_id = %game_id, topic, receivers, "Game event emitted"),
            Err(_) => debug!(game_id = %game_id, topic, "Game event emitted with no receivers"),
        }
    }

    pub async fn subscribe_to_game(&self, game_id: &str) -> broadcast::Receiver<GameEvent> {
        self.sender(game_id).await.subscribe()
    }

    /// Drops the channel of a finished game; live receivers see it close
    pub async fn close_game(&self, game_id: &str) {
        if self.game_channels.write().await.remove(game_id).is_some() {
            debug!(game_id = %game_id, "Game channel closed");
        }
    }

    pub async fn is_open(&self, game_id: &str) -> bool {
        self.game_channels.read().await.contains_key(game_id)
    }
}

#[async_trait]
impl EventPublisher for EventBus {
    async fn publish(&self, event: GameEvent) {
        self.emit_to_game(event).await;
    }

    async fn close(&self, game_id: &str) {
        self.close_game(game_id).await;
    }
}

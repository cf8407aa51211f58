use async_trait::async_trait;
use std::sync::Arc;
use tokio::sync::{RwLock, Semaphore};

use wordtiles::{
    bag::{BagRepository, InMemoryBagRepository, Language, LetterTile, TileBag},
    dictionary::{Dictionary, DictionaryEntry},
    AppError, EventBus, EventPublisher, GameEvent,
};

// ============================================================================
// Dictionaries
// ============================================================================

/// Accepts every word. With `yielding` set, each lookup gives the scheduler a chance to run other
/// tasks first, which lets two moves interleave.
pub struct AnyWordDictionary {
    yielding: bool,
}

impl AnyWordDictionary {
    pub fn new() -> Self {
        Self { yielding: false }
    }

    pub fn yielding(mut self) -> Self {
        self.yielding = true;
        self
    }
}

#[async_trait]
impl Dictionary for AnyWordDictionary {
    async fn lookup(
        &self,
        word: &str,
        _language: Language,
    ) -> Result<Option<DictionaryEntry>, AppError> {
        if self.yielding {
            tokio::task::yield_now().await;
        }

        let word = word.to_uppercase();
        Ok(Some(DictionaryEntry {
            definition: Some(format!("definition of {}", word)),
            word,
        }))
    }
}

// ============================================================================
// Bag
// ============================================================================

/// In-memory bag that only ever holds `capacity` tiles, so games reach the
/// end of the bag within a few moves
pub struct SmallBagRepository {
    inner: InMemoryBagRepository,
    capacity: u32,
}

impl SmallBagRepository {
    pub fn new(capacity: u32) -> Self {
        Self {
            inner: InMemoryBagRepository::with_seed(7),
            capacity,
        }
    }
}

#[async_trait]
impl BagRepository for SmallBagRepository {
    async fn create_bag(&self, mut bag: TileBag) -> Result<(), AppError> {
        let mut left = self.capacity;
        for stock in bag.letters.values_mut() {
            let kept = stock.count.min(left);
            stock.count = kept;
            left -= kept;
        }
        self.inner.create_bag(bag).await
    }

    async fn get_bag(&self, game_id: &str) -> Result<Option<TileBag>, AppError> {
        self.inner.get_bag(game_id).await
    }

    async fn remaining(&self, game_id: &str) -> Result<u32, AppError> {
        self.inner.remaining(game_id).await
    }

    async fn draw_tiles(&self, game_id: &str, count: usize) -> Result<Vec<LetterTile>, AppError> {
        self.inner.draw_tiles(game_id, count).await
    }

    async fn exchange_tiles(
        &self,
        game_id: &str,
        letters: &[char],
    ) -> Result<Vec<LetterTile>, AppError> {
        self.inner.exchange_tiles(game_id, letters).await
    }
}

// ============================================================================
// Publisher
// ============================================================================

/// Forwards to a real bus and keeps a copy of everything published.
/// Can hold back the `WordsPlayed` event of one player until released,
/// which parks that move between its commit and its timer hand-off.
#[derive(Clone, Default)]
pub struct RecordingPublisher {
    pub bus: EventBus,
    published: Arc<RwLock<Vec<GameEvent>>>,
    held: Arc<RwLock<Option<(u32, Arc<Semaphore>)>>>,
}

impl RecordingPublisher {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn events(&self) -> Vec<GameEvent> {
        self.published.read().await.clone()
    }

    /// Blocks the next words of `player_number` until a permit is added
    pub async fn hold_words_played_by(&self, player_number: u32) -> Arc<Semaphore> {
        let gate = Arc::new(Semaphore::new(0));
        *self.held.write().await = Some((player_number, gate.clone()));
        gate
    }

    async fn gate_for(&self, event: &GameEvent) -> Option<Arc<Semaphore>> {
        let GameEvent::WordsPlayed { player_number, .. } = event else {
            return None;
        };
        let mut held = self.held.write().await;
        match held.as_ref() {
            Some((held_number, _)) if held_number == player_number => {
                held.take().map(|(_, gate)| gate)
            }
            _ => None,
        }
    }
}

#[async_trait]
impl EventPublisher for RecordingPublisher {
    async fn publish(&self, event: GameEvent) {
        if let Some(gate) = self.gate_for(&event).await {
            let _permit = gate.acquire().await;
        }
        self.published.write().await.push(event.clone());
        self.bus.publish(event).await;
    }

    async fn close(&self, game_id: &str) {
        self.bus.close(game_id).await;
    }
}

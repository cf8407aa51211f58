use async_trait::async_trait;
use rand::{rngs::StdRng, SeedableRng};
use std::collections::HashMap;
use tokio::sync::Mutex;
use tracing::{debug, instrument, warn};

use super::models::{LetterTile, TileBag};
use crate::shared::AppError;

/// Per-game tile pools. Draw and exchange are atomic per call.
#[async_trait]
pub trait BagRepository: Send + Sync {
    async fn create_bag(&self, bag: TileBag) -> Result<(), AppError>;
    async fn get_bag(&self, game_id: &str) -> Result<Option<TileBag>, AppError>;
    async fn remaining(&self, game_id: &str) -> Result<u32, AppError>;
    async fn draw_tiles(&self, game_id: &str, count: usize) -> Result<Vec<LetterTile>, AppError>;
    async fn exchange_tiles(
        &self,
        game_id: &str,
        letters: &[char],
    ) -> Result<Vec<LetterTile>, AppError>;
}

struct BagTable {
    bags: HashMap<String, TileBag>,
    rng: StdRng,
}

/// In-memory implementation of BagRepository
pub struct InMemoryBagRepository {
    table: Mutex<BagTable>,
}

impl Default for InMemoryBagRepository {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryBagRepository {
    pub fn new() -> Self {
        Self::with_rng(StdRng::from_os_rng())
    }

    /// Deterministic draws for tests
    pub fn with_seed(seed: u64) -> Self {
        Self::with_rng(StdRng::seed_from_u64(seed))
    }

    fn with_rng(rng: StdRng) -> Self {
        Self {
            table: Mutex::new(BagTable {
                bags: HashMap::new(),
                rng,
            }),
        }
    }
}

fn bag_not_found(game_id: &str) -> AppError {
    AppError::NotFound(format!("Tile bag not found for game: {}", game_id))
}

#[async_trait]
impl BagRepository for InMemoryBagRepository {
    #[instrument(skip(self, bag), fields(game_id = %bag.game_id))]
    async fn create_bag(&self, bag: TileBag) -> Result<(), AppError> {
        let mut table = self.table.lock().await;
        if table.bags.contains_key(&bag.game_id) {
            warn!("Tile bag already exists");
            return Err(AppError::DatabaseError("Tile bag already exists".to_string()));
        }
        debug!(remaining = bag.remaining(), "Tile bag created");
        table.bags.insert(bag.game_id.clone(), bag);
        Ok(())
    }

    async fn get_bag(&self, game_id: &str) -> Result<Option<TileBag>, AppError> {
        let table = self.table.lock().await;
        Ok(table.bags.get(game_id).cloned())
    }

    async fn remaining(&self, game_id: &str) -> Result<u32, AppError> {
        let table = self.table.lock().await;
        table
            .bags
            .get(game_id)
            .map(TileBag::remaining)
            .ok_or_else(|| bag_not_found(game_id))
    }

    #[instrument(skip(self))]
    async fn draw_tiles(&self, game_id: &str, count: usize) -> Result<Vec<LetterTile>, AppError> {
        let mut table = self.table.lock().await;
        let BagTable { bags, rng } = &mut *table;
        let bag = bags.get_mut(game_id).ok_or_else(|| bag_not_found(game_id))?;

        let drawn = bag.draw_many(count, rng);
        debug!(
            drawn = drawn.len(),
            remaining = bag.remaining(),
            "Tiles drawn from bag"
        );
        Ok(drawn)
    }

    #[instrument(skip(self))]
    async fn exchange_tiles(
        &self,
        game_id: &str,
        letters: &[char],
    ) -> Result<Vec<LetterTile>, AppError> {
        let mut table = self.table.lock().await;
        let BagTable { bags, rng } = &mut *table;
        let bag = bags.get_mut(game_id).ok_or_else(|| bag_not_found(game_id))?;

        let replacements = bag.exchange(letters, rng)?;
        debug!(
            exchanged = replacements.len(),
            remaining = bag.remaining(),
            "Tiles exchanged"
        );
        Ok(replacements)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bag::Language;

    #[tokio::test]
    async fn test_draw_from_unknown_game() {
        let repo = InMemoryBagRepository::with_seed(1);
        let result = repo.draw_tiles("missing", 7).await;
        assert!(matches!(result.unwrap_err(), AppError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_create_bag_twice() {
        let repo = InMemoryBagRepository::with_seed(1);
        repo.create_bag(TileBag::standard("g", Language::English))
            .await
            .unwrap();
        let result = repo
            .create_bag(TileBag::standard("g", Language::English))
            .await;
        assert!(matches!(result.unwrap_err(), AppError::DatabaseError(_)));
    }

    #[tokio::test]
    async fn test_draw_and_exchange_keep_counts() {
        let repo = InMemoryBagRepository::with_seed(11);
        repo.create_bag(TileBag::standard("g", Language::English))
            .await
            .unwrap();

        let drawn = repo.draw_tiles("g", 7).await.unwrap();
        assert_eq!(drawn.len(), 7);
        assert_eq!(repo.remaining("g").await.unwrap(), 91);

        let letters: Vec<char> = drawn.iter().take(2).map(|t| t.letter).collect();
        let swapped = repo.exchange_tiles("g", &letters).await.unwrap();
        assert_eq!(swapped.len(), 2);
        assert_eq!(repo.remaining("g").await.unwrap(), 91);
    }
}

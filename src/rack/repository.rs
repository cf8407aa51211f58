use async_trait::async_trait;
use std::collections::HashMap;
use tokio::sync::RwLock;
use tracing::{debug, instrument, warn};

use super::models::VirtualRack;
use crate::shared::AppError;

/// Append-only store of rack snapshots keyed by (game, player, round)
#[async_trait]
pub trait RackRepository: Send + Sync {
    /// Appends a snapshot. Several snapshots may exist for one round
    /// (exchanges); rounds must never go backwards for a player.
    async fn append_rack(&self, rack: VirtualRack) -> Result<(), AppError>;

    /// Newest snapshot whose round is at or before `round_number`
    async fn get_rack(
        &self,
        game_id: &str,
        player_number: u32,
        round_number: u32,
    ) -> Result<Option<VirtualRack>, AppError>;
}

/// In-memory implementation of RackRepository
pub struct InMemoryRackRepository {
    /// (game id, player number) -> snapshots in append order
    racks: RwLock<HashMap<(String, u32), Vec<VirtualRack>>>,
}

impl Default for InMemoryRackRepository {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryRackRepository {
    pub fn new() -> Self {
        Self {
            racks: RwLock::new(HashMap::new()),
        }
    }
}

#[async_trait]
impl RackRepository for InMemoryRackRepository {
    #[instrument(skip(self, rack), fields(game_id = %rack.game_id, player_number = rack.player_number, round = rack.round_number))]
    async fn append_rack(&self, rack: VirtualRack) -> Result<(), AppError> {
        let mut racks = self.racks.write().await;
        let history = racks
            .entry((rack.game_id.clone(), rack.player_number))
            .or_default();

        if let Some(last) = history.last() {
            if rack.round_number < last.round_number {
                warn!(last_round = last.round_number, "Rejecting rack for an earlier round");
                return Err(AppError::InvalidState(format!(
                    "rack for round {} is older than round {}",
                    rack.round_number, last.round_number
                )));
            }
        }

        debug!(letters = %rack.letters(), "Rack snapshot appended");
        history.push(rack);
        Ok(())
    }

    async fn get_rack(
        &self,
        game_id: &str,
        player_number: u32,
        round_number: u32,
    ) -> Result<Option<VirtualRack>, AppError> {
        let racks = self.racks.read().await;
        Ok(racks
            .get(&(game_id.to_string(), player_number))
            .and_then(|history| {
                history
                    .iter()
                    .rev()
                    .find(|rack| rack.round_number <= round_number)
                    .cloned()
            }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bag::LetterTile;

    fn rack(round: u32, letters: &str) -> VirtualRack {
        VirtualRack::from_letters(
            "game",
            1,
            round,
            letters
                .chars()
                .map(|letter| LetterTile {
                    letter,
                    value: 1,
                    vowel: false,
                })
                .collect(),
        )
    }

    #[tokio::test]
    async fn test_reads_latest_snapshot_at_or_before_round() {
        let repo = InMemoryRackRepository::new();
        repo.append_rack(rack(1, "ABCDEFG")).await.unwrap();
        repo.append_rack(rack(3, "HIJKLMN")).await.unwrap();

        assert_eq!(repo.get_rack("game", 1, 1).await.unwrap().unwrap().letters(), "ABCDEFG");
        assert_eq!(repo.get_rack("game", 1, 2).await.unwrap().unwrap().letters(), "ABCDEFG");
        assert_eq!(repo.get_rack("game", 1, 5).await.unwrap().unwrap().letters(), "HIJKLMN");
        assert!(repo.get_rack("game", 2, 1).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_same_round_snapshot_supersedes() {
        let repo = InMemoryRackRepository::new();
        repo.append_rack(rack(1, "ABCDEFG")).await.unwrap();
        repo.append_rack(rack(1, "ZBCDEFG")).await.unwrap();

        let current = repo.get_rack("game", 1, 1).await.unwrap().unwrap();
        assert_eq!(current.letters(), "ZBCDEFG");
    }

    #[tokio::test]
    async fn test_rejects_round_going_backwards() {
        let repo = InMemoryRackRepository::new();
        repo.append_rack(rack(2, "ABCDEFG")).await.unwrap();

        let result = repo.append_rack(rack(1, "ABCDEFG")).await;
        assert!(matches!(result.unwrap_err(), AppError::InvalidState(_)));
    }
}

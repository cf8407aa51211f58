use async_trait::async_trait;
use std::collections::HashMap;
use tokio::sync::RwLock;
use tracing::{debug, instrument, warn};

use super::models::VirtualBoard;
use crate::shared::AppError;

/// Append-only log of board snapshots, indexed by game version
#[async_trait]
pub trait BoardRepository: Send + Sync {
    /// Appends a snapshot; its version must be newer than every stored one
    async fn append_board(&self, board: VirtualBoard) -> Result<(), AppError>;

    /// Newest snapshot whose version is at or before `version`
    async fn get_board(&self, game_id: &str, version: i64)
        -> Result<Option<VirtualBoard>, AppError>;

    async fn latest_board(&self, game_id: &str) -> Result<Option<VirtualBoard>, AppError>;
}

/// In-memory implementation of BoardRepository
pub struct InMemoryBoardRepository {
    boards: RwLock<HashMap<String, Vec<VirtualBoard>>>,
}

impl Default for InMemoryBoardRepository {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryBoardRepository {
    pub fn new() -> Self {
        Self {
            boards: RwLock::new(HashMap::new()),
        }
    }
}

#[async_trait]
impl BoardRepository for InMemoryBoardRepository {
    #[instrument(skip(self, board), fields(game_id = %board.game_id, version = board.version))]
    async fn append_board(&self, board: VirtualBoard) -> Result<(), AppError> {
        let mut boards = self.boards.write().await;
        let history = boards.entry(board.game_id.clone()).or_default();

        if let Some(last) = history.last() {
            if board.version <= last.version {
                warn!(last_version = last.version, "Board snapshot version already taken");
                return Err(AppError::VersionConflict {
                    expected: last.version + 1,
                    actual: board.version,
                });
            }
        }

        debug!("Board snapshot appended");
        history.push(board);
        Ok(())
    }

    async fn get_board(
        &self,
        game_id: &str,
        version: i64,
    ) -> Result<Option<VirtualBoard>, AppError> {
        let boards = self.boards.read().await;
        Ok(boards.get(game_id).and_then(|history| {
            history
                .iter()
                .rev()
                .find(|board| board.version <= version)
                .cloned()
        }))
    }

    async fn latest_board(&self, game_id: &str) -> Result<Option<VirtualBoard>, AppError> {
        let boards = self.boards.read().await;
        Ok(boards.get(game_id).and_then(|history| history.last().cloned()))
    }
}

use async_trait::async_trait;
use sqlx::{postgres::PgRow, PgPool, Row};
use std::collections::HashMap;
use std::str::FromStr;
use tokio::sync::RwLock;
use tracing::{debug, instrument, warn};

use super::models::{ActionModel, GameModel, GameStatus, PlayerModel, WordModel};
use crate::bag::Language;
use crate::shared::AppError;

/// Storage of game rows. `update_game` is the compare-and-swap every
/// transition commits through.
#[async_trait]
pub trait GameRepository: Send + Sync {
    async fn create_game(&self, game: &GameModel) -> Result<(), AppError>;
    async fn get_game(&self, game_id: &str) -> Result<Option<GameModel>, AppError>;

    /// Replaces the stored game only if its version still equals
    /// `expected_version`; otherwise fails with `VersionConflict`
    async fn update_game(&self, game: &GameModel, expected_version: i64) -> Result<(), AppError>;

    async fn list_games(&self, status: Option<GameStatus>) -> Result<Vec<GameModel>, AppError>;
}

#[async_trait]
pub trait PlayerRepository: Send + Sync {
    async fn save_player(&self, player: &PlayerModel) -> Result<(), AppError>;
    /// Players that have not left, ordered by player number
    async fn list_active_players(&self, game_id: &str) -> Result<Vec<PlayerModel>, AppError>;
    async fn find_active_player(
        &self,
        game_id: &str,
        user_id: &str,
    ) -> Result<Option<PlayerModel>, AppError>;
}

#[async_trait]
pub trait WordRepository: Send + Sync {
    async fn append_word(&self, word: &WordModel) -> Result<(), AppError>;
    async fn list_words(&self, game_id: &str) -> Result<Vec<WordModel>, AppError>;
}

#[async_trait]
pub trait ActionRepository: Send + Sync {
    async fn append_action(&self, action: &ActionModel) -> Result<(), AppError>;
    /// Actions with an action counter strictly greater than `after`
    async fn actions_since(&self, game_id: &str, after: i64)
        -> Result<Vec<ActionModel>, AppError>;
}

/// In-memory implementation of GameRepository
pub struct InMemoryGameRepository {
    games: RwLock<HashMap<String, GameModel>>,
}

impl Default for InMemoryGameRepository {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryGameRepository {
    pub fn new() -> Self {
        Self {
            games: RwLock::new(HashMap::new()),
        }
    }
}

#[async_trait]
impl GameRepository for InMemoryGameRepository {
    #[instrument(skip(self, game), fields(game_id = %game.id))]
    async fn create_game(&self, game: &GameModel) -> Result<(), AppError> {
        let mut games = self.games.write().await;
        if games.contains_key(&game.id) {
            warn!("Game already exists in memory");
            return Err(AppError::DatabaseError("Game already exists".to_string()));
        }
        games.insert(game.id.clone(), game.clone());

        debug!("Game created in memory");
        Ok(())
    }

    async fn get_game(&self, game_id: &str) -> Result<Option<GameModel>, AppError> {
        let games = self.games.read().await;
        Ok(games.get(game_id).cloned())
    }

    #[instrument(skip(self, game), fields(game_id = %game.id, version = game.version))]
    async fn update_game(&self, game: &GameModel, expected_version: i64) -> Result<(), AppError> {
        let mut games = self.games.write().await;
        let stored = games
            .get_mut(&game.id)
            .ok_or_else(|| AppError::NotFound(format!("Game {} not found", game.id)))?;

        if stored.version != expected_version {
            debug!(
                expected = expected_version,
                actual = stored.version,
                "Stale game update rejected"
            );
            return Err(AppError::VersionConflict {
                expected: expected_version,
                actual: stored.version,
            });
        }

        *stored = game.clone();
        debug!(status = %game.status, "Game updated in memory");
        Ok(())
    }

    async fn list_games(&self, status: Option<GameStatus>) -> Result<Vec<GameModel>, AppError> {
        let games = self.games.read().await;
        let mut list: Vec<GameModel> = games
            .values()
            .filter(|game| status.map_or(true, |s| game.status == s))
            .cloned()
            .collect();
        list.sort_by_key(|game| game.created_at);
        Ok(list)
    }
}

/// In-memory implementation of PlayerRepository
pub struct InMemoryPlayerRepository {
    players: RwLock<HashMap<String, PlayerModel>>,
}

impl Default for InMemoryPlayerRepository {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryPlayerRepository {
    pub fn new() -> Self {
        Self {
            players: RwLock::new(HashMap::new()),
        }
    }
}

#[async_trait]
impl PlayerRepository for InMemoryPlayerRepository {
    #[instrument(skip(self, player), fields(game_id = %player.game_id, player_number = player.player_number))]
    async fn save_player(&self, player: &PlayerModel) -> Result<(), AppError> {
        let mut players = self.players.write().await;
        players.insert(player.id.clone(), player.clone());
        debug!(user_id = %player.user_id, score = player.score, "Player saved in memory");
        Ok(())
    }

    async fn list_active_players(&self, game_id: &str) -> Result<Vec<PlayerModel>, AppError> {
        let players = self.players.read().await;
        let mut list: Vec<PlayerModel> = players
            .values()
            .filter(|p| p.game_id == game_id && p.is_active())
            .cloned()
            .collect();
        list.sort_by_key(|p| p.player_number);
        Ok(list)
    }

    async fn find_active_player(
        &self,
        game_id: &str,
        user_id: &str,
    ) -> Result<Option<PlayerModel>, AppError> {
        let players = self.players.read().await;
        Ok(players
            .values()
            .find(|p| p.game_id == game_id && p.user_id == user_id && p.is_active())
            .cloned())
    }
}

/// In-memory implementation of WordRepository
#[derive(Default)]
pub struct InMemoryWordRepository {
    words: RwLock<Vec<WordModel>>,
}

impl InMemoryWordRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl WordRepository for InMemoryWordRepository {
    async fn append_word(&self, word: &WordModel) -> Result<(), AppError> {
        self.words.write().await.push(word.clone());
        Ok(())
    }

    async fn list_words(&self, game_id: &str) -> Result<Vec<WordModel>, AppError> {
        let words = self.words.read().await;
        Ok(words.iter().filter(|w| w.game_id == game_id).cloned().collect())
    }
}

/// In-memory implementation of ActionRepository
#[derive(Default)]
pub struct InMemoryActionRepository {
    actions: RwLock<HashMap<String, Vec<ActionModel>>>,
}

impl InMemoryActionRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ActionRepository for InMemoryActionRepository {
    #[instrument(skip(self, action), fields(game_id = %action.game_id, action = %action.action_type))]
    async fn append_action(&self, action: &ActionModel) -> Result<(), AppError> {
        let mut actions = self.actions.write().await;
        actions
            .entry(action.game_id.clone())
            .or_default()
            .push(action.clone());
        debug!(action_counter = action.action_counter, "Action recorded");
        Ok(())
    }

    async fn actions_since(
        &self,
        game_id: &str,
        after: i64,
    ) -> Result<Vec<ActionModel>, AppError> {
        let actions = self.actions.read().await;
        Ok(actions
            .get(game_id)
            .map(|log| {
                log.iter()
                    .filter(|a| a.action_counter > after)
                    .cloned()
                    .collect()
            })
            .unwrap_or_default())
    }
}

/// PostgreSQL implementation of GameRepository
pub struct PostgresGameRepository {
    pool: PgPool,
}

impl PostgresGameRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

const GAME_COLUMNS: &str = "id, owner_id, language, rows, columns, expected_player_count, \
     active_player_count, status, current_player_number, round_number, version, action_counter, \
     duration_seconds, consecutive_skips, created_at, started_at, ended_at";

fn database_error(error: sqlx::Error) -> AppError {
    warn!(error = %error, "Game query failed");
    AppError::DatabaseError(error.to_string())
}

fn game_from_row(row: &PgRow) -> Result<GameModel, AppError> {
    let language: String = row.try_get("language").map_err(database_error)?;
    let status: String = row.try_get("status").map_err(database_error)?;
    let int = |column: &str| row.try_get::<i32, _>(column).map_err(database_error);

    Ok(GameModel {
        id: row.try_get("id").map_err(database_error)?,
        owner_id: row.try_get("owner_id").map_err(database_error)?,
        language: Language::from_str(&language)
            .map_err(|e| AppError::DatabaseError(format!("language '{}': {}", language, e)))?,
        rows: int("rows")? as usize,
        columns: int("columns")? as usize,
        expected_player_count: int("expected_player_count")? as u32,
        active_player_count: int("active_player_count")? as u32,
        status: GameStatus::from_str(&status)
            .map_err(|e| AppError::DatabaseError(format!("status '{}': {}", status, e)))?,
        current_player_number: int("current_player_number")? as u32,
        round_number: int("round_number")? as u32,
        version: row.try_get("version").map_err(database_error)?,
        action_counter: row.try_get("action_counter").map_err(database_error)?,
        duration_seconds: row
            .try_get::<i64, _>("duration_seconds")
            .map_err(database_error)? as u64,
        consecutive_skips: int("consecutive_skips")? as u32,
        created_at: row.try_get("created_at").map_err(database_error)?,
        started_at: row.try_get("started_at").map_err(database_error)?,
        ended_at: row.try_get("ended_at").map_err(database_error)?,
    })
}

#[async_trait]
impl GameRepository for PostgresGameRepository {
    #[instrument(skip(self, game), fields(game_id = %game.id))]
    async fn create_game(&self, game: &GameModel) -> Result<(), AppError> {
        sqlx::query(&format!(
            "INSERT INTO games ({}) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16, $17)",
            GAME_COLUMNS
        ))
        .bind(&game.id)
        .bind(&game.owner_id)
        .bind(game.language.to_string())
        .bind(game.rows as i32)
        .bind(game.columns as i32)
        .bind(game.expected_player_count as i32)
        .bind(game.active_player_count as i32)
        .bind(game.status.to_string())
        .bind(game.current_player_number as i32)
        .bind(game.round_number as i32)
        .bind(game.version)
        .bind(game.action_counter)
        .bind(game.duration_seconds as i64)
        .bind(game.consecutive_skips as i32)
        .bind(game.created_at)
        .bind(game.started_at)
        .bind(game.ended_at)
        .execute(&self.pool)
        .await
        .map_err(database_error)?;

        debug!("Game created in database");
        Ok(())
    }

    #[instrument(skip(self))]
    async fn get_game(&self, game_id: &str) -> Result<Option<GameModel>, AppError> {
        let row = sqlx::query(&format!("SELECT {} FROM games WHERE id = $1", GAME_COLUMNS))
            .bind(game_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(database_error)?;

        row.as_ref().map(game_from_row).transpose()
    }

    #[instrument(skip(self, game), fields(game_id = %game.id, version = game.version))]
    async fn update_game(&self, game: &GameModel, expected_version: i64) -> Result<(), AppError> {
        let result = sqlx::query(
            "UPDATE games SET active_player_count = $2, status = $3, current_player_number = $4, \
             round_number = $5, version = $6, action_counter = $7, consecutive_skips = $8, \
             started_at = $9, ended_at = $10 WHERE id = $1 AND version = $11",
        )
        .bind(&game.id)
        .bind(game.active_player_count as i32)
        .bind(game.status.to_string())
        .bind(game.current_player_number as i32)
        .bind(game.round_number as i32)
        .bind(game.version)
        .bind(game.action_counter)
        .bind(game.consecutive_skips as i32)
        .bind(game.started_at)
        .bind(game.ended_at)
        .bind(expected_version)
        .execute(&self.pool)
        .await
        .map_err(database_error)?;

        if result.rows_affected() == 0 {
            // Either the game is gone or someone else committed first
            let current: Option<i64> = sqlx::query("SELECT version FROM games WHERE id = $1")
                .bind(&game.id)
                .fetch_optional(&self.pool)
                .await
                .map_err(database_error)?
                .map(|row| row.try_get("version"))
                .transpose()
                .map_err(database_error)?;

            return match current {
                Some(actual) => {
                    debug!(expected = expected_version, actual, "Stale game update rejected");
                    Err(AppError::VersionConflict {
                        expected: expected_version,
                        actual,
                    })
                }
                None => Err(AppError::NotFound(format!("Game {} not found", game.id))),
            };
        }

        debug!(status = %game.status, "Game updated in database");
        Ok(())
    }

    #[instrument(skip(self))]
    async fn list_games(&self, status: Option<GameStatus>) -> Result<Vec<GameModel>, AppError> {
        let rows = match status {
            Some(status) => {
                sqlx::query(&format!(
                    "SELECT {} FROM games WHERE status = $1 ORDER BY created_at",
                    GAME_COLUMNS
                ))
                .bind(status.to_string())
                .fetch_all(&self.pool)
                .await
            }
            None => {
                sqlx::query(&format!(
                    "SELECT {} FROM games ORDER BY created_at",
                    GAME_COLUMNS
                ))
                .fetch_all(&self.pool)
                .await
            }
        }
        .map_err(database_error)?;

        rows.iter().map(game_from_row).collect()
    }
}

use async_trait::async_trait;
use chrono::Utc;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{Mutex as AsyncMutex, RwLock};
use tracing::{debug, info, instrument};
use uuid::Uuid;

use super::{
    models::{ActionModel, ActionType, GameModel, GameStatus, PlayerModel, WordModel},
    repository::{
        ActionRepository, GameRepository, InMemoryActionRepository, InMemoryGameRepository,
        InMemoryPlayerRepository, InMemoryWordRepository, PlayerRepository, WordRepository,
    },
    types::{ChatMessage, CreateGameRequest},
};
use crate::{
    bag::{BagRepository, InMemoryBagRepository, TileBag},
    board::{BoardRepository, InMemoryBoardRepository, VirtualBoard},
    config::GameConfig,
    dictionary::Dictionary,
    event::{EventPublisher, GameEvent},
    rack::{InMemoryRackRepository, RackRepository, VirtualRack, RACK_SIZE},
    scheduler::{ScheduledAction, ScheduledActionHandler, SchedulerWorker, TurnScheduler},
    score::{BonusRule, ScoreEngine},
    shared::AppError,
};

/// The turn and game state machine. Every mutation commits through the
/// game repository's version check before any other state is written.
pub struct GameService {
    pub(super) games: Arc<dyn GameRepository>,
    pub(super) players: Arc<dyn PlayerRepository>,
    pub(super) words: Arc<dyn WordRepository>,
    pub(super) actions: Arc<dyn ActionRepository>,
    pub(super) boards: Arc<dyn BoardRepository>,
    pub(super) racks: Arc<dyn RackRepository>,
    pub(super) bags: Arc<dyn BagRepository>,
    pub(super) dictionary: Arc<dyn Dictionary>,
    pub(super) publisher: Arc<dyn EventPublisher>,
    pub(super) scheduler: TurnScheduler,
    pub(super) scorer: ScoreEngine,
    pub(super) config: GameConfig,
    /// One lock per (game, player) held from reading a rack to appending its successor
    rack_mutexes: RwLock<HashMap<(String, u32), Arc<AsyncMutex<()>>>>,
}

impl GameService {
    pub fn builder(
        dictionary: Arc<dyn Dictionary>,
        publisher: Arc<dyn EventPublisher>,
    ) -> GameServiceBuilder {
        GameServiceBuilder::new(dictionary, publisher)
    }

    pub fn config(&self) -> &GameConfig {
        &self.config
    }

    pub fn scheduler(&self) -> &TurnScheduler {
        &self.scheduler
    }

    #[instrument(skip(self, request), fields(owner_id = %request.owner_id))]
    pub async fn create_game(&self, request: CreateGameRequest) -> Result<GameModel, AppError> {
        if request.owner_id.trim().is_empty() {
            return Err(AppError::BadRequest("Owner id cannot be empty".to_string()));
        }

        let size = self.config.default_board_size;
        let game = GameModel::new(
            &Uuid::new_v4().to_string(),
            request.owner_id.trim(),
            request.language,
            request.rows.unwrap_or(size),
            request.columns.unwrap_or(size),
            request.expected_player_count,
            request
                .duration_seconds
                .unwrap_or(self.config.default_turn_duration_secs),
        )?;

        self.games.create_game(&game).await?;
        self.players
            .save_player(&PlayerModel::new(&game.id, &game.owner_id, 1))
            .await?;
        self.record(ActionModel::record(&game, ActionType::Create).by(&game.owner_id, 1))
            .await?;

        self.scheduler
            .schedule_terminate_game(&game.id, self.config.waiting_timeout);

        info!(
            game_id = %game.id,
            language = %game.language,
            expected_players = game.expected_player_count,
            "Game created"
        );
        Ok(game)
    }

    #[instrument(skip(self))]
    pub async fn join_game(&self, game_id: &str, user_id: &str) -> Result<GameModel, AppError> {
        let game = self.load_game(game_id).await?;

        if self
            .players
            .find_active_player(game_id, user_id)
            .await?
            .is_some()
        {
            return Err(AppError::InvalidState(
                "User is already in the game".to_string(),
            ));
        }

        let next = game.with_joined_player()?;
        self.games.update_game(&next, game.version).await?;

        let player_number = next.active_player_count;
        self.players
            .save_player(&PlayerModel::new(game_id, user_id, player_number))
            .await?;
        self.record(ActionModel::record(&next, ActionType::Join).by(user_id, player_number))
            .await?;

        if next.status == GameStatus::ReadyToStart {
            info!(game_id = %game_id, "All players joined, start scheduled");
            self.scheduler.schedule_start_game(game_id);
        }

        info!(game_id = %game_id, player_number, "Player joined game");
        Ok(next)
    }

    #[instrument(skip(self))]
    pub async fn leave_game(&self, game_id: &str, user_id: &str) -> Result<GameModel, AppError> {
        let game = self.load_game(game_id).await?;

        if game.is_owner(user_id) {
            return Err(AppError::NotAuthorized(
                "The owner cannot leave the game".to_string(),
            ));
        }
        let mut player = self
            .players
            .find_active_player(game_id, user_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Player is not in the game".to_string()))?;

        let next = game.with_left_player()?;
        self.games.update_game(&next, game.version).await?;

        let left_number = player.player_number;
        player.left_at = Some(Utc::now());
        self.players.save_player(&player).await?;

        // Keep numbering contiguous for the players still seated
        for mut other in self.players.list_active_players(game_id).await? {
            if other.player_number > left_number {
                other.player_number -= 1;
                self.players.save_player(&other).await?;
            }
        }

        self.record(ActionModel::record(&next, ActionType::Leave).by(user_id, left_number))
            .await?;

        info!(game_id = %game_id, player_number = left_number, "Player left game");
        Ok(next)
    }

    #[instrument(skip(self))]
    pub async fn start_game(&self, game_id: &str) -> Result<GameModel, AppError> {
        let game = self.load_game(game_id).await?;
        let next = game.started()?;
        self.games.update_game(&next, game.version).await?;

        self.bags
            .create_bag(TileBag::standard(game_id, next.language))
            .await?;
        self.boards
            .append_board(VirtualBoard::new(
                game_id,
                next.version,
                next.rows,
                next.columns,
            )?)
            .await?;

        for player in self.players.list_active_players(game_id).await? {
            let letters = self.bags.draw_tiles(game_id, RACK_SIZE).await?;
            let rack = VirtualRack::from_letters(
                game_id,
                player.player_number,
                next.round_number,
                letters,
            );
            debug!(player_number = player.player_number, letters = %rack.letters(), "Rack dealt");
            self.racks.append_rack(rack).await?;
        }

        self.record(ActionModel::record(&next, ActionType::Start))
            .await?;
        self.arm_next_turn(&next);

        info!(game_id = %game_id, players = next.expected_player_count, "Game started");
        Ok(next)
    }

    #[instrument(skip(self))]
    pub async fn end_game(&self, game_id: &str) -> Result<GameModel, AppError> {
        let game = self.load_game(game_id).await?;
        let next = game.ended()?;
        self.games.update_game(&next, game.version).await?;
        self.scheduler.cancel_skip_turn(game_id, game.version);

        self.record(ActionModel::record(&next, ActionType::End))
            .await?;
        self.release_game(game_id).await;

        info!(game_id = %game_id, rounds = next.round_number, "Game ended");
        Ok(next)
    }

    #[instrument(skip(self))]
    pub async fn terminate_game(
        &self,
        game_id: &str,
        user_id: &str,
    ) -> Result<GameModel, AppError> {
        let game = self.load_game(game_id).await?;
        let next = game.terminated(user_id)?;
        self.games.update_game(&next, game.version).await?;
        self.scheduler.cancel_skip_turn(game_id, game.version);

        self.record(ActionModel::record(&next, ActionType::Terminate).by(user_id, 1))
            .await?;
        self.release_game(game_id).await;

        info!(game_id = %game_id, previous_status = %game.status, "Game terminated");
        Ok(next)
    }

    /// Lobby timeout. Games that got under way are left alone.
    #[instrument(skip(self))]
    pub async fn expire_waiting_game(&self, game_id: &str) -> Result<Option<GameModel>, AppError> {
        let game = self.load_game(game_id).await?;
        let Some(next) = game.expired() else {
            debug!(status = %game.status, "Game no longer waiting, nothing to expire");
            return Ok(None);
        };
        self.games.update_game(&next, game.version).await?;

        self.record(ActionModel::record(&next, ActionType::Terminate))
            .await?;
        self.release_game(game_id).await;

        info!(game_id = %game_id, "Waiting game expired");
        Ok(Some(next))
    }

    pub async fn get_game(&self, game_id: &str) -> Result<GameModel, AppError> {
        self.load_game(game_id).await
    }

    pub async fn list_games(&self, status: Option<GameStatus>) -> Result<Vec<GameModel>, AppError> {
        let games = self.games.list_games(status).await?;
        Ok(games
            .into_iter()
            .filter(|game| !game.status.is_removed())
            .collect())
    }

    /// Board as of `version`, or the latest one. Before the first move is
    /// stored this is the empty board.
    pub async fn get_current_board(
        &self,
        game_id: &str,
        version: Option<i64>,
    ) -> Result<VirtualBoard, AppError> {
        let game = self.load_game(game_id).await?;
        let version = version.unwrap_or(game.version);

        match self.boards.get_board(game_id, version).await? {
            Some(board) => Ok(board),
            None => VirtualBoard::new(game_id, version, game.rows, game.columns),
        }
    }

    /// Rack held in `round`, or the most recent one
    pub async fn get_current_rack(
        &self,
        game_id: &str,
        player_number: u32,
        round: Option<u32>,
    ) -> Result<VirtualRack, AppError> {
        self.load_game(game_id).await?;
        self.racks
            .get_rack(game_id, player_number, round.unwrap_or(u32::MAX))
            .await?
            .ok_or_else(|| {
                AppError::NotFound(format!(
                    "No rack for player {} in game {}",
                    player_number, game_id
                ))
            })
    }

    pub async fn list_players(&self, game_id: &str) -> Result<Vec<PlayerModel>, AppError> {
        self.load_game(game_id).await?;
        self.players.list_active_players(game_id).await
    }

    pub async fn list_words(&self, game_id: &str) -> Result<Vec<WordModel>, AppError> {
        self.load_game(game_id).await?;
        self.words.list_words(game_id).await
    }

    /// Actions recorded after the poller's last seen action counter
    pub async fn actions_since(
        &self,
        game_id: &str,
        since: i64,
    ) -> Result<Vec<ActionModel>, AppError> {
        self.load_game(game_id).await?;
        self.actions.actions_since(game_id, since).await
    }

    #[instrument(skip(self, message))]
    pub async fn post_chat(
        &self,
        game_id: &str,
        user_id: &str,
        message: &str,
    ) -> Result<ChatMessage, AppError> {
        let game = self.load_game(game_id).await?;
        if game.status.is_closed() {
            return Err(AppError::InvalidState("Game is over".to_string()));
        }
        if self
            .players
            .find_active_player(game_id, user_id)
            .await?
            .is_none()
        {
            return Err(AppError::NotAuthorized(
                "Only players can chat in a game".to_string(),
            ));
        }
        let message = message.trim();
        if message.is_empty() {
            return Err(AppError::BadRequest("Message cannot be empty".to_string()));
        }

        let chat = ChatMessage {
            game_id: game_id.to_string(),
            user_id: user_id.to_string(),
            message: message.to_string(),
            sent_at: Utc::now(),
        };
        self.publisher
            .publish(GameEvent::ChatPosted {
                game_id: chat.game_id.clone(),
                user_id: chat.user_id.clone(),
                message: chat.message.clone(),
                sent_at: chat.sent_at,
            })
            .await;

        debug!(length = chat.message.len(), "Chat message posted");
        Ok(chat)
    }

    /// Fetches a game, hiding terminated and deleted ones
    pub(super) async fn load_game(&self, game_id: &str) -> Result<GameModel, AppError> {
        self.games
            .get_game(game_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Game {} not found", game_id)))?
            .ensure_visible()
    }

    pub(super) async fn record(&self, action: ActionModel) -> Result<(), AppError> {
        self.actions.append_action(&action).await?;
        self.publisher
            .publish(GameEvent::ActionRecorded {
                game_id: action.game_id.clone(),
                action,
            })
            .await;
        Ok(())
    }

    /// Lock guarding one player's rack snapshots
    pub(super) async fn rack_lock(&self, game_id: &str, player_number: u32) -> Arc<AsyncMutex<()>> {
        let key = (game_id.to_string(), player_number);
        {
            let guard = self.rack_mutexes.read().await;
            if let Some(lock) = guard.get(&key) {
                return lock.clone();
            }
        }

        let mut guard = self.rack_mutexes.write().await;
        guard
            .entry(key)
            .or_insert_with(|| Arc::new(AsyncMutex::new(())))
            .clone()
    }

    /// Drops what a finished game keeps in memory: its event channel and rack locks
    async fn release_game(&self, game_id: &str) {
        self.publisher.close(game_id).await;
        self.rack_mutexes
            .write()
            .await
            .retain(|(game, _), _| game != game_id);
        debug!(game_id = %game_id, "Game resources released");
    }

    /// Arms the timer of the player now holding the turn, or the end of the game
    pub(super) fn arm_next_turn(&self, game: &GameModel) {
        if game.status == GameStatus::ReadyToEnd {
            self.scheduler.schedule_end_game(&game.id);
        } else if game.status.is_playable() {
            self.scheduler.schedule_skip_turn(
                &game.id,
                game.version,
                Duration::from_secs(game.duration_seconds),
            );
        }
    }
}

#[async_trait]
impl ScheduledActionHandler for GameService {
    async fn handle_scheduled(&self, action: ScheduledAction) -> Result<(), AppError> {
        match action {
            ScheduledAction::SkipTurn { game_id, version } => {
                self.skip_turn(&game_id, version).await?;
            }
            ScheduledAction::StartGame { game_id } => {
                if self.load_game(&game_id).await?.status == GameStatus::ReadyToStart {
                    self.start_game(&game_id).await?;
                }
            }
            ScheduledAction::EndGame { game_id } => {
                if self.load_game(&game_id).await?.status == GameStatus::ReadyToEnd {
                    self.end_game(&game_id).await?;
                }
            }
            ScheduledAction::TerminateGame { game_id } => {
                match self.expire_waiting_game(&game_id).await {
                    Ok(_) => {}
                    // Already closed by its owner
                    Err(AppError::NotFound(_)) => {}
                    Err(e) => return Err(e),
                }
            }
        }
        Ok(())
    }
}

/// Wires the service to its collaborators. Storage defaults to the
/// in-memory repositories.
pub struct GameServiceBuilder {
    dictionary: Arc<dyn Dictionary>,
    publisher: Arc<dyn EventPublisher>,
    games: Arc<dyn GameRepository>,
    players: Arc<dyn PlayerRepository>,
    words: Arc<dyn WordRepository>,
    actions: Arc<dyn ActionRepository>,
    boards: Arc<dyn BoardRepository>,
    racks: Arc<dyn RackRepository>,
    bags: Arc<dyn BagRepository>,
    bonus_rules: Vec<Arc<dyn BonusRule>>,
    config: GameConfig,
}

impl GameServiceBuilder {
    pub fn new(dictionary: Arc<dyn Dictionary>, publisher: Arc<dyn EventPublisher>) -> Self {
        Self {
            dictionary,
            publisher,
            games: Arc::new(InMemoryGameRepository::new()),
            players: Arc::new(InMemoryPlayerRepository::new()),
            words: Arc::new(InMemoryWordRepository::new()),
            actions: Arc::new(InMemoryActionRepository::new()),
            boards: Arc::new(InMemoryBoardRepository::new()),
            racks: Arc::new(InMemoryRackRepository::new()),
            bags: Arc::new(InMemoryBagRepository::new()),
            bonus_rules: Vec::new(),
            config: GameConfig::default(),
        }
    }

    pub fn with_config(mut self, config: GameConfig) -> Self {
        self.config = config;
        self
    }

    pub fn with_game_repository(mut self, games: Arc<dyn GameRepository>) -> Self {
        self.games = games;
        self
    }

    pub fn with_bag_repository(mut self, bags: Arc<dyn BagRepository>) -> Self {
        self.bags = bags;
        self
    }

    /// Extra bonus rule on top of the built-in ones
    pub fn with_bonus_rule(mut self, rule: Arc<dyn BonusRule>) -> Self {
        self.bonus_rules.push(rule);
        self
    }

    /// Builds the service and spawns the worker that runs its timers
    pub fn start(self) -> Arc<GameService> {
        let (scheduler, receiver) = TurnScheduler::new(self.config.deferred_delay);

        let mut scorer = ScoreEngine::with_default_rules(&self.config);
        for rule in self.bonus_rules {
            scorer.add_rule(rule);
        }

        let service = Arc::new(GameService {
            games: self.games,
            players: self.players,
            words: self.words,
            actions: self.actions,
            boards: self.boards,
            racks: self.racks,
            bags: self.bags,
            dictionary: self.dictionary,
            publisher: self.publisher,
            scheduler,
            scorer,
            config: self.config,
            rack_mutexes: RwLock::new(HashMap::new()),
        });

        let handler: Arc<dyn ScheduledActionHandler> = service.clone();
        SchedulerWorker::new(receiver, Arc::downgrade(&handler)).start();

        service
    }
}

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

use wordtiles::{
    bag::{BagRepository, InMemoryBagRepository, Language},
    dictionary::Dictionary,
    game::{CreateGameRequest, GameModel, GameService},
    rack::VirtualRack,
    AppError, GameConfig,
};

use super::mocks::{AnyWordDictionary, RecordingPublisher, SmallBagRepository};

// ============================================================================
// Test Setup Infrastructure
// ============================================================================

pub struct TestSetup {
    pub service: Arc<GameService>,
    pub publisher: RecordingPublisher,
    pub bags: Arc<dyn BagRepository>,
    pub game_id: String,
    pub players: Vec<String>,
}

impl TestSetup {
    pub async fn game(&self) -> GameModel {
        self.service.get_game(&self.game_id).await.unwrap()
    }

    pub async fn start(&self) -> GameModel {
        self.service.start_game(&self.game_id).await.unwrap()
    }

    /// User id of the player whose turn it is
    pub async fn current_user(&self) -> String {
        let game = self.game().await;
        self.players[game.current_player_number as usize - 1].clone()
    }

    /// Latest rack of a player, which is the one they play from on their turn
    pub async fn rack_of(&self, player_number: u32) -> VirtualRack {
        self.service
            .get_current_rack(&self.game_id, player_number, None)
            .await
            .unwrap()
    }

    pub async fn remaining_tiles(&self) -> u32 {
        self.bags.remaining(&self.game_id).await.unwrap()
    }

    /// How many of each letter sit in the bag, the racks and on the board
    pub async fn tile_census(&self) -> BTreeMap<char, u32> {
        let mut census = BTreeMap::new();

        let bag = self.bags.get_bag(&self.game_id).await.unwrap().unwrap();
        for (letter, stock) in &bag.letters {
            *census.entry(*letter).or_insert(0) += stock.count;
        }
        for number in 1..=self.players.len() as u32 {
            for tile in self.rack_of(number).await.tiles {
                *census.entry(tile.letter).or_insert(0) += 1;
            }
        }
        let board = self
            .service
            .get_current_board(&self.game_id, None)
            .await
            .unwrap();
        for letter in board.cells.iter().filter_map(|cell| cell.letter) {
            *census.entry(letter).or_insert(0) += 1;
        }
        census
    }
}

/// Letter counts of a fresh English bag
pub fn english_census() -> BTreeMap<char, u32> {
    Language::English
        .distribution()
        .iter()
        .map(|&(letter, count, _)| (letter, count))
        .collect()
}

pub struct TestSetupBuilder {
    players: Vec<String>,
    config: GameConfig,
    dictionary: Arc<dyn Dictionary>,
    bag_capacity: Option<u32>,
    duration_seconds: u64,
}

impl TestSetupBuilder {
    pub fn new() -> Self {
        Self {
            players: vec![],
            config: GameConfig {
                deferred_delay: Duration::from_millis(50),
                ..GameConfig::default()
            },
            dictionary: Arc::new(AnyWordDictionary::new()),
            bag_capacity: None,
            duration_seconds: 600,
        }
    }

    pub fn with_players(mut self, players: Vec<&str>) -> Self {
        self.players = players.into_iter().map(|s| s.to_string()).collect();
        self
    }

    pub fn with_two_players(self) -> Self {
        self.with_players(vec!["alice", "bob"])
    }

    pub fn with_dictionary(mut self, dictionary: Arc<dyn Dictionary>) -> Self {
        self.dictionary = dictionary;
        self
    }

    pub fn with_bag_capacity(mut self, capacity: u32) -> Self {
        self.bag_capacity = Some(capacity);
        self
    }

    pub fn with_turn_duration(mut self, seconds: u64) -> Self {
        self.duration_seconds = seconds;
        self
    }

    pub fn with_config(mut self, config: GameConfig) -> Self {
        self.config = config;
        self
    }

    /// Creates the game with the first player as owner. With `expected`
    /// larger than the players given, the game stays in the lobby.
    pub async fn build_with_expected(self, expected: u32) -> TestSetup {
        let publisher = RecordingPublisher::new();
        let bags: Arc<dyn BagRepository> = match self.bag_capacity {
            Some(capacity) => Arc::new(SmallBagRepository::new(capacity)),
            None => Arc::new(InMemoryBagRepository::with_seed(42)),
        };

        let service = GameService::builder(self.dictionary, Arc::new(publisher.clone()))
            .with_config(self.config)
            .with_bag_repository(bags.clone())
            .start();

        let owner = self.players.first().cloned().unwrap_or_else(|| "owner".to_string());
        let game = service
            .create_game(CreateGameRequest {
                owner_id: owner,
                language: Default::default(),
                rows: None,
                columns: None,
                expected_player_count: expected,
                duration_seconds: Some(self.duration_seconds),
            })
            .await
            .unwrap();

        for player in self.players.iter().skip(1) {
            service.join_game(&game.id, player).await.unwrap();
        }

        TestSetup {
            service,
            publisher,
            bags,
            game_id: game.id,
            players: self.players,
        }
    }

    pub async fn build(self) -> TestSetup {
        let expected = self.players.len() as u32;
        self.build_with_expected(expected).await
    }

    /// Builds the game and starts it without waiting for the deferred start
    pub async fn build_started(self) -> TestSetup {
        let setup = self.build().await;
        setup.start().await;
        setup
    }
}

/// Expect a specific error variant
pub fn expect_err<T: std::fmt::Debug>(result: Result<T, AppError>) -> AppError {
    match result {
        Ok(value) => panic!("expected an error, got {:?}", value),
        Err(e) => e,
    }
}

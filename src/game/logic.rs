//! Pure status transitions of a game.
//!
//! Every transition works on a copy and returns the next state with the
//! version and action counter bumped; nothing here touches storage.

use chrono::Utc;

use super::models::{GameModel, GameStatus, MAX_PLAYERS, MIN_PLAYERS};
use crate::bag::Language;
use crate::board::{MAX_BOARD_SIZE, MIN_BOARD_SIZE};
use crate::shared::AppError;

/// How the current player gave up the turn
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TurnEnd {
    /// A scored move; `bag_empty` is whether the bag ran dry on the refill
    Played { bag_empty: bool },
    /// The turn timer expired
    Skipped,
}

impl GameModel {
    pub fn new(
        id: &str,
        owner_id: &str,
        language: Language,
        rows: usize,
        columns: usize,
        expected_player_count: u32,
        duration_seconds: u64,
    ) -> Result<Self, AppError> {
        if !(MIN_PLAYERS..=MAX_PLAYERS).contains(&expected_player_count) {
            return Err(AppError::BadRequest(format!(
                "A game needs between {} and {} players, got {}",
                MIN_PLAYERS, MAX_PLAYERS, expected_player_count
            )));
        }
        let sizes = MIN_BOARD_SIZE..=MAX_BOARD_SIZE;
        if !sizes.contains(&rows) || !sizes.contains(&columns) {
            return Err(AppError::BadRequest(format!(
                "Board must be between {} and {} cells per side",
                MIN_BOARD_SIZE, MAX_BOARD_SIZE
            )));
        }
        if duration_seconds == 0 {
            return Err(AppError::BadRequest(
                "Turn duration must be positive".to_string(),
            ));
        }

        Ok(Self {
            id: id.to_string(),
            owner_id: owner_id.to_string(),
            language,
            rows,
            columns,
            expected_player_count,
            active_player_count: 1,
            status: GameStatus::Waiting,
            current_player_number: 1,
            round_number: 0,
            version: 1,
            action_counter: 1,
            duration_seconds,
            consecutive_skips: 0,
            created_at: Utc::now(),
            started_at: None,
            ended_at: None,
        })
    }

    pub fn is_owner(&self, user_id: &str) -> bool {
        self.owner_id == user_id
    }

    /// Terminated and deleted games behave as if they did not exist
    pub fn ensure_visible(self) -> Result<Self, AppError> {
        if self.status.is_removed() {
            return Err(AppError::NotFound(format!("Game {} not found", self.id)));
        }
        Ok(self)
    }

    pub fn ensure_playable(&self) -> Result<(), AppError> {
        match self.status {
            status if status.is_playable() => Ok(()),
            GameStatus::Waiting | GameStatus::ReadyToStart => {
                Err(AppError::InvalidState("Game is waiting".to_string()))
            }
            status => Err(AppError::InvalidState(format!(
                "Game is {}",
                status.to_string().to_lowercase()
            ))),
        }
    }

    fn bumped(&self) -> Self {
        let mut next = self.clone();
        next.version += 1;
        next.action_counter += 1;
        next
    }

    pub fn with_joined_player(&self) -> Result<Self, AppError> {
        if self.status != GameStatus::Waiting {
            return Err(AppError::InvalidState("Game is in progress".to_string()));
        }
        if self.active_player_count >= self.expected_player_count {
            return Err(AppError::InvalidState("Game is full".to_string()));
        }

        let mut next = self.bumped();
        next.active_player_count += 1;
        if next.active_player_count == next.expected_player_count {
            next.status = GameStatus::ReadyToStart;
        }
        Ok(next)
    }

    pub fn with_left_player(&self) -> Result<Self, AppError> {
        if self.status != GameStatus::Waiting {
            return Err(AppError::InvalidState("Game is in progress".to_string()));
        }

        let mut next = self.bumped();
        next.active_player_count = next.active_player_count.saturating_sub(1).max(1);
        Ok(next)
    }

    pub fn started(&self) -> Result<Self, AppError> {
        match self.status {
            GameStatus::ReadyToStart => {}
            GameStatus::Waiting => {
                return Err(AppError::InvalidState("Game is waiting".to_string()))
            }
            GameStatus::InProgress | GameStatus::LastRound | GameStatus::ReadyToEnd => {
                return Err(AppError::InvalidState("Game is in progress".to_string()))
            }
            status => {
                return Err(AppError::InvalidState(format!(
                    "Game cannot start from {}",
                    status
                )))
            }
        }

        let mut next = self.bumped();
        next.status = GameStatus::InProgress;
        next.round_number = 1;
        next.current_player_number = 1;
        next.consecutive_skips = 0;
        next.started_at = Some(Utc::now());
        Ok(next)
    }

    /// Hands the turn to the next player.
    ///
    /// `skip_threshold` consecutive skips end the game early. In the last
    /// round the move of the highest numbered player ends the game.
    pub fn advanced(&self, turn: TurnEnd, skip_threshold: u32) -> Result<Self, AppError> {
        self.ensure_playable()?;

        let players = self.expected_player_count.max(1);
        let mover = self.current_player_number;
        let mut next = self.bumped();

        next.current_player_number = mover % players + 1;
        if mover >= players {
            next.round_number += 1;
        }

        next.consecutive_skips = match turn {
            TurnEnd::Played { .. } => 0,
            TurnEnd::Skipped => self.consecutive_skips + 1,
        };

        let bag_empty = matches!(turn, TurnEnd::Played { bag_empty: true });
        next.status = if next.consecutive_skips >= skip_threshold {
            GameStatus::ReadyToEnd
        } else if self.status == GameStatus::LastRound && mover >= players {
            GameStatus::ReadyToEnd
        } else if self.status == GameStatus::InProgress && bag_empty {
            GameStatus::LastRound
        } else {
            self.status
        };

        Ok(next)
    }

    pub fn ended(&self) -> Result<Self, AppError> {
        if self.status != GameStatus::ReadyToEnd {
            return Err(AppError::InvalidState(format!(
                "Game cannot end from {}",
                self.status
            )));
        }

        let mut next = self.bumped();
        next.status = GameStatus::Ended;
        next.ended_at = Some(Utc::now());
        Ok(next)
    }

    pub fn terminated(&self, user_id: &str) -> Result<Self, AppError> {
        if !self.is_owner(user_id) {
            return Err(AppError::NotAuthorized(
                "Only the owner can terminate a game".to_string(),
            ));
        }
        if self.status == GameStatus::InProgress {
            return Err(AppError::InvalidState("Game is in progress".to_string()));
        }
        if self.status.is_closed() {
            return Err(AppError::InvalidState(format!(
                "Game is already {}",
                self.status
            )));
        }

        Ok(self.closed_as_terminated())
    }

    /// Lobby timeout: only a game still waiting for players is closed
    pub fn expired(&self) -> Option<Self> {
        (self.status == GameStatus::Waiting).then(|| self.closed_as_terminated())
    }

    fn closed_as_terminated(&self) -> Self {
        let mut next = self.bumped();
        next.status = GameStatus::Terminated;
        next.ended_at = Some(Utc::now());
        next
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn waiting_game(expected: u32) -> GameModel {
        GameModel::new("g", "owner", Language::English, 15, 15, expected, 60).unwrap()
    }

    fn running_game(expected: u32) -> GameModel {
        let mut game = waiting_game(expected);
        for _ in 1..expected {
            game = game.with_joined_player().unwrap();
        }
        game.started().unwrap()
    }

    #[rstest]
    #[case(1)]
    #[case(5)]
    fn rejects_player_counts_outside_range(#[case] expected: u32) {
        let result = GameModel::new("g", "owner", Language::English, 15, 15, expected, 60);
        assert!(matches!(result, Err(AppError::BadRequest(_))));
    }

    #[test]
    fn new_game_waits_with_owner_seated() {
        let game = waiting_game(3);
        assert_eq!(game.status, GameStatus::Waiting);
        assert_eq!(game.active_player_count, 1);
        assert_eq!(game.version, 1);
        assert_eq!(game.action_counter, 1);
    }

    #[test]
    fn last_join_makes_game_ready() {
        let game = waiting_game(3).with_joined_player().unwrap();
        assert_eq!(game.status, GameStatus::Waiting);

        let game = game.with_joined_player().unwrap();
        assert_eq!(game.status, GameStatus::ReadyToStart);
        assert_eq!(game.active_player_count, 3);
        assert_eq!(game.version, 3);

        assert!(matches!(
            game.with_joined_player(),
            Err(AppError::InvalidState(_))
        ));
    }

    #[test]
    fn start_messages_name_the_blocking_status() {
        assert_eq!(
            waiting_game(2).started().unwrap_err(),
            AppError::InvalidState("Game is waiting".to_string())
        );
        assert_eq!(
            running_game(2).started().unwrap_err(),
            AppError::InvalidState("Game is in progress".to_string())
        );
    }

    #[test]
    fn start_seats_player_one_in_round_one() {
        let game = running_game(2);
        assert_eq!(game.status, GameStatus::InProgress);
        assert_eq!(game.round_number, 1);
        assert_eq!(game.current_player_number, 1);
        assert!(game.started_at.is_some());
    }

    #[rstest]
    #[case(2, 1, 2, 1)]
    #[case(2, 2, 1, 2)]
    #[case(4, 3, 4, 1)]
    #[case(4, 4, 1, 2)]
    fn turn_rotates_and_wraps_rounds(
        #[case] players: u32,
        #[case] mover: u32,
        #[case] next_player: u32,
        #[case] next_round: u32,
    ) {
        let mut game = running_game(players);
        game.current_player_number = mover;

        let next = game
            .advanced(TurnEnd::Played { bag_empty: false }, 100)
            .unwrap();
        assert_eq!(next.current_player_number, next_player);
        assert_eq!(next.round_number, next_round);
        assert_eq!(next.version, game.version + 1);
        assert_eq!(next.action_counter, game.action_counter + 1);
    }

    #[test]
    fn empty_bag_opens_last_round_then_last_player_ends_it() {
        let game = running_game(2)
            .advanced(TurnEnd::Played { bag_empty: true }, 100)
            .unwrap();
        assert_eq!(game.status, GameStatus::LastRound);
        assert_eq!(game.current_player_number, 2);

        // Player 2 closes the round in which the bag emptied
        let game = game.advanced(TurnEnd::Skipped, 100).unwrap();
        assert_eq!(game.status, GameStatus::ReadyToEnd);
    }

    #[test]
    fn skips_reaching_threshold_force_the_end() {
        let mut game = running_game(2);
        for _ in 0..3 {
            game = game.advanced(TurnEnd::Skipped, 4).unwrap();
            assert_eq!(game.status, GameStatus::InProgress);
        }
        let game = game.advanced(TurnEnd::Skipped, 4).unwrap();
        assert_eq!(game.consecutive_skips, 4);
        assert_eq!(game.status, GameStatus::ReadyToEnd);
    }

    #[test]
    fn play_resets_skip_counter() {
        let game = running_game(2)
            .advanced(TurnEnd::Skipped, 4)
            .unwrap()
            .advanced(TurnEnd::Skipped, 4)
            .unwrap()
            .advanced(TurnEnd::Played { bag_empty: false }, 4)
            .unwrap();
        assert_eq!(game.consecutive_skips, 0);
    }

    #[test]
    fn ready_to_end_refuses_moves() {
        let mut game = running_game(2);
        game.status = GameStatus::ReadyToEnd;
        assert!(matches!(
            game.advanced(TurnEnd::Skipped, 4),
            Err(AppError::InvalidState(_))
        ));

        let ended = game.ended().unwrap();
        assert_eq!(ended.status, GameStatus::Ended);
        assert!(ended.ended_at.is_some());
    }

    #[test]
    fn end_requires_ready_to_end() {
        assert!(running_game(2).ended().is_err());
    }

    #[rstest]
    #[case(GameStatus::Waiting, true)]
    #[case(GameStatus::ReadyToStart, true)]
    #[case(GameStatus::LastRound, true)]
    #[case(GameStatus::ReadyToEnd, true)]
    #[case(GameStatus::InProgress, false)]
    #[case(GameStatus::Ended, false)]
    #[case(GameStatus::Terminated, false)]
    fn terminate_is_refused_while_playing(#[case] status: GameStatus, #[case] allowed: bool) {
        let mut game = waiting_game(2);
        game.status = status;
        assert_eq!(game.terminated("owner").is_ok(), allowed);
    }

    #[test]
    fn only_owner_terminates() {
        assert!(matches!(
            waiting_game(2).terminated("guest"),
            Err(AppError::NotAuthorized(_))
        ));
    }

    #[test]
    fn expiry_only_applies_to_waiting_games() {
        assert_eq!(
            waiting_game(2).expired().map(|g| g.status),
            Some(GameStatus::Terminated)
        );
        assert!(running_game(2).expired().is_none());
    }

    #[test]
    fn removed_games_are_not_found() {
        let game = waiting_game(2).terminated("owner").unwrap();
        assert!(matches!(game.ensure_visible(), Err(AppError::NotFound(_))));
    }
}

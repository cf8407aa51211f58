use futures::future::try_join_all;
use std::collections::{BTreeSet, HashSet};
use tracing::{debug, info, instrument};
use uuid::Uuid;

use super::{
    logic::TurnEnd,
    models::{ActionModel, ActionType, GameModel, WordModel},
    service::GameService,
    types::{ExchangeResult, PlayMoveRequest, PlayResult, PlayedWord, TilePlacement},
};
use crate::{
    board::{scan, ConstructedWord, PlacedLetter, VirtualBoard},
    event::GameEvent,
    rack::VirtualRack,
    shared::AppError,
};

impl GameService {
    /// Validates and commits one move.
    ///
    /// Everything is checked before the game row is swapped; a failed check
    /// leaves no trace. After the swap the rack is refilled and the sealed
    /// board, words, score and action are written.
    #[instrument(skip(self, request), fields(user_id = %request.user_id))]
    pub async fn play_move(
        &self,
        game_id: &str,
        request: PlayMoveRequest,
    ) -> Result<PlayResult, AppError> {
        let game = self.load_game(game_id).await?;
        game.ensure_playable()?;

        let mut player = self
            .players
            .find_active_player(game_id, &request.user_id)
            .await?
            .ok_or_else(|| AppError::NotAuthorized("User is not in the game".to_string()))?;
        if player.player_number != game.current_player_number {
            return Err(AppError::NotAuthorized("turn of another player".to_string()));
        }

        // Held until the refill is stored so an exchange cannot interleave
        let rack_lock = self.rack_lock(game_id, player.player_number).await;
        let rack_guard = rack_lock.lock().await;

        let rack = self
            .racks
            .get_rack(game_id, player.player_number, game.round_number)
            .await?
            .ok_or_else(|| AppError::NotFound("Rack not found".to_string()))?;
        let played = rack.verify_submission(&request.rack)?;
        let letters = placed_letters(&rack, &played, &request.placements)?;

        let board = self.current_board(&game).await?;
        let working = board.with_placements(&letters, game.round_number)?;
        let mut words = scan(&working)?;
        if words.is_empty() {
            return Err(AppError::BadRequest("The move forms no word".to_string()));
        }
        self.resolve_words(&game, &mut words).await?;

        let turn = self.scorer.score_turn(&mut words, &rack.with_sealed(&played));
        let points = turn.total();

        let remaining = self.bags.remaining(game_id).await? as usize;
        let next = game.advanced(
            TurnEnd::Played {
                bag_empty: remaining <= played.len(),
            },
            self.config.skip_threshold(game.expected_player_count),
        )?;

        self.games.update_game(&next, game.version).await?;
        self.scheduler.cancel_skip_turn(game_id, game.version);

        let drawn = self.bags.draw_tiles(game_id, played.len()).await?;
        let refilled = rack.refilled(game.round_number + 1, &played, drawn);
        self.racks.append_rack(refilled.clone()).await?;
        drop(rack_guard);
        self.boards.append_board(working.sealed(next.version)).await?;

        let mut played_words = Vec::with_capacity(words.len());
        for word in &words {
            let record = WordModel {
                id: Uuid::new_v4().to_string(),
                game_id: game_id.to_string(),
                player_number: player.player_number,
                user_id: player.user_id.clone(),
                round_number: game.round_number,
                text: word.text(),
                definition: word.entry.as_ref().and_then(|e| e.definition.clone()),
                score: word.score,
                created_at: chrono::Utc::now(),
            };
            self.words.append_word(&record).await?;
            played_words.push(PlayedWord {
                text: record.text,
                definition: record.definition,
                score: record.score,
            });
        }

        player.score += points;
        self.players.save_player(&player).await?;

        self.record(
            ActionModel::record(&next, ActionType::Play)
                .by(&player.user_id, player.player_number)
                .with_points(points),
        )
        .await?;
        self.publisher
            .publish(GameEvent::WordsPlayed {
                game_id: game_id.to_string(),
                player_number: player.player_number,
                words: played_words.iter().map(|w| w.text.clone()).collect(),
                points,
            })
            .await;

        self.arm_next_turn(&next);

        info!(
            game_id = %game_id,
            player_number = player.player_number,
            points,
            words = played_words.len(),
            status = %next.status,
            "Move played"
        );

        Ok(PlayResult {
            game: next,
            words: played_words,
            bonuses: turn.bonuses,
            points,
            rack: refilled,
        })
    }

    /// Timer-driven skip of the turn that was current at `version`
    #[instrument(skip(self))]
    pub async fn skip_turn(&self, game_id: &str, version: i64) -> Result<GameModel, AppError> {
        let game = self.load_game(game_id).await?;
        if game.version != version {
            return Err(AppError::VersionConflict {
                expected: version,
                actual: game.version,
            });
        }

        let next = game.advanced(
            TurnEnd::Skipped,
            self.config.skip_threshold(game.expected_player_count),
        )?;
        self.games.update_game(&next, version).await?;
        self.scheduler.cancel_skip_turn(game_id, version);

        let mut action = ActionModel::record(&next, ActionType::Skip);
        action.player_number = Some(game.current_player_number);
        self.record(action).await?;

        self.arm_next_turn(&next);

        info!(
            game_id = %game_id,
            skipped_player = game.current_player_number,
            consecutive_skips = next.consecutive_skips,
            status = %next.status,
            "Turn skipped"
        );
        Ok(next)
    }

    /// Swaps rack tiles with the bag. Allowed once per round on a full rack;
    /// the turn and the game version stay where they are.
    #[instrument(skip(self))]
    pub async fn exchange_tiles(
        &self,
        game_id: &str,
        player_number: u32,
        round_number: u32,
        tile_numbers: &[u8],
    ) -> Result<ExchangeResult, AppError> {
        let game = self.load_game(game_id).await?;
        game.ensure_playable()?;
        if round_number != game.round_number {
            return Err(AppError::InvalidState(format!(
                "Tiles can only be exchanged in the current round {}",
                game.round_number
            )));
        }

        let unique: BTreeSet<u8> = tile_numbers.iter().copied().collect();
        if tile_numbers.is_empty() || unique.len() != tile_numbers.len() {
            return Err(AppError::BadRequest(
                "Exchange needs distinct tile numbers".to_string(),
            ));
        }

        let rack_lock = self.rack_lock(game_id, player_number).await;
        let _guard = rack_lock.lock().await;

        let rack = self
            .racks
            .get_rack(game_id, player_number, u32::MAX)
            .await?
            .ok_or_else(|| AppError::NotFound("Rack not found".to_string()))?;
        // A refill is stored under the next round once the player has moved
        if rack.round_number > round_number {
            return Err(AppError::InvalidState(
                "Player already moved this round".to_string(),
            ));
        }
        let rack = rack.carried_to(round_number);
        if rack.has_exchanged() {
            return Err(AppError::InvalidState(
                "Tiles were already exchanged this round".to_string(),
            ));
        }
        if !rack.is_full() {
            return Err(AppError::InvalidState(
                "Only a full rack can be exchanged".to_string(),
            ));
        }

        let letters = tile_numbers
            .iter()
            .map(|number| {
                rack.tile(*number).map(|tile| tile.letter).ok_or_else(|| {
                    AppError::RackMismatch(format!("tile {} is not in the rack", number))
                })
            })
            .collect::<Result<Vec<char>, AppError>>()?;

        let drawn = self.bags.exchange_tiles(game_id, &letters).await?;
        let exchanged = rack.exchanged(tile_numbers, drawn);
        self.racks.append_rack(exchanged.clone()).await?;

        debug!(
            game_id = %game_id,
            player_number,
            returned = %letters.iter().collect::<String>(),
            "Tiles exchanged"
        );
        Ok(ExchangeResult {
            game,
            rack: exchanged,
        })
    }

    pub async fn exchange_tile(
        &self,
        game_id: &str,
        player_number: u32,
        round_number: u32,
        tile_number: u8,
    ) -> Result<ExchangeResult, AppError> {
        self.exchange_tiles(game_id, player_number, round_number, &[tile_number])
            .await
    }

    async fn current_board(&self, game: &GameModel) -> Result<VirtualBoard, AppError> {
        match self.boards.get_board(&game.id, game.version).await? {
            Some(board) => Ok(board),
            None => VirtualBoard::new(&game.id, game.version, game.rows, game.columns),
        }
    }

    /// Looks every word up concurrently and attaches its dictionary entry
    async fn resolve_words(
        &self,
        game: &GameModel,
        words: &mut [ConstructedWord],
    ) -> Result<(), AppError> {
        let texts: Vec<String> = words.iter().map(ConstructedWord::text).collect();
        let entries = try_join_all(
            texts
                .iter()
                .map(|text| self.dictionary.lookup(text, game.language)),
        )
        .await?;

        let mut missing = Vec::new();
        for (word, entry) in words.iter_mut().zip(entries) {
            match entry {
                Some(entry) => word.entry = Some(entry),
                None => {
                    let text = word.text();
                    if !missing.contains(&text) {
                        missing.push(text);
                    }
                }
            }
        }

        if !missing.is_empty() {
            return Err(AppError::WordsNotFound(missing));
        }
        Ok(())
    }
}

/// Letters the placements put down, taken from the stored rack. Every
/// played slot must be placed exactly once and nothing else may be.
fn placed_letters(
    rack: &VirtualRack,
    played: &[u8],
    placements: &[TilePlacement],
) -> Result<Vec<PlacedLetter>, AppError> {
    if placements.is_empty() {
        return Err(AppError::BadRequest(
            "A move must place at least one tile".to_string(),
        ));
    }

    let mut placed = HashSet::new();
    let mut letters = Vec::with_capacity(placements.len());
    for placement in placements {
        if !played.contains(&placement.tile_number) {
            return Err(AppError::RackMismatch(format!(
                "tile {} is placed but not marked as played",
                placement.tile_number
            )));
        }
        if !placed.insert(placement.tile_number) {
            return Err(AppError::RackMismatch(format!(
                "tile {} is placed twice",
                placement.tile_number
            )));
        }
        let tile = rack.tile(placement.tile_number).ok_or_else(|| {
            AppError::RackMismatch(format!("tile {} is not in the rack", placement.tile_number))
        })?;
        letters.push(PlacedLetter {
            row: placement.row,
            column: placement.column,
            letter: tile.letter,
            value: tile.value,
        });
    }

    if placed.len() != played.len() {
        return Err(AppError::RackMismatch(
            "every played tile needs a placement".to_string(),
        ));
    }
    Ok(letters)
}

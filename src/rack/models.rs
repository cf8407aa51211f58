use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashSet};

use crate::bag::LetterTile;
use crate::shared::AppError;

pub const RACK_SIZE: usize = 7;

/// A tile held in a player's rack. `number` identifies the rack slot and
/// survives refills.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VirtualTile {
    pub number: u8,
    pub letter: char,
    pub value: u32,
    pub vowel: bool,
    #[serde(default)]
    pub sealed: bool,
    #[serde(default)]
    pub exchanged: bool,
}

impl VirtualTile {
    pub fn from_letter(number: u8, tile: LetterTile) -> Self {
        Self {
            number,
            letter: tile.letter,
            value: tile.value,
            vowel: tile.vowel,
            sealed: false,
            exchanged: false,
        }
    }
}

/// Snapshot of one player's rack for one round
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VirtualRack {
    pub game_id: String,
    pub player_number: u32,
    pub round_number: u32,
    pub tiles: Vec<VirtualTile>,
}

impl VirtualRack {
    /// Builds a fresh rack numbering the tiles from slot 1
    pub fn from_letters(
        game_id: &str,
        player_number: u32,
        round_number: u32,
        letters: Vec<LetterTile>,
    ) -> Self {
        let tiles = letters
            .into_iter()
            .enumerate()
            .map(|(index, tile)| VirtualTile::from_letter(index as u8 + 1, tile))
            .collect();

        Self {
            game_id: game_id.to_string(),
            player_number,
            round_number,
            tiles,
        }
    }

    pub fn is_full(&self) -> bool {
        self.tiles.len() == RACK_SIZE
    }

    pub fn tile(&self, number: u8) -> Option<&VirtualTile> {
        self.tiles.iter().find(|t| t.number == number)
    }

    pub fn has_exchanged(&self) -> bool {
        self.tiles.iter().any(|t| t.exchanged)
    }

    pub fn letters(&self) -> String {
        self.tiles.iter().map(|t| t.letter).collect()
    }

    /// Checks a client-submitted rack against this stored rack and returns
    /// the slot numbers the client marked as placed.
    ///
    /// Every stored slot must be present exactly once. Tiles left in the rack
    /// must carry the stored letter; placed tiles take their letter from the
    /// stored rack.
    pub fn verify_submission(&self, submitted: &[VirtualTile]) -> Result<Vec<u8>, AppError> {
        let mut seen = HashSet::new();
        for tile in submitted {
            if !seen.insert(tile.number) {
                return Err(AppError::RackMismatch(format!(
                    "tile {} submitted twice",
                    tile.number
                )));
            }
        }

        let stored: BTreeSet<u8> = self.tiles.iter().map(|t| t.number).collect();
        let submitted_numbers: BTreeSet<u8> = seen.into_iter().collect();
        if stored != submitted_numbers {
            return Err(AppError::RackMismatch(format!(
                "expected tiles {:?}, got {:?}",
                stored, submitted_numbers
            )));
        }

        let mut placed = Vec::new();
        for tile in submitted {
            if tile.sealed {
                placed.push(tile.number);
                continue;
            }
            // Presence was checked above
            let Some(expected) = self.tile(tile.number) else {
                continue;
            };
            if expected.letter != tile.letter {
                return Err(AppError::RackMismatch(format!(
                    "tile {}: expected '{}', got '{}'",
                    tile.number, expected.letter, tile.letter
                )));
            }
        }

        placed.sort_unstable();
        Ok(placed)
    }

    /// Copy of this rack with the given slots marked as placed
    pub fn with_sealed(&self, numbers: &[u8]) -> Self {
        let mut rack = self.clone();
        for tile in rack.tiles.iter_mut() {
            tile.sealed = numbers.contains(&tile.number);
        }
        rack
    }

    /// Rack for a later round: played slots are refilled with `drawn` in
    /// ascending slot order. With an exhausted bag the rack shrinks.
    pub fn refilled(&self, round_number: u32, played: &[u8], drawn: Vec<LetterTile>) -> Self {
        let mut tiles: Vec<VirtualTile> = self
            .tiles
            .iter()
            .filter(|t| !played.contains(&t.number))
            .map(|t| VirtualTile {
                sealed: false,
                exchanged: false,
                ..t.clone()
            })
            .collect();

        let mut freed: Vec<u8> = played.to_vec();
        freed.sort_unstable();
        tiles.extend(
            freed
                .into_iter()
                .zip(drawn)
                .map(|(number, tile)| VirtualTile::from_letter(number, tile)),
        );
        tiles.sort_by_key(|t| t.number);

        Self {
            game_id: self.game_id.clone(),
            player_number: self.player_number,
            round_number,
            tiles,
        }
    }

    /// The same tiles as held in `round_number`, with this round's flags cleared
    pub fn carried_to(&self, round_number: u32) -> Self {
        if round_number == self.round_number {
            return self.clone();
        }
        let mut rack = self.clone();
        rack.round_number = round_number;
        for tile in rack.tiles.iter_mut() {
            tile.sealed = false;
            tile.exchanged = false;
        }
        rack
    }

    /// Same-round rack with the given slots swapped for `drawn` tiles
    pub fn exchanged(&self, numbers: &[u8], drawn: Vec<LetterTile>) -> Self {
        let mut rack = self.clone();
        for (number, tile) in numbers.iter().zip(drawn) {
            if let Some(slot) = rack.tiles.iter_mut().find(|t| t.number == *number) {
                *slot = VirtualTile {
                    exchanged: true,
                    ..VirtualTile::from_letter(*number, tile)
                };
            }
        }
        rack
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn letter(letter: char, value: u32) -> LetterTile {
        LetterTile {
            letter,
            value,
            vowel: matches!(letter, 'A' | 'E' | 'I' | 'O' | 'U'),
        }
    }

    fn sample_rack() -> VirtualRack {
        VirtualRack::from_letters(
            "game",
            1,
            1,
            "WEAKSTR".chars().map(|c| letter(c, 1)).collect(),
        )
    }

    #[test]
    fn numbers_slots_from_one() {
        let rack = sample_rack();
        assert!(rack.is_full());
        assert_eq!(rack.tile(1).unwrap().letter, 'W');
        assert_eq!(rack.tile(7).unwrap().letter, 'R');
        assert!(rack.tile(8).is_none());
    }

    #[test]
    fn verify_returns_placed_slots() {
        let rack = sample_rack();
        let mut submitted = rack.tiles.clone();
        submitted[0].sealed = true;
        submitted[3].sealed = true;

        assert_eq!(rack.verify_submission(&submitted).unwrap(), vec![1, 4]);
    }

    #[test]
    fn verify_rejects_forged_letter() {
        let rack = sample_rack();
        let mut submitted = rack.tiles.clone();
        submitted[2].letter = 'Z';

        let error = rack.verify_submission(&submitted).unwrap_err();
        assert!(matches!(error, AppError::RackMismatch(msg) if msg.contains("tile 3")));
    }

    #[test]
    fn verify_rejects_missing_or_duplicate_slots() {
        let rack = sample_rack();

        let missing = &rack.tiles[..6];
        assert!(matches!(
            rack.verify_submission(missing),
            Err(AppError::RackMismatch(_))
        ));

        let mut duplicated = rack.tiles.clone();
        duplicated[6] = duplicated[5].clone();
        assert!(matches!(
            rack.verify_submission(&duplicated),
            Err(AppError::RackMismatch(_))
        ));
    }

    #[test]
    fn refill_keeps_slot_identity() {
        let rack = sample_rack();
        let next = rack.refilled(2, &[2, 4], vec![letter('X', 8), letter('Y', 4)]);

        assert_eq!(next.round_number, 2);
        assert_eq!(next.letters(), "WXAYSTR");
        assert!(next.tiles.iter().all(|t| !t.sealed && !t.exchanged));
    }

    #[test]
    fn refill_shrinks_when_bag_is_short() {
        let rack = sample_rack();
        let next = rack.refilled(2, &[1, 2, 3], vec![letter('Q', 10)]);

        assert_eq!(next.tiles.len(), 5);
        assert_eq!(next.tile(1).unwrap().letter, 'Q');
        assert!(next.tile(2).is_none());
        assert!(!next.is_full());
    }

    #[test]
    fn exchange_marks_swapped_slots() {
        let rack = sample_rack();
        let next = rack.exchanged(&[5], vec![letter('E', 1)]);

        assert_eq!(next.round_number, 1);
        assert!(next.has_exchanged());
        assert!(next.tile(5).unwrap().exchanged);
        assert_eq!(next.tile(5).unwrap().letter, 'E');
        assert!(!rack.has_exchanged());
    }

    #[test]
    fn carried_rack_forgets_last_rounds_exchange() {
        let exchanged = sample_rack().exchanged(&[5], vec![letter('E', 1)]);
        let carried = exchanged.carried_to(3);

        assert_eq!(carried.round_number, 3);
        assert_eq!(carried.letters(), exchanged.letters());
        assert!(!carried.has_exchanged());
        assert_eq!(exchanged.carried_to(1), exchanged);
    }
}

use rand::Rng;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use super::alphabet::Language;
use crate::shared::AppError;

/// A single tile taken out of the bag
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LetterTile {
    pub letter: char,
    pub value: u32,
    pub vowel: bool,
}

/// Remaining stock of one letter
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LetterStock {
    pub count: u32,
    pub value: u32,
    pub vowel: bool,
}

/// Per-game pool of letter tiles
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TileBag {
    pub game_id: String,
    pub language: Language,
    pub letters: BTreeMap<char, LetterStock>,
}

impl TileBag {
    /// Creates a full bag using the language's tile distribution
    pub fn standard(game_id: &str, language: Language) -> Self {
        let letters = language
            .distribution()
            .iter()
            .map(|&(letter, count, value)| {
                (
                    letter,
                    LetterStock {
                        count,
                        value,
                        vowel: language.is_vowel(letter),
                    },
                )
            })
            .collect();

        Self {
            game_id: game_id.to_string(),
            language,
            letters,
        }
    }

    /// Total number of tiles left
    pub fn remaining(&self) -> u32 {
        self.letters.values().map(|stock| stock.count).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.remaining() == 0
    }

    pub fn count_of(&self, letter: char) -> u32 {
        self.letters.get(&letter).map(|s| s.count).unwrap_or(0)
    }

    /// Draws one tile. Every letter still in stock is equally likely,
    /// regardless of how many copies of it remain.
    pub fn draw<R: Rng + ?Sized>(&mut self, rng: &mut R) -> Option<LetterTile> {
        let available: Vec<char> = self
            .letters
            .iter()
            .filter(|(_, stock)| stock.count > 0)
            .map(|(letter, _)| *letter)
            .collect();

        if available.is_empty() {
            return None;
        }

        let letter = available[rng.random_range(0..available.len())];
        let stock = self.letters.get_mut(&letter)?;
        stock.count -= 1;

        Some(LetterTile {
            letter,
            value: stock.value,
            vowel: stock.vowel,
        })
    }

    /// Draws up to `count` tiles, stopping early once the bag is exhausted
    pub fn draw_many<R: Rng + ?Sized>(&mut self, count: usize, rng: &mut R) -> Vec<LetterTile> {
        let mut drawn = Vec::with_capacity(count);
        for _ in 0..count {
            match self.draw(rng) {
                Some(tile) => drawn.push(tile),
                None => break,
            }
        }
        drawn
    }

    /// Returns one tile of the given letter to the bag
    pub fn put_back(&mut self, letter: char) -> Result<(), AppError> {
        let stock = self.letters.get_mut(&letter).ok_or_else(|| {
            AppError::BadRequest(format!(
                "Letter '{}' does not belong to the {} bag",
                letter, self.language
            ))
        })?;
        stock.count += 1;
        Ok(())
    }

    /// Swaps the given letters for new ones. Each letter goes back into the
    /// bag before its replacement is drawn.
    pub fn exchange<R: Rng + ?Sized>(
        &mut self,
        letters: &[char],
        rng: &mut R,
    ) -> Result<Vec<LetterTile>, AppError> {
        let remaining = self.remaining() as usize;
        if letters.len() > remaining {
            return Err(AppError::InsufficientTiles {
                requested: letters.len(),
                remaining,
            });
        }

        if let Some(unknown) = letters.iter().find(|l| !self.letters.contains_key(l)) {
            return Err(AppError::BadRequest(format!(
                "Letter '{}' does not belong to the {} bag",
                unknown, self.language
            )));
        }

        let mut replacements = Vec::with_capacity(letters.len());
        for letter in letters {
            self.put_back(*letter)?;
            let tile = self.draw(rng).ok_or(AppError::Internal)?;
            replacements.push(tile);
        }

        Ok(replacements)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::{rngs::StdRng, SeedableRng};

    fn tiny_bag() -> TileBag {
        let mut bag = TileBag::standard("game-1", Language::English);
        for stock in bag.letters.values_mut() {
            stock.count = 0;
        }
        bag.letters.get_mut(&'A').unwrap().count = 1;
        bag.letters.get_mut(&'B').unwrap().count = 2;
        bag
    }

    #[test]
    fn draw_decrements_the_drawn_letter() {
        let mut bag = TileBag::standard("game-1", Language::English);
        let mut rng = StdRng::seed_from_u64(7);

        let before = bag.remaining();
        let tile = bag.draw(&mut rng).unwrap();

        assert_eq!(bag.remaining(), before - 1);
        let original = Language::English
            .distribution()
            .iter()
            .find(|(l, _, _)| *l == tile.letter)
            .unwrap();
        assert_eq!(bag.count_of(tile.letter), original.1 - 1);
        assert_eq!(tile.value, original.2);
    }

    #[test]
    fn draw_returns_none_when_exhausted() {
        let mut bag = tiny_bag();
        let mut rng = StdRng::seed_from_u64(1);

        let drawn = bag.draw_many(10, &mut rng);
        assert_eq!(drawn.len(), 3);
        assert!(bag.is_empty());
        assert!(bag.draw(&mut rng).is_none());
    }

    #[test]
    fn draw_picks_letters_uniformly_not_by_count() {
        let mut rng = StdRng::seed_from_u64(42);
        let mut a_draws = 0;
        let trials = 2000;

        for _ in 0..trials {
            let mut bag = tiny_bag();
            bag.letters.get_mut(&'B').unwrap().count = 50;
            if bag.draw(&mut rng).unwrap().letter == 'A' {
                a_draws += 1;
            }
        }

        // A has one copy against fifty Bs, yet both letters are equally likely
        assert!(a_draws > trials / 3, "A drawn only {} times", a_draws);
    }

    #[test]
    fn exchange_conserves_total_count() {
        let mut bag = TileBag::standard("game-1", Language::English);
        let mut rng = StdRng::seed_from_u64(3);
        let mut rack: Vec<char> = bag.draw_many(7, &mut rng).iter().map(|t| t.letter).collect();
        let total = bag.remaining() as usize + rack.len();

        for _ in 0..20 {
            let swapped = bag.exchange(&rack[..3], &mut rng).unwrap();
            for (slot, tile) in swapped.iter().enumerate() {
                rack[slot] = tile.letter;
            }
            assert_eq!(bag.remaining() as usize + rack.len(), total);
        }
    }

    #[test]
    fn exchange_rejects_more_than_remaining() {
        let mut bag = tiny_bag();
        let mut rng = StdRng::seed_from_u64(9);

        let result = bag.exchange(&['C', 'D', 'E', 'F'], &mut rng);
        assert_eq!(
            result.unwrap_err(),
            AppError::InsufficientTiles {
                requested: 4,
                remaining: 3
            }
        );
        assert_eq!(bag.remaining(), 3);
    }

    #[test]
    fn exchanged_letter_can_be_redrawn() {
        let mut bag = tiny_bag();
        bag.letters.get_mut(&'A').unwrap().count = 0;
        bag.letters.get_mut(&'B').unwrap().count = 0;
        bag.letters.get_mut(&'C').unwrap().count = 1;
        let mut rng = StdRng::seed_from_u64(5);

        // Q goes back first, so the draw chooses between C and Q
        let swapped = bag.exchange(&['Q'], &mut rng).unwrap();
        assert_eq!(swapped.len(), 1);
        assert!(matches!(swapped[0].letter, 'C' | 'Q'));
        assert_eq!(bag.remaining(), 1);
    }
}

//! Word scoring and pluggable bonus rules.

pub mod bonuses;

use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::debug;

use crate::board::ConstructedWord;
use crate::config::GameConfig;
use crate::rack::VirtualRack;

pub use bonuses::BingoBonus;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BonusKind {
    Bingo,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Bonus {
    pub kind: BonusKind,
    pub points: u32,
}

/// A rule awarding extra points for a whole move
pub trait BonusRule: Send + Sync {
    /// `rack` is the submitted rack with the played tiles sealed
    fn evaluate(&self, words: &[ConstructedWord], rack: &VirtualRack) -> Option<Bonus>;

    fn name(&self) -> &'static str;
}

/// Letter values times letter multipliers, times the word multipliers.
/// Multipliers only count on cells placed by the move being scored.
pub fn score_word(word: &ConstructedWord) -> u32 {
    let (letters, multiplier) = word.cells.iter().fold((0, 1), |(sum, product), cell| {
        if cell.last_played {
            (
                sum + cell.value * cell.letter_value_multiplier,
                product * cell.word_score_multiplier,
            )
        } else {
            (sum + cell.value, product)
        }
    });
    letters * multiplier
}

/// Outcome of scoring one move
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TurnScore {
    pub words: u32,
    pub bonuses: Vec<Bonus>,
}

impl TurnScore {
    pub fn total(&self) -> u32 {
        self.words + self.bonuses.iter().map(|b| b.points).sum::<u32>()
    }
}

pub struct ScoreEngine {
    rules: Vec<Arc<dyn BonusRule>>,
}

impl ScoreEngine {
    pub fn new(rules: Vec<Arc<dyn BonusRule>>) -> Self {
        Self { rules }
    }

    pub fn with_default_rules(config: &GameConfig) -> Self {
        Self::new(vec![Arc::new(BingoBonus::new(config.bingo_bonus))])
    }

    pub fn add_rule(&mut self, rule: Arc<dyn BonusRule>) {
        self.rules.push(rule);
    }

    /// Fills in each word's score and returns their sum
    pub fn score_words(&self, words: &mut [ConstructedWord]) -> u32 {
        words
            .iter_mut()
            .map(|word| {
                word.score = score_word(word);
                word.score
            })
            .sum()
    }

    pub fn calculate_bonuses(&self, words: &[ConstructedWord], rack: &VirtualRack) -> Vec<Bonus> {
        self.rules
            .iter()
            .filter_map(|rule| {
                let bonus = rule.evaluate(words, rack);
                if let Some(bonus) = &bonus {
                    debug!(rule = rule.name(), points = bonus.points, "Bonus awarded");
                }
                bonus
            })
            .collect()
    }

    pub fn score_turn(&self, words: &mut [ConstructedWord], rack: &VirtualRack) -> TurnScore {
        let words_total = self.score_words(words);
        TurnScore {
            words: words_total,
            bonuses: self.calculate_bonuses(words, rack),
        }
    }
}

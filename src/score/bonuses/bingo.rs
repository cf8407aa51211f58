use super::super::{Bonus, BonusKind, BonusRule};
use crate::board::ConstructedWord;
use crate::rack::{VirtualRack, RACK_SIZE};

/// Fixed award for emptying a full rack into a single word
pub struct BingoBonus {
    points: u32,
}

impl BingoBonus {
    pub fn new(points: u32) -> Self {
        Self { points }
    }
}

impl BonusRule for BingoBonus {
    fn evaluate(&self, words: &[ConstructedWord], rack: &VirtualRack) -> Option<Bonus> {
        let whole_rack =
            rack.tiles.len() == RACK_SIZE && rack.tiles.iter().all(|tile| tile.sealed);

        (words.len() == 1 && whole_rack).then_some(Bonus {
            kind: BonusKind::Bingo,
            points: self.points,
        })
    }

    fn name(&self) -> &'static str {
        "bingo"
    }
}

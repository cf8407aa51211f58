mod bingo;

pub use bingo::BingoBonus;

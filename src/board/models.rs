use serde::{Deserialize, Serialize};

use crate::shared::AppError;

pub const MIN_BOARD_SIZE: usize = 5;
pub const MAX_BOARD_SIZE: usize = 25;

/// Premium squares of the standard 15x15 board.
/// T = triple word, D = double word, t = triple letter, d = double letter, * = center.
const STANDARD_LAYOUT: [&str; 15] = [
    "T..d...T...d..T",
    ".D...t...t...D.",
    "..D...d.d...D..",
    "d..D...d...D..d",
    "....D.....D....",
    ".t...t...t...t.",
    "..d...d.d...d..",
    "T..d...*...d..T",
    "..d...d.d...d..",
    ".t...t...t...t.",
    "....D.....D....",
    "d..D...d...D..d",
    "..D...d.d...D..",
    ".D...t...t...D.",
    "T..d...T...d..T",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Direction {
    Horizontal,
    Vertical,
}

/// Decoration of a cell, which also fixes its multipliers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CellColor {
    Plain,
    DoubleLetter,
    TripleLetter,
    DoubleWord,
    TripleWord,
    Center,
}

impl CellColor {
    fn from_code(code: char) -> Self {
        match code {
            'T' => CellColor::TripleWord,
            'D' => CellColor::DoubleWord,
            't' => CellColor::TripleLetter,
            'd' => CellColor::DoubleLetter,
            '*' => CellColor::Center,
            _ => CellColor::Plain,
        }
    }

    /// (letter value multiplier, word score multiplier)
    pub fn multipliers(&self) -> (u32, u32) {
        match self {
            CellColor::Plain => (1, 1),
            CellColor::DoubleLetter => (2, 1),
            CellColor::TripleLetter => (3, 1),
            CellColor::DoubleWord => (1, 2),
            CellColor::TripleWord | CellColor::Center => (1, 3),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VirtualCell {
    pub row: usize,
    pub column: usize,
    pub has_left: bool,
    pub has_right: bool,
    pub has_top: bool,
    pub has_bottom: bool,
    pub color: CellColor,
    pub letter_value_multiplier: u32,
    pub word_score_multiplier: u32,
    pub letter: Option<char>,
    pub value: u32,
    /// Committed by an earlier move
    pub sealed: bool,
    /// Placed by the most recent move; only these cells apply multipliers
    pub last_played: bool,
    pub round_number: Option<u32>,
}

impl VirtualCell {
    pub fn is_empty(&self) -> bool {
        self.letter.is_none()
    }

    /// Holds a letter that has not been committed yet
    pub fn is_new(&self) -> bool {
        self.letter.is_some() && !self.sealed
    }
}

/// A letter the current move puts on the board
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlacedLetter {
    pub row: usize,
    pub column: usize,
    pub letter: char,
    pub value: u32,
}

/// Immutable snapshot of a game's board at one version
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VirtualBoard {
    pub game_id: String,
    pub version: i64,
    pub rows: usize,
    pub columns: usize,
    pub cells: Vec<VirtualCell>,
}

impl VirtualBoard {
    /// Empty board with the premium layout for its size
    pub fn new(game_id: &str, version: i64, rows: usize, columns: usize) -> Result<Self, AppError> {
        validate_dimensions(rows, columns)?;

        let standard = rows == STANDARD_LAYOUT.len() && columns == STANDARD_LAYOUT.len();
        let center = (rows / 2, columns / 2);
        let mut cells = Vec::with_capacity(rows * columns);

        for row in 0..rows {
            for column in 0..columns {
                let color = if standard {
                    STANDARD_LAYOUT[row]
                        .chars()
                        .nth(column)
                        .map(CellColor::from_code)
                        .unwrap_or(CellColor::Plain)
                } else if (row, column) == center {
                    CellColor::Center
                } else if (row == 0 || row == rows - 1) && (column == 0 || column == columns - 1) {
                    CellColor::TripleWord
                } else {
                    CellColor::Plain
                };
                let (letter_value_multiplier, word_score_multiplier) = color.multipliers();

                cells.push(VirtualCell {
                    row,
                    column,
                    has_left: column > 0,
                    has_right: column + 1 < columns,
                    has_top: row > 0,
                    has_bottom: row + 1 < rows,
                    color,
                    letter_value_multiplier,
                    word_score_multiplier,
                    letter: None,
                    value: 0,
                    sealed: false,
                    last_played: false,
                    round_number: None,
                });
            }
        }

        Ok(Self {
            game_id: game_id.to_string(),
            version,
            rows,
            columns,
            cells,
        })
    }

    pub fn index(&self, row: usize, column: usize) -> Option<usize> {
        (row < self.rows && column < self.columns).then(|| row * self.columns + column)
    }

    pub fn cell(&self, row: usize, column: usize) -> Option<&VirtualCell> {
        self.index(row, column).map(|index| &self.cells[index])
    }

    pub fn center(&self) -> (usize, usize) {
        (self.rows / 2, self.columns / 2)
    }

    pub fn is_center(&self, row: usize, column: usize) -> bool {
        (row, column) == self.center()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.iter().all(VirtualCell::is_empty)
    }

    /// Cells holding letters placed by the move being validated
    pub fn newly_placed(&self) -> impl Iterator<Item = &VirtualCell> {
        self.cells.iter().filter(|cell| cell.is_new())
    }

    /// Working copy with the move's letters laid down unsealed.
    /// The previous move's last-played markers are cleared.
    pub fn with_placements(
        &self,
        placements: &[PlacedLetter],
        round_number: u32,
    ) -> Result<Self, AppError> {
        let mut board = self.clone();
        for cell in board.cells.iter_mut() {
            cell.last_played = false;
        }

        for placement in placements {
            let index = board.index(placement.row, placement.column).ok_or_else(|| {
                AppError::BadRequest(format!(
                    "Cell ({}, {}) is outside the {}x{} board",
                    placement.row, placement.column, board.rows, board.columns
                ))
            })?;
            let cell = &mut board.cells[index];

            if cell.sealed {
                return Err(AppError::CellOccupied {
                    row: placement.row,
                    column: placement.column,
                });
            }
            if cell.letter.is_some() {
                return Err(AppError::BadRequest(format!(
                    "Cell ({}, {}) is targeted twice",
                    placement.row, placement.column
                )));
            }

            cell.letter = Some(placement.letter);
            cell.value = placement.value;
            cell.last_played = true;
            cell.round_number = Some(round_number);
        }

        Ok(board)
    }

    /// Snapshot to publish after a successful move: every letter is sealed
    pub fn sealed(&self, version: i64) -> Self {
        let mut board = self.clone();
        board.version = version;
        for cell in board.cells.iter_mut().filter(|c| c.letter.is_some()) {
            cell.sealed = true;
        }
        board
    }
}

fn validate_dimensions(rows: usize, columns: usize) -> Result<(), AppError> {
    let allowed = MIN_BOARD_SIZE..=MAX_BOARD_SIZE;
    if !allowed.contains(&rows) || !allowed.contains(&columns) {
        return Err(AppError::BadRequest(format!(
            "Board must be between {} and {} cells per side, got {}x{}",
            MIN_BOARD_SIZE, MAX_BOARD_SIZE, rows, columns
        )));
    }
    Ok(())
}

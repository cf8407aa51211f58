//! Locates the words a move constructs and checks they connect to play.
//!
//! The board handed to [`scan`] already carries the move's letters as
//! unsealed cells. Scanning is pure: the board is never modified.

use serde::{Deserialize, Serialize};

use super::models::{Direction, VirtualBoard, VirtualCell};
use crate::dictionary::DictionaryEntry;
use crate::shared::AppError;

/// A word found by a single scan
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConstructedWord {
    pub cells: Vec<VirtualCell>,
    pub direction: Direction,
    pub linked: bool,
    pub entry: Option<DictionaryEntry>,
    pub score: u32,
}

impl ConstructedWord {
    fn new(board: &VirtualBoard, cells: Vec<VirtualCell>, direction: Direction) -> Self {
        let linked = cells
            .iter()
            .any(|cell| cell.sealed || board.is_center(cell.row, cell.column));

        Self {
            cells,
            direction,
            linked,
            entry: None,
            score: 0,
        }
    }

    pub fn text(&self) -> String {
        self.cells.iter().filter_map(|cell| cell.letter).collect()
    }

    pub fn contains(&self, row: usize, column: usize) -> bool {
        self.cells
            .iter()
            .any(|cell| cell.row == row && cell.column == column)
    }
}

/// Returns every word constructed by the unsealed letters on `board`.
///
/// Fails with `CenterEmpty` when nothing occupies the center cell and with
/// `WordsNotLinked` when a word (or a stray letter) does not connect to the
/// center or to previously sealed tiles.
pub fn scan(board: &VirtualBoard) -> Result<Vec<ConstructedWord>, AppError> {
    let (center_row, center_column) = board.center();
    if board
        .cell(center_row, center_column)
        .map_or(true, VirtualCell::is_empty)
    {
        return Err(AppError::CenterEmpty {
            row: center_row,
            column: center_column,
        });
    }

    let mut words = sweep(board, Direction::Horizontal);
    words.extend(sweep(board, Direction::Vertical));

    link_words(board, &mut words);

    let mut unlinked: Vec<String> = words
        .iter()
        .filter(|word| !word.linked)
        .map(ConstructedWord::text)
        .collect();

    // Letters that ended up in no word at all cannot be linked either
    unlinked.extend(
        board
            .newly_placed()
            .filter(|cell| !words.iter().any(|w| w.contains(cell.row, cell.column)))
            .filter_map(|cell| cell.letter.map(String::from)),
    );

    if !unlinked.is_empty() {
        return Err(AppError::WordsNotLinked(unlinked));
    }

    Ok(words)
}

fn sweep(board: &VirtualBoard, direction: Direction) -> Vec<ConstructedWord> {
    let (lines, length) = match direction {
        Direction::Horizontal => (board.rows, board.columns),
        Direction::Vertical => (board.columns, board.rows),
    };

    let mut words = Vec::new();
    for line in 0..lines {
        let mut run: Vec<VirtualCell> = Vec::new();
        for position in 0..length {
            let (row, column) = match direction {
                Direction::Horizontal => (line, position),
                Direction::Vertical => (position, line),
            };
            match board.cell(row, column) {
                Some(cell) if !cell.is_empty() => run.push(cell.clone()),
                _ => flush(board, &mut run, direction, &mut words),
            }
        }
        flush(board, &mut run, direction, &mut words);
    }
    words
}

fn flush(
    board: &VirtualBoard,
    run: &mut Vec<VirtualCell>,
    direction: Direction,
    words: &mut Vec<ConstructedWord>,
) {
    let cells = std::mem::take(run);
    // Single letters and untouched words from earlier turns are not constructions
    if cells.len() <= 1 || cells.iter().all(|cell| cell.sealed) {
        return;
    }
    words.push(ConstructedWord::new(board, cells, direction));
}

/// Fixed-point pass: a linked word seals its cells, which may in turn link
/// words touching them. Terminates after at most `words.len()` passes.
fn link_words(board: &VirtualBoard, words: &mut [ConstructedWord]) {
    let mut sealed: Vec<bool> = board.cells.iter().map(|cell| cell.sealed).collect();
    for word in words.iter().filter(|w| w.linked) {
        seal_cells(board, &mut sealed, word);
    }

    for _ in 0..words.len() {
        let mut progress = false;
        for word in words.iter_mut().filter(|w| !w.linked) {
            if word
                .cells
                .iter()
                .any(|cell| touches_sealed(board, &sealed, cell))
            {
                word.linked = true;
                seal_cells(board, &mut sealed, word);
                progress = true;
            }
        }
        if !progress {
            break;
        }
    }
}

fn seal_cells(board: &VirtualBoard, sealed: &mut [bool], word: &ConstructedWord) {
    for cell in &word.cells {
        if let Some(index) = board.index(cell.row, cell.column) {
            sealed[index] = true;
        }
    }
}

fn touches_sealed(board: &VirtualBoard, sealed: &[bool], cell: &VirtualCell) -> bool {
    let is_sealed = |row: usize, column: usize| {
        board
            .index(row, column)
            .map_or(false, |index| sealed[index])
    };

    is_sealed(cell.row, cell.column)
        || (cell.has_left && is_sealed(cell.row, cell.column - 1))
        || (cell.has_right && is_sealed(cell.row, cell.column + 1))
        || (cell.has_top && is_sealed(cell.row - 1, cell.column))
        || (cell.has_bottom && is_sealed(cell.row + 1, cell.column))
}

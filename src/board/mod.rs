// Public API
pub use models::{
    CellColor, Direction, PlacedLetter, VirtualBoard, VirtualCell, MAX_BOARD_SIZE, MIN_BOARD_SIZE,
};
pub use repository::{BoardRepository, InMemoryBoardRepository};
pub use scanner::{scan, ConstructedWord};

// Internal modules
mod models;
mod repository;
mod scanner;

// Public API
pub use alphabet::Language;
pub use models::{LetterStock, LetterTile, TileBag};
pub use repository::{BagRepository, InMemoryBagRepository};

// Internal modules
mod alphabet;
mod models;
mod repository;

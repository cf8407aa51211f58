pub mod actions;
pub mod mocks;
pub mod setup;

// Re-export main utilities for use by test files
#[allow(unused_imports)]
pub use actions::{forge_move, play_on, play_opening, MoveBuilder};
#[allow(unused_imports)]
pub use mocks::{AnyWordDictionary, RecordingPublisher, SmallBagRepository};
#[allow(unused_imports)]
pub use setup::{english_census, expect_err, TestSetup, TestSetupBuilder};

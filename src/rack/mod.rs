// Public API
pub use models::{VirtualRack, VirtualTile, RACK_SIZE};
pub use repository::{InMemoryRackRepository, RackRepository};

// Internal modules
mod models;
mod repository;

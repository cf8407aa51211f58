// Game event publication
//
// Committed actions, accepted moves and chat messages are broadcast per game
// so an outer gateway can fan them out to clients.

// Public API
pub use bus::{EventBus, EventPublisher};
pub use events::GameEvent;

// Internal modules
mod bus;
mod events;

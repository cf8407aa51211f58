// Turn timers and deferred transitions
//
// Timers never call the game service directly: fired actions travel over a
// channel to a worker, which runs each one as an ordinary concurrent caller.

// Public API
pub use timers::{ScheduledAction, TimerHandle, TurnScheduler};
pub use worker::{ScheduledActionHandler, SchedulerWorker};

// Internal modules
mod timers;
mod worker;

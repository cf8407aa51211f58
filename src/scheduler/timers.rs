use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, info};
use uuid::Uuid;

/// Work handed to the scheduler worker when a timer fires
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScheduledAction {
    /// Skip the turn that was current at `version`
    SkipTurn { game_id: String, version: i64 },
    StartGame { game_id: String },
    EndGame { game_id: String },
    /// Close a lobby nobody finished joining
    TerminateGame { game_id: String },
}

impl ScheduledAction {
    pub fn game_id(&self) -> &str {
        match self {
            ScheduledAction::SkipTurn { game_id, .. }
            | ScheduledAction::StartGame { game_id }
            | ScheduledAction::EndGame { game_id }
            | ScheduledAction::TerminateGame { game_id } => game_id,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            ScheduledAction::SkipTurn { .. } => "skip_turn",
            ScheduledAction::StartGame { .. } => "start_game",
            ScheduledAction::EndGame { .. } => "end_game",
            ScheduledAction::TerminateGame { .. } => "terminate_game",
        }
    }
}

/// Identity of one armed skip timer
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TimerHandle {
    pub id: Uuid,
    pub game_id: String,
    pub version: i64,
}

struct PendingTimer {
    handle: TimerHandle,
    task: JoinHandle<()>,
}

type PendingTimers = Arc<Mutex<HashMap<String, PendingTimer>>>;

/// Arms and cancels per-game timers. Holds at most one skip timer per game.
#[derive(Clone)]
pub struct TurnScheduler {
    sender: mpsc::UnboundedSender<ScheduledAction>,
    skip_timers: PendingTimers,
    deferred_delay: Duration,
}

impl TurnScheduler {
    /// Returns the scheduler and the receiving end for a `SchedulerWorker`
    pub fn new(deferred_delay: Duration) -> (Self, mpsc::UnboundedReceiver<ScheduledAction>) {
        let (sender, receiver) = mpsc::unbounded_channel();
        let scheduler = Self {
            sender,
            skip_timers: Arc::new(Mutex::new(HashMap::new())),
            deferred_delay,
        };
        (scheduler, receiver)
    }

    /// Arms the skip timer for the turn current at `version`, replacing any
    /// older timer still pending for the game. A pending timer armed for a
    /// later version is kept and its handle returned.
    pub fn schedule_skip_turn(&self, game_id: &str, version: i64, after: Duration) -> TimerHandle {
        // Held until the timer is registered so a zero-length timer cannot miss its own entry
        let mut pending = self.lock_timers();

        if let Some(newer) = pending
            .get(game_id)
            .filter(|timer| timer.handle.version > version)
        {
            debug!(
                game_id = %game_id,
                version,
                pending_version = newer.handle.version,
                "Skip timer for a later turn already armed"
            );
            return newer.handle.clone();
        }

        let handle = TimerHandle {
            id: Uuid::new_v4(),
            game_id: game_id.to_string(),
            version,
        };

        let timers = Arc::clone(&self.skip_timers);
        let sender = self.sender.clone();
        let fired = handle.clone();
        let task = tokio::spawn(async move {
            tokio::time::sleep(after).await;

            // Past this point the timer counts as fired and can no longer be cancelled
            {
                let mut pending = timers.lock().unwrap_or_else(PoisonError::into_inner);
                match pending.get(&fired.game_id) {
                    Some(timer) if timer.handle.id == fired.id => {
                        pending.remove(&fired.game_id);
                    }
                    _ => return,
                }
            }

            debug!(game_id = %fired.game_id, version = fired.version, "Skip timer fired");
            let _ = sender.send(ScheduledAction::SkipTurn {
                game_id: fired.game_id,
                version: fired.version,
            });
        });

        if let Some(previous) = pending.insert(
            game_id.to_string(),
            PendingTimer {
                handle: handle.clone(),
                task,
            },
        ) {
            previous.task.abort();
            debug!(
                game_id = %game_id,
                replaced_version = previous.handle.version,
                "Replaced pending skip timer"
            );
        }

        drop(pending);

        info!(game_id = %game_id, version, seconds = after.as_secs(), "Skip timer armed");
        handle
    }

    /// Cancels the timer if it is still pending. Returns whether it was.
    pub fn cancel(&self, handle: &TimerHandle) -> bool {
        let mut pending = self.lock_timers();
        match pending.get(&handle.game_id) {
            Some(timer) if timer.handle.id == handle.id => {
                if let Some(timer) = pending.remove(&handle.game_id) {
                    timer.task.abort();
                }
                debug!(game_id = %handle.game_id, version = handle.version, "Skip timer cancelled");
                true
            }
            _ => false,
        }
    }

    /// Cancels the pending skip timer armed at `version`, if any
    pub fn cancel_skip_turn(&self, game_id: &str, version: i64) -> bool {
        let handle = self
            .pending_skip_turn(game_id)
            .filter(|handle| handle.version == version);
        handle.is_some_and(|handle| self.cancel(&handle))
    }

    pub fn pending_skip_turn(&self, game_id: &str) -> Option<TimerHandle> {
        self.lock_timers()
            .get(game_id)
            .map(|timer| timer.handle.clone())
    }

    pub fn schedule_start_game(&self, game_id: &str) {
        self.defer(
            ScheduledAction::StartGame {
                game_id: game_id.to_string(),
            },
            self.deferred_delay,
        );
    }

    pub fn schedule_end_game(&self, game_id: &str) {
        self.defer(
            ScheduledAction::EndGame {
                game_id: game_id.to_string(),
            },
            self.deferred_delay,
        );
    }

    pub fn schedule_terminate_game(&self, game_id: &str, after: Duration) {
        self.defer(
            ScheduledAction::TerminateGame {
                game_id: game_id.to_string(),
            },
            after,
        );
    }

    fn defer(&self, action: ScheduledAction, after: Duration) {
        debug!(
            game_id = %action.game_id(),
            action = action.name(),
            delay_ms = after.as_millis() as u64,
            "Deferred action scheduled"
        );
        let sender = self.sender.clone();
        tokio::spawn(async move {
            tokio::time::sleep(after).await;
            let _ = sender.send(action);
        });
    }

    fn lock_timers(&self) -> std::sync::MutexGuard<'_, HashMap<String, PendingTimer>> {
        self.skip_timers
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }
}

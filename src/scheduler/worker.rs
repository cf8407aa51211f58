use async_trait::async_trait;
use std::sync::Weak;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use super::timers::ScheduledAction;
use crate::shared::AppError;

/// Receiver of fired timers, normally the game service
#[async_trait]
pub trait ScheduledActionHandler: Send + Sync {
    async fn handle_scheduled(&self, action: ScheduledAction) -> Result<(), AppError>;
}

/// Drains the scheduler channel, running every action in its own task
pub struct SchedulerWorker {
    receiver: mpsc::UnboundedReceiver<ScheduledAction>,
    handler: Weak<dyn ScheduledActionHandler>,
}

impl SchedulerWorker {
    /// The handler is held weakly: the worker stops once it is dropped
    pub fn new(
        receiver: mpsc::UnboundedReceiver<ScheduledAction>,
        handler: Weak<dyn ScheduledActionHandler>,
    ) -> Self {
        Self { receiver, handler }
    }

    pub fn start(mut self) -> JoinHandle<()> {
        tokio::spawn(async move {
            info!("Scheduler worker started");

            while let Some(action) = self.receiver.recv().await {
                let Some(handler) = self.handler.upgrade() else {
                    debug!("Action handler dropped, stopping scheduler worker");
                    break;
                };

                tokio::spawn(async move {
                    let game_id = action.game_id().to_string();
                    let name = action.name();

                    match handler.handle_scheduled(action).await {
                        Ok(()) => debug!(game_id = %game_id, action = name, "Scheduled action ran"),
                        // A move or another timer got there first
                        Err(e) if e.is_version_conflict() => {
                            debug!(
                                game_id = %game_id,
                                action = name,
                                error = %e,
                                "Stale scheduled action ignored"
                            )
                        }
                        Err(e) => {
                            warn!(
                                game_id = %game_id,
                                action = name,
                                error = %e,
                                "Scheduled action failed"
                            )
                        }
                    }
                });
            }

            info!("Scheduler worker stopped");
        })
    }
}

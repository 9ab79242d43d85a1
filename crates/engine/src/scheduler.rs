//! Cancellable timed loop driving broadcast cycles.

use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use tokio::sync::RwLock;
use tokio_util::sync::CancellationToken;

use herald_common::config::Config;
use herald_common::types::BroadcastContent;
use herald_formatter::spintax;

use crate::fanout::{BroadcastTransport, FanoutExecutor};
use crate::state::DeliveryState;

/// Result of a start request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StartOutcome {
    Started,
    AlreadyRunning,
}

/// Result of a stop request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopOutcome {
    Stopped,
    NotRunning,
}

/// One live timed loop.
struct ScheduleHandle {
    interval_minutes: i64,
    cancel: CancellationToken,
}

/// Owns at most one live schedule and the collaborators a cycle needs.
///
/// `start` / `stop` / `reconfigure` are the only ways the schedule changes;
/// calling them in a conflicting state reports a no-op outcome instead of
/// failing. Delivery state lives outside the handle, so restarting the
/// schedule (or changing its interval) keeps delete-previous context.
pub struct Scheduler<T: BroadcastTransport + 'static> {
    config: Arc<RwLock<Config>>,
    executor: Arc<FanoutExecutor<T>>,
    handle: Mutex<Option<ScheduleHandle>>,
}

impl<T: BroadcastTransport + 'static> Scheduler<T> {
    pub fn new(
        config: Arc<RwLock<Config>>,
        transport: Arc<T>,
        state: Arc<DeliveryState>,
    ) -> Self {
        Self {
            config,
            executor: Arc::new(FanoutExecutor::new(transport, state)),
            handle: Mutex::new(None),
        }
    }

    /// Spawn the timed loop: one cycle immediately, then one per interval.
    /// No effect when a schedule is already live.
    pub fn start(&self, interval_minutes: i64) -> StartOutcome {
        let mut handle = self.lock_handle();

        if handle.is_some() {
            tracing::info!("Schedule already running");
            return StartOutcome::AlreadyRunning;
        }

        let cancel = CancellationToken::new();
        tokio::spawn(run_loop(
            self.config.clone(),
            self.executor.clone(),
            interval_minutes,
            cancel.clone(),
        ));

        *handle = Some(ScheduleHandle {
            interval_minutes,
            cancel,
        });

        tracing::info!(interval_minutes, "Schedule started");
        StartOutcome::Started
    }

    /// Cancel the live loop and clear the handle. Cancellation is
    /// cooperative: an in-flight cycle finishes its work, only the next
    /// re-arm observes the token.
    pub fn stop(&self) -> StopOutcome {
        match self.lock_handle().take() {
            Some(schedule) => {
                schedule.cancel.cancel();
                tracing::info!(
                    interval_minutes = schedule.interval_minutes,
                    "Schedule stopped"
                );
                StopOutcome::Stopped
            }
            None => {
                tracing::info!("Schedule is not running");
                StopOutcome::NotRunning
            }
        }
    }

    /// Apply a new interval: restart the loop when live. When stopped there
    /// is nothing to do here — the caller persists the interval and the next
    /// start picks it up.
    pub fn reconfigure(&self, interval_minutes: i64) {
        if self.stop() == StopOutcome::Stopped {
            self.start(interval_minutes);
        }
    }

    pub fn is_running(&self) -> bool {
        self.lock_handle().is_some()
    }

    fn lock_handle(&self) -> std::sync::MutexGuard<'_, Option<ScheduleHandle>> {
        self.handle.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

async fn run_loop<T: BroadcastTransport + 'static>(
    config: Arc<RwLock<Config>>,
    executor: Arc<FanoutExecutor<T>>,
    interval_minutes: i64,
    cancel: CancellationToken,
) {
    let interval = Duration::from_secs(interval_minutes as u64 * 60);

    loop {
        run_cycle(&config, &executor).await;

        // Re-arm only after the cycle returned: cycles never overlap, and
        // cancellation is observed here rather than mid-cycle.
        tokio::select! {
            _ = cancel.cancelled() => {
                tracing::info!("Schedule loop exiting");
                return;
            }
            _ = tokio::time::sleep(interval) => {}
        }
    }
}

/// Snapshot the config and broadcast it. Nothing in here may end the loop;
/// per-recipient failures are the executor's concern.
async fn run_cycle<T: BroadcastTransport>(
    config: &RwLock<Config>,
    executor: &FanoutExecutor<T>,
) {
    let (content, chat_ids) = {
        let config = config.read().await;
        let content = BroadcastContent {
            text: spintax::expand(&config.message, &mut rand::rng()),
            photo_file_id: config.photo_file_id.clone(),
            pin: config.pin,
            remove_last: config.remove_last,
        };
        (content, config.chat_ids.clone())
    };

    if content.text.trim().is_empty() || chat_ids.is_empty() {
        tracing::debug!("No message or no chats configured, skipping cycle");
        return;
    }

    tracing::info!(chats = chat_ids.len(), "Broadcast cycle starting");
    executor.run_cycle(&content, &chat_ids).await;
}

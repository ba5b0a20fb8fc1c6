//! The periodic push loop.
//!
//! [`GraphiteBridge::start`] spawns one background task that pushes at a
//! fixed wall-clock cadence. The loop keeps a `next_fire` anchor and, after
//! any stall (slow push, system sleep), re-anchors it past the current time
//! in whole interval steps — missed ticks are coalesced into a single push,
//! never replayed as a burst.

use std::time::Duration;

use chrono::{DateTime, TimeDelta, Utc};
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::sleep;
use tracing::{debug, info, warn};

use crate::bridge::GraphiteBridge;

/// Default push cadence.
pub const DEFAULT_INTERVAL: Duration = Duration::from_secs(60);

/// Handle to a running push loop.
///
/// Dropping the handle stops the loop; call [`PushHandle::stop`] (or
/// [`PushHandle::stopped`] to also wait for the task) for an explicit
/// shutdown.
pub struct PushHandle {
    shutdown: watch::Sender<bool>,
    task: JoinHandle<()>,
}

impl PushHandle {
    /// Signal the loop to stop after its current cycle.
    pub fn stop(&self) {
        let _ = self.shutdown.send(true);
    }

    /// Signal the loop to stop and wait for the task to finish.
    pub async fn stopped(self) {
        self.stop();
        let _ = self.task.await;
    }

    /// Whether the background task has exited.
    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }
}

impl GraphiteBridge {
    /// Start pushing every `interval`, prepending `prefix` to each line.
    ///
    /// Returns immediately; the loop runs on a spawned tokio task until the
    /// returned handle is stopped or dropped. Push failures are logged and
    /// the cadence continues.
    pub fn start(&self, interval: Duration, prefix: impl Into<String>) -> PushHandle {
        let interval = if interval.is_zero() {
            warn!("Push interval of zero requested; falling back to {DEFAULT_INTERVAL:?}");
            DEFAULT_INTERVAL
        } else {
            interval
        };
        let (shutdown, shutdown_rx) = watch::channel(false);
        let task = tokio::spawn(run_loop(self.clone(), interval, prefix.into(), shutdown_rx));
        PushHandle { shutdown, task }
    }
}

async fn run_loop(
    bridge: GraphiteBridge,
    interval: Duration,
    prefix: String,
    mut shutdown: watch::Receiver<bool>,
) {
    let step = TimeDelta::from_std(interval).unwrap_or(TimeDelta::MAX);
    info!(
        "Started graphite push loop to {} (interval: {:?}, prefix: {:?})",
        bridge.address(),
        interval,
        prefix
    );

    let mut next_fire = bridge.clock().now();
    loop {
        // Pushes slower than the interval re-fire immediately and never
        // reach the select below, so the signal is checked here as well.
        if *shutdown.borrow() {
            break;
        }

        let now = bridge.clock().now();
        if now >= next_fire {
            next_fire = advance_deadline(next_fire, now, step);
            if let Err(err) = bridge.push(&prefix).await {
                // Already logged inside push; the next cycle sends fresh data.
                debug!("Push cycle skipped: {}", err);
            }
            continue;
        }

        // The sleep may wake early; the outer loop re-checks the clock.
        let remaining = (next_fire - now).to_std().unwrap_or(Duration::ZERO);
        tokio::select! {
            _ = sleep(remaining) => {}
            changed = shutdown.changed() => {
                if changed.is_err() || *shutdown.borrow() {
                    break;
                }
            }
        }
    }

    info!("Stopped graphite push loop to {}", bridge.address());
}

/// Advance `next_fire` by whole interval steps until it strictly exceeds
/// `now`. Ticks skipped over here are dropped, not replayed.
fn advance_deadline(
    mut next_fire: DateTime<Utc>,
    now: DateTime<Utc>,
    step: TimeDelta,
) -> DateTime<Utc> {
    while next_fire <= now {
        next_fire = next_fire
            .checked_add_signed(step)
            .unwrap_or(DateTime::<Utc>::MAX_UTC);
    }
    next_fire
}

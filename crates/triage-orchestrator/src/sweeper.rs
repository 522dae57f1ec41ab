// SPDX-FileCopyrightText: 2026 Triage Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Periodic eviction of idle sessions.

use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};
use triage_config::model::MAX_SWEEP_INTERVAL_SECS;

use crate::Orchestrator;

/// Shortest accepted sweep interval.
const MIN_INTERVAL: Duration = Duration::from_millis(1);

/// Longest accepted sweep interval.
const MAX_INTERVAL: Duration = Duration::from_secs(MAX_SWEEP_INTERVAL_SECS);

/// Spawn a task that sweeps sessions idle for longer than `max_age` every
/// `interval` until `cancel` fires.
///
/// The first sweep runs one full interval after spawning. Intervals are
/// clamped to `[1ms, 1 day]`.
pub fn spawn_sweeper(
    orchestrator: Arc<Orchestrator>,
    interval: Duration,
    max_age: Duration,
    cancel: CancellationToken,
) -> JoinHandle<()> {
    if interval > MAX_INTERVAL {
        warn!(
            requested_secs = interval.as_secs(),
            max_secs = MAX_INTERVAL.as_secs(),
            "sweep interval clamped"
        );
    }
    let interval = interval.clamp(MIN_INTERVAL, MAX_INTERVAL);
    tokio::spawn(async move {
        let now = tokio::time::Instant::now();
        let start = now.checked_add(interval).unwrap_or(now);
        let mut ticker = tokio::time::interval_at(start, interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        info!(
            interval_ms = interval.as_millis() as u64,
            max_age_secs = max_age.as_secs(),
            "session sweeper started"
        );

        loop {
            tokio::select! {
                _ = cancel.cancelled() => {
                    info!("session sweeper stopped");
                    break;
                }
                _ = ticker.tick() => {
                    let evicted = orchestrator.memory().sweep(max_age);
                    debug!(evicted, live = orchestrator.memory().len(), "sweep tick");
                }
            }
        }
    })
}

//! Transit wait task
//!
//! The board gives no completion feedback, so every transit is timed. The
//! task receives one wait at a time from the controller and reports when
//! it ran out or was aborted by an emergency stop.

use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::signal::Signal;
use embassy_time::{Duration, Instant, Ticker};
use tracing::{debug, info};

use crate::channels::{MotionOutcome, MotionReport, ABORT_MOTION, MOTION_CMD, MOTION_REPORT};

#[embassy_executor::task]
pub async fn motion_task(poll_interval_ms: u64) {
    info!("Motion task started (poll {}ms)", poll_interval_ms);
    let poll = Duration::from_millis(poll_interval_ms.max(1));

    loop {
        let command = MOTION_CMD.receive().await;
        let duration = Duration::from_millis(u64::from(command.duration_ms));
        let outcome = wait_transit(command.id, duration, poll, &ABORT_MOTION).await;
        debug!("Wait {} {:?}", command.id, outcome);
        MOTION_REPORT.send(MotionReport { id: command.id, outcome }).await;
    }
}

/// Wait out one transit, checking `abort` every `poll`
///
/// An abort carrying an id below `id` was meant for an earlier wait and is
/// dropped. One at or above it ends this wait, including an abort raised
/// while the command was still queued.
pub async fn wait_transit(
    id: u32,
    duration: Duration,
    poll: Duration,
    abort: &Signal<CriticalSectionRawMutex, u32>,
) -> MotionOutcome {
    let deadline = Instant::now() + duration;
    let mut ticker = Ticker::every(poll);
    loop {
        if let Some(target) = abort.try_take() {
            if target >= id {
                return MotionOutcome::Aborted;
            }
            debug!("Dropping abort for earlier wait {}", target);
        }
        if Instant::now() >= deadline {
            return MotionOutcome::Completed;
        }
        ticker.next().await;
    }
}

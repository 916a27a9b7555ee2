//! Inter-task communication channels
//!
//! Defines the static channels used between the Embassy tasks and the two
//! blocking threads (operator console, telemetry listener). Threads only use
//! the non-blocking `try_send`.

use core::cell::RefCell;

use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::blocking_mutex::Mutex;
use embassy_sync::channel::Channel;
use embassy_sync::signal::Signal;

use canicas_protocol::{Directive, TelemetryFrame};

use crate::controller::{Request, Snapshot};

/// Channel capacity for operator requests
const REQUEST_CHANNEL_SIZE: usize = 16;

/// Channel capacity for outbound directives
const OUTBOUND_CHANNEL_SIZE: usize = 16;

/// Channel capacity for telemetry frames
const TELEMETRY_CHANNEL_SIZE: usize = 8;

/// Wait for one transit
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MotionCommand {
    /// Identifies the wait; reports carry it back
    pub id: u32,
    pub duration_ms: u32,
}

/// How a transit wait ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MotionOutcome {
    Completed,
    Aborted,
}

/// Result of a transit wait
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MotionReport {
    pub id: u32,
    pub outcome: MotionOutcome,
}

/// Operator requests from the console thread
pub static REQUESTS: Channel<CriticalSectionRawMutex, Request, REQUEST_CHANNEL_SIZE> =
    Channel::new();

/// Transit waits issued by the controller
pub static MOTION_CMD: Channel<CriticalSectionRawMutex, MotionCommand, 4> = Channel::new();

/// Transit wait results from the motion task
pub static MOTION_REPORT: Channel<CriticalSectionRawMutex, MotionReport, 4> = Channel::new();

/// Abort transit waits up to and including the carried id (emergency stop)
pub static ABORT_MOTION: Signal<CriticalSectionRawMutex, u32> = Signal::new();

/// Directives admitted by the controller, drained by the serial writer
pub static OUTBOUND: Channel<CriticalSectionRawMutex, Directive, OUTBOUND_CHANNEL_SIZE> =
    Channel::new();

/// Parsed telemetry from the listener thread
pub static TELEMETRY: Channel<CriticalSectionRawMutex, TelemetryFrame, TELEMETRY_CHANNEL_SIZE> =
    Channel::new();

/// Latest controller snapshot, published after every processed message
pub static SNAPSHOT: Mutex<CriticalSectionRawMutex, RefCell<Option<Snapshot>>> =
    Mutex::new(RefCell::new(None));

/// Replace the published snapshot
pub fn publish_snapshot(snapshot: Snapshot) {
    SNAPSHOT.lock(|cell| *cell.borrow_mut() = Some(snapshot));
}

/// Copy out the latest snapshot
pub fn latest_snapshot() -> Option<Snapshot> {
    SNAPSHOT.lock(|cell| cell.borrow().clone())
}

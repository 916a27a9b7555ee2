//! Marble counters
//!
//! The dump count is kept locally and corrected by controller board
//! telemetry whenever a frame arrives.

use canicas_protocol::{TelemetryFrame, TelemetryKind};

/// Last telemetry event seen
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum LastEvent {
    Entry,
    Exit,
    Other,
}

/// Marble counters
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct MarbleCounters {
    /// Marbles in the Destination bin
    pub marbles: u32,
    /// Board-reported entries since power-up
    pub entries: u32,
    /// Board-reported exits since power-up
    pub exits: u32,
    pub last_event: Option<LastEvent>,
}

impl MarbleCounters {
    pub fn new() -> Self {
        Self::default()
    }

    /// Count one completed dump
    pub fn tally(&mut self) -> u32 {
        self.marbles = self.marbles.saturating_add(1);
        self.marbles
    }

    /// Apply a telemetry frame; the board's count wins
    pub fn apply(&mut self, frame: &TelemetryFrame) {
        self.marbles = frame.current;
        self.entries = frame.entries;
        self.exits = frame.exits;
        self.last_event = Some(match frame.kind {
            TelemetryKind::Entry => LastEvent::Entry,
            TelemetryKind::Exit => LastEvent::Exit,
            TelemetryKind::Other(_) => LastEvent::Other,
        });
    }
}

//! Carrier position tracking
//!
//! The tracker owns the single carrier position and the motion state
//! machine around it:
//!
//! ```text
//! Idle ──begin──▶ Moving ──complete──▶ Idle
//!  │                 │
//!  │                 └──abort──▶ Idle (position unchanged)
//!  └──await──▶ AwaitingConfirmation ──confirm/abort──▶ Idle
//! ```
//!
//! Position only changes when a transit completes, or when calibration
//! re-homes the carrier.

use canicas_protocol::Directive;

use super::zone::{Zone, NOMINAL_DESTINATION_COLUMN};

/// Where the carrier is
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Position {
    /// Current zone
    pub zone: Zone,
    /// Column of the cell that last fed the Destination
    pub destination_column: u8,
}

impl Default for Position {
    fn default() -> Self {
        Self::new(Zone::S1, NOMINAL_DESTINATION_COLUMN)
    }
}

impl Position {
    pub const fn new(zone: Zone, destination_column: u8) -> Self {
        Self {
            zone,
            destination_column,
        }
    }
}

/// A transmitted directive and its expected outcome
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Motion {
    /// Directive sent to the controller board
    pub directive: Directive,
    /// Time to wait for the move to finish (ms)
    pub duration_ms: u32,
    /// Position applied on completion; `None` leaves the position alone
    pub arrival: Option<Position>,
}

impl Motion {
    /// A move that does not change the tracked position
    pub const fn untracked(directive: Directive, duration_ms: u32) -> Self {
        Self {
            directive,
            duration_ms,
            arrival: None,
        }
    }
}

/// Operator confirmation the carrier is waiting for
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Prompt {
    /// Load a marble at a start slot
    LoadMarble(Zone),
    /// Empty the Destination bin
    EmptyBin,
}

impl core::fmt::Display for Prompt {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Prompt::LoadMarble(zone) => write!(f, "load a marble at {} and confirm", zone),
            Prompt::EmptyBin => f.write_str("empty the Destination bin and confirm"),
        }
    }
}

/// Motion state machine
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum MotionState {
    Idle,
    Moving(Motion),
    AwaitingConfirmation(Prompt),
}

/// Motion state errors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum MotionError {
    /// A move or confirmation is already pending
    Busy,
    /// Completion reported while not moving
    NotMoving,
    /// Confirmation given while none is pending
    NotAwaiting,
    /// No directive covers the requested delta
    Unreachable,
    /// Target is not a valid zone for this operation
    InvalidTarget,
}

impl core::fmt::Display for MotionError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        let reason = match self {
            MotionError::Busy => "carrier is busy",
            MotionError::NotMoving => "carrier is not moving",
            MotionError::NotAwaiting => "no confirmation pending",
            MotionError::Unreachable => "unreachable directive",
            MotionError::InvalidTarget => "invalid target zone",
        };
        f.write_str(reason)
    }
}

impl core::error::Error for MotionError {}

/// Owns the carrier position and motion state
#[derive(Debug, Clone)]
pub struct PositionTracker {
    position: Position,
    state: MotionState,
}

impl Default for PositionTracker {
    fn default() -> Self {
        Self::new()
    }
}

impl PositionTracker {
    /// Tracker at S1, assuming the carrier was homed before startup
    pub fn new() -> Self {
        Self {
            position: Position::default(),
            state: MotionState::Idle,
        }
    }

    pub fn position(&self) -> Position {
        self.position
    }

    pub fn state(&self) -> MotionState {
        self.state
    }

    pub fn is_idle(&self) -> bool {
        self.state == MotionState::Idle
    }

    /// Start a transit
    pub fn begin(&mut self, motion: Motion) -> Result<(), MotionError> {
        if !self.is_idle() {
            return Err(MotionError::Busy);
        }
        self.state = MotionState::Moving(motion);
        Ok(())
    }

    /// Finish the current transit and apply its arrival
    pub fn complete(&mut self) -> Result<Position, MotionError> {
        let MotionState::Moving(motion) = self.state else {
            return Err(MotionError::NotMoving);
        };
        if let Some(arrival) = motion.arrival {
            self.position = arrival;
        }
        self.state = MotionState::Idle;
        Ok(self.position)
    }

    /// Suspend until the operator confirms
    pub fn await_confirmation(&mut self, prompt: Prompt) -> Result<(), MotionError> {
        if !self.is_idle() {
            return Err(MotionError::Busy);
        }
        self.state = MotionState::AwaitingConfirmation(prompt);
        Ok(())
    }

    /// Resolve a pending confirmation
    pub fn confirm(&mut self) -> Result<Prompt, MotionError> {
        let MotionState::AwaitingConfirmation(prompt) = self.state else {
            return Err(MotionError::NotAwaiting);
        };
        self.state = MotionState::Idle;
        Ok(prompt)
    }

    /// Drop whatever is pending without touching the position
    ///
    /// Returns true if something was pending.
    pub fn abort(&mut self) -> bool {
        let pending = !self.is_idle();
        self.state = MotionState::Idle;
        pending
    }

    /// Overwrite the position (calibration re-home)
    pub fn set_position(&mut self, position: Position) -> Result<(), MotionError> {
        if !self.is_idle() {
            return Err(MotionError::Busy);
        }
        self.position = position;
        Ok(())
    }
}

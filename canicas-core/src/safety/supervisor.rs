//! Safety supervisor implementation
//!
//! Tracks two flags. `busy` is held by the one job allowed in flight.
//! `emergency_stop` latches until the operator enters a top-level screen;
//! while it is set only brakes and the actuator close directive may be
//! transmitted.

use canicas_protocol::{Axis, Directive};

/// Snapshot of the safety flags
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct SafetyState {
    pub busy: bool,
    pub emergency_stop: bool,
}

/// Reasons an operation is refused
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum SafetyError {
    /// Another job is in flight
    Busy,
    /// Emergency stop is latched
    EmergencyStop,
}

impl core::fmt::Display for SafetyError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        let reason = match self {
            SafetyError::Busy => "carrier is busy",
            SafetyError::EmergencyStop => "emergency stop active",
        };
        f.write_str(reason)
    }
}

impl core::error::Error for SafetyError {}

/// Busy gate and emergency stop latch
#[derive(Debug, Clone)]
pub struct SafetySupervisor {
    state: SafetyState,
    /// Actuator angle that is always allowed, so the dump can be closed
    close_angle: u8,
}

impl SafetySupervisor {
    pub fn new(close_angle: u8) -> Self {
        Self {
            state: SafetyState::default(),
            close_angle,
        }
    }

    pub fn state(&self) -> SafetyState {
        self.state
    }

    pub fn is_busy(&self) -> bool {
        self.state.busy
    }

    pub fn is_stopped(&self) -> bool {
        self.state.emergency_stop
    }

    /// Check a new job could start
    pub fn ensure_ready(&self) -> Result<(), SafetyError> {
        if self.state.emergency_stop {
            return Err(SafetyError::EmergencyStop);
        }
        if self.state.busy {
            return Err(SafetyError::Busy);
        }
        Ok(())
    }

    /// Claim the busy flag for a new job
    pub fn try_acquire(&mut self) -> Result<(), SafetyError> {
        self.ensure_ready()?;
        self.state.busy = true;
        Ok(())
    }

    /// Give the busy flag back once a job ends
    pub fn release(&mut self) {
        self.state.busy = false;
    }

    /// Latch the emergency stop
    ///
    /// Returns the directives that halt the carrier: both axis brakes and
    /// the actuator close.
    pub fn emergency_stop(&mut self) -> [Directive; 3] {
        self.state.emergency_stop = true;
        self.state.busy = false;
        [
            Directive::Brake(Axis::Horizontal),
            Directive::Brake(Axis::Vertical),
            Directive::Servo(self.close_angle),
        ]
    }

    /// Reset both flags on top-level screen entry
    pub fn clear_on_screen_entry(&mut self) {
        self.state = SafetyState::default();
    }

    /// Check a directive may be transmitted
    pub fn admit(&self, directive: &Directive) -> Result<(), SafetyError> {
        if !self.state.emergency_stop {
            return Ok(());
        }
        match directive {
            Directive::Brake(_) => Ok(()),
            Directive::Servo(angle) if *angle == self.close_angle => Ok(()),
            _ => Err(SafetyError::EmergencyStop),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use canicas_protocol::TrimMotor;

    const CLOSED: u8 = 65;

    #[test]
    fn test_busy_gate() {
        let mut supervisor = SafetySupervisor::new(CLOSED);
        assert_eq!(supervisor.try_acquire(), Ok(()));
        assert_eq!(supervisor.try_acquire(), Err(SafetyError::Busy));
        supervisor.release();
        assert_eq!(supervisor.try_acquire(), Ok(()));
    }

    #[test]
    fn test_emergency_stop_clears_busy() {
        let mut supervisor = SafetySupervisor::new(CLOSED);
        supervisor.try_acquire().unwrap();
        let halt = supervisor.emergency_stop();
        assert_eq!(
            halt,
            [
                Directive::Brake(Axis::Horizontal),
                Directive::Brake(Axis::Vertical),
                Directive::Servo(CLOSED),
            ]
        );
        assert!(!supervisor.is_busy());
        assert!(supervisor.is_stopped());
        assert_eq!(supervisor.try_acquire(), Err(SafetyError::EmergencyStop));
    }

    #[test]
    fn test_stop_filters_directives() {
        let mut supervisor = SafetySupervisor::new(CLOSED);
        let travel = Directive::Travel {
            axis: Axis::Vertical,
            steps: -1328,
        };
        assert_eq!(supervisor.admit(&travel), Ok(()));

        for directive in supervisor.emergency_stop() {
            assert_eq!(supervisor.admit(&directive), Ok(()));
        }
        assert_eq!(supervisor.admit(&travel), Err(SafetyError::EmergencyStop));
        assert_eq!(
            supervisor.admit(&Directive::Servo(25)),
            Err(SafetyError::EmergencyStop)
        );
        assert_eq!(
            supervisor.admit(&Directive::Trim {
                motor: TrimMotor::Left,
                steps: 166
            }),
            Err(SafetyError::EmergencyStop)
        );
    }

    #[test]
    fn test_screen_entry_clears_stop() {
        let mut supervisor = SafetySupervisor::new(CLOSED);
        supervisor.emergency_stop();
        supervisor.clear_on_screen_entry();
        assert_eq!(supervisor.state(), SafetyState::default());
        assert_eq!(supervisor.try_acquire(), Ok(()));
    }
}

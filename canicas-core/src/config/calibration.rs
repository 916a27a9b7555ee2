//! Carrier calibration constants
//!
//! Step counts per grid cell, transit and settle times, and actuator angles.
//! Loaded from the machine configuration; defaults match the reference build.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use canicas_protocol::{Axis, Directive, DirectiveError};

use crate::motion::zone::ROWS;

/// Upper bound for a single cell step count
///
/// Keeps a full-height burst (4 cells) well inside `i32`.
pub const MAX_CELL_STEPS: u32 = 100_000;

/// Calibration validation errors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum CalibrationError {
    /// A cell step count is zero or above MAX_CELL_STEPS
    CellSteps,
    /// Fine divisor is zero or larger than a cell
    FineDivisor,
    /// Actuator angle out of range, or open equals closed
    ServoAngle,
}

impl core::fmt::Display for CalibrationError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        let reason = match self {
            CalibrationError::CellSteps => "cell step count out of range",
            CalibrationError::FineDivisor => "fine divisor must be between 1 and the cell step count",
            CalibrationError::ServoAngle => "servo angles must be distinct and within 0..=180",
        };
        f.write_str(reason)
    }
}

impl core::error::Error for CalibrationError {}

/// Carrier calibration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct Calibration {
    /// Horizontal steps per cell
    pub steps_h: u32,
    /// Vertical steps per cell
    pub steps_v: u32,
    /// Fine alignment moves are one cell divided by this
    pub fine_divisor: u32,
    /// Time for one horizontal cell transit (ms)
    pub transit_h_ms: u32,
    /// Time for one vertical cell transit (ms)
    pub transit_v_ms: u32,
    /// Dump actuator angle when open
    pub servo_open: u8,
    /// Dump actuator angle when closed
    pub servo_closed: u8,
    /// Settle time after opening the dump actuator (ms)
    pub dump_open_ms: u32,
    /// Settle time after closing the dump actuator (ms)
    pub dump_close_ms: u32,
}

impl Default for Calibration {
    fn default() -> Self {
        Self::new()
    }
}

impl Calibration {
    /// Reference machine calibration
    pub const fn new() -> Self {
        Self {
            steps_h: 1520,
            steps_v: 1328,
            fine_divisor: 8,
            transit_h_ms: 3000,
            transit_v_ms: 3000,
            servo_open: 25,
            servo_closed: 65,
            dump_open_ms: 2000,
            dump_close_ms: 1000,
        }
    }

    /// Check the calibration is usable
    pub fn validate(&self) -> Result<(), CalibrationError> {
        for steps in [self.steps_h, self.steps_v] {
            if steps == 0 || steps > MAX_CELL_STEPS {
                return Err(CalibrationError::CellSteps);
            }
        }
        if self.fine_divisor == 0 || self.fine_divisor > self.steps_h.min(self.steps_v) {
            return Err(CalibrationError::FineDivisor);
        }
        if Directive::servo(self.servo_open).is_err()
            || Directive::servo(self.servo_closed).is_err()
            || self.servo_open == self.servo_closed
        {
            return Err(CalibrationError::ServoAngle);
        }
        Ok(())
    }

    /// Steps for one full cell on an axis
    pub fn cell_steps(&self, axis: Axis) -> i32 {
        let steps = match axis {
            Axis::Horizontal => self.steps_h,
            Axis::Vertical => self.steps_v,
        };
        steps.min(MAX_CELL_STEPS) as i32
    }

    /// Steps for one fine alignment sub-step on an axis
    pub fn fine_steps(&self, axis: Axis) -> i32 {
        (self.cell_steps(axis) / self.fine_divisor.max(1) as i32).max(1)
    }

    /// Transit time for `cells` cells on an axis (ms)
    pub fn transit_ms(&self, axis: Axis, cells: u8) -> u32 {
        let per_cell = match axis {
            Axis::Horizontal => self.transit_h_ms,
            Axis::Vertical => self.transit_v_ms,
        };
        per_cell.saturating_mul(u32::from(cells.clamp(1, ROWS)))
    }

    /// Travel directive for a signed number of cells
    pub fn cells(&self, axis: Axis, cells: i32) -> Result<Directive, DirectiveError> {
        Directive::travel(axis, self.cell_steps(axis).saturating_mul(cells))
    }

    /// Open actuator directive
    pub fn open(&self) -> Directive {
        Directive::Servo(self.servo_open)
    }

    /// Close actuator directive
    pub fn close(&self) -> Directive {
        Directive::Servo(self.servo_closed)
    }
}

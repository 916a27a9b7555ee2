//! Configuration type definitions
//!
//! Calibration constants for the carrier. The host loads them from its
//! machine configuration file; the defaults match the reference machine.

pub mod calibration;

pub use calibration::{Calibration, CalibrationError};

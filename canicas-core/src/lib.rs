//! Board-agnostic core logic for the marble sorter carrier
//!
//! This crate contains all application logic that does not depend on the
//! serial transport or the host runtime:
//!
//! - Zone graph, move validation and directive compilation
//! - Position tracking state machine and the safe-return maneuver
//! - Route builder, route queue and the route execution engine
//! - Safety supervision (busy gating, emergency stop)
//! - Operator screen rules and marble counters
//! - Calibration constants and the directive link trait

#![cfg_attr(not(test), no_std)]
#![deny(unsafe_code)]

pub mod config;
pub mod motion;
pub mod safety;
pub mod scheduler;
pub mod state;
pub mod traits;

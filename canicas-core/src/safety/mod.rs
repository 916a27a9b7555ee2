//! Safety supervision
//!
//! Busy gating for motion jobs and the emergency stop latch.

pub mod supervisor;

pub use supervisor::{SafetyError, SafetyState, SafetySupervisor};

//! Operator state
//!
//! Top-level screen state machine and the marble counters.

pub mod counters;
pub mod events;
pub mod machine;

pub use counters::{LastEvent, MarbleCounters};
pub use events::ScreenEvent;
pub use machine::{Capability, Screen};

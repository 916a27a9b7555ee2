//! Carrier motion
//!
//! Zone graph, loaded-move validation, directive compilation, position
//! tracking and the safe-return maneuver.

pub mod compiler;
pub mod position;
pub mod safe_return;
pub mod validator;
pub mod zone;

pub use compiler::{compile, plan_transit};
pub use position::{Motion, MotionError, MotionState, Position, PositionTracker, Prompt};
pub use safe_return::next_transit;
pub use validator::{step_target, validate, Direction, MoveError};
pub use zone::{GridCoordinate, Zone};

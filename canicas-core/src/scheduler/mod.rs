//! Route scheduling
//!
//! Route building, the route queue and the job sequencer that executes
//! them.

pub mod builder;
pub mod executor;
pub mod queue;

pub use builder::{Route, RouteBuilder, RouteError, MAX_PATH_LEN};
pub use executor::{ExecutionPhase, Job, Op, SequenceError, Sequencer};
pub use queue::{Admission, QueueError, RouteQueue, Shift, MAX_ROUTES};

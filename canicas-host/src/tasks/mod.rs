//! Embassy async tasks
//!
//! Each task runs independently and communicates via channels/signals.

pub mod controller;
pub mod motion;
pub mod serial_tx;

pub use controller::controller_task;
pub use motion::motion_task;
pub use serial_tx::serial_tx_task;

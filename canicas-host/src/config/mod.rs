//! Configuration loading and parsing
//!
//! Loads `machine.toml` from a path given on the command line, or the
//! embedded default.

pub mod loader;

pub use loader::{load, SerialConfig};

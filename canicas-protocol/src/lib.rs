//! Marble sorter serial line protocol
//!
//! This crate defines the newline-terminated ASCII protocol between the host
//! (operator computer) and the motion controller board that drives the two
//! carrier axes and the dump actuator.
//!
//! # Protocol Overview
//!
//! Outbound directives, one per line:
//! ```text
//! H<±steps>   horizontal travel        H0   horizontal brake
//! V<±steps>   vertical travel          V0   vertical brake
//! S<angle>    dump actuator angle
//! L<±steps>   left vertical motor trim
//! R<±steps>   right vertical motor trim
//! ```
//!
//! Inbound telemetry, one event per line:
//! ```text
//! #<kind>,<entries>,<exits>,<current>
//! ```
//!
//! The controller board is a plain executor. All grid and route logic stays
//! on the host.

#![cfg_attr(not(test), no_std)]
#![deny(unsafe_code)]

pub mod directive;
pub mod line;
pub mod telemetry;

pub use directive::{Axis, Directive, DirectiveError, Line, TrimMotor, MAX_LINE_LEN};
pub use line::{LineAssembler, LineError, MAX_INBOUND_LINE};
pub use telemetry::{TelemetryError, TelemetryFrame, TelemetryKind};

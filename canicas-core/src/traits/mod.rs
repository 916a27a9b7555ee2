//! Transport abstraction traits
//!
//! These traits define the interface between the application logic and
//! the link to the controller board.

pub mod link;

pub use link::DirectiveLink;

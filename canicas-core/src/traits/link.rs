//! Directive link trait
//!
//! Abstracts the outbound path to the controller board: a serial port on
//! real hardware, or a logging stand-in when no board is attached.

use canicas_protocol::Directive;

/// Outbound directive transport
pub trait DirectiveLink {
    /// Transport error type
    type Error;

    /// Encode and send one directive
    ///
    /// Returns once the line is handed to the transport. Motion completion
    /// is not reported back; callers wait for the transit time instead.
    fn transmit(&mut self, directive: &Directive) -> Result<(), Self::Error>;

    /// Check if directives are only logged, not sent
    fn is_simulated(&self) -> bool {
        false
    }
}

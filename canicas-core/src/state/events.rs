//! Operator navigation events

use super::machine::Screen;

/// Events that change the top-level screen
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ScreenEvent {
    /// Operator opened a screen
    Open(Screen),
    /// Operator backed out to the main menu
    Back,
}

//! Operator screen state machine
//!
//! The operator works in one top-level screen at a time. Each screen admits
//! its own set of requests; a few are admitted everywhere.

use super::events::ScreenEvent;

/// Top-level operator screens
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Screen {
    #[default]
    MainMenu,
    /// Direct carrier control
    Manual,
    /// Route building and queue execution
    Programmed,
    /// Jog, trim and re-home
    Calibration,
}

/// Request families, admitted per screen
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Capability {
    /// Manual steps and go-to
    Drive,
    /// Builder, queue and run
    Program,
    /// Jog, trim, actuator and confirm-at-S1
    Calibrate,
    /// Full reset, emergency stop, confirmation, status
    Anywhere,
}

impl Screen {
    /// Process an event and return the next screen
    pub fn transition(self, event: ScreenEvent) -> Self {
        match event {
            ScreenEvent::Open(screen) => screen,
            ScreenEvent::Back => Screen::MainMenu,
        }
    }

    /// Check if a request family is admitted on this screen
    pub fn permits(self, capability: Capability) -> bool {
        match capability {
            Capability::Anywhere => true,
            Capability::Drive => self == Screen::Manual,
            Capability::Program => self == Screen::Programmed,
            Capability::Calibrate => self == Screen::Calibration,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Screen::MainMenu => "main menu",
            Screen::Manual => "manual",
            Screen::Programmed => "programmed",
            Screen::Calibration => "calibration",
        }
    }
}

impl core::fmt::Display for Screen {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.name())
    }
}

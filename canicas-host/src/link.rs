//! Directive links
//!
//! The hardware link writes encoded directives to the serial port. When the
//! port cannot be opened the host degrades to a simulated link that only
//! logs what it would have sent.

use std::io::{self, Write};
use std::thread;
use std::time::Duration;

use serialport::SerialPort;
use tracing::{info, warn};

use canicas_core::traits::DirectiveLink;
use canicas_protocol::Directive;

use crate::config::SerialConfig;
use crate::error::HostError;

/// Serial connection to the controller board
pub struct SerialLink {
    port: Box<dyn SerialPort>,
}

impl SerialLink {
    /// Open the port and wait for the board to come out of reset
    pub fn open(config: &SerialConfig) -> Result<Self, HostError> {
        let port = serialport::new(&config.port, config.baud_rate)
            .timeout(Duration::from_millis(config.read_timeout_ms))
            .open()
            .map_err(|source| HostError::Serial {
                port: config.port.clone(),
                source,
            })?;
        info!("Opened {} @ {} baud", config.port, config.baud_rate);

        // Opening the port resets most boards
        thread::sleep(Duration::from_millis(config.settle_ms));
        Ok(Self { port })
    }

    /// Second handle on the same port, for the telemetry reader
    pub fn try_clone_reader(&self) -> Result<Box<dyn SerialPort>, serialport::Error> {
        self.port.try_clone()
    }
}

impl DirectiveLink for SerialLink {
    type Error = io::Error;

    fn transmit(&mut self, directive: &Directive) -> Result<(), Self::Error> {
        let line = directive.to_line();
        self.port.write_all(line.as_bytes())?;
        self.port.flush()?;
        info!("TX {}", directive);
        Ok(())
    }
}

/// Stand-in link that logs directives
#[derive(Debug, Default)]
pub struct SimulatedLink;

impl DirectiveLink for SimulatedLink {
    type Error = io::Error;

    fn transmit(&mut self, directive: &Directive) -> Result<(), Self::Error> {
        info!("SIM {}", directive);
        Ok(())
    }

    fn is_simulated(&self) -> bool {
        true
    }
}

/// Link selected at startup
pub enum HostLink {
    Serial(SerialLink),
    Simulated(SimulatedLink),
}

impl DirectiveLink for HostLink {
    type Error = io::Error;

    fn transmit(&mut self, directive: &Directive) -> Result<(), Self::Error> {
        match self {
            HostLink::Serial(link) => link.transmit(directive),
            HostLink::Simulated(link) => link.transmit(directive),
        }
    }

    fn is_simulated(&self) -> bool {
        match self {
            HostLink::Serial(link) => link.is_simulated(),
            HostLink::Simulated(link) => link.is_simulated(),
        }
    }
}

/// Open the configured link
///
/// Returns the link and, on hardware, a reader handle for telemetry. Any
/// failure to open the port falls back to simulation.
pub fn open_link(config: &SerialConfig, simulate: bool) -> (HostLink, Option<Box<dyn SerialPort>>) {
    if simulate {
        info!("Simulation mode, directives are logged only");
        return (HostLink::Simulated(SimulatedLink), None);
    }

    let link = match SerialLink::open(config) {
        Ok(link) => link,
        Err(e) => {
            warn!("{}", e);
            warn!("Falling back to simulation mode");
            return (HostLink::Simulated(SimulatedLink), None);
        }
    };

    match link.try_clone_reader() {
        Ok(reader) => (HostLink::Serial(link), Some(reader)),
        Err(e) => {
            warn!("No telemetry reader for {}: {}", config.port, e);
            (HostLink::Serial(link), None)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use canicas_protocol::Axis;

    #[test]
    fn test_simulated_link_accepts_everything() {
        let mut link = HostLink::Simulated(SimulatedLink);
        assert!(link.is_simulated());
        assert!(link.transmit(&Directive::Brake(Axis::Vertical)).is_ok());
        assert!(link.transmit(&Directive::Servo(65)).is_ok());
    }

    #[test]
    fn test_open_falls_back_to_simulation() {
        let config = SerialConfig {
            port: "/dev/canicas-missing".into(),
            settle_ms: 0,
            ..SerialConfig::default()
        };
        let (link, reader) = open_link(&config, false);
        assert!(link.is_simulated());
        assert!(reader.is_none());
    }

    #[test]
    fn test_simulate_flag_skips_port() {
        let (link, reader) = open_link(&SerialConfig::default(), true);
        assert!(link.is_simulated());
        assert!(reader.is_none());
    }
}

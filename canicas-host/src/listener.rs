//! Serial telemetry listener
//!
//! Runs on its own OS thread with a cloned port handle, so a blocking read
//! never stalls the executor. Valid frames go to the controller; malformed
//! telemetry is logged and dropped. The listener never writes to the port.

use std::io::{self, Read};
use std::thread::{self, JoinHandle};

use serialport::SerialPort;
use tracing::{debug, error, info, trace, warn};

use canicas_protocol::{LineAssembler, TelemetryError, TelemetryFrame};

use crate::channels::TELEMETRY;
use crate::error::HostError;

/// Classified inbound line
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Inbound {
    Telemetry(TelemetryFrame),
    /// Line starts with `#` but does not parse
    Malformed(TelemetryError),
    /// Anything else the board prints
    Other,
}

/// Sort one inbound line
pub fn classify(line: &str) -> Inbound {
    if !TelemetryFrame::is_telemetry(line) {
        return Inbound::Other;
    }
    match TelemetryFrame::parse(line) {
        Ok(frame) => Inbound::Telemetry(frame),
        Err(e) => Inbound::Malformed(e),
    }
}

/// Start the listener thread
pub fn spawn_listener(port: Box<dyn SerialPort>) -> Result<JoinHandle<()>, HostError> {
    thread::Builder::new()
        .name("telemetry".into())
        .spawn(move || listen(port))
        .map_err(|source| HostError::Thread {
            name: "telemetry",
            source,
        })
}

fn listen(mut port: Box<dyn SerialPort>) {
    info!("Telemetry listener started");
    let mut assembler = LineAssembler::new();
    let mut buffer = [0u8; 256];

    loop {
        let n = match port.read(&mut buffer) {
            Ok(0) => continue,
            Ok(n) => n,
            // Read timeouts are the idle case
            Err(ref e) if e.kind() == io::ErrorKind::TimedOut => continue,
            Err(e) => {
                error!("Serial read failed, telemetry stopped: {}", e);
                return;
            }
        };

        for &byte in &buffer[..n] {
            match assembler.feed(byte) {
                Ok(Some(line)) => dispatch(&line),
                Ok(None) => {}
                Err(e) => warn!("Dropped inbound line: {:?}", e),
            }
        }
    }
}

fn dispatch(line: &str) {
    match classify(line) {
        Inbound::Telemetry(frame) => {
            debug!("RX {}", line);
            if TELEMETRY.try_send(frame).is_err() {
                warn!("Telemetry channel full, frame dropped");
            }
        }
        Inbound::Malformed(e) => warn!("Malformed telemetry {:?}: {}", line, e),
        Inbound::Other => trace!("Board: {}", line),
    }
}

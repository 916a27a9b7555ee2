//! Machine configuration
//!
//! Every key is optional; missing keys take the defaults below, which match
//! the embedded `machine.toml`.

use std::fs;
use std::path::Path;

use serde::Deserialize;
use tracing::info;

use canicas_core::config::Calibration;

use crate::error::HostError;

/// Embedded default configuration
const EMBEDDED_CONFIG: &str = include_str!("../../machine.toml");

/// Serial link settings
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct SerialConfig {
    pub port: String,
    pub baud_rate: u32,
    /// Wait after opening while the board resets (ms)
    pub settle_ms: u64,
    pub read_timeout_ms: u64,
}

impl Default for SerialConfig {
    fn default() -> Self {
        Self {
            port: "/dev/ttyACM0".into(),
            baud_rate: 115_200,
            settle_ms: 2000,
            read_timeout_ms: 100,
        }
    }
}

/// Runtime behaviour
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct RuntimeConfig {
    /// Transit wait poll interval (ms)
    pub poll_interval_ms: u64,
    /// Log directives instead of sending them
    pub simulate: bool,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            poll_interval_ms: 100,
            simulate: false,
        }
    }
}

/// Complete machine configuration
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct MachineConfig {
    pub serial: SerialConfig,
    pub calibration: Calibration,
    pub runtime: RuntimeConfig,
}

impl MachineConfig {
    /// Reject values the controller cannot work with
    pub fn validate(&self) -> Result<(), HostError> {
        self.calibration.validate()?;
        if self.runtime.poll_interval_ms == 0 {
            return Err(HostError::Invalid("poll_interval_ms must be non-zero"));
        }
        if self.serial.baud_rate == 0 {
            return Err(HostError::Invalid("baud_rate must be non-zero"));
        }
        Ok(())
    }
}

/// Parse and validate a TOML document
pub fn parse_config(text: &str) -> Result<MachineConfig, HostError> {
    let config: MachineConfig = toml::from_str(text)?;
    config.validate()?;
    Ok(config)
}

/// Load the configuration from `path`, or the embedded default
pub fn load(path: Option<&Path>) -> Result<MachineConfig, HostError> {
    match path {
        Some(path) => {
            let text = fs::read_to_string(path).map_err(|source| HostError::ConfigRead {
                path: path.to_path_buf(),
                source,
            })?;
            let config = parse_config(&text)?;
            info!("Loaded configuration from {}", path.display());
            Ok(config)
        }
        None => {
            let config = parse_config(EMBEDDED_CONFIG)?;
            info!("Using embedded configuration");
            Ok(config)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_embedded_config_matches_defaults() {
        let config = parse_config(EMBEDDED_CONFIG).unwrap();
        assert_eq!(config, MachineConfig::default());
    }

    #[test]
    fn test_missing_keys_take_defaults() {
        let config = parse_config("[calibration]\nsteps_h = 1600\n").unwrap();
        assert_eq!(config.calibration.steps_h, 1600);
        assert_eq!(config.calibration.steps_v, 1328);
        assert_eq!(config.serial, SerialConfig::default());
        assert_eq!(config.runtime.poll_interval_ms, 100);
    }

    #[test]
    fn test_empty_document_is_default() {
        assert_eq!(parse_config("").unwrap(), MachineConfig::default());
    }

    #[test]
    fn test_rejects_zero_steps() {
        let err = parse_config("[calibration]\nsteps_v = 0\n").unwrap_err();
        assert!(matches!(err, HostError::Calibration(_)));
    }

    #[test]
    fn test_rejects_zero_poll_interval() {
        let err = parse_config("[runtime]\npoll_interval_ms = 0\n").unwrap_err();
        assert!(matches!(err, HostError::Invalid(_)));
    }

    #[test]
    fn test_rejects_bad_syntax() {
        let err = parse_config("[serial\nport = 3").unwrap_err();
        assert!(matches!(err, HostError::ConfigParse(_)));
    }

    #[test]
    fn test_missing_file() {
        let err = load(Some(Path::new("/nonexistent/machine.toml"))).unwrap_err();
        assert!(matches!(err, HostError::ConfigRead { .. }));
    }
}

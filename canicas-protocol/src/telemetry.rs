//! Inbound telemetry frames.
//!
//! The controller board reports marble sensor events as
//! `#<kind>,<entries>,<exits>,<current>`, for example `#IN,5,2,3`.

use heapless::String;

/// First character of every telemetry line
pub const TELEMETRY_PREFIX: char = '#';

/// Maximum length of the event kind field
pub const MAX_KIND_LEN: usize = 8;

/// Sensor event that produced a frame
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TelemetryKind {
    /// Marble entered the bin (`IN`)
    Entry,
    /// Marble left the bin (`OUT`)
    Exit,
    /// Any other alphanumeric event name
    Other(String<MAX_KIND_LEN>),
}

impl TelemetryKind {
    fn parse(field: &str) -> Result<Self, TelemetryError> {
        if field.is_empty() {
            return Err(TelemetryError::EmptyKind);
        }
        if !field.chars().all(|c| c.is_ascii_alphanumeric()) {
            return Err(TelemetryError::InvalidKind);
        }
        match field {
            "IN" => Ok(TelemetryKind::Entry),
            "OUT" => Ok(TelemetryKind::Exit),
            other => {
                let mut name = String::new();
                name.push_str(other)
                    .map_err(|_| TelemetryError::InvalidKind)?;
                Ok(TelemetryKind::Other(name))
            }
        }
    }

    /// Wire name of this kind
    pub fn as_str(&self) -> &str {
        match self {
            TelemetryKind::Entry => "IN",
            TelemetryKind::Exit => "OUT",
            TelemetryKind::Other(name) => name.as_str(),
        }
    }
}

/// Telemetry parse errors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum TelemetryError {
    /// Line does not start with `#`
    NotTelemetry,
    /// Wrong number of comma-separated fields
    FieldCount,
    /// Kind field is empty
    EmptyKind,
    /// Kind field is too long or not alphanumeric
    InvalidKind,
    /// A counter is not a non-negative integer
    InvalidNumber,
}

impl core::fmt::Display for TelemetryError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        let reason = match self {
            TelemetryError::NotTelemetry => "not a telemetry line",
            TelemetryError::FieldCount => "expected 4 comma-separated fields",
            TelemetryError::EmptyKind => "empty event kind",
            TelemetryError::InvalidKind => "invalid event kind",
            TelemetryError::InvalidNumber => "counter is not a non-negative integer",
        };
        f.write_str(reason)
    }
}

impl core::error::Error for TelemetryError {}

/// A parsed marble counter report
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TelemetryFrame {
    /// Event that triggered the report
    pub kind: TelemetryKind,
    /// Marbles that entered the bin since power-up
    pub entries: u32,
    /// Marbles that left the bin since power-up
    pub exits: u32,
    /// Marbles currently in the bin
    pub current: u32,
}

impl TelemetryFrame {
    /// Parse a telemetry line (trailing `\r`/`\n` allowed)
    pub fn parse(line: &str) -> Result<Self, TelemetryError> {
        let line = line.trim_end_matches(['\r', '\n']);
        let body = line
            .strip_prefix(TELEMETRY_PREFIX)
            .ok_or(TelemetryError::NotTelemetry)?;

        let mut fields = body.split(',');
        let (Some(kind), Some(entries), Some(exits), Some(current), None) = (
            fields.next(),
            fields.next(),
            fields.next(),
            fields.next(),
            fields.next(),
        ) else {
            return Err(TelemetryError::FieldCount);
        };

        Ok(Self {
            kind: TelemetryKind::parse(kind.trim())?,
            entries: parse_counter(entries)?,
            exits: parse_counter(exits)?,
            current: parse_counter(current)?,
        })
    }

    /// Check if a raw line is meant as telemetry
    pub fn is_telemetry(line: &str) -> bool {
        line.starts_with(TELEMETRY_PREFIX)
    }
}

fn parse_counter(field: &str) -> Result<u32, TelemetryError> {
    let field = field.trim();
    // u32 parsing accepts a leading '+', the board never sends one
    if field.starts_with('+') {
        return Err(TelemetryError::InvalidNumber);
    }
    field.parse().map_err(|_| TelemetryError::InvalidNumber)
}

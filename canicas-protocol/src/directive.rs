//! Outbound motion and actuator directives.
//!
//! Directive format: a single command letter followed by a signed decimal
//! integer, terminated by `\n`:
//! - `H`/`V`: travel on the horizontal/vertical axis (`H0`/`V0` brake)
//! - `S`: dump actuator angle in degrees
//! - `L`/`R`: trim a single vertical motor (calibration only)

use core::fmt::{self, Write};

use heapless::String;

/// Longest encoded line, including the terminating newline
///
/// `L-2147483648\n` is 13 bytes.
pub const MAX_LINE_LEN: usize = 16;

/// Highest accepted actuator angle
///
/// The board spreads its pulse width over 0..=270 degrees and clamps above
/// that. The dump gate only travels 0..=180, so anything past it is refused
/// here instead of driving the gate into its stop.
pub const MAX_SERVO_ANGLE: u8 = 180;

/// An encoded, newline-terminated directive
pub type Line = String<MAX_LINE_LEN>;

/// Carrier axis
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Axis {
    /// Column travel (positive = rightward)
    Horizontal,
    /// Row travel (positive = ascend, negative = descend)
    Vertical,
}

impl Axis {
    /// Command letter on the wire
    pub const fn letter(self) -> char {
        match self {
            Axis::Horizontal => 'H',
            Axis::Vertical => 'V',
        }
    }
}

/// Individual vertical motor, used for fine trim
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum TrimMotor {
    Left,
    Right,
}

impl TrimMotor {
    /// Command letter on the wire
    pub const fn letter(self) -> char {
        match self {
            TrimMotor::Left => 'L',
            TrimMotor::Right => 'R',
        }
    }
}

/// Errors building or parsing a directive
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum DirectiveError {
    /// Line was empty
    Empty,
    /// Unknown command letter
    UnknownCommand,
    /// Argument is not a decimal integer
    InvalidNumber,
    /// Travel or trim with a zero step count
    ZeroSteps,
    /// Actuator angle outside 0..=180
    AngleOutOfRange,
}

impl fmt::Display for DirectiveError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let reason = match self {
            DirectiveError::Empty => "empty directive",
            DirectiveError::UnknownCommand => "unknown command letter",
            DirectiveError::InvalidNumber => "argument is not an integer",
            DirectiveError::ZeroSteps => "step count must be non-zero",
            DirectiveError::AngleOutOfRange => "actuator angle out of range",
        };
        f.write_str(reason)
    }
}

impl core::error::Error for DirectiveError {}

/// A single command for the motion controller
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Directive {
    /// Move one axis by a signed, non-zero step count
    Travel { axis: Axis, steps: i32 },
    /// Stop one axis immediately
    Brake(Axis),
    /// Drive the dump actuator to an angle
    Servo(u8),
    /// Move one vertical motor alone by a signed, non-zero step count
    Trim { motor: TrimMotor, steps: i32 },
}

impl Directive {
    /// Create a travel directive
    pub fn travel(axis: Axis, steps: i32) -> Result<Self, DirectiveError> {
        if steps == 0 {
            return Err(DirectiveError::ZeroSteps);
        }
        Ok(Directive::Travel { axis, steps })
    }

    /// Create a single-motor trim directive
    pub fn trim(motor: TrimMotor, steps: i32) -> Result<Self, DirectiveError> {
        if steps == 0 {
            return Err(DirectiveError::ZeroSteps);
        }
        Ok(Directive::Trim { motor, steps })
    }

    /// Create an actuator directive
    pub fn servo(angle: u8) -> Result<Self, DirectiveError> {
        if angle > MAX_SERVO_ANGLE {
            return Err(DirectiveError::AngleOutOfRange);
        }
        Ok(Directive::Servo(angle))
    }

    /// Check if this is an axis brake
    pub const fn is_brake(&self) -> bool {
        matches!(self, Directive::Brake(_))
    }

    /// Axis moved by this directive, if any
    pub const fn axis(&self) -> Option<Axis> {
        match self {
            Directive::Travel { axis, .. } | Directive::Brake(axis) => Some(*axis),
            Directive::Servo(_) | Directive::Trim { .. } => None,
        }
    }

    /// Encode as a newline-terminated line
    pub fn to_line(&self) -> Line {
        let mut line = Line::new();
        // Longest rendering is 13 bytes, always within MAX_LINE_LEN
        let _ = writeln!(line, "{}", self);
        line
    }

    /// Parse a directive from a line (trailing `\r`/`\n` allowed)
    ///
    /// Command letters are accepted in either case, as the controller board
    /// does.
    pub fn parse(line: &str) -> Result<Self, DirectiveError> {
        let line = line.trim_end_matches(['\r', '\n']);
        let mut chars = line.chars();
        let letter = chars.next().ok_or(DirectiveError::Empty)?;
        let argument = chars.as_str();

        let value: i32 = argument
            .parse()
            .map_err(|_| DirectiveError::InvalidNumber)?;

        match letter.to_ascii_uppercase() {
            'H' if value == 0 => Ok(Directive::Brake(Axis::Horizontal)),
            'V' if value == 0 => Ok(Directive::Brake(Axis::Vertical)),
            'H' => Directive::travel(Axis::Horizontal, value),
            'V' => Directive::travel(Axis::Vertical, value),
            'L' => Directive::trim(TrimMotor::Left, value),
            'R' => Directive::trim(TrimMotor::Right, value),
            'S' => {
                let angle = u8::try_from(value).map_err(|_| DirectiveError::AngleOutOfRange)?;
                Directive::servo(angle)
            }
            _ => Err(DirectiveError::UnknownCommand),
        }
    }
}

impl fmt::Display for Directive {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Directive::Travel { axis, steps } => write!(f, "{}{}", axis.letter(), steps),
            Directive::Brake(axis) => write!(f, "{}0", axis.letter()),
            Directive::Servo(angle) => write!(f, "S{}", angle),
            Directive::Trim { motor, steps } => write!(f, "{}{}", motor.letter(), steps),
        }
    }
}

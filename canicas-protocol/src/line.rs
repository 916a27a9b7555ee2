//! Byte stream to line assembly for the inbound serial link.
//!
//! Lines are terminated by `\n`; a preceding `\r` is dropped. Blank lines are
//! skipped. A line that overflows the buffer or carries non-ASCII bytes is
//! discarded up to its terminator, and the error is reported once.

use heapless::String;

/// Maximum inbound line length (excluding terminator)
pub const MAX_INBOUND_LINE: usize = 64;

/// Errors that can occur during line assembly
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum LineError {
    /// Line exceeded MAX_INBOUND_LINE bytes
    Overflow,
    /// Non-ASCII byte in line
    InvalidByte(u8),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum AssembleState {
    /// Accumulating bytes of the current line
    Collecting,
    /// Dropping bytes until the next terminator
    Discarding,
}

/// State machine assembling newline-terminated lines
#[derive(Debug, Clone)]
pub struct LineAssembler {
    state: AssembleState,
    buffer: String<MAX_INBOUND_LINE>,
}

impl Default for LineAssembler {
    fn default() -> Self {
        Self::new()
    }
}

impl LineAssembler {
    /// Create a new line assembler
    pub fn new() -> Self {
        Self {
            state: AssembleState::Collecting,
            buffer: String::new(),
        }
    }

    /// Reset the assembler state
    pub fn reset(&mut self) {
        self.state = AssembleState::Collecting;
        self.buffer.clear();
    }

    /// Feed a single byte
    ///
    /// Returns `Ok(Some(line))` when a complete non-empty line is assembled,
    /// `Ok(None)` when more bytes are needed, or `Err` when the current line
    /// is being discarded.
    pub fn feed(&mut self, byte: u8) -> Result<Option<String<MAX_INBOUND_LINE>>, LineError> {
        match (self.state, byte) {
            (AssembleState::Discarding, b'\n') => {
                self.reset();
                Ok(None)
            }
            (AssembleState::Discarding, _) => Ok(None),
            (AssembleState::Collecting, b'\n') => {
                if self.buffer.is_empty() {
                    return Ok(None);
                }
                let line = self.buffer.clone();
                self.buffer.clear();
                Ok(Some(line))
            }
            (AssembleState::Collecting, b'\r') => Ok(None),
            (AssembleState::Collecting, byte) if !byte.is_ascii() => {
                self.discard();
                Err(LineError::InvalidByte(byte))
            }
            (AssembleState::Collecting, byte) => {
                if self.buffer.push(byte as char).is_err() {
                    self.discard();
                    return Err(LineError::Overflow);
                }
                Ok(None)
            }
        }
    }

    fn discard(&mut self) {
        self.buffer.clear();
        self.state = AssembleState::Discarding;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn feed_all(assembler: &mut LineAssembler, bytes: &[u8]) -> std::vec::Vec<Result<std::string::String, LineError>> {
        let mut out = std::vec::Vec::new();
        for &byte in bytes {
            match assembler.feed(byte) {
                Ok(Some(line)) => out.push(Ok(std::string::String::from(line.as_str()))),
                Ok(None) => {}
                Err(e) => out.push(Err(e)),
            }
        }
        out
    }

    #[test]
    fn test_assembles_lines() {
        let mut assembler = LineAssembler::new();
        let lines = feed_all(&mut assembler, b"#IN,1,0,1\r\n#OUT,1,1,0\n");
        assert_eq!(
            lines,
            vec![Ok("#IN,1,0,1".into()), Ok("#OUT,1,1,0".into())]
        );
    }

    #[test]
    fn test_partial_line_waits_for_terminator() {
        let mut assembler = LineAssembler::new();
        assert!(feed_all(&mut assembler, b"#IN,1").is_empty());
        let lines = feed_all(&mut assembler, b",0,1\n");
        assert_eq!(lines, vec![Ok("#IN,1,0,1".into())]);
    }

    #[test]
    fn test_blank_lines_skipped() {
        let mut assembler = LineAssembler::new();
        assert!(feed_all(&mut assembler, b"\n\r\n\n").is_empty());
    }

    #[test]
    fn test_overflow_discards_until_newline() {
        let mut assembler = LineAssembler::new();
        let mut data = std::vec![b'x'; MAX_INBOUND_LINE + 10];
        data.extend_from_slice(b"\nOK\n");
        let lines = feed_all(&mut assembler, &data);
        assert_eq!(lines, vec![Err(LineError::Overflow), Ok("OK".into())]);
    }

    #[test]
    fn test_invalid_byte_resyncs() {
        let mut assembler = LineAssembler::new();
        let lines = feed_all(&mut assembler, b"ab\xffcd\n#IN,1,0,1\n");
        assert_eq!(
            lines,
            vec![Err(LineError::InvalidByte(0xff)), Ok("#IN,1,0,1".into())]
        );
    }
}

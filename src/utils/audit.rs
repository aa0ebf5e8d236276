//! # Audit Log
//!
//! Line-oriented logging of terminal traffic.
//!
//! Each direction keeps its own [`AuditBuffer`]. Bytes run through a VT
//! parser that keeps printable text and carriage returns and drops escape
//! sequences, including ones split across reads. Whenever the accumulated
//! text contains a carriage return, everything before the last one is
//! emitted as a single line and only the remainder is kept.
//!
//! This approximates what a user typed or saw; it does not track cursor
//! movement, so lines may not match the rendered screen.

use std::fmt;

use tracing::info;
use vte::{Parser, Perform};

/// Which side of the bridge produced the audited bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    /// Input typed by the client
    Browser,
    /// Output produced by the backend process
    Backend,
}

impl Direction {
    pub fn as_str(self) -> &'static str {
        match self {
            Direction::Browser => "browser",
            Direction::Backend => "backend",
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Collects the printable part of a byte stream.
struct Printable<'a> {
    text: &'a mut String,
}

impl Perform for Printable<'_> {
    fn print(&mut self, c: char) {
        self.text.push(c);
    }

    fn execute(&mut self, byte: u8) {
        if byte == b'\r' {
            self.text.push('\r');
        }
    }
}

/// Per-direction accumulator of not-yet-terminated terminal text.
pub struct AuditBuffer {
    parser: Parser,
    pending: String,
}

impl AuditBuffer {
    pub fn new() -> Self {
        Self {
            parser: Parser::new(),
            pending: String::new(),
        }
    }

    /// Feed raw bytes; returns the completed line, if this chunk finished one.
    ///
    /// Lines that are empty once non-graphic characters are removed are
    /// swallowed, so a bare carriage return never produces a line.
    pub fn push(&mut self, bytes: &[u8]) -> Option<String> {
        let mut sink = Printable {
            text: &mut self.pending,
        };
        self.parser.advance(&mut sink, bytes);

        let pos = self.pending.rfind('\r')?;
        let remainder = self.pending.split_off(pos + 1);
        let completed = std::mem::replace(&mut self.pending, remainder);

        let line: String = completed.chars().filter(|c| !c.is_control()).collect();
        if line.trim().is_empty() {
            None
        } else {
            Some(line)
        }
    }

    /// Text received since the last completed line
    pub fn pending(&self) -> &str {
        &self.pending
    }
}

impl Default for AuditBuffer {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for AuditBuffer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AuditBuffer")
            .field("pending", &self.pending)
            .finish()
    }
}

/// An [`AuditBuffer`] bound to a direction and session label, emitting each
/// completed line as a structured log event.
#[derive(Debug)]
pub struct AuditLog {
    direction: Direction,
    username: Option<String>,
    buffer: AuditBuffer,
}

impl AuditLog {
    pub fn new(direction: Direction, username: Option<String>) -> Self {
        Self {
            direction,
            username,
            buffer: AuditBuffer::new(),
        }
    }

    /// Feed bytes and log the line they complete, if any.
    pub fn record(&mut self, bytes: &[u8]) -> Option<String> {
        let line = self.buffer.push(bytes)?;
        match self.username {
            Some(ref username) => info!(
                log_type = "audit",
                stream = self.direction.as_str(),
                username = %username,
                "{line}"
            ),
            None => info!(log_type = "audit", stream = self.direction.as_str(), "{line}"),
        }
        Some(line)
    }

    pub fn direction(&self) -> Direction {
        self.direction
    }
}

use crate::config::TerminalConfig;
use crate::core::codec::{Decoder, Encoding};
use crate::error::{constants, Result};
use crate::protocol::message::{ClientMessage, TerminalSize};
use tracing::debug;

/// What the bridge has to do in response to one client message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    /// Write these decoded bytes to the backend
    Write(Vec<u8>),
    /// Answer a ping
    Pong,
    /// Resize the backend terminal
    Resize(TerminalSize),
    /// The active input codec changed
    EncodingChanged(&'static str),
    /// Input dropped: read-only session or empty payload
    Discard,
    /// Nothing to do (pinned geometry, unknown encoding name)
    Ignore,
}

/// Turns client frames into [`Action`]s.
///
/// Owns the active input codec; a set-encoding message swaps it in place, so
/// only frames dispatched after the switch see the new codec.
#[derive(Debug)]
pub struct Dispatcher {
    decoder: Box<dyn Decoder>,
    permit_write: bool,
    fixed: TerminalSize,
}

impl Dispatcher {
    pub fn new(decoder: Box<dyn Decoder>, permit_write: bool, fixed: TerminalSize) -> Self {
        Self {
            decoder,
            permit_write,
            fixed,
        }
    }

    /// Dispatcher for a session configured with `terminal`.
    pub fn from_config(terminal: &TerminalConfig, decoder: Box<dyn Decoder>) -> Self {
        Self::new(
            decoder,
            terminal.permit_write,
            terminal.fixed_size(),
        )
    }

    /// Replace the active input codec
    pub fn set_decoder(&mut self, decoder: Box<dyn Decoder>) {
        self.decoder = decoder;
    }

    /// Name of the active input codec
    pub fn encoding(&self) -> &'static str {
        self.decoder.name()
    }

    /// Classify `frame` and work out the action it calls for.
    ///
    /// # Errors
    /// Empty or unknown frames, undecodable input and malformed resize
    /// payloads. Errors are terminal for the session.
    pub fn dispatch(&mut self, frame: &[u8]) -> Result<Action> {
        match ClientMessage::parse(frame)? {
            ClientMessage::Input(payload) => {
                if !self.permit_write || payload.is_empty() {
                    return Ok(Action::Discard);
                }

                let mut decoded = vec![0u8; frame.len()];
                let n = self
                    .decoder
                    .decode(&mut decoded, payload)
                    .map_err(|e| e.context(constants::ERR_DECODE_INPUT))?;
                decoded.truncate(n);
                Ok(Action::Write(decoded))
            }

            ClientMessage::Ping => Ok(Action::Pong),

            ClientMessage::SetEncoding(name) => match Encoding::from_name(name) {
                Some(encoding) => {
                    self.decoder = encoding.decoder();
                    Ok(Action::EncodingChanged(encoding.as_str()))
                }
                None => {
                    debug!(
                        encoding = %String::from_utf8_lossy(name),
                        active = self.decoder.name(),
                        "Ignoring unknown encoding"
                    );
                    Ok(Action::Ignore)
                }
            },

            ClientMessage::ResizeTerminal(payload) => {
                // Pinned geometry short-circuits before the payload is validated.
                if self.fixed.is_pinned() {
                    return Ok(Action::Ignore);
                }

                let requested = TerminalSize::from_payload(payload)?;
                Ok(Action::Resize(requested.constrain(self.fixed)))
            }
        }
    }
}

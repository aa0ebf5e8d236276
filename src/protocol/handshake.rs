//! Session initialization messages.
//!
//! Before any terminal traffic, the client is told the window title, the
//! largest message it will receive, and optionally how to reconnect and which
//! preferences to apply. The order is fixed; reconnect and preferences are
//! only sent when configured.

use crate::config::BridgeConfig;
use crate::error::{constants, Result};
use crate::protocol::message::ServerMessage;

/// Contents of the initialization sequence.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Handshake {
    title: Vec<u8>,
    buffer_size: usize,
    reconnect_secs: u64,
    preferences: Option<Vec<u8>>,
}

/// One message of the sequence together with the annotation used when
/// sending it fails.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HandshakeStep<'a> {
    pub message: ServerMessage<'a>,
    pub failure: &'static str,
}

impl Handshake {
    /// Handshake announcing only a title and the buffer size.
    pub fn new(title: impl Into<Vec<u8>>, buffer_size: usize) -> Self {
        Self {
            title: title.into(),
            buffer_size,
            reconnect_secs: 0,
            preferences: None,
        }
    }

    /// Build the handshake a session with `config` sends.
    pub fn from_config(config: &BridgeConfig) -> Result<Self> {
        let mut handshake = Self::new(
            config.terminal.title.as_bytes(),
            config.transport.buffer_size,
        )
        .with_reconnect(config.client.reconnect_interval.as_secs());

        if let Some(prefs) = config.client.preferences_payload()? {
            handshake = handshake.with_preferences(prefs);
        }

        Ok(handshake)
    }

    /// Ask the client to reconnect after `secs` seconds (0 disables)
    pub fn with_reconnect(mut self, secs: u64) -> Self {
        self.reconnect_secs = secs;
        self
    }

    /// Forward pre-serialized JSON preferences
    pub fn with_preferences(mut self, prefs: impl Into<Vec<u8>>) -> Self {
        self.preferences = Some(prefs.into());
        self
    }

    /// Messages in the order they go on the wire.
    pub fn steps(&self) -> Vec<HandshakeStep<'_>> {
        let mut steps = vec![
            HandshakeStep {
                message: ServerMessage::SetWindowTitle(&self.title),
                failure: constants::ERR_WINDOW_TITLE,
            },
            HandshakeStep {
                message: ServerMessage::SetBufferSize(self.buffer_size),
                failure: constants::ERR_BUFFER_SIZE,
            },
        ];

        if self.reconnect_secs > 0 {
            steps.push(HandshakeStep {
                message: ServerMessage::SetReconnect(self.reconnect_secs),
                failure: constants::ERR_RECONNECT,
            });
        }

        if let Some(ref prefs) = self.preferences {
            steps.push(HandshakeStep {
                message: ServerMessage::SetPreferences(prefs),
                failure: constants::ERR_PREFERENCES,
            });
        }

        steps
    }
}

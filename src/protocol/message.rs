//! Tagged wire messages.
//!
//! Every message is one tag byte followed by a payload. The tag alone is
//! enough to classify a message; payloads are only parsed once the tag says
//! what they are. Tags are ASCII digits and are scoped per direction, so `'1'`
//! is input when it comes from the client and output when it goes to it.

use std::borrow::Cow;

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use bytes::{BufMut, Bytes, BytesMut};
use serde_json::{Map, Value};

use crate::core::codec::encode_output;
use crate::error::{constants, ProtocolError, Result};

/// Tags of messages sent by the client (back-bound).
pub mod client {
    /// Terminal input
    pub const INPUT: u8 = b'1';
    /// Keepalive request
    pub const PING: u8 = b'2';
    /// Terminal geometry change
    pub const RESIZE_TERMINAL: u8 = b'3';
    /// Input encoding switch
    pub const SET_ENCODING: u8 = b'4';
}

/// Tags of messages sent to the client (front-bound).
pub mod server {
    /// Terminal output
    pub const OUTPUT: u8 = b'1';
    /// Keepalive reply
    pub const PONG: u8 = b'2';
    /// Handshake: window title
    pub const SET_WINDOW_TITLE: u8 = b'3';
    /// Handshake: client preferences
    pub const SET_PREFERENCES: u8 = b'4';
    /// Handshake: reconnect interval
    pub const SET_RECONNECT: u8 = b'5';
    /// Handshake: write chunk size
    pub const SET_BUFFER_SIZE: u8 = b'6';
}

/// A message on its way to the client.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ServerMessage<'a> {
    /// Raw terminal output, base64 encoded on the wire
    Output(&'a [u8]),
    Pong,
    SetWindowTitle(&'a [u8]),
    /// Preferences, already serialized as JSON
    SetPreferences(&'a [u8]),
    /// Reconnect interval in seconds
    SetReconnect(u64),
    SetBufferSize(usize),
}

impl ServerMessage<'_> {
    /// Tag byte this message is sent with
    pub fn tag(&self) -> u8 {
        match self {
            ServerMessage::Output(_) => server::OUTPUT,
            ServerMessage::Pong => server::PONG,
            ServerMessage::SetWindowTitle(_) => server::SET_WINDOW_TITLE,
            ServerMessage::SetPreferences(_) => server::SET_PREFERENCES,
            ServerMessage::SetReconnect(_) => server::SET_RECONNECT,
            ServerMessage::SetBufferSize(_) => server::SET_BUFFER_SIZE,
        }
    }

    /// Serialize into a single frame.
    pub fn encode(&self) -> Result<Bytes> {
        let body: Cow<'_, [u8]> = match *self {
            ServerMessage::Output(data) => Cow::Owned(encode_output(data).into_bytes()),
            ServerMessage::Pong => Cow::Borrowed(&[]),
            ServerMessage::SetWindowTitle(title) => Cow::Borrowed(title),
            ServerMessage::SetPreferences(prefs) => Cow::Borrowed(prefs),
            ServerMessage::SetReconnect(secs) => Cow::Owned(serde_json::to_vec(&secs)?),
            ServerMessage::SetBufferSize(size) => Cow::Owned(serde_json::to_vec(&size)?),
        };

        let mut frame = BytesMut::with_capacity(1 + body.len());
        frame.put_u8(self.tag());
        frame.extend_from_slice(&body);
        Ok(frame.freeze())
    }
}

/// A message received from the client, classified by its tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClientMessage<'a> {
    /// Encoded terminal input
    Input(&'a [u8]),
    Ping,
    /// Unparsed resize payload, see [`TerminalSize::from_payload`]
    ResizeTerminal(&'a [u8]),
    /// Encoding name
    SetEncoding(&'a [u8]),
}

impl<'a> ClientMessage<'a> {
    /// Classify a frame by its first byte.
    ///
    /// # Errors
    /// `EmptyMessage` for a zero-length frame, `UnknownMessageType` for any
    /// tag outside the client set.
    pub fn parse(frame: &'a [u8]) -> Result<Self> {
        let (&tag, payload) = frame.split_first().ok_or(ProtocolError::EmptyMessage)?;
        match tag {
            client::INPUT => Ok(ClientMessage::Input(payload)),
            client::PING => Ok(ClientMessage::Ping),
            client::RESIZE_TERMINAL => Ok(ClientMessage::ResizeTerminal(payload)),
            client::SET_ENCODING => Ok(ClientMessage::SetEncoding(payload)),
            other => Err(ProtocolError::UnknownMessageType(other)),
        }
    }
}

/// Terminal geometry requested by a client.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TerminalSize {
    pub columns: u16,
    pub rows: u16,
}

impl TerminalSize {
    /// Parse a resize payload: a JSON object with numeric `columns` and `rows`.
    ///
    /// Field names match case-insensitively and a missing (or `null`) field
    /// reads as zero, as does a bare `null` payload. Values are clamped into
    /// `0..=u16::MAX`; fractions are truncated.
    ///
    /// # Errors
    /// `MalformedResize` for an empty payload, anything other than a JSON
    /// object or `null`, or a dimension that is not a number.
    pub fn from_payload(payload: &[u8]) -> Result<Self> {
        if payload.is_empty() {
            return Err(ProtocolError::MalformedResize(
                constants::ERR_RESIZE_EMPTY.into(),
            ));
        }

        let args: Option<Map<String, Value>> = serde_json::from_slice(payload)
            .map_err(|e| ProtocolError::MalformedResize(e.to_string()))?;

        let mut size = Self::default();
        for (key, value) in args.iter().flatten() {
            let slot = if key.eq_ignore_ascii_case("columns") {
                &mut size.columns
            } else if key.eq_ignore_ascii_case("rows") {
                &mut size.rows
            } else {
                continue;
            };

            *slot = match value {
                Value::Null => continue,
                Value::Number(n) => n.as_f64().unwrap_or_default() as u16,
                _ => {
                    return Err(ProtocolError::MalformedResize(format!(
                        "field `{key}` is not a number"
                    )))
                }
            };
        }

        Ok(size)
    }

    /// Fill in every dimension that is not pinned (zero) in `fixed` from `self`.
    pub fn constrain(self, fixed: TerminalSize) -> TerminalSize {
        TerminalSize {
            columns: if fixed.columns != 0 {
                fixed.columns
            } else {
                self.columns
            },
            rows: if fixed.rows != 0 { fixed.rows } else { self.rows },
        }
    }

    /// True when both dimensions are pinned, so client resizes change nothing.
    pub fn is_pinned(&self) -> bool {
        self.columns != 0 && self.rows != 0
    }
}

/// Largest raw read that still fits one output message in `buffer_size`.
///
/// One byte goes to the tag; base64 turns every 3 bytes into 4.
#[inline]
pub fn max_chunk_size(buffer_size: usize) -> usize {
    (buffer_size.saturating_sub(1) / 4) * 3
}

/// Client-side inverse of output encoding: the raw bytes of an output payload.
pub fn decode_output(payload: &[u8]) -> Result<Vec<u8>> {
    STANDARD
        .decode(payload)
        .map_err(|e| ProtocolError::Decode(e.to_string()))
}

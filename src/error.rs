//! # Error Types
//!
//! Error handling for the terminal bridge.
//!
//! Every way a bridge session can end is a variant of [`ProtocolError`]; a
//! session always terminates with exactly one of them.
//!
//! ## Error Categories
//! - **Connection**: either side closed (`BackendClosed`, `FrontendClosed`)
//! - **Protocol**: empty, unknown or malformed messages
//! - **Codec**: inbound payloads that do not decode
//! - **Cancellation**: the caller stopped the session
//!
//! Errors raised deep inside a loop are annotated with the operation that
//! failed through [`ProtocolError::context`]; use [`ProtocolError::root_cause`]
//! to classify them.
//!
//! ## Example Usage
//! ```rust
//! use tty_bridge::error::{ProtocolError, Result};
//! use tracing::error;
//!
//! fn send_title() -> Result<()> {
//!     Err(ProtocolError::FrontendClosed).map_err(|e| e.context("failed to send window title"))
//! }
//!
//! if let Err(e) = send_title() {
//!     assert!(matches!(e.root_cause(), ProtocolError::FrontendClosed));
//!     error!(error = %e, "Handshake failed");
//! }
//! ```

use std::io;
use thiserror::Error;

/// Error message constants used when annotating failures.
pub mod constants {
    /// Handshake steps
    pub const ERR_INITIALIZE: &str = "failed to send initializing message";
    pub const ERR_WINDOW_TITLE: &str = "failed to send window title";
    pub const ERR_BUFFER_SIZE: &str = "failed to send buffer size";
    pub const ERR_RECONNECT: &str = "failed to set reconnect";
    pub const ERR_PREFERENCES: &str = "failed to set preferences";

    /// Back-to-front loop
    pub const ERR_SEND_OUTPUT: &str = "failed to send output to client";

    /// Front-to-back loop
    pub const ERR_DECODE_INPUT: &str = "failed to decode received data";
    pub const ERR_WRITE_BACKEND: &str = "failed to write received data to backend";
    pub const ERR_SEND_PONG: &str = "failed to return pong message to client";

    /// Resize payloads
    pub const ERR_RESIZE_EMPTY: &str = "empty payload";

    /// Codec failures
    pub const ERR_OUTPUT_TOO_SMALL: &str = "output buffer too small";
}

/// Terminal and intermediate errors of a bridge session.
#[derive(Error, Debug)]
pub enum ProtocolError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("backend connection closed")]
    BackendClosed,

    #[error("frontend connection closed")]
    FrontendClosed,

    #[error("session cancelled")]
    Cancelled,

    #[error("unexpected zero length read from client")]
    EmptyMessage,

    #[error("unknown message type `{}`", char::from(*.0))]
    UnknownMessageType(u8),

    #[error("received malformed remote command for terminal resize: {0}")]
    MalformedResize(String),

    #[error("Decode error: {0}")]
    Decode(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("session tasks exited without reporting a result")]
    TaskFailed,

    #[error("{context}: {source}")]
    Context {
        context: &'static str,
        #[source]
        source: Box<ProtocolError>,
    },
}

impl ProtocolError {
    /// Annotate this error with the operation that failed.
    pub fn context(self, context: &'static str) -> Self {
        ProtocolError::Context {
            context,
            source: Box::new(self),
        }
    }

    /// The outermost context annotation, if any.
    pub fn annotation(&self) -> Option<&'static str> {
        match self {
            ProtocolError::Context { context, .. } => Some(*context),
            _ => None,
        }
    }

    /// The innermost error, with every layer of context removed.
    pub fn root_cause(&self) -> &ProtocolError {
        let mut current = self;
        while let ProtocolError::Context { source, .. } = current {
            current = &**source;
        }
        current
    }

    /// Whether the session ended because one of the connections went away.
    pub fn is_disconnect(&self) -> bool {
        matches!(
            self.root_cause(),
            ProtocolError::BackendClosed | ProtocolError::FrontendClosed
        )
    }
}

/// Type alias for Results using ProtocolError
pub type Result<T> = std::result::Result<T, ProtocolError>;

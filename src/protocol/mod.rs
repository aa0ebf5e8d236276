//! # Message Protocol
//!
//! The tagged wire format spoken with the client.
//!
//! ## Components
//! - **Message**: tag constants, front-bound encoding, back-bound parsing
//! - **Handshake**: the initialization sequence sent before any output
//! - **Dispatcher**: maps client messages to bridge actions and owns the
//!   active input codec
//!
//! ## Wire Format
//! ```text
//! [Tag(1)] [Payload(N)]
//! ```
//! Control payloads (buffer size, reconnect interval, resize, preferences)
//! are JSON; everything else is opaque bytes.

pub mod dispatcher;
pub mod handshake;
pub mod message;

//! # tty-bridge
//!
//! Bridges a framed, message-oriented client connection (typically a
//! websocket from a browser terminal) and a raw byte stream attached to an
//! interactive process (typically a pty).
//!
//! Terminal output is base64 encoded into tagged output messages; tagged
//! client messages become raw writes, resizes, keepalive replies or input
//! encoding switches on the process side.
//!
//! ## Modules
//! - [`config`]: session configuration (TOML / environment)
//! - [`core`]: input codecs and output encoding
//! - [`protocol`]: tagged messages, handshake and inbound dispatch
//! - [`transport`]: connection capability traits and adapters
//! - [`service`]: the [`Bridge`] session engine
//! - [`utils`]: audit logging, metrics, logging setup
//!
//! ## Example
//! ```rust,no_run
//! use tokio_util::sync::CancellationToken;
//! use tty_bridge::config::BridgeConfig;
//! use tty_bridge::transport::{framed, PipeBackend};
//! use tty_bridge::Bridge;
//!
//! # async fn session(client: tokio::net::TcpStream, process: tokio::net::UnixStream) {
//! let config = BridgeConfig::default_with_overrides(|c| c.terminal.permit_write = true);
//! let front = framed(client);
//! let bridge = Bridge::new(front, PipeBackend::new(process), &config).unwrap();
//!
//! let reason = bridge.run(CancellationToken::new()).await;
//! tracing::info!(%reason, "session ended");
//! # }
//! ```

pub mod config;
pub mod core;
pub mod error;
pub mod protocol;
pub mod service;
pub mod transport;
pub mod utils;

pub use crate::core::codec::{Base64Codec, Decoder, Encoding, NullCodec};
pub use error::{ProtocolError, Result};
pub use protocol::message::{ClientMessage, ServerMessage, TerminalSize};
pub use service::Bridge;
pub use tokio_util::sync::CancellationToken;

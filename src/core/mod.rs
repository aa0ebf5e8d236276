//! # Core Components
//!
//! Byte-level transforms shared by both directions of the bridge.
//!
//! ## Components
//! - **Codec**: decoders for client input (`null`, `base64`) and the base64
//!   encoding applied to terminal output
//!
//! ## Output sizing
//! Terminal output is base64 encoded, so every 3 raw bytes become 4 on the
//! wire. Reads from the backend are capped so that one encoded chunk plus its
//! tag byte always fits the configured buffer size.

pub mod codec;

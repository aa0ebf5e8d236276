//! # Services
//!
//! Session-level orchestration built on the protocol and transport layers.

pub mod bridge;

pub use bridge::Bridge;

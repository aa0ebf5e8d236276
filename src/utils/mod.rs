//! # Utility Modules
//!
//! Supporting pieces used by the bridge service.
//!
//! ## Components
//! - **Audit**: per-direction line accumulation of terminal traffic
//! - **Logging**: `tracing` subscriber configuration
//! - **Metrics**: per-session atomic counters

pub mod audit;
pub mod logging;
pub mod metrics;

pub use audit::{AuditBuffer, AuditLog, Direction};
pub use metrics::{BridgeMetrics, MetricsSnapshot};

//! Node health checking
//!
//! The generic engine owns ranking, polling and request failover; the
//! blockchain specialization decides per-node status.

pub mod blockchain;
pub mod consensus;
pub mod engine;
pub mod ranking;
pub mod types;

pub use blockchain::BlockchainHealthCheck;
pub use engine::HealthCheckEngine;
pub use types::{AppState, HealthCheckPolicy, HealthReport, HealthState, NodeCheck, NodeReport};

pub mod config;
pub mod constants;
pub mod errors;
pub mod health;
pub mod nodes;
pub mod service;
pub mod version;

// Re-export commonly used types
pub use config::{Config, ConfigManager, GroupSettings};
pub use errors::{ConfigError, ProbeError};
pub use health::{AppState, BlockchainHealthCheck, HealthCheckEngine, HealthReport};
pub use nodes::{InMemoryNodeStore, InMemoryParamStore, Node, NodeGroup, NodeStore, Origin, ParamStore};
pub use service::{ProbedService, RpcProbeService};

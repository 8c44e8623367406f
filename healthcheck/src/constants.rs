//! Timer intervals, timeouts and per-group defaults

use std::time::Duration;

/// Probe and request transport limits
pub mod http {
    use super::Duration;

    /// Default timeout for one status probe
    pub const PROBE_TIMEOUT: Duration = Duration::from_secs(10);

    /// Timeout for establishing the TCP/TLS connection of a probe
    pub const CONNECT_TIMEOUT: Duration = Duration::from_secs(5);

    /// Path of the node status endpoint
    pub const STATUS_PATH: &str = "/api/node/status";
}

/// Engine scheduling constants
pub mod engine {
    /// On returning to foreground, poll when more than normal_interval / this has passed
    pub const FOREGROUND_POLL_DIVISOR: u32 = 3;
}

/// Default configuration values
pub mod defaults {
    pub const PROBE_TIMEOUT_SECONDS: u64 = 10;

    /// How often the binary logs the health report of every group
    pub const LOG_INTERVAL_SECONDS: u64 = 60;

    pub const CONFIG_DIR: &str = "config";
}

/// Per-group tuning: polling intervals, height tolerance and minimum node version
pub mod groups {
    use super::Duration;
    use crate::nodes::NodeGroup;

    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct GroupDefaults {
        pub normal_interval: Duration,
        pub crucial_interval: Duration,
        pub height_epsilon: u64,
        pub min_version: Option<&'static str>,
    }

    pub fn defaults(group: NodeGroup) -> GroupDefaults {
        match group {
            NodeGroup::Adm => GroupDefaults {
                normal_interval: Duration::from_secs(300),
                crucial_interval: Duration::from_secs(30),
                height_epsilon: 10,
                min_version: Some("0.8.0"),
            },
            NodeGroup::Btc => GroupDefaults {
                normal_interval: Duration::from_secs(360),
                crucial_interval: Duration::from_secs(30),
                height_epsilon: 2,
                min_version: None,
            },
            NodeGroup::Eth => GroupDefaults {
                normal_interval: Duration::from_secs(300),
                crucial_interval: Duration::from_secs(30),
                height_epsilon: 5,
                min_version: None,
            },
            NodeGroup::Lsk => GroupDefaults {
                normal_interval: Duration::from_secs(270),
                crucial_interval: Duration::from_secs(30),
                height_epsilon: 5,
                min_version: Some("4.0.0"),
            },
            NodeGroup::Doge => GroupDefaults {
                normal_interval: Duration::from_secs(390),
                crucial_interval: Duration::from_secs(30),
                height_epsilon: 3,
                min_version: None,
            },
            NodeGroup::Dash => GroupDefaults {
                normal_interval: Duration::from_secs(210),
                crucial_interval: Duration::from_secs(30),
                height_epsilon: 3,
                min_version: None,
            },
            NodeGroup::Ipfs | NodeGroup::InfoService => GroupDefaults {
                normal_interval: Duration::from_secs(210),
                crucial_interval: Duration::from_secs(30),
                height_epsilon: 1_000_000_000,
                min_version: None,
            },
        }
    }
}

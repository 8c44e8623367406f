//! Common test data and constants

use std::time::Duration;

use healthcheck::config::GroupSettings;
use healthcheck::errors::ProbeError;
use healthcheck::nodes::{ConnectionStatus, Node, NodeStatusInfo, Origin};

/// Common test hosts
pub mod hosts {
    pub const A: &str = "a.node.test";
    pub const B: &str = "b.node.test";
    pub const C: &str = "c.node.test";
    pub const D: &str = "d.node.test";
    pub const E: &str = "e.node.test";
    pub const ALT: &str = "10.0.0.1";
}

/// Common reported versions
pub mod versions {
    pub const MINIMUM: &str = "0.8.0";
    pub const CURRENT: &str = "0.8.4";
    pub const OUTDATED: &str = "0.7.9";
}

pub fn status(height: u64, ping_ms: u64) -> NodeStatusInfo {
    NodeStatusInfo {
        height,
        version: Some(versions::CURRENT.to_string()),
        ws_enabled: true,
        ws_port: Some(36668),
        ping: Duration::from_millis(ping_ms),
    }
}

pub fn status_with_version(height: u64, version: &str) -> NodeStatusInfo {
    NodeStatusInfo {
        version: Some(version.to_string()),
        ..status(height, 50)
    }
}

pub fn node(host: &str) -> Node {
    Node::new(Origin::https(host))
}

pub fn node_with_alt(host: &str) -> Node {
    node(host).with_alt_origin(Origin::http(hosts::ALT, 36666))
}

pub fn allowed_node(host: &str) -> Node {
    let mut node = node(host);
    node.connection_status = Some(ConnectionStatus::Allowed);
    node
}

pub fn connection_error(host: &str) -> ProbeError {
    ProbeError::ConnectionFailed {
        origin: Origin::https(host).url(),
        reason: "connection refused".to_string(),
    }
}

pub fn rejected(host: &str) -> ProbeError {
    ProbeError::Rejected {
        origin: Origin::https(host).url(),
        message: "unknown method".to_string(),
    }
}

/// Engine tuning used by most tests: 300s normal, 30s crucial
pub fn settings(height_epsilon: u64) -> GroupSettings {
    GroupSettings {
        normal_interval: Duration::from_secs(300),
        crucial_interval: Duration::from_secs(30),
        height_epsilon,
        min_version: Some(versions::MINIMUM.to_string()),
    }
}

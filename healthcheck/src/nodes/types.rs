//! Node, origin and status types shared by the stores and the health check engines

use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;
use uuid::Uuid;

/// Stable identity of a node entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct NodeId(Uuid);

impl NodeId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for NodeId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Scheme {
    Http,
    #[default]
    Https,
}

impl Scheme {
    pub fn as_str(&self) -> &'static str {
        match self {
            Scheme::Http => "http",
            Scheme::Https => "https",
        }
    }

    pub fn default_port(&self) -> u16 {
        match self {
            Scheme::Http => 80,
            Scheme::Https => 443,
        }
    }
}

/// One concrete address a node can be reached at
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Origin {
    pub scheme: Scheme,
    pub host: String,
    pub port: Option<u16>,
}

impl Origin {
    pub fn new(scheme: Scheme, host: impl Into<String>, port: Option<u16>) -> Self {
        Self {
            scheme,
            host: host.into(),
            port,
        }
    }

    pub fn https(host: impl Into<String>) -> Self {
        Self::new(Scheme::Https, host, None)
    }

    pub fn http(host: impl Into<String>, port: u16) -> Self {
        Self::new(Scheme::Http, host, Some(port))
    }

    /// Base URL without a trailing slash. The port is omitted when it is the scheme default.
    pub fn url(&self) -> String {
        match self.port {
            Some(port) if port != self.scheme.default_port() => {
                format!("{}://{}:{}", self.scheme.as_str(), self.host, port)
            }
            _ => format!("{}://{}", self.scheme.as_str(), self.host),
        }
    }
}

impl fmt::Display for Origin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.url())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RejectedReason {
    OutdatedApiVersion,
    Custom(String),
}

impl fmt::Display for RejectedReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RejectedReason::OutdatedApiVersion => write!(f, "outdated API version"),
            RejectedReason::Custom(reason) => write!(f, "{}", reason),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConnectionStatus {
    Allowed,
    Synchronizing,
    Offline,
    NotAllowed(RejectedReason),
}

impl ConnectionStatus {
    /// Offline and rejected nodes never take part in consensus or ranking
    pub fn is_excluded(&self) -> bool {
        matches!(
            self,
            ConnectionStatus::Offline | ConnectionStatus::NotAllowed(_)
        )
    }
}

impl fmt::Display for ConnectionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConnectionStatus::Allowed => write!(f, "allowed"),
            ConnectionStatus::Synchronizing => write!(f, "synchronizing"),
            ConnectionStatus::Offline => write!(f, "offline"),
            ConnectionStatus::NotAllowed(reason) => write!(f, "not allowed ({})", reason),
        }
    }
}

/// Partition of nodes serving one blockchain or service class
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum NodeGroup {
    Adm,
    Btc,
    Eth,
    Lsk,
    Doge,
    Dash,
    Ipfs,
    InfoService,
}

impl NodeGroup {
    pub const ALL: [NodeGroup; 8] = [
        NodeGroup::Adm,
        NodeGroup::Btc,
        NodeGroup::Eth,
        NodeGroup::Lsk,
        NodeGroup::Doge,
        NodeGroup::Dash,
        NodeGroup::Ipfs,
        NodeGroup::InfoService,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            NodeGroup::Adm => "ADM",
            NodeGroup::Btc => "BTC",
            NodeGroup::Eth => "ETH",
            NodeGroup::Lsk => "LSK",
            NodeGroup::Doge => "DOGE",
            NodeGroup::Dash => "DASH",
            NodeGroup::Ipfs => "IPFS",
            NodeGroup::InfoService => "InfoService",
        }
    }
}

impl fmt::Display for NodeGroup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// What a probed node reported about itself
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeStatusInfo {
    pub height: u64,
    pub version: Option<String>,
    pub ws_enabled: bool,
    pub ws_port: Option<u16>,
    pub ping: Duration,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Node {
    pub id: NodeId,
    pub enabled: bool,
    pub main_origin: Origin,
    pub alt_origin: Option<Origin>,
    /// None until learned; Some(false) means the main origin needed a forced retry
    pub prefer_main_origin: Option<bool>,
    pub connection_status: Option<ConnectionStatus>,
    pub height: Option<u64>,
    pub version: Option<String>,
    pub ws_enabled: bool,
    pub ws_port: Option<u16>,
    pub ping: Option<Duration>,
}

/// The part of a node that decides whether it has to be probed again
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HealthCheckKey {
    pub id: NodeId,
    pub enabled: bool,
    pub main_origin: Origin,
    pub alt_origin: Option<Origin>,
}

impl Node {
    pub fn new(main_origin: Origin) -> Self {
        Self {
            id: NodeId::new(),
            enabled: true,
            main_origin,
            alt_origin: None,
            prefer_main_origin: None,
            connection_status: None,
            height: None,
            version: None,
            ws_enabled: false,
            ws_port: None,
            ping: None,
        }
    }

    pub fn with_alt_origin(mut self, alt_origin: Origin) -> Self {
        self.alt_origin = Some(alt_origin);
        self
    }

    pub fn disabled(mut self) -> Self {
        self.enabled = false;
        self
    }

    pub fn preferred_origin(&self) -> &Origin {
        preferred_origin(self)
    }

    pub fn is_excluded(&self) -> bool {
        self.connection_status
            .as_ref()
            .is_some_and(ConnectionStatus::is_excluded)
    }

    pub fn health_check_key(&self) -> HealthCheckKey {
        HealthCheckKey {
            id: self.id,
            enabled: self.enabled,
            main_origin: self.main_origin.clone(),
            alt_origin: self.alt_origin.clone(),
        }
    }

    pub fn apply_status_info(&mut self, info: &NodeStatusInfo) {
        self.height = Some(info.height);
        self.version = info.version.clone();
        self.ws_enabled = info.ws_enabled;
        self.ws_port = info.ws_port;
        self.ping = Some(info.ping);
    }
}

/// Alternate origin when the main one is known to need retries, main origin otherwise
pub fn preferred_origin(node: &Node) -> &Origin {
    match (node.prefer_main_origin, node.alt_origin.as_ref()) {
        (Some(false), Some(alt)) => alt,
        _ => &node.main_origin,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn node_with_alt() -> Node {
        Node::new(Origin::https("main.example.com"))
            .with_alt_origin(Origin::http("10.0.0.1", 36666))
    }

    #[test]
    fn test_preferred_origin_defaults_to_main() {
        let node = node_with_alt();
        assert_eq!(node.preferred_origin().host, "main.example.com");
    }

    #[test]
    fn test_preferred_origin_uses_alt_after_main_retry() {
        let mut node = node_with_alt();
        node.prefer_main_origin = Some(false);
        assert_eq!(node.preferred_origin().host, "10.0.0.1");

        node.prefer_main_origin = Some(true);
        assert_eq!(node.preferred_origin().host, "main.example.com");
    }

    #[test]
    fn test_preferred_origin_without_alt() {
        let mut node = Node::new(Origin::https("only.example.com"));
        node.prefer_main_origin = Some(false);
        assert_eq!(node.preferred_origin().host, "only.example.com");
    }

    #[test]
    fn test_origin_url_omits_default_port() {
        assert_eq!(
            Origin::new(Scheme::Https, "a.example.com", Some(443)).url(),
            "https://a.example.com"
        );
        assert_eq!(Origin::http("10.0.0.1", 36666).url(), "http://10.0.0.1:36666");
    }

    #[test]
    fn test_excluded_statuses() {
        let mut node = node_with_alt();
        assert!(!node.is_excluded());

        node.connection_status = Some(ConnectionStatus::Synchronizing);
        assert!(!node.is_excluded());

        node.connection_status = Some(ConnectionStatus::Offline);
        assert!(node.is_excluded());

        node.connection_status = Some(ConnectionStatus::NotAllowed(
            RejectedReason::OutdatedApiVersion,
        ));
        assert!(node.is_excluded());
    }

    #[test]
    fn test_health_check_key_ignores_transient_fields() {
        let node = node_with_alt();
        let mut probed = node.clone();
        probed.height = Some(10);
        probed.ping = Some(Duration::from_millis(40));
        probed.connection_status = Some(ConnectionStatus::Allowed);
        assert_eq!(node.health_check_key(), probed.health_check_key());

        probed.enabled = false;
        assert_ne!(node.health_check_key(), probed.health_check_key());
    }
}

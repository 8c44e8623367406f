//! Types shared between the generic engine and its specializations

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::HashSet;
use std::sync::Arc;

use crate::nodes::{ConnectionStatus, Node, NodeGroup, NodeId};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppState {
    Foreground,
    Background,
}

/// Result of probing one node during a poll round
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct NodeCheck {
    /// Node answered on one of its origins and may be used for the rest of the round
    pub force_include: bool,
}

/// The blockchain-specific half of a health check engine.
///
/// `check_node` runs concurrently for every enabled node of a round and
/// writes probe results back through the node store itself. `evaluate` runs
/// on the engine worker after each probe completes and returns the status
/// every evaluated node should now have.
#[async_trait]
pub trait HealthCheckPolicy: Send + Sync + 'static {
    type Service: Send + Sync + 'static;

    fn service(&self) -> Arc<Self::Service>;

    async fn check_node(&self, node: Node) -> NodeCheck;

    fn evaluate(
        &self,
        nodes: &[Node],
        forced: &HashSet<NodeId>,
    ) -> Vec<(NodeId, Option<ConnectionStatus>)>;
}

/// Snapshot the engine publishes after every ranking recomputation
#[derive(Debug, Clone, Default)]
pub struct HealthState {
    pub usable: Vec<Node>,
    pub enabled_count: usize,
    pub probing: usize,
    pub rounds_completed: u64,
}

#[derive(Debug, Clone, Serialize)]
pub struct NodeReport {
    pub id: NodeId,
    pub origin: String,
    pub enabled: bool,
    pub status: Option<ConnectionStatus>,
    pub height: Option<u64>,
    pub version: Option<String>,
    pub ping_ms: Option<u64>,
    pub prefer_main_origin: Option<bool>,
    pub forced: bool,
    pub usable: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct HealthReport {
    pub group: NodeGroup,
    pub fastest: bool,
    pub connected: bool,
    pub last_poll_at: Option<DateTime<Utc>>,
    pub probing: usize,
    pub rounds_completed: u64,
    pub nodes: Vec<NodeReport>,
}

impl HealthReport {
    pub fn usable_count(&self) -> usize {
        self.nodes.iter().filter(|n| n.usable).count()
    }
}

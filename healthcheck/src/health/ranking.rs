//! Usable-node derivation

use std::collections::HashSet;
use std::time::Duration;

use crate::nodes::{ConnectionStatus, Node, NodeId};

/// Enabled and either allowed or force-included, never offline or rejected
pub fn is_usable(node: &Node, forced: &HashSet<NodeId>) -> bool {
    if !node.enabled {
        return false;
    }
    match &node.connection_status {
        Some(ConnectionStatus::Allowed) => true,
        Some(status) if status.is_excluded() => false,
        _ => forced.contains(&node.id),
    }
}

/// Usable nodes in list order, or by ascending ping in fastest mode.
/// Nodes without a measured ping go last; ties keep list order.
pub fn sorted_usable_nodes(nodes: &[Node], forced: &HashSet<NodeId>, fastest: bool) -> Vec<Node> {
    let mut usable: Vec<Node> = nodes
        .iter()
        .filter(|node| is_usable(node, forced))
        .cloned()
        .collect();

    if fastest {
        usable.sort_by_key(|node| node.ping.unwrap_or(Duration::MAX));
    }
    usable
}

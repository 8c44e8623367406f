//! Node list storage with a per-group change feed

use std::collections::HashMap;
use tokio::sync::watch;
use tracing::{debug, info, warn};

use super::defaults::default_nodes;
use super::types::{Node, NodeGroup, NodeId};

/// Read/write contract the health check engines rely on.
///
/// `subscribe` is the single source of truth: every mutation must be
/// observable through the receiver of the affected group.
pub trait NodeStore: Send + Sync + 'static {
    fn subscribe(&self, group: NodeGroup) -> watch::Receiver<Vec<Node>>;

    fn nodes(&self, group: NodeGroup) -> Vec<Node>;

    /// Returns true when the node existed and the mutation changed it
    fn update(&self, id: NodeId, group: NodeGroup, mutate: &mut dyn FnMut(&mut Node)) -> bool;

    fn add(&self, group: NodeGroup, node: Node);

    fn remove(&self, group: NodeGroup, id: NodeId) -> bool;

    /// Replace the group with its default node list
    fn reset(&self, group: NodeGroup);
}

pub struct InMemoryNodeStore {
    feeds: HashMap<NodeGroup, watch::Sender<Vec<Node>>>,
}

impl InMemoryNodeStore {
    pub fn new() -> Self {
        let feeds = NodeGroup::ALL
            .iter()
            .map(|group| (*group, watch::Sender::new(Vec::new())))
            .collect();
        Self { feeds }
    }

    /// Store seeded with the default node list of every group
    pub fn with_defaults() -> Self {
        let store = Self::new();
        for group in NodeGroup::ALL {
            store.reset(group);
        }
        store
    }

    pub fn set_nodes(&self, group: NodeGroup, nodes: Vec<Node>) {
        info!("Loaded {} nodes for group {}", nodes.len(), group);
        self.feed(group).send_replace(nodes);
    }

    fn feed(&self, group: NodeGroup) -> &watch::Sender<Vec<Node>> {
        // Every group gets a feed in new()
        &self.feeds[&group]
    }
}

impl NodeStore for InMemoryNodeStore {
    fn subscribe(&self, group: NodeGroup) -> watch::Receiver<Vec<Node>> {
        self.feed(group).subscribe()
    }

    fn nodes(&self, group: NodeGroup) -> Vec<Node> {
        self.feed(group).borrow().clone()
    }

    fn update(&self, id: NodeId, group: NodeGroup, mutate: &mut dyn FnMut(&mut Node)) -> bool {
        self.feed(group).send_if_modified(|nodes| {
            match nodes.iter_mut().find(|node| node.id == id) {
                Some(node) => {
                    let before = node.clone();
                    mutate(node);
                    *node != before
                }
                None => {
                    debug!("Skipping update of unknown node {} in {}", id, group);
                    false
                }
            }
        })
    }

    fn add(&self, group: NodeGroup, node: Node) {
        debug!("Adding node {} ({}) to {}", node.id, node.main_origin, group);
        self.feed(group).send_modify(|nodes| nodes.push(node));
    }

    fn remove(&self, group: NodeGroup, id: NodeId) -> bool {
        let removed = self.feed(group).send_if_modified(|nodes| {
            let before = nodes.len();
            nodes.retain(|node| node.id != id);
            nodes.len() != before
        });
        if !removed {
            warn!("Tried to remove node {} from {} but it was not there", id, group);
        }
        removed
    }

    fn reset(&self, group: NodeGroup) {
        self.set_nodes(group, default_nodes(group));
    }
}

impl Default for InMemoryNodeStore {
    fn default() -> Self {
        Self::new()
    }
}

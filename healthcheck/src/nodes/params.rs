//! Per-group "prefer fastest node" flag

use std::collections::HashMap;
use tokio::sync::watch;
use tracing::info;

use super::types::NodeGroup;

pub trait ParamStore: Send + Sync + 'static {
    fn subscribe(&self, group: NodeGroup) -> watch::Receiver<bool>;

    fn fastest(&self, group: NodeGroup) -> bool;

    fn set(&self, group: NodeGroup, fastest: bool);
}

pub struct InMemoryParamStore {
    flags: HashMap<NodeGroup, watch::Sender<bool>>,
}

impl InMemoryParamStore {
    pub fn new() -> Self {
        let flags = NodeGroup::ALL
            .iter()
            .map(|group| (*group, watch::Sender::new(false)))
            .collect();
        Self { flags }
    }
}

impl ParamStore for InMemoryParamStore {
    fn subscribe(&self, group: NodeGroup) -> watch::Receiver<bool> {
        self.flags[&group].subscribe()
    }

    fn fastest(&self, group: NodeGroup) -> bool {
        *self.flags[&group].borrow()
    }

    fn set(&self, group: NodeGroup, fastest: bool) {
        let changed = self.flags[&group].send_if_modified(|current| {
            let changed = *current != fastest;
            *current = fastest;
            changed
        });
        if changed {
            info!("Fastest node mode for {} set to {}", group, fastest);
        }
    }
}

impl Default for InMemoryParamStore {
    fn default() -> Self {
        Self::new()
    }
}

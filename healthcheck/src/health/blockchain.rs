//! Blockchain node health check
//!
//! Decides per node whether it answers, which origin to use for it and
//! whether it is caught up with the rest of the group:
//!
//! - **Origin learning**: once a preference is known, the main origin is
//!   probed first; a failure is retried once more on the main origin before
//!   the node is marked offline.
//! - **Version gate**: nodes below the group minimum version are rejected
//!   and skipped by consensus.
//! - **Height consensus**: the height window most working nodes fall into
//!   decides who is `allowed` and who is `synchronizing`.

use async_trait::async_trait;
use std::collections::HashSet;
use std::sync::Arc;
use tracing::{debug, info, warn};

use super::consensus::{classify, consensus_window};
use super::types::{HealthCheckPolicy, NodeCheck};
use crate::config::GroupSettings;
use crate::nodes::{ConnectionStatus, Node, NodeGroup, NodeId, NodeStore, Origin, RejectedReason};
use crate::service::ProbedService;
use crate::version::{self, Version};

pub struct BlockchainHealthCheck<S: ProbedService> {
    group: NodeGroup,
    service: Arc<S>,
    store: Arc<dyn NodeStore>,
    height_epsilon: u64,
    min_version: Option<Version>,
}

impl<S: ProbedService> BlockchainHealthCheck<S> {
    pub fn new(
        group: NodeGroup,
        service: Arc<S>,
        store: Arc<dyn NodeStore>,
        settings: &GroupSettings,
    ) -> Self {
        let min_version = settings.min_version.as_deref().and_then(|v| match v.parse::<Version>() {
            Ok(version) => Some(version),
            Err(e) => {
                warn!("Ignoring minimum version of {}: {}", group, e);
                None
            }
        });

        Self {
            group,
            service,
            store,
            height_epsilon: settings.height_epsilon,
            min_version,
        }
    }

    /// Probe `origin` and record the result on the node. Returns whether the probe succeeded.
    async fn update_status_info(
        &self,
        node: &Node,
        origin: &Origin,
        mark_offline_if_failed: bool,
    ) -> bool {
        match self.service.probe(origin).await {
            Ok(info) => {
                let outdated = self
                    .min_version
                    .as_ref()
                    .is_some_and(|min| version::is_outdated(info.version.as_deref(), min));

                if outdated {
                    warn!(
                        "{} node {} runs outdated version {:?}",
                        self.group, origin, info.version
                    );
                }

                self.store.update(node.id, self.group, &mut |n| {
                    n.apply_status_info(&info);
                    if outdated {
                        n.connection_status =
                            Some(ConnectionStatus::NotAllowed(RejectedReason::OutdatedApiVersion));
                    } else if matches!(
                        n.connection_status,
                        Some(ConnectionStatus::Offline)
                            | Some(ConnectionStatus::NotAllowed(
                                RejectedReason::OutdatedApiVersion
                            ))
                    ) {
                        // Answering again, consensus decides the rest
                        n.connection_status = None;
                    }
                });
                true
            }
            Err(e) => {
                debug!("{} node probe via {} failed: {}", self.group, origin, e);
                if mark_offline_if_failed {
                    let changed = self.store.update(node.id, self.group, &mut |n| {
                        n.connection_status = Some(ConnectionStatus::Offline)
                    });
                    if changed {
                        info!("{} node {} is offline: {}", self.group, origin, e);
                    }
                }
                false
            }
        }
    }

    fn set_prefer_main_origin(&self, node: &Node, prefer: bool) {
        let changed = self.store.update(node.id, self.group, &mut |n| {
            n.prefer_main_origin = Some(prefer)
        });
        if changed {
            info!(
                "{} node {} now prefers its {} origin",
                self.group,
                node.main_origin,
                if prefer { "main" } else { "alternate" }
            );
        }
    }

    /// Enabled, not rejected, and not offline unless it just answered
    fn is_working(node: &Node, forced: &HashSet<NodeId>) -> bool {
        if !node.enabled {
            return false;
        }
        match &node.connection_status {
            Some(ConnectionStatus::NotAllowed(_)) => false,
            Some(ConnectionStatus::Offline) => forced.contains(&node.id),
            _ => true,
        }
    }
}

#[async_trait]
impl<S: ProbedService> HealthCheckPolicy for BlockchainHealthCheck<S> {
    type Service = S;

    fn service(&self) -> Arc<S> {
        self.service.clone()
    }

    async fn check_node(&self, node: Node) -> NodeCheck {
        let force_include = match node.prefer_main_origin {
            None => {
                self.update_status_info(&node, node.preferred_origin(), true)
                    .await
            }
            Some(_) => {
                if self.update_status_info(&node, &node.main_origin, false).await {
                    self.set_prefer_main_origin(&node, true);
                    true
                } else if self.update_status_info(&node, &node.main_origin, true).await {
                    // Second attempt goes to the main origin again
                    self.set_prefer_main_origin(&node, false);
                    true
                } else {
                    false
                }
            }
        };

        NodeCheck { force_include }
    }

    fn evaluate(
        &self,
        nodes: &[Node],
        forced: &HashSet<NodeId>,
    ) -> Vec<(NodeId, Option<ConnectionStatus>)> {
        let working: Vec<&Node> = nodes
            .iter()
            .filter(|node| Self::is_working(node, forced))
            .collect();

        let heights: Vec<u64> = working.iter().filter_map(|node| node.height).collect();
        let window = consensus_window(&heights, self.height_epsilon);

        if let Some(window) = &window {
            debug!(
                "{} consensus window {}..={} over {} heights",
                self.group,
                window.start(),
                window.end(),
                heights.len()
            );
        }

        working
            .iter()
            .map(|node| (node.id, classify(node.height, window.as_ref())))
            .collect()
    }
}

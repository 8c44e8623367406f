//! Generic health check engine
//!
//! All mutable state of one engine (node snapshot, ranking, timer, in-flight
//! probes) is owned by a single worker task. Handles talk to it over an
//! unbounded command channel and read the published `HealthState` through a
//! watch channel, so `poll` never blocks and `request` never races the
//! ranking recomputation.
//!
//! The worker reacts to:
//! - node list changes (re-rank; poll when the probed identity changed)
//! - fastest-mode changes (re-rank only)
//! - connectivity coming back (poll)
//! - the adaptive timer: crucial interval while nothing is usable, normal otherwise
//! - app returning to foreground (poll when the last one is stale)

use chrono::{DateTime, Utc};
use futures::FutureExt;
use std::collections::HashSet;
use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, oneshot, watch};
use tokio::time::{sleep_until, Instant};
use tracing::{debug, error, info, instrument, warn};

use super::ranking::sorted_usable_nodes;
use super::types::{AppState, HealthCheckPolicy, HealthReport, HealthState, NodeCheck, NodeReport};
use crate::config::GroupSettings;
use crate::constants::engine::FOREGROUND_POLL_DIVISOR;
use crate::errors::ProbeError;
use crate::nodes::types::HealthCheckKey;
use crate::nodes::{Node, NodeGroup, NodeId, NodeStore, Origin, ParamStore};

enum Command {
    Poll,
    Refresh,
    SetFastestMode(bool),
    SetAppState(AppState),
    ProbeFinished { node_id: NodeId, check: NodeCheck },
    Report(oneshot::Sender<HealthReport>),
    Shutdown,
}

/// Handle to a running engine. Cheap to clone; the worker stops once every
/// handle is dropped or `shutdown` is called.
pub struct HealthCheckEngine<P: HealthCheckPolicy> {
    group: NodeGroup,
    service: Arc<P::Service>,
    commands: mpsc::UnboundedSender<Command>,
    state: watch::Receiver<HealthState>,
}

impl<P: HealthCheckPolicy> Clone for HealthCheckEngine<P> {
    fn clone(&self) -> Self {
        Self {
            group: self.group,
            service: self.service.clone(),
            commands: self.commands.clone(),
            state: self.state.clone(),
        }
    }
}

impl<P: HealthCheckPolicy> HealthCheckEngine<P> {
    /// Start the worker for `group`. Must be called inside a tokio runtime.
    pub fn spawn(
        group: NodeGroup,
        policy: P,
        store: Arc<dyn NodeStore>,
        params: Arc<dyn ParamStore>,
        settings: &GroupSettings,
        connectivity: watch::Receiver<bool>,
    ) -> Self {
        let (commands_tx, commands_rx) = mpsc::unbounded_channel();
        let (state_tx, state_rx) = watch::channel(HealthState::default());
        let service = policy.service();

        let worker = Worker {
            group,
            policy: Arc::new(policy),
            store: store.clone(),
            normal_interval: settings.normal_interval,
            crucial_interval: settings.crucial_interval,
            commands_tx: commands_tx.downgrade(),
            state_tx,
            nodes: Vec::new(),
            check_keys: Vec::new(),
            usable: Vec::new(),
            fastest: false,
            connected: true,
            app_state: AppState::Foreground,
            forced: HashSet::new(),
            in_flight: HashSet::new(),
            last_poll: None,
            last_poll_at: None,
            next_poll: Instant::now(),
            rounds_completed: 0,
        };

        tokio::spawn(worker.run(
            commands_rx,
            store.subscribe(group),
            params.subscribe(group),
            connectivity,
        ));

        Self {
            group,
            service,
            commands: commands_tx,
            state: state_rx,
        }
    }

    pub fn group(&self) -> NodeGroup {
        self.group
    }

    /// Trigger a health check round. Nodes still being probed are skipped.
    pub fn poll(&self) {
        self.send(Command::Poll);
    }

    pub fn set_fastest_mode(&self, on: bool) {
        self.send(Command::SetFastestMode(on));
    }

    pub fn set_app_state(&self, state: AppState) {
        self.send(Command::SetAppState(state));
    }

    pub fn shutdown(&self) {
        self.send(Command::Shutdown);
    }

    pub fn sorted_allowed_nodes(&self) -> Vec<Node> {
        self.state.borrow().usable.clone()
    }

    pub fn subscribe_ranking(&self) -> watch::Receiver<HealthState> {
        self.state.clone()
    }

    pub fn is_polling(&self) -> bool {
        self.state.borrow().probing > 0
    }

    /// None once the worker has stopped
    pub async fn report(&self) -> Option<HealthReport> {
        let (tx, rx) = oneshot::channel();
        self.send(Command::Report(tx));
        rx.await.ok()
    }

    /// Run `action` against the best usable node, failing over to the next
    /// one on network errors.
    ///
    /// Every node is tried at most once per sweep, in ranking order. When the
    /// ranking is exhausted a poll is triggered; with `waits_for_connectivity`
    /// the call then waits until a health check round completes with a
    /// non-empty ranking and sweeps again, otherwise it fails with the last
    /// network error.
    #[instrument(skip(self, action), fields(group = %self.group))]
    pub async fn request<T, F, Fut>(
        &self,
        waits_for_connectivity: bool,
        mut action: F,
    ) -> Result<T, ProbeError>
    where
        F: FnMut(Arc<P::Service>, Origin) -> Fut,
        Fut: Future<Output = Result<T, ProbeError>>,
    {
        let result = self
            .request_with_failover(waits_for_connectivity, &mut action)
            .await;
        self.send(Command::Refresh);
        result
    }

    async fn request_with_failover<T, F, Fut>(
        &self,
        waits_for_connectivity: bool,
        action: &mut F,
    ) -> Result<T, ProbeError>
    where
        F: FnMut(Arc<P::Service>, Origin) -> Fut,
        Fut: Future<Output = Result<T, ProbeError>>,
    {
        let mut state = self.state.clone();

        loop {
            let mut tried: HashSet<NodeId> = HashSet::new();
            let mut last_error: Option<ProbeError> = None;

            loop {
                let candidate = state
                    .borrow_and_update()
                    .usable
                    .iter()
                    .find(|node| !tried.contains(&node.id))
                    .cloned();
                let Some(node) = candidate else {
                    break;
                };

                tried.insert(node.id);
                let origin = node.preferred_origin().clone();

                match action(self.service.clone(), origin.clone()).await {
                    Ok(output) => return Ok(output),
                    Err(e) if e.is_network_error() => {
                        warn!("Request to {} failed, trying next node: {}", origin, e);
                        last_error = Some(e);
                    }
                    Err(e) => return Err(e),
                }
            }

            let seen_rounds = state.borrow().rounds_completed;
            self.poll();

            if !waits_for_connectivity {
                let enabled_count = state.borrow().enabled_count;
                return Err(last_error.unwrap_or_else(|| {
                    if enabled_count > 0 {
                        ProbeError::no_network()
                    } else {
                        ProbeError::no_endpoints(self.group)
                    }
                }));
            }

            debug!(
                "No usable {} nodes left after {} attempts, waiting for health check",
                self.group,
                tried.len()
            );

            // Only a finished round counts as a refreshed ranking
            let refreshed = state
                .wait_for(|s| s.rounds_completed > seen_rounds && !s.usable.is_empty())
                .await
                .is_ok();
            if !refreshed {
                return Err(last_error.unwrap_or_else(ProbeError::no_network));
            }
        }
    }

    fn send(&self, command: Command) {
        if self.commands.send(command).is_err() {
            debug!("Health check engine for {} is stopped", self.group);
        }
    }
}

struct Worker<P: HealthCheckPolicy> {
    group: NodeGroup,
    policy: Arc<P>,
    store: Arc<dyn NodeStore>,
    normal_interval: Duration,
    crucial_interval: Duration,
    commands_tx: mpsc::WeakUnboundedSender<Command>,
    state_tx: watch::Sender<HealthState>,
    nodes: Vec<Node>,
    check_keys: Vec<HealthCheckKey>,
    usable: Vec<Node>,
    fastest: bool,
    connected: bool,
    app_state: AppState,
    /// Nodes that answered during the current round
    forced: HashSet<NodeId>,
    in_flight: HashSet<NodeId>,
    last_poll: Option<Instant>,
    last_poll_at: Option<DateTime<Utc>>,
    next_poll: Instant,
    rounds_completed: u64,
}

impl<P: HealthCheckPolicy> Worker<P> {
    async fn run(
        mut self,
        mut commands: mpsc::UnboundedReceiver<Command>,
        mut nodes_rx: watch::Receiver<Vec<Node>>,
        fastest_rx: watch::Receiver<bool>,
        connectivity_rx: watch::Receiver<bool>,
    ) {
        let mut fastest_rx = Some(fastest_rx);
        let mut connectivity_rx = Some(connectivity_rx);

        self.fastest = fastest_rx
            .as_mut()
            .is_some_and(|rx| *rx.borrow_and_update());
        self.connected = connectivity_rx
            .as_mut()
            .is_none_or(|rx| *rx.borrow_and_update());

        let nodes = nodes_rx.borrow_and_update().clone();
        self.check_keys = nodes.iter().map(Node::health_check_key).collect();
        self.nodes = nodes;
        self.update_ranking();
        // First round right away, whatever the ranking looks like
        self.next_poll = Instant::now();

        info!(
            "Health check engine for {} started with {} nodes",
            self.group,
            self.nodes.len()
        );

        loop {
            tokio::select! {
                command = commands.recv() => match command {
                    Some(Command::Shutdown) | None => break,
                    Some(command) => self.handle_command(command),
                },
                changed = nodes_rx.changed() => {
                    if changed.is_err() {
                        warn!("Node store for {} closed", self.group);
                        break;
                    }
                    let nodes = nodes_rx.borrow_and_update().clone();
                    self.on_nodes_changed(nodes);
                }
                fastest = watch_changed(&mut fastest_rx) => match fastest {
                    Some(on) => self.on_fastest_changed(on),
                    None => fastest_rx = None,
                },
                connected = watch_changed(&mut connectivity_rx) => match connected {
                    Some(connected) => self.on_connectivity_changed(connected),
                    None => connectivity_rx = None,
                },
                _ = sleep_until(self.next_poll) => self.poll(),
            }
        }

        info!("Health check engine for {} stopped", self.group);
    }

    fn handle_command(&mut self, command: Command) {
        match command {
            Command::Poll => self.poll(),
            Command::Refresh => {
                let nodes = self.store.nodes(self.group);
                self.on_nodes_changed(nodes);
            }
            Command::SetFastestMode(on) => self.on_fastest_changed(on),
            Command::SetAppState(state) => self.on_app_state(state),
            Command::ProbeFinished { node_id, check } => self.on_probe_finished(node_id, check),
            Command::Report(reply) => {
                let _ = reply.send(self.report());
            }
            Command::Shutdown => {}
        }
    }

    fn current_interval(&self) -> Duration {
        if self.usable.is_empty() {
            self.crucial_interval
        } else {
            self.normal_interval
        }
    }

    fn poll(&mut self) {
        let now = Instant::now();
        self.last_poll = Some(now);
        self.last_poll_at = Some(Utc::now());
        self.next_poll = now + self.current_interval();

        let Some(commands) = self.commands_tx.upgrade() else {
            return;
        };

        let candidates: Vec<Node> = self.nodes.iter().filter(|n| n.enabled).cloned().collect();
        let mut started = 0;

        for node in candidates {
            if !self.in_flight.insert(node.id) {
                debug!("{} node {} is still being checked", self.group, node.main_origin);
                continue;
            }
            started += 1;

            let policy = self.policy.clone();
            let commands = commands.clone();
            let group = self.group;
            tokio::spawn(async move {
                let node_id = node.id;
                let origin = node.main_origin.clone();
                let check = AssertUnwindSafe(policy.check_node(node))
                    .catch_unwind()
                    .await
                    .unwrap_or_else(|_| {
                        error!("{} node {} check panicked", group, origin);
                        NodeCheck::default()
                    });
                let _ = commands.send(Command::ProbeFinished { node_id, check });
            });
        }

        if started > 0 {
            info!("Health check for {} started: {} nodes", self.group, started);
        } else {
            debug!("Health check for {} had nothing new to probe", self.group);
        }
        self.publish();
    }

    fn on_probe_finished(&mut self, node_id: NodeId, check: NodeCheck) {
        self.in_flight.remove(&node_id);
        if check.force_include {
            self.forced.insert(node_id);
        } else {
            self.forced.remove(&node_id);
        }

        let nodes = self.store.nodes(self.group);
        for (id, status) in self.policy.evaluate(&nodes, &self.forced) {
            // No opinion keeps whatever is recorded
            let Some(status) = status else {
                continue;
            };
            let changed = self.store.update(id, self.group, &mut |n| {
                n.connection_status = Some(status.clone())
            });
            if changed {
                let origin = nodes
                    .iter()
                    .find(|n| n.id == id)
                    .map(|n| n.main_origin.url())
                    .unwrap_or_default();
                info!("{} node {} is now {}", self.group, origin, status);
            }
        }

        if self.in_flight.is_empty() {
            self.rounds_completed += 1;
            self.forced.clear();
        }

        let nodes = self.store.nodes(self.group);
        self.on_nodes_changed(nodes);

        if self.in_flight.is_empty() {
            info!(
                "Health check for {} finished: {} of {} nodes usable",
                self.group,
                self.usable.len(),
                self.nodes.len()
            );
        }
    }

    fn on_nodes_changed(&mut self, nodes: Vec<Node>) {
        let keys: Vec<HealthCheckKey> = nodes.iter().map(Node::health_check_key).collect();
        let relevant = keys != self.check_keys;
        self.check_keys = keys;
        self.nodes = nodes;
        self.forced
            .retain(|id| self.nodes.iter().any(|node| node.id == *id));

        self.update_ranking();

        if relevant {
            debug!("{} node list changed, polling", self.group);
            self.poll();
        }
    }

    fn on_fastest_changed(&mut self, on: bool) {
        if self.fastest != on {
            info!("{} fastest node mode: {}", self.group, on);
            self.fastest = on;
            self.update_ranking();
        }
    }

    fn on_connectivity_changed(&mut self, connected: bool) {
        let restored = connected && !self.connected;
        self.connected = connected;
        if restored {
            info!("Network is reachable again, polling {}", self.group);
            self.poll();
        }
    }

    fn on_app_state(&mut self, state: AppState) {
        let previous = self.app_state;
        self.app_state = state;
        if state != AppState::Foreground || previous == AppState::Foreground {
            return;
        }

        let threshold = self.normal_interval / FOREGROUND_POLL_DIVISOR;
        let stale = self
            .last_poll
            .is_none_or(|last| last.elapsed() > threshold);
        if stale {
            info!("Back in foreground with stale {} ranking, polling", self.group);
            self.poll();
        }
    }

    fn update_ranking(&mut self) {
        let was_empty = self.usable.is_empty();
        self.usable = sorted_usable_nodes(&self.nodes, &self.forced, self.fastest);

        if was_empty != self.usable.is_empty() {
            let interval = self.current_interval();
            self.next_poll = Instant::now() + interval;
            info!(
                "{} has {} usable nodes, polling every {}s",
                self.group,
                self.usable.len(),
                interval.as_secs()
            );
        }

        self.publish();
    }

    fn publish(&self) {
        self.state_tx.send_replace(HealthState {
            usable: self.usable.clone(),
            enabled_count: self.nodes.iter().filter(|n| n.enabled).count(),
            probing: self.in_flight.len(),
            rounds_completed: self.rounds_completed,
        });
    }

    fn report(&self) -> HealthReport {
        let nodes = self
            .nodes
            .iter()
            .map(|node| NodeReport {
                id: node.id,
                origin: node.preferred_origin().url(),
                enabled: node.enabled,
                status: node.connection_status.clone(),
                height: node.height,
                version: node.version.clone(),
                ping_ms: node
                    .ping
                    .map(|ping| u64::try_from(ping.as_millis()).unwrap_or(u64::MAX)),
                prefer_main_origin: node.prefer_main_origin,
                forced: self.forced.contains(&node.id),
                usable: self.usable.iter().any(|u| u.id == node.id),
            })
            .collect();

        HealthReport {
            group: self.group,
            fastest: self.fastest,
            connected: self.connected,
            last_poll_at: self.last_poll_at,
            probing: self.in_flight.len(),
            rounds_completed: self.rounds_completed,
            nodes,
        }
    }
}

/// Next value of an optional watch channel; pending forever once it is gone
async fn watch_changed<T: Clone>(rx: &mut Option<watch::Receiver<T>>) -> Option<T> {
    match rx {
        Some(rx) => match rx.changed().await {
            Ok(()) => Some(rx.borrow_and_update().clone()),
            Err(_) => None,
        },
        None => std::future::pending().await,
    }
}

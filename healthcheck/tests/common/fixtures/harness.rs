//! One engine over in-memory stores, with helpers to wait for its progress

use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::time::timeout;

use healthcheck::config::GroupSettings;
use healthcheck::health::{BlockchainHealthCheck, HealthCheckEngine, HealthState};
use healthcheck::nodes::{
    ConnectionStatus, InMemoryNodeStore, InMemoryParamStore, Node, NodeGroup, NodeStore,
};

use super::mock_service::ScriptedService;

pub const GROUP: NodeGroup = NodeGroup::Adm;

const WAIT_LIMIT: Duration = Duration::from_secs(3600);

pub struct EngineHarness {
    pub store: Arc<InMemoryNodeStore>,
    pub params: Arc<InMemoryParamStore>,
    pub service: Arc<ScriptedService>,
    pub connectivity: watch::Sender<bool>,
    pub engine: HealthCheckEngine<BlockchainHealthCheck<ScriptedService>>,
}

impl EngineHarness {
    pub fn start(nodes: Vec<Node>, service: ScriptedService, settings: GroupSettings) -> Self {
        let store = Arc::new(InMemoryNodeStore::new());
        store.set_nodes(GROUP, nodes);
        let params = Arc::new(InMemoryParamStore::new());
        let service = Arc::new(service);
        let (connectivity, connectivity_rx) = watch::channel(true);

        let policy = BlockchainHealthCheck::new(GROUP, service.clone(), store.clone(), &settings);
        let engine = HealthCheckEngine::spawn(
            GROUP,
            policy,
            store.clone(),
            params.clone(),
            &settings,
            connectivity_rx,
        );

        Self {
            store,
            params,
            service,
            connectivity,
            engine,
        }
    }

    /// Wait until the published state satisfies `predicate`
    pub async fn wait_until(&self, predicate: impl FnMut(&HealthState) -> bool) -> HealthState {
        let mut rx = self.engine.subscribe_ranking();
        let state = timeout(WAIT_LIMIT, rx.wait_for(predicate))
            .await
            .expect("engine state did not settle in time")
            .expect("engine stopped")
            .clone();
        state
    }

    pub async fn wait_for_rounds(&self, rounds: u64) -> HealthState {
        self.wait_until(|state| state.rounds_completed >= rounds && state.probing == 0)
            .await
    }

    pub async fn wait_for_usable(&self, count: usize) -> HealthState {
        self.wait_until(|state| state.usable.len() >= count).await
    }

    pub fn node(&self, host: &str) -> Node {
        self.store
            .nodes(GROUP)
            .into_iter()
            .find(|node| node.main_origin.host == host)
            .expect("node not in store")
    }

    pub fn status_of(&self, host: &str) -> Option<ConnectionStatus> {
        self.node(host).connection_status
    }

    pub fn usable_hosts(&self) -> Vec<String> {
        self.engine
            .sorted_allowed_nodes()
            .into_iter()
            .map(|node| node.main_origin.host)
            .collect()
    }
}

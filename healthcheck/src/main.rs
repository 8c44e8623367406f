use anyhow::Result;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tracing::{error, info, warn};
use tracing_subscriber::{fmt, EnvFilter};

use healthcheck::config::ConfigManager;
use healthcheck::constants::defaults;
use healthcheck::nodes::defaults::default_nodes;
use healthcheck::{
    BlockchainHealthCheck, GroupSettings, HealthCheckEngine, InMemoryNodeStore,
    InMemoryParamStore, NodeGroup, ParamStore, ProbedService, RpcProbeService,
};

type Engine = HealthCheckEngine<BlockchainHealthCheck<RpcProbeService>>;

#[tokio::main]
async fn main() -> Result<()> {
    let env_filter = EnvFilter::from_default_env()
        .add_directive("healthcheck=info".parse()?)
        .add_directive("hyper=warn".parse()?)
        .add_directive("reqwest=warn".parse()?);

    fmt().with_env_filter(env_filter).init();

    info!("Starting node health check");

    let config_dir = std::env::args()
        .nth(1)
        .unwrap_or_else(|| defaults::CONFIG_DIR.to_string());
    let config_manager = ConfigManager::new(config_dir).await?;
    let config = config_manager.get_current_config();
    info!(
        "Configuration loaded: {} groups, probe timeout {}s",
        config.groups.len(),
        config.probe_timeout_seconds
    );

    let store = Arc::new(InMemoryNodeStore::new());
    let params = Arc::new(InMemoryParamStore::new());
    let service = Arc::new(RpcProbeService::new(config.probe_timeout())?);

    // No OS reachability source here; the sender stays alive so engines keep listening
    let (_connectivity_tx, connectivity_rx) = watch::channel(true);

    let mut engines: Vec<Engine> = Vec::new();
    for group in NodeGroup::ALL {
        if !config.is_group_enabled(group) {
            continue;
        }

        let (settings, fastest, nodes) = match config.groups.get(&group) {
            Some(group_config) if !group_config.nodes.is_empty() => (
                group_config.settings.clone(),
                group_config.fastest,
                group_config.nodes.clone(),
            ),
            Some(group_config) => (
                group_config.settings.clone(),
                group_config.fastest,
                default_nodes(group),
            ),
            None if config.enabled_groups.is_some() => {
                (GroupSettings::for_group(group), false, default_nodes(group))
            }
            None => continue,
        };

        store.set_nodes(group, nodes);
        params.set(group, fastest);

        let policy = BlockchainHealthCheck::new(group, service.clone(), store.clone(), &settings);
        let engine = HealthCheckEngine::spawn(
            group,
            policy,
            store.clone(),
            params.clone(),
            &settings,
            connectivity_rx.clone(),
        );
        info!(
            "Health check for {} started: normal {}s, crucial {}s, epsilon {}",
            group,
            settings.normal_interval.as_secs(),
            settings.crucial_interval.as_secs(),
            settings.height_epsilon
        );
        engines.push(engine);
    }

    if engines.is_empty() {
        warn!("No node groups configured, nothing to check");
        return Ok(());
    }

    let reporters = engines.clone();
    let log_interval = Duration::from_secs(config.log_interval_seconds.max(1));
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(log_interval);
        interval.tick().await;

        loop {
            interval.tick().await;

            for engine in &reporters {
                log_report(engine).await;
            }
        }
    });

    tokio::signal::ctrl_c().await?;
    info!("Shutting down");

    for engine in &engines {
        engine.shutdown();
    }

    Ok(())
}

async fn log_report(engine: &Engine) {
    let Some(report) = engine.report().await else {
        warn!("Health check engine for {} is not running", engine.group());
        return;
    };

    match serde_json::to_string(&report) {
        Ok(json) => info!(
            "{}: {} of {} nodes usable {}",
            report.group,
            report.usable_count(),
            report.nodes.len(),
            json
        ),
        Err(e) => error!("Failed to serialize {} report: {}", report.group, e),
    }

    // Latest height as seen by the best ranked node
    let result = engine
        .request(false, |service, origin| async move { service.probe(&origin).await })
        .await;
    match result {
        Ok(status) => info!("{} best node height: {}", engine.group(), status.height),
        Err(e) => warn!("{} has no usable node: {}", engine.group(), e),
    }
}

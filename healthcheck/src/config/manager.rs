use super::{Config, GroupConfig, GroupConfigFile, GroupSettings};
use crate::errors::ConfigError;
use anyhow::{anyhow, Result};
use glob::glob;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::fs;
use tracing::{debug, info, warn};

pub struct ConfigManager {
    current_config: Arc<Config>,
}

impl ConfigManager {
    pub async fn new(config_dir: String) -> Result<Self> {
        let config = Self::load_configuration(&config_dir).await?;
        Ok(Self {
            current_config: Arc::new(config),
        })
    }

    pub fn get_current_config(&self) -> Arc<Config> {
        self.current_config.clone()
    }

    async fn load_configuration(config_dir: &str) -> Result<Config> {
        let main_config_path = format!("{}/main.toml", config_dir);
        let main_config_content =
            fs::read_to_string(&main_config_path)
                .await
                .map_err(|e| ConfigError::LoadFailed {
                    path: main_config_path.clone(),
                    reason: e.to_string(),
                })?;

        let mut config: Config =
            toml::from_str(&main_config_content).map_err(|e| ConfigError::ParseError {
                path: main_config_path.clone(),
                reason: e.to_string(),
            })?;

        if config.probe_timeout_seconds == 0 {
            return Err(ConfigError::InvalidValue {
                field: "probe_timeout_seconds".to_string(),
                reason: "must be non-zero".to_string(),
            }
            .into());
        }

        // One file per node group
        let pattern = format!("{}/*.toml", config_dir);
        let mut groups = HashMap::new();

        for entry in glob(&pattern).map_err(|e| anyhow!("Glob pattern error: {}", e))? {
            let path = entry.map_err(|e| anyhow!("Glob entry error: {}", e))?;
            let filename = path
                .file_name()
                .and_then(|name| name.to_str())
                .ok_or_else(|| anyhow!("Invalid filename"))?;

            if filename == "main.toml" {
                continue;
            }

            debug!("Loading group config: {}", path.display());

            let content = fs::read_to_string(&path)
                .await
                .map_err(|e| ConfigError::LoadFailed {
                    path: path.display().to_string(),
                    reason: e.to_string(),
                })?;

            let file: GroupConfigFile =
                toml::from_str(&content).map_err(|e| ConfigError::ParseError {
                    path: path.display().to_string(),
                    reason: e.to_string(),
                })?;

            let group = file.group.name;
            let settings = GroupSettings::from_section(&file.group)?;
            let nodes = file.nodes.iter().map(|entry| entry.to_node()).collect();

            if groups.contains_key(&group) {
                warn!(
                    "Group {} is configured more than once, {} wins",
                    group,
                    path.display()
                );
            }

            groups.insert(
                group,
                GroupConfig {
                    settings,
                    fastest: file.group.fastest.unwrap_or(false),
                    nodes,
                },
            );
        }

        config.groups = groups;

        info!(
            "Loaded {} node groups, {} nodes",
            config.groups.len(),
            config.groups.values().map(|g| g.nodes.len()).sum::<usize>()
        );

        Ok(config)
    }
}

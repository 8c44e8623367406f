pub mod manager;

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::time::Duration;

pub use manager::ConfigManager;

use crate::constants::{defaults, groups};
use crate::errors::ConfigError;
use crate::nodes::{Node, NodeGroup, Origin, Scheme};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    #[serde(default = "default_probe_timeout")]
    pub probe_timeout_seconds: u64,
    #[serde(default = "default_log_interval")]
    pub log_interval_seconds: u64,
    /// Limit the engines to these groups; all configured groups when absent
    pub enabled_groups: Option<Vec<NodeGroup>>,
    // Populated from the per-group config files
    #[serde(skip)]
    pub groups: HashMap<NodeGroup, GroupConfig>,
}

fn default_probe_timeout() -> u64 {
    defaults::PROBE_TIMEOUT_SECONDS
}

fn default_log_interval() -> u64 {
    defaults::LOG_INTERVAL_SECONDS
}

impl Config {
    pub fn probe_timeout(&self) -> Duration {
        Duration::from_secs(self.probe_timeout_seconds)
    }

    pub fn is_group_enabled(&self, group: NodeGroup) -> bool {
        self.enabled_groups
            .as_ref()
            .is_none_or(|groups| groups.contains(&group))
    }
}

/// One `<group>.toml` file
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GroupConfigFile {
    pub group: GroupSection,
    #[serde(default)]
    pub nodes: Vec<NodeEntry>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GroupSection {
    pub name: NodeGroup,
    pub fastest: Option<bool>,
    pub normal_interval_seconds: Option<u64>,
    pub crucial_interval_seconds: Option<u64>,
    pub height_epsilon: Option<u64>,
    pub min_version: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NodeEntry {
    #[serde(default)]
    pub scheme: Scheme,
    pub host: String,
    pub port: Option<u16>,
    pub alt_scheme: Option<Scheme>,
    pub alt_host: Option<String>,
    pub alt_port: Option<u16>,
    #[serde(default = "default_enabled")]
    pub enabled: bool,
}

fn default_enabled() -> bool {
    true
}

impl NodeEntry {
    pub fn to_node(&self) -> Node {
        let mut node = Node::new(Origin::new(self.scheme, self.host.clone(), self.port));
        if let Some(alt_host) = &self.alt_host {
            node.alt_origin = Some(Origin::new(
                self.alt_scheme.unwrap_or(Scheme::Http),
                alt_host.clone(),
                self.alt_port,
            ));
        }
        node.enabled = self.enabled;
        node
    }
}

/// Resolved tuning of one group
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GroupSettings {
    pub normal_interval: Duration,
    pub crucial_interval: Duration,
    pub height_epsilon: u64,
    pub min_version: Option<String>,
}

impl GroupSettings {
    pub fn for_group(group: NodeGroup) -> Self {
        let d = groups::defaults(group);
        Self {
            normal_interval: d.normal_interval,
            crucial_interval: d.crucial_interval,
            height_epsilon: d.height_epsilon,
            min_version: d.min_version.map(str::to_string),
        }
    }

    pub fn from_section(section: &GroupSection) -> Result<Self, ConfigError> {
        let mut settings = Self::for_group(section.name);
        if let Some(secs) = section.normal_interval_seconds {
            settings.normal_interval = Duration::from_secs(secs);
        }
        if let Some(secs) = section.crucial_interval_seconds {
            settings.crucial_interval = Duration::from_secs(secs);
        }
        if let Some(epsilon) = section.height_epsilon {
            settings.height_epsilon = epsilon;
        }
        if section.min_version.is_some() {
            settings.min_version = section.min_version.clone();
        }
        settings.validate(section.name)?;
        Ok(settings)
    }

    pub fn validate(&self, group: NodeGroup) -> Result<(), ConfigError> {
        if self.height_epsilon == 0 {
            return Err(ConfigError::InvalidValue {
                field: format!("{}.height_epsilon", group),
                reason: "must be at least 1".to_string(),
            });
        }
        if self.normal_interval.is_zero() || self.crucial_interval.is_zero() {
            return Err(ConfigError::InvalidValue {
                field: format!("{}.interval", group),
                reason: "polling intervals must be non-zero".to_string(),
            });
        }
        if self.crucial_interval > self.normal_interval {
            return Err(ConfigError::InvalidValue {
                field: format!("{}.crucial_interval_seconds", group),
                reason: "must not exceed normal_interval_seconds".to_string(),
            });
        }
        if let Some(min_version) = &self.min_version {
            min_version
                .parse::<crate::version::Version>()
                .map_err(|reason| ConfigError::InvalidValue {
                    field: format!("{}.min_version", group),
                    reason,
                })?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone)]
pub struct GroupConfig {
    pub settings: GroupSettings,
    pub fastest: bool,
    /// Empty when the file lists no nodes; the defaults are used then
    pub nodes: Vec<Node>,
}

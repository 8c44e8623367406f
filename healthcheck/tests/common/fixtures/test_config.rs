//! Test configuration builder for writing config directories programmatically

use std::fs;
use std::path::PathBuf;
use tempfile::TempDir;

/// Builder for creating test configuration directories
pub struct TestConfigBuilder {
    temp_dir: TempDir,
    main_toml: String,
    group_files: Vec<(String, String)>,
}

impl TestConfigBuilder {
    pub fn new() -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        Self {
            temp_dir,
            main_toml: String::new(),
            group_files: Vec::new(),
        }
    }

    pub fn with_main(mut self, toml: &str) -> Self {
        self.main_toml = toml.to_string();
        self
    }

    /// Add a `<file_stem>.toml` group file
    pub fn with_group<F>(mut self, file_stem: &str, group: &str, f: F) -> Self
    where
        F: FnOnce(GroupConfigBuilder) -> GroupConfigBuilder,
    {
        let builder = f(GroupConfigBuilder::new(group));
        self.group_files
            .push((file_stem.to_string(), builder.to_toml()));
        self
    }

    /// Add a group file with raw contents
    pub fn with_raw_file(mut self, file_stem: &str, contents: &str) -> Self {
        self.group_files
            .push((file_stem.to_string(), contents.to_string()));
        self
    }

    /// Write all files into a fresh `config` directory
    pub fn build(self) -> TestConfig {
        let config_dir = self.temp_dir.path().join("config");
        fs::create_dir_all(&config_dir).expect("Failed to create config dir");

        fs::write(config_dir.join("main.toml"), &self.main_toml).expect("Failed to write main.toml");

        for (stem, contents) in &self.group_files {
            fs::write(config_dir.join(format!("{}.toml", stem)), contents)
                .expect("Failed to write group config");
        }

        TestConfig {
            _temp_dir: self.temp_dir,
            config_dir,
        }
    }
}

impl Default for TestConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Group file builder
pub struct GroupConfigBuilder {
    name: String,
    overrides: Vec<String>,
    nodes: Vec<String>,
}

impl GroupConfigBuilder {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            overrides: Vec::new(),
            nodes: Vec::new(),
        }
    }

    pub fn fastest(mut self, on: bool) -> Self {
        self.overrides.push(format!("fastest = {}", on));
        self
    }

    pub fn intervals(mut self, normal_seconds: u64, crucial_seconds: u64) -> Self {
        self.overrides
            .push(format!("normal_interval_seconds = {}", normal_seconds));
        self.overrides
            .push(format!("crucial_interval_seconds = {}", crucial_seconds));
        self
    }

    pub fn height_epsilon(mut self, epsilon: u64) -> Self {
        self.overrides.push(format!("height_epsilon = {}", epsilon));
        self
    }

    pub fn min_version(mut self, version: &str) -> Self {
        self.overrides
            .push(format!("min_version = \"{}\"", version));
        self
    }

    pub fn add_node(mut self, host: &str) -> Self {
        self.nodes
            .push(format!("[[nodes]]\nhost = \"{}\"\n", host));
        self
    }

    pub fn add_node_with_alt(mut self, host: &str, alt_host: &str, alt_port: u16) -> Self {
        self.nodes.push(format!(
            "[[nodes]]\nhost = \"{}\"\nalt_host = \"{}\"\nalt_port = {}\n",
            host, alt_host, alt_port
        ));
        self
    }

    pub fn add_disabled_node(mut self, host: &str) -> Self {
        self.nodes
            .push(format!("[[nodes]]\nhost = \"{}\"\nenabled = false\n", host));
        self
    }

    fn to_toml(&self) -> String {
        let mut toml = format!("[group]\nname = \"{}\"\n", self.name);
        for line in &self.overrides {
            toml.push_str(line);
            toml.push('\n');
        }
        for node in &self.nodes {
            toml.push('\n');
            toml.push_str(node);
        }
        toml
    }
}

pub struct TestConfig {
    _temp_dir: TempDir,
    pub config_dir: PathBuf,
}

impl TestConfig {
    pub fn dir(&self) -> String {
        self.config_dir.display().to_string()
    }
}

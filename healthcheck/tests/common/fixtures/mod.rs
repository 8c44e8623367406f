//! This module provides reusable test utilities:
//! - Scripted probe service with per-host replies and a call log
//! - Engine harness wiring stores, params and connectivity
//! - Test configuration builders
//! - Common test data

// Not every test binary uses every fixture
#![allow(dead_code)]
#![allow(unused_imports)]

pub mod harness;
pub mod mock_service;
pub mod test_config;
pub mod test_data;

pub use harness::EngineHarness;
pub use mock_service::ScriptedService;
pub use test_config::TestConfigBuilder;
pub use test_data::*;

//! Scripted probe service for testing the engines without real nodes
//!
//! Replies are looked up by origin host: queued replies are consumed first,
//! then the host default applies. Unknown hosts fail with a connection error.

use async_trait::async_trait;
use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;
use std::time::Duration;

use healthcheck::errors::ProbeError;
use healthcheck::nodes::{NodeStatusInfo, Origin};
use healthcheck::service::ProbedService;

use super::test_data::{connection_error, status};

type Reply = Result<NodeStatusInfo, ProbeError>;

#[derive(Default)]
pub struct ScriptedService {
    defaults: Mutex<HashMap<String, Reply>>,
    queued: Mutex<HashMap<String, VecDeque<Reply>>>,
    calls: Mutex<Vec<Origin>>,
    delay: Option<Duration>,
    host_delays: Mutex<HashMap<String, Duration>>,
}

impl ScriptedService {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every probe takes `delay` before replying
    pub fn with_delay(delay: Duration) -> Self {
        Self {
            delay: Some(delay),
            ..Self::default()
        }
    }

    /// Probes of `host` take `delay`, overriding the service-wide delay
    pub fn set_delay(&self, host: &str, delay: Duration) {
        self.host_delays
            .lock()
            .unwrap()
            .insert(host.to_string(), delay);
    }

    pub fn set_default(&self, host: &str, reply: Reply) {
        self.defaults
            .lock()
            .unwrap()
            .insert(host.to_string(), reply);
    }

    pub fn healthy(&self, host: &str, height: u64, ping_ms: u64) {
        self.set_default(host, Ok(status(height, ping_ms)));
    }

    pub fn failing(&self, host: &str) {
        self.set_default(host, Err(connection_error(host)));
    }

    /// One-shot reply, consumed before the host default
    pub fn queue(&self, host: &str, reply: Reply) {
        self.queued
            .lock()
            .unwrap()
            .entry(host.to_string())
            .or_default()
            .push_back(reply);
    }

    pub fn calls(&self) -> Vec<Origin> {
        self.calls.lock().unwrap().clone()
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }

    pub fn calls_to(&self, host: &str) -> usize {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .filter(|origin| origin.host == host)
            .count()
    }

    fn next_reply(&self, host: &str) -> Reply {
        if let Some(reply) = self
            .queued
            .lock()
            .unwrap()
            .get_mut(host)
            .and_then(VecDeque::pop_front)
        {
            return reply;
        }

        self.defaults
            .lock()
            .unwrap()
            .get(host)
            .cloned()
            .unwrap_or_else(|| Err(connection_error(host)))
    }
}

#[async_trait]
impl ProbedService for ScriptedService {
    async fn probe(&self, origin: &Origin) -> Result<NodeStatusInfo, ProbeError> {
        self.calls.lock().unwrap().push(origin.clone());
        let host_delay = self.host_delays.lock().unwrap().get(&origin.host).copied();
        if let Some(delay) = host_delay.or(self.delay) {
            tokio::time::sleep(delay).await;
        }
        self.next_reply(&origin.host)
    }
}

//! Probed services: the per-blockchain clients the engine asks for node status
//!
//! `RpcProbeService` is the HTTP implementation used by the binary. It hits the
//! node status endpoint and measures the round trip as the node's ping.

use async_trait::async_trait;
use reqwest::Client as HttpClient;
use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};
use tokio::time::timeout;
use tracing::debug;

use crate::constants::http;
use crate::errors::ProbeError;
use crate::nodes::{NodeStatusInfo, Origin};

#[async_trait]
pub trait ProbedService: Send + Sync + 'static {
    async fn probe(&self, origin: &Origin) -> Result<NodeStatusInfo, ProbeError>;
}

/// Node status endpoint response
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusResponse {
    pub success: Option<bool>,
    pub height: u64,
    pub version: Option<String>,
    pub ws_client: Option<WsClientInfo>,
    pub error: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WsClientInfo {
    pub enabled: bool,
    pub port: Option<u16>,
}

#[derive(Clone)]
pub struct RpcProbeService {
    client: HttpClient,
    probe_timeout: Duration,
    status_path: String,
}

impl RpcProbeService {
    pub fn new(probe_timeout: Duration) -> Result<Self, ProbeError> {
        let client = HttpClient::builder()
            .connect_timeout(http::CONNECT_TIMEOUT)
            .build()
            .map_err(|e| ProbeError::Internal {
                reason: format!("Failed to create HTTP client: {}", e),
            })?;

        Ok(Self {
            client,
            probe_timeout,
            status_path: http::STATUS_PATH.to_string(),
        })
    }

    pub fn with_status_path(mut self, path: impl Into<String>) -> Self {
        self.status_path = path.into();
        self
    }

    /// GET `path` on `origin` and decode the JSON body, classifying failures
    pub async fn get_json<T: serde::de::DeserializeOwned>(
        &self,
        origin: &Origin,
        path: &str,
    ) -> Result<T, ProbeError> {
        let url = format!("{}{}", origin.url(), path);

        let response = timeout(self.probe_timeout, self.client.get(&url).send())
            .await
            .map_err(|_| ProbeError::timeout(origin))?
            .map_err(|e| ProbeError::from_transport(origin, e))?;

        let status = response.status();
        if status.is_server_error() || status.as_u16() == 429 {
            return Err(ProbeError::ServerError {
                origin: origin.url(),
                status: status.as_u16(),
            });
        }
        if !status.is_success() {
            return Err(ProbeError::Rejected {
                origin: origin.url(),
                message: format!(
                    "HTTP {}: {}",
                    status,
                    response.text().await.unwrap_or_default()
                ),
            });
        }

        response
            .json::<T>()
            .await
            .map_err(|e| ProbeError::InvalidResponse {
                origin: origin.url(),
                reason: e.to_string(),
            })
    }
}

#[async_trait]
impl ProbedService for RpcProbeService {
    async fn probe(&self, origin: &Origin) -> Result<NodeStatusInfo, ProbeError> {
        let started = Instant::now();
        let status: StatusResponse = self.get_json(origin, &self.status_path).await?;
        let ping = started.elapsed();

        if status.success == Some(false) {
            return Err(ProbeError::Rejected {
                origin: origin.url(),
                message: status
                    .error
                    .unwrap_or_else(|| "status request unsuccessful".to_string()),
            });
        }

        debug!(
            "Probed {}: height {} version {:?} in {}ms",
            origin,
            status.height,
            status.version,
            ping.as_millis()
        );

        let ws = status.ws_client.as_ref();
        Ok(NodeStatusInfo {
            height: status.height,
            version: status.version,
            ws_enabled: ws.is_some_and(|ws| ws.enabled),
            ws_port: ws.and_then(|ws| ws.port),
            ping,
        })
    }
}

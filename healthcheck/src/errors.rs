//! Error types for node probing, requests and configuration
//!
//! Probe and request failures fall in two classes: network errors, which the
//! request loop absorbs by failing over to the next node, and everything else,
//! which is returned to the caller on first occurrence.

use std::fmt;

use crate::nodes::{NodeGroup, Origin};

/// Error returned by a probed service or by `HealthCheckEngine::request`
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProbeError {
    /// No node could be reached although some are enabled
    NoNetwork,

    /// The group has no enabled node at all
    NoEndpoints { group: String },

    /// Request did not complete in time
    Timeout { origin: String },

    /// Connection could not be established or was dropped
    ConnectionFailed { origin: String, reason: String },

    /// Node answered with a retriable server-side status
    ServerError { origin: String, status: u16 },

    /// Node answered with something we could not understand
    InvalidResponse { origin: String, reason: String },

    /// Node understood the request and refused it
    Rejected { origin: String, message: String },

    /// Local failure unrelated to the node
    Internal { reason: String },
}

impl ProbeError {
    pub fn no_network() -> Self {
        ProbeError::NoNetwork
    }

    pub fn no_endpoints(group: NodeGroup) -> Self {
        ProbeError::NoEndpoints {
            group: group.name().to_string(),
        }
    }

    pub fn timeout(origin: &Origin) -> Self {
        ProbeError::Timeout {
            origin: origin.url(),
        }
    }

    /// Network errors are retried on the next node, everything else is final
    pub fn is_network_error(&self) -> bool {
        matches!(
            self,
            ProbeError::NoNetwork
                | ProbeError::Timeout { .. }
                | ProbeError::ConnectionFailed { .. }
                | ProbeError::ServerError { .. }
        )
    }

    /// Classify a transport error raised while talking to `origin`
    pub fn from_transport(origin: &Origin, err: reqwest::Error) -> Self {
        let origin = origin.url();
        if err.is_timeout() {
            ProbeError::Timeout { origin }
        } else if err.is_connect() || err.is_request() || err.is_body() {
            ProbeError::ConnectionFailed {
                origin,
                reason: err.to_string(),
            }
        } else if err.is_decode() {
            ProbeError::InvalidResponse {
                origin,
                reason: err.to_string(),
            }
        } else {
            ProbeError::ConnectionFailed {
                origin,
                reason: err.to_string(),
            }
        }
    }
}

impl fmt::Display for ProbeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProbeError::NoNetwork => write!(f, "No network connection"),
            ProbeError::NoEndpoints { group } => {
                write!(f, "No enabled {} nodes", group)
            }
            ProbeError::Timeout { origin } => write!(f, "Request to {} timed out", origin),
            ProbeError::ConnectionFailed { origin, reason } => {
                write!(f, "Connection to {} failed: {}", origin, reason)
            }
            ProbeError::ServerError { origin, status } => {
                write!(f, "Server error {} from {}", status, origin)
            }
            ProbeError::InvalidResponse { origin, reason } => {
                write!(f, "Invalid response from {}: {}", origin, reason)
            }
            ProbeError::Rejected { origin, message } => {
                write!(f, "Request rejected by {}: {}", origin, message)
            }
            ProbeError::Internal { reason } => write!(f, "Internal error: {}", reason),
        }
    }
}

impl std::error::Error for ProbeError {}

/// Configuration error variants
#[derive(Debug)]
pub enum ConfigError {
    /// Failed to load configuration file
    LoadFailed { path: String, reason: String },

    /// Configuration parsing error
    ParseError { path: String, reason: String },

    /// Invalid configuration value
    InvalidValue { field: String, reason: String },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::LoadFailed { path, reason } => {
                write!(f, "Failed to load config from '{}': {}", path, reason)
            }
            ConfigError::ParseError { path, reason } => {
                write!(f, "Failed to parse config '{}': {}", path, reason)
            }
            ConfigError::InvalidValue { field, reason } => {
                write!(f, "Invalid value for '{}': {}", field, reason)
            }
        }
    }
}

impl std::error::Error for ConfigError {}

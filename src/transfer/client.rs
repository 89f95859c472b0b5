//! Per-call HTTP transport construction.
//!
//! Every upload and download builds its own `reqwest::Client`. The trust-bypass
//! flag is therefore a property of one call's transport and cannot leak into
//! any other call. Dropping the client at the end of the call releases its
//! connection pool.

use std::time::Duration;

use reqwest::{Client, ClientBuilder};
use tracing::{debug, warn};

use super::TransferFailure;
use crate::user_agent;

/// Transport settings shared by uploads and downloads.
///
/// Timeouts are `None` by default: a hung connection blocks until the
/// transport's own limits (if any) fire.
#[derive(Debug, Clone)]
pub struct TransportConfig {
    /// Connect timeout.
    pub connect_timeout: Option<Duration>,
    /// Whole-request timeout.
    pub read_timeout: Option<Duration>,
    /// User-Agent header value.
    pub user_agent: String,
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            connect_timeout: None,
            read_timeout: None,
            user_agent: user_agent::default_transfer_user_agent(),
        }
    }
}

impl TransportConfig {
    /// Sets the connect timeout.
    #[must_use]
    pub fn with_connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = Some(timeout);
        self
    }

    /// Sets the whole-request timeout.
    #[must_use]
    pub fn with_read_timeout(mut self, timeout: Duration) -> Self {
        self.read_timeout = Some(timeout);
        self
    }

    /// Overrides the User-Agent header.
    #[must_use]
    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }
}

/// Builds a client for a single transfer.
///
/// With `trust_all_certificates` set, TLS certificate chain and hostname
/// validation are disabled for this client only.
pub(crate) fn build_client(
    config: &TransportConfig,
    trust_all_certificates: bool,
) -> Result<Client, TransferFailure> {
    base_client_builder(config, trust_all_certificates)
        .build()
        .map_err(|source| TransferFailure::Client { source })
}

fn base_client_builder(config: &TransportConfig, trust_all_certificates: bool) -> ClientBuilder {
    let mut builder = Client::builder().gzip(true).user_agent(&config.user_agent);
    if let Some(timeout) = config.connect_timeout {
        builder = builder.connect_timeout(timeout);
    }
    if let Some(timeout) = config.read_timeout {
        builder = builder.timeout(timeout);
    }
    if trust_all_certificates {
        warn!("TLS certificate and hostname verification disabled for this transfer");
        builder = builder.danger_accept_invalid_certs(true);
    } else {
        debug!("TLS verification enabled");
    }
    builder
}

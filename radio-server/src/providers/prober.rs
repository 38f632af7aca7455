//! Startup health discovery.
//!
//! Every mirror is probed concurrently and the earliest success wins.
//! Probes that are still in flight when a winner is found keep running in
//! the background so each mirror's availability flag ends up matching its
//! own outcome. If nothing succeeds, discovery reports `None` only after
//! the last probe has settled.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;
use tracing::{debug, info};

use crate::transport::{Request, Transport};

use super::registry::{ProviderId, ProviderRegistry};

/// Cheap request used to test reachability.
pub const PROBE_PATH: &str = "/json/stations/topvote/1";

/// Races health probes against all registered mirrors.
pub struct HealthProber<T> {
    transport: Arc<T>,
    registry: Arc<ProviderRegistry>,
    timeout: Duration,
}

impl<T: Transport> HealthProber<T> {
    pub fn new(transport: Arc<T>, registry: Arc<ProviderRegistry>, timeout: Duration) -> Self {
        Self {
            transport,
            registry,
            timeout,
        }
    }

    /// Find the first mirror that answers a probe.
    ///
    /// Never fails: `None` means every probe failed or timed out.
    pub async fn discover(&self) -> Option<ProviderId> {
        let (tx, mut rx) = mpsc::unbounded_channel();

        for id in self.registry.by_priority() {
            let transport = Arc::clone(&self.transport);
            let registry = Arc::clone(&self.registry);
            let timeout = self.timeout;
            let tx = tx.clone();

            tokio::spawn(async move {
                let healthy = probe(transport.as_ref(), &registry, id, timeout).await;
                registry.set_available(id, healthy);
                // The receiver is gone once a winner has been picked.
                let _ = tx.send((id, healthy));
            });
        }
        drop(tx);

        while let Some((id, healthy)) = rx.recv().await {
            if healthy {
                if let Some(provider) = self.registry.get(id) {
                    info!(provider = %provider.name, "Connected to provider");
                }
                return Some(id);
            }
        }

        None
    }

    /// Probe one mirror with an explicit timeout and record the outcome.
    pub async fn check(&self, id: ProviderId, timeout: Duration) -> bool {
        let healthy = probe(self.transport.as_ref(), &self.registry, id, timeout).await;
        self.registry.set_available(id, healthy);
        healthy
    }
}

async fn probe<T: Transport>(
    transport: &T,
    registry: &ProviderRegistry,
    id: ProviderId,
    timeout: Duration,
) -> bool {
    let Some(provider) = registry.get(id) else {
        return false;
    };

    let request = Request::new(&provider.base_url, PROBE_PATH, timeout);
    match tokio::time::timeout(timeout, transport.get(&request)).await {
        Ok(Ok(_)) => {
            debug!(provider = %provider.name, "Probe succeeded");
            true
        }
        Ok(Err(e)) => {
            debug!(provider = %provider.name, error = %e, "Probe failed");
            false
        }
        Err(_) => {
            debug!(provider = %provider.name, timeout_ms = timeout.as_millis() as u64, "Probe timed out");
            false
        }
    }
}

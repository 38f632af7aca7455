//! Failover executor.
//!
//! Every outbound operation runs through [`Dispatcher::execute`]. The
//! dispatcher waits for the one-time startup probe, runs the operation
//! against the current provider, and on failure walks the remaining
//! available providers in priority order until one succeeds.
//!
//! The current provider is a shared hint, not a lease: concurrent calls
//! that fail over at the same time may each move it, and whichever stores
//! last wins. Each call validates its own result, so a stale hint only
//! costs one extra failed attempt.

use std::future::Future;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::Duration;

use tokio::sync::Mutex;
use tracing::{debug, error, info, warn};

use crate::error::{ClientError, Result};
use crate::providers::{HealthProber, Provider, ProviderId, ProviderRegistry};
use crate::transport::Transport;

/// Runs operations against the mirror set with failover.
pub struct Dispatcher<T> {
    registry: Arc<ProviderRegistry>,
    prober: HealthProber<T>,
    current: AtomicUsize,
    default: ProviderId,
    initialized: AtomicBool,
    init_lock: Mutex<()>,
}

impl<T: Transport> Dispatcher<T> {
    /// Create a dispatcher. The first provider in list order is the default.
    ///
    /// No I/O happens until the first call or [`Dispatcher::wait_for_initialization`].
    pub fn new(transport: Arc<T>, registry: Arc<ProviderRegistry>, probe_timeout: Duration) -> Self {
        let prober = HealthProber::new(transport, Arc::clone(&registry), probe_timeout);
        Self {
            registry,
            prober,
            current: AtomicUsize::new(0),
            default: ProviderId(0),
            initialized: AtomicBool::new(false),
            init_lock: Mutex::new(()),
        }
    }

    pub fn registry(&self) -> &ProviderRegistry {
        &self.registry
    }

    pub fn current_id(&self) -> ProviderId {
        ProviderId(self.current.load(Ordering::Acquire))
    }

    /// Snapshot of the current provider.
    pub fn current_provider(&self) -> Result<Provider> {
        self.registry
            .get(self.current_id())
            .ok_or(ClientError::NoProviders)
    }

    fn set_current(&self, id: ProviderId) {
        self.current.store(id.0, Ordering::Release);
    }

    /// True once a probe round has completed and no refresh is pending.
    pub fn is_initialized(&self) -> bool {
        self.initialized.load(Ordering::Acquire)
    }

    /// Wait for the startup probe, running it if nobody has yet.
    ///
    /// The probe runs at most once; callers arriving while it is in flight
    /// wait for it, and callers arriving afterwards return immediately.
    pub async fn wait_for_initialization(&self) {
        if self.is_initialized() {
            return;
        }
        let _guard = self.init_lock.lock().await;
        if self.is_initialized() {
            return;
        }
        self.initialize().await;
    }

    /// Force one more probe round, whatever the current state.
    pub async fn refresh(&self) {
        let _guard = self.init_lock.lock().await;
        info!("Refreshing provider connection");
        self.initialized.store(false, Ordering::Release);
        self.initialize().await;
    }

    /// Probe round. Always ends initialized so startup cannot deadlock.
    async fn initialize(&self) {
        info!(providers = self.registry.len(), "Initializing providers");

        match self.prober.discover().await {
            Some(id) => {
                self.set_current(id);
                if let Some(provider) = self.registry.get(id) {
                    info!(
                        provider = %provider.name,
                        base_url = %provider.base_url,
                        "Initialized provider"
                    );
                }
            }
            None => {
                warn!("No working provider found, using default provider");
                self.set_current(self.default);
            }
        }

        self.initialized.store(true, Ordering::Release);
    }

    /// Point the client at a named provider and probe it.
    ///
    /// The switch happens even if the probe fails; the return value reports
    /// whether the provider answered.
    pub async fn switch_to(&self, name: &str, timeout: Duration) -> Result<bool> {
        let id = self
            .registry
            .find(name)
            .ok_or_else(|| ClientError::ProviderNotFound(name.to_string()))?;

        self.set_current(id);
        let healthy = self.prober.check(id, timeout).await;

        if healthy {
            info!(provider = %name, "Switched provider");
        } else {
            error!(provider = %name, "Failed to switch provider");
        }
        Ok(healthy)
    }

    /// Run `op` with failover and propagate the last error on exhaustion.
    pub async fn execute<R, F, Fut>(&self, op: F) -> Result<R>
    where
        F: Fn(Provider) -> Fut,
        Fut: Future<Output = Result<R>>,
    {
        self.wait_for_initialization().await;

        let current = self.current_id();
        let provider = self.current_provider()?;
        let name = provider.name.clone();

        let err = match op(provider).await {
            Ok(value) => return Ok(value),
            Err(e) => e,
        };

        warn!(provider = %name, error = %err, "Request failed, trying fallback providers");
        self.registry.set_available(current, false);

        let mut last_err = err;
        for id in self.registry.candidates_excluding(current) {
            let Some(candidate) = self.registry.get(id) else {
                continue;
            };
            let name = candidate.name.clone();
            debug!(provider = %name, "Trying fallback provider");
            self.set_current(id);

            match op(candidate).await {
                Ok(value) => return Ok(value),
                Err(e) => {
                    debug!(provider = %name, error = %e, "Fallback provider also failed");
                    self.registry.set_available(id, false);
                    last_err = e;
                }
            }
        }

        Err(last_err)
    }

    /// Run `op` with failover, degrading to `fallback` on exhaustion.
    ///
    /// `fallback` is only called when every provider has failed.
    pub async fn execute_or<R, F, Fut, D>(&self, op: F, fallback: D) -> R
    where
        F: Fn(Provider) -> Fut,
        Fut: Future<Output = Result<R>>,
        D: FnOnce() -> R,
    {
        match self.execute(op).await {
            Ok(value) => value,
            Err(e) => {
                warn!(error = %e, "All providers failed, using fallback");
                fallback()
            }
        }
    }
}

//! Provider registry.

use std::fmt;

use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use serde::Serialize;

use crate::config::ProviderConfig;
use crate::error::{ClientError, Result};

/// Which API dialect a mirror speaks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum ProviderKind {
    /// A radio-browser.info compatible directory mirror.
    RadioBrowser,
}

impl ProviderKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProviderKind::RadioBrowser => "radio-browser",
        }
    }
}

impl fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Index of a provider within its registry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ProviderId(pub usize);

/// Point-in-time view of a provider.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Provider {
    pub name: String,
    pub base_url: String,
    pub kind: ProviderKind,
    pub is_available: bool,
    pub priority: i32,
    /// When availability was last updated by a probe or a call.
    pub last_checked: Option<DateTime<Utc>>,
}

/// The ordered set of mirrors.
///
/// Identity (name, URL, kind, priority) is fixed at construction. Only the
/// availability flag changes, and it is guarded so probes and calls running
/// on different tasks can update it concurrently.
pub struct ProviderRegistry {
    providers: Vec<RwLock<Provider>>,
}

impl ProviderRegistry {
    /// Build the registry from configuration. Every provider starts available.
    pub fn new(configs: &[ProviderConfig]) -> Result<Self> {
        if configs.is_empty() {
            return Err(ClientError::NoProviders);
        }

        let providers = configs
            .iter()
            .map(|c| {
                RwLock::new(Provider {
                    name: c.name.clone(),
                    base_url: c.base_url.clone(),
                    kind: c.kind,
                    is_available: true,
                    priority: c.priority,
                    last_checked: None,
                })
            })
            .collect();

        Ok(Self { providers })
    }

    /// Number of registered providers.
    pub fn len(&self) -> usize {
        self.providers.len()
    }

    /// Always false: construction rejects an empty list.
    pub fn is_empty(&self) -> bool {
        self.providers.is_empty()
    }

    /// Snapshot of every provider, in configured order.
    pub fn all(&self) -> Vec<Provider> {
        self.providers.iter().map(|p| p.read().clone()).collect()
    }

    /// Snapshot of one provider.
    pub fn get(&self, id: ProviderId) -> Option<Provider> {
        self.providers.get(id.0).map(|p| p.read().clone())
    }

    /// Look up a provider by exact name.
    pub fn find(&self, name: &str) -> Option<ProviderId> {
        self.providers
            .iter()
            .position(|p| p.read().name == name)
            .map(ProviderId)
    }

    pub fn is_available(&self, id: ProviderId) -> bool {
        self.providers
            .get(id.0)
            .is_some_and(|p| p.read().is_available)
    }

    /// Record the outcome of a probe or call against a provider.
    pub fn set_available(&self, id: ProviderId, available: bool) {
        if let Some(slot) = self.providers.get(id.0) {
            let mut provider = slot.write();
            provider.is_available = available;
            provider.last_checked = Some(Utc::now());
        }
    }

    /// All provider ids ordered by ascending priority.
    ///
    /// Ties keep their configured order.
    pub fn by_priority(&self) -> Vec<ProviderId> {
        let mut ids: Vec<(ProviderId, i32)> = self
            .providers
            .iter()
            .enumerate()
            .map(|(idx, p)| (ProviderId(idx), p.read().priority))
            .collect();
        // sort_by_key is stable
        ids.sort_by_key(|(_, priority)| *priority);
        ids.into_iter().map(|(id, _)| id).collect()
    }

    /// Failover candidates: available providers other than `current`,
    /// by ascending priority.
    pub fn candidates_excluding(&self, current: ProviderId) -> Vec<ProviderId> {
        self.by_priority()
            .into_iter()
            .filter(|id| *id != current && self.is_available(*id))
            .collect()
    }
}

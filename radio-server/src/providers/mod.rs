//! Mirror endpoints and their health.
//!
//! The registry is the shared record of which mirrors exist and which are
//! currently believed reachable. The prober races lightweight requests
//! against every mirror to pick a starting point.

mod prober;
mod registry;

pub use prober::{HealthProber, PROBE_PATH};
pub use registry::{Provider, ProviderId, ProviderKind, ProviderRegistry};

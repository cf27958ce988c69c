//! Application layer - Use case services.
//!
//! This module contains the services that orchestrate domain logic and
//! adapter interactions:
//! - `fetcher`: current host ports from the port-manager
//! - `applier`: issuing add/remove calls for a change-set
//! - `coordinator`: caching, debounced re-checks and apply state
//!
//! Services accept domain types, reach external systems only through
//! the traits in `ports`, and return domain types.

mod applier;
mod coordinator;
mod fetcher;

#[cfg(test)]
pub(crate) mod testing;

pub use applier::{remaining_changes, AppliedPort, ApplyReport, PortChangeApplier, PortOperation};
pub use coordinator::{
    document_key, CoordinatorOptions, Notification, Phase, ReconciliationCoordinator,
    MAX_PENDING_NOTIFICATIONS,
    ReconciliationState,
};
pub use fetcher::fetch_current_ports;

//! Domain layer - Pure business logic and data models.
//!
//! This module contains the port sets, change-sets and mapping entries that
//! reconciliation works on. These types have no I/O dependencies and can be
//! tested in isolation.

mod change;
mod mapping;

// Re-export all domain types
pub use change::{diff, PortChange, PortSet};
pub use mapping::PortMapping;

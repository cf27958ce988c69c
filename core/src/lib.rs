//! PortSync Core Library
//!
//! Keeps the ports declared in a messaging server's XML configuration in line
//! with the host's Docker port mappings. Provides functionality to:
//! - Extract declared ports from `<input>` and `<connector>` elements
//! - Fetch the live mappings from the port-manager HTTP API
//! - Diff declared against live ports into an add/remove change-set
//! - Apply a confirmed change-set, adds before removes
//! - Keep the change-set warm with a debounced background re-check
//!
//! # Architecture
//! This library follows hexagonal architecture (ports & adapters):
//! - `domain`: Pure business logic and data models
//! - `ports`: Trait definitions (interfaces)
//! - `adapters`: External system implementations
//! - `application`: Use case services

// Hexagonal architecture layers
pub mod adapters;
pub mod application;
pub mod domain;
pub mod ports;

pub mod config;
pub mod error;
pub mod extractor;

// Re-export domain types (primary API)
pub use domain::{diff, PortChange, PortMapping, PortSet};

// Re-export other commonly used types
pub use adapters::HttpPortManager;
pub use application::{
    fetch_current_ports, AppliedPort, ApplyReport, CoordinatorOptions, Notification, Phase,
    PortChangeApplier, PortOperation, ReconciliationCoordinator, ReconciliationState,
};
pub use config::{ConfigStore, Settings};
pub use error::{Error, Result};
pub use extractor::{extract_declared_ports, try_extract_ports};
pub use ports::PortMappingPort;

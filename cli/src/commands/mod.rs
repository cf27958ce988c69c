//! Subcommand implementations.

pub mod apply;
pub mod config;
pub mod diff;
pub mod extract;
pub mod ports;
pub mod watch;

use std::path::Path;

use anyhow::{Context, Result};
use portsync_core::{ConfigStore, HttpPortManager, PortChange, PortSet, Settings};

/// Load settings and apply the `--url` / `PORTSYNC_URL` override.
pub async fn settings(url: Option<&str>) -> Result<Settings> {
    let mut settings = ConfigStore::new()?.load().await?;
    if let Some(url) = url {
        settings.base_url = url.trim_end_matches('/').to_string();
    }
    Ok(settings)
}

/// Port-manager client for the effective settings.
pub async fn client(url: Option<&str>) -> Result<(HttpPortManager, Settings)> {
    let settings = settings(url).await?;
    let client = HttpPortManager::from_settings(&settings)?;
    Ok((client, settings))
}

/// Read a configuration document from disk.
pub async fn read_document(path: &Path) -> Result<String> {
    tokio::fs::read_to_string(path)
        .await
        .with_context(|| format!("Failed to read {}", path.display()))
}

pub fn format_ports(ports: &PortSet) -> String {
    if ports.is_empty() {
        return "-".to_string();
    }
    ports
        .iter()
        .map(|p| p.to_string())
        .collect::<Vec<_>>()
        .join(", ")
}

/// Print a change-set as a two-line table.
pub fn print_changes(changes: &PortChange) {
    if changes.is_empty() {
        println!("Ports are in sync.");
        return;
    }

    println!("{:<8} PORTS", "ACTION");
    println!("{}", "-".repeat(40));
    println!("{:<8} {}", "add", format_ports(&changes.ports_to_add));
    println!("{:<8} {}", "remove", format_ports(&changes.ports_to_remove));
}

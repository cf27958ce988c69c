//! Extract command - show the ports a configuration file declares.

use std::path::Path;

use anyhow::Result;
use portsync_core::{extract_declared_ports, try_extract_ports};

pub async fn run(file: &Path, json: bool) -> Result<()> {
    let document = super::read_document(file).await?;

    if let Err(e) = try_extract_ports(&document) {
        tracing::warn!("{}: {}", file.display(), e);
    }
    let ports = extract_declared_ports(&document);

    if json {
        println!("{}", serde_json::to_string_pretty(&ports)?);
        return Ok(());
    }

    if ports.is_empty() {
        println!("No ports declared in {}.", file.display());
        return Ok(());
    }

    for port in &ports {
        println!("{}", port);
    }
    println!("\nTotal: {} ports", ports.len());
    Ok(())
}

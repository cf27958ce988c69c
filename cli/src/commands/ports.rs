//! Ports command - show the live port mappings.

use anyhow::Result;
use portsync_core::PortMappingPort;

pub async fn run(url: Option<&str>, json: bool) -> Result<()> {
    let (client, _) = super::client(url).await?;
    let mut mappings = client.list_mappings().await?;
    mappings.sort();

    if json {
        println!("{}", serde_json::to_string_pretty(&mappings)?);
        return Ok(());
    }

    if mappings.is_empty() {
        println!("No port mappings on {}.", client.base_url());
        return Ok(());
    }

    println!("{:<10} CONTAINER", "HOST");
    println!("{}", "-".repeat(24));

    for mapping in &mappings {
        println!("{:<10} {}", mapping.host_port, mapping.container_port);
    }

    println!("\nTotal: {} mappings", mappings.len());
    Ok(())
}

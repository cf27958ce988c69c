//! Diff command - show what applying a configuration file would change.

use std::path::Path;

use anyhow::{bail, Result};
use portsync_core::ReconciliationCoordinator;

pub async fn run(file: &Path, url: Option<&str>, json: bool) -> Result<()> {
    let document = super::read_document(file).await?;
    let (client, settings) = super::client(url).await?;
    let coordinator =
        ReconciliationCoordinator::with_options(client, document, (&settings).into());

    let changes = coordinator.refresh_port_changes(false).await;
    if let Some(error) = coordinator.state().last_error {
        bail!(error);
    }

    if json {
        println!("{}", serde_json::to_string_pretty(&changes)?);
    } else {
        super::print_changes(&changes);
    }
    Ok(())
}

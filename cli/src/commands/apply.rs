//! Apply command - review and apply the port changes for a configuration file.

use std::path::Path;

use anyhow::{bail, Result};
use portsync_core::{Error, ReconciliationCoordinator};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};

pub async fn run(file: &Path, url: Option<&str>, yes: bool, json: bool) -> Result<()> {
    let document = super::read_document(file).await?;
    let (client, settings) = super::client(url).await?;
    let coordinator =
        ReconciliationCoordinator::with_options(client, document, (&settings).into());

    // Always check against fresh state before changing anything.
    let changes = coordinator.refresh_port_changes(true).await;
    if let Some(error) = coordinator.state().last_error {
        bail!(error);
    }

    if changes.is_empty() {
        if json {
            println!("{}", serde_json::to_string_pretty(&changes)?);
        } else {
            println!("Ports are in sync, nothing to apply.");
        }
        return Ok(());
    }

    if !json {
        super::print_changes(&changes);
        println!();
    }

    if !yes && !confirm("Apply these port changes?").await? {
        eprintln!("Aborted.");
        return Ok(());
    }

    match coordinator.apply_changes().await {
        Ok(report) => {
            if json {
                println!("{}", serde_json::to_string_pretty(&report)?);
            } else {
                for applied in &report.applied {
                    println!("{:<8} {}", applied.operation, applied.port);
                }
                println!("\nApplied {} change(s).", report.len());
            }
            Ok(())
        }
        Err(Error::Apply {
            operation,
            port,
            applied,
            reason,
        }) => {
            for done in &applied {
                eprintln!("{:<8} {} (applied)", done.operation, done.port);
            }
            eprintln!("{:<8} {} (failed)", operation, port);
            eprintln!(
                "\nStill pending: {}. Re-run to retry.",
                coordinator.changes()
            );
            bail!("Failed to {} port {}: {}", operation, port, reason)
        }
        Err(e) => Err(e.into()),
    }
}

async fn confirm(prompt: &str) -> Result<bool> {
    let mut stderr = tokio::io::stderr();
    stderr
        .write_all(format!("{} [y/N] ", prompt).as_bytes())
        .await?;
    stderr.flush().await?;

    let mut line = String::new();
    BufReader::new(tokio::io::stdin()).read_line(&mut line).await?;
    Ok(matches!(line.trim().to_lowercase().as_str(), "y" | "yes"))
}

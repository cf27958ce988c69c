//! Watch command - keep the change-set for a configuration file up to date while it is edited.

use std::path::Path;
use std::time::Duration;

use anyhow::Result;
use portsync_core::{Notification, ReconciliationCoordinator};
use tracing::warn;

pub async fn run(file: &Path, url: Option<&str>, interval_ms: u64, json: bool) -> Result<()> {
    let document = super::read_document(file).await?;
    let (client, settings) = super::client(url).await?;
    let coordinator =
        ReconciliationCoordinator::with_options(client, document, (&settings).into());

    eprintln!(
        "Watching {} against {} (Ctrl-C to stop)",
        file.display(),
        coordinator.client().base_url()
    );
    coordinator.start_watching();

    let mut ticker = tokio::time::interval(Duration::from_millis(interval_ms.max(50)));
    let ctrl_c = tokio::signal::ctrl_c();
    tokio::pin!(ctrl_c);

    loop {
        tokio::select! {
            _ = &mut ctrl_c => break,
            _ = ticker.tick() => {}
        }

        match super::read_document(file).await {
            Ok(text) => coordinator.set_document(text),
            Err(e) => warn!("{:#}", e),
        }

        for notification in coordinator.take_messages() {
            report(&notification, json)?;
        }
    }

    coordinator.stop_watching();
    Ok(())
}

fn report(notification: &Notification, json: bool) -> Result<()> {
    match notification {
        Notification::ChangesDetected { changes } => {
            if json {
                println!("{}", serde_json::to_string(changes)?);
            } else {
                println!("Pending: {}", changes);
            }
        }
        Notification::CheckFailed { message } => warn!("{}", message),
        Notification::ChangesApplied { .. } | Notification::ApplyFailed { .. } => {}
    }
    Ok(())
}

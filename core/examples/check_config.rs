//! Example: Show the port changes a configuration file needs.
//!
//! Usage: `cargo run --example check_config -- server.xml [http://127.0.0.1:8000]`

use portsync_core::{extract_declared_ports, HttpPortManager, ReconciliationCoordinator};

#[tokio::main(flavor = "current_thread")]
async fn main() {
    let mut args = std::env::args().skip(1);
    let Some(path) = args.next() else {
        eprintln!("usage: check_config <server.xml> [base-url]");
        return;
    };
    let base_url = args
        .next()
        .unwrap_or_else(|| portsync_core::config::DEFAULT_BASE_URL.to_string());

    let document = match std::fs::read_to_string(&path) {
        Ok(document) => document,
        Err(e) => {
            eprintln!("Error reading {}: {}", path, e);
            return;
        }
    };

    let declared = extract_declared_ports(&document);
    println!("Declared ports: {:?}", declared);

    let client = match HttpPortManager::new(base_url) {
        Ok(client) => client,
        Err(e) => {
            eprintln!("Error creating client: {}", e);
            return;
        }
    };

    let coordinator = ReconciliationCoordinator::new(client, document);
    let changes = coordinator.refresh_port_changes(true).await;

    match coordinator.state().last_error {
        Some(error) => eprintln!("Error checking ports: {}", error),
        None => println!("{}", changes),
    }
}

//! Current port state, as reported by the port-manager.

use crate::domain::PortSet;
use crate::error::{Error, Result};
use crate::ports::PortMappingPort;

/// Fetch the host ports that are currently mapped.
///
/// Only the host side of each mapping is kept. Any failure is reported as
/// [`Error::Fetch`]; callers decide whether to degrade.
pub async fn fetch_current_ports<P: PortMappingPort>(client: &P) -> Result<PortSet> {
    let mappings = client.list_mappings().await.map_err(|e| match e {
        Error::Fetch(_) => e,
        other => Error::Fetch(other.to_string()),
    })?;

    Ok(mappings.into_iter().map(|m| m.host_port).collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::testing::MockPortManager;
    use crate::domain::PortMapping;

    #[tokio::test]
    async fn test_keeps_host_side_only() {
        let mock = MockPortManager::with_mappings([
            PortMapping::symmetric(8089),
            PortMapping {
                host_port: 9000,
                container_port: 8000,
            },
        ]);

        let ports = fetch_current_ports(&mock).await.unwrap();
        assert_eq!(ports, [8089, 9000].into_iter().collect());
    }

    #[tokio::test]
    async fn test_duplicates_collapse() {
        let mock = MockPortManager::with_mappings([
            PortMapping {
                host_port: 8000,
                container_port: 80,
            },
            PortMapping {
                host_port: 8000,
                container_port: 8080,
            },
        ]);

        let ports = fetch_current_ports(&mock).await.unwrap();
        assert_eq!(ports.len(), 1);
    }

    #[tokio::test]
    async fn test_failure_is_fetch_error() {
        let mock = MockPortManager::with_mappings([]);
        mock.fail_list(|| Error::Request("connection refused".to_string()));

        let err = fetch_current_ports(&mock).await.unwrap_err();
        assert!(matches!(err, Error::Fetch(ref msg) if msg.contains("connection refused")));
    }
}

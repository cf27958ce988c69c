//! Applying a change-set to the live port mappings.

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::domain::{PortChange, PortMapping};
use crate::error::{Error, Result};
use crate::ports::PortMappingPort;

/// Kind of call issued against the port-manager.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PortOperation {
    Add,
    Remove,
}

impl std::fmt::Display for PortOperation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Add => f.pad("add"),
            Self::Remove => f.pad("remove"),
        }
    }
}

/// One add/remove call that completed successfully.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AppliedPort {
    pub operation: PortOperation,
    pub port: u16,
}

/// Outcome of a fully applied change-set, in the order the calls were made.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApplyReport {
    pub applied: Vec<AppliedPort>,
}

impl ApplyReport {
    /// Ports that were added.
    pub fn added(&self) -> impl Iterator<Item = u16> + '_ {
        self.ports(PortOperation::Add)
    }

    /// Ports that were removed.
    pub fn removed(&self) -> impl Iterator<Item = u16> + '_ {
        self.ports(PortOperation::Remove)
    }

    fn ports(&self, operation: PortOperation) -> impl Iterator<Item = u16> + '_ {
        self.applied
            .iter()
            .filter(move |a| a.operation == operation)
            .map(|a| a.port)
    }

    /// True when no call was made.
    pub fn is_empty(&self) -> bool {
        self.applied.is_empty()
    }

    /// Number of calls that went through.
    pub fn len(&self) -> usize {
        self.applied.len()
    }
}

/// The part of `change` that is still outstanding after `applied` went through.
pub fn remaining_changes(change: &PortChange, applied: &[AppliedPort]) -> PortChange {
    let mut remaining = change.clone();
    for a in applied {
        match a.operation {
            PortOperation::Add => remaining.ports_to_add.remove(&a.port),
            PortOperation::Remove => remaining.ports_to_remove.remove(&a.port),
        };
    }
    remaining
}

/// Issues one port-manager call per port in a change-set.
///
/// All adds go out before any remove. Every mapping is symmetric
/// (`host_port == container_port`). The first failing call stops the batch;
/// calls that already succeeded are not rolled back and are reported in
/// [`Error::Apply`].
pub struct PortChangeApplier<'a, P: PortMappingPort> {
    client: &'a P,
}

impl<'a, P: PortMappingPort> PortChangeApplier<'a, P> {
    /// Create an applier that talks to the given port-manager.
    pub fn new(client: &'a P) -> Self {
        Self { client }
    }

    /// Apply the change-set.
    pub async fn apply(&self, change: &PortChange) -> Result<ApplyReport> {
        let operations = change
            .ports_to_add
            .iter()
            .map(|&port| (PortOperation::Add, port))
            .chain(
                change
                    .ports_to_remove
                    .iter()
                    .map(|&port| (PortOperation::Remove, port)),
            );

        let mut report = ApplyReport::default();

        for (operation, port) in operations {
            let mapping = PortMapping::symmetric(port);
            let result = match operation {
                PortOperation::Add => self.client.add_mapping(mapping).await,
                PortOperation::Remove => self.client.remove_mapping(mapping).await,
            };

            if let Err(e) = result {
                warn!(
                    "Failed to {} port {} after {} successful call(s): {}",
                    operation,
                    port,
                    report.len(),
                    e
                );
                return Err(Error::Apply {
                    operation,
                    port,
                    applied: report.applied,
                    reason: e.to_string(),
                });
            }

            match operation {
                PortOperation::Add => info!("Added port {}", port),
                PortOperation::Remove => info!("Removed port {}", port),
            }
            report.applied.push(AppliedPort { operation, port });
        }

        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::testing::MockPortManager;

    fn applied(operation: PortOperation, port: u16) -> AppliedPort {
        AppliedPort { operation, port }
    }

    #[tokio::test]
    async fn test_single_add() {
        let mock = MockPortManager::with_ports(&[8089]);
        let report = PortChangeApplier::new(&mock)
            .apply(&PortChange::new(&[8443], &[]))
            .await
            .unwrap();

        assert_eq!(mock.calls(), vec![applied(PortOperation::Add, 8443)]);
        assert_eq!(report.added().collect::<Vec<_>>(), vec![8443]);
        assert_eq!(report.removed().count(), 0);
        assert_eq!(mock.host_ports(), vec![8089, 8443]);
    }

    #[tokio::test]
    async fn test_adds_before_removes() {
        let mock = MockPortManager::with_ports(&[22, 9000]);
        let report = PortChangeApplier::new(&mock)
            .apply(&PortChange::new(&[8443, 80], &[9000, 22]))
            .await
            .unwrap();

        let expected = vec![
            applied(PortOperation::Add, 80),
            applied(PortOperation::Add, 8443),
            applied(PortOperation::Remove, 22),
            applied(PortOperation::Remove, 9000),
        ];
        assert_eq!(mock.calls(), expected);
        assert_eq!(report.applied, expected);
        assert_eq!(mock.host_ports(), vec![80, 8443]);
    }

    #[tokio::test]
    async fn test_empty_change_makes_no_calls() {
        let mock = MockPortManager::with_ports(&[8000]);
        let report = PortChangeApplier::new(&mock)
            .apply(&PortChange::default())
            .await;

        let report = tokio_test::assert_ok!(report);
        assert!(report.is_empty());
        assert!(mock.calls().is_empty());
    }

    #[tokio::test]
    async fn test_fails_fast_without_rollback() {
        let mock = MockPortManager::with_ports(&[9000]);
        mock.fail_on(PortOperation::Add, 8443);

        let change = PortChange::new(&[80, 8443, 9443], &[9000]);
        let err = PortChangeApplier::new(&mock).apply(&change).await.unwrap_err();

        match err {
            Error::Apply {
                operation,
                port,
                applied: done,
                ..
            } => {
                assert_eq!(operation, PortOperation::Add);
                assert_eq!(port, 8443);
                assert_eq!(done, vec![applied(PortOperation::Add, 80)]);
            }
            other => panic!("unexpected error: {other}"),
        }

        // 9443 and the remove were never attempted; 80 stays mapped.
        assert_eq!(mock.calls().len(), 2);
        assert_eq!(mock.host_ports(), vec![80, 9000]);
    }

    #[test]
    fn test_remaining_changes() {
        let change = PortChange::new(&[80, 8443], &[9000]);
        let remaining = remaining_changes(
            &change,
            &[applied(PortOperation::Add, 80), applied(PortOperation::Remove, 22)],
        );
        assert_eq!(remaining, PortChange::new(&[8443], &[9000]));
    }
}

//! Port sets, change-sets and the declared-vs-current diff.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

/// A set of host ports. Duplicates collapse; iteration order is ascending.
pub type PortSet = BTreeSet<u16>;

/// The delta between declared ports and the ports currently mapped on the host.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PortChange {
    /// Ports declared in the configuration but not mapped yet.
    pub ports_to_add: PortSet,
    /// Ports mapped on the host but no longer declared.
    pub ports_to_remove: PortSet,
}

impl PortChange {
    /// Create a change-set from explicit add/remove lists.
    pub fn new(ports_to_add: &[u16], ports_to_remove: &[u16]) -> Self {
        Self {
            ports_to_add: ports_to_add.iter().copied().collect(),
            ports_to_remove: ports_to_remove.iter().copied().collect(),
        }
    }

    /// True when there is nothing to add and nothing to remove.
    pub fn is_empty(&self) -> bool {
        self.ports_to_add.is_empty() && self.ports_to_remove.is_empty()
    }

    /// Total number of add and remove operations.
    pub fn len(&self) -> usize {
        self.ports_to_add.len() + self.ports_to_remove.len()
    }
}

impl std::fmt::Display for PortChange {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.is_empty() {
            return write!(f, "no port changes");
        }

        let join = |set: &PortSet| {
            set.iter()
                .map(|p| p.to_string())
                .collect::<Vec<_>>()
                .join(", ")
        };

        let mut parts = Vec::new();
        if !self.ports_to_add.is_empty() {
            parts.push(format!("add [{}]", join(&self.ports_to_add)));
        }
        if !self.ports_to_remove.is_empty() {
            parts.push(format!("remove [{}]", join(&self.ports_to_remove)));
        }
        write!(f, "{}", parts.join("; "))
    }
}

/// Compute the one-shot change-set between declared and current ports.
///
/// `ports_to_add = declared - current` and `ports_to_remove = current - declared`.
/// This is not a merge: applying the result is what brings the host in line.
pub fn diff(declared: &PortSet, current: &PortSet) -> PortChange {
    PortChange {
        ports_to_add: declared.difference(current).copied().collect(),
        ports_to_remove: current.difference(declared).copied().collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn set(ports: &[u16]) -> PortSet {
        ports.iter().copied().collect()
    }

    #[test]
    fn test_diff_add_and_remove() {
        let change = diff(&set(&[8089, 9000]), &set(&[8089, 8443]));
        assert_eq!(change.ports_to_add, set(&[9000]));
        assert_eq!(change.ports_to_remove, set(&[8443]));
    }

    #[test]
    fn test_diff_equal_sets_is_empty() {
        let ports = set(&[8000, 8089, 9997]);
        let change = diff(&ports, &ports);
        assert!(change.is_empty());
        assert_eq!(change, PortChange::default());

        assert!(diff(&PortSet::new(), &PortSet::new()).is_empty());
    }

    #[test]
    fn test_diff_disjoint_from_inputs() {
        let declared = set(&[80, 443, 8089, 9000]);
        let current = set(&[22, 443, 8443]);
        let change = diff(&declared, &current);

        assert!(change.ports_to_add.is_disjoint(&current));
        assert!(change.ports_to_remove.is_disjoint(&declared));
        assert_eq!(change.ports_to_add, set(&[80, 8089, 9000]));
        assert_eq!(change.ports_to_remove, set(&[22, 8443]));
    }

    #[test]
    fn test_diff_is_idempotent() {
        let declared = set(&[8089, 8443]);
        let current = set(&[8089, 9000]);
        assert_eq!(diff(&declared, &current), diff(&declared, &current));
    }

    #[test]
    fn test_serializes_camel_case() {
        let change = PortChange::new(&[8443], &[9000]);
        let json = serde_json::to_string(&change).unwrap();
        assert_eq!(json, r#"{"portsToAdd":[8443],"portsToRemove":[9000]}"#);
    }

    #[test]
    fn test_display() {
        assert_eq!(PortChange::default().to_string(), "no port changes");
        assert_eq!(
            PortChange::new(&[8443, 80], &[9000]).to_string(),
            "add [80, 8443]; remove [9000]"
        );
        assert_eq!(PortChange::new(&[], &[22]).to_string(), "remove [22]");
    }
}

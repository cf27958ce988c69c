//! Host/container port mapping entries reported by the port-manager API.

use std::str::FromStr;
use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// `"<hostPort>:<containerPort>"` with an optional `/tcp` or `/udp` suffix.
static MAPPING_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\s*(\d+):(\d+)(?:/(?:tcp|udp))?\s*$").unwrap());

/// A single host-to-container port mapping.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct PortMapping {
    /// Port exposed on the host.
    pub host_port: u16,
    /// Port inside the container.
    pub container_port: u16,
}

impl PortMapping {
    /// A mapping where the host and container port are the same.
    ///
    /// Reconciliation only ever creates symmetric mappings.
    pub fn symmetric(port: u16) -> Self {
        Self {
            host_port: port,
            container_port: port,
        }
    }
}

impl FromStr for PortMapping {
    type Err = Error;

    fn from_str(entry: &str) -> Result<Self> {
        let caps = MAPPING_RE
            .captures(entry)
            .ok_or_else(|| Error::InvalidMapping(entry.to_string()))?;

        let parse = |s: &str| {
            s.parse::<u16>()
                .ok()
                .filter(|p| *p != 0)
                .ok_or_else(|| Error::InvalidMapping(entry.to_string()))
        };

        Ok(Self {
            host_port: parse(&caps[1])?,
            container_port: parse(&caps[2])?,
        })
    }
}

impl std::fmt::Display for PortMapping {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", self.host_port, self.container_port)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_mapping() {
        let m: PortMapping = "8089:8089".parse().unwrap();
        assert_eq!(m, PortMapping::symmetric(8089));

        let m: PortMapping = "9000:8000".parse().unwrap();
        assert_eq!(m.host_port, 9000);
        assert_eq!(m.container_port, 8000);
    }

    #[test]
    fn test_parse_mapping_with_protocol() {
        let m: PortMapping = "514:514/udp".parse().unwrap();
        assert_eq!(m, PortMapping::symmetric(514));

        let m: PortMapping = " 8443:8443/tcp ".parse().unwrap();
        assert_eq!(m.host_port, 8443);
    }

    #[test]
    fn test_parse_invalid_mapping() {
        for entry in ["", "8089", "abc:8089", "8089:", "70000:80", "0:80", "80:80/sctp", "1:2:3"] {
            let result = entry.parse::<PortMapping>();
            assert!(
                matches!(result, Err(Error::InvalidMapping(_))),
                "expected {:?} to be rejected",
                entry
            );
        }
    }

    #[test]
    fn test_display() {
        assert_eq!(PortMapping::symmetric(8000).to_string(), "8000:8000");
    }
}

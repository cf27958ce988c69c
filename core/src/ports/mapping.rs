//! Port mapping port (interface).

use crate::domain::PortMapping;
use crate::error::Result;

/// Port for the host's live port-mapping state.
///
/// This trait defines the interface to the port-manager that owns the
/// Docker port mappings. Implementations handle transport details.
pub trait PortMappingPort: Send + Sync {
    /// List the mappings currently active on the host.
    fn list_mappings(&self) -> impl std::future::Future<Output = Result<Vec<PortMapping>>> + Send;

    /// Add a mapping to the live state.
    fn add_mapping(
        &self,
        mapping: PortMapping,
    ) -> impl std::future::Future<Output = Result<()>> + Send;

    /// Remove a mapping from the live state.
    fn remove_mapping(
        &self,
        mapping: PortMapping,
    ) -> impl std::future::Future<Output = Result<()>> + Send;
}

impl<T: PortMappingPort> PortMappingPort for std::sync::Arc<T> {
    async fn list_mappings(&self) -> Result<Vec<PortMapping>> {
        (**self).list_mappings().await
    }

    async fn add_mapping(&self, mapping: PortMapping) -> Result<()> {
        (**self).add_mapping(mapping).await
    }

    async fn remove_mapping(&self, mapping: PortMapping) -> Result<()> {
        (**self).remove_mapping(mapping).await
    }
}

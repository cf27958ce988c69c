//! In-memory port-manager used by the application layer tests.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use parking_lot::{Mutex, RwLock};
use tokio::sync::Notify;

use crate::application::{AppliedPort, PortOperation};
use crate::domain::PortMapping;
use crate::error::{Error, Result};
use crate::ports::PortMappingPort;

/// Mock port-manager that keeps mappings in memory and records every call.
pub(crate) struct MockPortManager {
    mappings: RwLock<Vec<PortMapping>>,
    list_calls: AtomicUsize,
    calls: Mutex<Vec<AppliedPort>>,
    list_failure: Mutex<Option<fn() -> Error>>,
    fail_on: Mutex<Option<AppliedPort>>,
    list_gate: Mutex<Option<Arc<Notify>>>,
}

impl MockPortManager {
    pub(crate) fn with_mappings(mappings: impl IntoIterator<Item = PortMapping>) -> Self {
        Self {
            mappings: RwLock::new(mappings.into_iter().collect()),
            list_calls: AtomicUsize::new(0),
            calls: Mutex::new(Vec::new()),
            list_failure: Mutex::new(None),
            fail_on: Mutex::new(None),
            list_gate: Mutex::new(None),
        }
    }

    pub(crate) fn with_ports(ports: &[u16]) -> Self {
        Self::with_mappings(ports.iter().copied().map(PortMapping::symmetric))
    }

    /// Make every `list_mappings` call fail with the produced error.
    pub(crate) fn fail_list(&self, failure: fn() -> Error) {
        *self.list_failure.lock() = Some(failure);
    }

    /// Make a single add/remove call fail.
    pub(crate) fn fail_on(&self, operation: PortOperation, port: u16) {
        *self.fail_on.lock() = Some(AppliedPort { operation, port });
    }

    /// Hold `list_mappings` responses until the returned gate is notified.
    ///
    /// The mappings are read when the call arrives, so a held response
    /// reflects the host as it was before anything applied meanwhile.
    pub(crate) fn gate_list(&self) -> Arc<Notify> {
        let gate = Arc::new(Notify::new());
        *self.list_gate.lock() = Some(Arc::clone(&gate));
        gate
    }

    pub(crate) fn clear_failures(&self) {
        *self.list_failure.lock() = None;
        *self.fail_on.lock() = None;
    }

    pub(crate) fn list_calls(&self) -> usize {
        self.list_calls.load(Ordering::SeqCst)
    }

    /// Every add/remove call that reached the mock, including failed ones.
    pub(crate) fn calls(&self) -> Vec<AppliedPort> {
        self.calls.lock().clone()
    }

    pub(crate) fn host_ports(&self) -> Vec<u16> {
        let mut ports: Vec<u16> = self.mappings.read().iter().map(|m| m.host_port).collect();
        ports.sort_unstable();
        ports
    }

    fn record(&self, operation: PortOperation, mapping: PortMapping) -> Result<()> {
        let call = AppliedPort {
            operation,
            port: mapping.host_port,
        };
        self.calls.lock().push(call);

        if *self.fail_on.lock() == Some(call) {
            return Err(Error::Request(format!(
                "{} returned 500 Internal Server Error",
                operation
            )));
        }
        Ok(())
    }
}

impl PortMappingPort for MockPortManager {
    async fn list_mappings(&self) -> Result<Vec<PortMapping>> {
        self.list_calls.fetch_add(1, Ordering::SeqCst);
        if let Some(failure) = *self.list_failure.lock() {
            return Err(failure());
        }
        let mappings = self.mappings.read().clone();
        let gate = self.list_gate.lock().clone();
        if let Some(gate) = gate {
            gate.notified().await;
        }
        Ok(mappings)
    }

    async fn add_mapping(&self, mapping: PortMapping) -> Result<()> {
        self.record(PortOperation::Add, mapping)?;
        self.mappings.write().push(mapping);
        Ok(())
    }

    async fn remove_mapping(&self, mapping: PortMapping) -> Result<()> {
        self.record(PortOperation::Remove, mapping)?;
        self.mappings.write().retain(|m| *m != mapping);
        Ok(())
    }
}

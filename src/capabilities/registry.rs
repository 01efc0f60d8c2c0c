//! Capability Registry: process-wide store of registered capabilities.
//!
//! The registry is read far more often than written. Selection never runs
//! against the live collection: every selection takes an insertion-ordered
//! [`CapabilityRegistry::snapshot`] and works from that, so registration and
//! deregistration proceed under the write lock without ever invalidating an
//! in-flight selection.

use std::fmt;
use std::sync::Arc;

use parking_lot::RwLock;

use super::capability::Capability;
use crate::error::RegistryError;

/// Registration record: identifier, arbiter-facing description, and a shared
/// handle to the capability instance.
#[derive(Clone)]
pub struct CapabilityRecord {
    pub id: String,
    pub description: String,
    pub capability: Arc<dyn Capability>,
}

impl CapabilityRecord {
    fn for_capability(capability: Arc<dyn Capability>) -> Self {
        Self {
            id: capability.id().to_string(),
            description: capability.description().to_string(),
            capability,
        }
    }
}

impl fmt::Debug for CapabilityRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CapabilityRecord")
            .field("id", &self.id)
            .field("description", &self.description)
            .finish_non_exhaustive()
    }
}

/// Process-wide capability store.
///
/// Holds records in registration order; identifiers are unique at all times.
/// Registration order is load-bearing: the selector breaks score ties in
/// favor of the first-registered capability.
#[derive(Default)]
pub struct CapabilityRegistry {
    records: RwLock<Vec<CapabilityRecord>>,
}

impl CapabilityRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a capability, deriving the record from its accessors.
    ///
    /// Fails with [`RegistryError::DuplicateIdentifier`] if the identifier is
    /// already present; the registry is left unchanged in that case.
    pub fn register(&self, capability: Arc<dyn Capability>) -> Result<(), RegistryError> {
        let record = CapabilityRecord::for_capability(capability);
        let mut records = self.records.write();
        if records.iter().any(|existing| existing.id == record.id) {
            return Err(RegistryError::DuplicateIdentifier { id: record.id });
        }
        log::debug!("registered capability '{}'", record.id);
        records.push(record);
        Ok(())
    }

    /// Remove a capability by identifier.
    ///
    /// Returns whether anything was removed; absent identifiers are a no-op.
    pub fn unregister(&self, id: &str) -> bool {
        let mut records = self.records.write();
        let before = records.len();
        records.retain(|record| record.id != id);
        let removed = records.len() < before;
        if removed {
            log::debug!("unregistered capability '{id}'");
        }
        removed
    }

    /// Look up a single record by identifier.
    pub fn get(&self, id: &str) -> Option<CapabilityRecord> {
        self.records.read().iter().find(|r| r.id == id).cloned()
    }

    /// A point-in-time, insertion-ordered snapshot of all records.
    ///
    /// The snapshot is what the selector iterates; later mutations of the
    /// registry do not affect it.
    pub fn snapshot(&self) -> Vec<CapabilityRecord> {
        self.records.read().clone()
    }

    /// Number of registered capabilities.
    pub fn len(&self) -> usize {
        self.records.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.read().is_empty()
    }
}

impl fmt::Debug for CapabilityRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let ids: Vec<String> = self.records.read().iter().map(|r| r.id.clone()).collect();
        f.debug_struct("CapabilityRegistry").field("ids", &ids).finish()
    }
}

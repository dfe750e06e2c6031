//! Field registry: stable one-byte identifiers for field names.
//!
//! Every attribute a source can attach to a lookup key ("tags", "asn", …) is
//! a field. The first registration of a name assigns the next sequential id;
//! later registrations of the same name return the same id for the life of
//! the process. Ids are written into encoded payloads, so the space is capped
//! at 256.
//!
//! The registry is shared by every source in the process and is passed
//! explicitly (usually as `Arc<FieldRegistry>`) rather than living in module
//! globals. Registration takes the write lock; lookups share the read lock.

use std::collections::HashMap;
use std::sync::RwLock;

use crate::error::{CoreError, Result};

/// Maximum number of distinct fields a process may register.
pub const MAX_FIELDS: usize = 256;

#[derive(Debug, Default)]
struct Inner {
    by_name: HashMap<String, u8>,
    names: Vec<String>,
}

/// Shared name <-> id mapping for all sources in the process.
#[derive(Debug, Default)]
pub struct FieldRegistry {
    inner: RwLock<Inner>,
}

impl FieldRegistry {
    /// Create an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Return the id for `name`, assigning the next free id on first use.
    ///
    /// Fails with [`CoreError::FieldCapacity`] once 256 distinct names have
    /// been registered; callers should treat that as a fatal configuration
    /// error at startup.
    pub fn register(&self, name: &str) -> Result<u8> {
        let mut inner = self.inner.write().unwrap_or_else(std::sync::PoisonError::into_inner);

        if let Some(&id) = inner.by_name.get(name) {
            return Ok(id);
        }

        if inner.names.len() >= MAX_FIELDS {
            return Err(CoreError::FieldCapacity);
        }

        // names.len() < 256, so the cast cannot lose information.
        #[allow(clippy::cast_possible_truncation)]
        let id = inner.names.len() as u8;
        inner.by_name.insert(name.to_string(), id);
        inner.names.push(name.to_string());
        tracing::debug!(field = name, id, "registered field");
        Ok(id)
    }

    /// Look up an already-registered name without registering it.
    #[must_use]
    pub fn lookup(&self, name: &str) -> Option<u8> {
        let inner = self.inner.read().unwrap_or_else(std::sync::PoisonError::into_inner);
        inner.by_name.get(name).copied()
    }

    /// Reverse lookup for diagnostics.
    ///
    /// Correctly encoded payloads only carry registered ids, so an
    /// [`CoreError::UnknownField`] here indicates corrupt data.
    pub fn name_of(&self, id: u8) -> Result<String> {
        let inner = self.inner.read().unwrap_or_else(std::sync::PoisonError::into_inner);
        inner
            .names
            .get(id as usize)
            .cloned()
            .ok_or(CoreError::UnknownField(id))
    }

    /// Number of registered fields.
    #[must_use]
    pub fn len(&self) -> usize {
        let inner = self.inner.read().unwrap_or_else(std::sync::PoisonError::into_inner);
        inner.names.len()
    }

    /// True if no field has been registered yet.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_register_assigns_sequential_ids() {
        let registry = FieldRegistry::new();
        assert_eq!(registry.register("tags").unwrap(), 0);
        assert_eq!(registry.register("asn").unwrap(), 1);
        assert_eq!(registry.register("country").unwrap(), 2);
    }

    #[test]
    fn test_register_same_name_twice_returns_same_id() {
        let registry = FieldRegistry::new();
        let first = registry.register("tags").unwrap();
        let second = registry.register("tags").unwrap();
        assert_eq!(first, second);
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_capacity_exhaustion_on_257th_field() {
        let registry = FieldRegistry::new();
        for i in 0..256 {
            registry.register(&format!("field{i}")).unwrap();
        }
        assert_eq!(registry.len(), 256);
        assert!(matches!(
            registry.register("one-too-many"),
            Err(CoreError::FieldCapacity)
        ));
        // Existing names still resolve after the capacity error.
        assert_eq!(registry.register("field0").unwrap(), 0);
    }

    #[test]
    fn test_name_of_roundtrip() {
        let registry = FieldRegistry::new();
        let id = registry.register("severity").unwrap();
        assert_eq!(registry.name_of(id).unwrap(), "severity");
    }

    #[test]
    fn test_name_of_unknown_id() {
        let registry = FieldRegistry::new();
        assert!(matches!(registry.name_of(7), Err(CoreError::UnknownField(7))));
    }

    #[test]
    fn test_lookup_does_not_register() {
        let registry = FieldRegistry::new();
        assert_eq!(registry.lookup("tags"), None);
        assert!(registry.is_empty());
        registry.register("tags").unwrap();
        assert_eq!(registry.lookup("tags"), Some(0));
    }
}

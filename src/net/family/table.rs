/*!
 * Family Table
 * Maps (family, type) pairs to their protocol implementation
 */

use super::traits::ProtoFamily;
use crate::net::types::{AddressFamily, SockType};
use ahash::RandomState;
use dashmap::DashMap;
use std::sync::Arc;

/// Registered protocol families, keyed by family and socket type.
///
/// Registration happens at system bring-up; lookups happen on every
/// socket creation.
pub struct FamilyTable {
    families: DashMap<(AddressFamily, SockType), Arc<dyn ProtoFamily>, RandomState>,
}

impl FamilyTable {
    pub fn new() -> Self {
        Self {
            families: DashMap::with_hasher(RandomState::new()),
        }
    }

    /// Register a family implementation for a socket type; replaces any
    /// previous registration for the pair
    pub fn register(&self, ty: SockType, family: Arc<dyn ProtoFamily>) {
        self.families.insert((family.family(), ty), family);
    }

    /// Look up the implementation serving (family, type)
    pub fn lookup(&self, family: AddressFamily, ty: SockType) -> Option<Arc<dyn ProtoFamily>> {
        self.families
            .get(&(family, ty))
            .map(|entry| Arc::clone(entry.value()))
    }
}

impl Default for FamilyTable {
    fn default() -> Self {
        Self::new()
    }
}

use std::collections::{BTreeMap, BTreeSet, HashMap};

use log::{debug, warn};

use super::body::{BodyHandle, PhysicalBody};
use super::PhysicsError;

/// Owns every simulated body and the mapping from game entity IDs to bodies
///
/// Iteration is in handle (registration) order so that every pass over the
/// bodies is deterministic.
#[derive(Debug, Default)]
pub struct BodyRegistry {
    /// Live bodies keyed by handle
    bodies: BTreeMap<BodyHandle, PhysicalBody>,

    /// Reverse mapping for `body_of`
    entity_to_body: HashMap<u64, BodyHandle>,

    /// Owning entity per body
    body_to_entity: HashMap<BodyHandle, u64>,

    /// Removals requested during a collision pass
    pending_removal: BTreeSet<BodyHandle>,

    next_handle: u32,
}

impl BodyRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a body for an entity
    ///
    /// Registering an entity twice keeps the first body and returns its handle.
    pub fn register(&mut self, entity: u64, body: PhysicalBody) -> Result<BodyHandle, PhysicsError> {
        if let Some(&existing) = self.entity_to_body.get(&entity) {
            warn!(
                "Entity {} already has {}, ignoring second registration",
                entity, existing
            );
            return Ok(existing);
        }

        body.validate(entity)?;

        let handle = BodyHandle::from_raw(self.next_handle);
        self.next_handle += 1;

        self.bodies.insert(handle, body);
        self.entity_to_body.insert(entity, handle);
        self.body_to_entity.insert(handle, entity);
        debug!("Registered {} for entity {}", handle, entity);

        Ok(handle)
    }

    /// Remove a body immediately. Unknown or already removed handles are a no-op.
    pub fn unregister(&mut self, handle: BodyHandle) -> Option<PhysicalBody> {
        let body = self.bodies.remove(&handle)?;
        self.pending_removal.remove(&handle);
        if let Some(entity) = self.body_to_entity.remove(&handle) {
            self.entity_to_body.remove(&entity);
        }
        Some(body)
    }

    /// Queue a body for removal at the next `flush_removals`
    ///
    /// Returns false if the handle is unknown or already queued.
    pub fn schedule_removal(&mut self, handle: BodyHandle) -> bool {
        self.bodies.contains_key(&handle) && self.pending_removal.insert(handle)
    }

    /// Check whether a body is queued for removal
    pub fn is_pending_removal(&self, handle: BodyHandle) -> bool {
        self.pending_removal.contains(&handle)
    }

    /// Apply all queued removals, returning the removed handles and their entities
    pub fn flush_removals(&mut self) -> Vec<(BodyHandle, u64)> {
        let pending = std::mem::take(&mut self.pending_removal);
        let mut removed = Vec::with_capacity(pending.len());

        for handle in pending {
            let entity = self.body_to_entity.get(&handle).copied();
            if self.unregister(handle).is_some() {
                if let Some(entity) = entity {
                    removed.push((handle, entity));
                }
            }
        }

        removed
    }

    /// Body handle of an entity, if it has one
    pub fn body_of(&self, entity: u64) -> Option<BodyHandle> {
        self.entity_to_body.get(&entity).copied()
    }

    /// Entity owning a body
    pub fn entity_of(&self, handle: BodyHandle) -> Option<u64> {
        self.body_to_entity.get(&handle).copied()
    }

    pub fn get(&self, handle: BodyHandle) -> Option<&PhysicalBody> {
        self.bodies.get(&handle)
    }

    pub fn get_mut(&mut self, handle: BodyHandle) -> Option<&mut PhysicalBody> {
        self.bodies.get_mut(&handle)
    }

    pub fn contains(&self, handle: BodyHandle) -> bool {
        self.bodies.contains_key(&handle)
    }

    /// All live bodies in registration order
    pub fn iter(&self) -> impl Iterator<Item = (BodyHandle, &PhysicalBody)> {
        self.bodies.iter().map(|(handle, body)| (*handle, body))
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = (BodyHandle, &mut PhysicalBody)> {
        self.bodies.iter_mut().map(|(handle, body)| (*handle, body))
    }

    /// Snapshot of all live handles
    pub fn handles(&self) -> Vec<BodyHandle> {
        self.bodies.keys().copied().collect()
    }

    pub fn len(&self) -> usize {
        self.bodies.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bodies.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::physics::BodyBuilder;
    use glam::Vec2;

    fn crate_body() -> PhysicalBody {
        BodyBuilder::new_dynamic(1.0).position(Vec2::new(0.0, 10.0)).build()
    }

    #[test]
    fn test_register_and_lookup() {
        let mut registry = BodyRegistry::new();
        let handle = registry.register(42, crate_body()).unwrap();

        assert_eq!(registry.body_of(42), Some(handle));
        assert_eq!(registry.entity_of(handle), Some(42));
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_double_registration_returns_existing() {
        let mut registry = BodyRegistry::new();
        let first = registry.register(1, crate_body()).unwrap();
        let second = registry.register(1, crate_body()).unwrap();

        assert_eq!(first, second);
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_invalid_body_rejected() {
        let mut registry = BodyRegistry::new();
        let result = registry.register(9, BodyBuilder::new_dynamic(-1.0).build());

        assert!(matches!(result, Err(PhysicsError::InvalidBody { entity: 9, .. })));
        assert!(registry.is_empty());
        assert_eq!(registry.body_of(9), None);
    }

    #[test]
    fn test_unregister_twice_is_noop() {
        let mut registry = BodyRegistry::new();
        let a = registry.register(1, crate_body()).unwrap();
        let b = registry.register(2, crate_body()).unwrap();

        assert!(registry.unregister(a).is_some());
        assert!(registry.unregister(a).is_none());
        assert_eq!(registry.len(), 1);
        assert!(registry.contains(b));
        assert_eq!(registry.body_of(1), None);
    }

    #[test]
    fn test_handles_not_reused() {
        let mut registry = BodyRegistry::new();
        let a = registry.register(1, crate_body()).unwrap();
        registry.unregister(a);
        let b = registry.register(2, crate_body()).unwrap();

        assert_ne!(a, b);
        assert!(b > a);
    }

    #[test]
    fn test_deferred_removal() {
        let mut registry = BodyRegistry::new();
        let a = registry.register(1, crate_body()).unwrap();
        let b = registry.register(2, crate_body()).unwrap();

        assert!(registry.schedule_removal(a));
        assert!(!registry.schedule_removal(a), "second schedule is ignored");

        // Still visible until flushed
        assert!(registry.contains(a));
        assert!(registry.is_pending_removal(a));

        let removed = registry.flush_removals();
        assert_eq!(removed, vec![(a, 1)]);
        assert!(!registry.contains(a));
        assert!(registry.contains(b));
        assert!(registry.flush_removals().is_empty());
    }

    #[test]
    fn test_schedule_unknown_handle() {
        let mut registry = BodyRegistry::new();
        assert!(!registry.schedule_removal(BodyHandle::from_raw(99)));
        assert!(registry.flush_removals().is_empty());
    }

    #[test]
    fn test_iteration_in_registration_order() {
        let mut registry = BodyRegistry::new();
        let handles: Vec<_> = (10..15)
            .map(|entity| registry.register(entity, crate_body()).unwrap())
            .collect();

        assert_eq!(registry.handles(), handles);
        let entities: Vec<_> = registry
            .iter()
            .filter_map(|(handle, _)| registry.entity_of(handle))
            .collect();
        assert_eq!(entities, vec![10, 11, 12, 13, 14]);
    }
}

//! Identity cache: one wrapper per (direction, original).
//!
//! Lookups are by object handle, never by structure. Entries are dropped by
//! the collector once their original is unreachable.

use super::Direction;
use crate::realm::ObjectId;
use rustc_hash::FxHashMap;

#[derive(Debug, Default)]
struct DirectionMaps {
    /// original -> wrapper
    forward: FxHashMap<ObjectId, ObjectId>,
    /// wrapper -> original
    reverse: FxHashMap<ObjectId, ObjectId>,
}

#[derive(Debug, Default)]
pub struct IdentityCache {
    host_to_guest: DirectionMaps,
    guest_to_host: DirectionMaps,
}

impl IdentityCache {
    pub fn new() -> Self {
        Self::default()
    }

    fn maps(&self, direction: Direction) -> &DirectionMaps {
        match direction {
            Direction::HostToGuest => &self.host_to_guest,
            Direction::GuestToHost => &self.guest_to_host,
        }
    }

    fn maps_mut(&mut self, direction: Direction) -> &mut DirectionMaps {
        match direction {
            Direction::HostToGuest => &mut self.host_to_guest,
            Direction::GuestToHost => &mut self.guest_to_host,
        }
    }

    pub fn wrapper_for(&self, direction: Direction, original: ObjectId) -> Option<ObjectId> {
        self.maps(direction).forward.get(&original).copied()
    }

    pub fn original_for(&self, direction: Direction, wrapper: ObjectId) -> Option<ObjectId> {
        self.maps(direction).reverse.get(&wrapper).copied()
    }

    /// Callers never remember two wrappers for one (direction, original).
    pub fn remember(&mut self, direction: Direction, original: ObjectId, wrapper: ObjectId) {
        let maps = self.maps_mut(direction);
        debug_assert!(
            !maps.forward.contains_key(&original),
            "second wrapper for {original} ({direction})"
        );
        maps.forward.insert(original, wrapper);
        maps.reverse.insert(wrapper, original);
    }

    pub fn len(&self) -> usize {
        self.host_to_guest.forward.len() + self.guest_to_host.forward.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// `(original, wrapper)` pairs of both directions.
    pub(crate) fn entries(&self) -> impl Iterator<Item = (ObjectId, ObjectId)> + '_ {
        self.host_to_guest
            .forward
            .iter()
            .chain(self.guest_to_host.forward.iter())
            .map(|(&original, &wrapper)| (original, wrapper))
    }

    /// Keep the entries `keep(original, wrapper)` accepts. Returns how many
    /// were dropped.
    pub(crate) fn retain(&mut self, mut keep: impl FnMut(ObjectId, ObjectId) -> bool) -> usize {
        let mut dropped = 0;
        for maps in [&mut self.host_to_guest, &mut self.guest_to_host] {
            let before = maps.forward.len();
            maps.forward.retain(|&original, &mut wrapper| keep(original, wrapper));
            dropped += before - maps.forward.len();
            let forward = &maps.forward;
            maps.reverse
                .retain(|wrapper, original| forward.get(&*original) == Some(wrapper));
        }
        dropped
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::realm::{Context, RealmId};

    #[test]
    fn test_directions_are_independent() {
        let mut ctx = Context::new();
        let a = ctx.create_object(RealmId::Host);
        let w = ctx.create_object(RealmId::Guest);
        let mut cache = IdentityCache::new();
        cache.remember(Direction::HostToGuest, a, w);

        assert_eq!(cache.wrapper_for(Direction::HostToGuest, a), Some(w));
        assert_eq!(cache.original_for(Direction::HostToGuest, w), Some(a));
        assert_eq!(cache.wrapper_for(Direction::GuestToHost, a), None);
        assert_eq!(cache.original_for(Direction::GuestToHost, w), None);
    }

    #[test]
    fn test_retain_drops_both_maps() {
        let mut ctx = Context::new();
        let a = ctx.create_object(RealmId::Host);
        let b = ctx.create_object(RealmId::Host);
        let wa = ctx.create_object(RealmId::Guest);
        let wb = ctx.create_object(RealmId::Guest);
        let mut cache = IdentityCache::new();
        cache.remember(Direction::HostToGuest, a, wa);
        cache.remember(Direction::HostToGuest, b, wb);

        assert_eq!(cache.retain(|original, _| original == a), 1);
        assert_eq!(cache.len(), 1);
        assert_eq!(cache.original_for(Direction::HostToGuest, wb), None);
        assert_eq!(cache.original_for(Direction::HostToGuest, wa), Some(a));
    }
}

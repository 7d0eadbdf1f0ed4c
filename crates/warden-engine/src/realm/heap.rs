//! Object arena shared by both realms of a context.
//!
//! Slots are reused after collection; every reuse bumps the slot generation
//! so a handle taken before the collection no longer resolves.

use super::object::{JsObject, ObjectKind};
use super::value::{ObjectId, SymbolId};
use super::{FatalError, JsResult};
use std::sync::Arc;

#[derive(Debug)]
struct Slot {
    generation: u32,
    object: Option<JsObject>,
    marked: bool,
}

/// Storage of collected buffers, handed out again without clearing.
#[derive(Debug, Default)]
pub struct BufferPool {
    free: Vec<Vec<u8>>,
}

impl BufferPool {
    pub fn recycle(&mut self, storage: Vec<u8>) {
        if !storage.is_empty() {
            self.free.push(storage);
        }
    }

    /// Storage of `len` bytes that may still hold a previous buffer's contents.
    pub fn take_unzeroed(&mut self, len: usize) -> Vec<u8> {
        match self.free.pop() {
            Some(mut storage) => {
                storage.resize(len, 0);
                storage
            }
            None => vec![0; len],
        }
    }

    pub fn len(&self) -> usize {
        self.free.len()
    }

    pub fn is_empty(&self) -> bool {
        self.free.is_empty()
    }
}

/// Collector statistics
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct GcStats {
    /// Total number of collections
    pub collections: usize,
    /// Objects marked in last collection
    pub last_marked: usize,
    /// Objects freed in last collection
    pub last_freed: usize,
    /// Identity-cache entries dropped in last collection
    pub last_pruned: usize,
    /// Live objects after last collection
    pub live_objects: usize,
}

#[derive(Debug, Default)]
pub struct Heap {
    slots: Vec<Slot>,
    free: Vec<u32>,
    symbols: Vec<Option<Arc<str>>>,
    pub(crate) buffers: BufferPool,
    pub(crate) stats: GcStats,
}

impl Heap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn allocate(&mut self, object: JsObject) -> ObjectId {
        if let Some(index) = self.free.pop() {
            let slot = &mut self.slots[index as usize];
            slot.object = Some(object);
            slot.marked = false;
            return ObjectId {
                index,
                generation: slot.generation,
            };
        }
        let index = self.slots.len() as u32;
        self.slots.push(Slot {
            generation: 0,
            object: Some(object),
            marked: false,
        });
        ObjectId { index, generation: 0 }
    }

    pub fn get(&self, id: ObjectId) -> JsResult<&JsObject> {
        self.slots
            .get(id.index as usize)
            .filter(|slot| slot.generation == id.generation)
            .and_then(|slot| slot.object.as_ref())
            .ok_or_else(|| FatalError::StaleHandle(id).into())
    }

    pub fn get_mut(&mut self, id: ObjectId) -> JsResult<&mut JsObject> {
        self.slots
            .get_mut(id.index as usize)
            .filter(|slot| slot.generation == id.generation)
            .and_then(|slot| slot.object.as_mut())
            .ok_or_else(|| FatalError::StaleHandle(id).into())
    }

    pub fn contains(&self, id: ObjectId) -> bool {
        self.get(id).is_ok()
    }

    pub fn live_count(&self) -> usize {
        self.slots.iter().filter(|s| s.object.is_some()).count()
    }

    pub fn new_symbol(&mut self, description: Option<&str>) -> SymbolId {
        self.symbols.push(description.map(Arc::from));
        SymbolId(self.symbols.len() as u32 - 1)
    }

    pub fn symbol_description(&self, symbol: SymbolId) -> Option<&str> {
        self.symbols.get(symbol.0 as usize).and_then(|d| d.as_deref())
    }

    pub fn stats(&self) -> GcStats {
        self.stats
    }

    /// Collected buffer storage waiting for reuse.
    pub fn buffer_pool(&self) -> &BufferPool {
        &self.buffers
    }

    // Collector support

    pub(crate) fn clear_marks(&mut self) {
        for slot in &mut self.slots {
            slot.marked = false;
        }
    }

    pub(crate) fn is_marked(&self, id: ObjectId) -> bool {
        self.slots
            .get(id.index as usize)
            .is_some_and(|slot| slot.generation == id.generation && slot.marked)
    }

    /// Mark `roots` and everything reachable from them. Returns the number
    /// of newly marked objects.
    pub(crate) fn mark_from(&mut self, roots: impl IntoIterator<Item = ObjectId>) -> usize {
        let mut worklist: Vec<ObjectId> = roots.into_iter().collect();
        let mut marked = 0;
        let mut children = Vec::new();

        while let Some(id) = worklist.pop() {
            let Some(slot) = self.slots.get_mut(id.index as usize) else {
                continue;
            };
            if slot.generation != id.generation || slot.marked {
                continue;
            }
            let Some(object) = slot.object.as_ref() else {
                continue;
            };
            slot.marked = true;
            marked += 1;
            object.trace(&mut children);
            worklist.append(&mut children);
        }
        marked
    }

    /// Free every unmarked object. Returns the number freed.
    pub(crate) fn sweep(&mut self) -> usize {
        let mut freed = 0;
        for (index, slot) in self.slots.iter_mut().enumerate() {
            if slot.marked || slot.object.is_none() {
                continue;
            }
            if let Some(object) = slot.object.take() {
                if let ObjectKind::Buffer(storage) = object.kind {
                    self.buffers.recycle(storage);
                }
            }
            slot.generation = slot.generation.wrapping_add(1);
            self.free.push(index as u32);
            freed += 1;
        }
        freed
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::realm::RealmId;

    fn ordinary() -> JsObject {
        JsObject::new(RealmId::Host, None, ObjectKind::Ordinary)
    }

    #[test]
    fn test_stale_handle_after_sweep() {
        let mut heap = Heap::new();
        let dead = heap.allocate(ordinary());
        let live = heap.allocate(ordinary());

        heap.clear_marks();
        heap.mark_from([live]);
        assert_eq!(heap.sweep(), 1);

        assert!(heap.contains(live));
        assert!(matches!(
            heap.get(dead),
            Err(crate::realm::Abrupt::Fatal(FatalError::StaleHandle(id))) if id == dead
        ));

        let reused = heap.allocate(ordinary());
        assert_eq!(reused.index(), dead.index());
        assert_ne!(reused.generation(), dead.generation());
        assert!(heap.get(dead).is_err());
    }

    #[test]
    fn test_swept_buffer_storage_is_recycled_unzeroed() {
        let mut heap = Heap::new();
        heap.allocate(JsObject::new(
            RealmId::Host,
            None,
            ObjectKind::Buffer(vec![7, 7, 7, 7]),
        ));
        heap.clear_marks();
        heap.sweep();

        assert_eq!(heap.buffers.len(), 1);
        assert_eq!(heap.buffers.take_unzeroed(3), vec![7, 7, 7]);
        assert_eq!(heap.buffers.take_unzeroed(2), vec![0, 0]);
    }

    #[test]
    fn test_mark_follows_prototype() {
        let mut heap = Heap::new();
        let proto = heap.allocate(ordinary());
        let child = heap.allocate(JsObject::new(RealmId::Host, Some(proto), ObjectKind::Ordinary));
        heap.clear_marks();
        assert_eq!(heap.mark_from([child]), 2);
        assert!(heap.is_marked(proto));
    }
}

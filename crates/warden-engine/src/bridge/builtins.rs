//! Built-in correspondence table.
//!
//! Maps each realm's built-in constructors and prototypes to the matching
//! object of the other realm, so nominal type survives the crossing.

use crate::realm::{Builtin, Intrinsics, ObjectId, RealmId};
use rustc_hash::FxHashMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Role {
    Constructor,
    Prototype,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Entry {
    pub realm: RealmId,
    pub builtin: Builtin,
    pub role: Role,
}

#[derive(Debug, Clone)]
pub struct BuiltinTable {
    host: Intrinsics,
    guest: Intrinsics,
    entries: FxHashMap<ObjectId, Entry>,
}

impl BuiltinTable {
    pub fn new(host: &Intrinsics, guest: &Intrinsics) -> Self {
        let mut entries = FxHashMap::default();
        for intrinsics in [host, guest] {
            for (builtin, ctor, proto) in intrinsics.iter() {
                let realm = intrinsics.realm;
                entries.insert(ctor, Entry { realm, builtin, role: Role::Constructor });
                entries.insert(proto, Entry { realm, builtin, role: Role::Prototype });
            }
        }
        Self {
            host: host.clone(),
            guest: guest.clone(),
            entries,
        }
    }

    fn intrinsics(&self, realm: RealmId) -> &Intrinsics {
        match realm {
            RealmId::Host => &self.host,
            RealmId::Guest => &self.guest,
        }
    }

    pub fn lookup(&self, id: ObjectId) -> Option<Entry> {
        self.entries.get(&id).copied()
    }

    pub fn constructor(&self, realm: RealmId, builtin: Builtin) -> ObjectId {
        self.intrinsics(realm).constructor(builtin)
    }

    pub fn prototype(&self, realm: RealmId, builtin: Builtin) -> ObjectId {
        self.intrinsics(realm).prototype(builtin)
    }

    /// Whether crossing the object replaces it with its counterpart.
    ///
    /// The buffer constructor is exempt: it crosses as a wrapper so its
    /// allocation path can be intercepted.
    pub fn maps_identity(entry: Entry) -> bool {
        !(entry.builtin == Builtin::Buffer && entry.role == Role::Constructor)
    }

    /// The object in `destination` matching built-in `id` of the other realm.
    pub fn counterpart(&self, id: ObjectId, destination: RealmId) -> Option<ObjectId> {
        let entry = self.lookup(id)?;
        if entry.realm == destination || !Self::maps_identity(entry) {
            return None;
        }
        Some(match entry.role {
            Role::Constructor => self.constructor(destination, entry.builtin),
            Role::Prototype => self.prototype(destination, entry.builtin),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::realm::Context;

    #[test]
    fn test_counterparts() {
        let ctx = Context::new();
        let table = ctx.builtins();
        let host_array = table.constructor(RealmId::Host, Builtin::Array);
        let guest_array = table.constructor(RealmId::Guest, Builtin::Array);
        let host_error_proto = table.prototype(RealmId::Host, Builtin::Error);

        assert_eq!(table.counterpart(host_array, RealmId::Guest), Some(guest_array));
        assert_eq!(table.counterpart(guest_array, RealmId::Host), Some(host_array));
        assert_eq!(
            table.counterpart(host_error_proto, RealmId::Guest),
            Some(table.prototype(RealmId::Guest, Builtin::Error))
        );
        assert_eq!(table.counterpart(host_array, RealmId::Host), None);
    }

    #[test]
    fn test_buffer_constructor_is_not_mapped() {
        let ctx = Context::new();
        let table = ctx.builtins();
        let host_buffer = table.constructor(RealmId::Host, Builtin::Buffer);
        assert_eq!(table.counterpart(host_buffer, RealmId::Guest), None);
        let host_buffer_proto = table.prototype(RealmId::Host, Builtin::Buffer);
        assert!(table.counterpart(host_buffer_proto, RealmId::Guest).is_some());
    }
}

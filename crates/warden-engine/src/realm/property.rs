//! Own-property storage.

use super::value::{ObjectId, PropertyKey, Value};
use rustc_hash::FxHashMap;

#[derive(Debug, Clone, PartialEq)]
pub enum PropertySlot {
    Data { value: Value, writable: bool },
    Accessor { get: Option<ObjectId>, set: Option<ObjectId> },
}

/// A stored own property. All attributes are always present.
#[derive(Debug, Clone, PartialEq)]
pub struct Property {
    pub slot: PropertySlot,
    pub enumerable: bool,
    pub configurable: bool,
}

impl Property {
    pub fn data(value: Value) -> Self {
        Self {
            slot: PropertySlot::Data { value, writable: true },
            enumerable: true,
            configurable: true,
        }
    }

    /// Writable, configurable, not enumerable: how built-in methods are stored.
    pub fn hidden(value: Value) -> Self {
        Self {
            slot: PropertySlot::Data { value, writable: true },
            enumerable: false,
            configurable: true,
        }
    }

    pub fn frozen(value: Value) -> Self {
        Self {
            slot: PropertySlot::Data { value, writable: false },
            enumerable: false,
            configurable: false,
        }
    }

    pub fn to_descriptor(&self) -> PropertyDescriptor {
        let mut desc = PropertyDescriptor {
            enumerable: Some(self.enumerable),
            configurable: Some(self.configurable),
            ..PropertyDescriptor::default()
        };
        match &self.slot {
            PropertySlot::Data { value, writable } => {
                desc.value = Some(value.clone());
                desc.writable = Some(*writable);
            }
            PropertySlot::Accessor { get, set } => {
                desc.get = Some(get.map(Value::Object).unwrap_or(Value::Undefined));
                desc.set = Some(set.map(Value::Object).unwrap_or(Value::Undefined));
            }
        }
        desc
    }
}

/// A (possibly partial) property descriptor as passed to `defineProperty`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PropertyDescriptor {
    pub value: Option<Value>,
    pub writable: Option<bool>,
    pub get: Option<Value>,
    pub set: Option<Value>,
    pub enumerable: Option<bool>,
    pub configurable: Option<bool>,
}

impl PropertyDescriptor {
    /// `{ value, writable: true, enumerable: true, configurable: true }`
    pub fn data(value: Value) -> Self {
        Self {
            value: Some(value),
            writable: Some(true),
            enumerable: Some(true),
            configurable: Some(true),
            ..Self::default()
        }
    }

    pub fn accessor(get: Option<Value>, set: Option<Value>) -> Self {
        Self {
            get,
            set,
            enumerable: Some(true),
            configurable: Some(true),
            ..Self::default()
        }
    }

    pub fn is_accessor(&self) -> bool {
        self.get.is_some() || self.set.is_some()
    }
}

/// Insertion-ordered property table.
#[derive(Debug, Clone, Default)]
pub struct PropertyMap {
    entries: Vec<(PropertyKey, Property)>,
    index: FxHashMap<PropertyKey, usize>,
}

impl PropertyMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: &PropertyKey) -> Option<&Property> {
        self.index.get(key).map(|&i| &self.entries[i].1)
    }

    pub fn get_mut(&mut self, key: &PropertyKey) -> Option<&mut Property> {
        match self.index.get(key) {
            Some(&i) => Some(&mut self.entries[i].1),
            None => None,
        }
    }

    pub fn contains(&self, key: &PropertyKey) -> bool {
        self.index.contains_key(key)
    }

    pub fn insert(&mut self, key: PropertyKey, property: Property) {
        if let Some(&i) = self.index.get(&key) {
            self.entries[i].1 = property;
        } else {
            self.index.insert(key.clone(), self.entries.len());
            self.entries.push((key, property));
        }
    }

    pub fn remove(&mut self, key: &PropertyKey) -> Option<Property> {
        let i = self.index.remove(key)?;
        let (_, property) = self.entries.remove(i);
        for slot in self.index.values_mut() {
            if *slot > i {
                *slot -= 1;
            }
        }
        Some(property)
    }

    pub fn keys(&self) -> impl Iterator<Item = &PropertyKey> {
        self.entries.iter().map(|(k, _)| k)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&PropertyKey, &Property)> {
        self.entries.iter().map(|(k, p)| (k, p))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

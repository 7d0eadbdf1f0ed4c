//! Per-realm built-in constructors, prototypes and the global object.

use super::heap::Heap;
use super::natives;
use super::object::{JsObject, NativeFunction, ObjectKind};
use super::property::Property;
use super::value::{ObjectId, PropertyKey, Value};
use super::RealmId;

/// Built-in constructors every realm has one of.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Builtin {
    Object,
    Function,
    Array,
    Error,
    TypeError,
    RangeError,
    ReferenceError,
    SyntaxError,
    EvalError,
    UriError,
    RegExp,
    Date,
    Map,
    Set,
    WeakMap,
    WeakSet,
    Promise,
    Buffer,
    Boolean,
    Number,
    String,
}

impl Builtin {
    pub const ALL: [Builtin; 21] = [
        Builtin::Object,
        Builtin::Function,
        Builtin::Array,
        Builtin::Error,
        Builtin::TypeError,
        Builtin::RangeError,
        Builtin::ReferenceError,
        Builtin::SyntaxError,
        Builtin::EvalError,
        Builtin::UriError,
        Builtin::RegExp,
        Builtin::Date,
        Builtin::Map,
        Builtin::Set,
        Builtin::WeakMap,
        Builtin::WeakSet,
        Builtin::Promise,
        Builtin::Buffer,
        Builtin::Boolean,
        Builtin::Number,
        Builtin::String,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Builtin::Object => "Object",
            Builtin::Function => "Function",
            Builtin::Array => "Array",
            Builtin::Error => "Error",
            Builtin::TypeError => "TypeError",
            Builtin::RangeError => "RangeError",
            Builtin::ReferenceError => "ReferenceError",
            Builtin::SyntaxError => "SyntaxError",
            Builtin::EvalError => "EvalError",
            Builtin::UriError => "URIError",
            Builtin::RegExp => "RegExp",
            Builtin::Date => "Date",
            Builtin::Map => "Map",
            Builtin::Set => "Set",
            Builtin::WeakMap => "WeakMap",
            Builtin::WeakSet => "WeakSet",
            Builtin::Promise => "Promise",
            Builtin::Buffer => "Buffer",
            Builtin::Boolean => "Boolean",
            Builtin::Number => "Number",
            Builtin::String => "String",
        }
    }

    pub fn is_error(self) -> bool {
        matches!(
            self,
            Builtin::Error
                | Builtin::TypeError
                | Builtin::RangeError
                | Builtin::ReferenceError
                | Builtin::SyntaxError
                | Builtin::EvalError
                | Builtin::UriError
        )
    }

    /// Prototype the built-in's own prototype object inherits from.
    fn parent(self) -> Option<Builtin> {
        match self {
            Builtin::Object => None,
            b if b.is_error() && b != Builtin::Error => Some(Builtin::Error),
            _ => Some(Builtin::Object),
        }
    }
}

/// Built-ins of one realm.
#[derive(Debug, Clone)]
pub struct Intrinsics {
    pub realm: RealmId,
    pub global: ObjectId,
    pub eval: ObjectId,
    constructors: Vec<ObjectId>,
    prototypes: Vec<ObjectId>,
}

impl Intrinsics {
    pub fn constructor(&self, builtin: Builtin) -> ObjectId {
        self.constructors[builtin as usize]
    }

    pub fn prototype(&self, builtin: Builtin) -> ObjectId {
        self.prototypes[builtin as usize]
    }

    pub fn object_prototype(&self) -> ObjectId {
        self.prototype(Builtin::Object)
    }

    pub fn function_prototype(&self) -> ObjectId {
        self.prototype(Builtin::Function)
    }

    /// `(builtin, constructor, prototype)` triples.
    pub fn iter(&self) -> impl Iterator<Item = (Builtin, ObjectId, ObjectId)> + '_ {
        Builtin::ALL
            .iter()
            .map(move |&b| (b, self.constructor(b), self.prototype(b)))
    }

    /// Every object the realm cannot run without.
    pub fn roots(&self) -> impl Iterator<Item = ObjectId> + '_ {
        self.constructors
            .iter()
            .chain(self.prototypes.iter())
            .copied()
            .chain([self.global, self.eval])
    }

    pub(crate) fn create(heap: &mut Heap, realm: RealmId) -> Intrinsics {
        // Prototypes first: constructors need Function.prototype.
        let mut prototypes: Vec<ObjectId> = Vec::with_capacity(Builtin::ALL.len());
        for builtin in Builtin::ALL {
            let parent = builtin.parent().map(|p| prototypes[p as usize]);
            prototypes.push(heap.allocate(JsObject::new(realm, parent, ObjectKind::Ordinary)));
        }
        let function_prototype = prototypes[Builtin::Function as usize];

        let mut constructors = Vec::with_capacity(Builtin::ALL.len());
        for builtin in Builtin::ALL {
            let native = natives::constructor(realm, builtin);
            let ctor = allocate_function(heap, realm, function_prototype, native);
            let proto = prototypes[builtin as usize];
            define(heap, ctor, "prototype", Property::frozen(Value::Object(proto)));
            define(heap, proto, "constructor", Property::hidden(Value::Object(ctor)));
            if builtin.is_error() {
                define(heap, proto, "name", Property::hidden(Value::from(builtin.name())));
                define(heap, proto, "message", Property::hidden(Value::from("")));
            }
            constructors.push(ctor);
        }

        let buffer = constructors[Builtin::Buffer as usize];
        for native in natives::buffer_statics(realm) {
            let name = native.name.clone();
            let f = allocate_function(heap, realm, function_prototype, native);
            define(heap, buffer, &name, Property::hidden(Value::Object(f)));
        }

        let eval = allocate_function(heap, realm, function_prototype, natives::eval(realm));

        let global = heap.allocate(JsObject::new(
            realm,
            Some(prototypes[Builtin::Object as usize]),
            ObjectKind::Ordinary,
        ));
        for builtin in Builtin::ALL {
            define(
                heap,
                global,
                builtin.name(),
                Property::hidden(Value::Object(constructors[builtin as usize])),
            );
        }
        define(heap, global, "eval", Property::hidden(Value::Object(eval)));
        define(heap, global, "globalThis", Property::hidden(Value::Object(global)));

        Intrinsics {
            realm,
            global,
            eval,
            constructors,
            prototypes,
        }
    }
}

pub(crate) fn allocate_function(
    heap: &mut Heap,
    realm: RealmId,
    function_prototype: ObjectId,
    native: NativeFunction,
) -> ObjectId {
    let name = native.name.clone();
    let id = heap.allocate(JsObject::new(
        realm,
        Some(function_prototype),
        ObjectKind::Function(native),
    ));
    define(heap, id, "name", Property {
        enumerable: false,
        ..Property::frozen(Value::String(name))
    });
    id
}

fn define(heap: &mut Heap, id: ObjectId, key: &str, property: Property) {
    if let Ok(object) = heap.get_mut(id) {
        object.properties.insert(PropertyKey::from(key), property);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_prototypes_chain_to_error() {
        let mut heap = Heap::new();
        let intrinsics = Intrinsics::create(&mut heap, RealmId::Guest);
        let type_error_proto = heap.get(intrinsics.prototype(Builtin::TypeError)).map(|o| o.prototype);
        assert_eq!(type_error_proto.ok(), Some(Some(intrinsics.prototype(Builtin::Error))));
        let object_proto = heap.get(intrinsics.object_prototype()).map(|o| o.prototype);
        assert_eq!(object_proto.ok(), Some(None));
    }

    #[test]
    fn test_global_exposes_constructors() {
        let mut heap = Heap::new();
        let intrinsics = Intrinsics::create(&mut heap, RealmId::Host);
        let global = heap.get(intrinsics.global).ok();
        let array = global.and_then(|g| g.properties.get(&PropertyKey::from("Array")).cloned());
        assert_eq!(
            array.map(|p| p.slot),
            Some(crate::realm::PropertySlot::Data {
                value: Value::Object(intrinsics.constructor(Builtin::Array)),
                writable: true,
            })
        );
    }
}

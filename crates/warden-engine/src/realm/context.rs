//! The isolate both realms run in, and the object internal methods.

use super::heap::{GcStats, Heap};
use super::intrinsics::{allocate_function, Builtin, Intrinsics};
use super::object::{ErrorKind, JsObject, NativeFunction, ObjectKind};
use super::property::{Property, PropertyDescriptor, PropertySlot};
use super::value::{number_to_string, ObjectId, PropertyKey, SymbolId, Value};
use super::{Abrupt, JsResult, RealmId};
use crate::bridge::{hooks, BuiltinTable, IdentityCache};
use crate::sanitizer;
use std::rc::Rc;
use tracing::debug;

/// Maximum nesting of calls and wrapper hooks before a `RangeError`.
pub const MAX_CALL_DEPTH: usize = 256;

/// Compiles code handed to `eval` / `Function` at run time.
pub type CodeGenerator = Rc<dyn Fn(&mut Context, RealmId, &str) -> JsResult<Value>>;

/// One realm's built-ins and realm-wide switches.
#[derive(Debug, Clone)]
pub struct RealmRecord {
    pub intrinsics: Intrinsics,
    /// `eval` and `Function` may compile strings.
    pub(crate) code_generation: bool,
    /// Call sites handed to `Error.prepareStackTrace` go through the sanitizer.
    pub(crate) sanitize_call_sites: bool,
    /// Legacy `Buffer(n)` may hand out collected storage without clearing it.
    pub(crate) recycles_buffers: bool,
    pub(crate) internal_state: Option<ObjectId>,
}

impl RealmRecord {
    fn new(intrinsics: Intrinsics) -> Self {
        let recycles_buffers = intrinsics.realm == RealmId::Host;
        Self {
            intrinsics,
            code_generation: true,
            sanitize_call_sites: false,
            recycles_buffers,
            internal_state: None,
        }
    }

    pub fn allows_code_generation(&self) -> bool {
        self.code_generation
    }

    pub fn recycles_buffers(&self) -> bool {
        self.recycles_buffers
    }

    pub fn internal_state(&self) -> Option<ObjectId> {
        self.internal_state
    }
}

/// An engine-produced stack frame, as seen by `Error.prepareStackTrace`.
#[derive(Debug, Clone, PartialEq)]
pub struct StackFrame {
    pub function_name: String,
    pub file_name: String,
    pub line: u32,
    pub column: u32,
    /// `this` of the frame. May belong to either realm.
    pub receiver: Value,
}

enum Dispatch {
    Ordinary,
    Wrapper,
    Shield(ObjectId),
}

pub struct Context {
    heap: Heap,
    host: RealmRecord,
    guest: RealmRecord,
    current: RealmId,
    depth: usize,
    code_generator: Option<CodeGenerator>,
    pub(crate) cache: IdentityCache,
    pub(crate) builtins: BuiltinTable,
}

impl Default for Context {
    fn default() -> Self {
        Self::new()
    }
}

impl Context {
    /// Create the host and guest realms.
    pub fn new() -> Self {
        let mut heap = Heap::new();
        let host = Intrinsics::create(&mut heap, RealmId::Host);
        let guest = Intrinsics::create(&mut heap, RealmId::Guest);
        let builtins = BuiltinTable::new(&host, &guest);
        Self {
            heap,
            host: RealmRecord::new(host),
            guest: RealmRecord::new(guest),
            current: RealmId::Host,
            depth: 0,
            code_generator: None,
            cache: IdentityCache::new(),
            builtins,
        }
    }

    pub fn heap(&self) -> &Heap {
        &self.heap
    }

    pub fn heap_mut(&mut self) -> &mut Heap {
        &mut self.heap
    }

    pub fn object(&self, id: ObjectId) -> JsResult<&JsObject> {
        self.heap.get(id)
    }

    pub fn realm(&self, realm: RealmId) -> &RealmRecord {
        match realm {
            RealmId::Host => &self.host,
            RealmId::Guest => &self.guest,
        }
    }

    pub(crate) fn realm_mut(&mut self, realm: RealmId) -> &mut RealmRecord {
        match realm {
            RealmId::Host => &mut self.host,
            RealmId::Guest => &mut self.guest,
        }
    }

    pub fn intrinsics(&self, realm: RealmId) -> &Intrinsics {
        &self.realm(realm).intrinsics
    }

    pub fn global(&self, realm: RealmId) -> ObjectId {
        self.intrinsics(realm).global
    }

    pub fn builtins(&self) -> &BuiltinTable {
        &self.builtins
    }

    pub fn identity_cache(&self) -> &IdentityCache {
        &self.cache
    }

    /// Realm that errors raised right now are created in.
    pub fn current_realm(&self) -> RealmId {
        self.current
    }

    /// Run `f` with `realm` as the current realm.
    pub fn in_realm<T>(&mut self, realm: RealmId, f: impl FnOnce(&mut Self) -> T) -> T {
        let saved = std::mem::replace(&mut self.current, realm);
        let result = f(self);
        self.current = saved;
        result
    }

    pub fn realm_of(&self, value: &Value) -> JsResult<Option<RealmId>> {
        match value {
            Value::Object(id) => Ok(Some(self.heap.get(*id)?.realm)),
            _ => Ok(None),
        }
    }

    pub fn is_callable(&self, value: &Value) -> bool {
        value
            .as_object()
            .and_then(|id| self.heap.get(id).ok())
            .is_some_and(JsObject::is_callable)
    }

    pub fn set_code_generator(&mut self, generator: Option<CodeGenerator>) {
        self.code_generator = generator;
    }

    pub fn new_symbol(&mut self, description: Option<&str>) -> SymbolId {
        self.heap.new_symbol(description)
    }

    fn nested<T>(&mut self, f: impl FnOnce(&mut Self) -> JsResult<T>) -> JsResult<T> {
        if self.depth >= MAX_CALL_DEPTH {
            return Err(self.throw_error(ErrorKind::RangeError, "Maximum call stack size exceeded"));
        }
        self.depth += 1;
        let result = f(self);
        self.depth -= 1;
        result
    }

    // Allocation

    pub fn alloc(&mut self, realm: RealmId, prototype: Option<ObjectId>, kind: ObjectKind) -> ObjectId {
        self.heap.allocate(JsObject::new(realm, prototype, kind))
    }

    pub fn create_object(&mut self, realm: RealmId) -> ObjectId {
        let proto = self.intrinsics(realm).object_prototype();
        self.alloc(realm, Some(proto), ObjectKind::Ordinary)
    }

    pub fn create_array(&mut self, realm: RealmId, values: Vec<Value>) -> ObjectId {
        let proto = self.intrinsics(realm).prototype(Builtin::Array);
        let id = self.alloc(realm, Some(proto), ObjectKind::Array);
        if let Ok(object) = self.heap.get_mut(id) {
            let len = values.len();
            for (i, value) in values.into_iter().enumerate() {
                object.properties.insert(PropertyKey::index(i), Property::data(value));
            }
            object.properties.insert(
                PropertyKey::from("length"),
                Property {
                    enumerable: false,
                    ..Property::data(Value::Number(len as f64))
                },
            );
        }
        id
    }

    pub fn create_error(&mut self, realm: RealmId, kind: ErrorKind, message: &str) -> ObjectId {
        let proto = self.intrinsics(realm).prototype(kind.builtin());
        let id = self.alloc(realm, Some(proto), ObjectKind::Error(kind));
        if let Ok(object) = self.heap.get_mut(id) {
            object
                .properties
                .insert(PropertyKey::from("message"), Property::hidden(Value::from(message)));
        }
        id
    }

    pub fn create_buffer(&mut self, realm: RealmId, bytes: Vec<u8>) -> ObjectId {
        let proto = self.intrinsics(realm).prototype(Builtin::Buffer);
        self.alloc(realm, Some(proto), ObjectKind::Buffer(bytes))
    }

    pub fn create_function(&mut self, realm: RealmId, native: NativeFunction) -> ObjectId {
        let proto = self.intrinsics(realm).function_prototype();
        allocate_function(&mut self.heap, realm, proto, native)
    }

    /// Create an error in the current realm, ready to be thrown.
    pub fn throw_error(&mut self, kind: ErrorKind, message: impl AsRef<str>) -> Abrupt {
        let id = self.create_error(self.current, kind, message.as_ref());
        Abrupt::Throw(Value::Object(id))
    }

    /// `new_target.prototype` when it is an object, else the realm's default.
    pub fn prototype_from(&mut self, new_target: ObjectId, realm: RealmId, fallback: Builtin) -> JsResult<ObjectId> {
        let default = self.intrinsics(realm).prototype(fallback);
        if self.intrinsics(realm).constructor(fallback) == new_target {
            return Ok(default);
        }
        match self.get(new_target, &PropertyKey::from("prototype"))? {
            Value::Object(proto) => Ok(proto),
            _ => Ok(default),
        }
    }

    pub(crate) fn generate_code(&mut self, realm: RealmId, source: &str) -> JsResult<Value> {
        if !self.realm(realm).code_generation {
            return Err(self.throw_error(
                ErrorKind::EvalError,
                "Code generation from strings disallowed for this context",
            ));
        }
        match self.code_generator.clone() {
            Some(generator) => generator(self, realm, source),
            None => Err(self.throw_error(ErrorKind::EvalError, "Code generation is not available")),
        }
    }

    // Conversions

    pub fn to_boolean(&self, value: &Value) -> bool {
        match value {
            Value::Undefined | Value::Null => false,
            Value::Boolean(b) => *b,
            Value::Number(n) => *n != 0.0 && !n.is_nan(),
            Value::String(s) => !s.is_empty(),
            Value::Symbol(_) | Value::Object(_) => true,
        }
    }

    pub fn to_number(&self, value: &Value) -> f64 {
        match value {
            Value::Undefined => f64::NAN,
            Value::Null => 0.0,
            Value::Boolean(b) => f64::from(u8::from(*b)),
            Value::Number(n) => *n,
            Value::String(s) => {
                let trimmed = s.trim();
                if trimmed.is_empty() {
                    0.0
                } else {
                    trimmed.parse().unwrap_or(f64::NAN)
                }
            }
            Value::Symbol(_) => f64::NAN,
            Value::Object(id) => match self.heap.get(*id).map(|o| &o.kind) {
                Ok(ObjectKind::Boxed(p)) => self.to_number(&p.to_value()),
                _ => f64::NAN,
            },
        }
    }

    /// String form for messages and diagnostics. Never runs script code.
    pub fn to_display_string(&self, value: &Value) -> String {
        match value {
            Value::Undefined => "undefined".to_string(),
            Value::Null => "null".to_string(),
            Value::Boolean(b) => b.to_string(),
            Value::Number(n) => number_to_string(*n),
            Value::String(s) => s.to_string(),
            Value::Symbol(sym) => match self.heap.symbol_description(*sym) {
                Some(d) => format!("Symbol({d})"),
                None => "Symbol()".to_string(),
            },
            Value::Object(id) => self.describe_object(*id),
        }
    }

    fn describe_object(&self, id: ObjectId) -> String {
        let Ok(object) = self.heap.get(id) else {
            return "[object Object]".to_string();
        };
        let own_string = |key: &str| match object.properties.get(&PropertyKey::from(key)).map(|p| &p.slot) {
            Some(PropertySlot::Data { value: Value::String(s), .. }) => Some(s.to_string()),
            _ => None,
        };
        match &object.kind {
            ObjectKind::Error(kind) => match own_string("message") {
                Some(message) if !message.is_empty() => format!("{}: {}", kind.name(), message),
                _ => kind.name().to_string(),
            },
            ObjectKind::Boxed(p) => self.to_display_string(&p.to_value()),
            ObjectKind::Wrapper(w) => self.describe_object(w.target),
            ObjectKind::ScopeShield(target) => self.describe_object(*target),
            ObjectKind::Function(f) => format!("function {}() {{ [native code] }}", f.name),
            ObjectKind::Array => "[object Array]".to_string(),
            _ => "[object Object]".to_string(),
        }
    }

    // Internal methods

    fn dispatch(&self, id: ObjectId) -> JsResult<Dispatch> {
        Ok(match &self.heap.get(id)?.kind {
            ObjectKind::Wrapper(_) => Dispatch::Wrapper,
            ObjectKind::ScopeShield(target) => Dispatch::Shield(*target),
            _ => Dispatch::Ordinary,
        })
    }

    pub fn get_prototype_of(&mut self, id: ObjectId) -> JsResult<Option<ObjectId>> {
        match self.dispatch(id)? {
            Dispatch::Wrapper => self.nested(|ctx| hooks::get_prototype_of(ctx, id)),
            Dispatch::Shield(target) => self.get_prototype_of(target),
            Dispatch::Ordinary => Ok(self.heap.get(id)?.prototype),
        }
    }

    pub fn set_prototype_of(&mut self, id: ObjectId, proto: Option<ObjectId>) -> JsResult<bool> {
        match self.dispatch(id)? {
            Dispatch::Wrapper => self.nested(|ctx| hooks::set_prototype_of(ctx, id, proto)),
            Dispatch::Shield(target) => self.set_prototype_of(target, proto),
            Dispatch::Ordinary => {
                let object = self.heap.get(id)?;
                if object.prototype == proto {
                    return Ok(true);
                }
                if !object.extensible {
                    return Ok(false);
                }
                let mut cursor = proto;
                while let Some(p) = cursor {
                    if p == id {
                        return Ok(false);
                    }
                    let next = self.heap.get(p)?;
                    if !matches!(next.kind, ObjectKind::Ordinary | ObjectKind::Function(_) | ObjectKind::Array) {
                        break;
                    }
                    cursor = next.prototype;
                }
                self.heap.get_mut(id)?.prototype = proto;
                Ok(true)
            }
        }
    }

    pub fn is_extensible(&mut self, id: ObjectId) -> JsResult<bool> {
        match self.dispatch(id)? {
            Dispatch::Wrapper => self.nested(|ctx| hooks::is_extensible(ctx, id)),
            Dispatch::Shield(target) => self.is_extensible(target),
            Dispatch::Ordinary => Ok(self.heap.get(id)?.extensible),
        }
    }

    pub fn prevent_extensions(&mut self, id: ObjectId) -> JsResult<bool> {
        match self.dispatch(id)? {
            Dispatch::Wrapper => self.nested(|ctx| hooks::prevent_extensions(ctx, id)),
            Dispatch::Shield(target) => self.prevent_extensions(target),
            Dispatch::Ordinary => {
                self.heap.get_mut(id)?.extensible = false;
                Ok(true)
            }
        }
    }

    pub fn get_own_property(&mut self, id: ObjectId, key: &PropertyKey) -> JsResult<Option<PropertyDescriptor>> {
        match self.dispatch(id)? {
            Dispatch::Wrapper => self.nested(|ctx| hooks::get_own_property(ctx, id, key)),
            Dispatch::Shield(target) => self.get_own_property(target, key),
            Dispatch::Ordinary => Ok(self.ordinary_own_property(id, key)?.map(|p| p.to_descriptor())),
        }
    }

    /// Own property of a non-exotic object, including buffer elements.
    fn ordinary_own_property(&self, id: ObjectId, key: &PropertyKey) -> JsResult<Option<Property>> {
        let object = self.heap.get(id)?;
        if let ObjectKind::Buffer(bytes) = &object.kind {
            if key.is("length") {
                return Ok(Some(Property::frozen(Value::Number(bytes.len() as f64))));
            }
            if let Some(i) = buffer_index(key, bytes.len()) {
                return Ok(Some(Property::data(Value::Number(f64::from(bytes[i])))));
            }
        }
        Ok(object.properties.get(key).cloned())
    }

    pub fn define_own_property(&mut self, id: ObjectId, key: &PropertyKey, desc: PropertyDescriptor) -> JsResult<bool> {
        match self.dispatch(id)? {
            Dispatch::Wrapper => self.nested(|ctx| hooks::define_own_property(ctx, id, key, desc)),
            Dispatch::Shield(target) => self.define_own_property(target, key, desc),
            Dispatch::Ordinary => self.ordinary_define_own_property(id, key, desc),
        }
    }

    fn ordinary_define_own_property(&mut self, id: ObjectId, key: &PropertyKey, desc: PropertyDescriptor) -> JsResult<bool> {
        let get = self.accessor_half(desc.get.as_ref())?;
        let set = self.accessor_half(desc.set.as_ref())?;
        let current = self.ordinary_own_property(id, key)?;
        let object = self.heap.get_mut(id)?;

        if let ObjectKind::Buffer(bytes) = &mut object.kind {
            if key.is("length") {
                return Ok(false);
            }
            if let Some(i) = buffer_index(key, bytes.len()) {
                return Ok(match &desc.value {
                    Some(v) if !desc.is_accessor() => {
                        bytes[i] = to_byte(v);
                        true
                    }
                    None if !desc.is_accessor() => true,
                    _ => false,
                });
            }
        }

        let Some(current) = current else {
            if !object.extensible {
                return Ok(false);
            }
            let slot = if desc.is_accessor() {
                PropertySlot::Accessor { get, set }
            } else {
                PropertySlot::Data {
                    value: desc.value.unwrap_or(Value::Undefined),
                    writable: desc.writable.unwrap_or(false),
                }
            };
            object.properties.insert(
                key.clone(),
                Property {
                    slot,
                    enumerable: desc.enumerable.unwrap_or(false),
                    configurable: desc.configurable.unwrap_or(false),
                },
            );
            return Ok(true);
        };

        if !current.configurable {
            if desc.configurable == Some(true) {
                return Ok(false);
            }
            if desc.enumerable.is_some_and(|e| e != current.enumerable) {
                return Ok(false);
            }
            match &current.slot {
                PropertySlot::Data { value, writable } => {
                    if desc.is_accessor() {
                        return Ok(false);
                    }
                    if !writable {
                        if desc.writable == Some(true) {
                            return Ok(false);
                        }
                        if desc.value.as_ref().is_some_and(|v| !same_value(v, value)) {
                            return Ok(false);
                        }
                    }
                }
                PropertySlot::Accessor { get: cur_get, set: cur_set } => {
                    if desc.value.is_some() || desc.writable.is_some() {
                        return Ok(false);
                    }
                    if (desc.get.is_some() && get != *cur_get) || (desc.set.is_some() && set != *cur_set) {
                        return Ok(false);
                    }
                }
            }
        }

        let slot = match current.slot {
            PropertySlot::Accessor { get: cur_get, set: cur_set } if desc.value.is_none() && desc.writable.is_none() => {
                PropertySlot::Accessor {
                    get: if desc.get.is_some() { get } else { cur_get },
                    set: if desc.set.is_some() { set } else { cur_set },
                }
            }
            PropertySlot::Data { .. } if desc.is_accessor() => PropertySlot::Accessor { get, set },
            PropertySlot::Data { value, writable } => PropertySlot::Data {
                value: desc.value.unwrap_or(value),
                writable: desc.writable.unwrap_or(writable),
            },
            PropertySlot::Accessor { .. } => PropertySlot::Data {
                value: desc.value.unwrap_or(Value::Undefined),
                writable: desc.writable.unwrap_or(false),
            },
        };
        object.properties.insert(
            key.clone(),
            Property {
                slot,
                enumerable: desc.enumerable.unwrap_or(current.enumerable),
                configurable: desc.configurable.unwrap_or(current.configurable),
            },
        );
        Ok(true)
    }

    fn accessor_half(&mut self, half: Option<&Value>) -> JsResult<Option<ObjectId>> {
        match half {
            None | Some(Value::Undefined) => Ok(None),
            Some(Value::Object(f)) if self.is_callable(&Value::Object(*f)) => Ok(Some(*f)),
            Some(other) => {
                let shown = self.to_display_string(other);
                Err(self.throw_error(
                    ErrorKind::TypeError,
                    format!("Getter must be a function: {shown}"),
                ))
            }
        }
    }

    pub fn has(&mut self, id: ObjectId, key: &PropertyKey) -> JsResult<bool> {
        match self.dispatch(id)? {
            Dispatch::Wrapper => self.nested(|ctx| hooks::has(ctx, id, key)),
            Dispatch::Shield(target) => sanitizer::shield_has(self, target, key),
            Dispatch::Ordinary => {
                if self.ordinary_own_property(id, key)?.is_some() {
                    return Ok(true);
                }
                match self.heap.get(id)?.prototype {
                    Some(proto) => self.nested(|ctx| ctx.has(proto, key)),
                    None => Ok(false),
                }
            }
        }
    }

    pub fn get(&mut self, id: ObjectId, key: &PropertyKey) -> JsResult<Value> {
        self.get_with_receiver(id, key, &Value::Object(id))
    }

    pub fn get_with_receiver(&mut self, id: ObjectId, key: &PropertyKey, receiver: &Value) -> JsResult<Value> {
        match self.dispatch(id)? {
            Dispatch::Wrapper => self.nested(|ctx| hooks::get(ctx, id, key, receiver)),
            Dispatch::Shield(target) => self.get_with_receiver(target, key, &Value::Object(target)),
            Dispatch::Ordinary => match self.ordinary_own_property(id, key)? {
                Some(Property { slot: PropertySlot::Data { value, .. }, .. }) => Ok(value),
                Some(Property { slot: PropertySlot::Accessor { get: Some(getter), .. }, .. }) => {
                    self.call(&Value::Object(getter), receiver, &[])
                }
                Some(_) => Ok(Value::Undefined),
                None => match self.heap.get(id)?.prototype {
                    Some(proto) => self.nested(|ctx| ctx.get_with_receiver(proto, key, receiver)),
                    None => Ok(Value::Undefined),
                },
            },
        }
    }

    pub fn set(&mut self, id: ObjectId, key: &PropertyKey, value: Value) -> JsResult<bool> {
        self.set_with_receiver(id, key, value, &Value::Object(id))
    }

    pub fn set_with_receiver(&mut self, id: ObjectId, key: &PropertyKey, value: Value, receiver: &Value) -> JsResult<bool> {
        match self.dispatch(id)? {
            Dispatch::Wrapper => self.nested(|ctx| hooks::set(ctx, id, key, value, receiver)),
            Dispatch::Shield(target) => self.set_with_receiver(target, key, value, &Value::Object(target)),
            Dispatch::Ordinary => match self.ordinary_own_property(id, key)? {
                Some(Property { slot: PropertySlot::Data { writable: false, .. }, .. }) => Ok(false),
                Some(Property { slot: PropertySlot::Accessor { set, .. }, .. }) => match set {
                    Some(setter) => {
                        self.call(&Value::Object(setter), receiver, &[value])?;
                        Ok(true)
                    }
                    None => Ok(false),
                },
                Some(_) => self.set_on_receiver(key, value, receiver),
                None => match self.heap.get(id)?.prototype {
                    Some(proto) => self.nested(|ctx| ctx.set_with_receiver(proto, key, value, receiver)),
                    None => self.set_on_receiver(key, value, receiver),
                },
            },
        }
    }

    fn set_on_receiver(&mut self, key: &PropertyKey, value: Value, receiver: &Value) -> JsResult<bool> {
        let Value::Object(receiver) = receiver else {
            return Ok(false);
        };
        match self.get_own_property(*receiver, key)? {
            Some(existing) => {
                if existing.is_accessor() || existing.writable == Some(false) {
                    return Ok(false);
                }
                self.define_own_property(
                    *receiver,
                    key,
                    PropertyDescriptor {
                        value: Some(value),
                        ..PropertyDescriptor::default()
                    },
                )
            }
            None => self.define_own_property(*receiver, key, PropertyDescriptor::data(value)),
        }
    }

    pub fn delete(&mut self, id: ObjectId, key: &PropertyKey) -> JsResult<bool> {
        match self.dispatch(id)? {
            Dispatch::Wrapper => self.nested(|ctx| hooks::delete(ctx, id, key)),
            Dispatch::Shield(target) => self.delete(target, key),
            Dispatch::Ordinary => {
                let object = self.heap.get_mut(id)?;
                if let ObjectKind::Buffer(bytes) = &object.kind {
                    if key.is("length") || buffer_index(key, bytes.len()).is_some() {
                        return Ok(false);
                    }
                }
                match object.properties.get(key).map(|p| p.configurable) {
                    None => Ok(true),
                    Some(true) => {
                        object.properties.remove(key);
                        Ok(true)
                    }
                    Some(false) => Ok(false),
                }
            }
        }
    }

    pub fn own_keys(&mut self, id: ObjectId) -> JsResult<Vec<PropertyKey>> {
        match self.dispatch(id)? {
            Dispatch::Wrapper => self.nested(|ctx| hooks::own_keys(ctx, id)),
            Dispatch::Shield(target) => self.own_keys(target),
            Dispatch::Ordinary => {
                let object = self.heap.get(id)?;
                let mut keys = Vec::new();
                if let ObjectKind::Buffer(bytes) = &object.kind {
                    keys.extend((0..bytes.len()).map(PropertyKey::index));
                    keys.push(PropertyKey::from("length"));
                }
                keys.extend(object.properties.keys().cloned());
                Ok(keys)
            }
        }
    }

    pub fn call(&mut self, function: &Value, this: &Value, args: &[Value]) -> JsResult<Value> {
        let Value::Object(id) = function else {
            let shown = self.to_display_string(function);
            return Err(self.throw_error(ErrorKind::TypeError, format!("{shown} is not a function")));
        };
        let id = *id;
        let object = self.heap.get(id)?;
        match &object.kind {
            ObjectKind::Function(native) => {
                let call = native.call.clone();
                let realm = object.realm;
                self.nested(|ctx| ctx.in_realm(realm, |ctx| call(ctx, this, args)))
            }
            ObjectKind::Wrapper(w) if w.flavor.is_callable() => {
                self.nested(|ctx| hooks::call(ctx, id, this, args))
            }
            _ => {
                let shown = self.to_display_string(function);
                Err(self.throw_error(ErrorKind::TypeError, format!("{shown} is not a function")))
            }
        }
    }

    pub fn construct(&mut self, function: ObjectId, args: &[Value], new_target: Option<ObjectId>) -> JsResult<Value> {
        let object = self.heap.get(function)?;
        let new_target = new_target.unwrap_or(function);
        match &object.kind {
            ObjectKind::Function(NativeFunction { construct: Some(construct), .. }) => {
                let construct = construct.clone();
                let realm = object.realm;
                self.nested(|ctx| ctx.in_realm(realm, |ctx| construct(ctx, args, new_target)))
            }
            ObjectKind::Wrapper(w) if w.flavor.is_callable() => {
                self.nested(|ctx| hooks::construct(ctx, function, args, new_target))
            }
            _ => {
                let shown = self.to_display_string(&Value::Object(function));
                Err(self.throw_error(ErrorKind::TypeError, format!("{shown} is not a constructor")))
            }
        }
    }

    // Throwing variants of the internal methods

    pub fn set_strict(&mut self, id: ObjectId, key: &PropertyKey, value: Value) -> JsResult<()> {
        if self.set(id, key, value)? {
            Ok(())
        } else {
            Err(self.throw_error(
                ErrorKind::TypeError,
                format!("Cannot assign to read only property '{key}' of object"),
            ))
        }
    }

    pub fn define_property_or_throw(&mut self, id: ObjectId, key: &PropertyKey, desc: PropertyDescriptor) -> JsResult<()> {
        if self.define_own_property(id, key, desc)? {
            Ok(())
        } else {
            Err(self.throw_error(ErrorKind::TypeError, format!("Cannot redefine property: {key}")))
        }
    }

    pub fn delete_strict(&mut self, id: ObjectId, key: &PropertyKey) -> JsResult<()> {
        if self.delete(id, key)? {
            Ok(())
        } else {
            Err(self.throw_error(ErrorKind::TypeError, format!("Cannot delete property '{key}' of object")))
        }
    }

    pub fn set_prototype_of_strict(&mut self, id: ObjectId, proto: Option<ObjectId>) -> JsResult<()> {
        if self.set_prototype_of(id, proto)? {
            Ok(())
        } else {
            Err(self.throw_error(ErrorKind::TypeError, "Cannot set prototype of this object"))
        }
    }

    pub fn prevent_extensions_strict(&mut self, id: ObjectId) -> JsResult<()> {
        if self.prevent_extensions(id)? {
            Ok(())
        } else {
            Err(self.throw_error(ErrorKind::TypeError, "Cannot prevent extensions"))
        }
    }

    /// `value[key]` for any value; reading from `undefined`/`null` throws.
    pub fn get_value(&mut self, value: &Value, key: &PropertyKey) -> JsResult<Value> {
        match value {
            Value::Object(id) => self.get(*id, key),
            Value::Undefined | Value::Null => {
                let shown = self.to_display_string(value);
                Err(self.throw_error(
                    ErrorKind::TypeError,
                    format!("Cannot read properties of {shown} (reading '{key}')"),
                ))
            }
            Value::String(s) if key.is("length") => Ok(Value::Number(s.chars().count() as f64)),
            Value::Boolean(_) | Value::Number(_) | Value::String(_) => {
                let builtin = match value {
                    Value::Boolean(_) => Builtin::Boolean,
                    Value::Number(_) => Builtin::Number,
                    _ => Builtin::String,
                };
                let proto = self.intrinsics(self.current).prototype(builtin);
                self.get_with_receiver(proto, key, value)
            }
            Value::Symbol(_) => Ok(Value::Undefined),
        }
    }

    /// `instanceof` against a constructor, following prototypes through
    /// the internal methods.
    pub fn instance_of(&mut self, value: &Value, constructor: ObjectId) -> JsResult<bool> {
        let Value::Object(mut id) = value else {
            return Ok(false);
        };
        let Value::Object(target) = self.get(constructor, &PropertyKey::from("prototype"))? else {
            return Ok(false);
        };
        for _ in 0..MAX_CALL_DEPTH {
            match self.get_prototype_of(id)? {
                Some(proto) if proto == target => return Ok(true),
                Some(proto) => id = proto,
                None => return Ok(false),
            }
        }
        Ok(false)
    }

    /// Mark/sweep over both realms.
    ///
    /// Identity-cache entries are ephemerons: a wrapper survives through the
    /// cache only while its original does. Dead entries are pruned.
    pub fn collect_garbage(&mut self, extra_roots: &[Value]) -> GcStats {
        self.heap.clear_marks();

        let mut roots: Vec<ObjectId> = Vec::new();
        for realm in [&self.host, &self.guest] {
            roots.extend(realm.intrinsics.roots());
            roots.extend(realm.internal_state);
        }
        roots.extend(extra_roots.iter().filter_map(Value::as_object));
        let mut marked = self.heap.mark_from(roots);

        loop {
            let pending: Vec<ObjectId> = self
                .cache
                .entries()
                .filter(|(original, wrapper)| self.heap.is_marked(*original) && !self.heap.is_marked(*wrapper))
                .map(|(_, wrapper)| wrapper)
                .collect();
            if pending.is_empty() {
                break;
            }
            marked += self.heap.mark_from(pending);
        }

        let heap = &self.heap;
        let pruned = self.cache.retain(|original, wrapper| heap.is_marked(original) && heap.is_marked(wrapper));
        let freed = self.heap.sweep();

        let stats = &mut self.heap.stats;
        stats.collections += 1;
        stats.last_marked = marked;
        stats.last_freed = freed;
        stats.last_pruned = pruned;
        stats.live_objects = marked;
        let stats = *stats;
        debug!(freed, pruned, live = marked, "collected garbage");
        stats
    }
}

fn buffer_index(key: &PropertyKey, len: usize) -> Option<usize> {
    let s = key.as_str()?;
    if s.len() > 1 && s.starts_with('0') {
        return None;
    }
    s.parse::<usize>().ok().filter(|&i| i < len)
}

pub(crate) fn to_byte(value: &Value) -> u8 {
    match value {
        Value::Number(n) if n.is_finite() => (n.trunc() as i64 & 0xff) as u8,
        _ => 0,
    }
}

/// `SameValue`
fn same_value(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::Number(x), Value::Number(y)) => {
            (x.is_nan() && y.is_nan()) || (x == y && x.is_sign_negative() == y.is_sign_negative())
        }
        _ => a == b,
    }
}

//! Heap objects.

use super::context::Context;
use super::intrinsics::Builtin;
use super::property::PropertyMap;
use super::value::{ObjectId, Value};
use super::{JsResult, RealmId};
use crate::bridge::Wrapper;
use std::fmt;
use std::rc::Rc;
use std::sync::Arc;

/// Native call behaviour: `(context, this, arguments)`.
pub type CallFn = Rc<dyn Fn(&mut Context, &Value, &[Value]) -> JsResult<Value>>;

/// Native construct behaviour: `(context, arguments, new_target)`.
pub type ConstructFn = Rc<dyn Fn(&mut Context, &[Value], ObjectId) -> JsResult<Value>>;

/// A function implemented in Rust.
#[derive(Clone)]
pub struct NativeFunction {
    pub name: Arc<str>,
    pub call: CallFn,
    pub construct: Option<ConstructFn>,
    /// Values the closures hold on to; traced by the collector.
    pub captures: Vec<Value>,
}

impl NativeFunction {
    pub fn new(
        name: impl AsRef<str>,
        call: impl Fn(&mut Context, &Value, &[Value]) -> JsResult<Value> + 'static,
    ) -> Self {
        Self {
            name: Arc::from(name.as_ref()),
            call: Rc::new(call),
            construct: None,
            captures: Vec::new(),
        }
    }

    pub fn with_construct(
        mut self,
        construct: impl Fn(&mut Context, &[Value], ObjectId) -> JsResult<Value> + 'static,
    ) -> Self {
        self.construct = Some(Rc::new(construct));
        self
    }

    pub fn capturing(mut self, captures: Vec<Value>) -> Self {
        self.captures = captures;
        self
    }
}

impl fmt::Debug for NativeFunction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NativeFunction")
            .field("name", &self.name)
            .field("constructor", &self.construct.is_some())
            .finish()
    }
}

/// Error subtypes with a constructor of their own.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    Error,
    TypeError,
    RangeError,
    ReferenceError,
    SyntaxError,
    EvalError,
    UriError,
}

impl ErrorKind {
    pub const ALL: [ErrorKind; 7] = [
        ErrorKind::Error,
        ErrorKind::TypeError,
        ErrorKind::RangeError,
        ErrorKind::ReferenceError,
        ErrorKind::SyntaxError,
        ErrorKind::EvalError,
        ErrorKind::UriError,
    ];

    pub fn builtin(self) -> Builtin {
        match self {
            ErrorKind::Error => Builtin::Error,
            ErrorKind::TypeError => Builtin::TypeError,
            ErrorKind::RangeError => Builtin::RangeError,
            ErrorKind::ReferenceError => Builtin::ReferenceError,
            ErrorKind::SyntaxError => Builtin::SyntaxError,
            ErrorKind::EvalError => Builtin::EvalError,
            ErrorKind::UriError => Builtin::UriError,
        }
    }

    pub fn name(self) -> &'static str {
        self.builtin().name()
    }
}

/// Value held by a boxed primitive.
#[derive(Debug, Clone, PartialEq)]
pub enum Primitive {
    Boolean(bool),
    Number(f64),
    String(Arc<str>),
}

impl Primitive {
    pub fn builtin(&self) -> Builtin {
        match self {
            Primitive::Boolean(_) => Builtin::Boolean,
            Primitive::Number(_) => Builtin::Number,
            Primitive::String(_) => Builtin::String,
        }
    }

    pub fn to_value(&self) -> Value {
        match self {
            Primitive::Boolean(b) => Value::Boolean(*b),
            Primitive::Number(n) => Value::Number(*n),
            Primitive::String(s) => Value::String(s.clone()),
        }
    }
}

#[derive(Debug, Clone)]
pub enum ObjectKind {
    Ordinary,
    Array,
    Function(NativeFunction),
    Error(ErrorKind),
    Boxed(Primitive),
    RegExp { source: Arc<str>, flags: Arc<str> },
    Date(f64),
    Map(Vec<(Value, Value)>),
    Set(Vec<Value>),
    WeakMap,
    WeakSet,
    Promise,
    Buffer(Vec<u8>),
    /// Stand-in for an object of the other realm.
    Wrapper(Box<Wrapper>),
    /// `with` operand seen through the internal-state singleton.
    ScopeShield(ObjectId),
}

impl ObjectKind {
    /// Nominal built-in type of an instance, if it has one.
    pub fn builtin(&self) -> Option<Builtin> {
        match self {
            ObjectKind::Array => Some(Builtin::Array),
            ObjectKind::Error(kind) => Some(kind.builtin()),
            ObjectKind::Boxed(p) => Some(p.builtin()),
            ObjectKind::RegExp { .. } => Some(Builtin::RegExp),
            ObjectKind::Date(_) => Some(Builtin::Date),
            ObjectKind::Map(_) => Some(Builtin::Map),
            ObjectKind::Set(_) => Some(Builtin::Set),
            ObjectKind::WeakMap => Some(Builtin::WeakMap),
            ObjectKind::WeakSet => Some(Builtin::WeakSet),
            ObjectKind::Promise => Some(Builtin::Promise),
            ObjectKind::Buffer(_) => Some(Builtin::Buffer),
            _ => None,
        }
    }

    pub fn as_wrapper(&self) -> Option<&Wrapper> {
        match self {
            ObjectKind::Wrapper(w) => Some(w),
            _ => None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct JsObject {
    /// Realm whose object graph this object belongs to.
    pub realm: RealmId,
    pub prototype: Option<ObjectId>,
    pub extensible: bool,
    pub properties: PropertyMap,
    pub kind: ObjectKind,
}

impl JsObject {
    pub fn new(realm: RealmId, prototype: Option<ObjectId>, kind: ObjectKind) -> Self {
        Self {
            realm,
            prototype,
            extensible: true,
            properties: PropertyMap::new(),
            kind,
        }
    }

    pub fn is_callable(&self) -> bool {
        match &self.kind {
            ObjectKind::Function(_) => true,
            ObjectKind::Wrapper(w) => w.flavor.is_callable(),
            _ => false,
        }
    }

    /// Values this object keeps alive.
    pub(crate) fn trace(&self, out: &mut Vec<ObjectId>) {
        out.extend(self.prototype);
        for (_, prop) in self.properties.iter() {
            match &prop.slot {
                super::property::PropertySlot::Data { value, .. } => out.extend(value.as_object()),
                super::property::PropertySlot::Accessor { get, set } => {
                    out.extend(*get);
                    out.extend(*set);
                }
            }
        }
        match &self.kind {
            ObjectKind::Function(f) => out.extend(f.captures.iter().filter_map(Value::as_object)),
            ObjectKind::Map(entries) => {
                for (k, v) in entries {
                    out.extend(k.as_object());
                    out.extend(v.as_object());
                }
            }
            ObjectKind::Set(values) => out.extend(values.iter().filter_map(Value::as_object)),
            ObjectKind::Wrapper(w) => w.trace(out),
            ObjectKind::ScopeShield(target) => out.push(*target),
            _ => {}
        }
    }
}

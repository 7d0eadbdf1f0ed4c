//! Behaviour of the built-in constructors.

use super::context::{to_byte, Context};
use super::intrinsics::Builtin;
use super::object::{ErrorKind, NativeFunction, ObjectKind, Primitive};
use super::property::Property;
use super::value::{ObjectId, PropertyKey, Value};
use super::{Abrupt, JsResult, RealmId};
use std::sync::Arc;

pub(super) fn constructor(realm: RealmId, builtin: Builtin) -> NativeFunction {
    let name = builtin.name();
    match builtin {
        Builtin::Object => NativeFunction::new(name, move |ctx, _, args| object(ctx, realm, args))
            .with_construct(move |ctx, args, _| object(ctx, realm, args)),
        Builtin::Function => {
            NativeFunction::new(name, move |ctx, _, args| function(ctx, realm, args))
                .with_construct(move |ctx, args, _| function(ctx, realm, args))
        }
        Builtin::Array => NativeFunction::new(name, move |ctx, _, args| array(ctx, realm, args, None))
            .with_construct(move |ctx, args, nt| array(ctx, realm, args, Some(nt))),
        Builtin::Error
        | Builtin::TypeError
        | Builtin::RangeError
        | Builtin::ReferenceError
        | Builtin::SyntaxError
        | Builtin::EvalError
        | Builtin::UriError => {
            let kind = error_kind(builtin);
            NativeFunction::new(name, move |ctx, _, args| error(ctx, realm, kind, args, None))
                .with_construct(move |ctx, args, nt| error(ctx, realm, kind, args, Some(nt)))
        }
        Builtin::Buffer => {
            NativeFunction::new(name, move |ctx, _, args| buffer_legacy(ctx, realm, args, None))
                .with_construct(move |ctx, args, nt| buffer_legacy(ctx, realm, args, Some(nt)))
        }
        Builtin::Boolean | Builtin::Number | Builtin::String => {
            NativeFunction::new(name, move |ctx, _, args| {
                Ok(primitive(ctx, builtin, args.first()).to_value())
            })
            .with_construct(move |ctx, args, nt| {
                let value = primitive(ctx, builtin, args.first());
                let proto = ctx.prototype_from(nt, realm, builtin)?;
                Ok(Value::Object(ctx.alloc(realm, Some(proto), ObjectKind::Boxed(value))))
            })
        }
        _ => NativeFunction::new(name, move |ctx, _, _| {
            Err(ctx.throw_error(
                ErrorKind::TypeError,
                format!("Constructor {} requires 'new'", builtin.name()),
            ))
        })
        .with_construct(move |ctx, args, nt| {
            let kind = match builtin {
                Builtin::RegExp => ObjectKind::RegExp {
                    source: Arc::from(string_arg(ctx, args.first(), "(?:)")),
                    flags: Arc::from(string_arg(ctx, args.get(1), "")),
                },
                Builtin::Date => ObjectKind::Date(args.first().and_then(Value::as_number).unwrap_or(0.0)),
                Builtin::Map => ObjectKind::Map(Vec::new()),
                Builtin::Set => ObjectKind::Set(Vec::new()),
                Builtin::WeakMap => ObjectKind::WeakMap,
                Builtin::WeakSet => ObjectKind::WeakSet,
                _ => ObjectKind::Promise,
            };
            let proto = ctx.prototype_from(nt, realm, builtin)?;
            Ok(Value::Object(ctx.alloc(realm, Some(proto), kind)))
        }),
    }
}

/// `Buffer.alloc` and `Buffer.from`.
pub(super) fn buffer_statics(realm: RealmId) -> Vec<NativeFunction> {
    vec![
        NativeFunction::new("alloc", move |ctx, _, args| {
            let len = buffer_length(ctx, args.first())?;
            Ok(Value::Object(ctx.create_buffer(realm, vec![0; len])))
        }),
        NativeFunction::new("from", move |ctx, _, args| {
            let bytes = buffer_contents(ctx, args.first())?;
            Ok(Value::Object(ctx.create_buffer(realm, bytes)))
        }),
    ]
}

pub(super) fn eval(realm: RealmId) -> NativeFunction {
    NativeFunction::new("eval", move |ctx, _, args| match args.first() {
        Some(Value::String(source)) => ctx.generate_code(realm, source),
        Some(other) => Ok(other.clone()),
        None => Ok(Value::Undefined),
    })
}

fn error_kind(builtin: Builtin) -> ErrorKind {
    ErrorKind::ALL
        .into_iter()
        .find(|k| k.builtin() == builtin)
        .unwrap_or(ErrorKind::Error)
}

fn object(ctx: &mut Context, realm: RealmId, args: &[Value]) -> JsResult<Value> {
    match args.first() {
        Some(Value::Object(id)) => Ok(Value::Object(*id)),
        _ => Ok(Value::Object(ctx.create_object(realm))),
    }
}

fn function(ctx: &mut Context, realm: RealmId, args: &[Value]) -> JsResult<Value> {
    let mut parts = Vec::with_capacity(args.len());
    for arg in args {
        parts.push(ctx.to_display_string(arg));
    }
    let body = parts.pop().unwrap_or_default();
    let source = format!("(function anonymous({}\n) {{\n{}\n}})", parts.join(","), body);
    ctx.generate_code(realm, &source)
}

fn array(ctx: &mut Context, realm: RealmId, args: &[Value], new_target: Option<ObjectId>) -> JsResult<Value> {
    let id = match args {
        [Value::Number(n)] => {
            if *n < 0.0 || n.fract() != 0.0 || *n > u32::MAX as f64 {
                return Err(ctx.throw_error(ErrorKind::RangeError, "Invalid array length"));
            }
            let id = ctx.create_array(realm, Vec::new());
            let object = ctx.heap_mut().get_mut(id)?;
            object.properties.insert(
                PropertyKey::from("length"),
                Property {
                    enumerable: false,
                    ..Property::data(Value::Number(*n))
                },
            );
            id
        }
        _ => ctx.create_array(realm, args.to_vec()),
    };
    if let Some(nt) = new_target {
        let proto = ctx.prototype_from(nt, realm, Builtin::Array)?;
        ctx.heap_mut().get_mut(id)?.prototype = Some(proto);
    }
    Ok(Value::Object(id))
}

fn error(
    ctx: &mut Context,
    realm: RealmId,
    kind: ErrorKind,
    args: &[Value],
    new_target: Option<ObjectId>,
) -> JsResult<Value> {
    let message = match args.first() {
        None | Some(Value::Undefined) => None,
        Some(v) => Some(ctx.to_display_string(v)),
    };
    let id = ctx.create_error(realm, kind, message.as_deref().unwrap_or(""));
    if message.is_none() {
        ctx.heap_mut().get_mut(id)?.properties.remove(&PropertyKey::from("message"));
    }
    if let Some(nt) = new_target {
        let proto = ctx.prototype_from(nt, realm, kind.builtin())?;
        ctx.heap_mut().get_mut(id)?.prototype = Some(proto);
    }
    Ok(Value::Object(id))
}

/// `Buffer(arg)` / `new Buffer(arg)`.
///
/// In a realm that recycles buffers, a numeric argument allocates from
/// collected storage without clearing it. Elsewhere it is zero-filled.
fn buffer_legacy(
    ctx: &mut Context,
    realm: RealmId,
    args: &[Value],
    new_target: Option<ObjectId>,
) -> JsResult<Value> {
    let bytes = match args.first() {
        Some(Value::Number(_)) => {
            let len = buffer_length(ctx, args.first())?;
            if ctx.realm(realm).recycles_buffers() {
                ctx.heap_mut().buffers.take_unzeroed(len)
            } else {
                vec![0; len]
            }
        }
        other => buffer_contents(ctx, other)?,
    };
    let id = ctx.create_buffer(realm, bytes);
    if let Some(nt) = new_target {
        let proto = ctx.prototype_from(nt, realm, Builtin::Buffer)?;
        ctx.heap_mut().get_mut(id)?.prototype = Some(proto);
    }
    Ok(Value::Object(id))
}

/// Largest buffer a script can allocate, in bytes.
pub const MAX_BUFFER_LENGTH: usize = 1 << 30;

/// Length requested by a numeric size argument, if it is allocatable.
pub(crate) fn buffer_size(n: f64) -> Option<usize> {
    (n >= 0.0 && n.fract() == 0.0 && n <= MAX_BUFFER_LENGTH as f64).then_some(n as usize)
}

fn buffer_length(ctx: &mut Context, arg: Option<&Value>) -> JsResult<usize> {
    match arg {
        Some(Value::Number(n)) => match buffer_size(*n) {
            Some(len) => Ok(len),
            None if *n > MAX_BUFFER_LENGTH as f64 => Err(ctx.throw_error(
                ErrorKind::RangeError,
                format!("The \"size\" argument must not be larger than {MAX_BUFFER_LENGTH}"),
            )),
            None => Err(size_error(ctx)),
        },
        _ => Err(size_error(ctx)),
    }
}

fn size_error(ctx: &mut Context) -> Abrupt {
    ctx.throw_error(
        ErrorKind::RangeError,
        "The \"size\" argument must be a non-negative integer",
    )
}

fn buffer_contents(ctx: &mut Context, arg: Option<&Value>) -> JsResult<Vec<u8>> {
    match arg {
        Some(Value::String(s)) => Ok(s.as_bytes().to_vec()),
        Some(Value::Object(id)) => {
            if let ObjectKind::Buffer(bytes) = &ctx.heap().get(*id)?.kind {
                return Ok(bytes.clone());
            }
            let length = ctx.get(*id, &PropertyKey::from("length"))?;
            let len = length.as_number().filter(|n| *n >= 0.0).unwrap_or(0.0).floor();
            let len = buffer_length(ctx, Some(&Value::Number(len)))?;
            let mut bytes = Vec::with_capacity(len);
            for i in 0..len {
                let element = ctx.get(*id, &PropertyKey::index(i))?;
                bytes.push(to_byte(&element));
            }
            Ok(bytes)
        }
        _ => Err(ctx.throw_error(
            ErrorKind::TypeError,
            "The first argument must be a string, Buffer, or array-like object",
        )),
    }
}

fn primitive(ctx: &mut Context, builtin: Builtin, arg: Option<&Value>) -> Primitive {
    let arg = arg.cloned().unwrap_or(Value::Undefined);
    match builtin {
        Builtin::Boolean => Primitive::Boolean(ctx.to_boolean(&arg)),
        Builtin::Number => Primitive::Number(ctx.to_number(&arg)),
        _ => Primitive::String(Arc::from(ctx.to_display_string(&arg))),
    }
}

fn string_arg(ctx: &mut Context, arg: Option<&Value>, default: &str) -> String {
    match arg {
        None | Some(Value::Undefined) => default.to_string(),
        Some(v) => ctx.to_display_string(v),
    }
}

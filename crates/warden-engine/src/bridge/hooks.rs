//! Interception hooks: the internal methods of wrapper objects.
//!
//! A hook re-wraps whatever flows out of the original for the observing
//! realm, and unwraps whatever flows in. Exceptions raised by the original
//! are wrapped the same way before they are rethrown.

use super::wrapper::{pinned_prototype, Wrapper};
use super::{debug_introspection, wrap, wrap_thrown, Flavor, Policy, DEBUG_INTROSPECTION_KEY};
use crate::realm::{
    buffer_size, Abrupt, Context, JsResult, ObjectId, ObjectKind, PropertyDescriptor, PropertyKey,
    Value,
};

fn wrapper_of(ctx: &Context, id: ObjectId) -> JsResult<Wrapper> {
    match &ctx.object(id)?.kind {
        ObjectKind::Wrapper(w) => Ok((**w).clone()),
        // Dispatch only reaches the hooks for wrappers.
        _ => Err(crate::realm::FatalError::StaleHandle(id).into()),
    }
}

/// Run an operation on the original inside its own realm, wrapping any
/// exception it throws for the observing realm.
fn guarded<T>(ctx: &mut Context, w: &Wrapper, op: impl FnOnce(&mut Context) -> JsResult<T>) -> JsResult<T> {
    match ctx.in_realm(w.direction.source(), op) {
        Err(Abrupt::Throw(error)) => Err(Abrupt::Throw(wrap_thrown(ctx, w.direction, &error)?)),
        other => other,
    }
}

/// Value arriving from the observing realm, re-expressed for the original's.
fn inbound(ctx: &mut Context, w: &Wrapper, value: &Value) -> JsResult<Value> {
    wrap(ctx, w.direction.opposite(), value)
}

fn outbound(ctx: &mut Context, w: &Wrapper, value: &Value) -> JsResult<Value> {
    wrap(ctx, w.direction, value)
}

fn receiver_for(ctx: &mut Context, w: &Wrapper, id: ObjectId, receiver: &Value) -> JsResult<Value> {
    if receiver.as_object() == Some(id) {
        Ok(Value::Object(w.target))
    } else {
        inbound(ctx, w, receiver)
    }
}

fn constructor_of(ctx: &mut Context, w: &Wrapper) -> JsResult<Value> {
    if let Flavor::Instance(builtin) = w.flavor {
        let realm = w.direction.destination();
        return Ok(Value::Object(ctx.builtins().constructor(realm, builtin)));
    }
    let target = w.target;
    let ctor = guarded(ctx, w, |ctx| ctx.get(target, &PropertyKey::from("constructor")))?;
    outbound(ctx, w, &ctor)
}

pub(crate) fn get(ctx: &mut Context, id: ObjectId, key: &PropertyKey, receiver: &Value) -> JsResult<Value> {
    let w = wrapper_of(ctx, id)?;
    if key.is("constructor") {
        return constructor_of(ctx, &w);
    }
    if key.is("__proto__") {
        return Ok(Value::Object(pinned_prototype(ctx, w.direction, w.flavor)));
    }
    if key.is(DEBUG_INTROSPECTION_KEY) && debug_introspection() {
        return Ok(Value::Boolean(true));
    }
    if let Some(mock) = w.mock(key).cloned() {
        return outbound(ctx, &w, &mock);
    }
    let receiver = receiver_for(ctx, &w, id, receiver)?;
    let target = w.target;
    let value = guarded(ctx, &w, |ctx| ctx.get_with_receiver(target, key, &receiver))?;
    outbound(ctx, &w, &value)
}

pub(crate) fn set(ctx: &mut Context, id: ObjectId, key: &PropertyKey, value: Value, receiver: &Value) -> JsResult<bool> {
    let w = wrapper_of(ctx, id)?;
    match w.policy {
        Policy::ReadOnly => return Ok(false),
        Policy::Protected if ctx.is_callable(&value) => return Ok(false),
        _ => {}
    }
    let value = inbound(ctx, &w, &value)?;
    let receiver = receiver_for(ctx, &w, id, receiver)?;
    let target = w.target;
    guarded(ctx, &w, |ctx| ctx.set_with_receiver(target, key, value, &receiver))
}

pub(crate) fn has(ctx: &mut Context, id: ObjectId, key: &PropertyKey) -> JsResult<bool> {
    let w = wrapper_of(ctx, id)?;
    if w.mock(key).is_some() {
        return Ok(true);
    }
    let target = w.target;
    guarded(ctx, &w, |ctx| ctx.has(target, key))
}

pub(crate) fn get_own_property(ctx: &mut Context, id: ObjectId, key: &PropertyKey) -> JsResult<Option<PropertyDescriptor>> {
    let w = wrapper_of(ctx, id)?;
    let target = w.target;
    let Some(desc) = guarded(ctx, &w, |ctx| ctx.get_own_property(target, key))? else {
        return Ok(None);
    };
    let mut wrapped = PropertyDescriptor {
        writable: desc.writable,
        enumerable: Some(desc.enumerable.unwrap_or(false)),
        configurable: Some(desc.configurable.unwrap_or(false)),
        ..PropertyDescriptor::default()
    };
    if let Some(value) = &desc.value {
        wrapped.value = Some(outbound(ctx, &w, value)?);
    }
    if let Some(getter) = &desc.get {
        wrapped.get = Some(outbound(ctx, &w, getter)?);
    }
    if let Some(setter) = &desc.set {
        wrapped.set = Some(outbound(ctx, &w, setter)?);
    }
    Ok(Some(wrapped))
}

pub(crate) fn define_own_property(
    ctx: &mut Context,
    id: ObjectId,
    key: &PropertyKey,
    desc: PropertyDescriptor,
) -> JsResult<bool> {
    let w = wrapper_of(ctx, id)?;
    match w.policy {
        Policy::ReadOnly => return Ok(false),
        Policy::Protected => {
            let callable = |v: &Option<Value>| v.as_ref().is_some_and(|v| ctx.is_callable(v));
            if callable(&desc.value) || callable(&desc.get) {
                return Ok(false);
            }
        }
        Policy::Open => {}
    }
    let mut unwrapped = PropertyDescriptor {
        writable: desc.writable,
        enumerable: desc.enumerable,
        configurable: desc.configurable,
        ..PropertyDescriptor::default()
    };
    if let Some(value) = &desc.value {
        unwrapped.value = Some(inbound(ctx, &w, value)?);
    }
    if let Some(getter) = &desc.get {
        unwrapped.get = Some(inbound(ctx, &w, getter)?);
    }
    if let Some(setter) = &desc.set {
        unwrapped.set = Some(inbound(ctx, &w, setter)?);
    }
    let target = w.target;
    guarded(ctx, &w, |ctx| ctx.define_own_property(target, key, unwrapped))
}

pub(crate) fn delete(ctx: &mut Context, id: ObjectId, key: &PropertyKey) -> JsResult<bool> {
    let w = wrapper_of(ctx, id)?;
    if w.policy == Policy::ReadOnly {
        return Ok(false);
    }
    let target = w.target;
    guarded(ctx, &w, |ctx| ctx.delete(target, key))
}

pub(crate) fn own_keys(ctx: &mut Context, id: ObjectId) -> JsResult<Vec<PropertyKey>> {
    let w = wrapper_of(ctx, id)?;
    let target = w.target;
    guarded(ctx, &w, |ctx| ctx.own_keys(target))
}

/// Always the destination realm's canonical prototype.
pub(crate) fn get_prototype_of(ctx: &mut Context, id: ObjectId) -> JsResult<Option<ObjectId>> {
    let w = wrapper_of(ctx, id)?;
    Ok(Some(pinned_prototype(ctx, w.direction, w.flavor)))
}

/// The prototype chain of a wrapper is pinned, whatever its policy.
pub(crate) fn set_prototype_of(ctx: &mut Context, id: ObjectId, _proto: Option<ObjectId>) -> JsResult<bool> {
    wrapper_of(ctx, id)?;
    Ok(false)
}

pub(crate) fn is_extensible(ctx: &mut Context, id: ObjectId) -> JsResult<bool> {
    let w = wrapper_of(ctx, id)?;
    let target = w.target;
    guarded(ctx, &w, |ctx| ctx.is_extensible(target))
}

pub(crate) fn prevent_extensions(ctx: &mut Context, id: ObjectId) -> JsResult<bool> {
    let w = wrapper_of(ctx, id)?;
    if w.policy == Policy::ReadOnly {
        return Ok(false);
    }
    let target = w.target;
    guarded(ctx, &w, |ctx| ctx.prevent_extensions(target))
}

fn inbound_arguments(ctx: &mut Context, w: &Wrapper, args: &[Value]) -> JsResult<Vec<Value>> {
    let mut out = Vec::with_capacity(args.len());
    for arg in args {
        out.push(inbound(ctx, w, arg)?);
    }
    if w.flavor == Flavor::BufferConstructor {
        zero_fill_allocation(ctx, w, &mut out);
    }
    Ok(out)
}

/// `Buffer(n, ..)` becomes `Buffer(zeroed, ..)` with a cleared buffer of `n`
/// bytes, so the allocation never hands out recycled memory. Sizes the
/// original would reject are passed on for it to throw.
fn zero_fill_allocation(ctx: &mut Context, w: &Wrapper, args: &mut [Value]) {
    let len = match args.first() {
        Some(Value::Number(n)) => match buffer_size(*n) {
            Some(len) => len,
            None => return,
        },
        _ => return,
    };
    let zeroed = ctx.create_buffer(w.direction.source(), vec![0; len]);
    args[0] = Value::Object(zeroed);
}

pub(crate) fn call(ctx: &mut Context, id: ObjectId, this: &Value, args: &[Value]) -> JsResult<Value> {
    let w = wrapper_of(ctx, id)?;
    let this = inbound(ctx, &w, this)?;
    let args = inbound_arguments(ctx, &w, args)?;
    let target = Value::Object(w.target);
    let result = guarded(ctx, &w, |ctx| ctx.call(&target, &this, &args))?;
    outbound(ctx, &w, &result)
}

pub(crate) fn construct(ctx: &mut Context, id: ObjectId, args: &[Value], new_target: ObjectId) -> JsResult<Value> {
    let w = wrapper_of(ctx, id)?;
    let args = inbound_arguments(ctx, &w, args)?;
    let new_target = if new_target == id {
        None
    } else {
        inbound(ctx, &w, &Value::Object(new_target))?.as_object()
    };
    let target = w.target;
    let result = guarded(ctx, &w, |ctx| ctx.construct(target, &args, new_target))?;
    outbound(ctx, &w, &result)
}

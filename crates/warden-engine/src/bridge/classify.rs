//! Decides how a value crosses the boundary.

use super::builtins::BuiltinTable;
use super::{Direction, Flavor};
use crate::realm::{Builtin, Context, JsResult, ObjectId, ObjectKind, Primitive, Value};

#[derive(Debug, Clone, PartialEq)]
pub enum Classification {
    /// Primitives and symbols cross unchanged.
    Passthrough,
    /// A wrapper going back to the realm of its original.
    SendHome(ObjectId),
    /// Already owned by the destination realm.
    Smuggled(ObjectId),
    /// An existing wrapper for this direction.
    Cached(ObjectId),
    /// A built-in constructor or prototype with a counterpart.
    Intrinsic(ObjectId),
    /// Boxed primitive, rebuilt in the destination realm.
    Boxed(ObjectId, Primitive),
    /// Needs a new wrapper.
    Wrap(ObjectId, Flavor),
}

/// Classify `value` for `direction`. Checks run in a fixed order; the first
/// that applies wins.
pub fn classify(ctx: &Context, direction: Direction, value: &Value) -> JsResult<Classification> {
    let Value::Object(id) = value else {
        return Ok(Classification::Passthrough);
    };
    let id = *id;

    if let Some(original) = ctx.cache.original_for(direction.opposite(), id) {
        return Ok(Classification::SendHome(original));
    }

    let object = ctx.object(id)?;
    if object.realm == direction.destination() {
        return Ok(Classification::Smuggled(id));
    }

    if let Some(wrapper) = ctx.cache.wrapper_for(direction, id) {
        return Ok(Classification::Cached(wrapper));
    }

    let table = ctx.builtins();
    if let Some(counterpart) = table.counterpart(id, direction.destination()) {
        return Ok(Classification::Intrinsic(counterpart));
    }

    let flavor = if let ObjectKind::Boxed(primitive) = &object.kind {
        return Ok(Classification::Boxed(id, primitive.clone()));
    } else if let Some(builtin) = object.kind.builtin() {
        Flavor::Instance(builtin)
    } else if object.is_callable() {
        if is_buffer_constructor(table, id) {
            Flavor::BufferConstructor
        } else {
            Flavor::Function
        }
    } else {
        Flavor::Object
    };
    Ok(Classification::Wrap(id, flavor))
}

fn is_buffer_constructor(table: &BuiltinTable, id: ObjectId) -> bool {
    table
        .lookup(id)
        .is_some_and(|e| e.builtin == Builtin::Buffer && e.role == super::Role::Constructor)
}

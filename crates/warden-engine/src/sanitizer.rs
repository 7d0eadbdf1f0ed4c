//! The internal state singleton.
//!
//! Transformed guest code reaches the bridge through one frozen guest object
//! installed under [`INTERNAL_STATE_NAME`]. It exposes `handleException`,
//! `wrapWith` and `import`.

use crate::bridge::{wrap_thrown, Direction};
use crate::realm::{
    Abrupt, Context, ErrorKind, JsResult, NativeFunction, ObjectId, ObjectKind, Property,
    PropertyDescriptor, PropertyKey, RealmId, Value,
};
use crate::transform::INTERNAL_STATE_NAME;
use tracing::{debug, warn};

pub const DYNAMIC_IMPORT_MESSAGE: &str = "Dynamic Import not supported";

/// Sanitise a value caught by guest code. Idempotent.
pub fn handle_exception(ctx: &mut Context, value: &Value) -> JsResult<Value> {
    wrap_thrown(ctx, Direction::HostToGuest, value)
}

/// Scope operand for a guest `with` statement. Objects are shielded so the
/// internal state name never resolves through them.
pub fn wrap_with(ctx: &mut Context, operand: &Value) -> JsResult<Value> {
    match operand {
        Value::Object(target) => {
            ctx.object(*target)?;
            let shield = ctx.alloc(RealmId::Guest, None, ObjectKind::ScopeShield(*target));
            Ok(Value::Object(shield))
        }
        other => Ok(other.clone()),
    }
}

/// `[[HasProperty]]` of a scope shield.
pub fn shield_has(ctx: &mut Context, target: ObjectId, key: &PropertyKey) -> JsResult<bool> {
    if key.is(INTERNAL_STATE_NAME) {
        return Ok(false);
    }
    ctx.has(target, key)
}

/// Dynamic import always fails.
pub fn import_dynamic(ctx: &mut Context, specifier: &Value) -> Abrupt {
    warn!(specifier = %ctx.to_display_string(specifier), "dynamic import attempted");
    let error = ctx.create_error(RealmId::Guest, ErrorKind::Error, DYNAMIC_IMPORT_MESSAGE);
    Abrupt::Throw(Value::Object(error))
}

/// Install the singleton on the guest global object. Returns the existing
/// singleton when it is already installed.
pub fn install_internal_state(ctx: &mut Context) -> JsResult<ObjectId> {
    if let Some(existing) = ctx.realm(RealmId::Guest).internal_state() {
        return Ok(existing);
    }

    let state = ctx.create_object(RealmId::Guest);
    let methods = [
        NativeFunction::new("handleException", |ctx, _this, args| {
            handle_exception(ctx, args.first().unwrap_or(&Value::Undefined))
        }),
        NativeFunction::new("wrapWith", |ctx, _this, args| {
            wrap_with(ctx, args.first().unwrap_or(&Value::Undefined))
        }),
        NativeFunction::new("import", |ctx, _this, args| {
            Err(import_dynamic(ctx, args.first().unwrap_or(&Value::Undefined)))
        }),
    ];
    for native in methods {
        let key = PropertyKey::from(native.name.as_ref());
        let function = ctx.create_function(RealmId::Guest, native);
        ctx.heap_mut()
            .get_mut(state)?
            .properties
            .insert(key, Property::frozen(Value::Object(function)));
    }
    ctx.prevent_extensions(state)?;

    let global = ctx.global(RealmId::Guest);
    let desc = PropertyDescriptor {
        value: Some(Value::Object(state)),
        writable: Some(false),
        enumerable: Some(false),
        configurable: Some(false),
        ..PropertyDescriptor::default()
    };
    ctx.define_property_or_throw(global, &PropertyKey::from(INTERNAL_STATE_NAME), desc)?;
    ctx.realm_mut(RealmId::Guest).internal_state = Some(state);
    debug!(state = %state, "installed internal state");
    Ok(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bridge::wrap;
    use crate::realm::Builtin;

    fn call_method(ctx: &mut Context, state: ObjectId, name: &str, arg: Value) -> JsResult<Value> {
        let method = ctx.get(state, &PropertyKey::from(name)).unwrap();
        ctx.call(&method, &Value::Object(state), &[arg])
    }

    #[test]
    fn test_handle_exception_wraps_host_errors() {
        let mut ctx = Context::new();
        let state = install_internal_state(&mut ctx).unwrap();
        let host_error = ctx.create_error(RealmId::Host, ErrorKind::TypeError, "boom");

        let caught = call_method(&mut ctx, state, "handleException", Value::Object(host_error)).unwrap();
        assert_ne!(caught, Value::Object(host_error));
        assert_eq!(ctx.realm_of(&caught).unwrap(), Some(RealmId::Guest));

        let guest_type_error = ctx.intrinsics(RealmId::Guest).constructor(Builtin::TypeError);
        assert!(ctx.instance_of(&caught, guest_type_error).unwrap());

        let again = call_method(&mut ctx, state, "handleException", caught.clone()).unwrap();
        assert_eq!(again, caught);
    }

    #[test]
    fn test_handle_exception_passes_primitives() {
        let mut ctx = Context::new();
        assert_eq!(handle_exception(&mut ctx, &Value::from("x")).unwrap(), Value::from("x"));
    }

    #[test]
    fn test_shield_hides_internal_state() {
        let mut ctx = Context::new();
        install_internal_state(&mut ctx).unwrap();
        let global = Value::Object(ctx.global(RealmId::Guest));
        let shield = wrap_with(&mut ctx, &global).unwrap().as_object().unwrap();

        assert!(!ctx.has(shield, &PropertyKey::from(INTERNAL_STATE_NAME)).unwrap());
        assert!(ctx.has(shield, &PropertyKey::from("Array")).unwrap());
        assert!(ctx.has(ctx.global(RealmId::Guest), &PropertyKey::from(INTERNAL_STATE_NAME)).unwrap());
    }

    #[test]
    fn test_shield_over_wrapped_host_object() {
        let mut ctx = Context::new();
        let host = ctx.create_object(RealmId::Host);
        ctx.set(host, &PropertyKey::from("x"), Value::from(1)).unwrap();
        let wrapped = wrap(&mut ctx, Direction::HostToGuest, &Value::Object(host)).unwrap();

        let shield = wrap_with(&mut ctx, &wrapped).unwrap().as_object().unwrap();
        assert!(ctx.has(shield, &PropertyKey::from("x")).unwrap());
        assert_eq!(ctx.get(shield, &PropertyKey::from("x")).unwrap(), Value::from(1));
    }

    #[test]
    fn test_wrap_with_leaves_primitives() {
        let mut ctx = Context::new();
        assert_eq!(wrap_with(&mut ctx, &Value::Null).unwrap(), Value::Null);
    }

    #[test]
    fn test_import_always_throws() {
        let mut ctx = Context::new();
        let state = install_internal_state(&mut ctx).unwrap();
        let Err(Abrupt::Throw(error)) = call_method(&mut ctx, state, "import", Value::from("fs")) else {
            panic!("import must throw");
        };
        assert_eq!(ctx.realm_of(&error).unwrap(), Some(RealmId::Guest));
        assert_eq!(ctx.to_display_string(&error), "Error: Dynamic Import not supported");
    }

    #[test]
    fn test_singleton_is_frozen_and_installed_once() {
        let mut ctx = Context::new();
        let state = install_internal_state(&mut ctx).unwrap();
        assert_eq!(install_internal_state(&mut ctx).unwrap(), state);

        let global = ctx.global(RealmId::Guest);
        let key = PropertyKey::from(INTERNAL_STATE_NAME);
        assert!(!ctx.set(global, &key, Value::Null).unwrap());
        assert!(!ctx.delete(global, &key).unwrap());
        assert!(!ctx.set(state, &PropertyKey::from("handleException"), Value::Null).unwrap());
        assert!(!ctx.is_extensible(state).unwrap());
        assert_eq!(ctx.get(global, &key).unwrap(), Value::Object(state));
    }
}

//! Exceptions crossing the sandbox boundary

use super::harness::*;
use std::cell::Cell;
use std::rc::Rc;
use std::time::Duration;
use warden_engine::bridge::{original_of, wrap, Direction};
use warden_engine::realm::{Abrupt, Builtin, ErrorKind, NativeFunction, RealmId, Value};
use warden_engine::transform::INTERNAL_STATE_NAME;
use warden_runtime::{EngineError, SandboxError, SandboxOptions};

fn install_thrower(sandbox: &mut warden_runtime::Sandbox<ScriptedEngine>) -> Value {
    let ctx = sandbox.context_mut();
    let thrower = NativeFunction::new("explode", |ctx, _this, _args| {
        Err(ctx.throw_error(ErrorKind::Error, "secret"))
    });
    let thrower = Value::Object(ctx.create_function(RealmId::Host, thrower));
    sandbox
        .install_global(Direction::HostToGuest, "explode", &thrower)
        .unwrap();
    thrower
}

// ============================================================================
// Guest exceptions seen by the host
// ============================================================================

#[test]
fn test_uncaught_guest_error() {
    let engine = ScriptedEngine::new().program("vm.js", |ctx, _| {
        Err(ctx.throw_error(ErrorKind::TypeError, "bad").into())
    });
    let mut sandbox = sandbox(engine);

    let err = sandbox
        .evaluate(Direction::HostToGuest, "throw new TypeError('bad')", None)
        .unwrap_err();
    assert_eq!(err.to_string(), "Uncaught TypeError: bad");
    let SandboxError::Thrown { value, message } = err else {
        panic!("expected a thrown value");
    };
    assert_eq!(message, "TypeError: bad");
    let ctx = sandbox.context_mut();
    assert_eq!(ctx.realm_of(&value).unwrap(), Some(RealmId::Host));
    let host_type_error = ctx.intrinsics(RealmId::Host).constructor(Builtin::TypeError);
    assert!(ctx.instance_of(&value, host_type_error).unwrap());
}

#[test]
fn test_uncaught_host_error_returns_as_itself() {
    let engine = ScriptedEngine::new().program("vm.js", |ctx, _| {
        let explode = global(ctx, RealmId::Guest, "explode")?;
        Ok(ctx.call(&explode, &Value::Undefined, &[])?)
    });
    let mut sandbox = sandbox(engine);
    install_thrower(&mut sandbox);

    let Err(SandboxError::Thrown { value, message }) = sandbox.evaluate(Direction::HostToGuest, "explode()", None)
    else {
        panic!("expected a thrown value");
    };
    assert_eq!(message, "Error: secret");
    let ctx = sandbox.context_mut();
    assert_eq!(ctx.realm_of(&value).unwrap(), Some(RealmId::Host));
    assert_eq!(original_of(ctx, Direction::GuestToHost, &value), None);
    let host_error = ctx.intrinsics(RealmId::Host).constructor(Builtin::Error);
    assert!(ctx.instance_of(&value, host_error).unwrap());
}

#[test]
fn test_host_calling_throwing_guest_function() {
    let engine = ScriptedEngine::new().program("vm.js", |ctx, _| {
        let fail = NativeFunction::new("fail", |ctx, _this, _args| {
            Err(ctx.throw_error(ErrorKind::RangeError, "out of range"))
        });
        Ok(Value::Object(ctx.create_function(RealmId::Guest, fail)))
    });
    let mut sandbox = sandbox(engine);
    let fail = sandbox.evaluate(Direction::HostToGuest, "() => { throw 0 }", None).unwrap();

    let Err(SandboxError::Thrown { value, message }) = sandbox.call(&fail, &Value::Undefined, &[]) else {
        panic!("expected a thrown value");
    };
    assert_eq!(message, "RangeError: out of range");
    assert_eq!(sandbox.context().realm_of(&value).unwrap(), Some(RealmId::Host));
}

#[test]
fn test_thrown_primitive() {
    let engine = ScriptedEngine::new().program("vm.js", |_, _| {
        Err(Abrupt::Throw(Value::from("plain")).into())
    });
    let mut sandbox = sandbox(engine);
    let Err(SandboxError::Thrown { value, message }) = sandbox.evaluate(Direction::HostToGuest, "throw 'plain'", None)
    else {
        panic!("expected a thrown value");
    };
    assert_eq!(value, Value::from("plain"));
    assert_eq!(message, "plain");
}

// ============================================================================
// Host exceptions seen by the guest
// ============================================================================

#[test]
fn test_guest_catch_sees_guest_view_of_host_error() {
    let engine = ScriptedEngine::new().program("vm.js", |ctx, _| {
        let explode = global(ctx, RealmId::Guest, "explode")?;
        let caught = guest_try(
            ctx,
            |ctx| ctx.call(&explode, &Value::Undefined, &[]),
            |ctx, caught| {
                assert_eq!(ctx.realm_of(&caught)?, Some(RealmId::Guest));
                let guest_error = ctx.intrinsics(RealmId::Guest).constructor(Builtin::Error);
                assert!(ctx.instance_of(&caught, guest_error)?);
                ctx.get_value(&caught, &key("message"))
            },
        )?;
        Ok(caught)
    });
    let mut sandbox = sandbox(engine);
    install_thrower(&mut sandbox);

    let source = "try { explode(); } catch (e) { e.message; }";
    let result = sandbox.evaluate(Direction::HostToGuest, source, None).unwrap();
    assert_eq!(result, Value::from("secret"));
    assert!(sandbox
        .engine()
        .last_compiled()
        .code
        .contains(&format!("e={INTERNAL_STATE_NAME}.handleException(e);")));
}

#[test]
fn test_engine_internal_host_error_is_sanitized() {
    let engine = ScriptedEngine::new().program("vm.js", |ctx, _| {
        guest_try(
            ctx,
            // Raised by engine internals: a raw host-realm error.
            |ctx| {
                let error = ctx.create_error(RealmId::Host, ErrorKind::Error, "internal");
                Err(Abrupt::Throw(Value::Object(error)))
            },
            |ctx, caught| Ok(Value::from(ctx.realm_of(&caught)? == Some(RealmId::Guest))),
        )
        .map_err(EngineError::from)
    });
    let mut sandbox = sandbox(engine);

    let result = sandbox.evaluate(Direction::HostToGuest, "try { x } catch (e) { e }", None).unwrap();
    assert_eq!(result, Value::from(true));
}

#[test]
fn test_fatal_errors_are_not_catchable() {
    let handled = Rc::new(Cell::new(false));
    let seen = Rc::clone(&handled);
    let engine = ScriptedEngine::new().program("vm.js", move |ctx, _| {
        let seen = Rc::clone(&seen);
        guest_try(
            ctx,
            |ctx| {
                let guest = Value::Object(ctx.create_object(RealmId::Guest));
                wrap(ctx, Direction::HostToGuest, &guest)
            },
            move |_, caught| {
                seen.set(true);
                Ok(caught)
            },
        )
        .map_err(EngineError::from)
    });
    let mut sandbox = sandbox(engine);

    let err = sandbox
        .evaluate(Direction::HostToGuest, "try { smuggle() } catch (e) {}", None)
        .unwrap_err();
    assert!(matches!(err, SandboxError::SmugglingDetected { .. }));
    assert!(!handled.get());
}

#[test]
fn test_dynamic_import_throws() {
    let engine = ScriptedEngine::new().program("vm.js", |ctx, _| {
        Ok(internal_state_call(ctx, "import", &[Value::from("fs")])?)
    });
    let mut sandbox = sandbox(engine);

    let err = sandbox
        .evaluate(Direction::HostToGuest, "import('fs')", None)
        .unwrap_err();
    assert_eq!(err.to_string(), "Uncaught Error: Dynamic Import not supported");
    assert!(sandbox
        .engine()
        .last_compiled()
        .code
        .contains(&format!("{INTERNAL_STATE_NAME}.import('fs')")));
}

// ============================================================================
// Timeouts
// ============================================================================

#[test]
fn test_timeout_error_reaches_host() {
    let engine = ScriptedEngine::new().program("vm.js", |ctx, budget| {
        let limit = budget.timeout.expect("budget");
        assert_eq!(limit, Duration::from_millis(50));
        // The engine raises the timeout error from its own realm.
        let error = ctx.create_error(RealmId::Host, ErrorKind::Error, "Script execution timed out after 50ms");
        Err(EngineError::Timeout {
            budget: limit,
            value: Value::Object(error),
        })
    });
    let options = SandboxOptions {
        timeout_ms: Some(50),
        ..SandboxOptions::default()
    };
    let mut sandbox = sandbox_with(engine, options);

    let err = sandbox
        .evaluate(Direction::HostToGuest, "while (true) {}", None)
        .unwrap_err();
    assert_eq!(err.to_string(), "Script execution timed out after 50ms");
    let SandboxError::Timeout { budget, value } = err else {
        panic!("expected a timeout");
    };
    assert_eq!(budget, Duration::from_millis(50));
    assert_eq!(sandbox.context().realm_of(&value).unwrap(), Some(RealmId::Host));
}

#[test]
fn test_timeout_error_from_guest_realm() {
    let engine = ScriptedEngine::new().program("vm.js", |ctx, _| {
        let error = ctx.throw_error(ErrorKind::Error, "Script execution timed out after 10ms");
        let Abrupt::Throw(value) = error else {
            unreachable!()
        };
        Err(EngineError::Timeout {
            budget: Duration::from_millis(10),
            value,
        })
    });
    let mut sandbox = sandbox(engine);

    let Err(SandboxError::Timeout { value, .. }) = sandbox.evaluate(Direction::HostToGuest, "for (;;) {}", None) else {
        panic!("expected a timeout");
    };
    let ctx = sandbox.context();
    assert_eq!(ctx.realm_of(&value).unwrap(), Some(RealmId::Host));
    assert_eq!(ctx.to_display_string(&value), "Error: Script execution timed out after 10ms");
}

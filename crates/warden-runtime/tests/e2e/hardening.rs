//! Guest realm hardening

use super::harness::*;
use std::fs;
use std::rc::Rc;
use tempfile::TempDir;
use warden_engine::bridge::Direction;
use warden_engine::hardening::{capture_stack_trace, HardeningSet};
use warden_engine::realm::{
    Builtin, Context, ErrorKind, JsResult, NativeFunction, PropertyKey, RealmId, StackFrame, Value,
};
use warden_engine::transform::INTERNAL_STATE_NAME;
use warden_runtime::{Sandbox, SandboxError, SandboxOptions};

fn unhardened() -> SandboxOptions {
    SandboxOptions {
        hardening: HardeningSet::none(),
        ..SandboxOptions::default()
    }
}

/// Guest program calling the realm's `eval` on `"7"`.
fn guest_eval() -> ScriptedEngine {
    ScriptedEngine::new().program("vm.js", |ctx, _| {
        let eval = Value::Object(ctx.intrinsics(RealmId::Guest).eval);
        Ok(ctx.call(&eval, &Value::Undefined, &[Value::from("7")])?)
    })
}

fn generate_seven(_: &mut Context, _: RealmId, _: &str) -> JsResult<Value> {
    Ok(Value::from(7))
}

fn seven_generator(sandbox: &mut Sandbox<ScriptedEngine>) {
    sandbox.context_mut().set_code_generator(Some(Rc::new(generate_seven)));
}

#[test]
fn test_internal_state_cannot_be_tampered_with() {
    let engine = ScriptedEngine::new().program("vm.js", |ctx, _| {
        let global_object = ctx.global(RealmId::Guest);
        let state = object(&global(ctx, RealmId::Guest, INTERNAL_STATE_NAME)?);
        let replaced_method = ctx.set(state, &key("handleException"), Value::Null)?;
        let added = ctx.set(state, &key("extra"), Value::from(1))?;
        let deleted = ctx.delete(global_object, &key(INTERNAL_STATE_NAME))?;
        let overwritten = ctx.set(global_object, &key(INTERNAL_STATE_NAME), Value::Null)?;
        let enumerable = ctx.own_keys(global_object)?.contains(&key(INTERNAL_STATE_NAME))
            && ctx
                .get_own_property(global_object, &key(INTERNAL_STATE_NAME))?
                .and_then(|d| d.enumerable)
                .unwrap_or(false);
        Ok(Value::from(replaced_method || added || deleted || overwritten || enumerable))
    });
    let mut sandbox = sandbox(engine);

    let result = sandbox.evaluate(Direction::HostToGuest, "tamper()", None).unwrap();
    assert_eq!(result, Value::from(false));
}

#[test]
fn test_guest_code_generation_is_denied() {
    let mut sandbox = sandbox(guest_eval());
    seven_generator(&mut sandbox);

    let err = sandbox
        .evaluate(Direction::HostToGuest, "eval('7')", None)
        .unwrap_err();
    assert_eq!(
        err.to_string(),
        "Uncaught EvalError: Code generation from strings disallowed for this context"
    );
}

#[test]
fn test_host_code_generation_is_unaffected() {
    let engine = ScriptedEngine::new().program("host.js", |ctx, _| {
        let eval = Value::Object(ctx.intrinsics(RealmId::Host).eval);
        Ok(ctx.call(&eval, &Value::Undefined, &[Value::from("7")])?)
    });
    let mut sandbox = sandbox(engine);
    seven_generator(&mut sandbox);

    let result = sandbox
        .evaluate(Direction::GuestToHost, "eval('7')", Some("host.js"))
        .unwrap();
    assert_eq!(result, Value::from(7));
}

#[test]
fn test_unhardened_guest() {
    let engine = guest_eval().program("state.js", |ctx, _| {
        Ok(global(ctx, RealmId::Guest, INTERNAL_STATE_NAME)?)
    });
    let mut sandbox = sandbox_with(engine, unhardened());
    seven_generator(&mut sandbox);

    assert_eq!(
        sandbox.evaluate(Direction::HostToGuest, "eval('7')", None).unwrap(),
        Value::from(7)
    );
    assert_eq!(
        sandbox
            .evaluate(Direction::HostToGuest, "state", Some("state.js"))
            .unwrap(),
        Value::Undefined
    );
}

/// Guest program installing `Error.prepareStackTrace`, then capturing a
/// stack. Returns whether the hook only ever saw guest values.
fn stack_trace_inspector() -> ScriptedEngine {
    ScriptedEngine::new().program("vm.js", |ctx, _| {
        let hook = NativeFunction::new("prepareStackTrace", |ctx, _this, args| {
            let sites = args.get(1).cloned().unwrap_or(Value::Undefined);
            let site = ctx.get_value(&sites, &PropertyKey::index(0))?;
            let receiver = ctx.get_value(&site, &key("receiver"))?;
            let guest_only = ctx.realm_of(&site)? == Some(RealmId::Guest)
                && ctx.realm_of(&receiver)? == Some(RealmId::Guest);
            Ok(Value::from(guest_only))
        });
        let hook = Value::Object(ctx.create_function(RealmId::Guest, hook));
        let error_ctor = ctx.intrinsics(RealmId::Guest).constructor(Builtin::Error);
        ctx.set_strict(error_ctor, &key("prepareStackTrace"), hook)?;

        let receiver = Value::Object(ctx.create_object(RealmId::Guest));
        let error = ctx.create_error(RealmId::Guest, ErrorKind::Error, "traced");
        let frames = [StackFrame {
            function_name: "main".to_string(),
            file_name: "vm.js".to_string(),
            line: 1,
            column: 1,
            receiver,
        }];
        Ok(capture_stack_trace(ctx, error, &frames)?)
    })
}

#[test]
fn test_stack_trace_hook_sees_only_guest_values() {
    let mut sandbox = sandbox(stack_trace_inspector());
    let result = sandbox.evaluate(Direction::HostToGuest, "new Error('traced')", None).unwrap();
    assert_eq!(result, Value::from(true));
}

#[test]
fn test_stack_trace_hook_leaks_without_hardening() {
    let mut sandbox = sandbox_with(stack_trace_inspector(), unhardened());
    let result = sandbox.evaluate(Direction::HostToGuest, "new Error('traced')", None).unwrap();
    assert_eq!(result, Value::from(false));
}

#[test]
fn test_options_file_selects_hardening() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("warden.toml");
    fs::write(
        &path,
        "filename = \"plugin.js\"\nhardening = [\"code-generation-denied\"]\n",
    )
    .unwrap();
    let options = SandboxOptions::from_file(&path).unwrap();

    let engine = ScriptedEngine::new().program("plugin.js", |ctx, _| {
        Ok(global(ctx, RealmId::Guest, INTERNAL_STATE_NAME)?)
    });
    let mut sandbox = Sandbox::new(engine, options).unwrap();
    assert_eq!(
        sandbox.evaluate(Direction::HostToGuest, "state", None).unwrap(),
        Value::Undefined
    );
    assert!(!sandbox.context().realm(RealmId::Guest).allows_code_generation());
}

#[test]
fn test_bad_options_file() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("warden.toml");
    fs::write(&path, "timeout_ms = 0\n").unwrap();
    let err = SandboxOptions::from_file(&path).unwrap_err();
    assert_eq!(err.to_string(), "Invalid configuration: timeout_ms must be greater than zero");
    assert!(matches!(
        SandboxError::from(err),
        SandboxError::Config(_)
    ));
}

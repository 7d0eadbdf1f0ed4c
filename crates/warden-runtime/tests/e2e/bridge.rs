//! Values crossing the sandbox boundary

use super::harness::*;
use warden_engine::bridge::{original_of, Direction};
use warden_engine::realm::{Builtin, NativeFunction, RealmId, Value};
use warden_runtime::SandboxError;

// ============================================================================
// Globals and results
// ============================================================================

#[test]
fn test_guest_reads_installed_global() {
    let engine = ScriptedEngine::new().program("vm.js", |ctx, _| {
        let config = global(ctx, RealmId::Guest, "config")?;
        Ok(ctx.get(object(&config), &key("count"))?)
    });
    let mut sandbox = sandbox(engine);

    let ctx = sandbox.context_mut();
    let config = ctx.create_object(RealmId::Host);
    ctx.set(config, &key("count"), Value::from(2)).unwrap();
    let exposed = sandbox
        .install_global(Direction::HostToGuest, "config", &Value::Object(config))
        .unwrap();
    assert_eq!(sandbox.context().realm_of(&exposed).unwrap(), Some(RealmId::Guest));

    let result = sandbox.evaluate(Direction::HostToGuest, "config.count", None).unwrap();
    assert_eq!(result, Value::from(2));
}

#[test]
fn test_guest_result_is_wrapped_for_host() {
    let engine = ScriptedEngine::new().program("vm.js", |ctx, _| {
        let result = ctx.create_object(RealmId::Guest);
        ctx.set(result, &key("x"), Value::from(1))?;
        Ok(Value::Object(result))
    });
    let mut sandbox = sandbox(engine);

    let result = sandbox.evaluate(Direction::HostToGuest, "({ x: 1 })", None).unwrap();
    let ctx = sandbox.context_mut();
    assert_eq!(ctx.realm_of(&result).unwrap(), Some(RealmId::Host));
    assert!(original_of(ctx, Direction::GuestToHost, &result).is_some());
    assert_eq!(ctx.get(object(&result), &key("x")).unwrap(), Value::from(1));
}

#[test]
fn test_host_object_comes_back_as_itself() {
    let engine = ScriptedEngine::new().program("vm.js", |ctx, _| Ok(global(ctx, RealmId::Guest, "shared")?));
    let mut sandbox = sandbox(engine);
    let shared = Value::Object(sandbox.context_mut().create_object(RealmId::Host));
    sandbox.install_global(Direction::HostToGuest, "shared", &shared).unwrap();

    let first = sandbox.evaluate(Direction::HostToGuest, "shared", None).unwrap();
    let second = sandbox.evaluate(Direction::HostToGuest, "shared", None).unwrap();
    assert_eq!(first, shared);
    assert_eq!(second, shared);
}

#[test]
fn test_guest_sees_its_own_prototypes() {
    let engine = ScriptedEngine::new().program("vm.js", |ctx, _| {
        let list = global(ctx, RealmId::Guest, "list")?;
        let proto = ctx.get_prototype_of(object(&list))?;
        let array_ctor = ctx.intrinsics(RealmId::Guest).constructor(Builtin::Array);
        let is_array = ctx.instance_of(&list, array_ctor)?;
        Ok(Value::from(
            proto == Some(ctx.intrinsics(RealmId::Guest).prototype(Builtin::Array)) && is_array,
        ))
    });
    let mut sandbox = sandbox(engine);
    let list = sandbox
        .context_mut()
        .create_array(RealmId::Host, vec![Value::from(1), Value::from(2)]);
    sandbox
        .install_global(Direction::HostToGuest, "list", &Value::Object(list))
        .unwrap();

    let result = sandbox.evaluate(Direction::HostToGuest, "list", None).unwrap();
    assert_eq!(result, Value::from(true));
}

#[test]
fn test_host_code_runs_untransformed() {
    let source = "try { attempt(); } catch (e) { log(e); }";
    let engine = ScriptedEngine::new().program("host.js", |ctx, _| {
        assert_eq!(ctx.current_realm(), RealmId::Host);
        Ok(Value::Object(ctx.create_object(RealmId::Host)))
    });
    let mut sandbox = sandbox(engine);

    let result = sandbox
        .evaluate(Direction::GuestToHost, source, Some("host.js"))
        .unwrap();
    assert_eq!(sandbox.context().realm_of(&result).unwrap(), Some(RealmId::Guest));

    let compiled = sandbox.engine().last_compiled();
    assert_eq!(compiled.code, source);
    assert_eq!(compiled.realm, RealmId::Host);
}

// ============================================================================
// Calls
// ============================================================================

#[test]
fn test_host_calls_guest_function() {
    let engine = ScriptedEngine::new().program("vm.js", |ctx, _| {
        let add_one = NativeFunction::new("addOne", |ctx, _this, args| {
            let arg = args.first().cloned().unwrap_or(Value::Undefined);
            assert_eq!(ctx.realm_of(&arg)?, Some(RealmId::Guest));
            let x = ctx.get_value(&arg, &key("x"))?;
            Ok(Value::from(ctx.to_number(&x) + 1.0))
        });
        Ok(Value::Object(ctx.create_function(RealmId::Guest, add_one)))
    });
    let mut sandbox = sandbox(engine);

    let function = sandbox.evaluate(Direction::HostToGuest, "(o) => o.x + 1", None).unwrap();
    assert!(sandbox.context().is_callable(&function));

    let ctx = sandbox.context_mut();
    let arg = ctx.create_object(RealmId::Host);
    ctx.set(arg, &key("x"), Value::from(41)).unwrap();
    let result = sandbox
        .call(&function, &Value::Undefined, &[Value::Object(arg)])
        .unwrap();
    assert_eq!(result, Value::from(42.0));
}

#[test]
fn test_guest_calls_host_function() {
    let engine = ScriptedEngine::new().program("vm.js", |ctx, _| {
        let host_fn = global(ctx, RealmId::Guest, "make")?;
        let made = ctx.call(&host_fn, &Value::Undefined, &[])?;
        assert_eq!(ctx.realm_of(&made)?, Some(RealmId::Guest));
        Ok(ctx.get(object(&made), &key("tag"))?)
    });
    let mut sandbox = sandbox(engine);
    let ctx = sandbox.context_mut();
    let make = NativeFunction::new("make", |ctx, _this, _args| {
        assert_eq!(ctx.current_realm(), RealmId::Host);
        let made = ctx.create_object(RealmId::Host);
        ctx.set(made, &key("tag"), Value::from("host"))?;
        Ok(Value::Object(made))
    });
    let make = Value::Object(ctx.create_function(RealmId::Host, make));
    sandbox.install_global(Direction::HostToGuest, "make", &make).unwrap();

    let result = sandbox.evaluate(Direction::HostToGuest, "make().tag", None).unwrap();
    assert_eq!(result, Value::from("host"));
}

// ============================================================================
// Mutation policies
// ============================================================================

#[test]
fn test_read_only_global() {
    let engine = ScriptedEngine::new().program("vm.js", |ctx, _| {
        let settings = object(&global(ctx, RealmId::Guest, "settings")?);
        let stored = ctx.set(settings, &key("debug"), Value::from(true))?;
        let deleted = ctx.delete(settings, &key("level"))?;
        Ok(Value::from(stored || deleted))
    });
    let mut sandbox = sandbox(engine);
    let ctx = sandbox.context_mut();
    let settings = ctx.create_object(RealmId::Host);
    ctx.set(settings, &key("level"), Value::from(3)).unwrap();

    let read_only = sandbox.mark_read_only(&Value::Object(settings)).unwrap();
    sandbox
        .install_global(Direction::HostToGuest, "settings", &read_only)
        .unwrap();

    let result = sandbox.evaluate(Direction::HostToGuest, "settings.debug = true", None).unwrap();
    assert_eq!(result, Value::from(false));
    let ctx = sandbox.context_mut();
    assert_eq!(ctx.get(settings, &key("debug")).unwrap(), Value::Undefined);
    assert_eq!(ctx.get(settings, &key("level")).unwrap(), Value::from(3));
}

#[test]
fn test_protected_global_rejects_functions() {
    let engine = ScriptedEngine::new().program("vm.js", |ctx, _| {
        let target = object(&global(ctx, RealmId::Guest, "target")?);
        let hook = NativeFunction::new("hook", |_, _, _| Ok(Value::Undefined));
        let hook = Value::Object(ctx.create_function(RealmId::Guest, hook));
        let stored_function = ctx.set(target, &key("hook"), hook)?;
        let stored_number = ctx.set(target, &key("n"), Value::from(7))?;
        Ok(Value::from(!stored_function && stored_number))
    });
    let mut sandbox = sandbox(engine);
    let target = Value::Object(sandbox.context_mut().create_object(RealmId::Host));
    let protected = sandbox.mark_protected(&target).unwrap();
    sandbox
        .install_global(Direction::HostToGuest, "target", &protected)
        .unwrap();

    let result = sandbox.evaluate(Direction::HostToGuest, "target.n = 7", None).unwrap();
    assert_eq!(result, Value::from(true));
    assert_eq!(
        sandbox.context_mut().get(object(&target), &key("n")).unwrap(),
        Value::from(7)
    );
}

#[test]
fn test_mocked_properties() {
    let engine = ScriptedEngine::new().program("vm.js", |ctx, _| {
        let env = object(&global(ctx, RealmId::Guest, "env")?);
        Ok(ctx.get(env, &key("HOME"))?)
    });
    let mut sandbox = sandbox(engine);
    let ctx = sandbox.context_mut();
    let env = ctx.create_object(RealmId::Host);
    ctx.set(env, &key("HOME"), Value::from("/root")).unwrap();

    let mocked = sandbox
        .mark_read_only_with_mocks(&Value::Object(env), vec![(key("HOME"), Value::from("/sandbox"))])
        .unwrap();
    sandbox.install_global(Direction::HostToGuest, "env", &mocked).unwrap();

    let result = sandbox.evaluate(Direction::HostToGuest, "env.HOME", None).unwrap();
    assert_eq!(result, Value::from("/sandbox"));
}

#[test]
fn test_conflicting_policies_are_rejected() {
    let mut sandbox = sandbox(ScriptedEngine::new());
    let target = Value::Object(sandbox.context_mut().create_object(RealmId::Host));
    sandbox.mark_read_only(&target).unwrap();
    assert!(matches!(
        sandbox.mark_protected(&target),
        Err(SandboxError::PolicyConflict { .. })
    ));
    assert!(sandbox.mark_read_only(&target).is_ok());
}

// ============================================================================
// Integrity
// ============================================================================

#[test]
fn test_raw_guest_object_is_smuggling() {
    let mut sandbox = sandbox(ScriptedEngine::new());
    let guest = Value::Object(sandbox.context_mut().create_object(RealmId::Guest));
    let err = sandbox
        .install_global(Direction::HostToGuest, "leak", &guest)
        .unwrap_err();
    assert!(matches!(
        err,
        SandboxError::SmugglingDetected { realm: RealmId::Guest, .. }
    ));
}

#[test]
fn test_unreachable_results_are_collected() {
    let engine = ScriptedEngine::new().program("vm.js", |ctx, _| {
        Ok(Value::Object(ctx.create_object(RealmId::Guest)))
    });
    let mut sandbox = sandbox(engine);

    let kept = sandbox.evaluate(Direction::HostToGuest, "({})", None).unwrap();
    sandbox.evaluate(Direction::HostToGuest, "({})", None).unwrap();
    assert_eq!(sandbox.context().identity_cache().len(), 2);

    let stats = sandbox.collect_garbage(std::slice::from_ref(&kept));
    assert_eq!(stats.last_pruned, 1);
    assert_eq!(sandbox.context().identity_cache().len(), 1);
    assert!(original_of(sandbox.context(), Direction::GuestToHost, &kept).is_some());
}

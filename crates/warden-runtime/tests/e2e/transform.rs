//! Guest sources pass through the transformer before compilation

use super::harness::*;
use std::sync::Arc;
use warden_engine::bridge::Direction;
use warden_engine::realm::{RealmId, Value};
use warden_engine::transform::INTERNAL_STATE_NAME;
use warden_runtime::{Sandbox, SandboxError, SandboxOptions, TransformCache};

fn returns_undefined() -> ScriptedEngine {
    ScriptedEngine::new().program("vm.js", |_, _| Ok(Value::Undefined))
}

#[test]
fn test_guest_source_is_transformed() {
    let mut sandbox = sandbox(returns_undefined());
    sandbox
        .evaluate(Direction::HostToGuest, "try { f(); } catch (e) { log(e); }", None)
        .unwrap();

    let compiled = sandbox.engine().last_compiled();
    assert_eq!(compiled.realm, RealmId::Guest);
    assert_eq!(compiled.filename, "vm.js");
    assert_eq!(
        compiled.code,
        format!("try {{ f(); }} catch (e) {{e={INTERNAL_STATE_NAME}.handleException(e); log(e); }}")
    );
}

#[test]
fn test_untouched_source_compiles_verbatim() {
    let source = "const total = [1, 2, 3].reduce((a, b) => a + b, 0);";
    let mut sandbox = sandbox(returns_undefined());
    sandbox.evaluate(Direction::HostToGuest, source, None).unwrap();
    assert_eq!(sandbox.engine().last_compiled().code, source);
}

#[test]
fn test_reserved_identifier_is_rejected() {
    let mut sandbox = sandbox(returns_undefined());
    let source = format!("let ok = 1;\n{INTERNAL_STATE_NAME}.handleException = null;");

    let err = sandbox
        .evaluate(Direction::HostToGuest, &source, None)
        .unwrap_err();
    assert!(matches!(err, SandboxError::ReservedIdentifier { line: 2, .. }));
    assert!(err.to_string().starts_with("Use of internal state variable is not allowed"));
    assert!(sandbox.engine().compiled.is_empty());
}

#[test]
fn test_syntax_error_is_rendered() {
    let mut sandbox = sandbox(returns_undefined());

    let err = sandbox
        .evaluate(Direction::HostToGuest, "let = ;", Some("broken.js"))
        .unwrap_err();
    let SandboxError::Syntax { rendered, .. } = &err else {
        panic!("expected a syntax error, got {err:?}");
    };
    assert!(rendered.contains("SyntaxError"));
    assert!(rendered.contains("broken.js"));
    assert_eq!(sandbox.engine().runs, 0);
}

#[test]
fn test_async_functions_follow_options() {
    let source = "async function load() { await 1; }";

    let mut allowed = sandbox(returns_undefined());
    assert!(allowed.evaluate(Direction::HostToGuest, source, None).is_ok());

    let options = SandboxOptions {
        allow_async: false,
        ..SandboxOptions::default()
    };
    let mut denied = sandbox_with(returns_undefined(), options);
    assert!(matches!(
        denied.evaluate(Direction::HostToGuest, source, None),
        Err(SandboxError::AsyncDisabled)
    ));
    assert!(denied
        .evaluate(Direction::HostToGuest, "function* gen() { yield 1; }", None)
        .is_ok());
}

#[test]
fn test_with_statement_is_shielded() {
    let engine = ScriptedEngine::new().program("vm.js", |ctx, _| {
        let scope = global(ctx, RealmId::Guest, "scope")?;
        let shield = object(&internal_state_call(ctx, "wrapWith", &[scope])?);
        let hides_state = !ctx.has(shield, &key(INTERNAL_STATE_NAME))?;
        let shows_x = ctx.has(shield, &key("x"))?;
        Ok(Value::from(hides_state && shows_x))
    });
    let mut sandbox = sandbox(engine);
    let ctx = sandbox.context_mut();
    let scope = ctx.create_object(RealmId::Host);
    ctx.set(scope, &key("x"), Value::from(1)).unwrap();
    ctx.set(scope, &key(INTERNAL_STATE_NAME), Value::from("decoy")).unwrap();
    sandbox
        .install_global(Direction::HostToGuest, "scope", &Value::Object(scope))
        .unwrap();

    let result = sandbox
        .evaluate(Direction::HostToGuest, "with (scope) { x; }", None)
        .unwrap();
    assert_eq!(result, Value::from(true));
    assert_eq!(
        sandbox.engine().last_compiled().code,
        format!("with ({INTERNAL_STATE_NAME}.wrapWith(scope)) {{ x; }}")
    );
}

// ============================================================================
// Transform cache
// ============================================================================

#[test]
fn test_cache_is_shared_between_sandboxes() {
    let cache = Arc::new(TransformCache::new());
    let source = "try { a(); } catch (err) { b(err); }";

    let mut first = Sandbox::with_cache(returns_undefined(), SandboxOptions::default(), Arc::clone(&cache)).unwrap();
    let mut second = Sandbox::with_cache(returns_undefined(), SandboxOptions::default(), Arc::clone(&cache)).unwrap();
    first.evaluate(Direction::HostToGuest, source, None).unwrap();
    second.evaluate(Direction::HostToGuest, source, None).unwrap();

    let stats = cache.stats();
    assert_eq!(stats.entries, 1);
    assert_eq!(stats.misses, 1);
    assert_eq!(stats.hits, 1);
    assert_eq!(
        first.engine().last_compiled().code,
        second.engine().last_compiled().code
    );
}

#[test]
fn test_cache_can_be_disabled() {
    let options = SandboxOptions {
        transform_cache: false,
        ..SandboxOptions::default()
    };
    let mut sandbox = sandbox_with(returns_undefined(), options);
    assert!(sandbox.transform_cache().is_none());
    sandbox.evaluate(Direction::HostToGuest, "1 + 1", None).unwrap();
    assert_eq!(sandbox.engine().last_compiled().code, "1 + 1");
}

// ============================================================================
// Engine failures
// ============================================================================

#[test]
fn test_engine_compile_error() {
    let mut sandbox = sandbox(returns_undefined());
    let err = sandbox
        .evaluate(Direction::HostToGuest, "1", Some("unknown.js"))
        .unwrap_err();
    assert!(matches!(err, SandboxError::Engine(ref message) if message.contains("unknown.js")));
}

#[test]
fn test_invalid_options_are_rejected() {
    let options = SandboxOptions {
        timeout_ms: Some(0),
        ..SandboxOptions::default()
    };
    assert!(matches!(
        Sandbox::new(returns_undefined(), options),
        Err(SandboxError::Config(_))
    ));
}

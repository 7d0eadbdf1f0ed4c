//! Guest entry points loaded through a module resolver

use super::harness::*;
use std::fs;
use std::path::Path;
use tempfile::TempDir;
use warden_engine::realm::{RealmId, Value};
use warden_engine::transform::INTERNAL_STATE_NAME;
use warden_runtime::{RelativeFileResolver, SandboxError};

fn project() -> TempDir {
    let dir = TempDir::new().unwrap();
    fs::create_dir_all(dir.path().join("lib")).unwrap();
    fs::write(dir.path().join("main.js"), "main();").unwrap();
    fs::write(
        dir.path().join("lib/math.js"),
        "try { square(2); } catch (e) { report(e); }",
    )
    .unwrap();
    fs::write(
        dir.path().join("lib/evil.js"),
        format!("{INTERNAL_STATE_NAME}.wrapWith = null;"),
    )
    .unwrap();
    dir
}

fn filename(path: &Path) -> String {
    path.to_string_lossy().into_owned()
}

#[test]
fn test_module_is_transformed_and_named_by_path() {
    let dir = project();
    let math = dir.path().join("lib/math.js");
    let engine = ScriptedEngine::new().program(&filename(&math), |_, _| Ok(Value::from(4)));
    let mut sandbox = sandbox(engine);
    let resolver = RelativeFileResolver::new(dir.path());

    let result = sandbox
        .evaluate_module(&resolver, "./lib/math", &dir.path().join("main.js"))
        .unwrap();
    assert_eq!(result, Value::from(4));

    let compiled = sandbox.engine().last_compiled();
    assert_eq!(compiled.filename, filename(&math));
    assert_eq!(compiled.realm, RealmId::Guest);
    assert!(compiled
        .code
        .contains(&format!("e={INTERNAL_STATE_NAME}.handleException(e);")));
}

#[test]
fn test_missing_module() {
    let dir = project();
    let mut sandbox = sandbox(ScriptedEngine::new());
    let resolver = RelativeFileResolver::new(dir.path());
    let main = dir.path().join("main.js");

    let err = sandbox
        .evaluate_module(&resolver, "./lib/absent", &main)
        .unwrap_err();
    assert!(err.to_string().starts_with("Cannot find module './lib/absent' from "));
    assert!(matches!(err, SandboxError::ModuleNotFound { ref specifier, .. } if specifier == "./lib/absent"));

    assert!(matches!(
        sandbox.evaluate_module(&resolver, "fs", &main),
        Err(SandboxError::ModuleNotFound { .. })
    ));
    assert!(sandbox.engine().compiled.is_empty());
}

#[test]
fn test_module_naming_internal_state_is_rejected() {
    let dir = project();
    let mut sandbox = sandbox(ScriptedEngine::new());
    let resolver = RelativeFileResolver::new(dir.path());

    let err = sandbox
        .evaluate_module(&resolver, "./lib/evil.js", &dir.path().join("main.js"))
        .unwrap_err();
    assert!(matches!(err, SandboxError::ReservedIdentifier { line: 1, column: 1 }));
}

#[test]
fn test_resolver_as_trait_object() {
    let dir = project();
    let main = dir.path().join("main.js");
    let engine = ScriptedEngine::new().program(&filename(&main), |_, _| Ok(Value::Null));
    let mut sandbox = sandbox(engine);
    let resolver: Box<dyn warden_runtime::ModuleResolver> = Box::new(RelativeFileResolver::new(dir.path()));

    let result = sandbox
        .evaluate_module(resolver.as_ref(), "./main", &main)
        .unwrap();
    assert_eq!(result, Value::Null);
}

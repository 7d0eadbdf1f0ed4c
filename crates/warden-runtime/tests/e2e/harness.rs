//! Test harness for end-to-end sandbox tests
//!
//! Guest and host "scripts" are Rust closures registered with a
//! [`ScriptedEngine`] under a filename. The engine records every source it
//! compiles, so tests can check what the transformer handed it.

use std::collections::HashMap;
use std::rc::Rc;
use warden_engine::realm::{Context, JsResult, ObjectId, PropertyKey, RealmId, Value};
use warden_engine::transform::INTERNAL_STATE_NAME;
use warden_runtime::{Budget, CompiledUnit, EngineError, Sandbox, SandboxOptions, ScriptEngine};

/// Body of a scripted program.
pub type Program = Rc<dyn Fn(&mut Context, &Budget) -> Result<Value, EngineError>>;

/// Source handed to [`ScriptEngine::compile`].
#[derive(Debug, Clone, PartialEq)]
pub struct CompiledSource {
    pub filename: String,
    pub code: String,
    pub realm: RealmId,
}

#[derive(Default)]
pub struct ScriptedEngine {
    programs: HashMap<String, Program>,
    units: HashMap<u64, Program>,
    next_id: u64,
    pub compiled: Vec<CompiledSource>,
    pub runs: usize,
}

impl ScriptedEngine {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register the program run for sources compiled as `filename`.
    pub fn program(
        mut self,
        filename: &str,
        body: impl Fn(&mut Context, &Budget) -> Result<Value, EngineError> + 'static,
    ) -> Self {
        self.programs.insert(filename.to_string(), Rc::new(body));
        self
    }

    pub fn last_compiled(&self) -> &CompiledSource {
        self.compiled.last().expect("nothing compiled")
    }
}

impl ScriptEngine for ScriptedEngine {
    fn compile(
        &mut self,
        source: &str,
        filename: &str,
        realm: RealmId,
        budget: Budget,
    ) -> Result<CompiledUnit, EngineError> {
        let program = self
            .programs
            .get(filename)
            .cloned()
            .ok_or_else(|| EngineError::Compile(format!("no program registered for {filename}")))?;
        self.compiled.push(CompiledSource {
            filename: filename.to_string(),
            code: source.to_string(),
            realm,
        });
        self.next_id += 1;
        self.units.insert(self.next_id, program);
        Ok(CompiledUnit {
            id: self.next_id,
            filename: filename.to_string(),
            realm,
            budget,
        })
    }

    fn run(&mut self, ctx: &mut Context, unit: &CompiledUnit) -> Result<Value, EngineError> {
        assert_eq!(ctx.current_realm(), unit.realm, "unit run outside its realm");
        let program = self
            .units
            .get(&unit.id)
            .cloned()
            .ok_or_else(|| EngineError::Compile(format!("unknown unit {}", unit.id)))?;
        self.runs += 1;
        program(ctx, &unit.budget)
    }
}

/// A sandbox with default options.
pub fn sandbox(engine: ScriptedEngine) -> Sandbox<ScriptedEngine> {
    Sandbox::new(engine, SandboxOptions::default()).expect("sandbox")
}

pub fn sandbox_with(engine: ScriptedEngine, options: SandboxOptions) -> Sandbox<ScriptedEngine> {
    Sandbox::new(engine, options).expect("sandbox")
}

pub fn key(name: &str) -> PropertyKey {
    PropertyKey::from(name)
}

pub fn object(value: &Value) -> ObjectId {
    value.as_object().expect("object value")
}

/// Read global `name` of `realm`.
pub fn global(ctx: &mut Context, realm: RealmId, name: &str) -> JsResult<Value> {
    let global = ctx.global(realm);
    ctx.get(global, &key(name))
}

/// Call method `name` of the internal state singleton, as transformed
/// guest code does.
pub fn internal_state_call(ctx: &mut Context, name: &str, args: &[Value]) -> JsResult<Value> {
    let state = global(ctx, RealmId::Guest, INTERNAL_STATE_NAME)?;
    let method = ctx.get(object(&state), &key(name))?;
    ctx.call(&method, &state, args)
}

/// Run `body` the way a transformed guest `try { body } catch (e) { .. }`
/// does: the caught value is passed through `handleException` before the
/// handler sees it.
pub fn guest_try(
    ctx: &mut Context,
    body: impl FnOnce(&mut Context) -> JsResult<Value>,
    handler: impl FnOnce(&mut Context, Value) -> JsResult<Value>,
) -> JsResult<Value> {
    match body(ctx) {
        Ok(value) => Ok(value),
        Err(warden_engine::realm::Abrupt::Throw(thrown)) => {
            let caught = internal_state_call(ctx, "handleException", &[thrown])?;
            handler(ctx, caught)
        }
        Err(fatal) => Err(fatal),
    }
}

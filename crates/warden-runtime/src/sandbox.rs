//! The embedder surface.
//!
//! A [`Sandbox`] pairs a [`Context`] holding the host and guest realms with
//! the [`ScriptEngine`] that runs code in them. Host code only ever sees
//! guest values through the bridge, and guest sources are transformed
//! before the engine compiles them.

use crate::cache::TransformCache;
use crate::engine::{EngineError, ScriptEngine};
use crate::error::{SandboxError, SandboxResult};
use crate::options::SandboxOptions;
use crate::resolver::ModuleResolver;
use std::path::Path;
use std::sync::Arc;
use tracing::debug;
use warden_engine::bridge::{original_of, wrap, wrap_thrown, wrap_with, Direction, MockTable, Policy};
use warden_engine::hardening;
use warden_engine::realm::{
    Abrupt, Context, FatalError, GcStats, PropertyDescriptor, PropertyKey, RealmId, Value,
};
use warden_engine::sanitizer;
use warden_engine::transform::{transform_with, TransformError};

pub struct Sandbox<E> {
    ctx: Context,
    engine: E,
    options: SandboxOptions,
    transforms: Option<Arc<TransformCache>>,
}

impl<E: ScriptEngine> Sandbox<E> {
    /// Create both realms and install the configured hardenings. A private
    /// transform cache is created when `options.transform_cache` is set.
    pub fn new(engine: E, options: SandboxOptions) -> SandboxResult<Self> {
        let transforms = options.transform_cache.then(|| Arc::new(TransformCache::new()));
        Self::build(engine, options, transforms)
    }

    /// Like [`Sandbox::new`], sharing `cache` with other sandboxes.
    pub fn with_cache(engine: E, options: SandboxOptions, cache: Arc<TransformCache>) -> SandboxResult<Self> {
        Self::build(engine, options, Some(cache))
    }

    fn build(engine: E, options: SandboxOptions, transforms: Option<Arc<TransformCache>>) -> SandboxResult<Self> {
        options.validate()?;
        let mut ctx = Context::new();
        if let Err(abrupt) = hardening::install(&mut ctx, &options.hardening) {
            return Err(sandbox_error(&mut ctx, abrupt));
        }
        debug!(hardening = ?options.hardening, cached = transforms.is_some(), "sandbox created");
        Ok(Self {
            ctx,
            engine,
            options,
            transforms,
        })
    }

    pub fn context(&self) -> &Context {
        &self.ctx
    }

    pub fn context_mut(&mut self) -> &mut Context {
        &mut self.ctx
    }

    pub fn engine(&self) -> &E {
        &self.engine
    }

    pub fn engine_mut(&mut self) -> &mut E {
        &mut self.engine
    }

    pub fn options(&self) -> &SandboxOptions {
        &self.options
    }

    pub fn transform_cache(&self) -> Option<&Arc<TransformCache>> {
        self.transforms.as_ref()
    }

    /// Expose `value` as global `name` of the destination realm of
    /// `direction`. Returns the value as the destination realm sees it.
    ///
    /// A value that already is a wrapper for `direction` (for instance one
    /// returned by [`Sandbox::mark_read_only`]) is installed as it is.
    pub fn install_global(&mut self, direction: Direction, name: &str, value: &Value) -> SandboxResult<Value> {
        let exposed = if original_of(&self.ctx, direction, value).is_some() {
            value.clone()
        } else {
            self.bridge(|ctx| wrap(ctx, direction, value))?
        };
        let realm = direction.destination();
        let global = self.ctx.global(realm);
        let desc = PropertyDescriptor::data(exposed.clone());
        self.bridge(|ctx| {
            ctx.in_realm(realm, |ctx| ctx.define_property_or_throw(global, &PropertyKey::from(name), desc))
        })?;
        debug!(%direction, name, "installed global");
        Ok(exposed)
    }

    /// Run `source` in the destination realm of `direction` and return its
    /// completion value as the other realm sees it.
    ///
    /// Code headed for the guest realm is transformed first. `filename`
    /// defaults to `options.filename`.
    pub fn evaluate(&mut self, direction: Direction, source: &str, filename: Option<&str>) -> SandboxResult<Value> {
        let filename = filename.unwrap_or(&self.options.filename).to_string();
        let code = match direction {
            Direction::HostToGuest => self.transform(source, &filename)?,
            Direction::GuestToHost => source.to_string(),
        };

        let realm = direction.destination();
        let budget = self.options.budget();
        let unit = match self.engine.compile(&code, &filename, realm, budget) {
            Ok(unit) => unit,
            Err(e) => return Err(self.engine_error(e)),
        };
        debug!(%direction, filename = %filename, unit = unit.id, "running");

        let engine = &mut self.engine;
        let result = self.ctx.in_realm(realm, |ctx| engine.run(ctx, &unit));
        match result {
            Ok(value) => self.bridge(|ctx| wrap(ctx, direction.opposite(), &value)),
            Err(e) => Err(self.engine_error(e)),
        }
    }

    /// Resolve `specifier` from `from` and evaluate it in the guest realm.
    pub fn evaluate_module<R: ModuleResolver + ?Sized>(
        &mut self,
        resolver: &R,
        specifier: &str,
        from: &Path,
    ) -> SandboxResult<Value> {
        let path = resolver
            .resolve(specifier, from)
            .ok_or_else(|| SandboxError::ModuleNotFound {
                specifier: specifier.to_string(),
                from: from.to_path_buf(),
            })?;
        let source = resolver.load(&path)?;
        let filename = path.to_string_lossy().into_owned();
        self.evaluate(Direction::HostToGuest, &source, Some(&filename))
    }

    /// Expose a host value to the guest with every mutation denied.
    pub fn mark_read_only(&mut self, value: &Value) -> SandboxResult<Value> {
        self.bridge(|ctx| wrap_with(ctx, Direction::HostToGuest, value, Policy::ReadOnly, None))
    }

    /// Expose a host value to the guest; the guest may not store functions
    /// on it.
    pub fn mark_protected(&mut self, value: &Value) -> SandboxResult<Value> {
        self.bridge(|ctx| wrap_with(ctx, Direction::HostToGuest, value, Policy::Protected, None))
    }

    /// [`Sandbox::mark_read_only`] with properties answered from `mocks`.
    pub fn mark_read_only_with_mocks(&mut self, value: &Value, mocks: MockTable) -> SandboxResult<Value> {
        self.bridge(|ctx| wrap_with(ctx, Direction::HostToGuest, value, Policy::ReadOnly, Some(mocks)))
    }

    /// Call a guest function from host code. Arguments are passed to the
    /// guest through the bridge, and the result or exception comes back the
    /// same way.
    pub fn call(&mut self, function: &Value, this: &Value, args: &[Value]) -> SandboxResult<Value> {
        let function = match self.ctx.realm_of(function) {
            Ok(Some(RealmId::Guest)) => self.bridge(|ctx| wrap(ctx, Direction::GuestToHost, function))?,
            Ok(_) => function.clone(),
            Err(abrupt) => return Err(sandbox_error(&mut self.ctx, abrupt)),
        };
        self.bridge(|ctx| ctx.in_realm(RealmId::Host, |ctx| ctx.call(&function, this, args)))
    }

    pub fn collect_garbage(&mut self, extra_roots: &[Value]) -> GcStats {
        self.ctx.collect_garbage(extra_roots)
    }

    fn transform(&self, source: &str, filename: &str) -> SandboxResult<String> {
        let options = self.options.transform_options();
        let result = match &self.transforms {
            Some(cache) => cache.get_or_transform(source, &options),
            None => transform_with(source, &options),
        };
        match result {
            Ok(output) => Ok(output.code),
            Err(TransformError::Syntax(error)) => {
                let rendered = error.render(source, filename);
                Err(SandboxError::Syntax { error, rendered })
            }
            Err(TransformError::ReservedIdentifier { line, column, .. }) => {
                Err(SandboxError::ReservedIdentifier { line, column })
            }
            Err(TransformError::AsyncDisabled) => Err(SandboxError::AsyncDisabled),
        }
    }

    /// Run a bridge operation, reporting abrupt completions as errors.
    fn bridge<T>(&mut self, op: impl FnOnce(&mut Context) -> Result<T, Abrupt>) -> SandboxResult<T> {
        match op(&mut self.ctx) {
            Ok(value) => Ok(value),
            Err(abrupt) => Err(sandbox_error(&mut self.ctx, abrupt)),
        }
    }

    fn engine_error(&mut self, error: EngineError) -> SandboxError {
        match error {
            EngineError::Compile(message) => SandboxError::Engine(message),
            EngineError::Abrupt(abrupt) => sandbox_error(&mut self.ctx, abrupt),
            EngineError::Timeout { budget, value } => match thrown_to_host(&mut self.ctx, &value) {
                Ok(value) => SandboxError::Timeout { budget, value },
                Err(abrupt) => sandbox_error(&mut self.ctx, abrupt),
            },
        }
    }
}

/// A thrown value as the host sees it. Every thrown value goes through the
/// guest's exception sanitizer first, whichever realm raised it.
fn thrown_to_host(ctx: &mut Context, value: &Value) -> Result<Value, Abrupt> {
    let sanitized = sanitizer::handle_exception(ctx, value)?;
    wrap_thrown(ctx, Direction::GuestToHost, &sanitized)
}

fn sandbox_error(ctx: &mut Context, abrupt: Abrupt) -> SandboxError {
    match abrupt {
        Abrupt::Fatal(fatal) => fatal_error(fatal),
        Abrupt::Throw(value) => match thrown_to_host(ctx, &value) {
            Ok(value) => {
                let message = ctx.to_display_string(&value);
                SandboxError::Thrown { value, message }
            }
            Err(Abrupt::Fatal(fatal)) => fatal_error(fatal),
            Err(Abrupt::Throw(_)) => SandboxError::Engine("exception could not be sanitized".to_string()),
        },
    }
}

fn fatal_error(fatal: FatalError) -> SandboxError {
    match fatal {
        FatalError::Smuggling { object, realm } => SandboxError::SmugglingDetected { object, realm },
        FatalError::StaleHandle(object) => SandboxError::StaleHandle(object),
        FatalError::PolicyConflict { object } => SandboxError::PolicyConflict { object },
    }
}

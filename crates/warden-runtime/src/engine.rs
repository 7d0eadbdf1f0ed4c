//! The script engine a sandbox drives.
//!
//! The engine owns compilation and execution; the sandbox only hands it
//! sources that have already been transformed, and only ever observes its
//! results through the bridge.

use std::time::Duration;
use thiserror::Error;
use warden_engine::realm::{Abrupt, Context, RealmId, Value};

/// Execution budget for one top-level evaluation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Budget {
    /// Wall-clock limit. `None` runs to completion.
    pub timeout: Option<Duration>,
}

impl Budget {
    pub fn unlimited() -> Self {
        Self::default()
    }

    pub fn with_timeout(timeout: Duration) -> Self {
        Self { timeout: Some(timeout) }
    }
}

/// Handle to code an engine compiled for one realm.
#[derive(Debug, Clone, PartialEq)]
pub struct CompiledUnit {
    /// Engine-assigned identifier.
    pub id: u64,
    pub filename: String,
    pub realm: RealmId,
    pub budget: Budget,
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum EngineError {
    /// The engine rejected the source.
    #[error("compile error: {0}")]
    Compile(String),

    /// Script code completed abruptly.
    #[error(transparent)]
    Abrupt(#[from] Abrupt),

    /// The budget ran out; `value` is the error the engine threw to unwind.
    #[error("script execution timed out after {}ms", budget.as_millis())]
    Timeout { budget: Duration, value: Value },
}

/// An engine able to compile and run code inside the realms of a [`Context`].
pub trait ScriptEngine {
    fn compile(
        &mut self,
        source: &str,
        filename: &str,
        realm: RealmId,
        budget: Budget,
    ) -> Result<CompiledUnit, EngineError>;

    /// Run `unit`. The context's current realm is already `unit.realm`.
    fn run(&mut self, ctx: &mut Context, unit: &CompiledUnit) -> Result<Value, EngineError>;
}

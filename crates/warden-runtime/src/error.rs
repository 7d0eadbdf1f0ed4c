//! Errors reported to embedders.

use crate::options::OptionsError;
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;
use warden_engine::parser::ParseError;
use warden_engine::realm::{ObjectId, RealmId, Value};

#[derive(Debug, Error)]
pub enum SandboxError {
    /// Guest source does not parse. `rendered` is a diagnostic with source
    /// context.
    #[error("{rendered}")]
    Syntax { error: ParseError, rendered: String },

    /// Guest source names the internal state singleton.
    #[error("Use of internal state variable is not allowed ({line}:{column})")]
    ReservedIdentifier { line: u32, column: u32 },

    #[error("Async functions are disabled in this sandbox")]
    AsyncDisabled,

    /// Script threw. `value` is as seen from the host realm.
    #[error("Uncaught {message}")]
    Thrown { value: Value, message: String },

    /// Budget exhausted. `value` is the timeout error as seen from the host.
    #[error("Script execution timed out after {}ms", budget.as_millis())]
    Timeout { budget: Duration, value: Value },

    /// A value of one realm was fed back into the bridge towards that
    /// same realm.
    #[error("{realm} value {object} smuggled back into {realm}")]
    SmugglingDetected { object: ObjectId, realm: RealmId },

    #[error("stale object handle {0}")]
    StaleHandle(ObjectId),

    #[error("{object} is already exposed with a different mutation policy")]
    PolicyConflict { object: ObjectId },

    #[error("Cannot find module '{specifier}' from {}", from.display())]
    ModuleNotFound { specifier: String, from: PathBuf },

    #[error("Engine error: {0}")]
    Engine(String),

    #[error("Configuration error: {0}")]
    Config(#[from] OptionsError),

    #[error("{0}")]
    Io(#[from] std::io::Error),
}

pub type SandboxResult<T> = Result<T, SandboxError>;

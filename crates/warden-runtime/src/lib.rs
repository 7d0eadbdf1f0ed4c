//! Warden Runtime
//!
//! Binds the warden engine to an embedder's script engine and module
//! resolver. A [`Sandbox`] owns both realms, installs the guest hardenings,
//! transforms guest sources before they are compiled, and passes every
//! value and exception crossing the boundary through the bridge.
//!
//! # Example
//!
//! ```rust,ignore
//! use warden_runtime::{Sandbox, SandboxOptions};
//! use warden_engine::{Direction, Value};
//!
//! let mut sandbox = Sandbox::new(MyEngine::default(), SandboxOptions::default())?;
//! sandbox.install_global(Direction::HostToGuest, "config", &config)?;
//! let result = sandbox.evaluate(Direction::HostToGuest, "config.name", None)?;
//! ```

#![warn(rust_2018_idioms)]

pub mod cache;
pub mod engine;
pub mod error;
pub mod options;
pub mod resolver;
pub mod sandbox;

pub use cache::{CacheStats, TransformCache};
pub use engine::{Budget, CompiledUnit, EngineError, ScriptEngine};
pub use error::{SandboxError, SandboxResult};
pub use options::{OptionsError, SandboxOptions};
pub use resolver::{ModuleResolver, RelativeFileResolver};
pub use sandbox::Sandbox;

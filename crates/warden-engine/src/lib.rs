//! Warden Engine
//!
//! The boundary between a trusted host realm and an untrusted guest realm:
//! - **Parser**: JavaScript lexer and parser for guest sources (`parser` module)
//! - **Transform**: source rewriting that routes caught exceptions, `with`
//!   operands and dynamic imports through the sanitizer (`transform` module)
//! - **Realm**: the object model both realms share (`realm` module)
//! - **Bridge**: wrapping of values crossing between realms (`bridge` module)
//! - **Sanitizer**: the guest's internal state singleton (`sanitizer` module)
//! - **Hardening**: hardened guest built-ins (`hardening` module)
//!
//! # Example
//!
//! ```rust,ignore
//! use warden_engine::{transform, wrap, Context, Direction, RealmId, Value};
//!
//! let output = transform("try { f() } catch (e) { log(e) }")?;
//! assert!(output.code.contains("handleException(e)"));
//!
//! let mut ctx = Context::new();
//! let host = Value::Object(ctx.create_object(RealmId::Host));
//! let guest_view = wrap(&mut ctx, Direction::HostToGuest, &host)?;
//! assert_eq!(wrap(&mut ctx, Direction::GuestToHost, &guest_view)?, host);
//! ```

#![warn(rust_2018_idioms)]
#![allow(clippy::new_without_default)]

pub mod bridge;
pub mod hardening;
pub mod parser;
pub mod realm;
pub mod sanitizer;
pub mod transform;

pub use bridge::{
    original_of, set_debug_introspection, wrap, wrap_thrown, wrap_with, Direction, Flavor,
    MockTable, Policy,
};
pub use hardening::{capture_stack_trace, Hardening, HardeningSet};
pub use parser::{ParseError, Parser};
pub use realm::{
    Abrupt, Builtin, Context, ErrorKind, FatalError, JsResult, NativeFunction, ObjectId,
    PropertyKey, RealmId, StackFrame, Value,
};
pub use transform::{
    transform, transform_with, TransformError, TransformOptions, TransformOutput, TransformResult,
    INTERNAL_STATE_NAME,
};

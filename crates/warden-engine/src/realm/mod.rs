//! Object model of the two realms a bridge connects.
//!
//! Both realms live in one [`Context`] and share one [`Heap`]; every object
//! records the realm whose graph it belongs to. Wrapped values and scope
//! shields are exotic objects whose internal methods dispatch to the bridge
//! and the sanitizer instead of ordinary property semantics.

pub mod context;
pub mod heap;
pub mod intrinsics;
mod natives;
pub mod object;
pub mod property;
pub mod value;

pub use context::{Context, StackFrame};
pub use heap::{BufferPool, GcStats, Heap};
pub use intrinsics::{Builtin, Intrinsics};
pub(crate) use natives::buffer_size;
pub use natives::MAX_BUFFER_LENGTH;
pub use object::{ErrorKind, JsObject, NativeFunction, ObjectKind, Primitive};
pub use property::{Property, PropertyDescriptor, PropertyMap, PropertySlot};
pub use value::{number_to_string, ObjectId, PropertyKey, SymbolId, Value};

use std::fmt;
use thiserror::Error;

/// The two realms of a bridge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum RealmId {
    Host,
    Guest,
}

impl RealmId {
    pub fn other(self) -> RealmId {
        match self {
            RealmId::Host => RealmId::Guest,
            RealmId::Guest => RealmId::Host,
        }
    }
}

impl fmt::Display for RealmId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RealmId::Host => f.write_str("host"),
            RealmId::Guest => f.write_str("guest"),
        }
    }
}

/// Errors script code cannot catch.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum FatalError {
    #[error("{realm} value {object} smuggled back into {realm} through the bridge")]
    Smuggling { object: ObjectId, realm: RealmId },

    #[error("stale object handle {0}")]
    StaleHandle(ObjectId),

    #[error("{object} is already exposed with a different mutation policy")]
    PolicyConflict { object: ObjectId },
}

/// Abrupt completion of an internal method.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum Abrupt {
    /// Script exception; catchable.
    #[error("uncaught exception")]
    Throw(Value),

    #[error(transparent)]
    Fatal(#[from] FatalError),
}

pub type JsResult<T> = Result<T, Abrupt>;

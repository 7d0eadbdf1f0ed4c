//! The realm bridge: moves values between the host and guest realms.
//!
//! Every object crossing the boundary is re-expressed for the receiving
//! realm. Primitives pass through, built-in constructors and prototypes map
//! to their counterparts, boxed primitives are rebuilt, and everything else
//! is represented by an intercepting [`Wrapper`]. At most one wrapper exists
//! per (original, direction) pair, and sending a wrapper back the way it
//! came yields its original.
//!
//! # Example
//!
//! ```ignore
//! use warden_engine::bridge::{wrap, Direction};
//! use warden_engine::realm::{Context, RealmId, Value};
//!
//! let mut ctx = Context::new();
//! let host = Value::Object(ctx.create_object(RealmId::Host));
//! let seen_by_guest = wrap(&mut ctx, Direction::HostToGuest, &host)?;
//! assert_eq!(wrap(&mut ctx, Direction::GuestToHost, &seen_by_guest)?, host);
//! ```

pub mod builtins;
pub mod cache;
pub mod classify;
pub(crate) mod hooks;
pub mod wrapper;

pub use builtins::{BuiltinTable, Role};
pub use cache::IdentityCache;
pub use classify::{classify, Classification};
pub use wrapper::{Flavor, MockTable, Wrapper};

use crate::realm::{Context, FatalError, JsResult, ObjectKind, RealmId, Value};
use std::fmt;
use std::rc::Rc;
use std::sync::atomic::{AtomicBool, Ordering};
use tracing::{trace, warn};

/// Property that reveals a wrapper while debug introspection is on.
pub const DEBUG_INTROSPECTION_KEY: &str = "isWardenWrapper";

static DEBUG_INTROSPECTION: AtomicBool = AtomicBool::new(false);

/// Process-wide switch for [`DEBUG_INTROSPECTION_KEY`]. Off by default.
pub fn set_debug_introspection(enabled: bool) {
    DEBUG_INTROSPECTION.store(enabled, Ordering::Relaxed);
}

pub fn debug_introspection() -> bool {
    DEBUG_INTROSPECTION.load(Ordering::Relaxed)
}

/// Which way a value is crossing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Direction {
    HostToGuest,
    GuestToHost,
}

impl Direction {
    pub const BOTH: [Direction; 2] = [Direction::HostToGuest, Direction::GuestToHost];

    /// Realm the original values come from.
    pub fn source(self) -> RealmId {
        match self {
            Direction::HostToGuest => RealmId::Host,
            Direction::GuestToHost => RealmId::Guest,
        }
    }

    /// Realm that observes the wrapped values.
    pub fn destination(self) -> RealmId {
        self.source().other()
    }

    pub fn opposite(self) -> Direction {
        match self {
            Direction::HostToGuest => Direction::GuestToHost,
            Direction::GuestToHost => Direction::HostToGuest,
        }
    }

    /// The direction whose destination is `realm`.
    pub fn into_realm(realm: RealmId) -> Direction {
        match realm {
            RealmId::Guest => Direction::HostToGuest,
            RealmId::Host => Direction::GuestToHost,
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Direction::HostToGuest => f.write_str("host->guest"),
            Direction::GuestToHost => f.write_str("guest->host"),
        }
    }
}

/// Mutation policy of a wrapper.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Policy {
    #[default]
    Open,
    /// Every mutating operation is denied.
    ReadOnly,
    /// Writing or defining a callable value is denied.
    Protected,
}

/// Re-express `value` for the destination realm of `direction`.
pub fn wrap(ctx: &mut Context, direction: Direction, value: &Value) -> JsResult<Value> {
    wrap_with(ctx, direction, value, Policy::Open, None)
}

/// [`wrap`] with an explicit policy and property mocks for a new wrapper.
///
/// If the value already has a wrapper for this direction, asking for a
/// different policy, or for mocks, fails with `FatalError::PolicyConflict`.
pub fn wrap_with(
    ctx: &mut Context,
    direction: Direction,
    value: &Value,
    policy: Policy,
    mocks: Option<MockTable>,
) -> JsResult<Value> {
    match classify(ctx, direction, value)? {
        Classification::Passthrough => Ok(value.clone()),
        Classification::SendHome(original) => {
            trace!(%direction, %original, "wrapper sent home");
            Ok(Value::Object(original))
        }
        Classification::Smuggled(object) => {
            warn!(%direction, %object, "value already belongs to the destination realm");
            Err(FatalError::Smuggling {
                object,
                realm: direction.destination(),
            }
            .into())
        }
        Classification::Cached(wrapper) => {
            let existing = match &ctx.object(wrapper)?.kind {
                ObjectKind::Wrapper(w) => Some(w.policy),
                _ => None,
            };
            // Mocks only ever apply to the wrapper they were created with.
            let conflicting = match existing {
                Some(existing_policy) => {
                    mocks.is_some() || (policy != Policy::Open && policy != existing_policy)
                }
                None => false,
            };
            if conflicting {
                let object = value.as_object().unwrap_or(wrapper);
                return Err(FatalError::PolicyConflict { object }.into());
            }
            trace!(%direction, %wrapper, "identity cache hit");
            Ok(Value::Object(wrapper))
        }
        Classification::Intrinsic(counterpart) => Ok(Value::Object(counterpart)),
        Classification::Boxed(original, primitive) => {
            let realm = direction.destination();
            let proto = ctx.builtins().prototype(realm, primitive.builtin());
            let boxed = ctx.alloc(realm, Some(proto), ObjectKind::Boxed(primitive));
            ctx.cache.remember(direction, original, boxed);
            Ok(Value::Object(boxed))
        }
        Classification::Wrap(original, flavor) => {
            let mocks = mocks.map(Rc::new);
            let id = wrapper::create(ctx, direction, original, flavor, policy, mocks);
            Ok(Value::Object(id))
        }
    }
}

/// Wrap a thrown value.
///
/// Values already owned by the destination realm are rethrown as they are,
/// which makes re-sanitising a caught exception a no-op.
pub fn wrap_thrown(ctx: &mut Context, direction: Direction, value: &Value) -> JsResult<Value> {
    if ctx.realm_of(value)? == Some(direction.destination()) {
        return Ok(value.clone());
    }
    wrap(ctx, direction, value)
}

/// The original behind a wrapper created for `direction`, if `value` is one.
pub fn original_of(ctx: &Context, direction: Direction, value: &Value) -> Option<Value> {
    let id = value.as_object()?;
    ctx.cache.original_for(direction, id).map(Value::Object)
}

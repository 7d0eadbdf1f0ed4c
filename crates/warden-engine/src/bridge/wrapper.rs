//! Wrapper objects.

use super::{Direction, Policy};
use crate::realm::{Builtin, Context, ObjectId, ObjectKind, PropertyKey, Value};
use std::fmt;
use std::rc::Rc;
use tracing::debug;

/// Property values answered by a wrapper before it consults its original.
/// Values belong to the original's realm.
pub type MockTable = Vec<(PropertyKey, Value)>;

/// Fixed hook sets a wrapper can have.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Flavor {
    /// Plain object.
    Object,
    /// Callable; adds call and construct interception.
    Function,
    /// Built-in instance; constructor and prototype pinned to the
    /// destination realm's built-in.
    Instance(Builtin),
    /// The buffer constructor; numeric allocations are zero-filled.
    BufferConstructor,
}

impl Flavor {
    pub fn is_callable(self) -> bool {
        matches!(self, Flavor::Function | Flavor::BufferConstructor)
    }
}

impl fmt::Display for Flavor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Flavor::Object => f.write_str("object"),
            Flavor::Function => f.write_str("function"),
            Flavor::Instance(b) => write!(f, "instance({})", b.name()),
            Flavor::BufferConstructor => f.write_str("buffer-constructor"),
        }
    }
}

/// State of a wrapper object. The original is only reachable through the
/// bridge, never handed to the observing realm.
#[derive(Debug, Clone)]
pub struct Wrapper {
    pub(crate) target: ObjectId,
    pub direction: Direction,
    pub flavor: Flavor,
    pub policy: Policy,
    pub(crate) mocks: Option<Rc<MockTable>>,
}

impl Wrapper {
    pub fn mock(&self, key: &PropertyKey) -> Option<&Value> {
        self.mocks
            .as_deref()?
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v)
    }

    pub(crate) fn trace(&self, out: &mut Vec<ObjectId>) {
        out.push(self.target);
        if let Some(mocks) = &self.mocks {
            out.extend(mocks.iter().filter_map(|(_, v)| v.as_object()));
        }
    }
}

/// Prototype a wrapper reports, in the destination realm.
pub(crate) fn pinned_prototype(ctx: &Context, direction: Direction, flavor: Flavor) -> ObjectId {
    let realm = direction.destination();
    let builtin = match flavor {
        Flavor::Object => Builtin::Object,
        Flavor::Function | Flavor::BufferConstructor => Builtin::Function,
        Flavor::Instance(b) => b,
    };
    ctx.builtins().prototype(realm, builtin)
}

/// Allocate a wrapper for `target` and record it in the identity cache.
pub(crate) fn create(
    ctx: &mut Context,
    direction: Direction,
    target: ObjectId,
    flavor: Flavor,
    policy: Policy,
    mocks: Option<Rc<MockTable>>,
) -> ObjectId {
    let proto = pinned_prototype(ctx, direction, flavor);
    let wrapper = Wrapper {
        target,
        direction,
        flavor,
        policy,
        mocks,
    };
    let id = ctx.alloc(
        direction.destination(),
        Some(proto),
        ObjectKind::Wrapper(Box::new(wrapper)),
    );
    ctx.cache.remember(direction, target, id);
    debug!(%direction, %flavor, ?policy, %target, wrapper = %id, "created wrapper");
    id
}

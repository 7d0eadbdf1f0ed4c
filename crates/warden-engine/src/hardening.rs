//! Hardened built-ins installed into the guest realm.
//!
//! Each hardening closes one escape route and is installed independently;
//! a [`HardeningSet`] names the ones a sandbox wants.

use crate::bridge::{wrap, Direction};
use crate::realm::{
    Builtin, Context, JsResult, ObjectId, PropertyDescriptor, PropertyKey, RealmId, StackFrame,
    Value,
};
use crate::sanitizer;
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Hardening {
    /// The internal state singleton transformed code calls into.
    InternalState,
    /// `eval` and `Function` refuse to compile strings.
    CodeGenerationDenied,
    /// Call sites passed to `Error.prepareStackTrace` are sanitised.
    ErrorStackTrace,
}

impl Hardening {
    pub const ALL: [Hardening; 3] = [
        Hardening::InternalState,
        Hardening::CodeGenerationDenied,
        Hardening::ErrorStackTrace,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Hardening::InternalState => "internal-state",
            Hardening::CodeGenerationDenied => "code-generation-denied",
            Hardening::ErrorStackTrace => "error-stack-trace",
        }
    }
}

impl fmt::Display for Hardening {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Ordered, duplicate-free set of hardenings. Defaults to all of them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "Vec<Hardening>", into = "Vec<Hardening>")]
pub struct HardeningSet {
    items: Vec<Hardening>,
}

impl HardeningSet {
    pub fn all() -> Self {
        Self::from(Hardening::ALL.to_vec())
    }

    pub fn none() -> Self {
        Self { items: Vec::new() }
    }

    pub fn contains(&self, hardening: Hardening) -> bool {
        self.items.contains(&hardening)
    }

    pub fn insert(&mut self, hardening: Hardening) {
        if let Err(at) = self.items.binary_search(&hardening) {
            self.items.insert(at, hardening);
        }
    }

    pub fn remove(&mut self, hardening: Hardening) {
        self.items.retain(|h| *h != hardening);
    }

    pub fn iter(&self) -> impl Iterator<Item = Hardening> + '_ {
        self.items.iter().copied()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

impl Default for HardeningSet {
    fn default() -> Self {
        Self::all()
    }
}

impl From<Vec<Hardening>> for HardeningSet {
    fn from(mut items: Vec<Hardening>) -> Self {
        items.sort();
        items.dedup();
        Self { items }
    }
}

impl From<HardeningSet> for Vec<Hardening> {
    fn from(set: HardeningSet) -> Self {
        set.items
    }
}

/// Install `set` into the guest realm of `ctx`.
pub fn install(ctx: &mut Context, set: &HardeningSet) -> JsResult<()> {
    for hardening in set.iter() {
        match hardening {
            Hardening::InternalState => {
                sanitizer::install_internal_state(ctx)?;
            }
            Hardening::CodeGenerationDenied => {
                ctx.realm_mut(RealmId::Guest).code_generation = false;
            }
            Hardening::ErrorStackTrace => {
                ctx.realm_mut(RealmId::Guest).sanitize_call_sites = true;
            }
        }
        debug!(%hardening, "installed hardening");
    }
    Ok(())
}

/// Attach a `stack` property to `error` for the engine-produced `frames`.
///
/// If the error's realm has a callable `Error.prepareStackTrace`, it is
/// called with the error and an array of call-site objects, and its result
/// becomes the stack. Call-site objects are built by the engine in the host
/// realm; in a hardened guest realm they reach the hook only through the
/// sanitizer.
pub fn capture_stack_trace(ctx: &mut Context, error: ObjectId, frames: &[StackFrame]) -> JsResult<Value> {
    let realm = ctx.object(error)?.realm;
    let error_ctor = ctx.intrinsics(realm).constructor(Builtin::Error);
    let prepare = ctx.get(error_ctor, &PropertyKey::from("prepareStackTrace"))?;

    let stack = if ctx.is_callable(&prepare) {
        let mut sites = Vec::with_capacity(frames.len());
        for frame in frames {
            let site = call_site(ctx, frame)?;
            let site = if ctx.realm(realm).sanitize_call_sites {
                sanitizer::handle_exception(ctx, &site)?
            } else {
                site
            };
            sites.push(site);
        }
        let sites = ctx.create_array(realm, sites);
        ctx.call(&prepare, &Value::Object(error_ctor), &[Value::Object(error), Value::Object(sites)])?
    } else {
        Value::from(format_stack(ctx, error, frames))
    };

    let desc = PropertyDescriptor {
        value: Some(stack.clone()),
        writable: Some(true),
        enumerable: Some(false),
        configurable: Some(true),
        ..PropertyDescriptor::default()
    };
    ctx.define_property_or_throw(error, &PropertyKey::from("stack"), desc)?;
    Ok(stack)
}

fn call_site(ctx: &mut Context, frame: &StackFrame) -> JsResult<Value> {
    let site = ctx.create_object(RealmId::Host);
    // The receiver may be a guest object; the host-side record holds it
    // the way any host object would.
    let receiver = match ctx.realm_of(&frame.receiver)? {
        Some(RealmId::Guest) => wrap(ctx, Direction::GuestToHost, &frame.receiver)?,
        _ => frame.receiver.clone(),
    };
    let fields = [
        ("functionName", Value::from(frame.function_name.as_str())),
        ("fileName", Value::from(frame.file_name.as_str())),
        ("lineNumber", Value::Number(f64::from(frame.line))),
        ("columnNumber", Value::Number(f64::from(frame.column))),
        ("receiver", receiver),
    ];
    for (name, value) in fields {
        ctx.set_strict(site, &PropertyKey::from(name), value)?;
    }
    Ok(Value::Object(site))
}

fn format_stack(ctx: &Context, error: ObjectId, frames: &[StackFrame]) -> String {
    let mut out = ctx.to_display_string(&Value::Object(error));
    for frame in frames {
        let name = if frame.function_name.is_empty() {
            "<anonymous>"
        } else {
            frame.function_name.as_str()
        };
        out.push_str(&format!(
            "\n    at {} ({}:{}:{})",
            name, frame.file_name, frame.line, frame.column
        ));
    }
    out
}

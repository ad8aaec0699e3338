//! Host objects as scope frames.
//!
//! A [`Record`] answers four questions the stack asks while searching it: is
//! there a callable with this name, call it, is there a property with this name,
//! read it. Callables are asked about first, so a record that has both a callable
//! and a property named `name` resolves `name` by calling.

use core::fmt;
use std::rc::Rc;

use indexmap::IndexMap;

use crate::helper::Helper;
use crate::value::Value;

/// Error a callable member may fail with. It travels out of the lookup untouched.
pub type CallError = Box<dyn core::error::Error + Send + Sync + 'static>;

/// Result of invoking a callable member.
pub type CallResult = Result<Value, CallError>;

/// A host object exposing named properties and callables to template lookups.
pub trait Record: fmt::Debug {
    /// Whether a callable member named `name` exists.
    fn has_callable(&self, name: &str) -> bool;

    /// Invoke the callable member `name`.
    ///
    /// `args` are already resolved. `helper` gives access to the stack the lookup
    /// started from, so the callable can resolve further names where the tag
    /// appears.
    fn call(&self, name: &str, args: &[Value], helper: &Helper<'_>) -> CallResult;

    /// Whether a readable property named `name` exists.
    fn has_property(&self, name: &str) -> bool;

    /// Read the property `name`. Only asked after [`Record::has_property`] said yes.
    fn property(&self, name: &str) -> Option<Value>;

    /// Name used in diagnostics and by [`Value::type_name`].
    fn type_name(&self) -> &str {
        "record"
    }
}

type Method = Rc<dyn Fn(&[Value], &Helper<'_>) -> CallResult>;

/// A [`Record`] assembled from values and closures.
///
/// ```
/// use stache_context::{ContextStack, Object, Value};
///
/// let person = Object::new()
///     .with_property("name", "Mario")
///     .with_method("greet", |args, _| {
///         let whom = args.first().map(Value::render_to_string).unwrap_or_default();
///         Ok(Value::from(format!("hello {whom}")))
///     });
///
/// let stack = ContextStack::with_root(Value::record(person));
/// assert_eq!(stack.lookup("greet(name)")?, Value::from("hello Mario"));
/// # Ok::<(), stache_context::ResolveError>(())
/// ```
#[derive(Clone, Default)]
pub struct Object {
    type_name: Option<String>,
    properties: IndexMap<String, Value>,
    methods: IndexMap<String, Method>,
}

impl Object {
    /// An object with no members.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the name reported by [`Record::type_name`].
    pub fn with_type_name(mut self, name: impl Into<String>) -> Self {
        self.type_name = Some(name.into());
        self
    }

    /// Add (or replace) a property.
    pub fn with_property(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.properties.insert(name.into(), value.into());
        self
    }

    /// Add (or replace) a callable member.
    pub fn with_method<F>(mut self, name: impl Into<String>, f: F) -> Self
    where
        F: Fn(&[Value], &Helper<'_>) -> CallResult + 'static,
    {
        self.methods.insert(name.into(), Rc::new(f));
        self
    }
}

impl Record for Object {
    fn has_callable(&self, name: &str) -> bool {
        self.methods.contains_key(name)
    }

    fn call(&self, name: &str, args: &[Value], helper: &Helper<'_>) -> CallResult {
        match self.methods.get(name) {
            Some(method) => method(args, helper),
            None => Err(format!("{} has no callable `{name}`", self.type_name()).into()),
        }
    }

    fn has_property(&self, name: &str) -> bool {
        self.properties.contains_key(name)
    }

    fn property(&self, name: &str) -> Option<Value> {
        self.properties.get(name).cloned()
    }

    fn type_name(&self) -> &str {
        self.type_name.as_deref().unwrap_or("object")
    }
}

impl fmt::Debug for Object {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut s = f.debug_struct(self.type_name());
        for (name, value) in &self.properties {
            s.field(name, value);
        }
        for name in self.methods.keys() {
            s.field(name, &format_args!("<callable>"));
        }
        s.finish()
    }
}

impl From<Object> for Value {
    fn from(object: Object) -> Self {
        Value::record(object)
    }
}

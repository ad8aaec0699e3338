//! What a callable gets to see of the stack it was invoked on.

use crate::context::ContextStack;
use crate::error::ResolveError;
use crate::value::Value;

/// Handed to every callable member, so it can resolve names where its tag
/// appears.
///
/// ```
/// use stache_context::{ContextStack, Object, Value};
///
/// let mut stack = ContextStack::with_root(Value::from_iter([("planet", "Earth")]));
/// stack.push(Object::new().with_method("hello", |_, helper| {
///     let planet = helper.find("planet")?;
///     Ok(Value::from(format!("hello {}", planet.render_to_string())))
/// }));
///
/// assert_eq!(stack.find("hello")?, Value::from("hello Earth"));
/// # Ok::<(), stache_context::ResolveError>(())
/// ```
#[derive(Debug, Clone, Copy)]
pub struct Helper<'a> {
    stack: &'a ContextStack,
}

impl<'a> Helper<'a> {
    pub(crate) fn new(stack: &'a ContextStack) -> Self {
        Self { stack }
    }

    /// Resolve a tag identifier: `.` for the innermost frame, a dotted path, or
    /// a single name. Not found gives [`Value::absent`].
    pub fn find(&self, tag: &str) -> Result<Value, ResolveError> {
        self.stack.lookup(tag)
    }

    /// Like [`Helper::find`], but `None` when not found.
    pub fn try_find(&self, tag: &str) -> Result<Option<Value>, ResolveError> {
        self.stack.try_lookup(tag)
    }

    /// The innermost frame.
    pub fn last(&self) -> Option<&'a Value> {
        self.stack.peek()
    }

    /// The stack, read only.
    pub fn stack(&self) -> &'a ContextStack {
        self.stack
    }

    /// An owned stack to push onto for a nested render. See
    /// [`ContextStack::derive`].
    pub fn derive(&self) -> ContextStack {
        self.stack.derive()
    }
}

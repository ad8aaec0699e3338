//! The scope stack.

use core::cell::Cell;
use std::rc::Rc;

use tracing::{debug, trace};

use crate::error::ResolveError;
use crate::helper::Helper;
use crate::options::ResolveOptions;
use crate::value::{Frame, Value};

/// The scopes visible where a tag appears, outermost (the root data) first.
///
/// Frames are pushed when a section or iteration opens and popped when it
/// closes. [`ContextStack::find`] searches them innermost first and stops at the
/// first frame that knows the name; nothing is merged across frames.
///
/// A stack belongs to one render. It is not `Send`: frames are shared through
/// `Rc`, so pushing and popping never copies them.
#[derive(Debug, Default)]
pub struct ContextStack {
    frames: Vec<Value>,
    options: ResolveOptions,
    /// Nesting of resolutions and callable invocations, shared with derived stacks.
    depth: Rc<Cell<usize>>,
}

/// Releases one level of the depth budget when dropped.
pub(crate) struct DepthGuard<'a> {
    depth: &'a Cell<usize>,
}

impl Drop for DepthGuard<'_> {
    fn drop(&mut self) {
        self.depth.set(self.depth.get().saturating_sub(1));
    }
}

impl ContextStack {
    /// An empty stack.
    pub fn new() -> Self {
        Self::default()
    }

    /// A stack holding one root frame.
    pub fn with_root(root: impl Into<Value>) -> Self {
        let mut stack = Self::new();
        stack.push(root);
        stack
    }

    /// Replace the resolution settings.
    pub fn with_options(mut self, options: ResolveOptions) -> Self {
        self.options = options;
        self
    }

    /// The resolution settings.
    pub fn options(&self) -> &ResolveOptions {
        &self.options
    }

    /// Enter a new innermost scope. Any value is accepted; scalars simply expose
    /// no members.
    pub fn push(&mut self, frame: impl Into<Value>) {
        let frame = frame.into();
        trace!(depth = self.frames.len() + 1, kind = frame.type_name(), "push");
        self.frames.push(frame);
    }

    /// Leave the innermost scope, returning its frame.
    pub fn pop(&mut self) -> Option<Value> {
        let frame = self.frames.pop();
        trace!(depth = self.frames.len(), popped = frame.is_some(), "pop");
        frame
    }

    /// The innermost frame.
    pub fn peek(&self) -> Option<&Value> {
        self.frames.last()
    }

    /// Same as [`ContextStack::peek`].
    pub fn last(&self) -> Option<&Value> {
        self.peek()
    }

    /// Number of frames.
    pub fn len(&self) -> usize {
        self.frames.len()
    }

    /// Whether no frame has been pushed.
    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    /// All frames, outermost first.
    pub fn frames(&self) -> &[Value] {
        &self.frames
    }

    /// The facade handed to callables invoked on this stack.
    pub fn helper(&self) -> Helper<'_> {
        Helper::new(self)
    }

    /// A new stack with the same frames and settings, for a nested render.
    ///
    /// Frames are shared, not copied. The depth budget is shared too, so
    /// recursion through nested renders still hits
    /// [`ResolveError::DepthExceeded`].
    pub fn derive(&self) -> ContextStack {
        ContextStack {
            frames: self.frames.clone(),
            options: self.options,
            depth: Rc::clone(&self.depth),
        }
    }

    /// Look up a single name, returning [`Value::absent`] when no frame has it.
    pub fn find(&self, id: &str) -> Result<Value, ResolveError> {
        self.find_with(id, &[])
    }

    /// Like [`ContextStack::find`], passing `args` if the name selects a callable.
    pub fn find_with(&self, id: &str, args: &[Value]) -> Result<Value, ResolveError> {
        Ok(self.try_find_with(id, args)?.unwrap_or_else(Value::absent))
    }

    /// Look up a single name, returning `None` when no frame has it.
    pub fn try_find(&self, id: &str) -> Result<Option<Value>, ResolveError> {
        self.try_find_with(id, &[])
    }

    /// Search the frames innermost first.
    ///
    /// In each frame a callable named `id` wins: it is invoked with `args` and
    /// its result returned even if it is empty. Otherwise a property, then a
    /// mapping key (by presence, not truthiness). The first frame that has the
    /// name ends the search.
    pub fn try_find_with(&self, id: &str, args: &[Value]) -> Result<Option<Value>, ResolveError> {
        let helper = self.helper();
        for (index, frame) in self.frames.iter().enumerate().rev() {
            if let Some(value) = search_frame(frame, id, args, &helper)? {
                trace!(id, frame = index, "found");
                return Ok(Some(value));
            }
        }
        debug!(id, frames = self.frames.len(), "not found");
        Ok(None)
    }

    /// Take one level of the depth budget, failing once it is spent.
    pub(crate) fn enter(&self) -> Result<DepthGuard<'_>, ResolveError> {
        let depth = self.depth.get();
        let limit = self.options.max_depth();
        if depth >= limit {
            debug!(depth, limit, "depth limit reached");
            return Err(ResolveError::DepthExceeded { limit });
        }
        self.depth.set(depth + 1);
        Ok(DepthGuard { depth: &self.depth })
    }

    #[cfg(test)]
    pub(crate) fn current_depth(&self) -> usize {
        self.depth.get()
    }
}

/// Look `id` up in one frame only.
///
/// `helper` is what a callable receives; it always wraps the stack the lookup
/// started from, even when `frame` is a value reached by narrowing.
pub(crate) fn search_frame(
    frame: &Value,
    id: &str,
    args: &[Value],
    helper: &Helper<'_>,
) -> Result<Option<Value>, ResolveError> {
    match frame.as_frame() {
        None => Ok(None),
        Some(Frame::Record(record)) => {
            if record.has_callable(id) {
                let _guard = helper.stack().enter()?;
                trace!(id, args = args.len(), "call");
                return record
                    .call(id, args, helper)
                    .map(Some)
                    .map_err(|source| ResolveError::from_call(id, source));
            }
            if record.has_property(id) {
                if let Some(value) = record.property(id) {
                    return Ok(Some(value));
                }
            }
            Ok(None)
        }
        Some(Frame::Mapping(map)) => Ok(map.get(id).cloned()),
        Some(Frame::Sequence(items)) => Ok(index_key(id).and_then(|i| items.get(i)).cloned()),
    }
}

/// `"0"`, `"1"`, ... but not `"01"` or `"+1"`.
fn index_key(id: &str) -> Option<usize> {
    let canonical = !id.is_empty()
        && id.bytes().all(|b| b.is_ascii_digit())
        && (id == "0" || !id.starts_with('0'));
    if canonical { id.parse().ok() } else { None }
}

//! Evaluating parsed paths against a stack.
//!
//! The first segment is looked up in the whole stack. Every later segment is
//! looked up only inside the value reached so far: once `a` is found, `a.b`
//! never searches the frames around `a`. Call arguments do not narrow. They
//! are resolved against the whole stack for every segment, where the tag
//! appears.

use tracing::{debug, trace};

use crate::context::{ContextStack, search_frame};
use crate::error::ResolveError;
use crate::helper::Helper;
use crate::path::{Arg, Path, Segment};
use crate::value::Value;

impl ContextStack {
    /// Resolve a parsed path, returning [`Value::absent`] when any segment is
    /// missing.
    pub fn resolve(&self, path: &Path) -> Result<Value, ResolveError> {
        Ok(self.try_resolve(path)?.unwrap_or_else(Value::absent))
    }

    /// Resolve a parsed path, returning `None` when any segment is missing.
    ///
    /// `.` yields the innermost frame itself, sharing its identity.
    pub fn try_resolve(&self, path: &Path) -> Result<Option<Value>, ResolveError> {
        let _guard = self.enter()?;
        let helper = self.helper();

        let segments = match path {
            Path::Current => return Ok(self.peek().cloned()),
            Path::Segments(segments) => segments,
        };
        let Some((first, rest)) = segments.split_first() else {
            return Ok(None);
        };

        let Some(mut value) = resolve_in_stack(self, first, &helper)? else {
            return Ok(None);
        };
        for (index, segment) in rest.iter().enumerate() {
            match resolve_in_frame(&value, segment, &helper)? {
                Some(next) => {
                    trace!(id = %segment.name, segment = index + 1, "narrowed");
                    value = next;
                }
                None => {
                    debug!(%path, segment = index + 1, "path stops here");
                    return Ok(None);
                }
            }
        }
        Ok(Some(value))
    }

    /// Parse `tag` and resolve it. Not found gives [`Value::absent`].
    pub fn lookup(&self, tag: &str) -> Result<Value, ResolveError> {
        let path = Path::parse(tag)?;
        self.resolve(&path)
    }

    /// Parse `tag` and resolve it. Not found gives `None`.
    pub fn try_lookup(&self, tag: &str) -> Result<Option<Value>, ResolveError> {
        let path = Path::parse(tag)?;
        self.try_resolve(&path)
    }
}

/// The first segment: searched in every frame, innermost first.
fn resolve_in_stack(
    stack: &ContextStack,
    segment: &Segment,
    helper: &Helper<'_>,
) -> Result<Option<Value>, ResolveError> {
    let args = resolve_args(segment.args(), helper)?;
    stack.try_find_with(&segment.name, &args)
}

/// A later segment: searched in the value reached so far and nowhere else.
fn resolve_in_frame(
    frame: &Value,
    segment: &Segment,
    helper: &Helper<'_>,
) -> Result<Option<Value>, ResolveError> {
    let args = resolve_args(segment.args(), helper)?;
    search_frame(frame, &segment.name, &args, helper)
}

/// Evaluate call arguments against the whole stack. Missing names are passed
/// as [`Value::absent`].
fn resolve_args(args: &[Arg], helper: &Helper<'_>) -> Result<Vec<Value>, ResolveError> {
    args.iter()
        .map(|arg| match arg {
            Arg::Literal(value) => Ok(value.clone()),
            Arg::Path(path) => helper.stack().resolve(path),
            Arg::List(items) => resolve_args(items, helper).map(Value::from),
        })
        .collect()
}

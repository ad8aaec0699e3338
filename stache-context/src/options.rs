//! Resolution settings.

/// Default for [`ResolveOptions::max_depth`].
pub const DEFAULT_MAX_DEPTH: usize = 64;

/// Settings carried by a [`ContextStack`](crate::ContextStack).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResolveOptions {
    max_depth: usize,
}

impl Default for ResolveOptions {
    fn default() -> Self {
        Self {
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }
}

impl ResolveOptions {
    /// Options with default settings.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set how deeply path resolutions and callable invocations may nest on one
    /// stack (including stacks derived from it) before failing with
    /// [`ResolveError::DepthExceeded`](crate::ResolveError::DepthExceeded).
    pub fn with_max_depth(mut self, depth: usize) -> Self {
        self.max_depth = depth;
        self
    }

    /// The nesting limit.
    pub fn max_depth(&self) -> usize {
        self.max_depth
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_options_default() {
        let options = ResolveOptions::default();
        assert_eq!(options.max_depth, DEFAULT_MAX_DEPTH);
    }

    #[test]
    fn test_options_with_methods() {
        let options = ResolveOptions::new().with_max_depth(3);
        assert_eq!(options.max_depth(), 3);
    }
}

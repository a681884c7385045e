use std::fmt;

use crate::scanner::{DefaultFragmentHook, FragmentHook};

/// Default nesting limit for expressions, statements, and declarations.
pub const DEFAULT_MAX_DEPTH: usize = 256;

static DEFAULT_HOOK: DefaultFragmentHook = DefaultFragmentHook;

/// Parser configuration.
///
/// ```
/// use greycat_syntax::ParseOptions;
///
/// let opts = ParseOptions::new().max_depth(64);
/// assert_eq!(opts.depth_limit(), 64);
/// ```
#[derive(Clone, Copy)]
pub struct ParseOptions<'h> {
    max_depth: usize,
    hook: &'h dyn FragmentHook,
}

impl ParseOptions<'static> {
    #[must_use]
    pub fn new() -> Self {
        Self {
            max_depth: DEFAULT_MAX_DEPTH,
            hook: &DEFAULT_HOOK,
        }
    }
}

impl Default for ParseOptions<'static> {
    fn default() -> Self {
        Self::new()
    }
}

impl<'h> ParseOptions<'h> {
    /// Set the nesting limit. Deeper input yields a
    /// `RecursionLimitExceeded` diagnostic.
    #[must_use]
    pub const fn max_depth(mut self, depth: usize) -> Self {
        self.max_depth = depth;
        self
    }

    /// Replace the hook that splits string literals into fragments.
    #[must_use]
    pub fn fragment_hook<'a>(self, hook: &'a dyn FragmentHook) -> ParseOptions<'a> {
        ParseOptions {
            max_depth: self.max_depth,
            hook,
        }
    }

    #[must_use]
    pub const fn depth_limit(&self) -> usize {
        self.max_depth
    }

    #[must_use]
    pub fn hook(&self) -> &'h dyn FragmentHook {
        self.hook
    }
}

impl fmt::Debug for ParseOptions<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ParseOptions")
            .field("max_depth", &self.max_depth)
            .finish_non_exhaustive()
    }
}

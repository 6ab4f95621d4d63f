//! Mixin types for structures.
//!
//! - [`SourceRangeMixin`] attaches a byte range of the source text to a value.
//! - [`SourceRangeMixinExt`] provides extension methods to wrap any value into it.

use std::ops::Range;

/// A generic wrapper that attaches a byte range of the source text to a value.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SourceRangeMixin<T> {
    content: T,
    range: Range<usize>,
}

impl<T> SourceRangeMixin<T> {
    /// Instances a new `SourceRangeMixin`.
    pub const fn new(content: T, range: Range<usize>) -> Self {
        Self { content, range }
    }

    /// Returns the wrapped content.
    pub const fn content(&self) -> &T {
        &self.content
    }

    /// Leans the content out of the wrapper.
    pub fn into_content(self) -> T {
        self.content
    }

    /// Returns the byte range in the source.
    pub fn range(&self) -> Range<usize> {
        self.range.clone()
    }

    /// Returns the start index of the source span.
    pub const fn start(&self) -> usize {
        self.range.start
    }

    /// Returns the end index of the source span.
    pub const fn end(&self) -> usize {
        self.range.end
    }

    /// Maps the content of the wrapper, keeping the range.
    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> SourceRangeMixin<U> {
        SourceRangeMixin::new(f(self.content), self.range)
    }
}

impl<T: std::fmt::Display> std::fmt::Display for SourceRangeMixin<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} at indices [{}, {})",
            self.content, self.range.start, self.range.end
        )
    }
}

/// Extension methods for wrapping values into [`SourceRangeMixin`].
pub trait SourceRangeMixinExt {
    /// Instances a new `SourceRangeMixin` with the given range.
    fn into_wrapper_range(self, range: Range<usize>) -> SourceRangeMixin<Self>
    where
        Self: Sized,
    {
        SourceRangeMixin::new(self, range)
    }

    /// Instances a new `SourceRangeMixin` with the same range as another wrapper.
    fn into_wrapper<W>(self, wrapper: &SourceRangeMixin<W>) -> SourceRangeMixin<Self>
    where
        Self: Sized,
    {
        SourceRangeMixin::new(self, wrapper.range())
    }
}

impl<T> SourceRangeMixinExt for T {}

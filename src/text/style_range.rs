//! Styled character ranges.

use crate::style::TextStyle;
use std::ops::Range;
use std::sync::Arc;

/// A character range with an associated style.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StyleRange {
    /// First char offset.
    pub start: usize,
    /// Length in chars.
    pub length: usize,
    /// Style applied to the range.
    pub style: Arc<TextStyle>,
}

impl StyleRange {
    /// Create a new style range.
    #[must_use]
    pub fn new(start: usize, length: usize, style: TextStyle) -> Self {
        Self {
            start,
            length,
            style: Arc::new(style),
        }
    }

    /// Create a range sharing an existing style instance.
    #[must_use]
    pub fn shared(start: usize, length: usize, style: Arc<TextStyle>) -> Self {
        Self {
            start,
            length,
            style,
        }
    }

    /// Exclusive end offset.
    #[must_use]
    pub fn end(&self) -> usize {
        self.start + self.length
    }

    /// The covered chars as a `Range`.
    #[must_use]
    pub fn range(&self) -> Range<usize> {
        self.start..self.end()
    }

    /// Check if this range overlaps with another.
    #[must_use]
    pub fn overlaps(&self, other: &Self) -> bool {
        self.start < other.end() && other.start < self.end()
    }

    /// Check if this range contains an offset.
    #[must_use]
    pub fn contains(&self, offset: usize) -> bool {
        self.range().contains(&offset)
    }

    /// Check if empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.length == 0
    }

    /// Two ranges are similar when their styles are, regardless of position.
    #[must_use]
    pub fn similar_to(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.style, &other.style) || self.style.similar_to(&other.style)
    }
}

/// A run of text with either a style or no style at all.
///
/// Runs returned by [`StyleIndex::runs`](super::StyleIndex::runs) tile the
/// queried window without gaps.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StyleRun {
    pub range: Range<usize>,
    pub style: Option<Arc<TextStyle>>,
}

impl StyleRun {
    /// Length in chars.
    #[must_use]
    pub fn len(&self) -> usize {
        self.range.len()
    }

    /// Check if empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.range.is_empty()
    }
}

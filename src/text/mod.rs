//! Styled text storage, measurement and layout caching.
//!
//! The renderer keeps several structures derived from the text consistent as
//! it is edited:
//!
//! - [`StyleIndex`]: disjoint char ranges mapped to interned styles
//! - [`LineMetrics`]: cached width and height per line with an average-height
//!   estimate for unmeasured lines
//! - [`LayoutCache`]: shaped layouts for a window of lines around the viewport
//! - [`MarkerTracker`]: per-line decorations such as bullets and numbering
//! - [`LineFormats`]: per-line paragraph attributes
//!
//! [`StyledTextRenderer`] coordinates them; [`StyledText`] pairs it with a
//! rope so that edits can't bypass it.
//!
//! # Examples
//!
//! ```
//! use styledtext_rust::{StyledText, TextStyle};
//!
//! let mut text = StyledText::default();
//! text.set_text("Hello world");
//! text.set_style_range(0, 5, &TextStyle::bold()).unwrap();
//! text.set_style_range(6, 5, &TextStyle::bold()).unwrap();
//! assert_eq!(text.style_ranges(0, 11).unwrap().len(), 2);
//!
//! // Styling the gap merges everything into one range.
//! text.set_style_range(5, 1, &TextStyle::bold()).unwrap();
//! let ranges = text.style_ranges(0, 11).unwrap();
//! assert_eq!(ranges.len(), 1);
//! assert_eq!(ranges[0].range(), 0..11);
//! ```

mod content;
mod layout_cache;
mod line_format;
mod markers;
mod metrics;
mod renderer;
mod shaper;
mod style_index;
mod style_range;
mod styled_text;

pub use content::{RopeContent, TextChange, TextContent, count_line_breaks};
pub use layout_cache::{CachedLayout, LayoutCache};
pub use line_format::{LineFormat, LineFormats};
pub use markers::{
    LineMarker, Marker, MarkerBacking, MarkerKind, MarkerRef, MarkerSets, MarkerStore,
    MarkerTracker, PerLineMarkers,
};
pub use metrics::{IdleFill, IdleStatus, LineMetrics, LineSize};
pub use renderer::{
    DEFAULT_CACHE_SIZE, DEFAULT_IDLE_BUDGET, DrawLine, DrawTarget, LayoutStats,
    LineSpacingProvider, RenderConfig, StyledTextRenderer,
};
pub use shaper::{
    Alignment, Bounds, FontMetrics, FormatOptions, MonospaceLayout, MonospaceShaper,
    ShapedLayout, TextDirection, TextShaper, VisualLine,
};
pub use style_index::{InsertPolicy, StyleIndex};
pub use style_range::{StyleRange, StyleRun};
pub use styled_text::StyledText;

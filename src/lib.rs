//! `styledtext_rust` - Styled text rendering engine
//!
//! Keeps per-character styles, per-line metrics, per-line markers and a
//! window of shaped line layouts consistent with long, mutable text, so a
//! host can redraw only what an edit or scroll actually changed.

// Crate-level lint configuration
#![forbid(unsafe_code)]
#![allow(clippy::cast_possible_truncation)] // Pixel and offset casts are bounded
#![allow(clippy::cast_sign_loss)] // Signed deltas are applied to checked indices
#![allow(clippy::cast_precision_loss)] // Average height is an estimate
#![allow(clippy::cast_possible_wrap)] // Line indices fit in isize
#![allow(clippy::module_name_repetitions)] // Allow text::TextContent etc
#![allow(clippy::missing_errors_doc)] // Docs WIP
#![allow(clippy::missing_panics_doc)] // Docs WIP
#![allow(clippy::missing_const_for_fn)] // Many functions could be const, not critical
#![allow(clippy::doc_markdown)] // Allow technical names without backticks
#![allow(clippy::use_self)] // Allow explicit type names in impl blocks
#![allow(clippy::needless_pass_by_value)] // Allow pass by value for small Copy types
#![allow(clippy::should_implement_trait)] // from_str naming is intentional
#![allow(clippy::collapsible_if)] // Sometimes nested ifs are clearer
#![allow(clippy::cast_lossless)] // as casts are fine for primitive widening
#![allow(clippy::items_after_statements)] // Common pattern in tests
#![allow(clippy::semicolon_if_nothing_returned)] // Style preference

pub mod color;
pub mod error;
pub mod event;
pub mod style;
pub mod text;
pub mod unicode;

// Re-export core types at crate root
pub use color::Rgba;
pub use error::{Error, Result};
pub use event::{
    EVENT_IDLE_FILL_COMPLETE, EVENT_MARKERS_REMOVED, LogLevel, emit_event, emit_log,
    set_event_callback, set_log_callback,
};
pub use style::{FontDescriptor, FontStyle, GlyphMetrics, StyleBuilder, TextStyle, UnderlineStyle};

// Re-export the engine
pub use text::{
    Alignment, DrawLine, DrawTarget, FontMetrics, FormatOptions, IdleFill, IdleStatus,
    InsertPolicy, LayoutCache, LineFormats, LineMarker, LineMetrics, Marker, MarkerKind,
    MarkerRef, MarkerTracker, MonospaceLayout, MonospaceShaper, RenderConfig, RopeContent,
    ShapedLayout, StyleIndex, StyleRange, StyleRun, StyledText, StyledTextRenderer, TextChange,
    TextContent, TextDirection, TextShaper,
};
pub use unicode::WidthMethod;

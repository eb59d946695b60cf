//! Text style attribute sets.
//!
//! This module provides the immutable attribute bundle applied to character
//! ranges:
//!
//! - [`FontStyle`]: Bitflags for bold and italic font selection
//! - [`TextStyle`]: Fonts, colors, decorations, glyph metrics and rise
//! - [`StyleBuilder`]: Fluent builder for constructing styles
//!
//! # Examples
//!
//! ```
//! use styledtext_rust::{Rgba, TextStyle, UnderlineStyle};
//!
//! let keyword = TextStyle::builder()
//!     .fg(Rgba::BLUE)
//!     .bold()
//!     .build();
//!
//! let link = TextStyle::underline(UnderlineStyle::Link);
//! assert!(link.is_link());
//! assert!(!keyword.is_variable_height());
//! ```

use crate::color::Rgba;
use bitflags::bitflags;
use std::sync::Arc;

bitflags! {
    /// Font style selection (bold, italic).
    #[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Hash)]
    pub struct FontStyle: u8 {
        /// Bold weight.
        const BOLD   = 0x01;
        /// Italic slant.
        const ITALIC = 0x02;
    }
}

/// Underline decoration kind.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum UnderlineStyle {
    Single,
    Double,
    /// Squiggly error marker.
    Error,
    Squiggle,
    /// Hyperlink underline; marks the range as clickable.
    Link,
}

/// Explicit font selection for a range.
///
/// Setting a font on a style makes every line it touches variable height.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct FontDescriptor {
    pub family: Arc<str>,
    /// Size in points.
    pub size: u16,
    pub style: FontStyle,
}

impl FontDescriptor {
    /// Create a font descriptor.
    #[must_use]
    pub fn new(family: &str, size: u16, style: FontStyle) -> Self {
        Self {
            family: Arc::from(family),
            size,
            style,
        }
    }
}

/// Glyph metrics override for inline objects (images, embedded widgets).
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct GlyphMetrics {
    pub ascent: u32,
    pub descent: u32,
    pub width: u32,
}

impl GlyphMetrics {
    /// Create glyph metrics.
    #[must_use]
    pub const fn new(ascent: u32, descent: u32, width: u32) -> Self {
        Self {
            ascent,
            descent,
            width,
        }
    }
}

/// Immutable bundle of visual text attributes.
///
/// A `TextStyle` carries no range; ranges live in
/// [`StyleRange`](crate::text::StyleRange). Two styles are *similar* when all
/// their fields are equal, which is exactly `==`.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct TextStyle {
    /// Explicit font (None = renderer default font).
    pub font: Option<FontDescriptor>,
    /// Style applied to the default font when `font` is None.
    pub font_style: FontStyle,
    /// Foreground color (None = widget foreground).
    pub fg: Option<Rgba>,
    /// Background color (None = widget background).
    pub bg: Option<Rgba>,
    pub underline: Option<UnderlineStyle>,
    pub underline_color: Option<Rgba>,
    pub strikeout: bool,
    pub strikeout_color: Option<Rgba>,
    /// Glyph metrics override for inline objects.
    pub metrics: Option<GlyphMetrics>,
    /// Baseline offset in pixels (positive = raised).
    pub rise: i32,
}

impl TextStyle {
    /// Empty style with no attributes.
    pub const NONE: Self = Self {
        font: None,
        font_style: FontStyle::empty(),
        fg: None,
        bg: None,
        underline: None,
        underline_color: None,
        strikeout: false,
        strikeout_color: None,
        metrics: None,
        rise: 0,
    };

    /// Create a new style builder.
    #[must_use]
    pub fn builder() -> StyleBuilder {
        StyleBuilder::default()
    }

    /// Create a style with only a foreground color.
    #[must_use]
    pub const fn fg(color: Rgba) -> Self {
        Self {
            fg: Some(color),
            ..Self::NONE
        }
    }

    /// Create a style with only a background color.
    #[must_use]
    pub const fn bg(color: Rgba) -> Self {
        Self {
            bg: Some(color),
            ..Self::NONE
        }
    }

    /// Create a bold style.
    #[must_use]
    pub const fn bold() -> Self {
        Self {
            font_style: FontStyle::BOLD,
            ..Self::NONE
        }
    }

    /// Create an italic style.
    #[must_use]
    pub const fn italic() -> Self {
        Self {
            font_style: FontStyle::ITALIC,
            ..Self::NONE
        }
    }

    /// Create an underlined style.
    #[must_use]
    pub const fn underline(kind: UnderlineStyle) -> Self {
        Self {
            underline: Some(kind),
            ..Self::NONE
        }
    }

    /// Create a style carrying glyph metrics for an inline object.
    #[must_use]
    pub const fn with_metrics(metrics: GlyphMetrics) -> Self {
        Self {
            metrics: Some(metrics),
            ..Self::NONE
        }
    }

    /// Return a new style with the specified foreground color.
    #[must_use]
    pub fn with_fg(self, color: Rgba) -> Self {
        Self {
            fg: Some(color),
            ..self
        }
    }

    /// Return a new style with the specified background color.
    #[must_use]
    pub fn with_bg(self, color: Rgba) -> Self {
        Self {
            bg: Some(color),
            ..self
        }
    }

    /// Return a new style with the specified rise.
    #[must_use]
    pub fn with_rise(self, rise: i32) -> Self {
        Self { rise, ..self }
    }

    /// Return a new style using an explicit font.
    #[must_use]
    pub fn with_font(self, font: FontDescriptor) -> Self {
        Self {
            font: Some(font),
            ..self
        }
    }

    /// Two styles are similar when every attribute matches.
    #[must_use]
    pub fn similar_to(&self, other: &Self) -> bool {
        self == other
    }

    /// Check if the style changes line height and forces full layout.
    #[must_use]
    pub fn is_variable_height(&self) -> bool {
        self.font.is_some()
            || self
                .metrics
                .is_some_and(|m| m.ascent != 0 || m.descent != 0)
            || self.rise != 0
    }

    /// Check if the style has no attributes at all.
    #[must_use]
    pub fn is_unstyled(&self) -> bool {
        *self == Self::NONE
    }

    /// Check if the style marks a hyperlink.
    #[must_use]
    pub fn is_link(&self) -> bool {
        self.underline == Some(UnderlineStyle::Link)
    }
}

/// Builder for creating styles fluently.
#[derive(Clone, Debug, Default)]
pub struct StyleBuilder {
    style: TextStyle,
}

impl StyleBuilder {
    /// Set foreground color.
    #[must_use]
    pub fn fg(mut self, color: Rgba) -> Self {
        self.style.fg = Some(color);
        self
    }

    /// Set background color.
    #[must_use]
    pub fn bg(mut self, color: Rgba) -> Self {
        self.style.bg = Some(color);
        self
    }

    /// Add bold.
    #[must_use]
    pub fn bold(mut self) -> Self {
        self.style.font_style |= FontStyle::BOLD;
        self
    }

    /// Add italic.
    #[must_use]
    pub fn italic(mut self) -> Self {
        self.style.font_style |= FontStyle::ITALIC;
        self
    }

    /// Set underline kind and optional color.
    #[must_use]
    pub fn underline(mut self, kind: UnderlineStyle, color: Option<Rgba>) -> Self {
        self.style.underline = Some(kind);
        self.style.underline_color = color;
        self
    }

    /// Add strikeout with optional color.
    #[must_use]
    pub fn strikeout(mut self, color: Option<Rgba>) -> Self {
        self.style.strikeout = true;
        self.style.strikeout_color = color;
        self
    }

    /// Set an explicit font.
    #[must_use]
    pub fn font(mut self, font: FontDescriptor) -> Self {
        self.style.font = Some(font);
        self
    }

    /// Set glyph metrics.
    #[must_use]
    pub fn metrics(mut self, metrics: GlyphMetrics) -> Self {
        self.style.metrics = Some(metrics);
        self
    }

    /// Set rise.
    #[must_use]
    pub fn rise(mut self, rise: i32) -> Self {
        self.style.rise = rise;
        self
    }

    /// Build the final style.
    #[must_use]
    pub fn build(self) -> TextStyle {
        self.style
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_style_builder() {
        let style = TextStyle::builder()
            .fg(Rgba::RED)
            .bg(Rgba::BLACK)
            .bold()
            .underline(UnderlineStyle::Single, None)
            .build();

        assert_eq!(style.fg, Some(Rgba::RED));
        assert_eq!(style.bg, Some(Rgba::BLACK));
        assert!(style.font_style.contains(FontStyle::BOLD));
        assert_eq!(style.underline, Some(UnderlineStyle::Single));
    }

    #[test]
    fn test_similarity_is_field_equality() {
        let a = TextStyle::bold().with_fg(Rgba::RED);
        let b = TextStyle::builder().bold().fg(Rgba::RED).build();
        assert!(a.similar_to(&b));
        assert!(!a.similar_to(&TextStyle::bold()));
    }

    #[test]
    fn test_variable_height_detection() {
        assert!(!TextStyle::bold().is_variable_height());
        assert!(TextStyle::NONE.with_rise(3).is_variable_height());
        assert!(
            TextStyle::NONE
                .with_font(FontDescriptor::new("Serif", 14, FontStyle::empty()))
                .is_variable_height()
        );
        // Width-only metrics keep the fixed line height.
        assert!(!TextStyle::with_metrics(GlyphMetrics::new(0, 0, 20)).is_variable_height());
        assert!(TextStyle::with_metrics(GlyphMetrics::new(30, 4, 20)).is_variable_height());
    }

    #[test]
    fn test_unstyled_and_link() {
        assert!(TextStyle::NONE.is_unstyled());
        assert!(TextStyle::default().is_unstyled());
        assert!(!TextStyle::italic().is_unstyled());
        assert!(TextStyle::underline(UnderlineStyle::Link).is_link());
        assert!(!TextStyle::underline(UnderlineStyle::Single).is_link());
    }
}

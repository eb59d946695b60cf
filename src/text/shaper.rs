//! Measurement primitive interface and the monospace reference shaper.
//!
//! The renderer never measures glyphs itself. It hands one line of text, the
//! style runs covering it and the resolved [`FormatOptions`] to a
//! [`TextShaper`] and keeps the returned [`ShapedLayout`] in its cache.
//!
//! [`MonospaceShaper`] lays text out on a cell grid: every column is
//! `cell_width` pixels wide, wide graphemes take two columns, and word wrap
//! breaks after whitespace the same way a terminal view does. Custom fonts only
//! change the vertical metrics of the glyphs they cover.

use super::style_range::StyleRun;
use crate::error::{Error, Result};
use crate::style::TextStyle;
use crate::unicode::{Direction, WidthMethod, base_direction, grapheme_info};
use std::ops::Range;

/// Horizontal alignment of a line inside the wrap width.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum Alignment {
    #[default]
    Left,
    Center,
    Right,
}

/// Paragraph direction.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum TextDirection {
    #[default]
    LeftToRight,
    RightToLeft,
    /// Use the direction of the first strong character.
    Auto,
}

/// Ascent and descent of the renderer's default font.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct FontMetrics {
    pub ascent: u32,
    pub descent: u32,
}

impl FontMetrics {
    /// Create font metrics.
    #[must_use]
    pub const fn new(ascent: u32, descent: u32) -> Self {
        Self { ascent, descent }
    }

    /// Height of a line of default text.
    #[must_use]
    pub const fn height(self) -> u32 {
        self.ascent + self.descent
    }
}

/// Everything a shaper needs besides the text and its runs.
///
/// Layouts are only reused while the options they were built with are
/// unchanged.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct FormatOptions {
    pub alignment: Alignment,
    pub justify: bool,
    /// Indent of the first visual line in pixels.
    pub indent: u32,
    /// Indent of wrapped continuation lines in pixels.
    pub wrap_indent: u32,
    /// Extra space above the line in pixels.
    pub vertical_indent: u32,
    /// Tab stop positions in pixels; the last interval repeats.
    pub tab_stops: Vec<u32>,
    /// Wrap width in pixels; `None` disables wrapping.
    pub wrap_width: Option<u32>,
    pub direction: TextDirection,
    /// Extra space below every visual line in pixels.
    pub line_spacing: u32,
    pub font: FontMetrics,
}

/// Size of a shaped layout.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Bounds {
    pub width: u32,
    pub height: u32,
}

/// A shaped, measurable line.
pub trait ShapedLayout {
    /// Size of the whole layout, including vertical indent.
    fn bounds(&self) -> Bounds;

    /// Number of visual lines after wrapping.
    fn line_count(&self) -> usize;

    /// Release the layout. Consuming `self` makes double release impossible.
    fn dispose(self)
    where
        Self: Sized;
}

/// Builds layouts for single lines of text.
pub trait TextShaper {
    type Layout: ShapedLayout;

    /// Metrics of the default font.
    fn default_metrics(&self) -> FontMetrics;

    /// Shape `text`, with `runs` given as char ranges relative to its start.
    ///
    /// Runs must be ascending, non-overlapping and inside the text.
    fn shape(&mut self, text: &str, runs: &[StyleRun], options: &FormatOptions)
    -> Result<Self::Layout>;
}

/// Reference shaper measuring text on a fixed cell grid.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct MonospaceShaper {
    pub cell_width: u32,
    pub cell_height: u32,
    pub width_method: WidthMethod,
}

impl Default for MonospaceShaper {
    fn default() -> Self {
        Self {
            cell_width: 8,
            cell_height: 16,
            width_method: WidthMethod::default(),
        }
    }
}

impl MonospaceShaper {
    /// Create a shaper with the given cell size.
    #[must_use]
    pub fn new(cell_width: u32, cell_height: u32) -> Self {
        Self {
            cell_width,
            cell_height,
            ..Self::default()
        }
    }

    /// Set the grapheme width method.
    #[must_use]
    pub fn width_method(mut self, method: WidthMethod) -> Self {
        self.width_method = method;
        self
    }
}

/// One visual line of a [`MonospaceLayout`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct VisualLine {
    /// Chars covered, relative to the start of the source line.
    pub chars: Range<usize>,
    /// Left edge of the text including indent and alignment.
    pub x: u32,
    /// Width of the text without indent.
    pub width: u32,
    /// Top edge relative to the layout.
    pub y: u32,
    pub ascent: u32,
    pub descent: u32,
}

/// Layout produced by [`MonospaceShaper`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MonospaceLayout {
    text: String,
    lines: Vec<VisualLine>,
    bounds: Bounds,
    direction: Direction,
    justify: bool,
}

impl MonospaceLayout {
    /// Text the layout was shaped from.
    #[must_use]
    pub fn text(&self) -> &str {
        &self.text
    }

    /// Visual lines in top to bottom order.
    #[must_use]
    pub fn visual_lines(&self) -> &[VisualLine] {
        &self.lines
    }

    /// Resolved paragraph direction.
    #[must_use]
    pub fn direction(&self) -> Direction {
        self.direction
    }

    /// Check if inter-word space should be stretched when drawing.
    #[must_use]
    pub fn justify(&self) -> bool {
        self.justify
    }
}

impl ShapedLayout for MonospaceLayout {
    fn bounds(&self) -> Bounds {
        self.bounds
    }

    fn line_count(&self) -> usize {
        self.lines.len()
    }

    fn dispose(self) {}
}

/// Next tab stop strictly after `x`.
fn next_tab_stop(stops: &[u32], x: u32, fallback: u32) -> u32 {
    if let Some(&stop) = stops.iter().find(|&&stop| stop > x) {
        return stop;
    }
    let (last, interval) = match stops {
        [] => (0, fallback),
        [only] => (*only, *only),
        [.., prev, last] => (*last, last.saturating_sub(*prev)),
    };
    let interval = interval.max(1);
    last + ((x - last) / interval + 1) * interval
}

#[derive(Clone, Copy, Debug)]
struct Glyph {
    char_start: usize,
    char_end: usize,
    advance: u32,
    ascent: u32,
    descent: u32,
    is_tab: bool,
    is_whitespace: bool,
}

fn validate_runs(runs: &[StyleRun], char_count: usize) -> std::result::Result<(), String> {
    let mut cursor = 0;
    for run in runs {
        if run.range.start < cursor || run.range.start > run.range.end {
            return Err(format!(
                "style run {}..{} is out of order",
                run.range.start, run.range.end
            ));
        }
        if run.range.end > char_count {
            return Err(format!(
                "style run {}..{} past end of text ({char_count} chars)",
                run.range.start, run.range.end
            ));
        }
        cursor = run.range.end;
    }
    Ok(())
}

impl MonospaceShaper {
    fn glyph_metrics(&self, style: Option<&TextStyle>, font: FontMetrics) -> (u32, u32, Option<u32>) {
        let Some(style) = style else {
            return (font.ascent, font.descent, None);
        };
        let (mut ascent, mut descent) = (font.ascent, font.descent);
        if let Some(custom) = &style.font {
            // Points to pixels at 96 dpi; four fifths above the baseline.
            let height = u32::from(custom.size) * 4 / 3;
            ascent = ascent.max(height * 4 / 5);
            descent = descent.max(height - height * 4 / 5);
        }
        let mut advance = None;
        if let Some(metrics) = style.metrics {
            ascent = ascent.max(metrics.ascent);
            descent = descent.max(metrics.descent);
            advance = Some(metrics.width);
        }
        if style.rise > 0 {
            ascent += style.rise.unsigned_abs();
        } else if style.rise < 0 {
            descent += style.rise.unsigned_abs();
        }
        (ascent, descent, advance)
    }

    fn glyphs(&self, text: &str, runs: &[StyleRun], font: FontMetrics) -> Vec<Glyph> {
        let mut run_iter = runs.iter().peekable();
        grapheme_info(text, self.width_method)
            .into_iter()
            .map(|g| {
                while run_iter
                    .peek()
                    .is_some_and(|run| run.range.end <= g.char_offset)
                {
                    run_iter.next();
                }
                let style = run_iter
                    .peek()
                    .filter(|run| run.range.start <= g.char_offset)
                    .and_then(|run| run.style.as_deref());
                let (ascent, descent, advance) = self.glyph_metrics(style, font);
                Glyph {
                    char_start: g.char_offset,
                    char_end: g.char_offset + g.char_len,
                    advance: advance.unwrap_or(g.width as u32 * self.cell_width),
                    ascent,
                    descent,
                    is_tab: g.is_tab,
                    is_whitespace: g.is_whitespace,
                }
            })
            .collect()
    }
}

impl TextShaper for MonospaceShaper {
    type Layout = MonospaceLayout;

    fn default_metrics(&self) -> FontMetrics {
        let descent = self.cell_height / 4;
        FontMetrics::new(self.cell_height - descent, descent)
    }

    fn shape(
        &mut self,
        text: &str,
        runs: &[StyleRun],
        options: &FormatOptions,
    ) -> Result<MonospaceLayout> {
        let char_count = text.chars().count();
        validate_runs(runs, char_count).map_err(|reason| Error::Shape { line: 0, reason })?;

        let glyphs = self.glyphs(text, runs, options.font);
        let tab_fallback = self.cell_width * 8;
        let mut advances = vec![0u32; glyphs.len()];
        let mut breaks: Vec<Range<usize>> = Vec::new();

        let mut line_start = 0usize;
        let mut x = options.indent;
        let mut last_break: Option<usize> = None;
        let mut i = 0usize;
        while i < glyphs.len() {
            let glyph = glyphs[i];
            let advance = if glyph.is_tab {
                next_tab_stop(&options.tab_stops, x, tab_fallback) - x
            } else {
                glyph.advance
            };

            if let Some(limit) = options.wrap_width {
                if x + advance > limit && i > line_start {
                    let break_at = last_break.filter(|&b| b > line_start).unwrap_or(i);
                    breaks.push(line_start..break_at);
                    i = break_at;
                    while glyphs.get(i).is_some_and(|g| g.is_whitespace && !g.is_tab) {
                        advances[i] = 0;
                        i += 1;
                    }
                    line_start = i;
                    x = options.wrap_indent;
                    last_break = None;
                    continue;
                }
            }

            if glyph.is_whitespace {
                last_break = Some(i + 1);
            }
            advances[i] = advance;
            x += advance;
            i += 1;
        }
        if line_start < glyphs.len() || breaks.is_empty() {
            breaks.push(line_start..glyphs.len());
        }

        let direction = match options.direction {
            TextDirection::LeftToRight => Direction::Ltr,
            TextDirection::RightToLeft => Direction::Rtl,
            TextDirection::Auto => match base_direction(text) {
                Direction::Rtl => Direction::Rtl,
                _ => Direction::Ltr,
            },
        };
        let alignment = match (direction, options.alignment) {
            (Direction::Rtl, Alignment::Left) => Alignment::Right,
            (Direction::Rtl, Alignment::Right) => Alignment::Left,
            (_, alignment) => alignment,
        };

        let mut lines = Vec::with_capacity(breaks.len());
        let mut y = options.vertical_indent;
        let mut width = 0u32;
        for (n, range) in breaks.into_iter().enumerate() {
            let indent = if n == 0 {
                options.indent
            } else {
                options.wrap_indent
            };
            let slice = &glyphs[range.clone()];
            let line_width: u32 = advances[range.clone()].iter().sum();
            let ascent = slice
                .iter()
                .map(|g| g.ascent)
                .fold(options.font.ascent, u32::max);
            let descent = slice
                .iter()
                .map(|g| g.descent)
                .fold(options.font.descent, u32::max);
            let free = options
                .wrap_width
                .unwrap_or(0)
                .saturating_sub(indent + line_width);
            let offset = match alignment {
                Alignment::Left => 0,
                Alignment::Center => free / 2,
                Alignment::Right => free,
            };
            let chars = match (slice.first(), slice.last()) {
                (Some(first), Some(last)) => first.char_start..last.char_end,
                _ => {
                    let at = glyphs.get(range.start).map_or(char_count, |g| g.char_start);
                    at..at
                }
            };

            width = width.max(indent + line_width);
            lines.push(VisualLine {
                chars,
                x: indent + offset,
                width: line_width,
                y,
                ascent,
                descent,
            });
            y += ascent + descent + options.line_spacing;
        }

        Ok(MonospaceLayout {
            text: text.to_string(),
            lines,
            bounds: Bounds { width, height: y },
            direction,
            justify: options.justify,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::style::GlyphMetrics;
    use std::sync::Arc;

    fn options() -> FormatOptions {
        FormatOptions {
            font: FontMetrics::new(12, 4),
            tab_stops: vec![32],
            ..FormatOptions::default()
        }
    }

    fn plain(len: usize) -> Vec<StyleRun> {
        vec![StyleRun {
            range: 0..len,
            style: None,
        }]
    }

    #[test]
    fn test_single_line_bounds() {
        let mut shaper = MonospaceShaper::default();
        let layout = shaper.shape("hello", &plain(5), &options()).unwrap();
        assert_eq!(layout.bounds(), Bounds { width: 40, height: 16 });
        assert_eq!(layout.line_count(), 1);
    }

    #[test]
    fn test_empty_line_has_height() {
        let mut shaper = MonospaceShaper::default();
        let layout = shaper.shape("", &[], &options()).unwrap();
        assert_eq!(layout.bounds(), Bounds { width: 0, height: 16 });
        assert_eq!(layout.visual_lines()[0].chars, 0..0);
    }

    #[test]
    fn test_wide_chars_take_two_cells() {
        let mut shaper = MonospaceShaper::default();
        let layout = shaper.shape("a中", &[], &options()).unwrap();
        assert_eq!(layout.bounds().width, 24);
    }

    #[test]
    fn test_indent_spacing_and_vertical_indent() {
        let mut shaper = MonospaceShaper::default();
        let opts = FormatOptions {
            indent: 10,
            vertical_indent: 3,
            line_spacing: 2,
            ..options()
        };
        let layout = shaper.shape("ab", &[], &opts).unwrap();
        assert_eq!(layout.bounds(), Bounds { width: 26, height: 21 });
    }

    #[test]
    fn test_tabs_snap_to_stops() {
        let mut shaper = MonospaceShaper::default();
        // "a" ends at 8, tab to 32, "b" ends at 40, tab to 64.
        let layout = shaper.shape("a\tb\t", &[], &options()).unwrap();
        assert_eq!(layout.bounds().width, 64);
        assert_eq!(next_tab_stop(&[10, 30], 35, 64), 50);
        assert_eq!(next_tab_stop(&[], 5, 64), 64);
    }

    #[test]
    fn test_word_wrap_breaks_after_whitespace() {
        let mut shaper = MonospaceShaper::default();
        let opts = FormatOptions {
            wrap_width: Some(80),
            wrap_indent: 8,
            ..options()
        };
        let layout = shaper.shape("hello world again", &[], &opts).unwrap();
        let chars: Vec<_> = layout
            .visual_lines()
            .iter()
            .map(|l| l.chars.clone())
            .collect();
        assert_eq!(chars, vec![0..6, 6..12, 12..17]);
        assert_eq!(layout.visual_lines()[1].x, 8);
        assert_eq!(layout.bounds().height, 48);
    }

    #[test]
    fn test_long_word_breaks_anywhere() {
        let mut shaper = MonospaceShaper::default();
        let opts = FormatOptions {
            wrap_width: Some(32),
            ..options()
        };
        let layout = shaper.shape("abcdefghij", &[], &opts).unwrap();
        assert_eq!(layout.line_count(), 3);
        assert_eq!(layout.bounds().width, 32);
    }

    #[test]
    fn test_glyph_metrics_and_rise_grow_line() {
        let mut shaper = MonospaceShaper::default();
        let runs = vec![
            StyleRun {
                range: 0..1,
                style: Some(Arc::new(TextStyle::with_metrics(GlyphMetrics::new(30, 6, 50)))),
            },
            StyleRun {
                range: 1..2,
                style: Some(Arc::new(TextStyle::NONE.with_rise(-5))),
            },
        ];
        let layout = shaper.shape("xy", &runs, &options()).unwrap();
        let line = &layout.visual_lines()[0];
        assert_eq!((line.ascent, line.descent), (30, 9));
        assert_eq!(layout.bounds().width, 58);
    }

    #[test]
    fn test_alignment_and_direction() {
        let mut shaper = MonospaceShaper::default();
        let opts = FormatOptions {
            wrap_width: Some(100),
            alignment: Alignment::Right,
            ..options()
        };
        let layout = shaper.shape("abc", &[], &opts).unwrap();
        assert_eq!(layout.visual_lines()[0].x, 76);
        // Bounds do not depend on alignment.
        assert_eq!(layout.bounds().width, 24);

        let rtl = FormatOptions {
            direction: TextDirection::Auto,
            ..opts
        };
        let layout = shaper.shape("שלום", &[], &rtl).unwrap();
        assert_eq!(layout.direction(), Direction::Rtl);
        assert_eq!(layout.visual_lines()[0].x, 0);
    }

    #[test]
    fn test_invalid_runs_fail() {
        let mut shaper = MonospaceShaper::default();
        let err = shaper.shape("abc", &plain(5), &options()).unwrap_err();
        assert!(matches!(err, Error::Shape { .. }));

        let unordered = vec![
            StyleRun {
                range: 1..2,
                style: None,
            },
            StyleRun {
                range: 0..1,
                style: None,
            },
        ];
        assert!(shaper.shape("abc", &unordered, &options()).is_err());
    }

    #[test]
    fn test_default_metrics_fill_cell() {
        let shaper = MonospaceShaper::new(10, 20);
        assert_eq!(shaper.default_metrics(), FontMetrics::new(15, 5));
        assert_eq!(shaper.default_metrics().height(), 20);
    }
}

//! Text content and renderer kept in step.
//!
//! [`StyledText`] owns a [`RopeContent`] and a [`StyledTextRenderer`] and
//! routes every mutation through [`StyledTextRenderer::on_text_changing`]
//! before touching the rope, so the derived structures never lag behind the
//! text. Out-of-range offsets and lines are rejected with an error here rather
//! than clamped.

use super::content::{RopeContent, TextContent};
use super::markers::{LineMarker, MarkerRef};
use super::metrics::{IdleFill, IdleStatus};
use super::renderer::{DrawTarget, RenderConfig, StyledTextRenderer};
use super::shaper::{Alignment, FontMetrics, MonospaceShaper, TextShaper};
use super::style_range::StyleRange;
use crate::color::Rgba;
use crate::error::{Error, Result};
use crate::event::{LogLevel, emit_log};
use crate::style::TextStyle;
use std::sync::Arc;

/// Styled, editable text with cached layouts.
#[derive(Debug)]
pub struct StyledText<S: TextShaper = MonospaceShaper> {
    content: RopeContent,
    renderer: StyledTextRenderer<S>,
}

impl Default for StyledText<MonospaceShaper> {
    fn default() -> Self {
        Self::new(MonospaceShaper::default(), RenderConfig::default())
    }
}

impl<S: TextShaper> StyledText<S> {
    /// Create empty styled text.
    pub fn new(shaper: S, config: RenderConfig) -> Self {
        let content = RopeContent::new();
        let mut renderer = StyledTextRenderer::new(shaper, config);
        renderer.set_content(&content);
        Self { content, renderer }
    }

    /// Create styled text holding `text`.
    pub fn with_text(shaper: S, config: RenderConfig, text: &str) -> Self {
        let mut styled = Self::new(shaper, config);
        styled.set_text(text);
        styled
    }

    /// The text being rendered.
    #[must_use]
    pub fn content(&self) -> &RopeContent {
        &self.content
    }

    /// The renderer kept in step with the text.
    #[must_use]
    pub fn renderer(&self) -> &StyledTextRenderer<S> {
        &self.renderer
    }

    /// Mutable access to the renderer.
    pub fn renderer_mut(&mut self) -> &mut StyledTextRenderer<S> {
        &mut self.renderer
    }

    /// Whole text as a string.
    #[must_use]
    pub fn text(&self) -> String {
        self.content.to_string()
    }

    /// Number of chars in the text.
    #[must_use]
    pub fn char_count(&self) -> usize {
        self.content.char_count()
    }

    /// Number of lines in the text.
    #[must_use]
    pub fn line_count(&self) -> usize {
        self.content.line_count()
    }

    fn check_range(&self, start: usize, length: usize) -> Result<()> {
        let len = self.content.char_count();
        match start.checked_add(length) {
            Some(end) if end <= len => Ok(()),
            _ => Err(Error::OffsetOutOfRange {
                offset: start.saturating_add(length),
                len,
            }),
        }
    }

    fn check_lines(&self, start_line: usize, count: usize) -> Result<()> {
        let line_count = self.content.line_count();
        match start_line.checked_add(count) {
            Some(end) if end <= line_count => Ok(()),
            _ => Err(Error::LineOutOfRange {
                line: start_line.saturating_add(count.saturating_sub(1)),
                line_count,
            }),
        }
    }

    // ========================================================================
    // Text
    // ========================================================================

    /// Replace the whole text, dropping styles, markers and formats.
    ///
    /// The first `eager_line_limit` lines are measured right away.
    pub fn set_text(&mut self, text: &str) {
        self.content.set_text(text);
        self.renderer.set_content(&self.content);
        let eager = self.renderer.config().eager_line_limit;
        if let Err(err) = self.renderer.calculate(&self.content, 0, eager) {
            emit_log(LogLevel::Warn, &format!("eager measuring stopped: {err}"));
        }
    }

    /// Replace `length` chars at `start` with `text`.
    pub fn replace_text_range(&mut self, start: usize, length: usize, text: &str) -> Result<()> {
        let change = self.content.change_for(start, length, text)?;
        self.renderer.on_text_changing(&self.content, &change);
        self.content.replace(start, length, text)
    }

    /// Insert `text` at char `offset`.
    pub fn insert(&mut self, offset: usize, text: &str) -> Result<()> {
        self.replace_text_range(offset, 0, text)
    }

    /// Append `text` at the end.
    pub fn append(&mut self, text: &str) -> Result<()> {
        self.replace_text_range(self.content.char_count(), 0, text)
    }

    /// Text of a char range.
    pub fn text_range(&self, start: usize, length: usize) -> Result<String> {
        self.content.slice(start, length)
    }

    // ========================================================================
    // Styles
    // ========================================================================

    /// Apply `style` to a char range.
    pub fn set_style_range(&mut self, start: usize, length: usize, style: &TextStyle) -> Result<()> {
        self.check_range(start, length)?;
        self.renderer
            .assign_style(&self.content, start, length, style);
        Ok(())
    }

    /// Clear a char range and apply `ranges` inside it.
    pub fn replace_style_ranges(
        &mut self,
        start: usize,
        length: usize,
        ranges: &[StyleRange],
    ) -> Result<()> {
        self.check_range(start, length)?;
        self.renderer
            .replace_styles(&self.content, start, length, ranges);
        Ok(())
    }

    /// Replace every style.
    pub fn set_style_ranges(&mut self, ranges: Vec<StyleRange>) -> Result<()> {
        if let Some(range) = ranges.iter().find(|r| r.end() > self.content.char_count()) {
            return Err(Error::OffsetOutOfRange {
                offset: range.end(),
                len: self.content.char_count(),
            });
        }
        self.renderer.set_styles(ranges);
        Ok(())
    }

    /// Styled ranges overlapping a char range.
    pub fn style_ranges(&self, start: usize, length: usize) -> Result<Vec<StyleRange>> {
        self.check_range(start, length)?;
        Ok(self.renderer.query_styles(start, length))
    }

    /// Style at a char offset, if any.
    pub fn style_at(&self, offset: usize) -> Result<Option<Arc<TextStyle>>> {
        self.check_range(offset, 1)?;
        Ok(self.renderer.styles().style_at(offset).cloned())
    }

    // ========================================================================
    // Lines
    // ========================================================================

    /// Decorate lines with `marker`, or clear them with `None`.
    pub fn set_marker(
        &mut self,
        start_line: usize,
        count: usize,
        marker: Option<&MarkerRef>,
    ) -> Result<()> {
        self.check_lines(start_line, count)?;
        self.renderer.set_marker(start_line, count, marker);
        Ok(())
    }

    /// Marker drawn on `line`.
    pub fn marker_at(&self, line: usize) -> Result<Option<LineMarker>> {
        self.check_lines(line, 1)?;
        Ok(self.renderer.marker_at(line))
    }

    /// Align lines `start_line..start_line + count`.
    pub fn set_line_alignment(
        &mut self,
        start_line: usize,
        count: usize,
        alignment: Alignment,
    ) -> Result<()> {
        self.check_lines(start_line, count)?;
        self.renderer
            .set_line_alignment(start_line, count, alignment);
        Ok(())
    }

    /// Set the first-line indent of lines, in pixels.
    pub fn set_line_indent(&mut self, start_line: usize, count: usize, indent: u32) -> Result<()> {
        self.check_lines(start_line, count)?;
        self.renderer.set_line_indent(start_line, count, indent);
        Ok(())
    }

    /// Set the indent of wrapped continuation rows, in pixels.
    pub fn set_line_wrap_indent(
        &mut self,
        start_line: usize,
        count: usize,
        indent: u32,
    ) -> Result<()> {
        self.check_lines(start_line, count)?;
        self.renderer
            .set_line_wrap_indent(start_line, count, indent);
        Ok(())
    }

    /// Add vertical space above lines, in pixels.
    pub fn set_line_vertical_indent(
        &mut self,
        start_line: usize,
        count: usize,
        indent: u32,
    ) -> Result<()> {
        self.check_lines(start_line, count)?;
        self.renderer
            .set_line_vertical_indent(start_line, count, indent);
        Ok(())
    }

    /// Justify wrapped rows of lines.
    pub fn set_line_justify(&mut self, start_line: usize, count: usize, justify: bool) -> Result<()> {
        self.check_lines(start_line, count)?;
        self.renderer.set_line_justify(start_line, count, justify);
        Ok(())
    }

    /// Set the tab stops of lines, in pixels.
    pub fn set_line_tab_stops(
        &mut self,
        start_line: usize,
        count: usize,
        stops: &[u32],
    ) -> Result<()> {
        self.check_lines(start_line, count)?;
        self.renderer.set_line_tab_stops(start_line, count, stops);
        Ok(())
    }

    /// Set or clear the background color of lines.
    pub fn set_line_background(
        &mut self,
        start_line: usize,
        count: usize,
        color: Option<Rgba>,
    ) -> Result<()> {
        self.check_lines(start_line, count)?;
        self.renderer.set_line_background(start_line, count, color);
        Ok(())
    }

    // ========================================================================
    // Measuring and drawing
    // ========================================================================

    /// Change the default font metrics, invalidating every line.
    pub fn set_font_metrics(&mut self, font: FontMetrics) {
        self.renderer.set_font_metrics(font);
    }

    /// Wrap lines at `width` pixels, or disable wrapping with `None`.
    pub fn set_word_wrap(&mut self, width: Option<u32>) {
        self.renderer.set_word_wrap(width);
    }

    /// Set the spacing below lines the spacing provider leaves unset.
    pub fn set_line_spacing(&mut self, spacing: u32) {
        self.renderer.set_line_spacing(spacing);
    }

    /// Exact height of `line`.
    pub fn line_height(&mut self, line: usize) -> Result<u32> {
        self.renderer.line_height(&self.content, line, true)
    }

    /// Height of the whole text, estimating unmeasured lines.
    pub fn total_height(&mut self) -> u32 {
        self.renderer.total_height(&self.content)
    }

    /// Width of the widest measured line.
    pub fn widest_line_width(&mut self) -> u32 {
        self.renderer.widest_line_width()
    }

    /// Scroll so that `line` is the first visible line.
    pub fn set_top_index(&mut self, line: usize) -> Result<()> {
        self.check_lines(line, 1)?;
        self.renderer.set_top_index(line);
        Ok(())
    }

    /// Run `f` on the layout of `line`.
    pub fn with_layout<F, R>(&mut self, line: usize, f: F) -> Result<R>
    where
        F: FnOnce(&S::Layout) -> R,
    {
        self.renderer.get_layout_for_draw(&self.content, line, f)
    }

    /// Draw the visible lines. Returns the bottom of the last drawn line.
    pub fn draw<T: DrawTarget<S::Layout>>(&mut self, target: &mut T, client_height: u32) -> u32 {
        self.renderer
            .draw_lines(&self.content, target, client_height)
    }

    /// Measure the lines filling `client_height` from the top index.
    pub fn calculate_visible(&mut self, client_height: u32) -> Result<()> {
        self.renderer.calculate_visible(&self.content, client_height)
    }

    /// Start measuring unresolved lines in the background.
    pub fn start_idle_fill(&mut self) -> Option<IdleFill> {
        self.renderer.start_idle_fill()
    }

    /// Run one burst of a fill started with [`start_idle_fill`](Self::start_idle_fill).
    pub fn run_idle_burst(&mut self, fill: &mut IdleFill) -> IdleStatus {
        self.renderer.run_idle_burst(&self.content, fill)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_edits_keep_renderer_in_step() {
        let mut text = StyledText::default();
        text.set_text("Hello world");
        text.set_style_range(6, 5, &TextStyle::bold()).unwrap();

        text.insert(0, "Oh, ").unwrap();
        assert_eq!(text.text(), "Oh, Hello world");
        let styles = text.style_ranges(0, text.char_count()).unwrap();
        assert_eq!(styles.len(), 1);
        assert_eq!(styles[0].range(), 10..15);

        text.append("\nbye").unwrap();
        assert_eq!(text.renderer().metrics().len(), 2);
    }

    #[test]
    fn test_set_text_measures_eagerly() {
        let mut text = StyledText::new(
            MonospaceShaper::default(),
            RenderConfig::default().with_eager_line_limit(2),
        );
        text.set_text("a\nbb\nccc");
        let metrics = text.renderer().metrics();
        assert!(!metrics.get(0).needs_recalculate());
        assert!(!metrics.get(1).needs_recalculate());
        assert!(metrics.get(2).needs_recalculate());
    }

    #[test]
    fn test_rejects_out_of_range() {
        let mut text = StyledText::default();
        text.set_text("abc\ndef");
        assert_eq!(
            text.set_style_range(5, 3, &TextStyle::bold()),
            Err(Error::OffsetOutOfRange { offset: 8, len: 7 })
        );
        assert_eq!(
            text.set_marker(1, 2, None),
            Err(Error::LineOutOfRange {
                line: 2,
                line_count: 2
            })
        );
        assert!(text.replace_text_range(6, 5, "x").is_err());
        assert_eq!(text.text(), "abc\ndef");
    }
}

//! Styled text renderer.
//!
//! [`StyledTextRenderer`] owns every derived structure of a styled text view
//! (style index, line metrics, layout cache, markers and line formats) and
//! keeps them consistent with the content:
//!
//! - before each buffer mutation the owner calls
//!   [`on_text_changing`](StyledTextRenderer::on_text_changing) with a
//!   [`TextChange`] computed against the *pre-edit* content
//! - on draw, each visible line is looked up in the layout cache; a miss shapes
//!   the line and records its size
//! - heights of lines nobody has measured are estimated, and the idle fill
//!   resolves them in time-boxed bursts
//!
//! # Examples
//!
//! ```
//! use styledtext_rust::{
//!     MonospaceShaper, RenderConfig, RopeContent, StyledTextRenderer, TextContent, TextStyle,
//! };
//!
//! let mut content = RopeContent::from_str("fn main() {\n    body\n}");
//! let mut renderer = StyledTextRenderer::new(MonospaceShaper::default(), RenderConfig::default());
//! renderer.set_content(&content);
//! renderer.assign_style(&content, 0, 2, &TextStyle::bold());
//!
//! // Insert a line before the body.
//! let change = content.change_for(12, 0, "    // hi\n").unwrap();
//! renderer.on_text_changing(&content, &change);
//! content.replace(12, 0, "    // hi\n").unwrap();
//!
//! assert_eq!(renderer.metrics().len(), content.line_count());
//! assert_eq!(renderer.line_height(&content, 1, true).unwrap(), 16);
//! ```

use super::content::{TextChange, TextContent};
use super::layout_cache::{CachedLayout, LayoutCache};
use super::line_format::{LineFormat, LineFormats};
use super::markers::{LineMarker, MarkerRef, MarkerTracker};
use super::metrics::{IdleFill, IdleStatus, LineMetrics};
use super::shaper::{Alignment, FontMetrics, FormatOptions, ShapedLayout, TextDirection, TextShaper};
use super::style_index::{InsertPolicy, StyleIndex};
use super::style_range::{StyleRange, StyleRun};
use crate::color::Rgba;
use crate::error::{Error, Result};
use crate::event::{EVENT_IDLE_FILL_COMPLETE, EVENT_MARKERS_REMOVED, LogLevel, emit_event, emit_log};
use crate::style::TextStyle;
use std::borrow::Cow;
use std::rc::{Rc, Weak};
use std::time::{Duration, Instant};

/// Number of line layouts kept around the viewport.
pub const DEFAULT_CACHE_SIZE: usize = 300;

/// Time one idle burst may spend measuring lines.
pub const DEFAULT_IDLE_BUDGET: Duration = Duration::from_millis(50);

/// Renderer configuration.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RenderConfig {
    /// Capacity of the layout cache in lines.
    pub cache_size: usize,
    pub idle_budget: Duration,
    /// Treatment of text inserted inside a styled range.
    pub insert_policy: InsertPolicy,
    pub word_wrap: bool,
    /// Wrap width in pixels, used when `word_wrap` is set.
    pub wrap_width: Option<u32>,
    /// Extra space below every line in pixels.
    pub line_spacing: u32,
    /// Default tab stop interval in pixels.
    pub tab_width: u32,
    pub alignment: Alignment,
    pub indent: u32,
    pub wrap_indent: u32,
    pub justify: bool,
    pub direction: TextDirection,
    /// Horizontal margins plus caret width, added to every line width.
    pub h_trim: u32,
    /// Lines measured eagerly when new text is set.
    pub eager_line_limit: usize,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            cache_size: DEFAULT_CACHE_SIZE,
            idle_budget: DEFAULT_IDLE_BUDGET,
            insert_policy: InsertPolicy::Plain,
            word_wrap: false,
            wrap_width: None,
            line_spacing: 0,
            tab_width: 64,
            alignment: Alignment::Left,
            indent: 0,
            wrap_indent: 0,
            justify: false,
            direction: TextDirection::LeftToRight,
            h_trim: 0,
            eager_line_limit: 200,
        }
    }
}

impl RenderConfig {
    /// Set the layout cache capacity.
    #[must_use]
    pub fn with_cache_size(mut self, lines: usize) -> Self {
        self.cache_size = lines;
        self
    }

    /// Set the idle burst budget.
    #[must_use]
    pub fn with_idle_budget(mut self, budget: Duration) -> Self {
        self.idle_budget = budget;
        self
    }

    /// Set the insert policy.
    #[must_use]
    pub fn with_insert_policy(mut self, policy: InsertPolicy) -> Self {
        self.insert_policy = policy;
        self
    }

    /// Enable word wrap at `width` pixels.
    #[must_use]
    pub fn with_word_wrap(mut self, width: u32) -> Self {
        self.word_wrap = true;
        self.wrap_width = Some(width);
        self
    }

    /// Set the line spacing.
    #[must_use]
    pub fn with_line_spacing(mut self, spacing: u32) -> Self {
        self.line_spacing = spacing;
        self
    }

    /// Set the tab stop interval.
    #[must_use]
    pub fn with_tab_width(mut self, width: u32) -> Self {
        self.tab_width = width;
        self
    }

    /// Set the default alignment.
    #[must_use]
    pub fn with_alignment(mut self, alignment: Alignment) -> Self {
        self.alignment = alignment;
        self
    }

    /// Set the default first-line and wrap indents.
    #[must_use]
    pub fn with_indent(mut self, indent: u32, wrap_indent: u32) -> Self {
        self.indent = indent;
        self.wrap_indent = wrap_indent;
        self
    }

    /// Set default justification.
    #[must_use]
    pub fn with_justify(mut self, justify: bool) -> Self {
        self.justify = justify;
        self
    }

    /// Set the paragraph direction.
    #[must_use]
    pub fn with_direction(mut self, direction: TextDirection) -> Self {
        self.direction = direction;
        self
    }

    /// Set the horizontal trim.
    #[must_use]
    pub fn with_h_trim(mut self, trim: u32) -> Self {
        self.h_trim = trim;
        self
    }

    /// Set the eager measuring limit.
    #[must_use]
    pub fn with_eager_line_limit(mut self, lines: usize) -> Self {
        self.eager_line_limit = lines;
        self
    }
}

/// Layout cache counters.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct LayoutStats {
    pub hits: u64,
    pub misses: u64,
}

/// Per-line spacing override. `None` uses the configured spacing.
pub type LineSpacingProvider = Box<dyn Fn(usize) -> Option<u32>>;

/// One line handed to a [`DrawTarget`].
#[derive(Debug)]
pub struct DrawLine<'a, L> {
    pub line: usize,
    /// Top of the line relative to the first drawn line.
    pub y: u32,
    pub layout: &'a L,
    pub marker: Option<&'a LineMarker>,
    pub background: Option<Rgba>,
}

/// Surface that paints shaped lines.
pub trait DrawTarget<L> {
    fn draw_line(&mut self, line: DrawLine<'_, L>);
}

/// Attach the line index to a shaping failure.
fn at_line(err: Error, line: usize) -> Error {
    match err {
        Error::Shape { reason, .. } => Error::Shape { line, reason },
        other => other,
    }
}

/// Coordinates styles, metrics, markers and cached layouts of one view.
pub struct StyledTextRenderer<S: TextShaper> {
    config: RenderConfig,
    shaper: S,
    font: FontMetrics,
    styles: StyleIndex,
    metrics: LineMetrics,
    layouts: LayoutCache<S::Layout>,
    markers: MarkerTracker,
    formats: LineFormats,
    line_spacing: Option<LineSpacingProvider>,
    top_index: usize,
    redraw_lines: Vec<usize>,
    idle_generation: u64,
    idle_token: Weak<()>,
    stats: LayoutStats,
}

impl<S: TextShaper> std::fmt::Debug for StyledTextRenderer<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StyledTextRenderer")
            .field("config", &self.config)
            .field("font", &self.font)
            .field("styles", &self.styles.len())
            .field("lines", &self.metrics.len())
            .field("cached_layouts", &self.layouts.live_count())
            .field("top_index", &self.top_index)
            .finish_non_exhaustive()
    }
}

impl<S: TextShaper> StyledTextRenderer<S> {
    /// Create a renderer for empty content.
    pub fn new(shaper: S, config: RenderConfig) -> Self {
        let font = shaper.default_metrics();
        Self {
            layouts: LayoutCache::new(config.cache_size),
            config,
            shaper,
            font,
            styles: StyleIndex::new(),
            metrics: LineMetrics::new(1),
            markers: MarkerTracker::new(),
            formats: LineFormats::new(),
            line_spacing: None,
            top_index: 0,
            redraw_lines: Vec::new(),
            idle_generation: 0,
            idle_token: Weak::new(),
            stats: LayoutStats::default(),
        }
    }

    // ========================================================================
    // Accessors
    // ========================================================================

    /// Active configuration.
    #[must_use]
    pub fn config(&self) -> &RenderConfig {
        &self.config
    }

    /// Measurement primitive used for layouts.
    #[must_use]
    pub fn shaper(&self) -> &S {
        &self.shaper
    }

    /// Mutable access to the measurement primitive.
    pub fn shaper_mut(&mut self) -> &mut S {
        &mut self.shaper
    }

    /// Style ranges of the content.
    #[must_use]
    pub fn styles(&self) -> &StyleIndex {
        &self.styles
    }

    /// Per-line sizes.
    #[must_use]
    pub fn metrics(&self) -> &LineMetrics {
        &self.metrics
    }

    /// Cached layouts around the viewport.
    #[must_use]
    pub fn layouts(&self) -> &LayoutCache<S::Layout> {
        &self.layouts
    }

    /// Per-line markers.
    #[must_use]
    pub fn markers(&self) -> &MarkerTracker {
        &self.markers
    }

    /// Per-line paragraph formats.
    #[must_use]
    pub fn formats(&self) -> &LineFormats {
        &self.formats
    }

    /// Default font metrics.
    #[must_use]
    pub fn font_metrics(&self) -> FontMetrics {
        self.font
    }

    /// Layout cache hit and miss counters.
    #[must_use]
    pub fn stats(&self) -> LayoutStats {
        self.stats
    }

    /// First line of the viewport.
    #[must_use]
    pub fn top_index(&self) -> usize {
        self.top_index
    }

    /// Lines whose decoration changed without a relayout, drained.
    pub fn take_redraw_lines(&mut self) -> Vec<usize> {
        let mut lines = std::mem::take(&mut self.redraw_lines);
        lines.sort_unstable();
        lines.dedup();
        lines
    }

    // ========================================================================
    // Content and reset
    // ========================================================================

    /// Start over for new content, dropping styles, markers and formats.
    pub fn set_content<C: TextContent + ?Sized>(&mut self, content: &C) {
        self.cancel_idle_fill();
        self.styles.clear();
        self.markers.clear();
        self.formats.clear();
        self.layouts.reset();
        self.metrics.rebuild(content.line_count());
        self.redraw_lines.clear();
        self.top_index = 0;
        tracing::debug!(lines = content.line_count(), "renderer content set");
    }

    /// Forget the sizes and layouts of `lines`.
    pub fn reset<I>(&mut self, lines: I)
    where
        I: IntoIterator<Item = usize>,
    {
        let lines: Vec<usize> = lines.into_iter().collect();
        for &line in &lines {
            self.layouts.invalidate(line);
        }
        self.metrics.reset(lines);
    }

    /// Forget every size and layout.
    pub fn reset_all(&mut self) {
        self.layouts.clear();
        self.metrics.reset_all();
    }

    fn reset_char_range<C: TextContent + ?Sized>(&mut self, content: &C, start: usize, length: usize) {
        let first = content.line_at_offset(start);
        let last = content.line_at_offset(start + length.saturating_sub(1));
        self.reset(first..=last.max(first));
    }

    // ========================================================================
    // Styles
    // ========================================================================

    /// Style a char range and invalidate the lines it touches.
    pub fn assign_style<C: TextContent + ?Sized>(
        &mut self,
        content: &C,
        start: usize,
        length: usize,
        style: &TextStyle,
    ) {
        if length == 0 {
            return;
        }
        self.styles.assign(start, length, style);
        self.reset_char_range(content, start, length);
    }

    /// Clear a char range and assign `ranges` inside it.
    pub fn replace_styles<C: TextContent + ?Sized>(
        &mut self,
        content: &C,
        start: usize,
        length: usize,
        ranges: &[StyleRange],
    ) {
        self.styles.replace(start, length, ranges);
        if length > 0 {
            self.reset_char_range(content, start, length);
        }
    }

    /// Replace every style.
    pub fn set_styles(&mut self, ranges: Vec<StyleRange>) {
        self.styles.set_ranges(ranges);
        self.reset_all();
    }

    /// Remove every style.
    pub fn clear_styles(&mut self) {
        self.styles.clear();
        self.reset_all();
    }

    /// Styled ranges overlapping a char window, clipped to it.
    #[must_use]
    pub fn query_styles(&self, start: usize, length: usize) -> Vec<StyleRange> {
        self.styles.query(start, length)
    }

    /// Runs tiling a char window, including unstyled gaps.
    #[must_use]
    pub fn style_runs(&self, start: usize, length: usize) -> Vec<StyleRun> {
        self.styles.runs(start, length)
    }

    // ========================================================================
    // Markers and line formats
    // ========================================================================

    /// Decorate `count` lines with `marker`, or clear them.
    pub fn set_marker(&mut self, start_line: usize, count: usize, marker: Option<&MarkerRef>) {
        if count == 0 {
            return;
        }
        if let Some(removed) = self.markers.set_marker(start_line, count, marker) {
            self.redraw_lines.extend(removed);
        }
        self.reset(start_line..start_line + count);
        self.redraw_lines.extend(start_line..start_line + count);
    }

    /// Set the marker of one line in per-line mode.
    pub fn set_line_marker(&mut self, line: usize, marker: Option<&MarkerRef>, ordinal: usize) {
        self.markers.set_line_marker(line, marker, ordinal);
        self.reset([line]);
        self.redraw_lines.push(line);
    }

    /// Marker drawn on `line`.
    #[must_use]
    pub fn marker_at(&self, line: usize) -> Option<LineMarker> {
        self.markers.marker_at(line)
    }

    fn update_format<F>(&mut self, start_line: usize, count: usize, relayout: bool, update: F)
    where
        F: FnMut(&mut LineFormat),
    {
        let lines = start_line..start_line + count;
        self.formats.update(lines.clone(), update);
        if relayout {
            self.reset(lines.clone());
        }
        self.redraw_lines.extend(lines);
    }

    /// Align lines and relayout them.
    pub fn set_line_alignment(&mut self, start_line: usize, count: usize, alignment: Alignment) {
        self.update_format(start_line, count, true, |f| f.alignment = Some(alignment));
    }

    /// Set the first-line indent of lines.
    pub fn set_line_indent(&mut self, start_line: usize, count: usize, indent: u32) {
        self.update_format(start_line, count, true, |f| f.indent = Some(indent));
    }

    /// Set the indent of wrapped continuation rows.
    pub fn set_line_wrap_indent(&mut self, start_line: usize, count: usize, indent: u32) {
        self.update_format(start_line, count, true, |f| f.wrap_indent = Some(indent));
    }

    /// Add vertical space above lines.
    pub fn set_line_vertical_indent(&mut self, start_line: usize, count: usize, indent: u32) {
        self.update_format(start_line, count, true, |f| f.vertical_indent = Some(indent));
    }

    /// Justify wrapped rows of lines.
    pub fn set_line_justify(&mut self, start_line: usize, count: usize, justify: bool) {
        self.update_format(start_line, count, true, |f| f.justify = Some(justify));
    }

    /// Set the tab stops of lines.
    pub fn set_line_tab_stops(&mut self, start_line: usize, count: usize, stops: &[u32]) {
        self.update_format(start_line, count, true, |f| f.tab_stops = Some(stops.to_vec()));
    }

    /// Set the background of lines. Only a redraw is needed.
    pub fn set_line_background(&mut self, start_line: usize, count: usize, color: Option<Rgba>) {
        self.update_format(start_line, count, false, |f| f.background = color);
    }

    // ========================================================================
    // Global formatting
    // ========================================================================

    /// Change the default font metrics, invalidating every line.
    pub fn set_font_metrics(&mut self, font: FontMetrics) {
        if self.font != font {
            self.font = font;
            self.reset_all();
        }
    }

    /// Install a per-line spacing override.
    pub fn set_line_spacing_provider(&mut self, provider: Option<LineSpacingProvider>) {
        self.line_spacing = provider;
        self.reset_all();
    }

    /// Set the spacing below lines the spacing provider leaves unset.
    pub fn set_line_spacing(&mut self, spacing: u32) {
        if self.config.line_spacing != spacing {
            self.config.line_spacing = spacing;
            self.reset_all();
        }
    }

    /// Enable word wrap at `width` pixels, or disable it with `None`.
    pub fn set_word_wrap(&mut self, width: Option<u32>) {
        let wrap = width.is_some();
        if self.config.word_wrap != wrap || self.config.wrap_width != width {
            self.config.word_wrap = wrap;
            self.config.wrap_width = width;
            self.reset_all();
        }
    }

    /// Scroll so that `top` is the first visible line.
    pub fn set_top_index(&mut self, top: usize) {
        self.top_index = top;
        self.layouts.reindex(self.window_top());
    }

    /// The cache window starts one line above the first visible line.
    fn window_top(&self) -> usize {
        self.top_index.saturating_sub(1)
    }

    fn spacing_of(&self, line: usize) -> u32 {
        self.line_spacing
            .as_ref()
            .and_then(|provider| provider(line))
            .unwrap_or(self.config.line_spacing)
    }

    fn format_options(&self, line: usize) -> FormatOptions {
        let format = self.formats.get(line);
        let marker_width = self
            .markers
            .marker_at(line)
            .map_or(0, |m| m.marker.width());
        FormatOptions {
            alignment: format
                .and_then(|f| f.alignment)
                .unwrap_or(self.config.alignment),
            justify: format.and_then(|f| f.justify).unwrap_or(self.config.justify),
            indent: format.and_then(|f| f.indent).unwrap_or(self.config.indent) + marker_width,
            wrap_indent: format
                .and_then(|f| f.wrap_indent)
                .unwrap_or(self.config.wrap_indent),
            vertical_indent: format.and_then(|f| f.vertical_indent).unwrap_or(0),
            tab_stops: format
                .and_then(|f| f.tab_stops.clone())
                .unwrap_or_else(|| vec![self.config.tab_width]),
            wrap_width: if self.config.word_wrap {
                self.config.wrap_width
            } else {
                None
            },
            direction: self.config.direction,
            line_spacing: self.spacing_of(line),
            font: self.font,
        }
    }

    // ========================================================================
    // Heights and widths
    // ========================================================================

    fn fixed_line_height(&self, line: usize) -> u32 {
        let vertical_indent = self
            .formats
            .get(line)
            .and_then(|f| f.vertical_indent)
            .unwrap_or(0);
        self.font.height() + self.spacing_of(line) + vertical_indent
    }

    fn is_variable_height<C: TextContent + ?Sized>(&self, content: &C, line: usize) -> bool {
        if self.config.word_wrap {
            return true;
        }
        let start = content.offset_at_line(line);
        let end = content.offset_at_line(line + 1);
        self.styles.has_variable_height(start, end.saturating_sub(start))
    }

    /// Height of `line`.
    ///
    /// Unmeasured variable-height lines are shaped now when `exact` is set and
    /// estimated from the average otherwise.
    pub fn line_height<C: TextContent + ?Sized>(
        &mut self,
        content: &C,
        line: usize,
        exact: bool,
    ) -> Result<u32> {
        if line >= self.metrics.len() {
            return Err(Error::LineOutOfRange {
                line,
                line_count: self.metrics.len(),
            });
        }
        if exact && self.metrics.get(line).height.is_none() && self.is_variable_height(content, line)
        {
            self.calculate(content, line, 1)?;
        }
        Ok(self.estimated_height(content, line))
    }

    fn estimated_height<C: TextContent + ?Sized>(&mut self, content: &C, line: usize) -> u32 {
        if let Some(height) = self.metrics.get(line).height {
            return height;
        }
        if self.is_variable_height(content, line) {
            return self
                .metrics
                .average_height()
                .unwrap_or_else(|| self.fixed_line_height(line));
        }
        let height = self.fixed_line_height(line);
        self.metrics.set_fixed_height(line, height);
        height
    }

    /// Sum of all line heights, estimating unmeasured variable lines.
    pub fn total_height<C: TextContent + ?Sized>(&mut self, content: &C) -> u32 {
        (0..self.metrics.len())
            .map(|line| self.estimated_height(content, line))
            .sum()
    }

    /// Width of the widest measured line, including the horizontal trim.
    pub fn widest_line_width(&mut self) -> u32 {
        self.metrics.widest().map_or(0, |(_, width)| width)
    }

    /// Measure every unmeasured line in `[start_line, start_line + count)`.
    pub fn calculate<C: TextContent + ?Sized>(
        &mut self,
        content: &C,
        start_line: usize,
        count: usize,
    ) -> Result<()> {
        let end = (start_line + count).min(self.metrics.len());
        for line in start_line..end {
            if self.metrics.get(line).needs_recalculate() {
                self.get_layout_for_draw(content, line, |_| ())?;
            }
        }
        Ok(())
    }

    /// Measure lines from the top index until `client_height` is covered.
    pub fn calculate_visible<C: TextContent + ?Sized>(
        &mut self,
        content: &C,
        client_height: u32,
    ) -> Result<()> {
        let mut y = 0u32;
        let mut line = self.top_index;
        while line < self.metrics.len() && y < client_height {
            self.calculate(content, line, 1)?;
            y += self.metrics.get(line).height.unwrap_or(0);
            line += 1;
        }
        Ok(())
    }

    // ========================================================================
    // Layouts
    // ========================================================================

    /// Text handed to the shaper. Tabs inside runs with glyph metrics are
    /// spaces, so inline objects keep their declared width.
    fn shaping_text<'t>(text: &'t str, runs: &[StyleRun]) -> Cow<'t, str> {
        let has_tabbed_object = runs
            .iter()
            .any(|run| run.style.as_ref().is_some_and(|s| s.metrics.is_some()));
        if !has_tabbed_object || !text.contains('\t') {
            return Cow::Borrowed(text);
        }
        let mut run_iter = runs.iter().peekable();
        let replaced = text
            .chars()
            .enumerate()
            .map(|(i, c)| {
                while run_iter.peek().is_some_and(|run| run.range.end <= i) {
                    run_iter.next();
                }
                let in_object = run_iter.peek().is_some_and(|run| {
                    run.range.start <= i && run.style.as_ref().is_some_and(|s| s.metrics.is_some())
                });
                if c == '\t' && in_object { ' ' } else { c }
            })
            .collect();
        Cow::Owned(replaced)
    }

    /// Run `f` on the layout of `line`, shaping it on a cache miss.
    ///
    /// Lines outside the cache window are shaped, used and disposed.
    pub fn get_layout_for_draw<C, F, R>(&mut self, content: &C, line: usize, f: F) -> Result<R>
    where
        C: TextContent + ?Sized,
        F: FnOnce(&S::Layout) -> R,
    {
        let line_count = self.metrics.len();
        if line >= line_count {
            return Err(Error::LineOutOfRange { line, line_count });
        }
        self.layouts.reindex(self.window_top());

        let text = content.line(line);
        let text_len = text.chars().count();
        let options = self.format_options(line);
        let can_layout = self.metrics.get(line).can_layout();
        if let Some(layout) = self.layouts.lookup(line, &options, text_len, can_layout) {
            self.stats.hits += 1;
            return Ok(f(layout));
        }
        self.stats.misses += 1;

        let line_start = content.offset_at_line(line);
        let mut runs = self.styles.runs(line_start, text_len);
        for run in &mut runs {
            run.range = run.range.start - line_start..run.range.end - line_start;
        }
        let shaped_text = Self::shaping_text(&text, &runs);
        let layout = self
            .shaper
            .shape(&shaped_text, &runs, &options)
            .map_err(|err| at_line(err, line))?;

        if self.metrics.get(line).needs_recalculate() {
            let bounds = layout.bounds();
            self.metrics
                .record(line, bounds.width + self.config.h_trim, bounds.height);
        }

        let entry = CachedLayout {
            layout,
            options,
            text_len,
        };
        match self.layouts.store(line, entry) {
            Ok(layout) => Ok(f(layout)),
            Err(entry) => {
                let result = f(&entry.layout);
                entry.layout.dispose();
                Ok(result)
            }
        }
    }

    /// Draw lines from the top index until `client_height` is filled.
    ///
    /// A line that fails to shape is logged and skipped. Returns the bottom
    /// edge of the last drawn line.
    pub fn draw_lines<C, T>(&mut self, content: &C, target: &mut T, client_height: u32) -> u32
    where
        C: TextContent + ?Sized,
        T: DrawTarget<S::Layout>,
    {
        let mut y = 0u32;
        let mut line = self.top_index;
        while line < self.metrics.len() && y < client_height {
            let marker = self.markers.marker_at(line);
            let background = self.formats.get(line).and_then(|f| f.background);
            let drawn = self.get_layout_for_draw(content, line, |layout| {
                target.draw_line(DrawLine {
                    line,
                    y,
                    layout,
                    marker: marker.as_ref(),
                    background,
                });
                layout.bounds().height
            });
            match drawn {
                Ok(height) => y += height,
                Err(err) => {
                    emit_log(LogLevel::Error, &format!("skipping line {line}: {err}"));
                    y += self.fixed_line_height(line);
                }
            }
            line += 1;
        }
        y
    }

    // ========================================================================
    // Edits
    // ========================================================================

    /// Clamp a change that does not fit the content.
    fn validated<C: TextContent + ?Sized>(content: &C, change: &TextChange) -> TextChange {
        let char_count = content.char_count();
        let line_count = content.line_count();
        let start = change.start.min(char_count);
        let start_line = content.line_at_offset(start);
        let fits = change.start <= char_count
            && change.replaced_end() <= char_count
            && start_line + change.replaced_lines < line_count;
        debug_assert!(
            fits,
            "text change {change:?} does not fit content of {char_count} chars / {line_count} lines"
        );
        if fits {
            return *change;
        }
        emit_log(
            LogLevel::Warn,
            &format!("clamping text change {change:?} to content bounds"),
        );
        TextChange {
            start,
            replaced_chars: change.replaced_chars.min(char_count - start),
            replaced_lines: change
                .replaced_lines
                .min(line_count.saturating_sub(start_line + 1)),
            ..*change
        }
    }

    /// Update every derived structure for a pending change.
    ///
    /// `content` must still hold the pre-edit text.
    pub fn on_text_changing<C: TextContent + ?Sized>(&mut self, content: &C, change: &TextChange) {
        let change = Self::validated(content, change);
        self.styles.shift_on_edit(
            change.start,
            change.replaced_chars,
            change.new_chars,
            self.config.insert_policy,
        );

        // Inserting into empty content keeps the decorations of line 0.
        if content.char_count() > 0 && change.replaced_chars == content.char_count() {
            let lines = change.new_lines + 1;
            self.metrics.rebuild(lines);
            self.markers.clear();
            self.formats.clear();
            self.layouts.clear();
            tracing::debug!(lines, "content replaced wholesale");
            return;
        }

        let start_line = content.line_at_offset(change.start);
        self.metrics
            .apply_edit(start_line, change.replaced_lines, change.new_lines);
        self.layouts
            .apply_edit(start_line, change.replaced_lines, change.new_lines);

        if change.replaced_lines != 0 || change.new_lines != 0 {
            let mut first = start_line;
            if content.offset_at_line(start_line) != change.start {
                first += 1;
            }
            if let Some(removed) =
                self.markers
                    .apply_edit(first, change.replaced_lines, change.new_lines)
            {
                let list = removed
                    .iter()
                    .map(ToString::to_string)
                    .collect::<Vec<_>>()
                    .join(",");
                emit_event(EVENT_MARKERS_REMOVED, &list);
                self.redraw_lines.extend(removed);
            }
            self.formats
                .apply_edit(first, change.replaced_lines, change.new_lines);
        }
    }

    // ========================================================================
    // Idle fill
    // ========================================================================

    /// Start measuring unresolved lines in the background.
    ///
    /// Returns `None` when every line is resolved or a fill is running.
    /// A fill stops running when it completes, is cancelled or is dropped.
    pub fn start_idle_fill(&mut self) -> Option<IdleFill> {
        if self.idle_fill_running() || !self.metrics.has_unresolved() {
            return None;
        }
        self.idle_generation += 1;
        let alive = Rc::new(());
        self.idle_token = Rc::downgrade(&alive);
        Some(IdleFill {
            next_line: 0,
            budget: self.config.idle_budget,
            generation: self.idle_generation,
            _alive: alive,
        })
    }

    /// Invalidate any running idle fill.
    pub fn cancel_idle_fill(&mut self) {
        self.idle_generation += 1;
        self.idle_token = Weak::new();
    }

    /// Check if an idle fill is running.
    #[must_use]
    pub fn idle_fill_running(&self) -> bool {
        self.idle_token.strong_count() > 0
    }

    /// Measure unresolved lines until the burst budget runs out.
    pub fn run_idle_burst<C: TextContent + ?Sized>(
        &mut self,
        content: &C,
        fill: &mut IdleFill,
    ) -> IdleStatus {
        if fill.generation != self.idle_generation || !self.idle_fill_running() {
            return IdleStatus::Complete;
        }
        let started = Instant::now();
        let mut measured = 0usize;
        while let Some(line) = self.metrics.next_unresolved(fill.next_line) {
            if let Err(err) = self.calculate(content, line, 1) {
                emit_log(LogLevel::Warn, &format!("idle fill: {err}"));
                let height = self.fixed_line_height(line);
                self.metrics.record(line, self.config.h_trim, height);
            }
            fill.next_line = line + 1;
            measured += 1;
            if started.elapsed() >= fill.budget {
                tracing::debug!(measured, next_line = fill.next_line, "idle burst paused");
                return IdleStatus::Pending;
            }
        }
        self.idle_token = Weak::new();
        tracing::debug!(measured, "idle fill complete");
        emit_event(
            EVENT_IDLE_FILL_COMPLETE,
            &format!("{{\"lines\":{}}}", self.metrics.len()),
        );
        IdleStatus::Complete
    }
}

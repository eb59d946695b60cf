//! Grapheme cluster iteration with char offsets and cell widths.

use crate::unicode::width::{WidthMethod, display_width_with_method};
use unicode_segmentation::UnicodeSegmentation;

/// Grapheme metadata for layout.
///
/// Offsets are in chars (Unicode scalar values) so they line up with style
/// ranges, which are char based.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct GraphemeInfo {
    pub char_offset: usize,
    pub char_len: usize,
    /// Width in cells; tabs report 0 and are expanded by the caller.
    pub width: usize,
    pub is_tab: bool,
    pub is_whitespace: bool,
}

/// Compute grapheme info for a string.
#[must_use]
pub fn grapheme_info(s: &str, method: WidthMethod) -> Vec<GraphemeInfo> {
    let mut infos = Vec::new();
    let mut char_offset = 0usize;

    for grapheme in s.graphemes(true) {
        let char_len = grapheme.chars().count();
        let is_tab = grapheme == "\t";
        infos.push(GraphemeInfo {
            char_offset,
            char_len,
            width: if is_tab {
                0
            } else {
                display_width_with_method(grapheme, method)
            },
            is_tab,
            is_whitespace: grapheme.chars().all(char::is_whitespace),
        });
        char_offset += char_len;
    }

    infos
}

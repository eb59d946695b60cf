//! Text content access and edit descriptions.
//!
//! The renderer never owns text. It reads lines through [`TextContent`] and is
//! told about mutations through a [`TextChange`] computed *before* the buffer
//! is modified. [`RopeContent`] is the rope-backed buffer used by
//! [`StyledText`](super::StyledText).

use crate::error::{Error, Result};
use ropey::Rope;
use std::borrow::Cow;

/// Read access to the text being rendered.
///
/// Offsets are char indices. Line text is returned without its terminator.
pub trait TextContent {
    /// Total number of chars.
    fn char_count(&self) -> usize;

    /// Number of lines. Empty content has one line.
    fn line_count(&self) -> usize;

    /// Text of a line without its line break. Out of range lines are empty.
    fn line(&self, index: usize) -> Cow<'_, str>;

    /// Char offset of the first char of a line.
    fn offset_at_line(&self, line: usize) -> usize;

    /// Line containing a char offset.
    fn line_at_offset(&self, offset: usize) -> usize;
}

/// Description of a pending replacement, relative to the pre-edit content.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct TextChange {
    /// First replaced char.
    pub start: usize,
    pub replaced_chars: usize,
    pub new_chars: usize,
    /// Line breaks removed by the edit.
    pub replaced_lines: usize,
    /// Line breaks added by the edit.
    pub new_lines: usize,
}

impl TextChange {
    /// Exclusive end of the replaced span in pre-edit offsets.
    #[must_use]
    pub fn replaced_end(&self) -> usize {
        self.start + self.replaced_chars
    }

    /// Signed change in char count.
    #[must_use]
    pub fn char_delta(&self) -> isize {
        self.new_chars as isize - self.replaced_chars as isize
    }

    /// Signed change in line count.
    #[must_use]
    pub fn line_delta(&self) -> isize {
        self.new_lines as isize - self.replaced_lines as isize
    }
}

/// Strip one trailing line terminator in any form ropey breaks lines on.
fn strip_line_break(line: &str) -> &str {
    if let Some(stripped) = line.strip_suffix("\r\n") {
        return stripped;
    }
    match line.chars().next_back() {
        Some('\n' | '\r' | '\u{0B}' | '\u{0C}' | '\u{85}' | '\u{2028}' | '\u{2029}') => {
            let mut chars = line.chars();
            chars.next_back();
            chars.as_str()
        }
        _ => line,
    }
}

/// Count line breaks in a string using the rope's own rules.
#[must_use]
pub fn count_line_breaks(text: &str) -> usize {
    Rope::from_str(text).len_lines() - 1
}

/// Rope-backed text buffer.
#[derive(Clone, Debug, Default)]
pub struct RopeContent {
    rope: Rope,
}

impl RopeContent {
    /// Create an empty buffer.
    #[must_use]
    pub fn new() -> Self {
        Self { rope: Rope::new() }
    }

    /// Create a buffer from a string.
    #[must_use]
    pub fn from_str(s: &str) -> Self {
        Self {
            rope: Rope::from_str(s),
        }
    }

    /// Check if empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rope.len_chars() == 0
    }

    /// Replace the entire contents.
    pub fn set_text(&mut self, text: &str) {
        self.rope = Rope::from_str(text);
    }

    /// Copy out a char range.
    pub fn slice(&self, start: usize, length: usize) -> Result<String> {
        self.check_range(start, length)?;
        Ok(self.rope.slice(start..start + length).to_string())
    }

    /// Describe replacing `length` chars at `start` with `text`, without
    /// applying it.
    pub fn change_for(&self, start: usize, length: usize, text: &str) -> Result<TextChange> {
        self.check_range(start, length)?;
        let end = start + length;
        let mut replaced_lines = self.rope.char_to_line(end) - self.rope.char_to_line(start);

        // One char of context on each side catches "\r" + "\n" pairs formed
        // or split at the edit boundaries.
        let before = start.checked_sub(1).map(|i| self.rope.char(i));
        let after = (end < self.rope.len_chars()).then(|| self.rope.char(end));
        let framed = |middle: &str| {
            let mut framed = String::with_capacity(middle.len() + 8);
            framed.extend(before);
            framed.push_str(middle);
            framed.extend(after);
            count_line_breaks(&framed) as isize
        };
        let removed = self.rope.slice(start..end).to_string();
        let delta = framed(text) - framed(&removed);

        let mut new_lines = replaced_lines as isize + delta;
        if new_lines < 0 {
            replaced_lines += new_lines.unsigned_abs();
            new_lines = 0;
        }
        Ok(TextChange {
            start,
            replaced_chars: length,
            new_chars: text.chars().count(),
            replaced_lines,
            new_lines: new_lines as usize,
        })
    }

    /// Replace `length` chars at `start` with `text`.
    pub fn replace(&mut self, start: usize, length: usize, text: &str) -> Result<()> {
        self.check_range(start, length)?;
        if length > 0 {
            self.rope.remove(start..start + length);
        }
        if !text.is_empty() {
            self.rope.insert(start, text);
        }
        Ok(())
    }

    fn check_range(&self, start: usize, length: usize) -> Result<()> {
        let len = self.rope.len_chars();
        match start.checked_add(length) {
            Some(end) if end <= len => Ok(()),
            _ => Err(Error::OffsetOutOfRange {
                offset: start.saturating_add(length),
                len,
            }),
        }
    }
}

impl std::fmt::Display for RopeContent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        for chunk in self.rope.chunks() {
            f.write_str(chunk)?;
        }
        Ok(())
    }
}

impl TextContent for RopeContent {
    fn char_count(&self) -> usize {
        self.rope.len_chars()
    }

    fn line_count(&self) -> usize {
        self.rope.len_lines()
    }

    fn line(&self, index: usize) -> Cow<'_, str> {
        let Some(slice) = self.rope.get_line(index) else {
            return Cow::Borrowed("");
        };
        match slice.as_str() {
            Some(s) => Cow::Borrowed(strip_line_break(s)),
            None => Cow::Owned(strip_line_break(&slice.to_string()).to_string()),
        }
    }

    fn offset_at_line(&self, line: usize) -> usize {
        if line >= self.rope.len_lines() {
            self.rope.len_chars()
        } else {
            self.rope.line_to_char(line)
        }
    }

    fn line_at_offset(&self, offset: usize) -> usize {
        self.rope.char_to_line(offset.min(self.rope.len_chars()))
    }
}

impl From<&str> for RopeContent {
    fn from(s: &str) -> Self {
        Self::from_str(s)
    }
}

impl From<String> for RopeContent {
    fn from(s: String) -> Self {
        Self::from_str(&s)
    }
}

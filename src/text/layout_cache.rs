//! Fixed-capacity window of shaped line layouts.
//!
//! Slot `i` holds the layout of line `top + i`. Moving the window reslots
//! surviving layouts and disposes the rest; every layout that enters the cache
//! is disposed exactly once, either on eviction, on overwrite or on drop.

use super::shaper::{FormatOptions, ShapedLayout};
use std::ops::Range;

/// A cached layout and the inputs it was built from.
#[derive(Debug)]
pub struct CachedLayout<L> {
    pub layout: L,
    pub options: FormatOptions,
    /// Char length of the line text when shaped.
    pub text_len: usize,
}

/// Window of cached layouts anchored at a top line.
#[derive(Debug)]
pub struct LayoutCache<L: ShapedLayout> {
    slots: Vec<Option<CachedLayout<L>>>,
    capacity: usize,
    top: Option<usize>,
}

impl<L: ShapedLayout> LayoutCache<L> {
    /// Create an empty cache holding at most `capacity` lines.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        Self {
            slots: Vec::new(),
            capacity,
            top: None,
        }
    }

    /// Maximum number of cached lines.
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// First line of the window, if anchored.
    #[must_use]
    pub fn window_top(&self) -> Option<usize> {
        self.top
    }

    /// Lines the window currently covers.
    #[must_use]
    pub fn window(&self) -> Range<usize> {
        self.top.map_or(0..0, |top| top..top + self.capacity)
    }

    /// Number of occupied slots.
    #[must_use]
    pub fn live_count(&self) -> usize {
        self.slots.iter().filter(|slot| slot.is_some()).count()
    }

    /// Lines with a cached layout, ascending.
    pub fn cached_lines(&self) -> impl Iterator<Item = usize> + '_ {
        let top = self.top.unwrap_or(0);
        self.slots
            .iter()
            .enumerate()
            .filter(|(_, slot)| slot.is_some())
            .map(move |(i, _)| top + i)
    }

    /// Move the window so that it starts at `top`.
    pub fn reindex(&mut self, top: usize) {
        let Some(old_top) = self.top else {
            self.top = Some(top);
            return;
        };
        if old_top == top {
            return;
        }
        self.top = Some(top);
        if self.slots.is_empty() {
            return;
        }

        let mut slots = Self::empty_slots(self.capacity);
        for (i, slot) in std::mem::take(&mut self.slots).into_iter().enumerate() {
            let Some(entry) = slot else {
                continue;
            };
            match (i + old_top).checked_sub(top) {
                Some(new_i) if new_i < self.capacity => slots[new_i] = Some(entry),
                _ => entry.layout.dispose(),
            }
        }
        self.slots = slots;
    }

    /// Slot of `line`, if it lies inside the window.
    fn slot_of(&self, line: usize) -> Option<usize> {
        let top = self.top?;
        let slot = line.checked_sub(top)?;
        (slot < self.capacity).then_some(slot)
    }

    /// Cached layout of `line`, ignoring validity.
    #[must_use]
    pub fn get(&self, line: usize) -> Option<&CachedLayout<L>> {
        let slot = self.slot_of(line)?;
        self.slots.get(slot)?.as_ref()
    }

    /// Cached layout of `line` if it was built with `options` from a line of
    /// `text_len` chars and its size is still known.
    #[must_use]
    pub fn lookup(
        &self,
        line: usize,
        options: &FormatOptions,
        text_len: usize,
        can_layout: bool,
    ) -> Option<&L> {
        if !can_layout {
            return None;
        }
        self.get(line)
            .filter(|entry| entry.text_len == text_len && entry.options == *options)
            .map(|entry| &entry.layout)
    }

    /// Cache a layout for `line`, disposing whatever the slot held.
    ///
    /// A line outside the window is handed back to the caller.
    pub fn store(&mut self, line: usize, entry: CachedLayout<L>) -> Result<&L, CachedLayout<L>> {
        let Some(slot) = self.slot_of(line) else {
            return Err(entry);
        };
        if self.slots.is_empty() {
            self.slots = Self::empty_slots(self.capacity);
        }
        let cell = &mut self.slots[slot];
        if let Some(old) = cell.take() {
            old.layout.dispose();
        }
        Ok(&cell.insert(entry).layout)
    }

    /// Dispose the layout of one line.
    pub fn invalidate(&mut self, line: usize) {
        if let Some(slot) = self.slot_of(line) {
            if let Some(entry) = self.slots.get_mut(slot).and_then(Option::take) {
                entry.layout.dispose();
            }
        }
    }

    /// Dispose the layouts of a line range.
    pub fn invalidate_range(&mut self, lines: Range<usize>) {
        let window = self.window();
        let from = lines.start.max(window.start);
        let to = lines.end.min(window.end);
        for line in from..to {
            self.invalidate(line);
        }
    }

    /// Dispose every layout. The window anchor is kept.
    pub fn clear(&mut self) {
        for entry in std::mem::take(&mut self.slots).into_iter().flatten() {
            entry.layout.dispose();
        }
    }

    /// Dispose every layout and forget the window anchor.
    pub fn reset(&mut self) {
        self.clear();
        self.top = None;
    }

    /// Dispose the layouts of the edited lines and move later layouts by the
    /// line delta.
    pub fn apply_edit(&mut self, start_line: usize, replaced_lines: usize, new_lines: usize) {
        let Some(top) = self.top else {
            return;
        };
        if self.slots.is_empty() {
            return;
        }
        // Window-relative, may start above the window.
        let edit_start = start_line as isize - top as isize;
        let edit_end = edit_start + replaced_lines as isize + 1;
        let delta = new_lines as isize - replaced_lines as isize;

        let mut slots = Self::empty_slots(self.capacity);
        for (i, slot) in std::mem::take(&mut self.slots).into_iter().enumerate() {
            let Some(entry) = slot else {
                continue;
            };
            let i = i as isize;
            let target = if i < edit_start {
                Some(i)
            } else if i < edit_end {
                None
            } else {
                Some(i + delta)
            };
            match target {
                Some(t) if (0..self.capacity as isize).contains(&t) => {
                    slots[t as usize] = Some(entry);
                }
                _ => entry.layout.dispose(),
            }
        }
        self.slots = slots;
    }

    fn empty_slots(capacity: usize) -> Vec<Option<CachedLayout<L>>> {
        std::iter::repeat_with(|| None).take(capacity).collect()
    }
}

impl<L: ShapedLayout> Drop for LayoutCache<L> {
    fn drop(&mut self) {
        self.clear();
    }
}

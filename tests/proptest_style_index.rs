//! Property-based tests for the style interval index.
//!
//! Random assignment and edit sequences are replayed against a naive
//! one-style-per-char model.

use proptest::prelude::*;
use styled::{InsertPolicy, Rgba, StyleIndex, TextStyle};
use styledtext_rust as styled;

// ============================================================================
// Strategies
// ============================================================================

fn palette(i: u8) -> TextStyle {
    match i % 4 {
        0 => TextStyle::NONE,
        1 => TextStyle::bold(),
        2 => TextStyle::italic(),
        _ => TextStyle::fg(Rgba::RED),
    }
}

#[derive(Clone, Debug)]
enum Op {
    Assign { start: usize, len: usize, style: u8 },
    Edit { start: usize, removed: usize, inserted: usize },
}

fn op_strategy() -> impl Strategy<Value = Op> {
    prop_oneof![
        3 => (0usize..200, 0usize..40, 0u8..4)
            .prop_map(|(start, len, style)| Op::Assign { start, len, style }),
        2 => (0usize..200, 0usize..20, 0usize..20)
            .prop_map(|(start, removed, inserted)| Op::Edit { start, removed, inserted }),
    ]
}

/// Naive model: one optional style per char.
struct Model {
    chars: Vec<Option<TextStyle>>,
}

impl Model {
    fn new(len: usize) -> Self {
        Self {
            chars: vec![None; len],
        }
    }

    /// Clamp raw op offsets into the current text.
    fn clamp(&self, start: usize, len: usize) -> (usize, usize) {
        let start = start % (self.chars.len() + 1);
        let len = len % (self.chars.len() - start + 1);
        (start, len)
    }

    fn apply(&mut self, index: &mut StyleIndex, op: &Op, policy: InsertPolicy) {
        match *op {
            Op::Assign { start, len, style } => {
                let (start, len) = self.clamp(start, len);
                let style = palette(style);
                index.assign(start, len, &style);
                let value = (!style.is_unstyled()).then_some(style);
                self.chars[start..start + len].fill(value);
            }
            Op::Edit {
                start,
                removed,
                inserted,
            } => {
                let (start, removed) = self.clamp(start, removed);
                index.shift_on_edit(start, removed, inserted, policy);
                let fill = match policy {
                    // Equal neighbours with only equal chars between them are
                    // one entry, which the insert extends.
                    InsertPolicy::Inherit
                        if start > 0
                            && start + removed < self.chars.len()
                            && self.chars[start - 1].is_some()
                            && self.chars[start - 1..=start + removed]
                                .iter()
                                .all(|c| *c == self.chars[start - 1]) =>
                    {
                        self.chars[start - 1].clone()
                    }
                    _ => None,
                };
                self.chars
                    .splice(start..start + removed, std::iter::repeat_n(fill, inserted));
            }
        }
    }

    fn expand(index: &StyleIndex, len: usize) -> Vec<Option<TextStyle>> {
        let mut chars = Vec::with_capacity(len);
        for run in index.runs(0, len) {
            let style = run.style.map(|s| (*s).clone());
            chars.extend(std::iter::repeat_n(style, run.range.len()));
        }
        chars
    }
}

// ============================================================================
// Merge and Model Properties
// ============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    /// The merge invariant holds after every operation.
    #[test]
    fn index_stays_well_formed(ops in prop::collection::vec(op_strategy(), 1..60)) {
        let mut index = StyleIndex::new();
        let mut model = Model::new(120);
        for op in &ops {
            model.apply(&mut index, op, InsertPolicy::Plain);
            prop_assert!(index.is_well_formed(), "index malformed after {:?}", op);
        }
    }

    /// The index agrees with the per-char model under the plain policy.
    #[test]
    fn index_matches_model(ops in prop::collection::vec(op_strategy(), 1..60)) {
        let mut index = StyleIndex::new();
        let mut model = Model::new(120);
        for op in &ops {
            model.apply(&mut index, op, InsertPolicy::Plain);
        }
        let len = model.chars.len();
        prop_assert!(index.iter().all(|r| r.end() <= len));
        prop_assert_eq!(Model::expand(&index, len), model.chars);
    }

    /// Inherited inserts only ever extend the entry they land in.
    #[test]
    fn inherit_policy_matches_model(ops in prop::collection::vec(op_strategy(), 1..40)) {
        let mut index = StyleIndex::new();
        let mut model = Model::new(120);
        for op in &ops {
            model.apply(&mut index, op, InsertPolicy::Inherit);
            prop_assert!(index.is_well_formed());
        }
        let len = model.chars.len();
        prop_assert_eq!(Model::expand(&index, len), model.chars);
    }

    /// Distinct styles never exceed the palette size.
    #[test]
    fn styles_are_interned(ops in prop::collection::vec(op_strategy(), 1..60)) {
        let mut index = StyleIndex::new();
        let mut model = Model::new(120);
        for op in &ops {
            model.apply(&mut index, op, InsertPolicy::Plain);
        }
        prop_assert!(index.distinct_styles() <= 3);
    }
}

// ============================================================================
// Window Properties
// ============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(256))]

    /// Runs tile any window exactly, in order, without gaps.
    #[test]
    fn runs_cover_window(
        assigns in prop::collection::vec((0usize..100, 1usize..30, 1u8..4), 0..20),
        start in 0usize..120,
        len in 0usize..60,
    ) {
        let mut index = StyleIndex::new();
        for (s, l, style) in assigns {
            index.assign(s, l, &palette(style));
        }
        let runs = index.runs(start, len);
        let mut cursor = start;
        for run in &runs {
            prop_assert_eq!(run.range.start, cursor);
            prop_assert!(!run.range.is_empty());
            cursor = run.range.end;
        }
        prop_assert_eq!(cursor, start + len);
    }

    /// Query results are clipped to the window and agree with style_at.
    #[test]
    fn query_agrees_with_style_at(
        assigns in prop::collection::vec((0usize..100, 1usize..30, 1u8..4), 0..20),
        start in 0usize..120,
        len in 1usize..60,
    ) {
        let mut index = StyleIndex::new();
        for (s, l, style) in assigns {
            index.assign(s, l, &palette(style));
        }
        for range in index.query(start, len) {
            prop_assert!(range.start >= start && range.end() <= start + len);
            for offset in range.range() {
                prop_assert_eq!(index.style_at(offset), Some(&range.style));
            }
        }
    }
}

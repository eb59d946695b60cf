//! Fuzz target for style assignment and text edits.
//!
//! Drives a StyledText through arbitrary operations and checks that the
//! derived structures stay in step with the text.

#![no_main]

use arbitrary::Arbitrary;
use libfuzzer_sys::fuzz_target;
use styledtext_rust::{
    GlyphMetrics, Marker, MarkerKind, ShapedLayout, StyledText, TextContent, TextStyle,
};

#[derive(Arbitrary, Debug)]
enum Op {
    Style { start: u16, len: u8, kind: u8 },
    Replace { start: u16, len: u8, text: String },
    Marker { line: u8, count: u8, clear: bool },
    Scroll { top: u8 },
    Draw { line: u8 },
}

fn style(kind: u8) -> TextStyle {
    match kind % 4 {
        0 => TextStyle::NONE,
        1 => TextStyle::bold(),
        2 => TextStyle::italic(),
        _ => TextStyle::with_metrics(GlyphMetrics::new(20, 4, 12)),
    }
}

fuzz_target!(|ops: Vec<Op>| {
    let mut text = StyledText::default();
    let marker = Marker::new(MarkerKind::Number, TextStyle::NONE).shared();

    for op in ops.into_iter().take(64) {
        let chars = text.char_count();
        let lines = text.line_count();
        match op {
            Op::Style { start, len, kind } => {
                let start = usize::from(start) % (chars + 1);
                let len = usize::from(len).min(chars - start);
                text.set_style_range(start, len, &style(kind)).unwrap();
            }
            Op::Replace { start, len, text: insert } => {
                let start = usize::from(start) % (chars + 1);
                let len = usize::from(len).min(chars - start);
                text.replace_text_range(start, len, &insert).unwrap();
            }
            Op::Marker { line, count, clear } => {
                let line = usize::from(line) % lines;
                let count = usize::from(count).min(lines - line);
                let marker = (!clear).then_some(&marker);
                text.set_marker(line, count, marker).unwrap();
            }
            Op::Scroll { top } => {
                text.set_top_index(usize::from(top) % lines).unwrap();
            }
            Op::Draw { line } => {
                let line = usize::from(line) % lines;
                // Tabs under inline objects are shaped as spaces, so only
                // the length is compared.
                let expected = text.content().line(line).chars().count();
                let (shaped, height) = text
                    .with_layout(line, |l| (l.text().chars().count(), l.bounds().height))
                    .unwrap();
                assert_eq!(shaped, expected);
                assert_eq!(text.line_height(line).unwrap(), height);
            }
        }
        assert_eq!(text.renderer().metrics().len(), text.line_count());
        assert!(text.renderer().styles().is_well_formed());
    }
});

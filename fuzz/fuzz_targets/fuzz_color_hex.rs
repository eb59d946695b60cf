//! Fuzz target for color hex parsing.
//!
//! Rgba::from_hex must reject arbitrary strings with an error, never a panic.

#![no_main]

use libfuzzer_sys::fuzz_target;
use styledtext_rust::Rgba;

fuzz_target!(|data: &str| {
    if let Ok(color) = Rgba::from_hex(data) {
        // Anything accepted must survive a second parse with the prefix.
        if !data.starts_with('#') {
            assert_eq!(Rgba::from_hex(&format!("#{data}")), Ok(color));
        }
    }
});

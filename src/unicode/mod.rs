//! Unicode utilities for grapheme handling, display width and direction.

mod bidi;
mod grapheme;
mod width;

pub use bidi::{Direction, base_direction};
pub use grapheme::{GraphemeInfo, grapheme_info};
pub use width::{WidthMethod, display_width_char_with_method, display_width_with_method};

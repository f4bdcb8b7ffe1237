//! tinydash-render: Cairo rendering functions for tinydash widgets.
//!
//! Drawing primitives, Pango text helpers, sparklines, icons and the theme
//! engine. Everything here draws into a caller-supplied `cairo::Context`
//! and is synchronous.

pub mod icons;
pub mod pango_text;
pub mod primitives;
pub mod sparkline;
pub mod text;
pub mod theme;

pub use icons::{draw_icon, Icon};
pub use pango_text::{draw_text, fit_font_size, text_extents, truncate_to_width, Font, HAlign, TextExtents, VAlign};
pub use primitives::{draw_arc_gauge, draw_bar, draw_border, draw_dot, draw_panel, draw_placeholder, rounded_rectangle};
pub use sparkline::{draw_sparkline, observed_range, resample, SparklineStyle};
pub use text::{format_duration, format_number, format_value_with_unit, truncate_chars, truncate_with, TruncateStyle};
pub use theme::{font, FontRole, ThemeEngine};

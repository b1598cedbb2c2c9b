//! kbhint CSS - colors and contrast
//!
//! Parses computed background colors, measures their relative luminance and
//! picks the overlay palette that stays legible on top of them.

mod color;
mod luminance;
mod palette;

pub use color::Color;
pub use luminance::relative_luminance;
pub use palette::{choose_palette, OverlayPalette, PaletteKind, LUMINANCE_THRESHOLD};

/// Color parse errors
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ColorError {
    #[error("empty color value")]
    Empty,
    #[error("invalid hex color {0:?}")]
    InvalidHex(String),
    #[error("invalid color function {0:?}")]
    InvalidFunction(String),
    #[error("unknown color {0:?}")]
    Unknown(String),
}

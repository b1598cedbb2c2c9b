//! Overlay palettes
//!
//! Light backgrounds get a dark semi-opaque chip, dark backgrounds a light
//! translucent one. Text is white in both.

use crate::{relative_luminance, Color};

/// Luminance at or above which the dark chip is used
pub const LUMINANCE_THRESHOLD: f64 = 0.5;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PaletteKind {
    /// Dark chip for light backgrounds
    Dark,
    /// Light chip for dark backgrounds
    Light,
}

/// Inline style values applied to an overlay node
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OverlayPalette {
    pub kind: PaletteKind,
    pub background: &'static str,
    pub color: &'static str,
    pub border: &'static str,
    pub box_shadow: &'static str,
}

impl OverlayPalette {
    pub const DARK: OverlayPalette = OverlayPalette {
        kind: PaletteKind::Dark,
        background: "rgba(0, 0, 0, 0.65)",
        color: "#fff",
        border: "1px solid rgba(255,255,255,0.15)",
        box_shadow: "0 1px 2px rgba(0,0,0,0.25)",
    };

    pub const LIGHT: OverlayPalette = OverlayPalette {
        kind: PaletteKind::Light,
        background: "rgba(255, 255, 255, 0.18)",
        color: "#fff",
        border: "1px solid rgba(255,255,255,0.22)",
        box_shadow: "0 1px 2px rgba(0,0,0,0.45)",
    };

    /// `(property, value)` pairs in application order
    pub fn declarations(&self) -> [(&'static str, &'static str); 4] {
        [
            ("background", self.background),
            ("color", self.color),
            ("border", self.border),
            ("box-shadow", self.box_shadow),
        ]
    }
}

/// Palette for a background luminance
pub fn choose_palette(luminance: f64) -> OverlayPalette {
    if luminance >= LUMINANCE_THRESHOLD {
        OverlayPalette::DARK
    } else {
        OverlayPalette::LIGHT
    }
}

impl From<Color> for OverlayPalette {
    fn from(background: Color) -> Self {
        choose_palette(relative_luminance(background))
    }
}

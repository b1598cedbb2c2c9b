//! Background color to palette, end to end

use kbhint_css::{choose_palette, relative_luminance, Color, OverlayPalette, PaletteKind};

fn palette_for(css: &str) -> OverlayPalette {
    choose_palette(relative_luminance(Color::parse_or_white(css)))
}

#[test]
fn test_white_background_gets_dark_chip() {
    let lum = relative_luminance(Color::parse_or_white("#ffffff"));
    assert!((lum - 1.0).abs() < 1e-12);
    assert_eq!(palette_for("#ffffff").background, "rgba(0, 0, 0, 0.65)");
}

#[test]
fn test_black_background_gets_light_chip() {
    assert_eq!(relative_luminance(Color::parse_or_white("rgb(0, 0, 0)")), 0.0);
    let palette = palette_for("rgb(0, 0, 0)");
    assert_eq!(palette.kind, PaletteKind::Light);
    assert_eq!(palette.border, "1px solid rgba(255,255,255,0.22)");
}

#[test]
fn test_video_site_dark_theme() {
    assert_eq!(palette_for("rgb(15, 15, 15)").kind, PaletteKind::Light);
    assert_eq!(palette_for("#0f0f0f").kind, PaletteKind::Light);
}

#[test]
fn test_garbage_counts_as_white() {
    assert_eq!(palette_for("linear-gradient(red, blue)").kind, PaletteKind::Dark);
}

#[test]
fn test_alpha_does_not_affect_luminance() {
    let opaque = relative_luminance(Color::rgb(10, 20, 30));
    let faded = relative_luminance(Color::rgba(10, 20, 30, 0.3));
    assert_eq!(opaque, faded);
}

//! Relative luminance (sRGB)

use crate::Color;

/// Linearize one 8-bit sRGB channel
fn srgb_to_linear(channel: u8) -> f64 {
    let x = f64::from(channel) / 255.0;
    if x <= 0.03928 {
        x / 12.92
    } else {
        ((x + 0.055) / 1.055).powf(2.4)
    }
}

/// Relative luminance in `[0, 1]`; alpha is ignored
pub fn relative_luminance(color: Color) -> f64 {
    0.2126 * srgb_to_linear(color.r) + 0.7152 * srgb_to_linear(color.g) + 0.0722 * srgb_to_linear(color.b)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extremes() {
        assert!((relative_luminance(Color::WHITE) - 1.0).abs() < 1e-12);
        assert_eq!(relative_luminance(Color::BLACK), 0.0);
    }

    #[test]
    fn test_linear_segment() {
        // 10/255 is below the 0.03928 knee
        assert!((srgb_to_linear(10) - (10.0 / 255.0) / 12.92).abs() < 1e-12);
    }

    #[test]
    fn test_mid_gray_is_dark() {
        assert!(relative_luminance(Color::rgb(128, 128, 128)) < 0.5);
        assert!(relative_luminance(Color::rgb(200, 200, 200)) > 0.5);
    }
}

//! CSS color values
//!
//! Accepts the forms a computed `background-color` comes back in (`rgb()`,
//! `rgba()`) plus the hex and named forms authors write inline.

use std::fmt;
use std::str::FromStr;

use crate::ColorError;

/// CSS color with a fractional alpha channel
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: f32,
}

impl Default for Color {
    fn default() -> Self {
        Self::WHITE
    }
}

impl Color {
    pub const TRANSPARENT: Color = Color { r: 0, g: 0, b: 0, a: 0.0 };
    pub const BLACK: Color = Color { r: 0, g: 0, b: 0, a: 1.0 };
    pub const WHITE: Color = Color { r: 255, g: 255, b: 255, a: 1.0 };

    pub fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b, a: 1.0 }
    }

    pub fn rgba(r: u8, g: u8, b: u8, a: f32) -> Self {
        Self { r, g, b, a: a.clamp(0.0, 1.0) }
    }

    /// Parse any supported color syntax
    pub fn parse(value: &str) -> Result<Self, ColorError> {
        let value = value.trim().to_ascii_lowercase();
        if value.is_empty() {
            return Err(ColorError::Empty);
        }
        if value.starts_with('#') {
            return Self::from_hex(&value).ok_or(ColorError::InvalidHex(value));
        }
        if value.starts_with("rgb") {
            return Self::from_function(&value).ok_or(ColorError::InvalidFunction(value));
        }
        Self::from_name(&value).ok_or(ColorError::Unknown(value))
    }

    /// Parse, falling back to opaque white on malformed input
    pub fn parse_or_white(value: &str) -> Self {
        Self::parse(value).unwrap_or_else(|e| {
            tracing::trace!("color fallback to white: {}", e);
            Self::WHITE
        })
    }

    /// Parse a hex color (#RGB, #RRGGBB)
    pub fn from_hex(hex: &str) -> Option<Self> {
        let hex = hex.strip_prefix('#')?;
        if !hex.is_ascii() {
            return None;
        }
        match hex.len() {
            3 => {
                let r = u8::from_str_radix(&hex[0..1], 16).ok()? * 17;
                let g = u8::from_str_radix(&hex[1..2], 16).ok()? * 17;
                let b = u8::from_str_radix(&hex[2..3], 16).ok()? * 17;
                Some(Self::rgb(r, g, b))
            }
            6 => {
                let r = u8::from_str_radix(&hex[0..2], 16).ok()?;
                let g = u8::from_str_radix(&hex[2..4], 16).ok()?;
                let b = u8::from_str_radix(&hex[4..6], 16).ok()?;
                Some(Self::rgb(r, g, b))
            }
            _ => None,
        }
    }

    /// Parse `rgb(r, g, b)` / `rgba(r, g, b, a)` with integer channels
    fn from_function(value: &str) -> Option<Self> {
        let open = value.find('(')?;
        let name = value[..open].trim();
        if name != "rgb" && name != "rgba" {
            return None;
        }
        let body = value[open + 1..].strip_suffix(')')?;
        let parts: Vec<&str> = body.split(',').map(str::trim).collect();
        if parts.len() != 3 && parts.len() != 4 {
            return None;
        }

        let channel = |s: &str| -> Option<u8> {
            if s.is_empty() || !s.bytes().all(|b| b.is_ascii_digit()) {
                return None;
            }
            Some(s.parse::<u32>().unwrap_or(u32::MAX).min(255) as u8)
        };
        let r = channel(parts[0])?;
        let g = channel(parts[1])?;
        let b = channel(parts[2])?;
        let a = match parts.get(3) {
            Some(alpha) => alpha.parse::<f32>().ok().filter(|a| a.is_finite())?,
            None => 1.0,
        };
        Some(Self::rgba(r, g, b, a))
    }

    /// Parse a named color
    pub fn from_name(name: &str) -> Option<Self> {
        Some(match name {
            "transparent" => Self::TRANSPARENT,
            "black" => Self::BLACK,
            "white" => Self::WHITE,
            "red" => Self::rgb(255, 0, 0),
            "green" => Self::rgb(0, 128, 0),
            "blue" => Self::rgb(0, 0, 255),
            "yellow" => Self::rgb(255, 255, 0),
            "cyan" | "aqua" => Self::rgb(0, 255, 255),
            "magenta" | "fuchsia" => Self::rgb(255, 0, 255),
            "gray" | "grey" => Self::rgb(128, 128, 128),
            "silver" => Self::rgb(192, 192, 192),
            "maroon" => Self::rgb(128, 0, 0),
            "olive" => Self::rgb(128, 128, 0),
            "lime" => Self::rgb(0, 255, 0),
            "navy" => Self::rgb(0, 0, 128),
            "purple" => Self::rgb(128, 0, 128),
            "teal" => Self::rgb(0, 128, 128),
            "orange" => Self::rgb(255, 165, 0),
            _ => return None,
        })
    }

    pub fn is_transparent(&self) -> bool {
        self.a <= 0.0
    }

    /// Whether a computed background value paints nothing
    pub fn is_transparent_value(value: &str) -> bool {
        let value = value.trim();
        value.is_empty() || Self::parse(value).is_ok_and(|c| c.is_transparent())
    }
}

impl FromStr for Color {
    type Err = ColorError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.a >= 1.0 {
            write!(f, "rgb({}, {}, {})", self.r, self.g, self.b)
        } else {
            write!(f, "rgba({}, {}, {}, {})", self.r, self.g, self.b, self.a)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hex() {
        assert_eq!(Color::parse("#fff"), Ok(Color::WHITE));
        assert_eq!(Color::parse("#0F0F0F"), Ok(Color::rgb(15, 15, 15)));
        assert!(matches!(Color::parse("#12345678"), Err(ColorError::InvalidHex(_))));
        assert!(matches!(Color::parse("#ggg"), Err(ColorError::InvalidHex(_))));
    }

    #[test]
    fn test_rgb_functions() {
        assert_eq!(Color::parse("rgb(24,24,24)"), Ok(Color::rgb(24, 24, 24)));
        assert_eq!(Color::parse("RGBA(0, 0, 0, 0)"), Ok(Color::TRANSPARENT));
        assert_eq!(Color::parse("rgba(255, 255, 255, 0.5)"), Ok(Color::rgba(255, 255, 255, 0.5)));
        assert_eq!(Color::parse("rgb(300, 0, 0)"), Ok(Color::rgb(255, 0, 0)));
        assert!(Color::parse("rgb(1.5, 0, 0)").is_err());
        assert!(Color::parse("rgb(1, 2)").is_err());
        assert!(Color::parse("rgbx(1, 2, 3)").is_err());
    }

    #[test]
    fn test_malformed_falls_back_to_white() {
        assert_eq!(Color::parse_or_white("hsl(0, 0%, 0%)"), Color::WHITE);
        assert_eq!(Color::parse_or_white(""), Color::WHITE);
        assert_eq!(Color::parse_or_white("navy"), Color::rgb(0, 0, 128));
    }

    #[test]
    fn test_transparent_values() {
        assert!(Color::is_transparent_value("transparent"));
        assert!(Color::is_transparent_value(""));
        assert!(Color::is_transparent_value("rgba(0, 0, 0, 0)"));
        assert!(Color::is_transparent_value("rgba(12, 40, 80, 0)"));
        assert!(!Color::is_transparent_value("rgba(0, 0, 0, 0.01)"));
        // Unparseable but present values count as painted
        assert!(!Color::is_transparent_value("var(--yt-bg)"));
    }

    #[test]
    fn test_display() {
        assert_eq!(Color::rgb(24, 24, 24).to_string(), "rgb(24, 24, 24)");
        assert_eq!(Color::rgba(0, 0, 0, 0.65).to_string(), "rgba(0, 0, 0, 0.65)");
    }
}

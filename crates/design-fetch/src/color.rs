//! Opaque sRGB colors and WCAG contrast.

use crate::error::DesignError;
use std::fmt;

/// A fully opaque sRGB color.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    pub const WHITE: Rgb = Rgb::new(255, 255, 255);
    pub const BLACK: Rgb = Rgb::new(0, 0, 0);

    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// Parse a computed CSS color and drop its alpha channel.
    ///
    /// Whatever sits behind a translucent layer is not observable from a
    /// computed style, so the channels are kept as-is and alpha is forced to 1.
    pub fn parse_opaque(value: &str) -> Result<Self, DesignError> {
        let parsed = csscolorparser::parse(value.trim())
            .map_err(|_| DesignError::UnparseableColor(value.to_string()))?;
        let [r, g, b, _] = parsed.to_rgba8();
        Ok(Self { r, g, b })
    }

    /// WCAG 2.x relative luminance.
    pub fn relative_luminance(self) -> f64 {
        0.2126 * linearize(self.r) + 0.7152 * linearize(self.g) + 0.0722 * linearize(self.b)
    }

    /// WCAG contrast ratio, from 1 (identical) to 21 (black on white).
    pub fn contrast_ratio(self, other: Rgb) -> f64 {
        let (a, b) = (self.relative_luminance(), other.relative_luminance());
        let (lighter, darker) = if a >= b { (a, b) } else { (b, a) };
        (lighter + 0.05) / (darker + 0.05)
    }

    /// Short hex form for the pure black/white substitutes.
    pub fn short_hex(self) -> Option<&'static str> {
        match self {
            Rgb::WHITE => Some("#fff"),
            Rgb::BLACK => Some("#000"),
            _ => None,
        }
    }
}

impl fmt::Display for Rgb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "rgb({}, {}, {})", self.r, self.g, self.b)
    }
}

fn linearize(channel: u8) -> f64 {
    let c = channel as f64 / 255.0;
    if c <= 0.04045 {
        c / 12.92
    } else {
        ((c + 0.055) / 1.055).powf(2.4)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_computed_styles() {
        assert_eq!(
            Rgb::parse_opaque("rgb(10, 10, 10)").unwrap(),
            Rgb::new(10, 10, 10)
        );
        assert_eq!(
            Rgb::parse_opaque(" rgba(255, 0, 0, 0.5) ").unwrap(),
            Rgb::new(255, 0, 0)
        );
        assert_eq!(Rgb::parse_opaque("#336699").unwrap(), Rgb::new(0x33, 0x66, 0x99));
    }

    #[test]
    fn test_transparent_becomes_opaque_black() {
        // Chromium reports an unset background as rgba(0, 0, 0, 0)
        assert_eq!(Rgb::parse_opaque("rgba(0, 0, 0, 0)").unwrap(), Rgb::BLACK);
    }

    #[test]
    fn test_parse_garbage_is_an_error() {
        let err = Rgb::parse_opaque("not-a-color").unwrap_err();
        assert!(matches!(err, DesignError::UnparseableColor(v) if v == "not-a-color"));
    }

    #[test]
    fn test_contrast_known_pairs() {
        let bw = Rgb::BLACK.contrast_ratio(Rgb::WHITE);
        assert!((bw - 21.0).abs() < 1e-9);
        assert!((Rgb::WHITE.contrast_ratio(Rgb::BLACK) - bw).abs() < 1e-12);
        assert!((Rgb::new(10, 10, 10).contrast_ratio(Rgb::BLACK) - 1.0).abs() < 0.1);
        // #767676 on white is the classic 4.54:1 pair
        let grey = Rgb::new(0x76, 0x76, 0x76).contrast_ratio(Rgb::WHITE);
        assert!((grey - 4.54).abs() < 0.01);
    }

    #[test]
    fn test_display_forms() {
        assert_eq!(Rgb::new(1, 2, 3).to_string(), "rgb(1, 2, 3)");
        assert_eq!(Rgb::WHITE.short_hex(), Some("#fff"));
        assert_eq!(Rgb::BLACK.short_hex(), Some("#000"));
        assert_eq!(Rgb::new(1, 2, 3).short_hex(), None);
    }
}

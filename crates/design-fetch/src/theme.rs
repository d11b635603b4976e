//! Resolve background and text colors from a page's dominant region.

use crate::color::Rgb;
use crate::error::{DesignError, Result};
use crate::renderer::RenderContext;
use crate::types::{ColorProbe, Region};
use tracing::debug;

/// Background/text pair for one presentation mode.
#[derive(Debug, Clone, PartialEq)]
pub struct ThemeColors {
    pub background_color: String,
    pub text_color: String,
    pub raw_text_color: String,
    pub text_color_adjusted_for_contrast: bool,
}

/// Outcome of checking a text color against a background.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ContrastDecision {
    pub text: Rgb,
    pub adjusted: bool,
    pub ratio: f64,
}

/// Largest region by area; the first one wins ties.
pub fn dominant_region(regions: &[Region]) -> Option<Region> {
    regions.iter().copied().fold(None, |best, region| match best {
        Some(b) if b.area() >= region.area() => Some(b),
        _ => Some(region),
    })
}

/// Keep `raw` if it reaches `threshold` against `background`, otherwise use
/// whichever of white or black contrasts more.
pub fn ensure_readable(background: Rgb, raw: Rgb, threshold: f64) -> ContrastDecision {
    let ratio = raw.contrast_ratio(background);
    if ratio >= threshold {
        return ContrastDecision {
            text: raw,
            adjusted: false,
            ratio,
        };
    }

    let on_white = Rgb::WHITE.contrast_ratio(background);
    let on_black = Rgb::BLACK.contrast_ratio(background);
    let text = if on_white >= on_black {
        Rgb::WHITE
    } else {
        Rgb::BLACK
    };
    ContrastDecision {
        text,
        adjusted: true,
        ratio,
    }
}

/// Reads the dominant region's colors and guarantees readable text.
#[derive(Debug, Clone, Copy)]
pub struct ThemeColorResolver {
    contrast_threshold: f64,
}

impl ThemeColorResolver {
    pub fn new(contrast_threshold: f64) -> Self {
        Self { contrast_threshold }
    }

    pub async fn resolve(&self, context: &dyn RenderContext) -> Result<ThemeColors> {
        let regions = context.query_regions().await?;
        let region = dominant_region(&regions).ok_or(DesignError::NoDominantRegion)?;

        let background = context
            .query_computed_color(ColorProbe::Background(region.index))
            .await?;
        let text = context
            .query_computed_color(ColorProbe::Text(region.index))
            .await?;

        let colors = self.resolve_from_computed(&background, &text)?;
        debug!(
            region = region.index,
            background = %colors.background_color,
            text = %colors.text_color,
            adjusted = colors.text_color_adjusted_for_contrast,
            "resolved theme colors"
        );
        Ok(colors)
    }

    /// Resolve from raw computed-style strings.
    pub fn resolve_from_computed(&self, background: &str, text: &str) -> Result<ThemeColors> {
        let background = Rgb::parse_opaque(background)?;
        let raw = Rgb::parse_opaque(text)?;
        let decision = ensure_readable(background, raw, self.contrast_threshold);

        let text_color = if decision.adjusted {
            decision
                .text
                .short_hex()
                .map(str::to_string)
                .unwrap_or_else(|| decision.text.to_string())
        } else {
            raw.to_string()
        };

        Ok(ThemeColors {
            background_color: background.to_string(),
            text_color,
            raw_text_color: raw.to_string(),
            text_color_adjusted_for_contrast: decision.adjusted,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn region(index: usize, width: f64, height: f64) -> Region {
        Region {
            index,
            width,
            height,
        }
    }

    #[test]
    fn test_dominant_region_is_largest() {
        let regions = [
            region(0, 1080.0, 100.0),
            region(1, 1080.0, 900.0),
            region(2, 1080.0, 50.0),
        ];
        assert_eq!(dominant_region(&regions).unwrap().index, 1);
    }

    #[test]
    fn test_dominant_region_tie_keeps_first() {
        let regions = [region(0, 100.0, 100.0), region(1, 50.0, 200.0)];
        assert_eq!(dominant_region(&regions).unwrap().index, 0);
    }

    #[test]
    fn test_dominant_region_empty() {
        assert!(dominant_region(&[]).is_none());
    }

    #[test]
    fn test_readable_text_kept() {
        let resolver = ThemeColorResolver::new(6.0);
        let colors = resolver
            .resolve_from_computed("rgb(255, 255, 255)", "rgb(17, 17, 17)")
            .unwrap();
        assert!(!colors.text_color_adjusted_for_contrast);
        assert_eq!(colors.text_color, colors.raw_text_color);
        assert_eq!(colors.text_color, "rgb(17, 17, 17)");
    }

    #[test]
    fn test_dark_background_with_default_black_text() {
        let resolver = ThemeColorResolver::new(6.0);
        let colors = resolver
            .resolve_from_computed("rgb(10, 10, 10)", "rgb(0, 0, 0)")
            .unwrap();
        assert!(colors.text_color_adjusted_for_contrast);
        assert_eq!(colors.text_color, "#fff");
        assert_eq!(colors.raw_text_color, "rgb(0, 0, 0)");
        assert_eq!(colors.background_color, "rgb(10, 10, 10)");
    }

    #[test]
    fn test_light_background_low_contrast_gets_black() {
        let decision = ensure_readable(
            Rgb::new(240, 240, 240),
            Rgb::new(200, 200, 200),
            6.0,
        );
        assert!(decision.adjusted);
        assert_eq!(decision.text, Rgb::BLACK);
        assert!(decision.ratio < 6.0);
    }

    #[test]
    fn test_translucent_background_alpha_dropped() {
        let resolver = ThemeColorResolver::new(6.0);
        let colors = resolver
            .resolve_from_computed("rgba(255, 255, 255, 0.2)", "rgba(0, 0, 0, 0.87)")
            .unwrap();
        assert_eq!(colors.background_color, "rgb(255, 255, 255)");
        assert_eq!(colors.raw_text_color, "rgb(0, 0, 0)");
        assert!(!colors.text_color_adjusted_for_contrast);
    }

    #[test]
    fn test_threshold_boundary_is_inclusive() {
        let background = Rgb::WHITE;
        let raw = Rgb::new(0x76, 0x76, 0x76);
        let ratio = raw.contrast_ratio(background);
        assert!(!ensure_readable(background, raw, ratio).adjusted);
        assert!(ensure_readable(background, raw, ratio + 0.01).adjusted);
    }
}

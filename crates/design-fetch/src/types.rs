//! Core data types shared by the renderer, the scorers and the HTTP layer.

use serde::{Deserialize, Serialize};

/// Natural size reported for inline vector graphics, which scale without limit.
pub const VECTOR_NATURAL_SIZE: f64 = 100_000.0;

/// Presentation mode emulated through `prefers-color-scheme`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ColorScheme {
    Light,
    Dark,
}

impl ColorScheme {
    /// Value of the `prefers-color-scheme` media feature.
    pub fn as_media_value(self) -> &'static str {
        match self {
            ColorScheme::Light => "light",
            ColorScheme::Dark => "dark",
        }
    }
}

impl std::fmt::Display for ColorScheme {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_media_value())
    }
}

/// Layout viewport in CSS pixels.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Viewport {
    pub width: f64,
    pub height: f64,
}

impl Default for Viewport {
    fn default() -> Self {
        Self {
            width: 1080.0,
            height: 1024.0,
        }
    }
}

/// A top-level content region: the root container (index 0) or one of its
/// direct element children.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Region {
    pub index: usize,
    pub width: f64,
    pub height: f64,
}

impl Region {
    pub fn area(&self) -> f64 {
        self.width * self.height
    }
}

/// What to read a computed color from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColorProbe {
    /// `background-color` of the region.
    Background(usize),
    /// `color` a bare text node directly inside the region inherits.
    Text(usize),
}

/// Attributes and geometry every candidate carries.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ElementBox {
    /// Lowercased tag name, kept for diagnostics.
    #[serde(default)]
    pub tag: String,
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub class_name: Option<String>,
    #[serde(default)]
    pub alt: Option<String>,
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
    /// Some ancestor is a nav/header landmark.
    #[serde(default)]
    pub in_navigation: bool,
    /// Some ancestor is a button or carries `role="button"`.
    #[serde(default)]
    pub in_interactive_control: bool,
}

/// A visual node that may depict the site's logo.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum VisualElement {
    /// An `<img>` with a resolved source.
    #[serde(rename_all = "camelCase")]
    Image {
        #[serde(flatten)]
        element: ElementBox,
        src: Option<String>,
        natural_width: f64,
        natural_height: f64,
    },
    /// An inline `<svg>`, serialized with its computed `color` and `fill` baked in.
    #[serde(rename_all = "camelCase")]
    Vector {
        #[serde(flatten)]
        element: ElementBox,
        raw_svg: String,
    },
    /// Any other element painting a CSS `background-image`.
    #[serde(rename_all = "camelCase")]
    BackgroundImage {
        #[serde(flatten)]
        element: ElementBox,
        src: Option<String>,
    },
}

impl VisualElement {
    pub fn element(&self) -> &ElementBox {
        match self {
            VisualElement::Image { element, .. }
            | VisualElement::Vector { element, .. }
            | VisualElement::BackgroundImage { element, .. } => element,
        }
    }

    /// Intrinsic size of the depicted resource.
    pub fn natural_size(&self) -> (f64, f64) {
        match self {
            VisualElement::Image {
                natural_width,
                natural_height,
                ..
            } => (*natural_width, *natural_height),
            VisualElement::Vector { .. } => (VECTOR_NATURAL_SIZE, VECTOR_NATURAL_SIZE),
            VisualElement::BackgroundImage { element, .. } => (element.width, element.height),
        }
    }

    pub fn src(&self) -> Option<&str> {
        match self {
            VisualElement::Image { src, .. } | VisualElement::BackgroundImage { src, .. } => {
                src.as_deref().filter(|s| !s.is_empty())
            }
            VisualElement::Vector { .. } => None,
        }
    }

    pub fn raw_svg(&self) -> Option<&str> {
        match self {
            VisualElement::Vector { raw_svg, .. } if !raw_svg.is_empty() => Some(raw_svg),
            _ => None,
        }
    }
}

/// The chosen logo in a shape that renders outside the original page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum ExtractedLogo {
    HostedImage {
        src: String,
    },
    #[serde(rename_all = "camelCase")]
    InlinedSvg {
        raw_svg: String,
    },
}

/// Theme extracted for one presentation mode.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExtractedTheme {
    pub logo: Option<ExtractedLogo>,
    pub background_color: String,
    pub text_color: String,
    pub raw_text_color: String,
    pub text_color_adjusted_for_contrast: bool,
}

/// Light and dark themes for one URL.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExtractedDesign {
    pub url: String,
    pub light_mode: ExtractedTheme,
    pub dark_mode: ExtractedTheme,
}

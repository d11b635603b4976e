//! Extract a site's design fingerprint: background and text colors plus the
//! most likely logo, once with a light color-scheme preference and once
//! with a dark one.
//!
//! The engine talks to a browser only through the [`renderer::Renderer`]
//! and [`renderer::RenderContext`] traits. [`renderer::chromium`] drives a
//! headless Chromium; tests use the scripted renderer behind the `testing`
//! feature.

pub mod color;
pub mod config;
pub mod error;
pub mod logo;
pub mod orchestrator;
pub mod pool;
pub mod renderer;
pub mod stabilize;
pub mod target;
pub mod theme;
pub mod types;

pub use config::ExtractionConfig;
pub use error::{DesignError, Result};
pub use orchestrator::DesignExtractor;
pub use target::NormalizedUrl;
pub use types::{ColorScheme, ExtractedDesign, ExtractedLogo, ExtractedTheme};

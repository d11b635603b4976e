//! Renderer abstraction: the browser capabilities the engine consumes.
//!
//! A [`Renderer`] hands out isolated [`RenderContext`]s, each with a
//! color-scheme preference applied. Everything the engine knows about a
//! page comes through these two traits.

pub mod chromium;
#[cfg(any(test, feature = "testing"))]
pub mod scripted;
mod scripts;

use crate::types::{ColorProbe, ColorScheme, Region, Viewport, VisualElement};
use anyhow::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Outcome of a navigation or reload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NavigationResult {
    /// URL after redirects.
    pub final_url: String,
    pub load_time_ms: u64,
}

/// Opens rendering contexts.
#[async_trait]
pub trait Renderer: Send + Sync {
    /// Open an isolated context with `scheme` emulated for
    /// `prefers-color-scheme`.
    async fn new_context(&self, scheme: ColorScheme) -> Result<Box<dyn RenderContext>>;
}

/// A single isolated browsing context.
#[async_trait]
pub trait RenderContext: Send + Sync {
    /// Navigate and wait until the DOM is ready.
    async fn navigate(&mut self, url: &str, timeout_ms: u64) -> Result<NavigationResult>;

    /// Force a full reload of the current document.
    async fn reload(&mut self, timeout_ms: u64) -> Result<NavigationResult>;

    /// Serialized visible content, compared verbatim between polls.
    async fn sample_visible_content(&self) -> Result<String>;

    /// The root content container followed by its direct element children.
    async fn query_regions(&self) -> Result<Vec<Region>>;

    /// Raw computed color string for `query`.
    async fn query_computed_color(&self, query: ColorProbe) -> Result<String>;

    /// Logo candidates in document order.
    async fn query_visual_elements(&self) -> Result<Vec<VisualElement>>;

    async fn viewport_size(&self) -> Result<Viewport>;

    /// Computed font size of the document element, in pixels.
    async fn root_font_size(&self) -> Result<f64>;

    async fn current_url(&self) -> Result<Option<String>>;

    /// Tear the context down.
    async fn close(self: Box<Self>) -> Result<()>;
}

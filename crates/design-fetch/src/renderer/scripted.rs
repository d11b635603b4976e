//! In-memory renderer that replays canned pages, for tests.

use super::{NavigationResult, RenderContext, Renderer};
use crate::types::{ColorProbe, ColorScheme, Region, Viewport, VisualElement};
use anyhow::{anyhow, bail, Result};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

/// A canned page as one presentation mode would render it.
#[derive(Debug, Clone)]
pub struct ScriptedPage {
    /// Successive content samples; the last one repeats forever.
    pub samples: Vec<String>,
    pub regions: Vec<Region>,
    /// Computed background color per region index.
    pub backgrounds: HashMap<usize, String>,
    /// Computed text color per region index.
    pub text_colors: HashMap<usize, String>,
    pub elements: Vec<VisualElement>,
    pub viewport: Viewport,
    pub root_font_size: f64,
    /// Every sample differs from the previous one, so the page never settles.
    pub never_settles: bool,
}

impl Default for ScriptedPage {
    fn default() -> Self {
        Self {
            samples: vec!["<main></main>".to_string()],
            regions: vec![Region {
                index: 0,
                width: 1080.0,
                height: 1024.0,
            }],
            backgrounds: HashMap::from([(0, "rgb(255, 255, 255)".to_string())]),
            text_colors: HashMap::from([(0, "rgb(0, 0, 0)".to_string())]),
            elements: Vec::new(),
            viewport: Viewport::default(),
            root_font_size: 16.0,
            never_settles: false,
        }
    }
}

impl ScriptedPage {
    /// Single-region page with the given computed colors.
    pub fn with_colors(background: &str, text: &str) -> Self {
        Self {
            backgrounds: HashMap::from([(0, background.to_string())]),
            text_colors: HashMap::from([(0, text.to_string())]),
            ..Self::default()
        }
    }

    pub fn with_elements(mut self, elements: Vec<VisualElement>) -> Self {
        self.elements = elements;
        self
    }

    pub fn never_settling(mut self) -> Self {
        self.never_settles = true;
        self
    }
}

/// Replays one [`ScriptedPage`] per color scheme and records every call.
#[derive(Debug, Clone, Default)]
pub struct ScriptedRenderer {
    pages: HashMap<ColorScheme, ScriptedPage>,
    fail_navigation_for: Option<ColorScheme>,
    calls: Arc<Mutex<Vec<String>>>,
}

impl ScriptedRenderer {
    /// Same page in both modes.
    pub fn new(page: ScriptedPage) -> Self {
        Self::default()
            .with_page(ColorScheme::Light, page.clone())
            .with_page(ColorScheme::Dark, page)
    }

    pub fn with_page(mut self, scheme: ColorScheme, page: ScriptedPage) -> Self {
        self.pages.insert(scheme, page);
        self
    }

    /// Make navigation fail in contexts opened for `scheme`.
    pub fn failing_navigation(mut self, scheme: ColorScheme) -> Self {
        self.fail_navigation_for = Some(scheme);
        self
    }

    /// Calls made so far, e.g. `"dark: navigate https://example.com/"`.
    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().map(|c| c.clone()).unwrap_or_default()
    }

    /// Calls made by contexts of one scheme, without the scheme prefix.
    pub fn calls_for(&self, scheme: ColorScheme) -> Vec<String> {
        let prefix = format!("{scheme}: ");
        self.calls()
            .into_iter()
            .filter_map(|c| c.strip_prefix(&prefix).map(str::to_string))
            .collect()
    }
}

#[async_trait]
impl Renderer for ScriptedRenderer {
    async fn new_context(&self, scheme: ColorScheme) -> Result<Box<dyn RenderContext>> {
        let page = self
            .pages
            .get(&scheme)
            .cloned()
            .ok_or_else(|| anyhow!("no scripted page for {scheme}"))?;
        let context = ScriptedContext {
            scheme,
            page,
            url: None,
            cursor: Mutex::new(0),
            fail_navigation: self.fail_navigation_for == Some(scheme),
            calls: Arc::clone(&self.calls),
        };
        context.record("open");
        Ok(Box::new(context))
    }
}

struct ScriptedContext {
    scheme: ColorScheme,
    page: ScriptedPage,
    url: Option<String>,
    cursor: Mutex<usize>,
    fail_navigation: bool,
    calls: Arc<Mutex<Vec<String>>>,
}

impl ScriptedContext {
    fn record(&self, call: impl AsRef<str>) {
        if let Ok(mut calls) = self.calls.lock() {
            calls.push(format!("{}: {}", self.scheme, call.as_ref()));
        }
    }

    fn loaded(&self) -> Result<NavigationResult> {
        let final_url = self.url.clone().ok_or_else(|| anyhow!("no page loaded"))?;
        Ok(NavigationResult {
            final_url,
            load_time_ms: 0,
        })
    }

    fn color(&self, table: &HashMap<usize, String>, index: usize) -> Result<String> {
        table
            .get(&index)
            .cloned()
            .ok_or_else(|| anyhow!("region {index} has no scripted color"))
    }
}

#[async_trait]
impl RenderContext for ScriptedContext {
    async fn navigate(&mut self, url: &str, _timeout_ms: u64) -> Result<NavigationResult> {
        self.record(format!("navigate {url}"));
        if self.fail_navigation {
            bail!("net::ERR_NAME_NOT_RESOLVED at {url}");
        }
        self.url = Some(url.to_string());
        self.loaded()
    }

    async fn reload(&mut self, _timeout_ms: u64) -> Result<NavigationResult> {
        self.record("reload");
        if let Ok(mut cursor) = self.cursor.lock() {
            *cursor = 0;
        }
        self.loaded()
    }

    async fn sample_visible_content(&self) -> Result<String> {
        self.record("sample");
        let mut cursor = self
            .cursor
            .lock()
            .map_err(|_| anyhow!("sample cursor poisoned"))?;
        let last = self.page.samples.len().saturating_sub(1);
        let mut sample = self
            .page
            .samples
            .get((*cursor).min(last))
            .cloned()
            .unwrap_or_default();
        if self.page.never_settles {
            sample.push_str(&format!("<!-- {} -->", *cursor));
        }
        *cursor += 1;
        Ok(sample)
    }

    async fn query_regions(&self) -> Result<Vec<Region>> {
        self.record("query regions");
        Ok(self.page.regions.clone())
    }

    async fn query_computed_color(&self, query: ColorProbe) -> Result<String> {
        match query {
            ColorProbe::Background(i) => self.color(&self.page.backgrounds, i),
            ColorProbe::Text(i) => self.color(&self.page.text_colors, i),
        }
    }

    async fn query_visual_elements(&self) -> Result<Vec<VisualElement>> {
        self.record("query elements");
        Ok(self.page.elements.clone())
    }

    async fn viewport_size(&self) -> Result<Viewport> {
        Ok(self.page.viewport)
    }

    async fn root_font_size(&self) -> Result<f64> {
        Ok(self.page.root_font_size)
    }

    async fn current_url(&self) -> Result<Option<String>> {
        Ok(self.url.clone())
    }

    async fn close(self: Box<Self>) -> Result<()> {
        self.record("close");
        Ok(())
    }
}

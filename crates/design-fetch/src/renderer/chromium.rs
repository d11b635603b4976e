//! Headless Chromium renderer over the DevTools protocol.

use super::{scripts, NavigationResult, RenderContext, Renderer};
use crate::types::{ColorProbe, ColorScheme, Region, Viewport, VisualElement};
use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use chromiumoxide::browser::{Browser, BrowserConfig};
use chromiumoxide::cdp::browser_protocol::browser::BrowserContextId;
use chromiumoxide::cdp::browser_protocol::emulation::{
    MediaFeature, SetDeviceMetricsOverrideParams, SetEmulatedMediaParams,
};
use chromiumoxide::cdp::browser_protocol::target::{
    CreateBrowserContextParams, CreateTargetParams, DisposeBrowserContextParams,
};
use chromiumoxide::page::Page;
use futures::StreamExt;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

/// Browser launch settings.
#[derive(Debug, Clone, Default)]
pub struct ChromiumOptions {
    /// Browser binary; found automatically when unset.
    pub executable: Option<PathBuf>,
    /// Needed when running as root inside containers.
    pub no_sandbox: bool,
    pub viewport: Viewport,
}

/// Find a Chromium binary: `DESIGN_FETCH_CHROMIUM_PATH`, then `PATH`.
pub fn find_chromium() -> Option<PathBuf> {
    if let Ok(p) = std::env::var("DESIGN_FETCH_CHROMIUM_PATH") {
        let path = PathBuf::from(&p);
        if path.exists() {
            return Some(path);
        }
        warn!("DESIGN_FETCH_CHROMIUM_PATH={p} does not exist, searching PATH");
    }

    ["google-chrome", "google-chrome-stable", "chromium", "chromium-browser"]
        .iter()
        .find_map(|name| which::which(name).ok())
}

/// A running headless browser.
pub struct ChromiumRenderer {
    browser: Arc<Mutex<Browser>>,
    handler: JoinHandle<()>,
    viewport: Viewport,
}

impl ChromiumRenderer {
    /// Launch the browser and start its event loop.
    pub async fn launch(options: ChromiumOptions) -> Result<Self> {
        let viewport = options.viewport;
        let mut builder =
            BrowserConfig::builder().window_size(viewport.width as u32, viewport.height as u32);
        if let Some(path) = options.executable.or_else(find_chromium) {
            info!("using chromium at {}", path.display());
            builder = builder.chrome_executable(path);
        }
        if options.no_sandbox {
            builder = builder.no_sandbox();
        }
        let config = builder
            .build()
            .map_err(|e| anyhow!("browser config error: {e}"))?;

        let (browser, mut handler) = Browser::launch(config)
            .await
            .context("launching chromium")?;

        let handler = tokio::spawn(async move {
            while let Some(event) = handler.next().await {
                if let Err(e) = event {
                    debug!("browser event error: {e}");
                }
            }
        });

        Ok(Self {
            browser: Arc::new(Mutex::new(browser)),
            handler,
            viewport,
        })
    }

    /// Close the browser process.
    pub async fn shutdown(&self) -> Result<()> {
        let mut browser = self.browser.lock().await;
        browser.close().await.context("closing chromium")?;
        browser.wait().await.context("waiting for chromium to exit")?;
        self.handler.abort();
        Ok(())
    }
}

#[async_trait]
impl Renderer for ChromiumRenderer {
    async fn new_context(&self, scheme: ColorScheme) -> Result<Box<dyn RenderContext>> {
        let (page, browser_context) = {
            let browser = self.browser.lock().await;
            let browser_context = browser
                .execute(CreateBrowserContextParams::default())
                .await
                .context("creating browser context")?
                .result
                .browser_context_id;
            let target = CreateTargetParams::builder()
                .url("about:blank")
                .browser_context_id(browser_context.clone())
                .build()
                .map_err(|e| anyhow!("invalid target params: {e}"))?;
            let page = browser.new_page(target).await.context("opening page")?;
            (page, browser_context)
        };

        let context = ChromiumContext {
            page,
            browser_context,
            browser: Arc::clone(&self.browser),
        };
        let emulated = context.emulate(scheme, self.viewport).await;
        if let Err(e) = emulated {
            if let Err(close_err) = Box::new(context).close().await {
                warn!(%scheme, "failed to close context after emulation error: {close_err:#}");
            }
            return Err(e);
        }

        debug!(%scheme, "opened rendering context");
        Ok(Box::new(context))
    }
}

/// One page in its own browser context.
pub struct ChromiumContext {
    page: Page,
    browser_context: BrowserContextId,
    browser: Arc<Mutex<Browser>>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct PageMetricsJs {
    width: f64,
    height: f64,
    root_font_size: f64,
}

impl ChromiumContext {
    async fn emulate(&self, scheme: ColorScheme, viewport: Viewport) -> Result<()> {
        self.page
            .execute(SetDeviceMetricsOverrideParams::new(
                viewport.width as i64,
                viewport.height as i64,
                1.0,
                false,
            ))
            .await
            .context("setting viewport")?;
        self.page
            .execute(SetEmulatedMediaParams {
                media: None,
                features: Some(vec![MediaFeature {
                    name: "prefers-color-scheme".to_string(),
                    value: scheme.as_media_value().to_string(),
                }]),
            })
            .await
            .context("emulating prefers-color-scheme")?;
        Ok(())
    }

    async fn eval<T: DeserializeOwned>(&self, script: &str) -> Result<T> {
        self.page
            .evaluate(script)
            .await
            .context("evaluating page script")?
            .into_value()
            .context("decoding page script result")
    }

    async fn eval_json<T: DeserializeOwned>(&self, script: &str) -> Result<T> {
        let raw: String = self.eval(script).await?;
        serde_json::from_str(&raw).context("parsing page script JSON")
    }

    async fn metrics(&self) -> Result<PageMetricsJs> {
        self.eval_json(scripts::PAGE_METRICS).await
    }

    async fn navigation_result(&self, start: Instant) -> Result<NavigationResult> {
        Ok(NavigationResult {
            final_url: self.page.url().await?.unwrap_or_default(),
            load_time_ms: start.elapsed().as_millis() as u64,
        })
    }
}

#[async_trait]
impl RenderContext for ChromiumContext {
    async fn navigate(&mut self, url: &str, timeout_ms: u64) -> Result<NavigationResult> {
        let start = Instant::now();
        tokio::time::timeout(Duration::from_millis(timeout_ms), self.page.goto(url))
            .await
            .map_err(|_| anyhow!("navigation to {url} timed out after {timeout_ms}ms"))?
            .with_context(|| format!("navigating to {url}"))?;
        self.navigation_result(start).await
    }

    async fn reload(&mut self, timeout_ms: u64) -> Result<NavigationResult> {
        let start = Instant::now();
        tokio::time::timeout(Duration::from_millis(timeout_ms), self.page.reload())
            .await
            .map_err(|_| anyhow!("reload timed out after {timeout_ms}ms"))?
            .context("reloading page")?;
        self.navigation_result(start).await
    }

    async fn sample_visible_content(&self) -> Result<String> {
        self.eval(scripts::SAMPLE_CONTENT).await
    }

    async fn query_regions(&self) -> Result<Vec<Region>> {
        self.eval_json(scripts::REGIONS).await
    }

    async fn query_computed_color(&self, query: ColorProbe) -> Result<String> {
        let (script, index) = match query {
            ColorProbe::Background(i) => (scripts::background_color(i), i),
            ColorProbe::Text(i) => (scripts::text_color(i), i),
        };
        let color: Option<String> = self.eval(&script).await?;
        color.ok_or_else(|| anyhow!("region {index} disappeared before its color was read"))
    }

    async fn query_visual_elements(&self) -> Result<Vec<VisualElement>> {
        self.eval_json(scripts::VISUAL_ELEMENTS).await
    }

    async fn viewport_size(&self) -> Result<Viewport> {
        let m = self.metrics().await?;
        Ok(Viewport {
            width: m.width,
            height: m.height,
        })
    }

    async fn root_font_size(&self) -> Result<f64> {
        Ok(self.metrics().await?.root_font_size)
    }

    async fn current_url(&self) -> Result<Option<String>> {
        Ok(self.page.url().await?)
    }

    async fn close(self: Box<Self>) -> Result<()> {
        let ChromiumContext {
            page,
            browser_context,
            browser,
        } = *self;
        page.close().await.context("closing page")?;
        browser
            .lock()
            .await
            .execute(DisposeBrowserContextParams::new(browser_context))
            .await
            .context("disposing browser context")?;
        Ok(())
    }
}

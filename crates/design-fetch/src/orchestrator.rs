//! Light and dark extraction passes combined into one design.
//!
//! Each pass owns its own rendering context and runs strictly in order:
//! navigate, settle, reload, settle, then read colors and the logo. The
//! reload works around client-side hydration races on script-heavy pages
//! and changes what gets extracted there, so it is never skipped.

use crate::config::ExtractionConfig;
use crate::error::Result;
use crate::logo::LogoScorer;
use crate::pool::{SessionHandle, SessionPool};
use crate::renderer::Renderer;
use crate::stabilize::wait_for_settled_content;
use crate::target::NormalizedUrl;
use crate::theme::{ThemeColorResolver, ThemeColors};
use crate::types::{ColorScheme, ExtractedDesign, ExtractedLogo, ExtractedTheme};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info, info_span, warn, Instrument};

/// Runs extractions against a renderer.
pub struct DesignExtractor {
    pool: SessionPool,
    config: ExtractionConfig,
    theme: ThemeColorResolver,
    logo: LogoScorer,
}

impl DesignExtractor {
    pub fn new(renderer: Arc<dyn Renderer>, config: ExtractionConfig) -> Self {
        Self {
            pool: SessionPool::new(renderer, config.max_sessions),
            theme: ThemeColorResolver::new(config.contrast_threshold),
            logo: LogoScorer::new(config.logo.clone()),
            config,
        }
    }

    pub fn pool(&self) -> &SessionPool {
        &self.pool
    }

    pub fn config(&self) -> &ExtractionConfig {
        &self.config
    }

    /// Normalize `raw_url` and extract its design.
    pub async fn fetch_design(&self, raw_url: &str) -> Result<ExtractedDesign> {
        let url = NormalizedUrl::parse(raw_url)?;
        self.extract(&url).await
    }

    /// Extract both presentation modes of `url`.
    ///
    /// The passes run concurrently. If either fails the whole extraction
    /// fails; both contexts are closed either way.
    pub async fn extract(&self, url: &NormalizedUrl) -> Result<ExtractedDesign> {
        self.extract_both(url)
            .instrument(info_span!("extract", url = %url))
            .await
    }

    async fn extract_both(&self, url: &NormalizedUrl) -> Result<ExtractedDesign> {
        info!("extracting design");
        let start = Instant::now();

        let (light, dark) = tokio::join!(
            self.extract_mode(url, ColorScheme::Light)
                .instrument(info_span!("pass", scheme = %ColorScheme::Light)),
            self.extract_mode(url, ColorScheme::Dark)
                .instrument(info_span!("pass", scheme = %ColorScheme::Dark)),
        );

        let design = ExtractedDesign {
            url: url.to_string(),
            light_mode: light?,
            dark_mode: dark?,
        };
        info!(
            elapsed_ms = start.elapsed().as_millis() as u64,
            "extracted design"
        );
        Ok(design)
    }

    async fn extract_mode(
        &self,
        url: &NormalizedUrl,
        scheme: ColorScheme,
    ) -> Result<ExtractedTheme> {
        let mut session = self.pool.acquire(scheme).await?;
        let outcome = self.run_pass(&mut session, url).await;
        if let Err(e) = session.release().await {
            warn!("failed to close rendering context: {e:#}");
        }
        outcome
    }

    async fn run_pass(
        &self,
        session: &mut SessionHandle,
        url: &NormalizedUrl,
    ) -> Result<ExtractedTheme> {
        let timeout_ms = self.config.navigation_timeout_ms;
        let context = session.context_mut()?;

        let nav = context.navigate(url.as_str(), timeout_ms).await?;
        debug!(
            final_url = %nav.final_url,
            load_time_ms = nav.load_time_ms,
            "navigated"
        );
        wait_for_settled_content(&*context, self.config.initial_settle).await?;

        context.reload(timeout_ms).await?;
        wait_for_settled_content(&*context, self.config.reload_settle).await?;

        let colors = self.theme.resolve(&*context).await?;
        let logo = self.logo.extract(&*context).await?;
        if logo.is_none() {
            debug!("no logo candidate survived filtering");
        }
        Ok(theme(colors, logo))
    }
}

fn theme(colors: ThemeColors, logo: Option<ExtractedLogo>) -> ExtractedTheme {
    ExtractedTheme {
        logo,
        background_color: colors.background_color,
        text_color: colors.text_color,
        raw_text_color: colors.raw_text_color,
        text_color_adjusted_for_contrast: colors.text_color_adjusted_for_contrast,
    }
}

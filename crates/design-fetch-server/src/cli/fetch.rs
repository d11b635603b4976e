//! `design-fetch fetch <url>`: one-off extraction printed as JSON.

use crate::cli::output::{self, Styled};
use crate::cli::BrowserArgs;
use anyhow::Result;
use design_fetch::renderer::chromium::ChromiumRenderer;
use design_fetch::{DesignExtractor, ExtractionConfig};
use std::sync::Arc;
use std::time::Instant;
use tracing::warn;

/// Launch a browser, extract `url`, print the design to stdout.
pub async fn run(url: &str, pretty: bool, browser: &BrowserArgs) -> Result<()> {
    let s = Styled::new();
    let config = browser.apply(ExtractionConfig::from_env());
    let renderer = Arc::new(ChromiumRenderer::launch(browser.chromium(&config)).await?);
    let extractor = DesignExtractor::new(renderer.clone(), config);

    let started = Instant::now();
    let result = extract_json(&extractor, url, pretty).await;
    if let Err(e) = renderer.shutdown().await {
        warn!("failed to close browser: {e:#}");
    }

    let json = result?;
    println!("{json}");
    eprintln!(
        "  {} {}",
        s.ok_sym(),
        s.dim(&format!(
            "extracted in {}",
            output::format_elapsed(started.elapsed())
        ))
    );
    Ok(())
}

/// Extract `url` and serialize the design.
pub async fn extract_json(
    extractor: &DesignExtractor,
    url: &str,
    pretty: bool,
) -> Result<String> {
    let design = extractor.fetch_design(url).await?;
    Ok(output::to_json(&design, pretty)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use design_fetch::renderer::scripted::{ScriptedPage, ScriptedRenderer};
    use design_fetch::DesignError;

    fn extractor() -> DesignExtractor {
        let renderer = ScriptedRenderer::new(ScriptedPage::with_colors(
            "rgb(250, 250, 250)",
            "rgb(33, 33, 33)",
        ));
        DesignExtractor::new(Arc::new(renderer), ExtractionConfig::default())
    }

    #[tokio::test(start_paused = true)]
    async fn test_extract_json_compact() {
        let json = extract_json(&extractor(), "acme.test", false).await.unwrap();
        assert!(!json.contains('\n'));

        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["url"], "https://acme.test/");
        assert_eq!(value["lightMode"]["backgroundColor"], "rgb(250, 250, 250)");
        assert_eq!(value["lightMode"]["textColor"], "rgb(33, 33, 33)");
        assert!(value["darkMode"]["logo"].is_null());
    }

    #[tokio::test(start_paused = true)]
    async fn test_extract_json_pretty() {
        let json = extract_json(&extractor(), "acme.test", true).await.unwrap();
        assert!(json.starts_with("{\n  \"url\": \"https://acme.test/\""));
    }

    #[tokio::test]
    async fn test_extract_json_rejects_bad_scheme() {
        let err = extract_json(&extractor(), "gopher://acme.test", false)
            .await
            .unwrap_err();
        assert!(matches!(
            err.downcast_ref::<DesignError>(),
            Some(DesignError::UnsupportedProtocol(_))
        ));
    }
}

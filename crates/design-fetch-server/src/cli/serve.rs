//! `design-fetch serve`: run the HTTP service.

use crate::api::{self, AppState};
use crate::cli::BrowserArgs;
use anyhow::{Context, Result};
use design_fetch::renderer::chromium::ChromiumRenderer;
use design_fetch::{DesignExtractor, ExtractionConfig};
use std::net::SocketAddr;
use std::sync::Arc;
use tracing::{info, warn};

/// Default listen address.
pub const DEFAULT_BIND: &str = "127.0.0.1:3000";

/// Launch the browser and serve until Ctrl-C.
pub async fn run(bind: SocketAddr, browser: &BrowserArgs) -> Result<()> {
    info!("starting design-fetch v{}", env!("CARGO_PKG_VERSION"));

    let config = browser.apply(ExtractionConfig::from_env());
    let renderer = Arc::new(
        ChromiumRenderer::launch(browser.chromium(&config))
            .await
            .context("no usable browser; pass --chrome or set DESIGN_FETCH_CHROMIUM_PATH")?,
    );
    info!(
        max_sessions = config.max_sessions,
        contrast_threshold = config.contrast_threshold,
        "browser ready"
    );

    let app = api::router(AppState::new(DesignExtractor::new(renderer.clone(), config)));
    let listener = tokio::net::TcpListener::bind(bind)
        .await
        .with_context(|| format!("binding {bind}"))?;
    info!("listening on http://{}", listener.local_addr()?);
    info!("health check: http://{}/health", listener.local_addr()?);

    let served = axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error");

    info!("shutting down");
    if let Err(e) = renderer.shutdown().await {
        warn!("failed to close browser: {e:#}");
    }
    served
}

async fn shutdown_signal() {
    match tokio::signal::ctrl_c().await {
        Ok(()) => info!("received Ctrl-C"),
        Err(e) => {
            warn!("cannot listen for Ctrl-C, serving until killed: {e}");
            std::future::pending::<()>().await;
        }
    }
}

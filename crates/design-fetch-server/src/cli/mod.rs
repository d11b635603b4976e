//! CLI subcommand implementations for the `design-fetch` binary.

pub mod fetch;
pub mod output;
pub mod serve;

use clap::Args;
use design_fetch::renderer::chromium::ChromiumOptions;
use design_fetch::ExtractionConfig;
use std::path::PathBuf;

/// Browser and extraction flags shared by `serve` and `fetch`.
///
/// Flags win over `DESIGN_FETCH_*` environment variables.
#[derive(Debug, Clone, Default, Args)]
pub struct BrowserArgs {
    /// Path to a Chrome or Chromium binary
    #[arg(long, value_name = "PATH")]
    pub chrome: Option<PathBuf>,

    /// Launch the browser without its sandbox (needed as root in containers)
    #[arg(long)]
    pub no_sandbox: bool,

    /// Maximum number of rendering contexts open at once
    #[arg(long, value_name = "N")]
    pub max_sessions: Option<usize>,

    /// Settle timeout after the first navigation
    #[arg(long, value_name = "MS")]
    pub settle_timeout_ms: Option<u64>,

    /// Settle timeout after the forced reload
    #[arg(long, value_name = "MS")]
    pub reload_settle_timeout_ms: Option<u64>,
}

impl BrowserArgs {
    /// Apply these flags on top of `base`.
    pub fn apply(&self, mut base: ExtractionConfig) -> ExtractionConfig {
        if let Some(n) = self.max_sessions {
            base.max_sessions = n.max(1);
        }
        if let Some(ms) = self.settle_timeout_ms {
            base.initial_settle.timeout_ms = ms;
        }
        if let Some(ms) = self.reload_settle_timeout_ms {
            base.reload_settle.timeout_ms = ms;
        }
        base
    }

    pub fn chromium(&self, config: &ExtractionConfig) -> ChromiumOptions {
        ChromiumOptions {
            executable: self.chrome.clone(),
            no_sandbox: self.no_sandbox,
            viewport: config.viewport,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flags_override_config() {
        let args = BrowserArgs {
            max_sessions: Some(0),
            settle_timeout_ms: Some(10_000),
            reload_settle_timeout_ms: Some(30_000),
            ..BrowserArgs::default()
        };
        let config = args.apply(ExtractionConfig::default());
        assert_eq!(config.max_sessions, 1);
        assert_eq!(config.initial_settle.timeout_ms, 10_000);
        assert_eq!(config.reload_settle.timeout_ms, 30_000);
        assert_eq!(config.reload_settle.interval_ms, 250);
    }

    #[test]
    fn test_no_flags_keep_config() {
        let base = ExtractionConfig::default();
        assert_eq!(BrowserArgs::default().apply(base.clone()), base);
    }

    #[test]
    fn test_chromium_options_use_config_viewport() {
        let args = BrowserArgs {
            chrome: Some(PathBuf::from("/usr/bin/chromium")),
            no_sandbox: true,
            ..BrowserArgs::default()
        };
        let options = args.chromium(&ExtractionConfig::default());
        assert_eq!(options.executable, Some(PathBuf::from("/usr/bin/chromium")));
        assert!(options.no_sandbox);
        assert_eq!(options.viewport.width, 1080.0);
        assert_eq!(options.viewport.height, 1024.0);
    }
}

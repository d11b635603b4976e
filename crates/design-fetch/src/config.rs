//! Extraction configuration.
//!
//! Defaults reproduce the behavior of the hosted service. Every knob can be
//! overridden with a `DESIGN_FETCH_*` environment variable.

use crate::logo::LogoScoringConfig;
use crate::stabilize::SettleOptions;
use crate::types::Viewport;
use serde::{Deserialize, Serialize};
use tracing::warn;

/// Contrast ratio below which the measured text color is replaced.
pub const DEFAULT_CONTRAST_THRESHOLD: f64 = 6.0;

/// Settings for one extraction run. Immutable once handed to the extractor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtractionConfig {
    /// Viewport every rendering context is opened with.
    pub viewport: Viewport,
    /// Maximum number of rendering contexts open at once.
    pub max_sessions: usize,
    /// Hard timeout for a single navigation or reload.
    pub navigation_timeout_ms: u64,
    /// Settle pass after the first navigation.
    pub initial_settle: SettleOptions,
    /// Settle pass after the forced reload.
    pub reload_settle: SettleOptions,
    pub contrast_threshold: f64,
    pub logo: LogoScoringConfig,
}

impl Default for ExtractionConfig {
    fn default() -> Self {
        Self {
            viewport: Viewport::default(),
            max_sessions: 4,
            navigation_timeout_ms: 30_000,
            initial_settle: SettleOptions::default(),
            reload_settle: SettleOptions::warm(),
            contrast_threshold: DEFAULT_CONTRAST_THRESHOLD,
            logo: LogoScoringConfig::default(),
        }
    }
}

impl ExtractionConfig {
    /// Defaults with `DESIGN_FETCH_*` overrides applied.
    pub fn from_env() -> Self {
        Self::default().with_overrides(|key| std::env::var(key).ok())
    }

    /// Apply overrides from any key/value source. Unparseable values are
    /// ignored with a warning.
    pub fn with_overrides(mut self, lookup: impl Fn(&str) -> Option<String>) -> Self {
        override_from(&lookup, "DESIGN_FETCH_VIEWPORT_WIDTH", &mut self.viewport.width);
        override_from(&lookup, "DESIGN_FETCH_VIEWPORT_HEIGHT", &mut self.viewport.height);
        override_from(&lookup, "DESIGN_FETCH_MAX_SESSIONS", &mut self.max_sessions);
        override_from(
            &lookup,
            "DESIGN_FETCH_NAVIGATION_TIMEOUT_MS",
            &mut self.navigation_timeout_ms,
        );
        override_from(
            &lookup,
            "DESIGN_FETCH_SETTLE_TIMEOUT_MS",
            &mut self.initial_settle.timeout_ms,
        );
        override_from(
            &lookup,
            "DESIGN_FETCH_RELOAD_SETTLE_TIMEOUT_MS",
            &mut self.reload_settle.timeout_ms,
        );
        if let Some(interval) = parse_var::<u64>(&lookup, "DESIGN_FETCH_SETTLE_INTERVAL_MS") {
            self.initial_settle.interval_ms = interval;
            self.reload_settle.interval_ms = interval;
        }
        override_from(
            &lookup,
            "DESIGN_FETCH_CONTRAST_THRESHOLD",
            &mut self.contrast_threshold,
        );
        self.max_sessions = self.max_sessions.max(1);
        self
    }
}

fn override_from<T: std::str::FromStr>(
    lookup: &impl Fn(&str) -> Option<String>,
    key: &str,
    target: &mut T,
) {
    if let Some(value) = parse_var(lookup, key) {
        *target = value;
    }
}

fn parse_var<T: std::str::FromStr>(
    lookup: &impl Fn(&str) -> Option<String>,
    key: &str,
) -> Option<T> {
    let raw = lookup(key)?;
    match raw.trim().parse() {
        Ok(v) => Some(v),
        Err(_) => {
            warn!("ignoring {key}={raw:?}: not a valid value");
            None
        }
    }
}

//! Settle detection: poll a page until its visible content stops changing.

use crate::renderer::RenderContext;
use serde::{Deserialize, Serialize};
use std::future::Future;
use std::time::Duration;
use tokio::time::Instant;
use tracing::{debug, warn};

/// Consecutive identical samples that count as settled.
pub const STABLE_SAMPLE_COUNT: usize = 3;

/// Polling parameters for one settle pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SettleOptions {
    /// Soft deadline. Expiry ends polling and is not an error.
    pub timeout_ms: u64,
    /// Pause between samples.
    pub interval_ms: u64,
}

impl Default for SettleOptions {
    fn default() -> Self {
        Self {
            timeout_ms: 30_000,
            interval_ms: 250,
        }
    }
}

impl SettleOptions {
    /// Shorter pass for a page that has already been loaded once.
    pub fn warm() -> Self {
        Self {
            timeout_ms: 5_000,
            ..Self::default()
        }
    }
}

/// How a settle pass ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SettleOutcome {
    /// The last samples were identical.
    Settled { samples: usize, elapsed: Duration },
    /// The deadline passed first; the page is used as-is.
    TimedOut { samples: usize, elapsed: Duration },
}

impl SettleOutcome {
    pub fn is_settled(&self) -> bool {
        matches!(self, SettleOutcome::Settled { .. })
    }

    pub fn samples(&self) -> usize {
        match self {
            SettleOutcome::Settled { samples, .. } | SettleOutcome::TimedOut { samples, .. } => {
                *samples
            }
        }
    }
}

/// Poll `sample` until [`STABLE_SAMPLE_COUNT`] consecutive results are
/// identical or `options.timeout_ms` has elapsed.
///
/// Sampling errors propagate; running out of time does not.
pub async fn wait_until_stable<F, Fut, S, E>(
    mut sample: F,
    options: SettleOptions,
) -> Result<SettleOutcome, E>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<S, E>>,
    S: PartialEq,
{
    let timeout = Duration::from_millis(options.timeout_ms);
    let interval = Duration::from_millis(options.interval_ms);
    let start = Instant::now();

    let mut last: Option<S> = None;
    let mut streak = 0usize;
    let mut samples = 0usize;

    while start.elapsed() < timeout {
        let current = sample().await?;
        samples += 1;

        streak = match &last {
            Some(prev) if *prev == current => streak + 1,
            _ => 1,
        };
        last = Some(current);

        if streak >= STABLE_SAMPLE_COUNT {
            return Ok(SettleOutcome::Settled {
                samples,
                elapsed: start.elapsed(),
            });
        }

        tokio::time::sleep(interval).await;
    }

    Ok(SettleOutcome::TimedOut {
        samples,
        elapsed: start.elapsed(),
    })
}

/// Wait for the page in `context` to settle, sampling its visible markup.
pub async fn wait_for_settled_content(
    context: &dyn RenderContext,
    options: SettleOptions,
) -> anyhow::Result<SettleOutcome> {
    let outcome = wait_until_stable(|| context.sample_visible_content(), options).await?;
    match outcome {
        SettleOutcome::Settled { samples, elapsed } => {
            debug!(samples, elapsed_ms = elapsed.as_millis() as u64, "content settled");
        }
        SettleOutcome::TimedOut { samples, elapsed } => {
            warn!(
                samples,
                elapsed_ms = elapsed.as_millis() as u64,
                "content still changing at settle deadline, continuing"
            );
        }
    }
    Ok(outcome)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    fn options(timeout_ms: u64) -> SettleOptions {
        SettleOptions {
            timeout_ms,
            interval_ms: 250,
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_static_content_settles_after_three_samples() {
        let start = Instant::now();
        let outcome = wait_until_stable(
            || async { Ok::<_, anyhow::Error>("<main>hello</main>".to_string()) },
            options(30_000),
        )
        .await
        .unwrap();

        assert!(outcome.is_settled());
        assert_eq!(outcome.samples(), 3);
        // two intervals between three samples
        assert_eq!(start.elapsed(), Duration::from_millis(500));
    }

    #[tokio::test(start_paused = true)]
    async fn test_settles_once_content_stops_changing() {
        let calls = Cell::new(0u32);
        let outcome = wait_until_stable(
            || {
                let n = calls.get();
                calls.set(n + 1);
                async move { Ok::<_, anyhow::Error>(n.min(4)) }
            },
            options(30_000),
        )
        .await
        .unwrap();

        // samples 0,1,2,3,4,4,4
        assert!(outcome.is_settled());
        assert_eq!(outcome.samples(), 7);
    }

    #[tokio::test(start_paused = true)]
    async fn test_ever_changing_content_times_out_without_error() {
        let calls = Cell::new(0u32);
        let start = Instant::now();
        let outcome = wait_until_stable(
            || {
                let n = calls.get();
                calls.set(n + 1);
                async move { Ok::<_, anyhow::Error>(n) }
            },
            options(2_000),
        )
        .await
        .unwrap();

        assert!(!outcome.is_settled());
        assert!(start.elapsed() <= Duration::from_millis(2_000 + 250));
        assert_eq!(outcome.samples(), 8);
    }

    #[tokio::test(start_paused = true)]
    async fn test_timeout_before_three_samples_just_stops() {
        let outcome = wait_until_stable(
            || async { Ok::<_, anyhow::Error>("same") },
            SettleOptions {
                timeout_ms: 300,
                interval_ms: 250,
            },
        )
        .await
        .unwrap();

        assert_eq!(
            outcome,
            SettleOutcome::TimedOut {
                samples: 2,
                elapsed: Duration::from_millis(500),
            }
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_sampling_error_propagates() {
        let result = wait_until_stable(
            || async { Err::<String, _>(anyhow::anyhow!("target closed")) },
            options(30_000),
        )
        .await;
        assert!(result.is_err());
    }
}

//! Bounded access to rendering contexts.
//!
//! Each handle owns a fresh context for one extraction pass. Releasing the
//! handle closes the context; nothing is reused between passes. A handle
//! dropped without being released closes its context on a background task,
//! and its pool slot stays taken until that close finishes.

use crate::renderer::{RenderContext, Renderer};
use crate::types::ColorScheme;
use anyhow::{anyhow, Result};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::sync::{OwnedSemaphorePermit, Semaphore};
use tracing::warn;

/// Keeps a pool slot occupied while alive.
struct Slot {
    _permit: OwnedSemaphorePermit,
    active_count: Arc<AtomicUsize>,
}

impl Drop for Slot {
    fn drop(&mut self) {
        self.active_count.fetch_sub(1, Ordering::SeqCst);
    }
}

/// Exclusive handle to a rendering context.
pub struct SessionHandle {
    /// `None` once released.
    context: Option<Box<dyn RenderContext>>,
    scheme: ColorScheme,
    slot: Option<Slot>,
}

impl SessionHandle {
    pub fn scheme(&self) -> ColorScheme {
        self.scheme
    }

    pub fn context(&self) -> Result<&dyn RenderContext> {
        match self.context.as_ref() {
            Some(context) => Ok(&**context),
            None => Err(anyhow!("{} session already released", self.scheme)),
        }
    }

    pub fn context_mut(&mut self) -> Result<&mut dyn RenderContext> {
        let scheme = self.scheme;
        match self.context.as_mut() {
            Some(context) => Ok(&mut **context),
            None => Err(anyhow!("{scheme} session already released")),
        }
    }

    /// Close the context and free the slot.
    pub async fn release(mut self) -> Result<()> {
        match self.context.take() {
            Some(context) => context.close().await,
            None => Ok(()),
        }
    }
}

impl Drop for SessionHandle {
    fn drop(&mut self) {
        let Some(context) = self.context.take() else {
            return;
        };
        let slot = self.slot.take();
        let scheme = self.scheme;

        match tokio::runtime::Handle::try_current() {
            Ok(runtime) => {
                warn!(%scheme, "session dropped before release, closing its context");
                runtime.spawn(async move {
                    if let Err(e) = context.close().await {
                        warn!(%scheme, "failed to close abandoned rendering context: {e:#}");
                    }
                    drop(slot);
                });
            }
            Err(_) => {
                warn!(%scheme, "session dropped outside a runtime, context left open");
            }
        }
    }
}

/// Limits how many rendering contexts are open at once.
pub struct SessionPool {
    renderer: Arc<dyn Renderer>,
    semaphore: Arc<Semaphore>,
    max_sessions: usize,
    active_count: Arc<AtomicUsize>,
}

impl SessionPool {
    pub fn new(renderer: Arc<dyn Renderer>, max_sessions: usize) -> Self {
        let max_sessions = max_sessions.max(1);
        Self {
            renderer,
            semaphore: Arc::new(Semaphore::new(max_sessions)),
            max_sessions,
            active_count: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Open a context for `scheme`, waiting while the pool is full.
    pub async fn acquire(&self, scheme: ColorScheme) -> Result<SessionHandle> {
        let permit = Arc::clone(&self.semaphore)
            .acquire_owned()
            .await
            .map_err(|e| anyhow!("session pool closed: {}", e))?;

        let context = self.renderer.new_context(scheme).await?;
        self.active_count.fetch_add(1, Ordering::SeqCst);

        Ok(SessionHandle {
            context: Some(context),
            scheme,
            slot: Some(Slot {
                _permit: permit,
                active_count: Arc::clone(&self.active_count),
            }),
        })
    }

    /// Number of currently open contexts.
    pub fn active(&self) -> usize {
        self.active_count.load(Ordering::SeqCst)
    }

    pub fn max_sessions(&self) -> usize {
        self.max_sessions
    }

    /// Slots free for new contexts.
    pub fn available(&self) -> usize {
        self.semaphore.available_permits()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::renderer::scripted::{ScriptedPage, ScriptedRenderer};
    use std::time::Duration;
    use tokio_test::assert_ok;

    fn pool(max: usize) -> (SessionPool, ScriptedRenderer) {
        let renderer = ScriptedRenderer::new(ScriptedPage::default());
        (SessionPool::new(Arc::new(renderer.clone()), max), renderer)
    }

    #[tokio::test]
    async fn test_acquire_and_release() {
        let (pool, renderer) = pool(2);
        let handle = assert_ok!(pool.acquire(ColorScheme::Dark).await);
        assert_eq!(handle.scheme(), ColorScheme::Dark);
        assert_eq!(pool.active(), 1);
        assert_eq!(pool.available(), 1);

        assert_ok!(handle.release().await);
        assert_eq!(pool.active(), 0);
        assert_eq!(pool.available(), 2);
        assert_eq!(renderer.calls(), vec!["dark: open", "dark: close"]);
    }

    async fn settle_background_tasks() {
        for _ in 0..10 {
            tokio::task::yield_now().await;
        }
    }

    #[tokio::test]
    async fn test_dropped_handle_closes_context_then_frees_slot() {
        let (pool, renderer) = pool(1);
        let handle = pool.acquire(ColorScheme::Light).await.unwrap();
        drop(handle);

        settle_background_tasks().await;
        assert_eq!(renderer.calls(), vec!["light: open", "light: close"]);
        assert_eq!(pool.active(), 0);
        assert_eq!(pool.available(), 1);
    }

    #[tokio::test]
    async fn test_released_handle_is_not_closed_twice() {
        let (pool, renderer) = pool(1);
        let handle = pool.acquire(ColorScheme::Dark).await.unwrap();
        assert!(handle.context().is_ok());
        handle.release().await.unwrap();

        settle_background_tasks().await;
        assert_eq!(renderer.calls(), vec!["dark: open", "dark: close"]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_acquire_waits_when_full() {
        let (pool, _) = pool(1);
        let first = pool.acquire(ColorScheme::Light).await.unwrap();

        let blocked =
            tokio::time::timeout(Duration::from_millis(50), pool.acquire(ColorScheme::Dark)).await;
        assert!(blocked.is_err());

        first.release().await.unwrap();
        let second = pool.acquire(ColorScheme::Dark).await.unwrap();
        assert_eq!(pool.active(), 1);
        second.release().await.unwrap();
    }

    #[test]
    fn test_zero_sessions_is_clamped() {
        let (pool, _) = pool(0);
        assert_eq!(pool.max_sessions(), 1);
        assert_eq!(pool.available(), 1);
    }
}

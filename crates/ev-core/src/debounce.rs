//! Trailing-edge debouncer used for resize bursts

use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use tokio::runtime::Handle;
use tokio::task::JoinHandle;

/// Coalesces a burst of triggers into one delayed action
///
/// Each trigger cancels the pending timer and schedules a new one, so the
/// action runs once, `window` after the last trigger of a burst. Timer state is
/// owned per debouncer; two debouncers never coalesce each other's triggers.
pub struct Debouncer {
    window: Duration,
    action: Arc<dyn Fn() + Send + Sync>,
    runtime: Handle,
    pending: Mutex<Option<JoinHandle<()>>>,
}

impl Debouncer {
    /// Default quiescence window for window-resize bursts
    pub const DEFAULT_WINDOW: Duration = Duration::from_millis(250);

    pub fn new<F>(window: Duration, runtime: Handle, action: F) -> Self
    where
        F: Fn() + Send + Sync + 'static,
    {
        Self {
            window,
            action: Arc::new(action),
            runtime,
            pending: Mutex::new(None),
        }
    }

    pub fn window(&self) -> Duration {
        self.window
    }

    /// Restart the quiescence window
    pub fn trigger(&self) {
        let mut pending = self.pending.lock();
        if let Some(timer) = pending.take() {
            timer.abort();
        }

        let action = Arc::clone(&self.action);
        let window = self.window;
        *pending = Some(self.runtime.spawn(async move {
            tokio::time::sleep(window).await;
            action();
        }));
    }

    /// Drop the pending action, if any
    pub fn cancel(&self) {
        if let Some(timer) = self.pending.lock().take() {
            timer.abort();
        }
    }

    /// Whether an action is scheduled and has not run yet
    pub fn is_pending(&self) -> bool {
        self.pending
            .lock()
            .as_ref()
            .map(|timer| !timer.is_finished())
            .unwrap_or(false)
    }
}

impl Drop for Debouncer {
    fn drop(&mut self) {
        self.cancel();
    }
}

//! Per-path debouncing of reload work.
//!
//! Each path owns at most one pending task. Scheduling again for the same
//! path cancels the pending one and installs a replacement, so a burst of
//! saves (auto-save, formatters, bulk rewrites) turns into a single reload
//! after the burst goes quiet.
//!
//! A pending entry carries a generation number. When a task finishes it
//! removes its entry only if the generation still matches, so a task that
//! was superseded while running never drops the registration of its
//! successor.

use std::future::Future;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use dashmap::DashMap;
use tokio::runtime::Handle;
use tokio_util::sync::CancellationToken;

#[derive(Debug)]
struct Pending {
    generation: u64,
    token: CancellationToken,
}

/// Cancel-and-replace scheduler keyed by file path.
#[derive(Debug)]
pub struct DebounceScheduler {
    delay: Duration,
    pending: Arc<DashMap<PathBuf, Pending>>,
    next_generation: AtomicU64,
    shutdown: CancellationToken,
    runtime: Handle,
}

impl DebounceScheduler {
    /// Create a scheduler that spawns onto `runtime`.
    pub fn new(delay: Duration, runtime: Handle) -> Self {
        Self {
            delay,
            pending: Arc::new(DashMap::new()),
            next_generation: AtomicU64::new(1),
            shutdown: CancellationToken::new(),
            runtime,
        }
    }

    /// Create a scheduler on the current tokio runtime.
    ///
    /// Panics outside a runtime, like [`Handle::current`].
    pub fn on_current_runtime(delay_ms: u64) -> Self {
        Self::new(Duration::from_millis(delay_ms), Handle::current())
    }

    /// Run `work` for `path` after the delay, unless rescheduled or
    /// cancelled first. Once the delay has elapsed the work always runs to
    /// completion.
    ///
    /// Returns `false` when the scheduler has been shut down.
    pub fn schedule<F>(&self, path: PathBuf, work: F) -> bool
    where
        F: Future<Output = ()> + Send + 'static,
    {
        if self.shutdown.is_cancelled() {
            crate::debug_event!("debounce", "rejected after shutdown", "{}", path.display());
            return false;
        }

        let generation = self.next_generation.fetch_add(1, Ordering::Relaxed);
        let token = self.shutdown.child_token();

        if let Some(previous) = self.pending.insert(
            path.clone(),
            Pending {
                generation,
                token: token.clone(),
            },
        ) {
            previous.token.cancel();
            crate::debug_event!("debounce", "superseded", "{}", path.display());
        }

        let pending = Arc::clone(&self.pending);
        let delay = self.delay;

        self.runtime.spawn(async move {
            tokio::select! {
                biased;
                _ = token.cancelled() => return,
                _ = tokio::time::sleep(delay) => {}
            }

            crate::debug_event!("debounce", "fired", "{}", path.display());
            work.await;

            pending.remove_if(&path, |_, entry| entry.generation == generation);
        });

        true
    }

    /// Cancel the pending task for `path`, if it has not fired yet.
    pub fn cancel(&self, path: &Path) -> bool {
        match self.pending.remove(path) {
            Some((_, entry)) => {
                entry.token.cancel();
                crate::debug_event!("debounce", "cancelled", "{}", path.display());
                true
            }
            None => false,
        }
    }

    /// Cancel every pending task. Later `schedule` calls still work.
    pub fn cancel_all(&self) {
        self.pending.retain(|_, entry| {
            entry.token.cancel();
            false
        });
    }

    /// Cancel every pending task and refuse new ones.
    pub fn shutdown(&self) {
        self.shutdown.cancel();
        self.pending.clear();
    }

    pub fn is_shut_down(&self) -> bool {
        self.shutdown.is_cancelled()
    }

    pub fn is_pending(&self, path: &Path) -> bool {
        self.pending.contains_key(path)
    }

    /// Number of registered tasks, including fired ones still running.
    pub fn pending_count(&self) -> usize {
        self.pending.len()
    }
}

impl Drop for DebounceScheduler {
    fn drop(&mut self) {
        self.shutdown.cancel();
    }
}

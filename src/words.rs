//! Global word set aggregation and publication.
//!
//! [`WordSetAggregator`] unions the words of every active configuration and
//! hands the result to a [`WordSink`] only when the set differs from the
//! last published one. [`SharedWordSet`] is the in-process sink: it keeps
//! the current set for lookups and broadcasts a [`WordSetEvent`] to any
//! subscribers on every replacement.

use std::collections::HashSet;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use parking_lot::{Mutex, RwLock};
use tokio::sync::broadcast;

/// Receiver of the published global word set.
pub trait WordSink: Send + Sync {
    /// Replace the global word set. Called only when the value changed.
    fn replace_words(&self, words: &HashSet<String>);
}

/// Unions per-configuration word lists and publishes on change.
pub struct WordSetAggregator {
    sink: Arc<dyn WordSink>,
    published: Mutex<HashSet<String>>,
}

impl WordSetAggregator {
    pub fn new(sink: Arc<dyn WordSink>) -> Self {
        Self {
            sink,
            published: Mutex::new(HashSet::new()),
        }
    }

    /// Collect the current union and publish it if it differs, as a set,
    /// from the last publication. Returns whether a publication happened.
    ///
    /// `collect` runs under the aggregator lock, so concurrent recomputes
    /// publish in the order their snapshots were taken.
    pub fn recompute<F>(&self, collect: F) -> bool
    where
        F: FnOnce() -> HashSet<String>,
    {
        let mut published = self.published.lock();
        let current = collect();

        if *published == current {
            crate::debug_event!("words", "unchanged", "{} words", current.len());
            return false;
        }

        crate::log_event!(
            "words",
            "published",
            "{} words (was {})",
            current.len(),
            published.len()
        );
        self.sink.replace_words(&current);
        *published = current;
        true
    }

    /// Last published set.
    pub fn published(&self) -> HashSet<String> {
        self.published.lock().clone()
    }
}

/// Notification sent to subscribers of a [`SharedWordSet`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WordSetEvent {
    Replaced { count: usize },
}

/// Shared, queryable word set with change notifications.
pub struct SharedWordSet {
    words: RwLock<HashSet<String>>,
    sender: broadcast::Sender<WordSetEvent>,
    replacements: AtomicU64,
}

impl SharedWordSet {
    /// Create a set whose notification channel buffers `capacity` events.
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self {
            words: RwLock::new(HashSet::new()),
            sender,
            replacements: AtomicU64::new(0),
        }
    }

    pub fn contains(&self, word: &str) -> bool {
        self.words.read().contains(word)
    }

    pub fn snapshot(&self) -> HashSet<String> {
        self.words.read().clone()
    }

    /// Sorted copy, for stable output.
    pub fn sorted(&self) -> Vec<String> {
        let mut words: Vec<String> = self.words.read().iter().cloned().collect();
        words.sort();
        words
    }

    pub fn len(&self) -> usize {
        self.words.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.words.read().is_empty()
    }

    /// Number of replacements received so far.
    pub fn replacements(&self) -> u64 {
        self.replacements.load(Ordering::SeqCst)
    }

    pub fn subscribe(&self) -> broadcast::Receiver<WordSetEvent> {
        self.sender.subscribe()
    }
}

impl Default for SharedWordSet {
    fn default() -> Self {
        Self::new(64)
    }
}

impl WordSink for SharedWordSet {
    fn replace_words(&self, words: &HashSet<String>) {
        *self.words.write() = words.clone();
        self.replacements.fetch_add(1, Ordering::SeqCst);

        let event = WordSetEvent::Replaced { count: words.len() };
        match self.sender.send(event.clone()) {
            Ok(receivers) => {
                crate::debug_event!("words", "notified", "{event:?} to {receivers} subscribers");
            }
            Err(_) => {
                // No subscribers
                crate::debug_event!("words", "dropped", "{event:?}");
            }
        }
    }
}

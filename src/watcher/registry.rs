//! Active configuration registry.
//!
//! Tracks, per search root, the one configuration file currently in effect
//! and reconciles that choice on every file-system change. Loads run in the
//! background through the [`DebounceScheduler`]; each load refreshes the
//! file's word list and dependency edges and then recomputes the global
//! word set.

use std::collections::{BTreeMap, BTreeSet, HashSet};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use tokio::runtime::Handle;
use tokio::sync::Mutex as AsyncMutex;

use crate::catalog;
use crate::dependency::DependencyIndex;
use crate::loader::ConfigLoader;
use crate::parsers::ParserSet;
use crate::paths;
use crate::resolver::{self, SearchPathSource, SearchPaths};
use crate::words::{WordSetAggregator, WordSink};

use super::debouncer::DebounceScheduler;
use super::error::WatchError;
use super::event::{Change, FileEvent};

struct Inner {
    project_root: PathBuf,
    search_paths: Arc<dyn SearchPathSource>,
    loader: ConfigLoader,
    dependencies: DependencyIndex,
    /// Search root -> active configuration file.
    active: DashMap<PathBuf, PathBuf>,
    /// Configuration file -> words of its last load.
    parsed: DashMap<PathBuf, Vec<String>>,
    /// Serializes loads of one file so a slow load never lands after a
    /// newer one.
    load_locks: DashMap<PathBuf, Arc<AsyncMutex<()>>>,
    aggregator: WordSetAggregator,
    scheduler: DebounceScheduler,
    loads: AtomicU64,
}

/// Registry of active configuration files, one per search root.
///
/// Cheap to clone; clones share state.
#[derive(Clone)]
pub struct ActiveConfigRegistry {
    inner: Arc<Inner>,
}

impl ActiveConfigRegistry {
    pub fn builder() -> ActiveConfigRegistryBuilder {
        ActiveConfigRegistryBuilder::new()
    }

    /// Full rescan: clear all state, resolve every search root and load its
    /// active file immediately, then publish once.
    pub async fn initialize(&self) -> Result<(), WatchError> {
        let inner = &self.inner;
        if inner.scheduler.is_shut_down() {
            return Err(WatchError::ShutDown);
        }

        inner.scheduler.cancel_all();
        inner.active.clear();
        inner.parsed.clear();
        inner.dependencies.clear();

        let roots = inner.search_roots();
        crate::log_event!("registry", "initializing", "{} search roots", roots.len());

        for root in roots {
            let Some(config) = resolver::find_active_config(&root) else {
                crate::debug_event!("registry", "no config", "{}", root.display());
                continue;
            };
            crate::log_event!("registry", "active", "{} -> {}", root.display(), config.display());
            inner.active.insert(root, config.clone());
            inner.load(&config).await;
        }

        inner.recompute();
        Ok(())
    }

    /// Apply one file-system event.
    pub fn handle(&self, event: &FileEvent) {
        if self.inner.scheduler.is_shut_down() {
            return;
        }

        for change in event.changes() {
            match change {
                Change::Created(path) => {
                    self.on_file_created(path);
                    self.route_dictionary(path);
                }
                Change::ContentChanged(path) => {
                    self.on_file_changed(path);
                    self.route_dictionary(path);
                }
                Change::Deleted(path) => {
                    self.on_file_deleted(path);
                    self.route_dictionary(path);
                }
            }
        }
    }

    /// A file appeared. Promotes it when it outranks the root's active file.
    ///
    /// Returns whether a load was scheduled.
    pub fn on_file_created(&self, path: &Path) -> bool {
        let inner = &self.inner;
        if !catalog::is_config_path(path) {
            return false;
        }
        let path = paths::normalize(path);
        if !path.is_file() {
            crate::debug_event!("registry", "not a file", "{}", path.display());
            return false;
        }
        let Some(root) = inner.relevant_root(&path) else {
            return false;
        };

        let schedule = match inner.active.entry(root) {
            Entry::Vacant(slot) => {
                crate::log_event!("registry", "activated", "{}", path.display());
                slot.insert(path.clone());
                true
            }
            // Atomic saves recreate the active file itself
            Entry::Occupied(slot) if *slot.get() == path => true,
            Entry::Occupied(mut slot) => {
                if catalog::has_higher_priority(&path, slot.get()) {
                    crate::log_event!(
                        "registry",
                        "promoted",
                        "{} over {}",
                        path.display(),
                        slot.get().display()
                    );
                    slot.insert(path.clone());
                    true
                } else {
                    crate::debug_event!("registry", "outranked", "{}", path.display());
                    false
                }
            }
        };

        if schedule {
            inner.schedule_load(path);
        }
        schedule
    }

    /// A file's content changed.
    ///
    /// Reloads the active file; an edit to an inactive manifest re-resolves
    /// its root, since the edit may have added or removed embedded
    /// configuration.
    pub fn on_file_changed(&self, path: &Path) -> bool {
        let inner = &self.inner;
        let Some((_, entry)) = catalog::lookup(path) else {
            return false;
        };
        let path = paths::normalize(path);

        if inner.is_active(&path) {
            inner.schedule_load(path);
            return true;
        }

        if entry.is_manifest() {
            if let Some(root) = inner.relevant_root(&path) {
                inner.schedule_reresolve(path, root);
                return true;
            }
        }
        false
    }

    /// A file disappeared. Drops its state and, when it was active, falls
    /// back to the next file in priority order.
    pub fn on_file_deleted(&self, path: &Path) {
        let inner = &self.inner;
        if !catalog::is_config_path(path) {
            return;
        }
        let path = paths::normalize(path);

        inner.parsed.remove(&path);
        inner.dependencies.remove(&path);
        inner.scheduler.cancel(&path);

        if let Some(root) = resolver::search_root_for(&path) {
            if inner.active.remove_if(&root, |_, active| *active == path).is_some() {
                crate::log_event!("registry", "active deleted", "{}", path.display());
                inner.reresolve(&root);
            }
        }

        inner.recompute();
    }

    /// A dictionary file changed; reload every configuration that consulted
    /// it. Returns the number of reloads scheduled.
    pub fn on_dictionary_file_changed(&self, path: &Path) -> usize {
        let path = paths::normalize(path);
        let dependents = self.inner.dependencies.dependents_of(&path);
        for config in &dependents {
            crate::debug_event!(
                "registry",
                "dictionary changed",
                "{} -> {}",
                path.display(),
                config.display()
            );
            self.inner.schedule_load(config.clone());
        }
        dependents.len()
    }

    /// Re-run priority resolution for `root`.
    pub fn reresolve(&self, root: &Path) {
        self.inner.reresolve(&paths::normalize_dir(root));
    }

    fn route_dictionary(&self, path: &Path) {
        let normalized = paths::normalize(path);
        if self.inner.dependencies.is_dictionary(&normalized) {
            self.on_dictionary_file_changed(&normalized);
        }
    }

    /// Current search roots, recomputed from their sources.
    pub fn search_roots(&self) -> BTreeSet<PathBuf> {
        self.inner.search_roots()
    }

    /// Snapshot of root -> active configuration file.
    pub fn active_files(&self) -> BTreeMap<PathBuf, PathBuf> {
        self.inner
            .active
            .iter()
            .map(|entry| (entry.key().clone(), entry.value().clone()))
            .collect()
    }

    pub fn active_for(&self, root: &Path) -> Option<PathBuf> {
        self.inner
            .active
            .get(&paths::normalize_dir(root))
            .map(|entry| entry.value().clone())
    }

    /// Words of the last load of `config`.
    pub fn words_of(&self, config: &Path) -> Option<Vec<String>> {
        self.inner
            .parsed
            .get(&paths::normalize(config))
            .map(|entry| entry.value().clone())
    }

    /// The published global word set.
    pub fn global_words(&self) -> HashSet<String> {
        self.inner.aggregator.published()
    }

    pub fn dependencies(&self) -> &DependencyIndex {
        &self.inner.dependencies
    }

    pub fn project_root(&self) -> &Path {
        &self.inner.project_root
    }

    /// Completed loads since creation.
    pub fn load_count(&self) -> u64 {
        self.inner.loads.load(Ordering::SeqCst)
    }

    pub fn pending_reloads(&self) -> usize {
        self.inner.scheduler.pending_count()
    }

    /// Cancel pending work and stop accepting events.
    pub fn shutdown(&self) {
        if !self.inner.scheduler.is_shut_down() {
            crate::log_event!("registry", "shutdown");
        }
        self.inner.scheduler.shutdown();
    }

    pub fn is_shut_down(&self) -> bool {
        self.inner.scheduler.is_shut_down()
    }
}

impl Inner {
    fn search_roots(&self) -> BTreeSet<PathBuf> {
        resolver::compute_search_roots(
            &self.project_root,
            self.search_paths.as_ref(),
            self.dependencies.dictionary_paths(),
        )
    }

    /// Search root of `path` if it is one of the current search roots.
    fn relevant_root(&self, path: &Path) -> Option<PathBuf> {
        let root = resolver::search_root_for(path)?;
        if self.search_roots().contains(&root) {
            Some(root)
        } else {
            crate::debug_event!("registry", "outside search roots", "{}", path.display());
            None
        }
    }

    fn is_active(&self, path: &Path) -> bool {
        resolver::search_root_for(path)
            .and_then(|root| self.active.get(&root).map(|active| *active == *path))
            .unwrap_or(false)
    }

    /// Load `config` and replace its word list and dependency edges.
    async fn load(&self, config: &Path) {
        let lock = self
            .load_locks
            .entry(config.to_path_buf())
            .or_default()
            .clone();
        let _guard = lock.lock().await;

        let loaded = self.loader.load(config).await;
        self.loads.fetch_add(1, Ordering::SeqCst);

        if !config.exists() {
            // Deleted while loading
            self.dependencies.remove(config);
            self.parsed.remove(config);
            return;
        }

        let diff = self.dependencies.update(config, loaded.dictionary_paths);
        if !diff.added.is_empty() || !diff.removed.is_empty() {
            crate::debug_event!(
                "registry",
                "dictionaries",
                "{}: +{} -{}",
                config.display(),
                diff.added.len(),
                diff.removed.len()
            );
        }
        crate::debug_event!(
            "registry",
            "loaded",
            "{} ({} words)",
            config.display(),
            loaded.words.len()
        );
        self.parsed.insert(config.to_path_buf(), loaded.words);
    }

    fn recompute(&self) -> bool {
        self.aggregator.recompute(|| {
            let mut words = HashSet::new();
            for entry in self.active.iter() {
                if let Some(list) = self.parsed.get(entry.value()) {
                    words.extend(list.iter().cloned());
                }
            }
            words
        })
    }

    fn schedule_load(self: &Arc<Self>, config: PathBuf) {
        let inner = Arc::clone(self);
        let target = config.clone();
        self.scheduler.schedule(config, async move {
            inner.load(&target).await;
            inner.recompute();
        });
    }

    fn schedule_reresolve(self: &Arc<Self>, manifest: PathBuf, root: PathBuf) {
        crate::debug_event!("registry", "manifest edited", "{}", manifest.display());
        let inner = Arc::clone(self);
        self.scheduler.schedule(manifest, async move {
            inner.reresolve(&root);
        });
    }

    fn reresolve(self: &Arc<Self>, root: &Path) {
        match resolver::find_active_config(root) {
            Some(config) => {
                let previous = self.active.insert(root.to_path_buf(), config.clone());
                if previous.as_ref() == Some(&config) {
                    crate::debug_event!("registry", "unchanged", "{}", root.display());
                    return;
                }
                crate::log_event!("registry", "active", "{} -> {}", root.display(), config.display());
                self.schedule_load(config);
            }
            None => {
                if self.active.remove(root).is_some() {
                    crate::log_event!("registry", "cleared", "{}", root.display());
                }
                self.recompute();
            }
        }
    }
}

/// Builder for constructing an [`ActiveConfigRegistry`].
pub struct ActiveConfigRegistryBuilder {
    project_root: Option<PathBuf>,
    search_paths: Option<Arc<dyn SearchPathSource>>,
    parsers: Option<ParserSet>,
    sink: Option<Arc<dyn WordSink>>,
    debounce_ms: u64,
    runtime: Option<Handle>,
}

impl ActiveConfigRegistryBuilder {
    pub fn new() -> Self {
        Self {
            project_root: None,
            search_paths: None,
            parsers: None,
            sink: None,
            debounce_ms: 500,
            runtime: None,
        }
    }

    /// Set the project root (always a search root).
    pub fn project_root(mut self, path: PathBuf) -> Self {
        self.project_root = Some(path);
        self
    }

    /// Set the source of custom search directories.
    pub fn search_paths(mut self, source: Arc<dyn SearchPathSource>) -> Self {
        self.search_paths = Some(source);
        self
    }

    /// Set the parser collaborators.
    pub fn parsers(mut self, parsers: ParserSet) -> Self {
        self.parsers = Some(parsers);
        self
    }

    /// Set the consumer of the global word set.
    pub fn sink(mut self, sink: Arc<dyn WordSink>) -> Self {
        self.sink = Some(sink);
        self
    }

    /// Set the debounce delay in milliseconds.
    pub fn debounce_ms(mut self, ms: u64) -> Self {
        self.debounce_ms = ms;
        self
    }

    /// Set the runtime background loads are spawned on.
    pub fn runtime(mut self, handle: Handle) -> Self {
        self.runtime = Some(handle);
        self
    }

    pub fn build(self) -> Result<ActiveConfigRegistry, WatchError> {
        let sink = self.sink.ok_or_else(|| WatchError::InitFailed {
            reason: "Word sink is required".to_string(),
        })?;

        let runtime = match self.runtime {
            Some(handle) => handle,
            None => Handle::try_current().map_err(|_| WatchError::NoRuntime)?,
        };

        let project_root = self
            .project_root
            .unwrap_or_else(|| std::env::current_dir().unwrap_or_else(|_| PathBuf::from(".")));

        let search_paths = self
            .search_paths
            .unwrap_or_else(|| Arc::new(SearchPaths::default()));

        Ok(ActiveConfigRegistry {
            inner: Arc::new(Inner {
                project_root: paths::normalize_dir(&project_root),
                search_paths,
                loader: ConfigLoader::new(self.parsers.unwrap_or_default()),
                dependencies: DependencyIndex::new(),
                active: DashMap::new(),
                parsed: DashMap::new(),
                load_locks: DashMap::new(),
                aggregator: WordSetAggregator::new(sink),
                scheduler: DebounceScheduler::new(Duration::from_millis(self.debounce_ms), runtime),
                loads: AtomicU64::new(0),
            }),
        })
    }
}

impl Default for ActiveConfigRegistryBuilder {
    fn default() -> Self {
        Self::new()
    }
}

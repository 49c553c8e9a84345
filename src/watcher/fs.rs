//! File-system event source backed by `notify`.
//!
//! Configuration files live directly in a search root or one level down
//! in a recognized container, and dictionaries live in search roots by
//! construction, so every root is watched non-recursively together with
//! its container directories. The watch set is re-synced periodically
//! because background reloads can add search roots at any time.
//!
//! The event loop never awaits reload work. Settings edits are debounced
//! onto their own task, and the rescan they trigger is picked up by the
//! next resync.

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use notify::event::{ModifyKind, RenameMode};
use notify::{Event, EventKind, RecursiveMode, Watcher};
use tokio::runtime::Handle;
use tokio::sync::mpsc;
use tokio::time::{Duration, MissedTickBehavior};
use tokio_util::sync::CancellationToken;

use crate::catalog::{self, GENERIC_CONTAINER, HIDDEN_CONTAINERS};
use crate::config::Settings;
use crate::parsers::NodeLocator;
use crate::paths;
use crate::resolver::SearchPaths;

use super::debouncer::DebounceScheduler;
use super::error::WatchError;
use super::event::FileEvent;
use super::registry::ActiveConfigRegistry;

/// Translate one raw `notify` event into registry events.
pub fn translate(event: &Event) -> Vec<FileEvent> {
    let paths = &event.paths;
    match event.kind {
        EventKind::Create(_) => paths.iter().cloned().map(FileEvent::Created).collect(),
        EventKind::Remove(_) => paths.iter().cloned().map(FileEvent::Deleted).collect(),
        EventKind::Modify(ModifyKind::Name(RenameMode::Both)) if paths.len() == 2 => {
            vec![FileEvent::Moved {
                from: paths[0].clone(),
                to: paths[1].clone(),
            }]
        }
        EventKind::Modify(ModifyKind::Name(RenameMode::From)) => {
            paths.iter().cloned().map(FileEvent::Deleted).collect()
        }
        EventKind::Modify(ModifyKind::Name(RenameMode::To)) => {
            paths.iter().cloned().map(FileEvent::Created).collect()
        }
        // Backends that cannot tell the two sides apart
        EventKind::Modify(ModifyKind::Name(_)) => paths
            .iter()
            .map(|path| {
                if path.exists() {
                    FileEvent::Created(path.clone())
                } else {
                    FileEvent::Deleted(path.clone())
                }
            })
            .collect(),
        EventKind::Modify(ModifyKind::Data(_)) | EventKind::Modify(ModifyKind::Any) => paths
            .iter()
            .cloned()
            .map(FileEvent::ContentChanged)
            .collect(),
        _ => Vec::new(),
    }
}

/// Directories to watch for a set of search roots: each root plus its
/// existing container directories.
pub fn watch_dirs_for(roots: &BTreeSet<PathBuf>) -> BTreeSet<PathBuf> {
    let mut dirs = BTreeSet::new();
    for root in roots {
        dirs.insert(root.clone());
        for container in HIDDEN_CONTAINERS.iter().chain(std::iter::once(&GENERIC_CONTAINER)) {
            let dir = root.join(container);
            if dir.is_dir() {
                dirs.insert(dir);
            }
        }
    }
    dirs
}

/// Whether `event` can matter to `registry`: it names a catalog file or a
/// tracked dictionary.
pub fn is_relevant(event: &FileEvent, registry: &ActiveConfigRegistry) -> bool {
    event.paths().into_iter().any(|path| {
        path.file_name()
            .and_then(|name| name.to_str())
            .is_some_and(catalog::is_candidate_file_name)
            || registry.dependencies().is_dictionary(&paths::normalize(path))
    })
}

/// Feeds file-system changes into an [`ActiveConfigRegistry`].
pub struct FsWatcher {
    registry: ActiveConfigRegistry,
    search_paths: Arc<SearchPaths>,
    node: Option<Arc<NodeLocator>>,
    settings_path: Option<PathBuf>,
    event_rx: mpsc::Receiver<notify::Result<Event>>,
    watcher: notify::RecommendedWatcher,
    watched: BTreeSet<PathBuf>,
    resync_interval: Duration,
    settings_reload: DebounceScheduler,
}

impl FsWatcher {
    pub fn builder() -> FsWatcherBuilder {
        FsWatcherBuilder::new()
    }

    /// Run until `shutdown` is cancelled, then tear the registry down.
    ///
    /// The registry should already be initialized.
    pub async fn watch(mut self, shutdown: CancellationToken) -> Result<(), WatchError> {
        self.sync_watches();
        crate::log_event!("watcher", "started", "{} directories", self.watched.len());

        let mut resync = tokio::time::interval(self.resync_interval);
        resync.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = shutdown.cancelled() => break,

                received = self.event_rx.recv() => {
                    match received {
                        Some(Ok(event)) => self.handle_event(event),
                        Some(Err(e)) => tracing::error!("[watcher] file watch error: {e}"),
                        None => {
                            self.settings_reload.shutdown();
                            self.registry.shutdown();
                            return Err(WatchError::EventError {
                                details: "event channel closed".to_string(),
                            });
                        }
                    }
                }

                _ = resync.tick() => self.sync_watches(),
            }
        }

        self.settings_reload.shutdown();
        self.registry.shutdown();
        crate::log_event!("watcher", "stopped");
        Ok(())
    }

    fn handle_event(&mut self, event: Event) {
        for file_event in translate(&event) {
            crate::debug_event!("watcher", "event", "{file_event:?}");

            if self.touches_settings(&file_event) {
                self.schedule_settings_reload();
                continue;
            }

            if let FileEvent::Created(path) = &file_event {
                if path.is_dir() && self.is_container_of_root(path) {
                    self.watch_directory(path);
                }
            }

            if is_relevant(&file_event, &self.registry) {
                self.registry.handle(&file_event);
            }
        }
    }

    fn touches_settings(&self, event: &FileEvent) -> bool {
        let Some(settings) = &self.settings_path else {
            return false;
        };
        match event {
            FileEvent::Created(path) | FileEvent::ContentChanged(path) => path == settings,
            FileEvent::Moved { to, .. }
            | FileEvent::Copied { to, .. }
            | FileEvent::Renamed { to, .. } => to == settings,
            FileEvent::Deleted(_) => false,
        }
    }

    fn is_container_of_root(&self, dir: &Path) -> bool {
        let is_container = dir
            .file_name()
            .and_then(|name| name.to_str())
            .is_some_and(|name| HIDDEN_CONTAINERS.contains(&name) || name == GENERIC_CONTAINER);
        is_container
            && dir
                .parent()
                .is_some_and(|parent| self.watched.contains(parent))
    }

    /// Apply edited settings in the background once the editor is done
    /// writing: new custom search paths and Node executable, followed by a
    /// full rescan.
    fn schedule_settings_reload(&self) {
        let Some(path) = self.settings_path.clone() else {
            return;
        };
        let registry = self.registry.clone();
        let search_paths = Arc::clone(&self.search_paths);
        let node = self.node.clone();

        self.settings_reload.schedule(path.clone(), async move {
            let settings = match Settings::load_from(&path) {
                Ok(settings) => settings,
                Err(e) => {
                    let err = WatchError::ConfigError {
                        reason: format!("{}: {e}", path.display()),
                    };
                    tracing::warn!("[config] {err}");
                    return;
                }
            };

            crate::log_event!("config", "reloaded", "{}", path.display());
            search_paths.set(settings.resolved_custom_paths(registry.project_root()));
            if let Some(node) = &node {
                node.set_configured(settings.node.executable.clone());
            }

            if let Err(e) = registry.initialize().await {
                tracing::warn!("[config] rescan failed: {e}");
            }
        });
    }

    /// Watch directories for new search roots. Directories that went away
    /// are dropped from the bookkeeping; the backend forgets them itself.
    fn sync_watches(&mut self) {
        let mut wanted = watch_dirs_for(&self.registry.search_roots());
        if let Some(settings_dir) = self.settings_path.as_ref().and_then(|p| p.parent()) {
            if settings_dir.is_dir() {
                wanted.insert(settings_dir.to_path_buf());
            }
        }

        self.watched.retain(|dir| dir.is_dir());
        let added: Vec<PathBuf> = wanted.difference(&self.watched).cloned().collect();
        for dir in added {
            self.watch_directory(&dir);
        }
    }

    fn watch_directory(&mut self, dir: &Path) {
        if self.watched.contains(dir) {
            return;
        }
        match self.watcher.watch(dir, RecursiveMode::NonRecursive) {
            Ok(()) => {
                crate::debug_event!("watcher", "watching", "{}", dir.display());
                self.watched.insert(dir.to_path_buf());
            }
            Err(e) => {
                // Keep going; the next resync retries
                let err = WatchError::PathWatchFailed {
                    path: dir.to_path_buf(),
                    reason: e.to_string(),
                };
                tracing::warn!("[watcher] {err}");
            }
        }
    }
}

/// Builder for constructing an [`FsWatcher`].
pub struct FsWatcherBuilder {
    registry: Option<ActiveConfigRegistry>,
    search_paths: Option<Arc<SearchPaths>>,
    node: Option<Arc<NodeLocator>>,
    settings_path: Option<PathBuf>,
    resync_ms: u64,
    settings_debounce_ms: u64,
}

impl FsWatcherBuilder {
    pub fn new() -> Self {
        Self {
            registry: None,
            search_paths: None,
            node: None,
            settings_path: None,
            resync_ms: 1_000,
            settings_debounce_ms: 100,
        }
    }

    /// Set the registry events are delivered to.
    pub fn registry(mut self, registry: ActiveConfigRegistry) -> Self {
        self.registry = Some(registry);
        self
    }

    /// Set the search path list to update on settings edits.
    pub fn search_paths(mut self, search_paths: Arc<SearchPaths>) -> Self {
        self.search_paths = Some(search_paths);
        self
    }

    /// Set the Node locator to update on settings edits.
    pub fn node(mut self, node: Arc<NodeLocator>) -> Self {
        self.node = Some(node);
        self
    }

    /// Set the settings file to watch.
    pub fn settings_path(mut self, path: PathBuf) -> Self {
        self.settings_path = Some(path);
        self
    }

    /// Set how often the watch set is re-synced with the search roots.
    pub fn resync_ms(mut self, ms: u64) -> Self {
        self.resync_ms = ms;
        self
    }

    /// Set how long a settings edit must be quiet before it is applied.
    pub fn settings_debounce_ms(mut self, ms: u64) -> Self {
        self.settings_debounce_ms = ms;
        self
    }

    pub fn build(self) -> Result<FsWatcher, WatchError> {
        let registry = self.registry.ok_or_else(|| WatchError::InitFailed {
            reason: "Registry is required".to_string(),
        })?;
        let runtime = Handle::try_current().map_err(|_| WatchError::NoRuntime)?;

        let (tx, rx) = mpsc::channel(100);
        let watcher = notify::recommended_watcher(move |res: notify::Result<Event>| {
            let _ = tx.blocking_send(res);
        })?;

        Ok(FsWatcher {
            registry,
            search_paths: self.search_paths.unwrap_or_default(),
            node: self.node,
            settings_path: self.settings_path,
            event_rx: rx,
            watcher,
            watched: BTreeSet::new(),
            resync_interval: Duration::from_millis(self.resync_ms.max(10)),
            settings_reload: DebounceScheduler::new(
                Duration::from_millis(self.settings_debounce_ms),
                runtime,
            ),
        })
    }
}

impl Default for FsWatcherBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use notify::event::{CreateKind, DataChange, MetadataKind, RemoveKind};
    use tempfile::TempDir;

    fn event(kind: EventKind, paths: &[&str]) -> Event {
        paths
            .iter()
            .fold(Event::new(kind), |event, path| event.add_path(PathBuf::from(path)))
    }

    #[test]
    fn test_translate_basic_kinds() {
        let created = event(EventKind::Create(CreateKind::File), &["/w/cspell.json"]);
        assert_eq!(
            translate(&created),
            vec![FileEvent::Created(PathBuf::from("/w/cspell.json"))]
        );

        let modified = event(
            EventKind::Modify(ModifyKind::Data(DataChange::Content)),
            &["/w/cspell.json"],
        );
        assert_eq!(
            translate(&modified),
            vec![FileEvent::ContentChanged(PathBuf::from("/w/cspell.json"))]
        );

        let removed = event(EventKind::Remove(RemoveKind::File), &["/w/cspell.json"]);
        assert_eq!(
            translate(&removed),
            vec![FileEvent::Deleted(PathBuf::from("/w/cspell.json"))]
        );
    }

    #[test]
    fn test_translate_renames() {
        let both = event(
            EventKind::Modify(ModifyKind::Name(RenameMode::Both)),
            &["/w/cspell.json", "/w/.cspell.json"],
        );
        assert_eq!(
            translate(&both),
            vec![FileEvent::Moved {
                from: PathBuf::from("/w/cspell.json"),
                to: PathBuf::from("/w/.cspell.json"),
            }]
        );

        let from = event(
            EventKind::Modify(ModifyKind::Name(RenameMode::From)),
            &["/w/cspell.json"],
        );
        assert_eq!(
            translate(&from),
            vec![FileEvent::Deleted(PathBuf::from("/w/cspell.json"))]
        );

        let to = event(
            EventKind::Modify(ModifyKind::Name(RenameMode::To)),
            &["/w/cspell.json"],
        );
        assert_eq!(
            translate(&to),
            vec![FileEvent::Created(PathBuf::from("/w/cspell.json"))]
        );
    }

    #[test]
    fn test_translate_ignores_metadata_and_access() {
        let metadata = event(
            EventKind::Modify(ModifyKind::Metadata(MetadataKind::Permissions)),
            &["/w/cspell.json"],
        );
        assert!(translate(&metadata).is_empty());
        assert!(translate(&event(EventKind::Other, &["/w/cspell.json"])).is_empty());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_relevance_covers_catalog_names_and_dictionaries() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path().canonicalize().unwrap();
        std::fs::write(
            root.join("cspell.json"),
            r#"{"dictionaryDefinitions":[{"path":"team.txt","addWords":true}]}"#,
        )
        .unwrap();

        let registry = ActiveConfigRegistry::builder()
            .project_root(root.clone())
            .sink(Arc::new(crate::words::SharedWordSet::default()))
            .build()
            .unwrap();
        registry.initialize().await.unwrap();

        let relevant = |event: FileEvent| is_relevant(&event, &registry);
        assert!(relevant(FileEvent::ContentChanged(root.join(".vscode").join("cSpell.json"))));
        assert!(relevant(FileEvent::Created(root.join("team.txt"))));
        assert!(relevant(FileEvent::Moved {
            from: root.join("team.txt"),
            to: root.join("archive.txt"),
        }));
        assert!(!relevant(FileEvent::ContentChanged(root.join("main.rs"))));
        assert!(!relevant(FileEvent::Created(root.join("other.txt"))));
    }

    #[test]
    fn test_watch_dirs_include_existing_containers() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path().to_path_buf();
        std::fs::create_dir(root.join(".vscode")).unwrap();
        std::fs::create_dir(root.join("src")).unwrap();

        let dirs = watch_dirs_for(&BTreeSet::from([root.clone()]));
        assert_eq!(dirs, BTreeSet::from([root.clone(), root.join(".vscode")]));
    }
}

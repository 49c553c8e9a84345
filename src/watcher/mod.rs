//! Live tracking of active configuration files.
//!
//! # Architecture
//!
//! ```text
//! FsWatcher (notify, non-recursive per search root + containers)
//!   - translates raw events into FileEvent
//!   - drops events naming no catalog file or tracked dictionary
//!   - reloads settings and rescans on settings edits (background task)
//!         |
//! ActiveConfigRegistry
//!   - root -> active file (DashMap)
//!   - file -> words (DashMap)
//!   - DependencyIndex (config <-> dictionary)
//!   - DebounceScheduler (one pending load per path)
//!         |
//! WordSetAggregator -> WordSink
//! ```

mod debouncer;
mod error;
mod event;
mod fs;
mod registry;

pub use debouncer::DebounceScheduler;
pub use error::WatchError;
pub use event::{Change, FileEvent};
pub use fs::{FsWatcher, FsWatcherBuilder, is_relevant, translate, watch_dirs_for};
pub use registry::{ActiveConfigRegistry, ActiveConfigRegistryBuilder};

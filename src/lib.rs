pub mod logging;

pub mod catalog;
pub mod cli;
pub mod config;
pub mod dependency;
pub mod loader;
pub mod parsers;
pub mod paths;
pub mod resolver;
pub mod watcher;
pub mod words;

pub use catalog::{CATALOG, CatalogEntry};
pub use config::Settings;
pub use dependency::{DependencyDiff, DependencyIndex};
pub use loader::{ConfigLoader, LoadedConfig};
pub use parsers::{ConfigParser, DictionaryDefinition, ParseError, ParsedConfig, ParserSet};
pub use resolver::{SearchPathSource, SearchPaths};
pub use watcher::{ActiveConfigRegistry, DebounceScheduler, FileEvent, FsWatcher, WatchError};
pub use words::{SharedWordSet, WordSetAggregator, WordSetEvent, WordSink};

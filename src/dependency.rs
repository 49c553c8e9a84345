//! Configuration file ↔ dictionary file relation.
//!
//! The forward map holds, per configuration file, the dictionary paths its
//! last load consulted. The reverse map answers "which configurations
//! depend on this dictionary". Both live behind one lock so every update
//! for a configuration is applied as a unit; the reverse map never holds an
//! empty set.

use std::collections::{BTreeSet, HashMap, HashSet};
use std::path::{Path, PathBuf};

use parking_lot::RwLock;

#[derive(Debug, Default)]
struct Edges {
    consulted: HashMap<PathBuf, BTreeSet<PathBuf>>,
    dependents: HashMap<PathBuf, HashSet<PathBuf>>,
}

impl Edges {
    fn unlink(&mut self, config: &Path, dictionary: &Path) {
        if let Some(configs) = self.dependents.get_mut(dictionary) {
            configs.remove(config);
            if configs.is_empty() {
                self.dependents.remove(dictionary);
            }
        }
    }
}

/// Bidirectional index between configurations and their dictionaries.
#[derive(Debug, Default)]
pub struct DependencyIndex {
    edges: RwLock<Edges>,
}

/// What changed for one configuration in an update.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct DependencyDiff {
    pub added: Vec<PathBuf>,
    pub removed: Vec<PathBuf>,
}

impl DependencyIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the consulted set of `config` with `consulted`.
    pub fn update(&self, config: &Path, consulted: BTreeSet<PathBuf>) -> DependencyDiff {
        let mut edges = self.edges.write();
        let previous = edges.consulted.remove(config).unwrap_or_default();

        let removed: Vec<PathBuf> = previous.difference(&consulted).cloned().collect();
        let added: Vec<PathBuf> = consulted.difference(&previous).cloned().collect();

        for dictionary in &removed {
            edges.unlink(config, dictionary);
        }
        for dictionary in &added {
            edges
                .dependents
                .entry(dictionary.clone())
                .or_default()
                .insert(config.to_path_buf());
        }

        if !consulted.is_empty() {
            edges.consulted.insert(config.to_path_buf(), consulted);
        }

        DependencyDiff { added, removed }
    }

    /// Drop every edge of `config`.
    pub fn remove(&self, config: &Path) {
        let mut edges = self.edges.write();
        if let Some(previous) = edges.consulted.remove(config) {
            for dictionary in &previous {
                edges.unlink(config, dictionary);
            }
        }
    }

    /// Configurations that consulted `dictionary` on their last load.
    pub fn dependents_of(&self, dictionary: &Path) -> Vec<PathBuf> {
        let edges = self.edges.read();
        let mut configs: Vec<PathBuf> = edges
            .dependents
            .get(dictionary)
            .map(|set| set.iter().cloned().collect())
            .unwrap_or_default();
        configs.sort();
        configs
    }

    pub fn is_dictionary(&self, path: &Path) -> bool {
        self.edges.read().dependents.contains_key(path)
    }

    /// Every dictionary path currently depended on.
    pub fn dictionary_paths(&self) -> Vec<PathBuf> {
        self.edges.read().dependents.keys().cloned().collect()
    }

    /// Dictionaries consulted by `config`.
    pub fn consulted_by(&self, config: &Path) -> BTreeSet<PathBuf> {
        self.edges
            .read()
            .consulted
            .get(config)
            .cloned()
            .unwrap_or_default()
    }

    pub fn clear(&self) {
        let mut edges = self.edges.write();
        edges.consulted.clear();
        edges.dependents.clear();
    }

    /// Check that the reverse map mirrors the forward map exactly.
    #[cfg(test)]
    pub(crate) fn is_consistent(&self) -> bool {
        let edges = self.edges.read();
        let mut mirrored: HashMap<PathBuf, HashSet<PathBuf>> = HashMap::new();
        for (config, dictionaries) in &edges.consulted {
            for dictionary in dictionaries {
                mirrored
                    .entry(dictionary.clone())
                    .or_default()
                    .insert(config.clone());
            }
        }
        mirrored == edges.dependents
    }
}

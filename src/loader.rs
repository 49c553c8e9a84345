//! Loading one configuration file into its word list.
//!
//! A load parses the file with the matching [`ConfigParser`], then reads
//! every dictionary definition that is enabled either by `addWords: true`
//! or by name through the `dictionaries` list. Every dictionary path that
//! was attempted is reported, whether or not it could be read, so that a
//! dictionary created later still routes back to this configuration.
//!
//! [`ConfigParser`]: crate::parsers::ConfigParser

use std::collections::{BTreeSet, HashSet};
use std::path::{Path, PathBuf};

use indexmap::IndexSet;

use crate::parsers::{DictionaryDefinition, ParserSet, ParsedConfig};
use crate::paths;

/// Result of loading one configuration file.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LoadedConfig {
    /// Own `words` followed by dictionary contributions, deduplicated in
    /// first-seen order.
    pub words: Vec<String>,
    /// Every dictionary path consulted, normalized.
    pub dictionary_paths: BTreeSet<PathBuf>,
}

/// Words and consulted paths from the enabled dictionary definitions.
#[derive(Debug, Default)]
struct DictionaryWords {
    words: Vec<String>,
    paths: BTreeSet<PathBuf>,
}

#[derive(Clone)]
pub struct ConfigLoader {
    parsers: ParserSet,
}

impl ConfigLoader {
    pub fn new(parsers: ParserSet) -> Self {
        Self { parsers }
    }

    /// Load `config_file`. Parse failures are logged and yield an empty
    /// result; they never propagate.
    pub async fn load(&self, config_file: &Path) -> LoadedConfig {
        match self.parsers.parse(config_file).await {
            Ok(parsed) => merge_with_dictionaries(&parsed, config_file),
            Err(e) => {
                tracing::warn!("[loader] {e}");
                LoadedConfig::default()
            }
        }
    }
}

/// Combine a parsed config with its enabled dictionaries.
pub fn merge_with_dictionaries(parsed: &ParsedConfig, config_file: &Path) -> LoadedConfig {
    let active_names: HashSet<&str> = parsed
        .dictionaries
        .iter()
        .map(|name| name.trim())
        .filter(|name| !name.is_empty())
        .collect();

    let from_definitions =
        read_dictionary_definitions(&parsed.dictionary_definitions, config_file, &active_names);

    let merged: IndexSet<String> = parsed
        .words
        .iter()
        .cloned()
        .chain(from_definitions.words)
        .collect();

    LoadedConfig {
        words: merged.into_iter().collect(),
        dictionary_paths: from_definitions.paths,
    }
}

fn is_enabled(definition: &DictionaryDefinition, active_names: &HashSet<&str>) -> bool {
    let by_name = definition
        .name
        .as_deref()
        .map(str::trim)
        .is_some_and(|name| !name.is_empty() && active_names.contains(name));
    definition.add_words == Some(true) || by_name
}

fn read_dictionary_definitions(
    definitions: &[DictionaryDefinition],
    config_file: &Path,
    active_names: &HashSet<&str>,
) -> DictionaryWords {
    let mut result = DictionaryWords::default();
    let Some(config_dir) = paths::absolutize(config_file).parent().map(Path::to_path_buf) else {
        tracing::warn!(
            "[loader] config file has no parent directory: {}",
            config_file.display()
        );
        return result;
    };

    for definition in definitions {
        if !is_enabled(definition, active_names) {
            continue;
        }
        let Some(raw_path) = definition
            .path
            .as_deref()
            .map(str::trim)
            .filter(|p| !p.is_empty())
        else {
            continue;
        };

        let dictionary = resolve_dictionary_path(&config_dir, raw_path);
        result.paths.insert(dictionary.clone());

        if !dictionary.is_file() {
            crate::debug_event!("loader", "dictionary missing", "{}", dictionary.display());
            continue;
        }

        match std::fs::read_to_string(&dictionary) {
            Ok(content) => result.words.extend(dictionary_lines(&content)),
            Err(e) => {
                tracing::warn!(
                    "[loader] cannot read dictionary {}: {e}",
                    dictionary.display()
                );
            }
        }
    }

    result
}

/// Absolute paths are used as-is; relative ones are taken from the
/// configuration file's directory.
fn resolve_dictionary_path(config_dir: &Path, raw: &str) -> PathBuf {
    let candidate = Path::new(raw);
    if candidate.is_absolute() {
        paths::normalize(candidate)
    } else {
        paths::normalize(&config_dir.join(candidate))
    }
}

/// Words of a plain-text dictionary: trimmed lines without a byte-order
/// mark, skipping blanks and `#`, `//`, `;` comment lines.
pub fn dictionary_lines(content: &str) -> impl Iterator<Item = String> + '_ {
    content
        .lines()
        .map(|line| line.trim().trim_start_matches('\u{feff}').trim())
        .filter(|line| {
            !line.is_empty()
                && !line.starts_with('#')
                && !line.starts_with("//")
                && !line.starts_with(';')
        })
        .map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn definition(name: Option<&str>, path: &str, add_words: Option<bool>) -> DictionaryDefinition {
        DictionaryDefinition {
            name: name.map(str::to_string),
            path: Some(path.to_string()),
            add_words,
        }
    }

    #[test]
    fn test_dictionary_lines_filters_comments() {
        let content = "\u{feff}alpha\n#comment\n  beta  \n\n// note\n; ini style\ngamma\r\n";
        let words: Vec<String> = dictionary_lines(content).collect();
        assert_eq!(words, vec!["alpha", "beta", "gamma"]);
    }

    #[test]
    fn test_add_words_definition_is_merged() {
        let temp_dir = TempDir::new().unwrap();
        fs::write(temp_dir.path().join("extra.txt"), "alpha\n#comment\nbeta").unwrap();
        let config = temp_dir.path().join("cspell.json");

        let parsed = ParsedConfig {
            words: vec![],
            dictionary_definitions: vec![definition(None, "./extra.txt", Some(true))],
            dictionaries: vec![],
        };
        let loaded = merge_with_dictionaries(&parsed, &config);

        assert_eq!(loaded.words, vec!["alpha", "beta"]);
        assert_eq!(loaded.dictionary_paths.len(), 1);
        assert!(loaded.dictionary_paths.iter().next().unwrap().ends_with("extra.txt"));
    }

    #[test]
    fn test_named_dictionary_requires_definition() {
        let temp_dir = TempDir::new().unwrap();
        fs::write(temp_dir.path().join("custom.txt"), "activated\n").unwrap();
        let config = temp_dir.path().join("cspell.json");

        let parsed = ParsedConfig {
            words: vec!["base".to_string()],
            dictionary_definitions: vec![definition(Some("project-words"), "custom.txt", Some(false))],
            dictionaries: vec!["project-words".to_string()],
        };
        let loaded = merge_with_dictionaries(&parsed, &config);
        assert_eq!(loaded.words, vec!["base", "activated"]);

        let unmatched = ParsedConfig {
            words: vec!["base".to_string()],
            dictionary_definitions: vec![definition(Some("other"), "custom.txt", None)],
            dictionaries: vec!["project-words".to_string()],
        };
        let loaded = merge_with_dictionaries(&unmatched, &config);
        assert_eq!(loaded.words, vec!["base"]);
        assert!(loaded.dictionary_paths.is_empty());
    }

    #[test]
    fn test_missing_dictionary_is_still_consulted() {
        let temp_dir = TempDir::new().unwrap();
        let config = temp_dir.path().join("cspell.json");

        let parsed = ParsedConfig {
            words: vec!["own".to_string()],
            dictionary_definitions: vec![definition(None, "later.txt", Some(true))],
            dictionaries: vec![],
        };
        let loaded = merge_with_dictionaries(&parsed, &config);

        assert_eq!(loaded.words, vec!["own"]);
        assert_eq!(
            loaded.dictionary_paths.into_iter().collect::<Vec<_>>(),
            vec![paths::normalize(&temp_dir.path().join("later.txt"))]
        );
    }

    #[test]
    fn test_definition_without_path_is_skipped() {
        let parsed = ParsedConfig {
            words: vec![],
            dictionary_definitions: vec![DictionaryDefinition {
                name: Some("n".to_string()),
                path: Some("   ".to_string()),
                add_words: Some(true),
            }],
            dictionaries: vec![],
        };
        let loaded = merge_with_dictionaries(&parsed, Path::new("/w/cspell.json"));
        assert_eq!(loaded, LoadedConfig::default());
    }

    #[test]
    fn test_words_are_deduplicated_in_order() {
        let temp_dir = TempDir::new().unwrap();
        fs::write(temp_dir.path().join("a.txt"), "two\nthree\n").unwrap();
        fs::write(temp_dir.path().join("b.txt"), "three\nfour\none\n").unwrap();
        let config = temp_dir.path().join("cspell.json");

        let parsed = ParsedConfig {
            words: vec!["one".to_string(), "two".to_string(), "one".to_string()],
            dictionary_definitions: vec![
                definition(None, "a.txt", Some(true)),
                definition(None, "b.txt", Some(true)),
            ],
            dictionaries: vec![],
        };
        let loaded = merge_with_dictionaries(&parsed, &config);
        assert_eq!(loaded.words, vec!["one", "two", "three", "four"]);
    }

    #[test]
    fn test_absolute_dictionary_path() {
        let temp_dir = TempDir::new().unwrap();
        let dict = temp_dir.path().join("abs.txt");
        fs::write(&dict, "delta\n").unwrap();

        let parsed = ParsedConfig {
            words: vec![],
            dictionary_definitions: vec![definition(None, dict.to_str().unwrap(), Some(true))],
            dictionaries: vec![],
        };
        let loaded = merge_with_dictionaries(&parsed, Path::new("/elsewhere/cspell.json"));
        assert_eq!(loaded.words, vec!["delta"]);
    }

    #[tokio::test]
    async fn test_load_of_unparseable_file_is_empty() {
        let temp_dir = TempDir::new().unwrap();
        let config = temp_dir.path().join("cspell.json");
        fs::write(&config, "{ not json").unwrap();

        let loader = ConfigLoader::new(ParserSet::default());
        assert_eq!(loader.load(&config).await, LoadedConfig::default());
    }

    #[tokio::test]
    async fn test_load_json_with_dictionary() {
        let temp_dir = TempDir::new().unwrap();
        fs::write(temp_dir.path().join("extra.txt"), "alpha\n#comment\nbeta").unwrap();
        let config = temp_dir.path().join("cspell.json");
        fs::write(
            &config,
            r#"{"dictionaryDefinitions":[{"path":"./extra.txt","addWords":true}]}"#,
        )
        .unwrap();

        let loader = ConfigLoader::new(ParserSet::default());
        let loaded = loader.load(&config).await;
        assert_eq!(loaded.words, vec!["alpha", "beta"]);
    }
}

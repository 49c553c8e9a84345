//! Format-specific readers for cspell configuration files.
//!
//! Each parser turns one file into a [`ParsedConfig`]. Failures are
//! reported as [`ParseError`]; the loader logs them and treats the file as
//! contributing no words, so a parser never aborts a reload.
//!
//! | Extension            | Parser        |
//! |----------------------|---------------|
//! | `json`, `jsonc`      | [`JsonParser`] (also `package.json`) |
//! | `yaml`, `yml`        | [`YamlParser`] |
//! | `toml`               | [`TomlParser`] |
//! | `js`, `cjs`, `mjs`   | [`JsParser`] (Node.js subprocess) |

mod error;
mod js;
mod json;
pub mod node;
mod toml;
mod yaml;

use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

pub use error::{ParseError, ParseResult};
pub use js::JsParser;
pub use json::JsonParser;
pub use node::NodeLocator;
pub use self::toml::TomlParser;
pub use yaml::YamlParser;

/// Reference to an auxiliary word-list file.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DictionaryDefinition {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub path: Option<String>,
    #[serde(default)]
    pub add_words: Option<bool>,
}

/// The subset of a cspell configuration this crate consumes.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ParsedConfig {
    #[serde(default)]
    pub words: Vec<String>,
    #[serde(default)]
    pub dictionary_definitions: Vec<DictionaryDefinition>,
    #[serde(default)]
    pub dictionaries: Vec<String>,
}

/// A parser for one configuration format.
#[async_trait]
pub trait ConfigParser: Send + Sync {
    /// Parser name for logging.
    fn name(&self) -> &str;

    /// Parse the file at `path`.
    async fn parse(&self, path: &Path) -> ParseResult<ParsedConfig>;
}

/// Parser lookup by file extension.
#[derive(Clone)]
pub struct ParserSet {
    json: Arc<dyn ConfigParser>,
    yaml: Arc<dyn ConfigParser>,
    toml: Arc<dyn ConfigParser>,
    js: Arc<dyn ConfigParser>,
}

impl ParserSet {
    /// Built-in parsers, with `node` used for JavaScript configs.
    pub fn new(node: Arc<NodeLocator>) -> Self {
        Self {
            json: Arc::new(JsonParser),
            yaml: Arc::new(YamlParser),
            toml: Arc::new(TomlParser),
            js: Arc::new(JsParser::new(node)),
        }
    }

    /// Use the same parser for every format. Mostly useful in tests.
    pub fn uniform(parser: Arc<dyn ConfigParser>) -> Self {
        Self {
            json: parser.clone(),
            yaml: parser.clone(),
            toml: parser.clone(),
            js: parser,
        }
    }

    /// Parser responsible for `path`, chosen by lowercase extension.
    pub fn for_path(&self, path: &Path) -> Option<&Arc<dyn ConfigParser>> {
        let ext = path.extension()?.to_str()?.to_ascii_lowercase();
        match ext.as_str() {
            "json" | "jsonc" => Some(&self.json),
            "yaml" | "yml" => Some(&self.yaml),
            "toml" => Some(&self.toml),
            "js" | "cjs" | "mjs" => Some(&self.js),
            _ => None,
        }
    }

    /// Parse `path` with the matching parser.
    pub async fn parse(&self, path: &Path) -> ParseResult<ParsedConfig> {
        let parser = self
            .for_path(path)
            .ok_or_else(|| ParseError::UnsupportedFormat {
                path: path.to_path_buf(),
            })?;
        parser.parse(path).await
    }
}

impl Default for ParserSet {
    fn default() -> Self {
        Self::new(Arc::new(NodeLocator::default()))
    }
}

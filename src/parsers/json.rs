//! JSON / JSONC configuration parser.
//!
//! Uses serde_json5 so comments and trailing commas in `cspell.jsonc` and
//! friends are accepted. A `package.json` manifest carries its
//! configuration under the top-level `cspell` key.

use std::path::Path;

use async_trait::async_trait;
use serde::Deserialize;

use super::{ConfigParser, ParseError, ParseResult, ParsedConfig};
use crate::catalog::MANIFEST_FILE;

#[derive(Debug, Default, Deserialize)]
struct Manifest {
    #[serde(default)]
    cspell: Option<ParsedConfig>,
}

/// Parse JSONC text into a config.
pub fn parse_jsonc(content: &str, path: &Path) -> ParseResult<ParsedConfig> {
    serde_json5::from_str(content).map_err(|e| ParseError::Json {
        path: path.to_path_buf(),
        reason: e.to_string(),
    })
}

/// Parse a `package.json` manifest. A manifest without a `cspell` section
/// is a valid, empty configuration.
pub fn parse_manifest(content: &str, path: &Path) -> ParseResult<ParsedConfig> {
    let manifest: Manifest = serde_json5::from_str(content).map_err(|e| ParseError::Json {
        path: path.to_path_buf(),
        reason: e.to_string(),
    })?;
    Ok(manifest.cspell.unwrap_or_default())
}

pub struct JsonParser;

#[async_trait]
impl ConfigParser for JsonParser {
    fn name(&self) -> &str {
        "json"
    }

    async fn parse(&self, path: &Path) -> ParseResult<ParsedConfig> {
        let content = tokio::fs::read_to_string(path)
            .await
            .map_err(|e| ParseError::io(path, e))?;
        let content = content.trim_start_matches('\u{feff}');

        let is_manifest = path
            .file_name()
            .is_some_and(|name| name == MANIFEST_FILE);
        if is_manifest {
            parse_manifest(content, path)
        } else {
            parse_jsonc(content, path)
        }
    }
}

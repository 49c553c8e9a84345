//! TOML configuration parser (`cspell.config.toml`).

use std::path::Path;

use async_trait::async_trait;

use super::{ConfigParser, ParseError, ParseResult, ParsedConfig};

pub fn parse_toml(content: &str, path: &Path) -> ParseResult<ParsedConfig> {
    toml::from_str(content).map_err(|e| ParseError::Toml {
        path: path.to_path_buf(),
        reason: e.to_string(),
    })
}

pub struct TomlParser;

#[async_trait]
impl ConfigParser for TomlParser {
    fn name(&self) -> &str {
        "toml"
    }

    async fn parse(&self, path: &Path) -> ParseResult<ParsedConfig> {
        let content = tokio::fs::read_to_string(path)
            .await
            .map_err(|e| ParseError::io(path, e))?;
        parse_toml(content.trim_start_matches('\u{feff}'), path)
    }
}

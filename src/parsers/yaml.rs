//! YAML configuration parser.

use std::path::Path;

use async_trait::async_trait;

use super::{ConfigParser, ParseError, ParseResult, ParsedConfig};

/// Parse YAML text into a config. An empty or comment-only document is an
/// empty config.
pub fn parse_yaml(content: &str, path: &Path) -> ParseResult<ParsedConfig> {
    let to_error = |e: serde_yaml::Error| ParseError::Yaml {
        path: path.to_path_buf(),
        reason: e.to_string(),
    };

    if content.trim().is_empty() {
        return Ok(ParsedConfig::default());
    }
    let value: serde_yaml::Value = serde_yaml::from_str(content).map_err(to_error)?;
    if value.is_null() {
        return Ok(ParsedConfig::default());
    }
    serde_yaml::from_value(value).map_err(to_error)
}

pub struct YamlParser;

#[async_trait]
impl ConfigParser for YamlParser {
    fn name(&self) -> &str {
        "yaml"
    }

    async fn parse(&self, path: &Path) -> ParseResult<ParsedConfig> {
        let content = tokio::fs::read_to_string(path)
            .await
            .map_err(|e| ParseError::io(path, e))?;
        parse_yaml(content.trim_start_matches('\u{feff}'), path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_yaml_with_schema_and_definitions() {
        let content = r#"
$schema: https://raw.githubusercontent.com/streetsidesoftware/cspell/main/cspell.schema.json
version: "0.2"
words:
  - one
  - two
dictionaryDefinitions:
  - name: team
    path: ./team-words.txt
dictionaries:
  - team
"#;
        let parsed = parse_yaml(content, Path::new("cspell.yaml")).unwrap();
        assert_eq!(parsed.words, vec!["one", "two"]);
        assert_eq!(parsed.dictionaries, vec!["team"]);
        assert_eq!(
            parsed.dictionary_definitions[0].path.as_deref(),
            Some("./team-words.txt")
        );
        assert_eq!(parsed.dictionary_definitions[0].add_words, None);
    }

    #[test]
    fn test_empty_yaml_is_empty_config() {
        let path = Path::new("cspell.yml");
        assert_eq!(parse_yaml("  \n", path).unwrap(), ParsedConfig::default());
        assert_eq!(
            parse_yaml("\n# nothing here\n", path).unwrap(),
            ParsedConfig::default()
        );
    }

    #[test]
    fn test_invalid_yaml_is_error() {
        let err = parse_yaml("words: [unterminated", Path::new("cspell.yml")).unwrap_err();
        assert!(matches!(err, ParseError::Yaml { .. }));
    }
}

//! JavaScript configuration parser (`cspell.config.{js,cjs,mjs}`).
//!
//! The module is evaluated by an external Node.js process which prints the
//! relevant fields as JSON on stdout. The process is killed when it exceeds
//! the locator's timeout.

use std::path::Path;
use std::process::Stdio;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::process::Command;

use super::node::NodeLocator;
use super::{ConfigParser, ParseError, ParseResult, ParsedConfig};

/// Loads the module given as the first argument with dynamic `import()`, so
/// CommonJS and ES modules both work, and prints the consumed fields.
const EVAL_SCRIPT: &str = r#"
const { pathToFileURL } = require('url');
import(pathToFileURL(process.argv[1]).href)
  .then(async (mod) => {
    let cfg = mod && mod.default !== undefined ? mod.default : mod;
    if (typeof cfg === 'function') cfg = await cfg();
    cfg = await cfg;
    cfg = cfg || {};
    process.stdout.write(JSON.stringify({
      words: Array.isArray(cfg.words) ? cfg.words : [],
      dictionaryDefinitions: Array.isArray(cfg.dictionaryDefinitions) ? cfg.dictionaryDefinitions : [],
      dictionaries: Array.isArray(cfg.dictionaries) ? cfg.dictionaries : [],
    }));
  })
  .catch((err) => {
    process.stderr.write(String(err && err.stack ? err.stack : err));
    process.exit(1);
  });
"#;

pub struct JsParser {
    node: Arc<NodeLocator>,
}

impl JsParser {
    pub fn new(node: Arc<NodeLocator>) -> Self {
        Self { node }
    }
}

/// Decode the JSON the evaluation script prints.
pub fn parse_node_output(stdout: &str, path: &Path) -> ParseResult<ParsedConfig> {
    serde_json::from_str(stdout.trim()).map_err(|e| ParseError::NodeFailed {
        path: path.to_path_buf(),
        reason: format!("unexpected output: {e}"),
    })
}

#[async_trait]
impl ConfigParser for JsParser {
    fn name(&self) -> &str {
        "js"
    }

    async fn parse(&self, path: &Path) -> ParseResult<ParsedConfig> {
        let node = self.node.locate()?;
        let working_dir = path.parent().unwrap_or_else(|| Path::new("."));

        let child = Command::new(&node)
            .arg("-e")
            .arg(EVAL_SCRIPT)
            .arg(path)
            .current_dir(working_dir)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| ParseError::NodeUnavailable {
                reason: format!("failed to start {}: {e}", node.display()),
            })?;

        let timeout = self.node.timeout();
        let output = match tokio::time::timeout(timeout, child.wait_with_output()).await {
            Ok(result) => result.map_err(|e| ParseError::io(path, e))?,
            Err(_) => {
                return Err(ParseError::NodeTimeout {
                    path: path.to_path_buf(),
                    timeout_ms: timeout.as_millis() as u64,
                });
            }
        };

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(ParseError::NodeFailed {
                path: path.to_path_buf(),
                reason: stderr.lines().next().unwrap_or("non-zero exit").to_string(),
            });
        }

        parse_node_output(&String::from_utf8_lossy(&output.stdout), path)
    }
}

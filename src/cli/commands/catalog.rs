//! Catalog command.

use crate::catalog::CATALOG;

/// Print every recognized location, highest priority first.
pub fn run() -> anyhow::Result<()> {
    println!("{:>3}  {:<32} {}", "#", "location", "applies to");
    for (index, entry) in CATALOG.iter().enumerate() {
        let applies_to = if entry.is_manifest() {
            "directory (manifest `cspell` field)"
        } else if entry.container_relative {
            "parent of container"
        } else {
            "directory"
        };
        println!("{index:>3}  {:<32} {applies_to}", entry.key);
    }
    Ok(())
}

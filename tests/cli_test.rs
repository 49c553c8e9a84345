use std::process::Command;
use tempfile::TempDir;

fn cspell_watch() -> Command {
    Command::new(env!("CARGO_BIN_EXE_cspell-watch"))
}

#[test]
fn test_init_command() {
    let temp_dir = TempDir::new().unwrap();

    let output = cspell_watch()
        .arg("init")
        .current_dir(temp_dir.path())
        .output()
        .expect("Failed to run init command");
    assert!(output.status.success());

    let config_path = temp_dir.path().join(".cspell-watch/settings.toml");
    let content = std::fs::read_to_string(&config_path).unwrap();
    assert!(content.contains("version = 1"));
    assert!(content.contains("[watcher]"));
    assert!(content.contains("debounce_ms = 500"));

    // Second init without --force refuses to overwrite
    let again = cspell_watch()
        .arg("init")
        .current_dir(temp_dir.path())
        .output()
        .unwrap();
    assert!(!again.status.success());
}

#[test]
fn test_catalog_command_lists_priority_order() {
    let output = cspell_watch().arg("catalog").output().unwrap();
    assert!(output.status.success());

    let stdout = String::from_utf8_lossy(&output.stdout);
    let lines: Vec<&str> = stdout.lines().collect();
    assert!(lines[1].contains(".cspell.json"));
    assert!(lines.last().unwrap().contains("package.json"));
    assert!(stdout.contains(".vscode/cspell.json"));
}

#[test]
fn test_words_command_prints_sorted_union() {
    let temp_dir = TempDir::new().unwrap();
    std::fs::write(temp_dir.path().join("dict.txt"), "zeta\n# skip\nalpha\n").unwrap();
    std::fs::write(
        temp_dir.path().join("cspell.json"),
        r#"{"words":["mid"],"dictionaryDefinitions":[{"path":"dict.txt","addWords":true}]}"#,
    )
    .unwrap();

    let output = cspell_watch()
        .arg("words")
        .arg(temp_dir.path())
        .current_dir(temp_dir.path())
        .output()
        .unwrap();
    assert!(output.status.success());

    let stdout = String::from_utf8_lossy(&output.stdout);
    assert_eq!(stdout.lines().collect::<Vec<_>>(), vec!["alpha", "mid", "zeta"]);
}

#[test]
fn test_resolve_command_shows_active_file() {
    let temp_dir = TempDir::new().unwrap();
    std::fs::write(temp_dir.path().join("cspell.json"), "{}").unwrap();
    std::fs::write(temp_dir.path().join(".cspell.json"), "{}").unwrap();

    let output = cspell_watch()
        .arg("resolve")
        .arg(temp_dir.path())
        .current_dir(temp_dir.path())
        .output()
        .unwrap();
    assert!(output.status.success());

    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains(".cspell.json"));
    assert!(!stdout.contains("(none)"));
}

#[test]
fn test_missing_project_root_fails() {
    let temp_dir = TempDir::new().unwrap();
    let output = cspell_watch()
        .arg("words")
        .arg(temp_dir.path().join("nope"))
        .output()
        .unwrap();
    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("not a directory"));
}

//! Smoke tests for lorewright CLI commands
//!
//! These run the built binary in an isolated temp directory. None of them
//! reach a model: they cover the commands that work offline and the exit
//! codes of the ones that cannot.

use serde_json::{Value, json};
use std::fs;
use std::path::Path;
use std::process::{Command, Output};
use tempfile::TempDir;

/// Run the lorewright binary in `work_dir` with a clean environment.
fn run_lorewright(args: &[&str], work_dir: &Path) -> Output {
    Command::new(env!("CARGO_BIN_EXE_lorewright"))
        .current_dir(work_dir)
        .args(args)
        .env_remove("GOOGLE_API_KEY")
        .env_remove("LOREWRIGHT_MODEL")
        .env_remove("LOREWRIGHT_STATE_DIR")
        .env_remove("LOREWRIGHT_DATA_DIR")
        .env_remove("LOREWRIGHT_MAX_ATTEMPTS")
        .env_remove("RUST_LOG")
        .output()
        .expect("failed to run lorewright")
}

fn stdout(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).into_owned()
}

fn write_checkpoint(dir: &Path, file: &str, document: &Value) {
    fs::write(
        dir.join(file),
        serde_json::to_string_pretty(document).unwrap(),
    )
    .unwrap();
}

fn paused_checkpoint() -> Value {
    json!({
        "project_name": "Ashen Crown",
        "eras": [{"name": "Age of Cinders", "summary": "Ash fell upward"}],
        "cosmology": {"creation_myth": "The sky was forged from a broken crown"},
        "factions": [{"name": "Ember Court"}, {"name": "Glass Synod"}],
        "current_phase": "factions",
        "completed_phases": ["eras", "factions"]
    })
}

#[test]
fn test_help_lists_commands() {
    let temp = TempDir::new().unwrap();
    let output = run_lorewright(&["--help"], temp.path());
    assert!(output.status.success());
    let text = stdout(&output);
    for command in ["generate", "resume", "export", "status", "config", "seeds"] {
        assert!(text.contains(command), "help is missing {command}");
    }
}

#[test]
fn test_config_shows_sources() {
    let temp = TempDir::new().unwrap();
    let output = run_lorewright(&["config", "--state-dir", "lore_projects"], temp.path());
    assert!(output.status.success());

    let text = stdout(&output);
    assert!(text.contains("state_dir"));
    assert!(text.contains("lore_projects  (cli)"));
    assert!(text.contains("(default)"));
    assert!(text.contains("API key (GOOGLE_API_KEY): not set"));
}

#[test]
fn test_config_file_is_discovered() {
    let temp = TempDir::new().unwrap();
    fs::create_dir_all(temp.path().join(".lorewright")).unwrap();
    fs::write(
        temp.path().join(".lorewright/config.toml"),
        "[counts]\neras = 7\n",
    )
    .unwrap();

    let output = run_lorewright(&["config"], temp.path());
    assert!(output.status.success());
    assert!(stdout(&output).contains("7  (config)"));
}

#[test]
fn test_invalid_config_file_exits_with_cli_args_code() {
    let temp = TempDir::new().unwrap();
    fs::create_dir_all(temp.path().join(".lorewright")).unwrap();
    fs::write(
        temp.path().join(".lorewright/config.toml"),
        "[retry]\nmax_attempts = 0\n",
    )
    .unwrap();

    let output = run_lorewright(&["config"], temp.path());
    assert_eq!(output.status.code(), Some(2));
}

#[test]
fn test_status_of_saved_project() {
    let temp = TempDir::new().unwrap();
    write_checkpoint(temp.path(), "Ashen_Crown_lore_state.json", &paused_checkpoint());

    let output = run_lorewright(&["status", "Ashen Crown", "--json"], temp.path());
    assert!(output.status.success());

    let status: Value = serde_json::from_str(&stdout(&output)).unwrap();
    assert_eq!(status["project_name"], json!("Ashen Crown"));
    assert_eq!(status["current_phase"], json!("factions"));
    assert_eq!(status["completed_phases"], json!(["eras", "factions"]));
    assert_eq!(status["next_phase"], json!("characters"));
    assert_eq!(status["artifact_counts"]["factions"], json!(2));
}

#[test]
fn test_status_of_unknown_project_exits_with_persistence_code() {
    let temp = TempDir::new().unwrap();
    let output = run_lorewright(&["status", "Nowhere"], temp.path());
    assert_eq!(output.status.code(), Some(4));
    assert!(String::from_utf8_lossy(&output.stderr).contains("No saved lore state"));
}

#[test]
fn test_export_writes_markdown() {
    let temp = TempDir::new().unwrap();
    write_checkpoint(temp.path(), "Ashen_Crown_lore_state.json", &paused_checkpoint());

    let output = run_lorewright(&["export", "Ashen Crown"], temp.path());
    assert!(output.status.success());

    let markdown = fs::read_to_string(temp.path().join("Ashen_Crown_lore_bible.md")).unwrap();
    assert!(markdown.starts_with("# Ashen Crown - Game Lore Bible"));
    assert!(markdown.contains("### Age of Cinders"));
    assert!(markdown.contains("### Ember Court"));
}

#[test]
fn test_export_to_explicit_path() {
    let temp = TempDir::new().unwrap();
    write_checkpoint(temp.path(), "Ashen_Crown_lore_state.json", &paused_checkpoint());

    let output = run_lorewright(
        &["export", "Ashen Crown", "--output", "bible.md"],
        temp.path(),
    );
    assert!(output.status.success());
    assert!(temp.path().join("bible.md").is_file());
}

#[test]
fn test_generate_without_api_key_exits_with_cli_args_code() {
    let temp = TempDir::new().unwrap();
    let output = run_lorewright(&["generate", "Ashen Crown"], temp.path());
    assert_eq!(output.status.code(), Some(2));
    assert!(!temp.path().join("Ashen_Crown_lore_state.json").exists());
}

#[test]
fn test_generate_rejects_corrupt_checkpoint() {
    let temp = TempDir::new().unwrap();
    fs::write(temp.path().join("Ashen_Crown_lore_state.json"), "{ not json").unwrap();

    let output = run_lorewright(&["generate", "Ashen Crown"], temp.path());
    assert_eq!(output.status.code(), Some(4));
}

#[test]
fn test_stop_after_must_be_generative() {
    let temp = TempDir::new().unwrap();
    let output = run_lorewright(
        &["generate", "Ashen Crown", "--stop-after", "complete"],
        temp.path(),
    );
    assert_eq!(output.status.code(), Some(2));
}

#[test]
fn test_seeds_preview_uses_data_dir() {
    let temp = TempDir::new().unwrap();
    let pools = temp.path().join("data/name_pools");
    fs::create_dir_all(&pools).unwrap();
    fs::write(
        pools.join("norse.json"),
        r#"{"male": ["Hakon", "Oren"], "female": ["Sigrun"], "places": ["Frostmere"]}"#,
    )
    .unwrap();
    fs::write(
        temp.path().join("data/banned_lore_words.txt"),
        "# cliches\nchosen one\nancient evil\n",
    )
    .unwrap();

    let output = run_lorewright(&["seeds", "--seed", "42"], temp.path());
    assert!(output.status.success());

    let text = stdout(&output);
    assert!(text.contains("=== GENERATION SEEDS ==="));
    assert!(text.contains("norse"));
    assert!(text.contains("BANNED WORDS/PHRASES"));
    assert!(text.contains("chosen one"));

    let again = run_lorewright(&["seeds", "--seed", "42"], temp.path());
    assert_eq!(stdout(&again), text);
}

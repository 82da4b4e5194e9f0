//! CLI Integration Tests for rag-search
//!
//! Runs the built binary against temporary working directories. None of
//! these tests load an embedding model or call an LLM.

use std::fs;
use std::process::Command;
use tempfile::TempDir;

/// Helper to run rag-search with arguments
fn run_rag_search(args: &[&str], working_dir: &std::path::Path) -> std::process::Output {
    Command::new(env!("CARGO_BIN_EXE_rag-search"))
        .args(args)
        .current_dir(working_dir)
        .env_remove("RUST_LOG")
        .env_remove("GROQ_API")
        .output()
        .expect("Failed to execute command")
}

// =============================================================================
// Help and Version Tests
// =============================================================================

#[test]
fn test_help_command() {
    let dir = TempDir::new().unwrap();
    let output = run_rag_search(&["--help"], dir.path());

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("Usage"));
    for command in ["build", "query", "ask", "status", "config"] {
        assert!(stdout.contains(command), "missing {}", command);
    }
}

#[test]
fn test_version_command() {
    let dir = TempDir::new().unwrap();
    let output = run_rag_search(&["--version"], dir.path());

    assert!(output.status.success());
    assert!(String::from_utf8_lossy(&output.stdout).contains("rag-search"));
}

// =============================================================================
// Config Tests
// =============================================================================

#[test]
fn test_config_without_file_uses_defaults() {
    let dir = TempDir::new().unwrap();
    let output = run_rag_search(&["config", "--no-color"], dir.path());

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("not found, using defaults"));
    assert!(stdout.contains("500 chars, 100 overlap"));
    assert!(stdout.contains("sentence-transformers/all-MiniLM-L6-v2"));
}

#[test]
fn test_config_validate_reports_missing_key() {
    let dir = TempDir::new().unwrap();
    let output = run_rag_search(&["config", "--validate", "--no-color"], dir.path());

    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("GROQ_API"));
}

#[test]
fn test_invalid_config_file_fails() {
    let dir = TempDir::new().unwrap();
    fs::write(
        dir.path().join("ragsearch.toml"),
        "[store]\nchunk_size = 10\nchunk_overlap = 20\n",
    )
    .unwrap();

    let output = run_rag_search(&["config"], dir.path());
    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("chunk_overlap"));
}

#[test]
fn test_custom_config_path() {
    let dir = TempDir::new().unwrap();
    fs::write(
        dir.path().join("custom.toml"),
        "data_dir = \"corpus\"\n[retrieval]\ntop_k = 7\n",
    )
    .unwrap();

    let output = run_rag_search(&["--config", "custom.toml", "config", "--no-color"], dir.path());
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("corpus"));
    assert!(stdout.contains("Top k: 7"));
}

// =============================================================================
// Store Tests
// =============================================================================

#[test]
fn test_status_without_store() {
    let dir = TempDir::new().unwrap();
    let output = run_rag_search(&["status", "--no-color"], dir.path());

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("No persisted store"));
    assert!(stdout.contains("rag-search build"));
}

#[test]
fn test_build_with_missing_data_dir_fails() {
    let dir = TempDir::new().unwrap();
    let output = run_rag_search(&["build", "--data", "absent", "--no-color"], dir.path());

    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("[ERROR] Error:"));
    assert!(stderr.contains("absent"));
}

//! Command-line behavior of the `kosum` binary.

use std::process::{Command, Output};
use tempfile::TempDir;

/// Run the binary with an isolated config directory.
fn kosum(args: &[&str], config_home: &TempDir) -> Output {
    Command::new(env!("CARGO_BIN_EXE_kosum"))
        .args(args)
        .env("XDG_CONFIG_HOME", config_home.path())
        .env_remove("KOSUM_REMOTE_ENDPOINT")
        .env_remove("KOSUM_LOCAL_ENDPOINT")
        .env_remove("KOSUM_DEVICE")
        .output()
        .expect("failed to run kosum")
}

#[test]
fn test_no_arguments_is_a_usage_error() {
    let home = TempDir::new().unwrap();
    let output = kosum(&[], &home);

    assert_eq!(output.status.code(), Some(1));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("Usage"), "stderr: {stderr}");
}

#[test]
fn test_help_exits_cleanly() {
    let home = TempDir::new().unwrap();
    let output = kosum(&["--help"], &home);

    assert_eq!(output.status.code(), Some(0));
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("AUDIO_PATH"));
    assert!(stdout.contains("SUMMARY_OUT_PATH"));
}

#[test]
fn test_missing_audio_file_fails() {
    let home = TempDir::new().unwrap();
    let work = TempDir::new().unwrap();
    let audio = work.path().join("nope.wav");
    let out = work.path().join("nope.wav.out");

    let output = kosum(
        &[
            "--no-progress",
            audio.to_str().unwrap(),
            out.to_str().unwrap(),
        ],
        &home,
    );

    assert_eq!(output.status.code(), Some(1));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("File not found"), "stderr: {stderr}");
    assert!(!out.exists());
}

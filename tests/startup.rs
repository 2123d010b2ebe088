//! Runs the built binary to check startup validation.

use std::process::Command;

#[test]
fn missing_ingest_config_exits_with_code_2() {
    // an empty working directory keeps any developer .env out of the run
    let dir = tempfile::tempdir().unwrap();

    let output = Command::new(env!("CARGO_BIN_EXE_listing_ingest"))
        .current_dir(dir.path())
        .env_remove("ANVIL_INGEST_URL")
        .env_remove("ANVIL_PRESETS_URL")
        .env("INGEST_SECRET", "s3cret")
        .output()
        .unwrap();

    assert_eq!(output.status.code(), Some(2));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("ANVIL_INGEST_URL"), "stderr: {stderr}");
    assert!(output.stdout.is_empty());
}

#[test]
fn missing_secret_exits_with_code_2() {
    let dir = tempfile::tempdir().unwrap();

    let output = Command::new(env!("CARGO_BIN_EXE_listing_ingest"))
        .current_dir(dir.path())
        .env("ANVIL_INGEST_URL", "http://127.0.0.1:9/ingest")
        .env_remove("INGEST_SECRET")
        .output()
        .unwrap();

    assert_eq!(output.status.code(), Some(2));
}

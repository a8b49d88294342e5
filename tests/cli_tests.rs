//! Command-line interface tests

use assert_cmd::Command;
use predicates::prelude::*;
use std::io::Write;

fn segedit() -> Command {
    let mut cmd = Command::cargo_bin("segedit").unwrap();
    cmd.env_remove("RUST_LOG");
    cmd
}

#[test]
fn test_cuts_without_cuts_exports_whole_duration() {
    segedit()
        .args(["cuts", "--duration", "120"])
        .assert()
        .success()
        .stdout(predicate::str::contains(
            r#"{"ranges":[{"start":0.0,"end":120.0}],"thumbnail":null}"#,
        ));
}

#[test]
fn test_cuts_keep_insertion_order() {
    segedit()
        .args(["cuts", "--duration", "2:00", "--cut", "1:00-1:30", "--cut", "10-25"])
        .assert()
        .success()
        .stdout(predicate::str::contains(
            r#"[{"start":60.0,"end":90.0},{"start":10.0,"end":25.0}]"#,
        ));
}

#[test]
fn test_cut_past_duration_fails() {
    segedit()
        .args(["cuts", "--duration", "60", "--cut", "50-75"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("exceeds media duration"));
}

#[test]
fn test_backwards_cut_fails() {
    segedit()
        .args(["cuts", "--duration", "60", "--cut", "30-10"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("must be after start"));
}

#[test]
fn test_cuts_requires_duration_or_input() {
    segedit()
        .args(["cuts", "--cut", "1-2"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("--duration or --input"));
}

#[test]
fn test_thumbnail_requires_input() {
    segedit()
        .args(["cuts", "--duration", "60", "--thumbnail-at", "5"])
        .assert()
        .failure();
}

#[test]
fn test_invalid_log_level_is_rejected() {
    segedit()
        .args(["--log-level", "loud", "cuts", "--duration", "10"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("unknown log level"));
}

#[test]
fn test_config_file_is_validated() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    writeln!(file, "[thumbnail]\nquality = 2.0").unwrap();

    segedit()
        .arg("--config")
        .arg(file.path())
        .args(["cuts", "--duration", "10"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("thumbnail.quality"));
}

#[test]
fn test_trim_missing_input_fails() {
    segedit()
        .args([
            "trim",
            "--input",
            "/nonexistent/lesson.mp4",
            "--start",
            "1",
            "--end",
            "2",
        ])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Input file does not exist"));
}

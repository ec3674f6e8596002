//! CLI smoke tests.

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

fn normkit() -> Command {
    Command::cargo_bin("normkit").unwrap()
}

#[test]
fn help_lists_stages() {
    normkit()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("textgrids"))
        .stdout(predicate::str::contains("extract"))
        .stdout(predicate::str::contains("select"))
        .stdout(predicate::str::contains("profile"))
        .stdout(predicate::str::contains("subset"));
}

#[test]
fn version_flag() {
    normkit()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("normkit"));
}

#[test]
fn extract_requires_speaker() {
    normkit().arg("extract").assert().failure();
}

#[test]
fn invalid_config_is_rejected() {
    let dir = TempDir::new().unwrap();
    let config = dir.path().join("normkit.toml");
    std::fs::write(&config, "[normalize]\npeak = 2.0\n").unwrap();

    normkit()
        .args(["extract", "-s", "S1"])
        .arg("--config")
        .arg(&config)
        .assert()
        .failure()
        .stderr(predicate::str::contains("Peak target"));
}

#[test]
fn extract_refuses_existing_output() {
    let root = TempDir::new().unwrap();
    let speaker = root.path().join("S1");
    for sub in [
        "1_audio/2_processed",
        "1_audio/3_extracted",
        "2_textgrid/2_manual",
    ] {
        std::fs::create_dir_all(speaker.join(sub)).unwrap();
    }
    let config = root.path().join("normkit.toml");
    std::fs::write(
        &config,
        format!(
            "[project]\nrecordings_root = \"{}\"\n",
            root.path().display()
        ),
    )
    .unwrap();

    normkit()
        .args(["extract", "-s", "S1"])
        .arg("--config")
        .arg(&config)
        .assert()
        .failure()
        .stderr(predicate::str::contains("--overwrite"));
}

#[test]
fn profile_without_stage_flags_hints() {
    let root = TempDir::new().unwrap();
    let config = root.path().join("normkit.toml");
    std::fs::write(
        &config,
        format!(
            "[project]\nrecordings_root = \"{}\"\n",
            root.path().display()
        ),
    )
    .unwrap();

    normkit()
        .args(["profile", "-s", "S1"])
        .arg("--config")
        .arg(&config)
        .assert()
        .success()
        .stdout(predicate::str::contains("--alignment"));
}

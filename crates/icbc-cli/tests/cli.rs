use std::path::Path;

use assert_cmd::Command;
use predicates::prelude::*;

fn icbc(config: &Path) -> Command {
    let mut cmd = Command::cargo_bin("icbc").unwrap();
    cmd.arg("--config").arg(config);
    cmd
}

fn init_config(config: &Path) {
    icbc(config).args(["config", "init"]).assert().success();
}

#[test]
fn test_help_lists_commands() {
    Command::cargo_bin("icbc")
        .unwrap()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("file"))
        .stdout(predicate::str::contains("stamp"))
        .stdout(predicate::str::contains("archive"));
}

#[test]
fn test_config_init_get_set() {
    let dir = tempfile::tempdir().unwrap();
    let config = dir.path().join("icbc").join("config.json");

    icbc(&config)
        .args(["config", "path"])
        .assert()
        .success()
        .stdout(predicate::str::contains("not created"));

    init_config(&config);
    assert!(config.is_file());

    icbc(&config)
        .args(["config", "init"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("--force"));

    icbc(&config)
        .args(["config", "get", "filing.min_age_to_archive_years"])
        .assert()
        .success()
        .stdout(predicate::str::diff("1\n"));

    icbc(&config)
        .args(["config", "set", "producer_mapping.jd", "Jane Doe"])
        .assert()
        .success();

    icbc(&config)
        .args(["config", "get", "producer_mapping.JD"])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"Jane Doe\""));
}

#[test]
fn test_file_requires_existing_input() {
    let dir = tempfile::tempdir().unwrap();
    let config = dir.path().join("config.json");
    init_config(&config);

    icbc(&config)
        .args(["file", "--input"])
        .arg(dir.path().join("missing"))
        .arg("--output")
        .arg(dir.path().join("Filed"))
        .assert()
        .failure()
        .stderr(predicate::str::contains("does not exist"));
}

#[test]
fn test_file_refuses_output_without_parent() {
    let dir = tempfile::tempdir().unwrap();
    let config = dir.path().join("config.json");
    init_config(&config);

    icbc(&config)
        .args(["file", "--input"])
        .arg(dir.path())
        .arg("--output")
        .arg(dir.path().join("no/such/Filed"))
        .assert()
        .failure()
        .stderr(predicate::str::contains("Cannot create output folder"));
}

#[test]
fn test_scan_empty_folder_as_json() {
    let dir = tempfile::tempdir().unwrap();
    let config = dir.path().join("config.json");
    init_config(&config);
    let input = dir.path().join("Downloads");
    std::fs::create_dir(&input).unwrap();

    icbc(&config)
        .args(["scan", "--format", "json", "--input"])
        .arg(&input)
        .assert()
        .success()
        .stdout(predicate::str::contains("\"classified\": []"));
}

#[test]
fn test_archive_with_nothing_old() {
    let dir = tempfile::tempdir().unwrap();
    let config = dir.path().join("config.json");
    init_config(&config);
    let output = dir.path().join("Filed");
    std::fs::create_dir(&output).unwrap();
    std::fs::write(output.join("ABC123.pdf"), b"fresh").unwrap();

    icbc(&config)
        .args(["archive", "--output"])
        .arg(&output)
        .assert()
        .success()
        .stdout(predicate::str::contains("Nothing old enough"));
    assert!(output.join("ABC123.pdf").is_file());
}

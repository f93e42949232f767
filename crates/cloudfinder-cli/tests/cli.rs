use assert_cmd::Command;
use predicates::prelude::*;
use std::path::Path;
use tempfile::TempDir;

use cloudfinder::build::{build_from_candidates, BuildOptions};
use cloudfinder::{NetworkBlock, Provider};

/// Data directory compiled from a small fixed candidate list
fn data_dir() -> TempDir {
    let dir = tempfile::tempdir().unwrap();
    let candidates = [
        ("8.8.4.0/24", Provider::Gcp),
        ("8.0.0.0/8", Provider::Aws),
        ("104.16.0.0/13", Provider::Cloudflare),
        ("2400:cb00::/32", Provider::Cloudflare),
    ]
    .into_iter()
    .map(|(cidr, provider)| NetworkBlock::parse(cidr, provider).unwrap())
    .collect();
    build_from_candidates(candidates, &BuildOptions::new(dir.path())).unwrap();
    dir
}

fn cloudfinder(config_dir: &Path) -> Command {
    let mut cmd = Command::cargo_bin("cloudfinder").unwrap();
    cmd.env("CLOUDFINDER_CONFIG", config_dir.join("config.toml"))
        .env_remove("CLOUDFINDER_DATA_DIR")
        .env("LOG_LEVEL", "warn");
    cmd
}

#[test]
fn test_help_lists_commands() {
    let config = tempfile::tempdir().unwrap();
    cloudfinder(config.path())
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("build"))
        .stdout(predicate::str::contains("classify"));
}

#[test]
fn test_classify_raw() {
    let data = data_dir();
    let config = tempfile::tempdir().unwrap();
    cloudfinder(config.path())
        .args(["classify", "-o", "raw", "--data-dir"])
        .arg(data.path())
        .args(["8.8.4.5", "104.17.1.1", "203.0.113.1", "2400:cb00::1", "::ffff:8.1.1.1"])
        .assert()
        .success()
        .stdout("Aws\nCloudflare\nUnknown\nCloudflare\nAws\n");
}

#[test]
fn test_classify_json_from_stdin() {
    let data = data_dir();
    let config = tempfile::tempdir().unwrap();
    cloudfinder(config.path())
        .args(["classify", "--output", "json", "--data-dir"])
        .arg(data.path())
        .write_stdin("8.8.4.5\n\nhttps://104.16.0.1/path\n")
        .assert()
        .success()
        .stdout(predicate::str::contains(
            r#"{"input":"8.8.4.5","ip":"8.8.4.5","provider":"Aws"}"#,
        ))
        .stdout(predicate::str::contains(
            r#"{"input":"https://104.16.0.1/path","ip":"104.16.0.1","provider":"Cloudflare"}"#,
        ));
}

#[test]
fn test_classify_hostname() {
    let data = data_dir();
    let config = tempfile::tempdir().unwrap();
    cloudfinder(config.path())
        .args(["classify", "-o", "json", "--data-dir"])
        .arg(data.path())
        .arg("localhost")
        .assert()
        .success()
        .stdout(predicate::str::contains(r#""input":"localhost""#))
        .stdout(predicate::str::contains(r#""provider":"Unknown""#));
}

#[test]
fn test_classify_continues_after_bad_input() {
    let data = data_dir();
    let config = tempfile::tempdir().unwrap();
    cloudfinder(config.path())
        .args(["classify", "-o", "raw", "--data-dir"])
        .arg(data.path())
        .args(["not a host", "8.8.8.8"])
        .assert()
        .failure()
        .stdout("Aws\n")
        .stderr(predicate::str::contains("not a host"));
}

#[test]
fn test_classify_without_data_fails() {
    let empty = tempfile::tempdir().unwrap();
    let config = tempfile::tempdir().unwrap();
    cloudfinder(config.path())
        .args(["classify", "--data-dir"])
        .arg(empty.path())
        .arg("8.8.8.8")
        .assert()
        .failure()
        .stderr(predicate::str::contains("cloudfinder build"));
}

#[test]
fn test_data_dir_from_config() {
    let data = data_dir();
    let config = tempfile::tempdir().unwrap();
    cloudfinder(config.path())
        .args(["config", "set", "data_dir"])
        .arg(data.path())
        .assert()
        .success();
    cloudfinder(config.path())
        .args(["config", "set", "output_format", "raw"])
        .assert()
        .success();

    cloudfinder(config.path())
        .args(["classify", "8.8.4.5"])
        .assert()
        .success()
        .stdout("Aws\n");

    cloudfinder(config.path())
        .args(["config", "show", "-o", "json"])
        .assert()
        .success()
        .stdout(predicate::str::contains(r#""output_format": "raw""#));
}

#[test]
fn test_config_rejects_unknown_key() {
    let config = tempfile::tempdir().unwrap();
    cloudfinder(config.path())
        .args(["config", "set", "api_key", "x"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Unknown config key"));
}

// smartsh/tests/cli_integration_tests.rs
use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::tempdir;

fn smartsh() -> Command {
    Command::cargo_bin("smartsh").expect("binary builds")
}

#[test]
fn no_arguments_prints_help() {
    smartsh()
        .assert()
        .failure()
        .stderr(predicate::str::contains("Usage"));
}

#[test]
fn help_lists_the_commands() {
    smartsh()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("proxy"))
        .stdout(predicate::str::contains("suggest"))
        .stdout(predicate::str::contains("config"));
}

#[test]
fn config_path_honors_the_override() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("config.json");
    smartsh()
        .args(["--config", path.to_str().unwrap(), "config", "path"])
        .assert()
        .success()
        .stdout(predicate::str::contains("config.json"));
}

#[test]
fn config_init_writes_a_file_and_refuses_to_clobber() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("config.json");

    smartsh()
        .args(["--config", path.to_str().unwrap(), "config", "init"])
        .assert()
        .success();
    assert!(path.exists());

    smartsh()
        .args(["--config", path.to_str().unwrap(), "config", "init"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("already exists"));

    smartsh()
        .args(["--config", path.to_str().unwrap(), "config", "init", "--force"])
        .assert()
        .success();
}

#[test]
fn config_show_masks_api_keys() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("config.json");
    std::fs::write(
        &path,
        r#"{ "openai": { "api_key": "sk-very-secret-value" } }"#,
    )
    .unwrap();

    smartsh()
        .args(["--config", path.to_str().unwrap(), "config", "show"])
        .assert()
        .success()
        .stdout(predicate::str::contains("[REDACTED]"))
        .stdout(predicate::str::contains("sk-very-secret-value").not());
}

#[test]
fn suggest_requires_a_configured_api_key() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("config.json");

    smartsh()
        .args(["--config", path.to_str().unwrap(), "suggest"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("API key"));
}

#[test]
fn suggest_rejects_an_unknown_provider() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("config.json");

    smartsh()
        .args([
            "--config",
            path.to_str().unwrap(),
            "suggest",
            "--provider",
            "skynet",
        ])
        .assert()
        .failure()
        .stderr(predicate::str::contains("unsupported provider"));
}

#[test]
fn proxy_refuses_to_run_without_a_terminal() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("config.json");

    // Under the test harness stdin/stdout are pipes, which the proxy
    // must decline rather than record.
    smartsh()
        .args(["--config", path.to_str().unwrap(), "proxy"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("interactive terminal"));
}

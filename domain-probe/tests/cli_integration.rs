// domain-probe/tests/cli_integration.rs

use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use std::net::TcpListener;
use std::path::Path;
use tempfile::TempDir;

/// Temp working directory with `domains/list.txt` holding the given lines.
fn workspace_with_domains(domains: &[&str]) -> TempDir {
    let dir = TempDir::new().expect("Failed to create temp dir");
    fs::create_dir(dir.path().join("domains")).expect("Failed to create domains dir");
    let mut content = domains.join("\n");
    content.push('\n');
    fs::write(dir.path().join("domains").join("list.txt"), content)
        .expect("Failed to write domain list");
    dir
}

/// Command running inside `dir`, isolated from the user's config and env.
fn probe_cmd(dir: &Path) -> Command {
    let mut cmd = Command::cargo_bin("domain-probe").unwrap();
    cmd.current_dir(dir)
        .env("HOME", dir)
        .env_remove("XDG_CONFIG_HOME")
        .env_remove("RUST_LOG")
        .env_remove("DP_THREADS")
        .env_remove("DP_TIMEOUT")
        .env_remove("DP_PORT")
        .env_remove("DP_MODE")
        .env_remove("DP_RESCAN_INTERVAL")
        .env_remove("DP_INPUT_DIR")
        .env_remove("DP_CONFIG")
        .timeout(std::time::Duration::from_secs(30));
    cmd
}

fn read(path: impl AsRef<Path>) -> String {
    fs::read_to_string(path).unwrap_or_default()
}

#[test]
fn test_help_shows_flags() {
    let mut cmd = Command::cargo_bin("domain-probe").unwrap();
    cmd.arg("--help");

    cmd.assert()
        .success()
        .stdout(predicate::str::contains("--threads"))
        .stdout(predicate::str::contains("--once"))
        .stdout(predicate::str::contains("--watch"))
        .stdout(predicate::str::contains("--timeout"))
        .stdout(predicate::str::contains("--config"));
}

#[test]
fn test_once_run_sorts_domains() {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let port = listener.local_addr().unwrap().port().to_string();
    let dir = workspace_with_domains(&["127.0.0.1", "no-such-host.invalid"]);

    probe_cmd(dir.path())
        .args([
            "--once",
            "--threads",
            "2",
            "--port",
            &port,
            "--timeout",
            "2s",
            "--no-status",
        ])
        .assert()
        .success()
        .stdout(predicate::str::contains("1 valid"))
        .stdout(predicate::str::contains("1 invalid"));

    assert_eq!(read(dir.path().join("valid/valid.txt")), "127.0.0.1\n");
    assert_eq!(
        read(dir.path().join("invalid/invalid.txt")),
        "no-such-host.invalid\n"
    );
    assert_eq!(read(dir.path().join("domains/list.txt")), "");

    let log = read(dir.path().join("logs/logs.txt"));
    assert!(log.contains("probe finished"));
    assert!(log.contains("no-such-host.invalid"));
}

#[test]
fn test_json_summary() {
    let dir = workspace_with_domains(&["no-such-host.invalid", "also-missing.invalid"]);

    probe_cmd(dir.path())
        .args(["--once", "--json", "--timeout", "2s"])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"processed\": 2"))
        .stdout(predicate::str::contains("\"invalid\": 2"))
        .stdout(predicate::str::contains("\"valid\": 0"));
}

#[test]
fn test_threads_below_one_are_clamped() {
    for threads in ["0", "-4"] {
        let dir = workspace_with_domains(&["no-such-host.invalid"]);

        probe_cmd(dir.path())
            .args(["--once", "--no-status", "--timeout", "1s", "--threads", threads])
            .assert()
            .success();

        assert_eq!(
            read(dir.path().join("invalid/invalid.txt")),
            "no-such-host.invalid\n"
        );
        assert!(read(dir.path().join("logs/logs.txt")).contains("out of range"));
    }
}

#[test]
fn test_once_and_watch_are_exclusive() {
    let dir = TempDir::new().unwrap();

    probe_cmd(dir.path())
        .args(["--once", "--watch"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("cannot be used with"));
}

#[test]
fn test_missing_input_dir_is_fatal() {
    let dir = TempDir::new().unwrap();

    probe_cmd(dir.path())
        .args(["--once", "--no-status"])
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains("Error:"));

    // Output locations are bootstrapped before the input is read
    assert!(dir.path().join("valid").is_dir());
    assert!(dir.path().join("invalid").is_dir());
    assert!(dir.path().join("logs").is_dir());
}

#[test]
fn test_watch_mode_stops_when_input_dir_has_no_files() {
    let dir = TempDir::new().unwrap();
    fs::create_dir(dir.path().join("domains")).unwrap();

    probe_cmd(dir.path())
        .args(["--no-status", "--rescan-interval", "100ms"])
        .assert()
        .success()
        .stdout(predicate::str::contains("0 domains"));
}

#[test]
fn test_local_config_file_is_discovered() {
    let dir = TempDir::new().unwrap();
    fs::create_dir(dir.path().join("lists")).unwrap();
    fs::write(dir.path().join("lists").join("a.txt"), "no-such-host.invalid\n").unwrap();
    fs::write(
        dir.path().join("domain-probe.toml"),
        r#"
[defaults]
mode = "once"
timeout = "1s"

[paths]
input_dir = "lists"
invalid_file = "out/dead.txt"
"#,
    )
    .unwrap();

    probe_cmd(dir.path()).arg("--no-status").assert().success();

    assert_eq!(
        read(dir.path().join("out/dead.txt")),
        "no-such-host.invalid\n"
    );
    assert_eq!(read(dir.path().join("lists/a.txt")), "");
}

#[test]
fn test_env_overrides_config_file_and_cli_overrides_env() {
    let dir = workspace_with_domains(&["no-such-host.invalid"]);
    fs::write(
        dir.path().join("domain-probe.toml"),
        "[defaults]\nmode = \"watch\"\n\n[paths]\ninput_dir = \"nowhere\"\n",
    )
    .unwrap();

    // DP_INPUT_DIR beats the file, --once beats DP_MODE
    probe_cmd(dir.path())
        .env("DP_INPUT_DIR", "domains")
        .env("DP_MODE", "watch")
        .env("DP_TIMEOUT", "1s")
        .args(["--once", "--no-status"])
        .assert()
        .success();

    assert_eq!(
        read(dir.path().join("invalid/invalid.txt")),
        "no-such-host.invalid\n"
    );
}

#[test]
fn test_broken_config_file_is_reported() {
    let dir = TempDir::new().unwrap();
    let config = dir.path().join("broken.toml");
    fs::write(&config, "[defaults]\nthreads = \"many\"\n").unwrap();

    probe_cmd(dir.path())
        .args(["--once", "--config"])
        .arg(&config)
        .assert()
        .failure()
        .stderr(predicate::str::contains("Failed to load config file"));
}

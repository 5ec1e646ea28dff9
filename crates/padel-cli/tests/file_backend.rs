//! CLI integration tests against a local file store.

mod common;

use std::io::Read;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Duration;

use tempfile::TempDir;

use common::{
    cli_in_home, file_backend_url, json_lines, run_cli_with_env, run_cli_with_env_success,
};

struct Fixture {
    _dir: TempDir,
    home: PathBuf,
    url: String,
}

fn fixture() -> Fixture {
    let dir = TempDir::new().unwrap();
    let store = dir.path().join("store");
    let home = dir.path().join("home");
    std::fs::create_dir_all(&store).unwrap();
    std::fs::create_dir_all(&home).unwrap();
    let url = file_backend_url(&store);
    Fixture {
        _dir: dir,
        home,
        url,
    }
}

fn seed_users(f: &Fixture, count: usize) {
    for i in 0..count {
        let id = format!("_id=u{:03}", i);
        let nickname = format!("nickname=player{}", i);
        run_cli_with_env_success(
            &["put", "user", "--set", &id, "--set", &nickname, "--set", "role=r1"],
            &f.home,
            &f.url,
        );
    }
}

fn config_file(home: &Path) -> PathBuf {
    home.join("data").join("padel").join("config.json")
}

#[test]
fn test_configure_saves_private_config() {
    let f = fixture();

    let output = cli_in_home(
        &[
            "configure",
            "--backend",
            &f.url,
            "--page-size",
            "10",
            "--push-policy",
            "isolated",
            "--apply-order",
            "sequenced",
        ],
        &f.home,
    )
    .output()
    .unwrap();
    assert!(
        output.status.success(),
        "configure failed: {}",
        String::from_utf8_lossy(&output.stderr)
    );
    assert!(String::from_utf8_lossy(&output.stdout).contains("Configuration saved"));

    let path = config_file(&f.home);
    let saved: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
    assert_eq!(saved["backend"], f.url.as_str());
    assert_eq!(saved["page_size"], 10);
    assert_eq!(saved["push_policy"], "isolated");
    assert_eq!(saved["apply_order"], "sequenced");

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        let mode = std::fs::metadata(&path).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o600);
    }

    // Later commands pick the backend up from the saved file.
    let output = cli_in_home(&["list", "user"], &f.home).output().unwrap();
    assert!(output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("Showing 0 of 0"));
}

#[test]
fn test_missing_backend_fails() {
    let f = fixture();
    let output = cli_in_home(&["list", "user"], &f.home).output().unwrap();
    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("padel configure"));
}

#[test]
fn test_put_then_get() {
    let f = fixture();

    let stdout = run_cli_with_env_success(
        &["put", "sale", "--set", "total=150", "--set", "estado=PENDIENTE"],
        &f.home,
        &f.url,
    );
    let created = &json_lines(&stdout)[0];
    let id = created["_id"].as_str().unwrap().to_string();
    assert_eq!(id.len(), 24);

    run_cli_with_env_success(
        &["put", "sale", "--id", &id, "--set", "estado=CANCELADA"],
        &f.home,
        &f.url,
    );

    let stdout = run_cli_with_env_success(&["get", "sale", &id, "--compact"], &f.home, &f.url);
    let fetched = &json_lines(&stdout)[0];
    assert_eq!(fetched["total"], 150);
    assert_eq!(fetched["estado"], "CANCELADA");
}

#[test]
fn test_get_missing_record_fails() {
    let f = fixture();
    let output = run_cli_with_env(&["get", "sale", "nope"], &f.home, &f.url);
    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("Server error"));
}

#[test]
fn test_list_pages() {
    let f = fixture();
    seed_users(&f, 12);

    let output = run_cli_with_env(&["list", "user", "--page-size", "5"], &f.home, &f.url);
    assert!(output.status.success());
    let records = json_lines(&String::from_utf8_lossy(&output.stdout));
    assert_eq!(records.len(), 5);
    assert_eq!(records[0]["_id"], "u000");
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("Showing 5 of 12 user records"));
    assert!(stderr.contains("More available"));

    let stdout = run_cli_with_env_success(
        &["list", "user", "--page-size", "5", "--pages", "2"],
        &f.home,
        &f.url,
    );
    assert_eq!(json_lines(&stdout).len(), 10);

    let stdout = run_cli_with_env_success(
        &["list", "user", "--page-size", "5", "--all"],
        &f.home,
        &f.url,
    );
    let records = json_lines(&stdout);
    assert_eq!(records.len(), 12);
    assert_eq!(records[11]["_id"], "u011");
}

#[test]
fn test_search() {
    let f = fixture();
    seed_users(&f, 12);

    let output = run_cli_with_env(&["search", "user", "PLAYER1"], &f.home, &f.url);
    assert!(output.status.success());
    let ids: Vec<_> = json_lines(&String::from_utf8_lossy(&output.stdout))
        .iter()
        .map(|r| r["_id"].as_str().unwrap().to_string())
        .collect();
    assert_eq!(ids, vec!["u001", "u010", "u011"]);
    assert!(String::from_utf8_lossy(&output.stderr).contains("3 results for 'PLAYER1'"));
}

#[test]
fn test_options() {
    let f = fixture();
    for (id, name) in [("r1", "Admin"), ("r2", "Staff")] {
        let id = format!("_id={}", id);
        let name = format!("name={}", name);
        run_cli_with_env_success(&["put", "role", "--set", &id, "--set", &name], &f.home, &f.url);
    }

    let stdout = run_cli_with_env_success(&["options", "role"], &f.home, &f.url);
    assert_eq!(stdout, "r1\tAdmin\nr2\tStaff\n");
}

#[test]
fn test_watch_prints_live_changes() {
    let f = fixture();
    run_cli_with_env_success(&["put", "sale", "--set", "_id=a1", "--set", "total=1"], &f.home, &f.url);

    let mut watcher = cli_in_home(&["watch", "sale", "--json", "--for", "4"], &f.home)
        .env("PADEL_BACKEND", &f.url)
        .stdout(Stdio::piped())
        .stderr(Stdio::null())
        .spawn()
        .unwrap();

    std::thread::sleep(Duration::from_millis(1500));
    run_cli_with_env_success(&["put", "sale", "--id", "a1", "--set", "total=150"], &f.home, &f.url);
    run_cli_with_env_success(&["put", "sale", "--set", "_id=a2", "--set", "total=5"], &f.home, &f.url);

    let status = watcher.wait().unwrap();
    assert!(status.success());

    let mut stdout = String::new();
    watcher.stdout.take().unwrap().read_to_string(&mut stdout).unwrap();
    let changes = json_lines(&stdout);

    assert!(
        changes.iter().any(|r| r["_id"] == "a1" && r["total"] == 150),
        "update missing from {:?}",
        changes
    );
    assert!(
        changes.iter().any(|r| r["_id"] == "a2"),
        "insert missing from {:?}",
        changes
    );
}

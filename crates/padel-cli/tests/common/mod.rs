#![allow(dead_code)]

use std::path::Path;
use std::process::{Command, Output};

use url::Url;

/// `file://` URL for a local store directory.
pub fn file_backend_url(path: &Path) -> String {
    Url::from_directory_path(path)
        .expect("Failed to convert path to file URL")
        .to_string()
}

/// Command for the CLI binary with an isolated HOME, so saved configuration
/// never leaks between tests.
pub fn cli_in_home(args: &[&str], home: &Path) -> Command {
    let mut cmd = Command::new(env!("CARGO_BIN_EXE_padel"));
    cmd.args(args);
    cmd.env("HOME", home);
    cmd.env("XDG_DATA_HOME", home.join("data"));
    cmd.env_remove("PADEL_BACKEND");
    cmd.env_remove("PADEL_TOKEN");
    cmd
}

/// Run the CLI with an isolated HOME and the backend set via environment.
pub fn run_cli_with_env(args: &[&str], home: &Path, backend_url: &str) -> Output {
    let mut cmd = cli_in_home(args, home);
    if !args.contains(&"--backend") {
        cmd.env("PADEL_BACKEND", backend_url);
    }
    cmd.output().expect("Failed to execute CLI")
}

/// Run the CLI with an isolated HOME and expect success.
pub fn run_cli_with_env_success(args: &[&str], home: &Path, backend_url: &str) -> String {
    let output = run_cli_with_env(args, home, backend_url);
    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        panic!("CLI command failed: {:?}\nstderr: {}", args, stderr);
    }
    String::from_utf8_lossy(&output.stdout).to_string()
}

/// Parse one JSON document per line.
pub fn json_lines(stdout: &str) -> Vec<serde_json::Value> {
    stdout
        .lines()
        .filter(|l| !l.trim().is_empty())
        .map(|l| serde_json::from_str(l).expect("stdout line is not JSON"))
        .collect()
}

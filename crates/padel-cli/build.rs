//! Embeds the version string shown by `padel --version`.
//!
//! Tagged builds report the tag; untagged checkouts report the crate
//! version followed by the abbreviated commit.

use std::process::Command;

fn main() {
    println!("cargo:rerun-if-changed=.git/HEAD");
    println!("cargo:rerun-if-changed=.git/refs/");

    let package = env!("CARGO_PKG_VERSION");
    let version = match describe() {
        Some(described) if described.starts_with(|c: char| c.is_ascii_digit()) => described,
        Some(commit) => format!("{} ({})", package, commit),
        None => package.to_string(),
    };

    println!("cargo:rustc-env=PADEL_VERSION={}", version);
}

/// `git describe` output with any leading `v` removed.
fn describe() -> Option<String> {
    let output = Command::new("git")
        .args(["describe", "--tags", "--always", "--dirty"])
        .output()
        .ok()?;
    if !output.status.success() {
        return None;
    }

    let text = String::from_utf8(output.stdout).ok()?;
    let text = text.trim().trim_start_matches('v');
    (!text.is_empty()).then(|| text.to_string())
}

// SPDX-License-Identifier: GPL-3.0-only

use std::process::Command;

fn main() {
    println!("cargo::rerun-if-changed=.git/HEAD");
    println!("cargo::rerun-if-changed=.git/refs/tags");
    println!("cargo::rerun-if-env-changed=CAPTURE_WIDGET_VERSION");

    // Packagers can pin the version explicitly
    let version = std::env::var("CAPTURE_WIDGET_VERSION")
        .ok()
        .or_else(git_version)
        .unwrap_or_else(|| std::env::var("CARGO_PKG_VERSION").unwrap_or_default());

    println!("cargo::rustc-env=GIT_VERSION={}", version);
}

/// Version from `git describe`, e.g. "0.1.0" on a tag or "0.1.0-3-gabcdef1" after it
fn git_version() -> Option<String> {
    let output = Command::new("git")
        .args(["describe", "--tags", "--always", "--dirty", "--match", "v*"])
        .output()
        .ok()?;

    if !output.status.success() {
        return None;
    }

    let described = String::from_utf8_lossy(&output.stdout).trim().to_string();
    if described.is_empty() {
        return None;
    }

    // A bare commit hash means no release tag exists yet
    if !described.starts_with('v') {
        let pkg = std::env::var("CARGO_PKG_VERSION").unwrap_or_default();
        return Some(format!("{}-{}", pkg, described));
    }

    Some(described.trim_start_matches('v').to_string())
}

// SPDX-License-Identifier: GPL-3.0-only

use std::process::Command;

fn main() {
    // Re-run build script if git HEAD changes
    println!("cargo::rerun-if-changed=.git/HEAD");
    println!("cargo::rerun-if-changed=.git/refs/tags");
    println!("cargo::rerun-if-env-changed=BARCODE_SCANNER_VERSION");

    // Packaged builds (e.g. flatpak) set the version explicitly
    let version = std::env::var("BARCODE_SCANNER_VERSION")
        .ok()
        .or_else(git_version)
        .unwrap_or_else(|| env!("CARGO_PKG_VERSION").to_string());

    println!("cargo::rustc-env=GIT_VERSION={}", version);
}

/// `0.1.0` at a tag, `0.1.0-5-gabcdef1` after it, the short hash without tags
fn git_version() -> Option<String> {
    let output = Command::new("git")
        .args(["describe", "--tags", "--always", "--match", "v*"])
        .output()
        .ok()?;

    if !output.status.success() {
        return None;
    }

    let described = String::from_utf8_lossy(&output.stdout).trim().to_string();
    let version = described.strip_prefix('v').unwrap_or(&described);
    (!version.is_empty()).then(|| version.to_string())
}

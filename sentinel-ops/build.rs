//! Stamps the sentinel-ops binary with the provenance it logs at startup
//!
//! Operators correlate intake and export audit trails with the exact build
//! that wrote them, so the binary carries `GIT_HASH`, `BUILD_TIMESTAMP` and
//! `BUILD_PROFILE` as compile-time environment values.

use std::process::Command;

/// Short commit hash, or "unknown" outside a git checkout
fn commit_hash() -> String {
    Command::new("git")
        .args(["rev-parse", "--short=8", "HEAD"])
        .output()
        .ok()
        .filter(|output| output.status.success())
        .and_then(|output| String::from_utf8(output.stdout).ok())
        .map(|hash| hash.trim().to_string())
        .unwrap_or_else(|| "unknown".to_string())
}

fn main() {
    let built_at = chrono::Utc::now().to_rfc3339_opts(chrono::SecondsFormat::Secs, true);
    let profile = std::env::var("PROFILE").unwrap_or_else(|_| "unknown".to_string());

    println!("cargo:rustc-env=GIT_HASH={}", commit_hash());
    println!("cargo:rustc-env=BUILD_TIMESTAMP={}", built_at);
    println!("cargo:rustc-env=BUILD_PROFILE={}", profile);
}

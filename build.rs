// SPDX-License-Identifier: MPL-2.0

use std::process::Command;

fn main() {
    println!("cargo::rerun-if-changed=.git/HEAD");

    // Packagers can pin the version string
    let version = std::env::var("CODESCAN_VERSION").unwrap_or_else(|_| {
        Command::new("git")
            .args(["describe", "--tags", "--always", "--match", "v*"])
            .output()
            .ok()
            .filter(|output| output.status.success())
            .map(|output| {
                let described = String::from_utf8_lossy(&output.stdout).trim().to_string();
                described
                    .strip_prefix('v')
                    .unwrap_or(&described)
                    .to_string()
            })
            .unwrap_or_else(|| env!("CARGO_PKG_VERSION").to_string())
    });

    println!("cargo::rustc-env=GIT_VERSION={}", version);
}

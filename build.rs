fn main() {
    println!("cargo:rerun-if-env-changed=GHOSTGRID_BUILD");
    println!("cargo:rerun-if-env-changed=GITHUB_SHA");

    let build_id = match std::env::var("GHOSTGRID_BUILD") {
        Ok(v) if !v.trim().is_empty() => v.trim().to_string(),
        _ => target_label(),
    };

    let sha = commit_sha().unwrap_or_default();
    let profile = std::env::var("PROFILE").unwrap_or_else(|_| "unknown".to_string());

    let full = if sha.is_empty() {
        format!("{build_id} ({profile})")
    } else {
        format!("{build_id} ({profile}, {sha})")
    };
    println!("cargo:rustc-env=GHOSTGRID_BUILD={}", full);
}

fn commit_sha() -> Option<String> {
    let from_git = std::process::Command::new("git")
        .args(["rev-parse", "--short=7", "HEAD"])
        .output()
        .ok()
        .filter(|out| out.status.success())
        .and_then(|out| String::from_utf8(out.stdout).ok());

    let raw = from_git.or_else(|| std::env::var("GITHUB_SHA").ok())?;
    let short: String = raw.trim().chars().take(7).collect();
    if !short.is_empty() && short.chars().all(|c| c.is_ascii_hexdigit()) {
        Some(short.to_ascii_lowercase())
    } else {
        None
    }
}

fn target_label() -> String {
    let os = std::env::var("CARGO_CFG_TARGET_OS").unwrap_or_else(|_| "unknown".to_string());
    let arch = std::env::var("CARGO_CFG_TARGET_ARCH").unwrap_or_else(|_| "unknown".to_string());
    let os = if os == "macos" { "darwin".to_string() } else { os };
    format!("{os}-{arch}")
}

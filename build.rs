use std::env;
use std::process::Command;
use time::OffsetDateTime;

/// Short commit hash of HEAD, if this is a git checkout with git on PATH.
fn git_short_hash() -> Option<String> {
    let output = Command::new("git")
        .args(["rev-parse", "--short", "HEAD"])
        .output()
        .ok()?;
    if !output.status.success() {
        return None;
    }
    let hash = String::from_utf8(output.stdout).ok()?;
    let hash = hash.trim();
    (!hash.is_empty()).then(|| hash.to_string())
}

fn main() {
    println!("cargo:rerun-if-env-changed=SOURCE_DATE_EPOCH");
    println!("cargo:rerun-if-changed=.git/HEAD");

    // Reproducible builds pin the timestamp through SOURCE_DATE_EPOCH
    let build_time = env::var("SOURCE_DATE_EPOCH")
        .ok()
        .and_then(|raw| raw.parse::<i64>().ok())
        .and_then(|epoch| OffsetDateTime::from_unix_timestamp(epoch).ok())
        .unwrap_or_else(OffsetDateTime::now_utc);
    println!("cargo:rustc-env=APP_BUILD_YEAR={}", build_time.year());

    let semver = env::var("CARGO_PKG_VERSION").unwrap_or_else(|_| "0.0.0".to_string());
    let display = match env::var("PROFILE").as_deref() {
        Ok("release") => semver.clone(),
        _ => match git_short_hash() {
            Some(hash) => format!("{semver}-dev+{hash}"),
            None => format!("{semver}-dev"),
        },
    };

    println!("cargo:rustc-env=APP_VERSION_DISPLAY={display}");
    println!("cargo:rustc-env=APP_VERSION_SEMVER={semver}");
}

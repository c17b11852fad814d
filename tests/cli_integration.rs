//! CLI integration tests for agfapi.
//!
//! Each test seeds a temporary home directory with a stand-in agfapi binary
//! (a shell script) so nothing is downloaded.

#![cfg(target_os = "linux")]

use std::fs;
use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};
use std::process::Command;

use agfapi::PlatformKey;
use assert_cmd::prelude::*;
use predicates::prelude::*;
use tempfile::TempDir;

const VERSION: &str = "1.2.3";

/// Unreachable release location, so a cache miss fails fast.
const OFFLINE_RELEASES: &str = "http://127.0.0.1:1/releases";

/// Get the agfapi command for a home directory.
fn agfapi(home: &Path) -> Command {
    let mut cmd = Command::cargo_bin("agfapi").unwrap();
    cmd.env("AGFAPI_HOME_DIR", home)
        .env("AGFAPI_VERSION", VERSION)
        .env("AGFAPI_RELEASE_URL", OFFLINE_RELEASES)
        .env_remove("RUST_LOG");
    cmd
}

/// Create a home directory with a cached binary running `body`.
fn seeded_home(body: &str) -> (TempDir, PathBuf) {
    let tmp = TempDir::new().unwrap();
    let binary = install_script(tmp.path(), "v1.2.3", body);
    (tmp, binary)
}

fn install_script(home: &Path, tag: &str, body: &str) -> PathBuf {
    let dir = home.join("bin").join("agfapi").join(tag);
    fs::create_dir_all(&dir).unwrap();

    let name = PlatformKey::detect().unwrap().binary_name();
    let path = dir.join(name);
    fs::write(&path, format!("#!/bin/sh\n{}\n", body)).unwrap();
    fs::set_permissions(&path, fs::Permissions::from_mode(0o755)).unwrap();
    path
}

// ============================================================================
// passthrough
// ============================================================================

#[test]
fn test_passthrough_prints_output() {
    let (home, _) = seeded_home(r#"echo "args: $*""#);

    agfapi(home.path())
        .args(["worklist", "get", "wl-1"])
        .assert()
        .success()
        .stdout("args: worklist get wl-1\n");
}

#[test]
fn test_passthrough_preserves_arguments() {
    let (home, _) = seeded_home(r#"for a in "$@"; do echo "[$a]"; done"#);

    agfapi(home.path())
        .args(["say", "hello world", r#"a "quoted" b"#, "--flag"])
        .assert()
        .success()
        .stdout("[say]\n[hello world]\n[a \"quoted\" b]\n[--flag]\n");
}

#[test]
fn test_passthrough_failure_exits_11() {
    let (home, _) = seeded_home("echo partial; echo 'bad token' >&2; exit 3");

    agfapi(home.path())
        .args(["worklist", "get", "wl-1"])
        .assert()
        .code(11)
        .stdout("partial\n")
        .stderr(predicate::str::contains("bad token"));
}

#[test]
fn test_passthrough_forwards_leading_flags() {
    let (home, _) = seeded_home(r#"for a in "$@"; do echo "[$a]"; done"#);

    agfapi(home.path())
        .args(["--format", "json", "worklist", "get", "x"])
        .assert()
        .success()
        .stdout("[--format]\n[json]\n[worklist]\n[get]\n[x]\n");
}

#[test]
fn test_passthrough_forwards_short_verbose_flag() {
    let (home, _) = seeded_home(r#"for a in "$@"; do echo "[$a]"; done"#);

    agfapi(home.path())
        .arg("-v")
        .assert()
        .success()
        .stdout("[-v]\n");
}

#[test]
fn test_passthrough_forwards_help_and_separator() {
    let (home, _) = seeded_home(r#"for a in "$@"; do echo "[$a]"; done"#);

    agfapi(home.path())
        .args(["--help", "--", "self"])
        .assert()
        .success()
        .stdout("[--help]\n[--]\n[self]\n");
}

#[test]
fn test_passthrough_rejects_path_like_version() {
    let home = TempDir::new().unwrap();

    agfapi(home.path())
        .args(["worklist", "get", "wl-1"])
        .env("AGFAPI_VERSION", "../../outside")
        .assert()
        .code(1)
        .stderr(predicate::str::contains("invalid version"));

    assert!(!home.path().join("bin").exists());
}

#[test]
fn test_passthrough_without_arguments() {
    let (home, _) = seeded_home(r#"echo "count: $#""#);

    agfapi(home.path())
        .assert()
        .success()
        .stdout("count: 0\n");
}

#[test]
fn test_passthrough_download_failure() {
    let home = TempDir::new().unwrap();

    agfapi(home.path())
        .args(["worklist", "get", "wl-1"])
        .env("AGFAPI_VERSION", "9.9.9")
        .assert()
        .code(1)
        .stderr(predicate::str::contains("could not provision agfapi v9.9.9"))
        .stderr(predicate::str::contains("failed to download"));
}

// ============================================================================
// agfapi self
// ============================================================================

#[test]
fn test_self_path_uses_cache() {
    let (home, binary) = seeded_home("exit 0");

    agfapi(home.path())
        .args(["self", "path"])
        .assert()
        .success()
        .stdout(format!("{}\n", binary.display()));
}

#[test]
fn test_self_path_home_flag() {
    let (home, binary) = seeded_home("exit 0");
    let other = TempDir::new().unwrap();

    agfapi(other.path())
        .args(["self", "path", "--home"])
        .arg(home.path())
        .assert()
        .success()
        .stdout(format!("{}\n", binary.display()));
}

#[test]
fn test_self_install_cached() {
    let (home, binary) = seeded_home("exit 0");

    agfapi(home.path())
        .args(["self", "install"])
        .assert()
        .success()
        .stderr(predicate::str::contains("Installed agfapi v1.2.3"));

    assert!(binary.is_file());
}

#[test]
fn test_self_worklist_pretty_prints_json() {
    let (home, _) = seeded_home(r#"printf '{"id":"%s","status":"active"}\n' "$3""#);

    agfapi(home.path())
        .args(["self", "worklist", "wl-123"])
        .assert()
        .success()
        .stdout(predicate::str::contains(r#""id": "wl-123""#))
        .stdout(predicate::str::contains(r#""status": "active""#));
}

#[test]
fn test_self_worklist_malformed_output() {
    let (home, _) = seeded_home("echo not json");

    agfapi(home.path())
        .args(["self", "worklist", "wl-555"])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("wl-555"))
        .stderr(predicate::str::contains("not json"));
}

#[test]
fn test_self_worklist_command_failure() {
    let (home, _) = seeded_home("echo 'worklist not found' >&2; exit 2");

    agfapi(home.path())
        .args(["self", "worklist", "wl-404"])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("worklist not found"));
}

#[test]
fn test_self_cache_list() {
    let (home, _) = seeded_home("exit 0");
    install_script(home.path(), "v1.0.0", "exit 0");

    agfapi(home.path())
        .args(["self", "cache", "list"])
        .assert()
        .success()
        .stdout(predicate::str::contains("v1.0.0"))
        .stdout(predicate::str::contains("v1.2.3"));
}

#[test]
fn test_self_cache_list_empty() {
    let home = TempDir::new().unwrap();

    agfapi(home.path())
        .args(["self", "cache", "list"])
        .assert()
        .success()
        .stdout(predicate::str::contains("(none)"));
}

#[test]
fn test_self_cache_clean_version() {
    let (home, binary) = seeded_home("exit 0");
    let other = install_script(home.path(), "v1.0.0", "exit 0");

    agfapi(home.path())
        .args(["self", "cache", "clean", "--version", "1.2.3"])
        .assert()
        .success()
        .stderr(predicate::str::contains("Removed agfapi v1.2.3"));

    assert!(!binary.exists());
    assert!(other.exists());
}

#[test]
fn test_self_cache_clean_rejects_path_like_version() {
    let tmp = TempDir::new().unwrap();
    let home = tmp.path().join("home");
    let binary = install_script(&home, "v1.2.3", "exit 0");
    let precious = tmp.path().join("precious.txt");
    fs::write(&precious, "keep").unwrap();

    agfapi(&home)
        .args(["self", "cache", "clean", "--version", "v1.2.3/../../../.."])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("invalid version"));

    assert!(precious.exists());
    assert!(binary.exists());
}

#[test]
fn test_self_cache_clean_all() {
    let (home, binary) = seeded_home("exit 0");

    agfapi(home.path())
        .args(["self", "cache", "clean"])
        .assert()
        .success();
    assert!(!binary.exists());

    agfapi(home.path())
        .args(["self", "cache", "clean"])
        .assert()
        .success()
        .stderr(predicate::str::contains("Nothing to clean"));
}

#[test]
fn test_self_completions() {
    let home = TempDir::new().unwrap();

    agfapi(home.path())
        .args(["self", "completions", "bash"])
        .assert()
        .success()
        .stdout(predicate::str::contains("agfapi"));
}

#[test]
fn test_invalid_config_file() {
    let home = TempDir::new().unwrap();
    fs::write(home.path().join("config.toml"), "unknown_key = 1\n").unwrap();

    agfapi(home.path())
        .args(["self", "path"])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("config"));
}

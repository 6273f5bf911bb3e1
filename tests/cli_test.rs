//! CLI end-to-end tests
//!
//! Tests for the reelvault command-line interface.

use assert_cmd::prelude::*;
use predicates::prelude::*;
use std::fs;
use std::path::Path;
use std::process::Command;
use tempfile::tempdir;

#[allow(deprecated)]
fn reelvault_cmd() -> Command {
    Command::cargo_bin("reelvault").unwrap()
}

fn write_config(dir: &Path) -> std::path::PathBuf {
    let config_path = dir.join("config.json");
    let config = serde_json::json!({
        "server": { "db_path": dir.join("db/reelvault.db") },
        "storage": { "root": dir.join("uploads") },
    });
    fs::write(&config_path, config.to_string()).unwrap();
    config_path
}

#[test]
fn no_args_shows_help() {
    reelvault_cmd()
        .assert()
        .failure()
        .stderr(predicate::str::contains("Usage"));
}

#[test]
fn help_lists_commands() {
    reelvault_cmd()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("start"))
        .stdout(predicate::str::contains("create-album"))
        .stdout(predicate::str::contains("check-tools"));
}

#[test]
fn version_command() {
    reelvault_cmd()
        .arg("version")
        .assert()
        .success()
        .stdout(predicate::str::contains("reelvault"))
        .stdout(predicate::str::contains(env!("CARGO_PKG_VERSION")));
}

#[test]
fn check_tools_reports_ffmpeg() {
    reelvault_cmd()
        .arg("check-tools")
        .assert()
        .success()
        .stdout(predicate::str::contains("ffmpeg"));
}

#[test]
fn validate_without_file_uses_defaults() {
    reelvault_cmd()
        .arg("validate")
        .assert()
        .success()
        .stdout(predicate::str::contains("using defaults"))
        .stdout(predicate::str::contains("3000"));
}

#[test]
fn validate_valid_config() {
    let dir = tempdir().unwrap();
    let config_path = dir.path().join("config.json");
    fs::write(
        &config_path,
        r#"{ "server": { "port": 9090 }, "streaming": { "max_chunk_bytes": 1048576 } }"#,
    )
    .unwrap();

    reelvault_cmd()
        .arg("validate")
        .arg(&config_path)
        .assert()
        .success()
        .stdout(predicate::str::contains("valid"))
        .stdout(predicate::str::contains("9090"))
        .stdout(predicate::str::contains("1048576"));
}

#[test]
fn validate_invalid_json_fails() {
    let dir = tempdir().unwrap();
    let config_path = dir.path().join("broken.json");
    fs::write(&config_path, "{ not json").unwrap();

    reelvault_cmd().arg("validate").arg(&config_path).assert().failure();
}

#[test]
fn validate_missing_file_fails() {
    reelvault_cmd()
        .arg("validate")
        .arg("/nonexistent/reelvault.json")
        .assert()
        .failure();
}

#[test]
fn create_album_persists_row_and_folder_name() {
    let dir = tempdir().unwrap();
    let config_path = write_config(dir.path());

    reelvault_cmd()
        .arg("--config")
        .arg(&config_path)
        .args(["create-album", "--title", "Beach Day"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Beach Day"));

    let db = rv_db::pool::init_pool(&dir.path().join("db/reelvault.db").to_string_lossy()).unwrap();
    let conn = rv_db::pool::get_conn(&db).unwrap();
    let all = rv_db::queries::albums::list_albums(&conn).unwrap();
    assert_eq!(all.len(), 1);
    assert_eq!(all[0].title, "Beach Day");
    assert_eq!(all[0].folder, "Beach Day");
    assert!(all[0].thumbnail_path.is_none());
}

#[test]
fn create_album_copies_thumbnail() {
    let dir = tempdir().unwrap();
    let config_path = write_config(dir.path());
    let cover = dir.path().join("cover.jpg");
    fs::write(&cover, b"jpeg-ish bytes").unwrap();

    reelvault_cmd()
        .arg("--config")
        .arg(&config_path)
        .args(["create-album", "--title", "Winter", "--thumbnail"])
        .arg(&cover)
        .assert()
        .success()
        .stdout(predicate::str::contains("Thumbnail: Winter/thumbnail_"));

    let copied: Vec<_> = fs::read_dir(dir.path().join("uploads/Winter"))
        .unwrap()
        .map(|e| e.unwrap().file_name().to_string_lossy().to_string())
        .collect();
    assert_eq!(copied.len(), 1);
    assert!(copied[0].starts_with("thumbnail_"));
    assert!(copied[0].ends_with("_cover.jpg"));
}

#[test]
fn create_album_rejects_blank_title() {
    let dir = tempdir().unwrap();
    let config_path = write_config(dir.path());

    reelvault_cmd()
        .arg("--config")
        .arg(&config_path)
        .args(["create-album", "--title", "   "])
        .assert()
        .failure();
}

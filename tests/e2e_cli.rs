//! CLI end-to-end tests
//!
//! Tests for the mediaconv command-line interface. None of these need ffmpeg.

use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use tempfile::tempdir;

/// Get a command for the mediaconv binary
#[allow(deprecated)]
fn mediaconv_cmd() -> Command {
    Command::cargo_bin("mediaconv").unwrap()
}

const THEORA_REQUEST: &str = r#"{"format": "ogg", "video": {"codec": "theora", "fps": 25}}"#;

#[test]
fn test_cli_no_args_shows_help() {
    let mut cmd = mediaconv_cmd();
    cmd.assert()
        .failure()
        .stderr(predicate::str::contains("Usage"));
}

#[test]
fn test_cli_help_flag() {
    let mut cmd = mediaconv_cmd();
    cmd.arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("mediaconv"))
        .stdout(predicate::str::contains("compile"))
        .stdout(predicate::str::contains("segment"));
}

#[test]
fn test_cli_version_command() {
    let mut cmd = mediaconv_cmd();
    cmd.arg("version")
        .assert()
        .success()
        .stdout(predicate::str::starts_with("mediaconv "));
}

#[test]
fn test_cli_compile_inline_request() {
    let mut cmd = mediaconv_cmd();
    cmd.args(["compile", THEORA_REQUEST])
        .assert()
        .success()
        .stdout("-an -vcodec libtheora -pix_fmt yuv420p -r 25 -sn -f ogg\n");
}

#[test]
fn test_cli_compile_json_output() {
    let mut cmd = mediaconv_cmd();
    cmd.args(["compile", "--json", r#"{"format": "ogg", "audio": {"codec": "copy"}, "video": {"codec": "copy"}}"#])
        .assert()
        .success()
        .stdout("[\"-acodec\",\"copy\",\"-vcodec\",\"copy\",\"-sn\",\"-f\",\"ogg\"]\n");
}

#[test]
fn test_cli_compile_request_file_and_pass() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("request.json");
    fs::write(
        &path,
        r#"{"format": "mkv", "audio": {"codec": "mp3"}, "video": {"codec": "h264"}}"#,
    )
    .unwrap();

    let mut cmd = mediaconv_cmd();
    cmd.args(["compile", "--pass", "1"])
        .arg(&path)
        .assert()
        .success()
        .stdout(predicate::str::starts_with("-an "))
        .stdout(predicate::str::ends_with("-f matroska -pass 1\n"));
}

#[test]
fn test_cli_compile_from_stdin() {
    let mut cmd = mediaconv_cmd();
    cmd.args(["compile", "-"])
        .write_stdin(THEORA_REQUEST)
        .assert()
        .success()
        .stdout(predicate::str::contains("libtheora"));
}

#[test]
fn test_cli_compile_rejects_bad_pass() {
    let mut cmd = mediaconv_cmd();
    cmd.args(["compile", "--pass", "3", THEORA_REQUEST])
        .assert()
        .failure();
}

#[test]
fn test_cli_compile_unknown_format() {
    let mut cmd = mediaconv_cmd();
    cmd.args(["compile", r#"{"format": "xyz", "audio": {"codec": "mp3"}}"#])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Unknown format: xyz"));
}

#[test]
fn test_cli_compile_invalid_json() {
    let mut cmd = mediaconv_cmd();
    cmd.args(["compile", "{format"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("not valid JSON"));
}

#[test]
fn test_cli_codecs_lists_tables() {
    let mut cmd = mediaconv_cmd();
    cmd.arg("codecs")
        .assert()
        .success()
        .stdout(predicate::str::contains("video codecs:"))
        .stdout(predicate::str::contains("libx264"))
        .stdout(predicate::str::contains("matroska"));
}

#[test]
fn test_cli_check_tools_command() {
    let mut cmd = mediaconv_cmd();
    cmd.arg("check-tools")
        .assert()
        .success()
        .stdout(predicate::str::contains("ffmpeg"))
        .stdout(predicate::str::contains("ffprobe"));
}

#[test]
fn test_cli_validate_config() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("mediaconv.toml");
    fs::write(&path, "[conversion]\ntimeout_secs = 30\n").unwrap();

    let mut cmd = mediaconv_cmd();
    cmd.arg("validate")
        .arg(&path)
        .assert()
        .success()
        .stdout(predicate::str::contains("Configuration is valid"))
        .stdout(predicate::str::contains("Timeout: 30s"));
}

#[test]
fn test_cli_validate_invalid_config() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("mediaconv.toml");
    fs::write(&path, "[conversion]\nmin_duration_secs = -2.0\n").unwrap();

    let mut cmd = mediaconv_cmd();
    cmd.arg("validate").arg(&path).assert().failure();
}

#[test]
fn test_cli_probe_missing_file() {
    let mut cmd = mediaconv_cmd();
    cmd.args(["probe", "/nonexistent/file.mkv"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("does not exist"));
}

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

fn stegsweep() -> Command {
    let mut cmd = Command::cargo_bin("stegsweep").unwrap();
    cmd.env("RUST_LOG", "warn");
    cmd
}

fn wav_file(dir: &TempDir) -> std::path::PathBuf {
    let path = dir.path().join("sample.bin");
    let mut bytes = b"RIFF\x24\x00\x00\x00WAVEfmt ".to_vec();
    bytes.extend_from_slice(&[0u8; 32]);
    std::fs::write(&path, bytes).unwrap();
    path
}

#[test]
fn missing_file_fails() {
    let dir = TempDir::new().unwrap();
    stegsweep()
        .args(["scan", dir.path().join("nope.png").to_str().unwrap(), "--config", "/dev/null"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("cannot access file"));
}

#[test]
fn directory_is_rejected() {
    let dir = TempDir::new().unwrap();
    stegsweep()
        .args(["scan", dir.path().to_str().unwrap(), "--config", "/dev/null"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("directory"));
}

#[test]
fn malformed_config_fails() {
    let dir = TempDir::new().unwrap();
    let cfg = dir.path().join("bad.toml");
    std::fs::write(&cfg, "timeout_secs = \"soon\"\n").unwrap();
    let file = wav_file(&dir);
    stegsweep()
        .args(["scan", file.to_str().unwrap(), "--config", cfg.to_str().unwrap()])
        .assert()
        .failure()
        .stderr(predicate::str::contains("invalid config file"));
}

#[test]
fn json_report_for_single_tool() {
    let dir = TempDir::new().unwrap();
    let file = wav_file(&dir);
    let out_dir = dir.path().join("out");
    let assert = stegsweep()
        .args([
            "scan",
            file.to_str().unwrap(),
            "--only",
            "wavsteg",
            "--json",
            "--config",
            "/dev/null",
            "-o",
            out_dir.to_str().unwrap(),
        ])
        .assert()
        .success();

    let stdout = &assert.get_output().stdout;
    assert!(!String::from_utf8_lossy(stdout).contains("multi-tool steganography scanner"));
    let report: serde_json::Value = serde_json::from_slice(stdout).unwrap();
    assert_eq!(report["file"]["category"], "wav");
    assert_eq!(report["tools"].as_array().unwrap().len(), 1);
    assert_eq!(report["tools"][0]["tool"], "wavsteg");
    assert_eq!(report["summary"]["total"], 1);
    assert!(out_dir.is_dir());
}

#[test]
fn inapplicable_only_yields_empty_report() {
    let dir = TempDir::new().unwrap();
    let file = wav_file(&dir);
    let assert = stegsweep()
        .args(["scan", file.to_str().unwrap(), "--only", "zsteg", "--json", "--config", "/dev/null"])
        .args(["-o", dir.path().join("out").to_str().unwrap()])
        .assert()
        .success();
    let report: serde_json::Value = serde_json::from_slice(&assert.get_output().stdout).unwrap();
    assert!(report["tools"].as_array().unwrap().is_empty());
    assert_eq!(report["summary"]["total"], 0);
}

#[test]
fn colored_report_shows_summary() {
    let dir = TempDir::new().unwrap();
    let file = wav_file(&dir);
    stegsweep()
        .env("NO_COLOR", "1")
        .args(["scan", file.to_str().unwrap(), "--skip", "foremost,binwalk,sox-spectrogram,wavsteg", "--config", "/dev/null"])
        .args(["--only", "file,strings", "-o", dir.path().join("out").to_str().unwrap()])
        .assert()
        .success()
        .stdout(predicate::str::contains("multi-tool steganography scanner"))
        .stdout(predicate::str::contains("TARGET FILE"))
        .stdout(predicate::str::contains("WAV"))
        .stdout(predicate::str::contains("SCAN SUMMARY"))
        .stdout(predicate::str::contains("Total tools:"));
}

#[test]
fn deps_lists_catalog() {
    stegsweep()
        .arg("deps")
        .assert()
        .success()
        .stdout(predicate::str::contains("TOOL"))
        .stdout(predicate::str::contains("exiftool"))
        .stdout(predicate::str::contains("stegsolve"));
}

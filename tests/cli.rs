//! Integration tests for the command line binary

use assert_cmd::Command;
use image::{Rgb, RgbImage};
use predicates::prelude::*;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// Helper to create a CLI command isolated from the user's config directory
fn cli(config_home: &Path) -> Command {
    let mut cmd = Command::new(env!("CARGO_BIN_EXE_id-text-locator"));
    cmd.env("XDG_CONFIG_HOME", config_home)
        .env("HOME", config_home)
        .env_remove("RUST_LOG");
    cmd
}

/// Write a 270x480 white PNG with two dark rectangles on separate lines
fn write_sample(dir: &Path) -> PathBuf {
    let mut raw = RgbImage::from_pixel(270, 480, Rgb([255, 255, 255]));
    for &(x0, y0) in &[(25u32, 75u32), (25, 200)] {
        for y in y0..y0 + 20 {
            for x in x0..x0 + 15 {
                raw.put_pixel(x, y, Rgb([0, 0, 0]));
            }
        }
    }
    let path = dir.join("sample.png");
    raw.save(&path).unwrap();
    path
}

#[test]
fn test_help() {
    let tmp = TempDir::new().unwrap();
    cli(tmp.path())
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("Locate text regions"));
}

#[test]
fn test_print_config() {
    let tmp = TempDir::new().unwrap();
    cli(tmp.path())
        .args(["--print-config", "--strategy", "morphological"])
        .assert()
        .success()
        .stdout(predicate::str::contains("canonical_height = 1920"))
        .stdout(predicate::str::contains("morphological-threshold"));
}

#[test]
fn test_detect_sample_image() {
    let tmp = TempDir::new().unwrap();
    let image = write_sample(tmp.path());

    let output = cli(tmp.path()).arg(&image).output().unwrap();
    assert!(output.status.success());

    let reports: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    let report = &reports[0];
    assert_eq!(report["height"], 1920);
    assert_eq!(report["width"], 1080);
    assert_eq!(report["strategy"], "region-growing");
    assert_eq!(report["boxes"].as_array().unwrap().len(), 2);
}

#[test]
fn test_detect_original_coords() {
    let tmp = TempDir::new().unwrap();
    let image = write_sample(tmp.path());

    let output = cli(tmp.path())
        .arg("--original-coords")
        .arg(&image)
        .output()
        .unwrap();
    assert!(output.status.success());

    let reports: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    let report = &reports[0];
    assert_eq!(report["width"], 270);
    assert_eq!(report["height"], 480);
    let first = &report["boxes"][0];
    assert_eq!(first["x1"], 25);
    assert_eq!(first["y1"], 75);
}

#[test]
fn test_config_file_selects_strategy() {
    let tmp = TempDir::new().unwrap();
    let image = write_sample(tmp.path());
    let config = tmp.path().join("detector.toml");
    std::fs::write(&config, "strategy = \"morphological-threshold\"\n").unwrap();

    cli(tmp.path())
        .arg("--config")
        .arg(&config)
        .arg(&image)
        .assert()
        .success()
        .stdout(predicate::str::contains("morphological-threshold"));
}

#[test]
fn test_invalid_config_fails() {
    let tmp = TempDir::new().unwrap();
    let image = write_sample(tmp.path());
    let config = tmp.path().join("bad.toml");
    std::fs::write(&config, "[morphology]\nfield_kernel = 4\n").unwrap();

    cli(tmp.path())
        .arg("--config")
        .arg(&config)
        .arg(&image)
        .assert()
        .failure()
        .stderr(predicate::str::contains("field_kernel"));
}

#[test]
fn test_missing_image_fails() {
    let tmp = TempDir::new().unwrap();
    cli(tmp.path())
        .arg(tmp.path().join("missing.png"))
        .assert()
        .failure()
        .stderr(predicate::str::contains("missing.png"));
}

#![cfg(feature = "cli")]

use std::path::Path;

use assert_cmd::Command;
use image::{GrayImage, Luma, Rgb, RgbImage};
use predicates::prelude::*;
use tempfile::TempDir;

fn deslant_cmd() -> Command {
    Command::new(env!("CARGO_BIN_EXE_deslant"))
}

/// 60x40 white image with a one-pixel line leaning like `x = 50 - y / 2`.
fn write_leaning_line(path: &Path) {
    let img = GrayImage::from_fn(60, 40, |x, y| {
        let line = (50.0 - 0.5 * y as f32 + 0.5).floor() as u32;
        Luma([if x == line { 0 } else { 255 }])
    });
    img.save(path).unwrap();
}

#[test]
fn help_lists_the_search_flags() {
    deslant_cmd()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("--lower-bound"))
        .stdout(predicate::str::contains("--num-steps"))
        .stdout(predicate::str::contains("--backend"));
}

#[test]
fn missing_input_fails() {
    deslant_cmd()
        .arg("/nonexistent/line.png")
        .assert()
        .failure()
        .stderr(predicate::str::contains("input path does not exist"));
}

#[test]
fn deslants_a_directory_and_writes_a_report() {
    let dir = TempDir::new().unwrap();
    let input = dir.path().join("in");
    let out = dir.path().join("out");
    std::fs::create_dir(&input).unwrap();
    write_leaning_line(&input.join("line.png"));
    std::fs::write(input.join("notes.txt"), "not an image").unwrap();
    let report = dir.path().join("report.json");

    deslant_cmd()
        .arg(&input)
        .arg("--out-dir")
        .arg(&out)
        .arg("--report")
        .arg(&report)
        .assert()
        .success()
        .stdout(predicate::str::contains("Processing"))
        .stdout(predicate::str::contains("shear value 0.500"));

    let deslanted = image::open(out.join("line_deslanted.png")).unwrap().to_luma8();
    // 60 + ceil(0.5 * 40)
    assert_eq!(deslanted.dimensions(), (80, 40));

    let raw = std::fs::read_to_string(&report).unwrap();
    let json: serde_json::Value = serde_json::from_str(&raw).unwrap();
    assert_eq!(json["backend"], "reference");
    assert_eq!(json["images"].as_array().unwrap().len(), 1);
    assert_eq!(json["images"][0]["alpha"], 0.5);
    assert_eq!(json["images"][0]["candidates"].as_array().unwrap().len(), 9);
}

#[test]
fn flags_override_the_config_file() {
    let dir = TempDir::new().unwrap();
    let img = dir.path().join("line.png");
    write_leaning_line(&img);
    let config = dir.path().join("deslant.json");
    std::fs::write(&config, r#"{"search": {"steps": 3}, "bg_color": 0}"#).unwrap();
    let report = dir.path().join("report.json");

    deslant_cmd()
        .arg(&img)
        .args(["--num-steps", "5", "--lower-bound", "-1", "--upper-bound", "1"])
        .arg("--config")
        .arg(&config)
        .arg("--report")
        .arg(&report)
        .assert()
        .success();

    let json: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(&report).unwrap()).unwrap();
    assert_eq!(json["config"]["search"]["steps"], 5);
    assert_eq!(json["config"]["bg_color"], 0);
    assert_eq!(json["images"][0]["alpha"], 0.5);
    assert!(dir.path().join("line_deslanted.png").exists());
}

#[test]
fn invalid_bounds_are_rejected() {
    let dir = TempDir::new().unwrap();
    let img = dir.path().join("line.png");
    write_leaning_line(&img);

    deslant_cmd()
        .arg(&img)
        .args(["--lower-bound", "1", "--upper-bound", "-1"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("invalid shear bounds"));
}

#[test]
fn color_input_is_deslanted_as_gray() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("line.png");
    RgbImage::from_fn(60, 40, |x, y| {
        let line = (50.0 - 0.5 * y as f32 + 0.5).floor() as u32;
        if x == line {
            Rgb([0, 0, 0])
        } else {
            Rgb([255, 255, 255])
        }
    })
    .save(&path)
    .unwrap();

    deslant_cmd()
        .arg(&path)
        .assert()
        .success()
        .stdout(predicate::str::contains("shear value 0.500"));

    let out = image::open(dir.path().join("line_deslanted.png")).unwrap();
    assert_eq!(out.color(), image::ColorType::L8);
    assert_eq!((out.width(), out.height()), (80, 40));
}

use std::path::Path;
use std::process::{Command, Output};

use image::{GrayImage, ImageFormat, Luma, Rgb, RgbImage, Rgba, RgbaImage};

fn imgdenoise(args: &[&Path]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_imgdenoise"))
        .args(args)
        .env("RUST_LOG", "off")
        .output()
        .unwrap()
}

fn noisy_rgb(width: u32, height: u32) -> RgbImage {
    RgbImage::from_fn(width, height, |x, y| {
        let noise = ((x * 7919 + y * 104729) % 41) as u8;
        Rgb([100 + noise, 80 + noise / 2, 60 + (x % 5) as u8])
    })
}

#[test]
fn rgb_png_is_denoised_to_jpeg_of_same_size() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("input.png");
    let output = dir.path().join("output.jpg");
    noisy_rgb(37, 23).save_with_format(&input, ImageFormat::Png).unwrap();

    let result = imgdenoise(&[&input, &output]);

    assert!(result.status.success(), "stderr: {}", String::from_utf8_lossy(&result.stderr));
    let bytes = std::fs::read(&output).unwrap();
    assert_eq!(&bytes[..2], &[0xFF, 0xD8]);
    let decoded = image::load_from_memory(&bytes).unwrap();
    assert_eq!((decoded.width(), decoded.height()), (37, 23));
}

#[test]
fn grayscale_input_is_rejected_without_output() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("gray.png");
    let output = dir.path().join("output.jpg");
    GrayImage::from_pixel(8, 8, Luma([128])).save(&input).unwrap();

    let result = imgdenoise(&[&input, &output]);

    assert_eq!(result.status.code(), Some(1));
    assert!(String::from_utf8_lossy(&result.stdout).contains("Wrong number of image channels"));
    assert!(!output.exists());
}

#[test]
fn rgba_input_is_rejected_without_output() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("rgba.png");
    let output = dir.path().join("output.jpg");
    RgbaImage::from_pixel(8, 8, Rgba([10, 20, 30, 255])).save(&input).unwrap();

    let result = imgdenoise(&[&input, &output]);

    assert_eq!(result.status.code(), Some(1));
    assert!(String::from_utf8_lossy(&result.stdout).contains("Wrong number of image channels"));
    assert!(!output.exists());
}

#[test]
fn albedo_and_normal_guide_the_filter() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("input.png");
    let albedo = dir.path().join("albedo.png");
    let normal = dir.path().join("normal.png");
    let output = dir.path().join("output.jpg");
    noisy_rgb(16, 16).save(&input).unwrap();
    RgbImage::from_pixel(16, 16, Rgb([200, 200, 200])).save(&albedo).unwrap();
    RgbImage::from_pixel(16, 16, Rgb([128, 128, 255])).save(&normal).unwrap();

    let result = Command::new(env!("CARGO_BIN_EXE_imgdenoise"))
        .arg(&input)
        .arg(&output)
        .arg("--albedo")
        .arg(&albedo)
        .arg("--normal")
        .arg(&normal)
        .env("RUST_LOG", "off")
        .output()
        .unwrap();

    assert!(result.status.success(), "stderr: {}", String::from_utf8_lossy(&result.stderr));
    let decoded = image::open(&output).unwrap();
    assert_eq!((decoded.width(), decoded.height()), (16, 16));
}

#[test]
fn normal_without_albedo_is_a_usage_error() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("input.png");
    let normal = dir.path().join("normal.png");
    let output = dir.path().join("output.jpg");
    noisy_rgb(4, 4).save(&input).unwrap();
    noisy_rgb(4, 4).save(&normal).unwrap();

    let result = Command::new(env!("CARGO_BIN_EXE_imgdenoise"))
        .arg(&input)
        .arg(&output)
        .arg("--normal")
        .arg(&normal)
        .output()
        .unwrap();

    assert_eq!(result.status.code(), Some(2));
    assert!(!output.exists());
}

#[test]
fn missing_input_fails() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("missing.png");
    let output = dir.path().join("output.jpg");

    let result = imgdenoise(&[&input, &output]);

    assert_eq!(result.status.code(), Some(1));
    assert!(String::from_utf8_lossy(&result.stderr).contains("Failed to read input file"));
    assert!(!output.exists());
}

#[test]
fn strict_mode_succeeds_on_a_clean_image_and_prints_timings() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("input.png");
    let output = dir.path().join("output.jpg");
    noisy_rgb(12, 9).save(&input).unwrap();

    let result = Command::new(env!("CARGO_BIN_EXE_imgdenoise"))
        .arg(&input)
        .arg(&output)
        .args(["--strict", "--timings", "--device", "cpu"])
        .env("RUST_LOG", "off")
        .output()
        .unwrap();

    assert_eq!(result.status.code(), Some(0), "stderr: {}", String::from_utf8_lossy(&result.stderr));
    assert!(output.exists());
    let stderr = String::from_utf8_lossy(&result.stderr);
    assert!(stderr.contains("Pipeline Timing Summary:"));
    assert!(stderr.contains("Total"));
    assert!(!String::from_utf8_lossy(&result.stdout).contains("Error:"));
}

#[test]
fn grayscale_albedo_is_reported_as_an_auxiliary_error() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("input.png");
    let albedo = dir.path().join("albedo.png");
    let output = dir.path().join("output.jpg");
    noisy_rgb(8, 8).save(&input).unwrap();
    GrayImage::from_pixel(8, 8, Luma([128])).save(&albedo).unwrap();

    let result = Command::new(env!("CARGO_BIN_EXE_imgdenoise"))
        .arg(&input)
        .arg(&output)
        .arg("--albedo")
        .arg(&albedo)
        .env("RUST_LOG", "off")
        .output()
        .unwrap();

    assert_eq!(result.status.code(), Some(1));
    assert!(!String::from_utf8_lossy(&result.stdout).contains("Wrong number of image channels"));
    assert!(String::from_utf8_lossy(&result.stderr).contains("albedo image has 1 channels"));
    assert!(!output.exists());
}

//! Synthetic image fixtures
#![allow(dead_code)]

use std::io::Cursor;
use std::path::{Path, PathBuf};

use image::{GrayImage, ImageFormat, Luma, Rgb, RgbImage};

/// A face-like pattern: bright oval on a dark background with two dark "eyes".
pub fn face_pattern(width: u32, height: u32, shade: u8) -> RgbImage {
    let (cx, cy) = (width as f64 / 2.0, height as f64 / 2.0);
    let (rx, ry) = (width as f64 * 0.35, height as f64 * 0.45);

    RgbImage::from_fn(width, height, |x, y| {
        let dx = (x as f64 - cx) / rx;
        let dy = (y as f64 - cy) / ry;
        let in_face = dx * dx + dy * dy <= 1.0;
        let eye = |ex: f64| {
            let ddx = x as f64 - (cx + ex * rx);
            let ddy = y as f64 - (cy - 0.3 * ry);
            ddx * ddx + ddy * ddy <= (rx * 0.12).powi(2)
        };

        let v = if in_face && (eye(-0.4) || eye(0.4)) {
            30
        } else if in_face {
            shade.saturating_add(((y * 40) / height) as u8)
        } else {
            ((x + y) % 20) as u8
        };
        Rgb([v, v, v])
    })
}

/// Uniform gray image with nothing to detect.
pub fn blank(width: u32, height: u32) -> GrayImage {
    GrayImage::from_pixel(width, height, Luma([128]))
}

pub fn png_bytes(image: &RgbImage) -> Vec<u8> {
    let mut out = Vec::new();
    image
        .write_to(&mut Cursor::new(&mut out), ImageFormat::Png)
        .expect("Failed to encode PNG fixture");
    out
}

pub fn jpeg_bytes(image: &RgbImage) -> Vec<u8> {
    let mut out = Vec::new();
    image
        .write_to(&mut Cursor::new(&mut out), ImageFormat::Jpeg)
        .expect("Failed to encode JPEG fixture");
    out
}

pub fn write_png(dir: &Path, name: &str, image: &RgbImage) -> PathBuf {
    let path = dir.join(name);
    std::fs::write(&path, png_bytes(image)).expect("Failed to write fixture");
    path
}

pub fn write_gray_png(dir: &Path, name: &str, image: &GrayImage) -> PathBuf {
    let path = dir.join(name);
    image.save(&path).expect("Failed to write fixture");
    path
}

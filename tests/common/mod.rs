#![allow(dead_code)]

use image::{DynamicImage, ImageFormat, Rgb, RgbImage};
use pan_tamper_detector::{AppState, Config};
use std::io::Cursor;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

pub const REFERENCE_NAME: &str = "reference_pan_card.png";
pub const BOUNDARY: &str = "pan-detector-test-boundary";

/// Synthetic card: diagonal print stripes with a colour gradient, textured
/// in every 7x7 window.
pub fn reference_card(width: u32, height: u32) -> RgbImage {
    RgbImage::from_fn(width, height, |x, y| {
        let v: u8 = if (x + y) % 8 < 4 { 230 } else { 30 };
        Rgb([v, v.saturating_sub(10), ((x * 255) / width) as u8])
    })
}

/// Cover `[x0, x1) x [y0, y1)` with a flat grey block.
pub fn overpaint(card: &RgbImage, x0: u32, y0: u32, x1: u32, y1: u32) -> RgbImage {
    let mut painted = card.clone();
    for y in y0..y1.min(card.height()) {
        for x in x0..x1.min(card.width()) {
            painted.put_pixel(x, y, Rgb([120, 120, 120]));
        }
    }
    painted
}

pub fn encode(img: &RgbImage, format: ImageFormat) -> Vec<u8> {
    let mut buf = Cursor::new(Vec::new());
    DynamicImage::ImageRgb8(img.clone())
        .write_to(&mut buf, format)
        .unwrap();
    buf.into_inner()
}

pub fn png(img: &RgbImage) -> Vec<u8> {
    encode(img, ImageFormat::Png)
}

/// One part of a hand-built multipart body.
pub struct Part<'a> {
    pub name: &'a str,
    pub filename: Option<&'a str>,
    pub data: &'a [u8],
}

pub fn multipart_body(parts: &[Part<'_>]) -> Vec<u8> {
    let mut body = Vec::new();
    for part in parts {
        body.extend_from_slice(format!("--{}\r\n", BOUNDARY).as_bytes());
        match part.filename {
            Some(filename) => body.extend_from_slice(
                format!(
                    "Content-Disposition: form-data; name=\"{}\"; filename=\"{}\"\r\n\
                     Content-Type: application/octet-stream\r\n\r\n",
                    part.name, filename
                )
                .as_bytes(),
            ),
            None => body.extend_from_slice(
                format!("Content-Disposition: form-data; name=\"{}\"\r\n\r\n", part.name).as_bytes(),
            ),
        }
        body.extend_from_slice(part.data);
        body.extend_from_slice(b"\r\n");
    }
    body.extend_from_slice(format!("--{}--\r\n", BOUNDARY).as_bytes());
    body
}

/// Isolated upload directory with its own configuration.
pub struct TestEnv {
    _tmp: TempDir,
    pub upload_dir: PathBuf,
    pub config: Config,
}

impl TestEnv {
    pub fn new() -> Self {
        let tmp = TempDir::new().expect("create temp dir");
        let upload_dir = tmp.path().join("uploads");
        std::fs::create_dir_all(&upload_dir).expect("create upload dir");

        let mut config = Config::default();
        config.upload.upload_dir = upload_dir.clone();

        Self {
            _tmp: tmp,
            upload_dir,
            config,
        }
    }

    pub fn with_reference(reference: &RgbImage) -> Self {
        let env = Self::new();
        std::fs::write(env.reference_path(), png(reference)).expect("write reference");
        env
    }

    pub fn reference_path(&self) -> PathBuf {
        self.upload_dir.join(REFERENCE_NAME)
    }

    pub fn state(&self) -> AppState {
        AppState::from_config(self.config.clone())
    }

    /// File names currently in the upload directory, sorted.
    pub fn upload_dir_entries(&self) -> Vec<String> {
        list_dir(&self.upload_dir)
    }
}

pub fn list_dir(dir: &Path) -> Vec<String> {
    let mut names: Vec<String> = std::fs::read_dir(dir)
        .expect("read upload dir")
        .map(|entry| entry.unwrap().file_name().to_string_lossy().into_owned())
        .collect();
    names.sort();
    names
}

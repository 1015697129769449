//! Raster image placements.

use crate::geometry::{Point, Vec2};
use base64::{Engine, engine::general_purpose::STANDARD};
use kurbo::Rect;
use serde::{Deserialize, Serialize};

/// Encoding of the placed image bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ImageFormat {
    Png,
    Jpeg,
    WebP,
}

impl ImageFormat {
    /// Detect format from magic bytes.
    pub fn from_magic_bytes(data: &[u8]) -> Option<Self> {
        if data.starts_with(&[0x89, 0x50, 0x4E, 0x47]) {
            return Some(ImageFormat::Png);
        }
        if data.starts_with(&[0xFF, 0xD8, 0xFF]) {
            return Some(ImageFormat::Jpeg);
        }
        if data.len() >= 12 && &data[0..4] == b"RIFF" && &data[8..12] == b"WEBP" {
            return Some(ImageFormat::WebP);
        }
        None
    }
}

/// An image placed on the canvas. Cuts leave images untouched.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImagePlacement {
    /// Top-left corner.
    pub origin: Point,
    pub width: f64,
    pub height: f64,
    pub format: ImageFormat,
    /// Image bytes, base64-encoded so the stroke stays plain JSON on the wire.
    pub data: String,
}

impl ImagePlacement {
    /// Place raw image bytes; `None` when the format is not recognised.
    pub fn from_bytes(origin: Point, width: f64, height: f64, bytes: &[u8]) -> Option<Self> {
        let format = ImageFormat::from_magic_bytes(bytes)?;
        Some(Self {
            origin,
            width,
            height,
            format,
            data: STANDARD.encode(bytes),
        })
    }

    /// Decode the image bytes.
    pub fn bytes(&self) -> Option<Vec<u8>> {
        STANDARD.decode(&self.data).ok()
    }

    pub fn bounds(&self) -> Rect {
        Rect::new(
            self.origin.x,
            self.origin.y,
            self.origin.x + self.width,
            self.origin.y + self.height,
        )
    }

    pub fn translated(&self, offset: Vec2) -> Self {
        Self {
            origin: self.origin + offset,
            ..self.clone()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const PNG_HEADER: [u8; 8] = [0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A];

    #[test]
    fn test_from_bytes_detects_format() {
        let image = ImagePlacement::from_bytes(Point::new(10.0, 20.0), 100.0, 50.0, &PNG_HEADER).unwrap();
        assert_eq!(image.format, ImageFormat::Png);
        assert_eq!(image.bytes().unwrap(), PNG_HEADER.to_vec());
        assert_eq!(image.bounds(), Rect::new(10.0, 20.0, 110.0, 70.0));
    }

    #[test]
    fn test_unknown_format_rejected() {
        assert!(ImagePlacement::from_bytes(Point::ZERO, 1.0, 1.0, b"GIF89a").is_none());
    }
}

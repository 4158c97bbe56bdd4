//! Page images and unit conversions
//!
//! OOXML sizes drawings in EMUs (English Metric Units):
//! - 914400 EMUs = 1 inch
//! - 9525 EMUs = 1 pixel at 96 DPI
//! - 635 EMUs = 1 twip (1/20 pt)

use crate::error::{OoxmlError, Result};

/// EMUs per inch (914400)
pub const EMU_PER_INCH: i64 = 914400;

/// EMUs per pixel at 96 DPI (9525)
pub const EMU_PER_PIXEL: i64 = 9525;

/// EMUs per twip (635)
pub const EMU_PER_TWIP: i64 = 635;

const PNG_SIGNATURE: [u8; 8] = [0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A];

/// Convert pixels (96 DPI) to EMUs
pub fn pixels_to_emu(pixels: u32) -> i64 {
    pixels as i64 * EMU_PER_PIXEL
}

/// Convert twips to EMUs
pub fn twips_to_emu(twips: u32) -> i64 {
    twips as i64 * EMU_PER_TWIP
}

/// Width and height of a PNG, read from its IHDR chunk
pub fn png_dimensions(data: &[u8]) -> Result<(u32, u32)> {
    if data.len() < 24 || data[..8] != PNG_SIGNATURE {
        return Err(OoxmlError::InvalidImage("not a PNG file".to_string()));
    }
    if &data[12..16] != b"IHDR" {
        return Err(OoxmlError::InvalidImage("missing IHDR chunk".to_string()));
    }
    let width = u32::from_be_bytes([data[16], data[17], data[18], data[19]]);
    let height = u32::from_be_bytes([data[20], data[21], data[22], data[23]]);
    if width == 0 || height == 0 {
        return Err(OoxmlError::InvalidImage(format!(
            "zero-sized image {}x{}",
            width, height
        )));
    }
    Ok((width, height))
}

/// One rendered page
#[derive(Debug, Clone)]
pub struct PageImage {
    /// PNG bytes
    pub data: Vec<u8>,
    pub width_px: u32,
    pub height_px: u32,
}

impl PageImage {
    /// Wrap PNG bytes, reading their dimensions
    pub fn from_png(data: Vec<u8>) -> Result<Self> {
        let (width_px, height_px) = png_dimensions(&data)?;
        Ok(Self {
            data,
            width_px,
            height_px,
        })
    }

    /// Largest extent with this image's aspect ratio that fits the box
    pub fn fit_within(&self, max_cx: i64, max_cy: i64) -> (i64, i64) {
        let w = self.width_px as f64;
        let h = self.height_px as f64;
        let scale = (max_cx as f64 / w).min(max_cy as f64 / h);
        let cx = ((w * scale).round() as i64).min(max_cx);
        let cy = ((h * scale).round() as i64).min(max_cy);
        (cx, cy)
    }
}

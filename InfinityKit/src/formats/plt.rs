//! PLT paperdoll texture
//!
//! Each pixel is a (column, row) pair into an external 256x256 palette
//! bitmap. Rows are stored bottom to top.

use byteorder::{LittleEndian, WriteBytesExt};
use image::{Rgba, RgbaImage};

use crate::error::{Error, Result};
use crate::utils::ByteSpan;

pub const PLT_SIGNATURE: &[u8; 4] = b"PLT ";
pub const PLT_VERSION: &[u8; 4] = b"V1  ";
const HEADER_SIZE: usize = 0x18;

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Plt {
    pub unknown: [u16; 4],
    pub width: u32,
    pub height: u32,
    /// (column, row) pairs in top-to-bottom order
    pub pixels: Vec<(u8, u8)>,
}

impl Plt {
    pub fn from_bytes(data: &[u8]) -> Result<Self> {
        let span = ByteSpan::new(data);
        let version = span.expect_signature("PLT", PLT_SIGNATURE)?;
        if &version != PLT_VERSION {
            return Err(Error::UnsupportedVersion {
                format: "PLT",
                version: String::from_utf8_lossy(&version).into_owned(),
            });
        }
        let unknown = [span.u16_at(8)?, span.u16_at(10)?, span.u16_at(12)?, span.u16_at(14)?];
        let width = span.u32_at(0x10)?;
        let height = span.u32_at(0x14)?;
        let count = (width as usize)
            .checked_mul(height as usize)
            .ok_or_else(|| Error::invalid("PLT", format!("{width}x{height} overflows")))?;
        let raw = span.slice(HEADER_SIZE, count * 2)?;

        let mut pixels = Vec::with_capacity(count);
        for row in (0..height as usize).rev() {
            let start = row * width as usize * 2;
            let line = &raw[start..start + width as usize * 2];
            pixels.extend(line.chunks_exact(2).map(|p| (p[0], p[1])));
        }
        Ok(Self {
            unknown,
            width,
            height,
            pixels,
        })
    }

    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        let expected = self.width as usize * self.height as usize;
        if self.pixels.len() != expected {
            return Err(Error::PixelCountMismatch {
                width: self.width,
                height: self.height,
                actual: self.pixels.len(),
            });
        }
        let mut out = Vec::with_capacity(HEADER_SIZE + expected * 2);
        out.extend_from_slice(PLT_SIGNATURE);
        out.extend_from_slice(PLT_VERSION);
        for v in self.unknown {
            out.write_u16::<LittleEndian>(v)?;
        }
        out.write_u32::<LittleEndian>(self.width)?;
        out.write_u32::<LittleEndian>(self.height)?;
        if self.width > 0 {
            for line in self.pixels.chunks_exact(self.width as usize).rev() {
                for &(column, row) in line {
                    out.push(column);
                    out.push(row);
                }
            }
        }
        Ok(out)
    }

    /// Encode as an image with red = column and green = row
    #[must_use]
    pub fn to_image(&self) -> RgbaImage {
        RgbaImage::from_fn(self.width, self.height, |x, y| {
            let (column, row) = self.pixels[(y * self.width + x) as usize];
            Rgba([column, row, 0, 255])
        })
    }

    #[must_use]
    pub fn from_image(image: &RgbaImage, unknown: [u16; 4]) -> Self {
        Self {
            unknown,
            width: image.width(),
            height: image.height(),
            pixels: image.pixels().map(|p| (p[0], p[1])).collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_rows_are_bottom_up() {
        let plt = Plt {
            unknown: [1, 2, 3, 4],
            width: 2,
            height: 2,
            pixels: vec![(1, 10), (2, 10), (3, 20), (4, 20)],
        };
        let bytes = plt.to_bytes().unwrap();
        // Bottom row first on disk
        assert_eq!(&bytes[HEADER_SIZE..HEADER_SIZE + 4], &[3, 20, 4, 20]);
        assert_eq!(Plt::from_bytes(&bytes).unwrap(), plt);
    }

    #[test]
    fn test_image_round_trip() {
        let plt = Plt {
            unknown: [0; 4],
            width: 3,
            height: 1,
            pixels: vec![(5, 6), (7, 8), (9, 10)],
        };
        let image = plt.to_image();
        assert_eq!(image.get_pixel(1, 0), &Rgba([7, 8, 0, 255]));
        assert_eq!(Plt::from_image(&image, [0; 4]), plt);
    }

    #[test]
    fn test_pixel_count_mismatch() {
        let plt = Plt {
            width: 2,
            height: 2,
            pixels: vec![(0, 0)],
            ..Plt::default()
        };
        assert!(matches!(plt.to_bytes(), Err(Error::PixelCountMismatch { .. })));
    }
}

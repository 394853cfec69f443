//! Uncompressed Windows bitmaps (4, 8 and 24 bits per pixel)
//!
//! Area light, search and height maps are small indexed bitmaps whose
//! palette values carry meaning, so upscaling repeats pixels instead of
//! filtering them.

use byteorder::{LittleEndian, WriteBytesExt};
use image::{Rgba, RgbaImage};

use crate::error::{Error, Result};
use crate::utils::ByteSpan;

pub const BMP_SIGNATURE: &[u8; 2] = b"BM";
const FILE_HEADER_SIZE: usize = 14;
const INFO_HEADER_SIZE: usize = 40;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Bmp {
    pub width: u32,
    pub height: u32,
    pub bits_per_pixel: u16,
    pub pixels_per_meter: (i32, i32),
    /// BGRX entries
    pub palette: Vec<[u8; 4]>,
    /// Top-down; one index per pixel, or BGR triplets at 24 bits
    pub pixels: Vec<u8>,
}

fn row_stride(width: u32, bits: u16) -> usize {
    (width as usize * usize::from(bits)).div_ceil(32) * 4
}

impl Bmp {
    fn bytes_per_pixel(&self) -> usize {
        if self.bits_per_pixel == 24 { 3 } else { 1 }
    }

    pub fn from_bytes(data: &[u8]) -> Result<Self> {
        let span = ByteSpan::new(data);
        if span.slice(0, 2)? != BMP_SIGNATURE {
            let found = span.array_at::<2>(0)?;
            return Err(Error::InvalidSignature {
                format: "BMP",
                found: [found[0], found[1], 0, 0],
            });
        }
        let pixel_offset = span.u32_at(10)? as usize;
        let info_size = span.u32_at(14)? as usize;
        if info_size < INFO_HEADER_SIZE {
            return Err(Error::invalid("BMP", format!("unsupported info header of {info_size} bytes")));
        }
        let width = span.i32_at(18)?;
        let height = span.i32_at(22)?;
        let bits = span.u16_at(28)?;
        let compression = span.u32_at(30)?;
        if !matches!(bits, 4 | 8 | 24) {
            return Err(Error::UnsupportedVersion {
                format: "BMP",
                version: format!("{bits} bits per pixel"),
            });
        }
        if compression != 0 {
            return Err(Error::invalid("BMP", format!("compression {compression} not supported")));
        }
        let pixels_per_meter = (span.i32_at(38)?, span.i32_at(42)?);
        let colors_used = span.u32_at(46)? as usize;

        let palette_len = match bits {
            24 => 0,
            _ if colors_used > 0 => colors_used,
            _ => 1 << bits,
        };
        let palette = span
            .records(FILE_HEADER_SIZE + info_size, palette_len, 4)?
            .iter()
            .map(|r| r.array_at::<4>(0))
            .collect::<Result<Vec<_>>>()?;

        let bottom_up = height > 0;
        let width = width.unsigned_abs();
        let height = height.unsigned_abs();
        let stride = row_stride(width, bits);
        let raw = span.slice(pixel_offset, stride * height as usize)?;

        let mut pixels = Vec::with_capacity(width as usize * height as usize * if bits == 24 { 3 } else { 1 });
        for y in 0..height as usize {
            let source_row = if bottom_up { height as usize - 1 - y } else { y };
            let row = &raw[source_row * stride..(source_row + 1) * stride];
            match bits {
                4 => {
                    for x in 0..width as usize {
                        let byte = row[x / 2];
                        pixels.push(if x % 2 == 0 { byte >> 4 } else { byte & 0x0F });
                    }
                }
                8 => pixels.extend_from_slice(&row[..width as usize]),
                _ => pixels.extend_from_slice(&row[..width as usize * 3]),
            }
        }
        Ok(Self {
            width,
            height,
            bits_per_pixel: bits,
            pixels_per_meter,
            palette,
            pixels,
        })
    }

    /// Always written bottom-up with a 40-byte info header
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        let expected = self.width as usize * self.height as usize * self.bytes_per_pixel();
        if self.pixels.len() != expected {
            return Err(Error::PixelCountMismatch {
                width: self.width,
                height: self.height,
                actual: self.pixels.len(),
            });
        }
        let stride = row_stride(self.width, self.bits_per_pixel);
        let pixel_offset = FILE_HEADER_SIZE + INFO_HEADER_SIZE + self.palette.len() * 4;
        let image_size = stride * self.height as usize;

        let mut out = Vec::with_capacity(pixel_offset + image_size);
        out.extend_from_slice(BMP_SIGNATURE);
        out.write_u32::<LittleEndian>((pixel_offset + image_size) as u32)?;
        out.write_u32::<LittleEndian>(0)?;
        out.write_u32::<LittleEndian>(pixel_offset as u32)?;

        out.write_u32::<LittleEndian>(INFO_HEADER_SIZE as u32)?;
        out.write_i32::<LittleEndian>(self.width as i32)?;
        out.write_i32::<LittleEndian>(self.height as i32)?;
        out.write_u16::<LittleEndian>(1)?;
        out.write_u16::<LittleEndian>(self.bits_per_pixel)?;
        out.write_u32::<LittleEndian>(0)?;
        out.write_u32::<LittleEndian>(image_size as u32)?;
        out.write_i32::<LittleEndian>(self.pixels_per_meter.0)?;
        out.write_i32::<LittleEndian>(self.pixels_per_meter.1)?;
        out.write_u32::<LittleEndian>(self.palette.len() as u32)?;
        out.write_u32::<LittleEndian>(0)?;
        for entry in &self.palette {
            out.extend_from_slice(entry);
        }

        let line = self.width as usize * self.bytes_per_pixel();
        for y in (0..self.height as usize).rev() {
            let source = &self.pixels[y * line..(y + 1) * line];
            let start = out.len();
            if self.bits_per_pixel == 4 {
                for pair in source.chunks(2) {
                    let high = pair[0] & 0x0F;
                    let low = pair.get(1).map_or(0, |p| p & 0x0F);
                    out.push((high << 4) | low);
                }
            } else {
                out.extend_from_slice(source);
            }
            out.resize(start + stride, 0);
        }
        Ok(out)
    }

    /// Repeat every pixel `factor` times in both directions
    #[must_use]
    pub fn upscale(&self, factor: u32) -> Self {
        let factor = factor.max(1);
        let bpp = self.bytes_per_pixel();
        let width = self.width * factor;
        let height = self.height * factor;
        let line = self.width as usize * bpp;
        let mut pixels = Vec::with_capacity(width as usize * height as usize * bpp);
        for y in 0..height as usize {
            let row = &self.pixels[(y / factor as usize) * line..][..line];
            for x in 0..width as usize {
                let source = (x / factor as usize) * bpp;
                pixels.extend_from_slice(&row[source..source + bpp]);
            }
        }
        Self {
            width,
            height,
            pixels,
            ..self.clone()
        }
    }

    #[must_use]
    pub fn to_image(&self) -> RgbaImage {
        let bpp = self.bytes_per_pixel();
        RgbaImage::from_fn(self.width, self.height, |x, y| {
            let at = (y as usize * self.width as usize + x as usize) * bpp;
            let [b, g, r] = if bpp == 3 {
                [self.pixels[at], self.pixels[at + 1], self.pixels[at + 2]]
            } else {
                let entry = self.palette.get(usize::from(self.pixels[at])).copied().unwrap_or_default();
                [entry[0], entry[1], entry[2]]
            };
            Rgba([r, g, b, 255])
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn indexed(bits: u16, width: u32, height: u32) -> Bmp {
        let colors = 1usize << bits;
        Bmp {
            width,
            height,
            bits_per_pixel: bits,
            pixels_per_meter: (2835, 2835),
            palette: (0..colors).map(|i| [i as u8, 0, 255 - i as u8, 0]).collect(),
            pixels: (0..width * height).map(|i| (i as usize % colors) as u8).collect(),
        }
    }

    #[test]
    fn test_round_trip_4bit_odd_width() {
        let bmp = indexed(4, 5, 3);
        let bytes = bmp.to_bytes().unwrap();
        assert_eq!(Bmp::from_bytes(&bytes).unwrap(), bmp);
    }

    #[test]
    fn test_round_trip_8bit_and_24bit() {
        let bmp = indexed(8, 7, 2);
        assert_eq!(Bmp::from_bytes(&bmp.to_bytes().unwrap()).unwrap(), bmp);

        let rgb = Bmp {
            width: 2,
            height: 2,
            bits_per_pixel: 24,
            pixels_per_meter: (0, 0),
            palette: Vec::new(),
            pixels: vec![1, 2, 3, 4, 5, 6, 7, 8, 9, 10, 11, 12],
        };
        let bytes = rgb.to_bytes().unwrap();
        assert_eq!(bytes.len(), FILE_HEADER_SIZE + INFO_HEADER_SIZE + 16);
        assert_eq!(Bmp::from_bytes(&bytes).unwrap(), rgb);
    }

    #[test]
    fn test_upscale_repeats_indices() {
        let bmp = Bmp {
            pixels: vec![1, 2, 3, 4],
            ..indexed(8, 2, 2)
        };
        let big = bmp.upscale(2);
        assert_eq!((big.width, big.height), (4, 4));
        assert_eq!(big.pixels[..8], [1, 1, 2, 2, 1, 1, 2, 2]);
        assert_eq!(big.pixels[8..], [3, 3, 4, 4, 3, 3, 4, 4]);
        assert_eq!(big.palette, bmp.palette);
    }

    #[test]
    fn test_to_image_uses_palette() {
        let bmp = indexed(4, 2, 1);
        let image = bmp.to_image();
        assert_eq!(image.get_pixel(1, 0), &Rgba([254, 0, 1, 255]));
    }

    #[test]
    fn test_rejects_rle() {
        let mut bytes = indexed(8, 2, 2).to_bytes().unwrap();
        bytes[30] = 1;
        assert!(matches!(Bmp::from_bytes(&bytes), Err(Error::InvalidFormat { .. })));
    }
}

//! Palette and pixel codec
//!
//! Pixels are handled as packed ARGB (`0xAARRGGBB`). Palettes are stored on
//! disk as 256 BGRA quads; an alpha byte of 0 means opaque, matching both the
//! classic engines (which ignore alpha) and the Enhanced Editions.
//!
//! Transparency is signalled by a sentinel index: either the first entry
//! holding the "magic green" colour, or an index declared by the container.

mod nearest;
mod quantize;
mod rle;

use std::collections::HashMap;

use crate::error::{Error, Result};
use crate::utils::ByteSpan;

pub use nearest::{color_distance, nearest_index};
pub use quantize::median_cut;
pub use rle::{rle_decode, rle_encode};

/// Number of entries in every V1 palette
pub const PALETTE_SIZE: usize = 256;

/// Size of a V1 palette on disk
pub const PALETTE_BYTES: usize = PALETTE_SIZE * 4;

/// Fully transparent pixel
pub const TRANSPARENT: u32 = 0x0000_0000;

/// RGB(0,255,0), the classic transparency colour
pub const MAGIC_GREEN: u32 = 0xFF00_FF00;

#[inline]
#[must_use]
pub fn alpha(argb: u32) -> u8 {
    (argb >> 24) as u8
}

#[inline]
#[must_use]
pub fn red(argb: u32) -> u8 {
    (argb >> 16) as u8
}

#[inline]
#[must_use]
pub fn green(argb: u32) -> u8 {
    (argb >> 8) as u8
}

#[inline]
#[must_use]
pub fn blue(argb: u32) -> u8 {
    argb as u8
}

#[inline]
#[must_use]
pub fn pack_argb(a: u8, r: u8, g: u8, b: u8) -> u32 {
    (u32::from(a) << 24) | (u32::from(r) << 16) | (u32::from(g) << 8) | u32::from(b)
}

/// How a palette marks its transparent entry
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transparency {
    /// The first entry equal to RGB(0,255,0) (BAM V1, TIS V1)
    MagicGreen,
    /// A fixed entry declared by the container
    Index(u8),
    /// Every entry is opaque
    None,
}

/// A 256-entry ARGB palette with an optional transparent sentinel
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Palette {
    pub colors: Vec<u32>,
    pub transparent_index: Option<u8>,
}

impl Default for Palette {
    fn default() -> Self {
        Self {
            colors: vec![0xFF00_0000; PALETTE_SIZE],
            transparent_index: None,
        }
    }
}

impl Palette {
    /// Parse 256 on-disk BGRA quads
    pub fn from_bgra(bytes: &[u8], transparency: Transparency) -> Result<Self> {
        let span = ByteSpan::new(bytes);
        let raw = span.slice(0, PALETTE_BYTES)?;
        let colors: Vec<u32> = raw
            .chunks_exact(4)
            .map(|q| {
                let a = if q[3] == 0 { 0xFF } else { q[3] };
                pack_argb(a, q[2], q[1], q[0])
            })
            .collect();
        let transparent_index = match transparency {
            Transparency::MagicGreen => colors
                .iter()
                .position(|&c| c & 0x00FF_FFFF == MAGIC_GREEN & 0x00FF_FFFF)
                .map(|i| i as u8),
            Transparency::Index(i) => Some(i),
            Transparency::None => None,
        };
        Ok(Self {
            colors,
            transparent_index,
        })
    }

    /// Serialize to 256 BGRA quads
    #[must_use]
    pub fn to_bgra(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(PALETTE_BYTES);
        for i in 0..PALETTE_SIZE {
            let c = self.colors.get(i).copied().unwrap_or(0xFF00_0000);
            let a = if alpha(c) == 0xFF { 0 } else { alpha(c) };
            out.extend_from_slice(&[blue(c), green(c), red(c), a]);
        }
        out
    }

    /// Colour of a palette index; the sentinel index always yields alpha 0
    #[must_use]
    pub fn to_argb(&self, index: u8) -> u32 {
        if self.transparent_index == Some(index) {
            return TRANSPARENT;
        }
        self.colors.get(index as usize).copied().unwrap_or(0xFF00_0000)
    }

    /// Expand palette indices into ARGB pixels
    #[must_use]
    pub fn indices_to_pixels(&self, indices: &[u8]) -> Vec<u32> {
        indices.iter().map(|&i| self.to_argb(i)).collect()
    }

    /// Map ARGB pixels back to palette indices
    ///
    /// Exact matches are resolved through a lookup table built from the
    /// palette (first occurrence wins); everything else goes through the
    /// weighted nearest-colour search.
    #[must_use]
    pub fn pixels_to_indices(&self, pixels: &[u32]) -> Vec<u8> {
        let mut cache: HashMap<u32, u8> = HashMap::with_capacity(PALETTE_SIZE);
        for (i, &c) in self.colors.iter().enumerate().rev() {
            if Some(i as u8) != self.transparent_index {
                cache.insert(c, i as u8);
            }
        }
        pixels
            .iter()
            .map(|&p| {
                if alpha(p) == 0 {
                    if let Some(t) = self.transparent_index {
                        return t;
                    }
                }
                *cache
                    .entry(p)
                    .or_insert_with(|| nearest_index(&self.colors, p, self.transparent_index))
            })
            .collect()
    }

    /// Build a palette for a set of pixels
    ///
    /// When any pixel is transparent, index 0 is reserved for magic green and
    /// the remaining 255 entries are filled by median cut.
    #[must_use]
    pub fn quantize(pixels: &[u32]) -> Self {
        let has_transparency = pixels.iter().any(|&p| alpha(p) == 0);
        Self::quantize_into(pixels, has_transparency)
    }

    /// [`Self::quantize`] with index 0 always reserved for magic green
    ///
    /// Readers that fall back to index 0 as the transparent entry (BAM) need
    /// the sentinel even when every pixel is opaque.
    #[must_use]
    pub fn quantize_with_sentinel(pixels: &[u32]) -> Self {
        Self::quantize_into(pixels, true)
    }

    fn quantize_into(pixels: &[u32], reserve_sentinel: bool) -> Self {
        let opaque: Vec<u32> = pixels.iter().copied().filter(|&p| alpha(p) != 0).collect();
        let budget = if reserve_sentinel { PALETTE_SIZE - 1 } else { PALETTE_SIZE };
        let quantized = median_cut(&opaque, budget);

        let mut colors = Vec::with_capacity(PALETTE_SIZE);
        if reserve_sentinel {
            colors.push(MAGIC_GREEN);
        }
        colors.extend(quantized);
        // Pad with black; padding never collides with the sentinel
        colors.resize(PALETTE_SIZE, 0xFF00_0000);

        Self {
            colors,
            transparent_index: reserve_sentinel.then_some(0),
        }
    }
}

/// Split a byte buffer of `width * height` ARGB pixels from an RGBA image
#[must_use]
pub fn rgba_to_argb(rgba: &[u8]) -> Vec<u32> {
    rgba.chunks_exact(4)
        .map(|p| pack_argb(p[3], p[0], p[1], p[2]))
        .collect()
}

/// Flatten ARGB pixels into RGBA bytes for the `image` crate
#[must_use]
pub fn argb_to_rgba(pixels: &[u32]) -> Vec<u8> {
    let mut out = Vec::with_capacity(pixels.len() * 4);
    for &p in pixels {
        out.extend_from_slice(&[red(p), green(p), blue(p), alpha(p)]);
    }
    out
}

/// Check a pixel buffer against its declared dimensions
pub fn check_dimensions(pixels: usize, width: u32, height: u32) -> Result<()> {
    if pixels != width as usize * height as usize {
        return Err(Error::PixelCountMismatch {
            width,
            height,
            actual: pixels,
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_palette() -> Palette {
        let mut colors: Vec<u32> = (0..256u32)
            .map(|i| pack_argb(0xFF, i as u8, (255 - i) as u8, (i * 7) as u8))
            .collect();
        colors[0] = MAGIC_GREEN;
        Palette {
            colors,
            transparent_index: Some(0),
        }
    }

    #[test]
    fn test_sentinel_is_transparent() {
        let palette = test_palette();
        assert_eq!(alpha(palette.to_argb(0)), 0);
        assert_eq!(alpha(palette.to_argb(5)), 0xFF);
    }

    #[test]
    fn test_indices_round_trip() {
        let palette = test_palette();
        let indices: Vec<u8> = (0..=255u8).chain([0, 0, 17, 255, 3]).collect();
        let pixels = palette.indices_to_pixels(&indices);
        assert_eq!(palette.pixels_to_indices(&pixels), indices);
    }

    #[test]
    fn test_bgra_round_trip_and_magic_green() {
        let palette = test_palette();
        let bytes = palette.to_bgra();
        assert_eq!(&bytes[0..4], &[0, 255, 0, 0]);
        let parsed = Palette::from_bgra(&bytes, Transparency::MagicGreen).unwrap();
        assert_eq!(parsed, palette);
    }

    #[test]
    fn test_declared_index_transparency() {
        let palette = Palette::from_bgra(&test_palette().to_bgra(), Transparency::Index(7)).unwrap();
        assert_eq!(palette.transparent_index, Some(7));
        assert_eq!(palette.to_argb(7), TRANSPARENT);
    }

    #[test]
    fn test_quantize_reserves_sentinel() {
        let pixels = vec![TRANSPARENT, 0xFFFF_0000, 0xFF00_00FF, 0xFFFF_0000];
        let palette = Palette::quantize(&pixels);
        assert_eq!(palette.transparent_index, Some(0));
        let indices = palette.pixels_to_indices(&pixels);
        assert_eq!(indices[0], 0);
        assert_eq!(palette.indices_to_pixels(&indices), pixels);
    }

    #[test]
    fn test_sentinel_reserved_for_opaque_pixels() {
        let pixels = vec![0xFFC8_0A0A, 0xFF0A_0AC8];
        assert_eq!(Palette::quantize(&pixels).transparent_index, None);

        let palette = Palette::quantize_with_sentinel(&pixels);
        assert_eq!(palette.transparent_index, Some(0));
        assert_eq!(palette.colors[0], MAGIC_GREEN);
        let indices = palette.pixels_to_indices(&pixels);
        assert!(indices.iter().all(|&i| i != 0));
        assert_eq!(palette.indices_to_pixels(&indices), pixels);
    }

    #[test]
    fn test_rgba_conversion() {
        let rgba = [10, 20, 30, 255, 0, 0, 0, 0];
        let argb = rgba_to_argb(&rgba);
        assert_eq!(argb, vec![0xFF0A_141E, 0]);
        assert_eq!(argb_to_rgba(&argb), rgba);
    }
}

//! TIS tileset container
//!
//! Every tile is 64x64. V1 tiles carry their own 256-colour palette followed
//! by 4096 index bytes; V2 tiles are `{page, x, y}` references into the
//! tileset's PVRZ pages.

use byteorder::{LittleEndian, WriteBytesExt};
use image::{Rgba, RgbaImage, imageops};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::palette::{PALETTE_BYTES, Palette, Transparency, argb_to_rgba, rgba_to_argb};
use crate::pvrz::PageStore;
use crate::utils::ByteSpan;

pub const TIS_SIGNATURE: &[u8; 4] = b"TIS ";
const VERSION: &[u8; 4] = b"V1  ";

pub const HEADER_SIZE: u32 = 24;
/// Edge length of a tile in pixels
pub const TILE_DIMENSION: u32 = 64;
const TILE_PIXELS: usize = (TILE_DIMENSION * TILE_DIMENSION) as usize;
/// Size of a palette tile record
pub const V1_TILE_SIZE: u32 = (PALETTE_BYTES + TILE_PIXELS) as u32;
/// Size of a PVRZ tile record
pub const V2_TILE_SIZE: u32 = 12;
/// V2 page value meaning "solid black tile"
pub const SOLID_BLACK_PAGE: u32 = u32::MAX;

/// A palette-based tile
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TileV1 {
    pub palette: Palette,
    pub indices: Vec<u8>,
}

impl TileV1 {
    #[must_use]
    pub fn pixels(&self) -> Vec<u32> {
        self.palette.indices_to_pixels(&self.indices)
    }

    /// Quantize 64x64 ARGB pixels into a tile
    #[must_use]
    pub fn from_pixels(pixels: &[u32]) -> Self {
        let palette = Palette::quantize(pixels);
        let indices = palette.pixels_to_indices(pixels);
        Self { palette, indices }
    }
}

/// A PVRZ tile reference
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TileV2 {
    pub page: u32,
    pub x: u32,
    pub y: u32,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Tis {
    V1(Vec<TileV1>),
    V2(Vec<TileV2>),
}

impl Tis {
    pub fn from_bytes(data: &[u8]) -> Result<Self> {
        let span = ByteSpan::new(data);
        span.expect_signature("TIS", TIS_SIGNATURE)?;
        let tile_count = span.u32_at(8)? as usize;
        let tile_size = span.u32_at(12)?;
        let header_size = span.u32_at(16)? as usize;
        let dimension = span.u32_at(20)?;
        if dimension != TILE_DIMENSION {
            return Err(Error::invalid("TIS", format!("unsupported tile dimension {dimension}")));
        }
        tracing::debug!("TIS: {tile_count} tiles of {tile_size} bytes");

        match tile_size {
            V1_TILE_SIZE => {
                let tiles = span
                    .records(header_size, tile_count, V1_TILE_SIZE as usize)?
                    .iter()
                    .map(|r| {
                        Ok(TileV1 {
                            palette: Palette::from_bgra(r.slice(0, PALETTE_BYTES)?, Transparency::MagicGreen)?,
                            indices: r.slice(PALETTE_BYTES, TILE_PIXELS)?.to_vec(),
                        })
                    })
                    .collect::<Result<Vec<_>>>()?;
                Ok(Tis::V1(tiles))
            }
            V2_TILE_SIZE => {
                let tiles = span
                    .records(header_size, tile_count, V2_TILE_SIZE as usize)?
                    .iter()
                    .map(|r| {
                        Ok(TileV2 {
                            page: r.u32_at(0)?,
                            x: r.u32_at(4)?,
                            y: r.u32_at(8)?,
                        })
                    })
                    .collect::<Result<Vec<_>>>()?;
                Ok(Tis::V2(tiles))
            }
            other => Err(Error::invalid("TIS", format!("unknown tile size {other}"))),
        }
    }

    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        let (count, tile_size) = match self {
            Tis::V1(tiles) => (tiles.len(), V1_TILE_SIZE),
            Tis::V2(tiles) => (tiles.len(), V2_TILE_SIZE),
        };
        let mut out = Vec::with_capacity(HEADER_SIZE as usize + count * tile_size as usize);
        out.extend_from_slice(TIS_SIGNATURE);
        out.extend_from_slice(VERSION);
        out.write_u32::<LittleEndian>(count as u32)?;
        out.write_u32::<LittleEndian>(tile_size)?;
        out.write_u32::<LittleEndian>(HEADER_SIZE)?;
        out.write_u32::<LittleEndian>(TILE_DIMENSION)?;
        match self {
            Tis::V1(tiles) => {
                for tile in tiles {
                    out.extend_from_slice(&tile.palette.to_bgra());
                    let mut indices = tile.indices.clone();
                    indices.resize(TILE_PIXELS, 0);
                    out.extend_from_slice(&indices);
                }
            }
            Tis::V2(tiles) => {
                for tile in tiles {
                    out.write_u32::<LittleEndian>(tile.page)?;
                    out.write_u32::<LittleEndian>(tile.x)?;
                    out.write_u32::<LittleEndian>(tile.y)?;
                }
            }
        }
        Ok(out)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        match self {
            Tis::V1(tiles) => tiles.len(),
            Tis::V2(tiles) => tiles.len(),
        }
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    #[must_use]
    pub fn version(&self) -> u8 {
        match self {
            Tis::V1(_) => 1,
            Tis::V2(_) => 2,
        }
    }

    /// Render all tiles into one image, `columns` tiles wide
    ///
    /// V2 pages are loaded from `pages` on demand; tiles on the solid black
    /// page render opaque black.
    pub fn to_image(&self, columns: u32, pages: &mut PageStore) -> Result<RgbaImage> {
        let tiles: Vec<RgbaImage> = match self {
            Tis::V1(tiles) => tiles.iter().map(|t| tile_image(&t.pixels())).collect::<Result<_>>()?,
            Tis::V2(tiles) => tiles
                .iter()
                .map(|t| {
                    if t.page == SOLID_BLACK_PAGE {
                        return Ok(RgbaImage::from_pixel(TILE_DIMENSION, TILE_DIMENSION, Rgba([0, 0, 0, 255])));
                    }
                    let page = pages.get(t.page)?;
                    Ok(imageops::crop_imm(&page.image, t.x, t.y, TILE_DIMENSION, TILE_DIMENSION).to_image())
                })
                .collect::<Result<_>>()?,
        };
        Ok(join_tiles(&tiles, columns))
    }
}

fn tile_image(pixels: &[u32]) -> Result<RgbaImage> {
    RgbaImage::from_raw(TILE_DIMENSION, TILE_DIMENSION, argb_to_rgba(pixels)).ok_or(Error::PixelCountMismatch {
        width: TILE_DIMENSION,
        height: TILE_DIMENSION,
        actual: pixels.len(),
    })
}

/// Grid used to lay tiles out in an extracted image
///
/// With the WED's primary overlay size the grid is that wide; tiles beyond
/// the primary grid (alternate door/animation tiles) go into extra rows.
/// Without it the grid is as close to square as possible.
#[must_use]
pub fn tile_grid(tile_count: usize, primary: Option<(u32, u32)>) -> (u32, u32) {
    let count = tile_count as u32;
    let columns = match primary {
        Some((width, _)) if width > 0 => width,
        _ => (f64::from(count).sqrt().ceil() as u32).max(1),
    };
    let mut rows = count.div_ceil(columns);
    if let Some((_, height)) = primary {
        rows = rows.max(height);
    }
    (columns, rows)
}

/// Place tiles row by row into one image
#[must_use]
pub fn join_tiles(tiles: &[RgbaImage], columns: u32) -> RgbaImage {
    let columns = columns.max(1);
    let rows = (tiles.len() as u32).div_ceil(columns);
    let mut image = RgbaImage::new(columns * TILE_DIMENSION, rows * TILE_DIMENSION);
    for (i, tile) in tiles.iter().enumerate() {
        let x = (i as u32 % columns) * TILE_DIMENSION;
        let y = (i as u32 / columns) * TILE_DIMENSION;
        imageops::replace(&mut image, tile, i64::from(x), i64::from(y));
    }
    image
}

/// Cut the first `count` 64x64 tiles out of an image, row by row
pub fn split_tiles(image: &RgbaImage, count: usize) -> Result<Vec<RgbaImage>> {
    let columns = image.width() / TILE_DIMENSION;
    let rows = image.height() / TILE_DIMENSION;
    if (columns * rows) < count as u32 {
        return Err(Error::invalid(
            "TIS",
            format!(
                "image {}x{} holds {} tiles, {count} needed",
                image.width(),
                image.height(),
                columns * rows
            ),
        ));
    }
    Ok((0..count as u32)
        .map(|i| {
            imageops::crop_imm(
                image,
                (i % columns) * TILE_DIMENSION,
                (i / columns) * TILE_DIMENSION,
                TILE_DIMENSION,
                TILE_DIMENSION,
            )
            .to_image()
        })
        .collect())
}

/// Quantize image tiles into a V1 tileset
#[must_use]
pub fn tiles_v1(tiles: &[RgbaImage]) -> Vec<TileV1> {
    tiles.iter().map(|t| TileV1::from_pixels(&rgba_to_argb(t.as_raw()))).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::palette::pack_argb;
    use crate::pvrz::PageSpace;
    use pretty_assertions::assert_eq;

    fn gradient_tile(seed: u8) -> Vec<u32> {
        (0..TILE_PIXELS)
            .map(|i| pack_argb(0xFF, seed, (i % 64) as u8, (i / 64) as u8))
            .collect()
    }

    #[test]
    fn test_v1_round_trip() {
        let tis = Tis::V1(vec![TileV1::from_pixels(&gradient_tile(1)), TileV1::from_pixels(&gradient_tile(2))]);
        let bytes = tis.to_bytes().unwrap();
        assert_eq!(bytes.len(), 24 + 2 * 5120);
        assert_eq!(Tis::from_bytes(&bytes).unwrap(), tis);
    }

    #[test]
    fn test_v2_round_trip_and_black_tiles() {
        let tis = Tis::V2(vec![
            TileV2 { page: 0, x: 64, y: 0 },
            TileV2 {
                page: SOLID_BLACK_PAGE,
                x: 0,
                y: 0,
            },
        ]);
        let bytes = tis.to_bytes().unwrap();
        assert_eq!(u32::from_le_bytes([bytes[12], bytes[13], bytes[14], bytes[15]]), 12);
        assert_eq!(Tis::from_bytes(&bytes).unwrap(), tis);

        let black = Tis::V2(vec![TileV2 {
            page: SOLID_BLACK_PAGE,
            x: 0,
            y: 0,
        }]);
        let mut pages = PageStore::new(".", PageSpace::Tileset("AR0100".into()));
        let image = black.to_image(1, &mut pages).unwrap();
        assert_eq!(image.get_pixel(10, 10), &Rgba([0, 0, 0, 255]));
    }

    #[test]
    fn test_grid_with_extra_rows() {
        assert_eq!(tile_grid(12, Some((4, 3))), (4, 3));
        // Two alternate tiles spill into a fourth row
        assert_eq!(tile_grid(14, Some((4, 3))), (4, 4));
        assert_eq!(tile_grid(10, None), (4, 3));
        assert_eq!(tile_grid(0, None), (1, 0));
    }

    #[test]
    fn test_split_join_inverse() {
        let tiles: Vec<RgbaImage> = (0..5u8)
            .map(|s| tile_image(&gradient_tile(s)).unwrap())
            .collect();
        let image = join_tiles(&tiles, 2);
        assert_eq!(image.dimensions(), (128, 192));
        assert_eq!(split_tiles(&image, 5).unwrap(), tiles);
        assert!(split_tiles(&image, 7).is_err());
    }

    #[test]
    fn test_bad_tile_size() {
        let mut bytes = Tis::V2(vec![]).to_bytes().unwrap();
        bytes[12] = 13;
        assert!(matches!(Tis::from_bytes(&bytes), Err(Error::InvalidFormat { .. })));
    }
}

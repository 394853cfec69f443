//! MOS image container
//!
//! V1 splits the image into 64x64 blocks (smaller at the right and bottom
//! edges), each with its own palette, and may be wrapped in a zlib `MOSC`
//! container. V2 composes the image from PVRZ data blocks.

use byteorder::{LittleEndian, WriteBytesExt};
use image::{RgbaImage, imageops};

use crate::compression::{unwrap_signed, wrap_signed};
use crate::error::{Error, Result};
use crate::palette::{MAGIC_GREEN, PALETTE_BYTES, Palette, Transparency, argb_to_rgba, rgba_to_argb};
use crate::pvrz::{DataBlock, PageStore, compose_frame};
use crate::utils::ByteSpan;

pub const MOS_SIGNATURE: &[u8; 4] = b"MOS ";
pub const MOSC_SIGNATURE: &[u8; 4] = b"MOSC";
const VERSION_1: &[u8; 4] = b"V1  ";
const VERSION_2: &[u8; 4] = b"V2  ";

const HEADER_SIZE: usize = 24;
pub const BLOCK_SIZE: u32 = 64;

/// One palette block of a V1 MOS
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MosBlock {
    pub width: u32,
    pub height: u32,
    pub palette: Palette,
    pub indices: Vec<u8>,
}

/// MOS V1 (palette based)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MosV1 {
    pub width: u16,
    pub height: u16,
    pub columns: u16,
    pub rows: u16,
    /// Blocks in row-major order
    pub blocks: Vec<MosBlock>,
    /// Stored inside a `MOSC` wrapper
    pub compressed: bool,
}

/// Entry 0 holding RGB(0,255,0) marks transparency
fn block_palette(bytes: &[u8]) -> Result<Palette> {
    let mut palette = Palette::from_bgra(bytes, Transparency::None)?;
    if palette.colors[0] & 0x00FF_FFFF == MAGIC_GREEN & 0x00FF_FFFF {
        palette.transparent_index = Some(0);
    }
    Ok(palette)
}

/// Size of the block at (`column`, `row`)
fn block_dimensions(width: u32, height: u32, column: u32, row: u32) -> (u32, u32) {
    (
        (width - column * BLOCK_SIZE).min(BLOCK_SIZE),
        (height - row * BLOCK_SIZE).min(BLOCK_SIZE),
    )
}

impl MosV1 {
    pub fn from_bytes(data: &[u8]) -> Result<Self> {
        let span = ByteSpan::new(data);
        let version = span.expect_signature("MOS", MOS_SIGNATURE)?;
        if &version != VERSION_1 {
            return Err(Error::UnsupportedVersion {
                format: "MOS",
                version: String::from_utf8_lossy(&version).into_owned(),
            });
        }
        let width = span.u16_at(8)?;
        let height = span.u16_at(10)?;
        let columns = span.u16_at(12)?;
        let rows = span.u16_at(14)?;
        let block_size = span.u32_at(16)?;
        let palette_offset = span.u32_at(20)? as usize;
        if block_size != BLOCK_SIZE {
            return Err(Error::invalid("MOS", format!("unsupported block size {block_size}")));
        }
        if u32::from(columns) != u32::from(width).div_ceil(BLOCK_SIZE) || u32::from(rows) != u32::from(height).div_ceil(BLOCK_SIZE) {
            return Err(Error::invalid(
                "MOS",
                format!("{columns}x{rows} blocks do not cover {width}x{height}"),
            ));
        }

        let count = usize::from(columns) * usize::from(rows);
        let offsets_offset = palette_offset + count * PALETTE_BYTES;
        let data_offset = offsets_offset + count * 4;
        let palettes = span.records(palette_offset, count, PALETTE_BYTES)?;
        let offsets = span.records(offsets_offset, count, 4)?;

        let mut blocks = Vec::with_capacity(count);
        for (i, (palette, offset)) in palettes.iter().zip(&offsets).enumerate() {
            let (w, h) = block_dimensions(
                u32::from(width),
                u32::from(height),
                i as u32 % u32::from(columns),
                i as u32 / u32::from(columns),
            );
            let start = data_offset + offset.u32_at(0)? as usize;
            blocks.push(MosBlock {
                width: w,
                height: h,
                palette: block_palette(palette.as_bytes())?,
                indices: span.slice(start, (w * h) as usize)?.to_vec(),
            });
        }
        Ok(Self {
            width,
            height,
            columns,
            rows,
            blocks,
            compressed: false,
        })
    }

    pub fn body_bytes(&self) -> Result<Vec<u8>> {
        let count = self.blocks.len();
        let pixel_total: usize = self.blocks.iter().map(|b| b.indices.len()).sum();
        let mut out = Vec::with_capacity(HEADER_SIZE + count * (PALETTE_BYTES + 4) + pixel_total);
        out.extend_from_slice(MOS_SIGNATURE);
        out.extend_from_slice(VERSION_1);
        out.write_u16::<LittleEndian>(self.width)?;
        out.write_u16::<LittleEndian>(self.height)?;
        out.write_u16::<LittleEndian>(self.columns)?;
        out.write_u16::<LittleEndian>(self.rows)?;
        out.write_u32::<LittleEndian>(BLOCK_SIZE)?;
        out.write_u32::<LittleEndian>(HEADER_SIZE as u32)?;

        for block in &self.blocks {
            out.extend_from_slice(&block.palette.to_bgra());
        }
        let mut offset = 0u32;
        for block in &self.blocks {
            out.write_u32::<LittleEndian>(offset)?;
            offset += block.indices.len() as u32;
        }
        for block in &self.blocks {
            out.extend_from_slice(&block.indices);
        }
        Ok(out)
    }

    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        let body = self.body_bytes()?;
        if self.compressed {
            return wrap_signed(&body, MOSC_SIGNATURE, VERSION_1);
        }
        Ok(body)
    }

    /// Render the full image
    pub fn to_image(&self) -> Result<RgbaImage> {
        let mut image = RgbaImage::new(u32::from(self.width), u32::from(self.height));
        let columns = u32::from(self.columns.max(1));
        for (i, block) in self.blocks.iter().enumerate() {
            let rgba = argb_to_rgba(&block.palette.indices_to_pixels(&block.indices));
            let tile = RgbaImage::from_raw(block.width, block.height, rgba).ok_or(Error::PixelCountMismatch {
                width: block.width,
                height: block.height,
                actual: block.indices.len(),
            })?;
            let x = (i as u32 % columns) * BLOCK_SIZE;
            let y = (i as u32 / columns) * BLOCK_SIZE;
            imageops::replace(&mut image, &tile, i64::from(x), i64::from(y));
        }
        Ok(image)
    }

    /// Split and quantize an image into palette blocks
    pub fn from_image(image: &RgbaImage, compressed: bool) -> Result<Self> {
        let (width, height) = image.dimensions();
        let too_large = || Error::invalid("MOS", format!("{width}x{height} exceeds the V1 size limit"));
        let width16 = u16::try_from(width).map_err(|_| too_large())?;
        let height16 = u16::try_from(height).map_err(|_| too_large())?;
        let columns = width.div_ceil(BLOCK_SIZE);
        let rows = height.div_ceil(BLOCK_SIZE);

        let mut blocks = Vec::with_capacity((columns * rows) as usize);
        for row in 0..rows {
            for column in 0..columns {
                let (w, h) = block_dimensions(width, height, column, row);
                let tile = imageops::crop_imm(image, column * BLOCK_SIZE, row * BLOCK_SIZE, w, h).to_image();
                let pixels = rgba_to_argb(tile.as_raw());
                let palette = Palette::quantize(&pixels);
                let indices = palette.pixels_to_indices(&pixels);
                blocks.push(MosBlock {
                    width: w,
                    height: h,
                    palette,
                    indices,
                });
            }
        }
        Ok(Self {
            width: width16,
            height: height16,
            columns: columns as u16,
            rows: rows as u16,
            blocks,
            compressed,
        })
    }
}

/// MOS V2 (PVRZ based)
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct MosV2 {
    pub width: u32,
    pub height: u32,
    pub blocks: Vec<DataBlock>,
}

impl MosV2 {
    pub fn from_bytes(data: &[u8]) -> Result<Self> {
        let span = ByteSpan::new(data);
        let version = span.expect_signature("MOS", MOS_SIGNATURE)?;
        if &version != VERSION_2 {
            return Err(Error::UnsupportedVersion {
                format: "MOS",
                version: String::from_utf8_lossy(&version).into_owned(),
            });
        }
        let width = span.u32_at(8)?;
        let height = span.u32_at(12)?;
        let count = span.u32_at(16)? as usize;
        let offset = span.u32_at(20)? as usize;
        span.slice(offset, count.saturating_mul(DataBlock::SIZE))?;
        let blocks = (0..count)
            .map(|i| DataBlock::read(&span, offset + i * DataBlock::SIZE))
            .collect::<Result<Vec<_>>>()?;
        Ok(Self { width, height, blocks })
    }

    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        let mut out = Vec::with_capacity(HEADER_SIZE + self.blocks.len() * DataBlock::SIZE);
        out.extend_from_slice(MOS_SIGNATURE);
        out.extend_from_slice(VERSION_2);
        out.write_u32::<LittleEndian>(self.width)?;
        out.write_u32::<LittleEndian>(self.height)?;
        out.write_u32::<LittleEndian>(self.blocks.len() as u32)?;
        out.write_u32::<LittleEndian>(HEADER_SIZE as u32)?;
        for block in &self.blocks {
            block.write(&mut out)?;
        }
        Ok(out)
    }

    pub fn to_image(&self, pages: &mut PageStore) -> Result<RgbaImage> {
        compose_frame(self.width, self.height, &self.blocks, pages)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Mos {
    V1(MosV1),
    V2(MosV2),
}

impl Mos {
    /// Parse a MOS, unwrapping `MOSC` when present
    pub fn from_bytes(data: &[u8]) -> Result<Self> {
        let span = ByteSpan::new(data);
        let signature: [u8; 4] = span.array_at(0)?;
        if &signature == MOSC_SIGNATURE {
            let body = unwrap_signed(data, "MOSC", MOSC_SIGNATURE)?;
            let mut mos = MosV1::from_bytes(&body)?;
            mos.compressed = true;
            return Ok(Mos::V1(mos));
        }
        let version: [u8; 4] = span.array_at(4)?;
        if &version == VERSION_2 {
            return Ok(Mos::V2(MosV2::from_bytes(data)?));
        }
        Ok(Mos::V1(MosV1::from_bytes(data)?))
    }

    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        match self {
            Mos::V1(mos) => mos.to_bytes(),
            Mos::V2(mos) => mos.to_bytes(),
        }
    }

    #[must_use]
    pub fn version(&self) -> u8 {
        match self {
            Mos::V1(_) => 1,
            Mos::V2(_) => 2,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgba;
    use pretty_assertions::assert_eq;

    fn sample_image(width: u32, height: u32) -> RgbaImage {
        RgbaImage::from_fn(width, height, |x, y| {
            if x < 3 && y < 3 {
                Rgba([0, 0, 0, 0])
            } else {
                Rgba([(x * 3) as u8, (y * 5) as u8, 90, 255])
            }
        })
    }

    #[test]
    fn test_v1_partial_edge_blocks() {
        let image = sample_image(100, 70);
        let mos = MosV1::from_image(&image, false).unwrap();
        assert_eq!((mos.columns, mos.rows), (2, 2));
        assert_eq!((mos.blocks[1].width, mos.blocks[1].height), (36, 64));
        assert_eq!((mos.blocks[3].width, mos.blocks[3].height), (36, 6));

        let parsed = MosV1::from_bytes(&mos.to_bytes().unwrap()).unwrap();
        assert_eq!(parsed, mos);
        let rendered = parsed.to_image().unwrap();
        assert_eq!(rendered.get_pixel(0, 0)[3], 0);
        assert_eq!(rendered.get_pixel(99, 69), image.get_pixel(99, 69));
    }

    #[test]
    fn test_mosc_wrapper() {
        let mos = MosV1::from_image(&sample_image(20, 20), true).unwrap();
        let bytes = mos.to_bytes().unwrap();
        assert_eq!(&bytes[0..4], MOSC_SIGNATURE);
        assert_eq!(Mos::from_bytes(&bytes).unwrap(), Mos::V1(mos));
    }

    #[test]
    fn test_v2_round_trip() {
        let mos = MosV2 {
            width: 300,
            height: 200,
            blocks: vec![DataBlock {
                page: 1002,
                source_x: 0,
                source_y: 0,
                width: 300,
                height: 200,
                target_x: 0,
                target_y: 0,
            }],
        };
        let bytes = mos.to_bytes().unwrap();
        assert_eq!(bytes.len(), 24 + 28);
        assert_eq!(Mos::from_bytes(&bytes).unwrap(), Mos::V2(mos));
    }

    #[test]
    fn test_inconsistent_grid_is_rejected() {
        let mut bytes = MosV1::from_image(&sample_image(70, 10), false).unwrap().to_bytes().unwrap();
        bytes[12] = 5;
        assert!(matches!(MosV1::from_bytes(&bytes), Err(Error::InvalidFormat { .. })));
    }
}

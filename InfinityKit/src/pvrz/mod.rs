//! PVRZ texture atlas codec
//!
//! A PVRZ file is a `{size:u32}` + zlib wrapper around a PVR3 texture holding
//! one DXT1 or DXT5 surface. BAM V2, MOS V2 and TIS V2 reference rectangles
//! inside numbered pages through [`DataBlock`]s.

mod dxt;
mod naming;
mod packer;

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use byteorder::{LittleEndian, WriteBytesExt};
use image::{RgbaImage, imageops};

use crate::compression::{unwrap_sized, wrap_sized};
use crate::error::{Error, Result};
use crate::utils::{ByteSpan, find_case_insensitive};

pub use dxt::{DxtFormat, compressed_size, decode as dxt_decode, encode as dxt_encode};
pub use naming::{PageNamer, PageSpace, mos_page_name, tileset_page_name};
pub use packer::{AtlasBlock, AtlasLayout, pack};

/// "PVR\x03"
pub const PVR3_VERSION: u32 = 0x0352_5650;

/// Size of the PVR3 header
pub const PVR3_HEADER_SIZE: usize = 52;

/// PVR3 pixel format identifiers
const PVR_FORMAT_DXT1: u64 = 7;
const PVR_FORMAT_DXT5: u64 = 11;

/// Largest page the engines accept
pub const MAX_PAGE_SIZE: u32 = 1024;

/// A placement of a page rectangle inside a logical frame
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, serde::Serialize, serde::Deserialize)]
pub struct DataBlock {
    pub page: u32,
    pub source_x: u32,
    pub source_y: u32,
    pub width: u32,
    pub height: u32,
    pub target_x: u32,
    pub target_y: u32,
}

impl DataBlock {
    pub const SIZE: usize = 28;

    pub fn read(span: &ByteSpan<'_>, offset: usize) -> Result<Self> {
        Ok(Self {
            page: span.u32_at(offset)?,
            source_x: span.u32_at(offset + 4)?,
            source_y: span.u32_at(offset + 8)?,
            width: span.u32_at(offset + 12)?,
            height: span.u32_at(offset + 16)?,
            target_x: span.u32_at(offset + 20)?,
            target_y: span.u32_at(offset + 24)?,
        })
    }

    pub fn write(&self, out: &mut Vec<u8>) -> Result<()> {
        for v in [
            self.page,
            self.source_x,
            self.source_y,
            self.width,
            self.height,
            self.target_x,
            self.target_y,
        ] {
            out.write_u32::<LittleEndian>(v)?;
        }
        Ok(())
    }
}

/// One decoded atlas page
#[derive(Debug, Clone)]
pub struct PvrzPage {
    pub format: DxtFormat,
    pub image: RgbaImage,
}

impl PvrzPage {
    /// Inflate and block-decode a PVRZ file
    pub fn decode(bytes: &[u8]) -> Result<Self> {
        let pvr = unwrap_sized(bytes)?;
        let span = ByteSpan::new(&pvr);
        let version = span.u32_at(0)?;
        if version != PVR3_VERSION {
            return Err(Error::InvalidSignature {
                format: "PVR",
                found: version.to_le_bytes(),
            });
        }
        let pixel_format = u64::from(span.u32_at(8)?) | (u64::from(span.u32_at(12)?) << 32);
        let format = match pixel_format {
            PVR_FORMAT_DXT1 => DxtFormat::Dxt1,
            PVR_FORMAT_DXT5 => DxtFormat::Dxt5,
            other => return Err(Error::UnsupportedPvrzFormat { format: other }),
        };
        let height = span.u32_at(24)?;
        let width = span.u32_at(28)?;
        let metadata_size = span.u32_at(48)? as usize;
        let data_size = compressed_size(width as usize, height as usize, format);
        let data = span.slice(PVR3_HEADER_SIZE + metadata_size, data_size)?;

        let rgba = dxt_decode(data, width as usize, height as usize, format);
        let image = RgbaImage::from_raw(width, height, rgba).ok_or(Error::PixelCountMismatch {
            width,
            height,
            actual: 0,
        })?;
        Ok(Self { format, image })
    }

    /// Block-encode and deflate into PVRZ bytes
    pub fn encode(&self) -> Result<Vec<u8>> {
        let (width, height) = self.image.dimensions();
        let data = dxt_encode(self.image.as_raw(), width as usize, height as usize, self.format);

        let mut pvr = Vec::with_capacity(PVR3_HEADER_SIZE + data.len());
        pvr.write_u32::<LittleEndian>(PVR3_VERSION)?;
        pvr.write_u32::<LittleEndian>(0)?; // flags
        pvr.write_u64::<LittleEndian>(match self.format {
            DxtFormat::Dxt1 => PVR_FORMAT_DXT1,
            DxtFormat::Dxt5 => PVR_FORMAT_DXT5,
        })?;
        pvr.write_u32::<LittleEndian>(0)?; // colour space
        pvr.write_u32::<LittleEndian>(0)?; // channel type
        pvr.write_u32::<LittleEndian>(height)?;
        pvr.write_u32::<LittleEndian>(width)?;
        for v in [1u32, 1, 1, 1, 0] {
            // depth, surfaces, faces, mip levels, metadata size
            pvr.write_u32::<LittleEndian>(v)?;
        }
        pvr.extend_from_slice(&data);
        wrap_sized(&pvr)
    }
}

/// Lazily loaded pages of one namespace from one directory
#[derive(Debug)]
pub struct PageStore {
    dir: PathBuf,
    space: PageSpace,
    pages: HashMap<u32, PvrzPage>,
}

impl PageStore {
    #[must_use]
    pub fn new(dir: impl AsRef<Path>, space: PageSpace) -> Self {
        Self {
            dir: dir.as_ref().to_path_buf(),
            space,
            pages: HashMap::new(),
        }
    }

    /// Insert an already decoded page (used by tests and by in-memory round trips)
    pub fn insert(&mut self, page: u32, data: PvrzPage) {
        self.pages.insert(page, data);
    }

    pub fn get(&mut self, page: u32) -> Result<&PvrzPage> {
        if !self.pages.contains_key(&page) {
            let name = self.space.page_name(page);
            let path = find_case_insensitive(&self.dir, &name).ok_or_else(|| Error::PvrzPageNotFound {
                page,
                path: self.dir.join(&name),
            })?;
            tracing::debug!("Loading PVRZ page {}", path.display());
            let decoded = PvrzPage::decode(&std::fs::read(&path)?)?;
            self.pages.insert(page, decoded);
        }
        self.pages.get(&page).ok_or_else(|| Error::PvrzPageNotFound {
            page,
            path: self.dir.clone(),
        })
    }

    /// Drop every decoded page and give the memory back
    pub fn release(&mut self) {
        self.pages.clear();
        self.pages.shrink_to_fit();
    }
}

/// Assemble a `width x height` frame from its data blocks
pub fn compose_frame(width: u32, height: u32, blocks: &[DataBlock], store: &mut PageStore) -> Result<RgbaImage> {
    let mut frame = RgbaImage::new(width, height);
    for block in blocks {
        let page = store.get(block.page)?;
        let (pw, ph) = page.image.dimensions();
        if block.source_x + block.width > pw || block.source_y + block.height > ph {
            return Err(Error::OutOfBounds {
                offset: (block.source_y * pw + block.source_x) as usize,
                len: (block.width * block.height) as usize,
                size: (pw * ph) as usize,
            });
        }
        let piece = imageops::crop_imm(&page.image, block.source_x, block.source_y, block.width, block.height).to_image();
        imageops::replace(&mut frame, &piece, i64::from(block.target_x), i64::from(block.target_y));
    }
    Ok(frame)
}

/// Encoded atlas: page files plus the data blocks of every frame
#[derive(Debug, Default)]
pub struct AtlasOutput {
    /// (page number, PVRZ file bytes)
    pub pages: Vec<(u32, Vec<u8>)>,
    /// Data blocks per input frame, in input order
    pub frame_blocks: Vec<Vec<DataBlock>>,
}

/// Pack frames into new pages, allocating page numbers from `namer`
pub fn build_atlas(
    frames: &[RgbaImage],
    space: &PageSpace,
    namer: &PageNamer,
    taken: impl Fn(u32) -> bool,
) -> Result<AtlasOutput> {
    let sizes: Vec<(u32, u32)> = frames.iter().map(RgbaImage::dimensions).collect();
    let layout = pack(&sizes, MAX_PAGE_SIZE);

    let mut canvases: Vec<RgbaImage> = layout.pages.iter().map(|&(w, h)| RgbaImage::new(w, h)).collect();
    let mut output = AtlasOutput {
        pages: Vec::with_capacity(canvases.len()),
        frame_blocks: vec![Vec::new(); frames.len()],
    };
    let numbers: Vec<u32> = (0..canvases.len()).map(|_| namer.allocate(space, &taken)).collect();

    for block in &layout.blocks {
        let piece = imageops::crop_imm(
            &frames[block.source],
            block.source_x,
            block.source_y,
            block.width,
            block.height,
        )
        .to_image();
        imageops::replace(&mut canvases[block.page], &piece, i64::from(block.x), i64::from(block.y));
        output.frame_blocks[block.source].push(DataBlock {
            page: numbers[block.page],
            source_x: block.x,
            source_y: block.y,
            width: block.width,
            height: block.height,
            target_x: block.source_x,
            target_y: block.source_y,
        });
    }

    for (canvas, number) in canvases.into_iter().zip(numbers) {
        let format = DxtFormat::for_pixels(canvas.as_raw());
        let page = PvrzPage { format, image: canvas };
        output.pages.push((number, page.encode()?));
        tracing::debug!("Encoded PVRZ page {} ({:?})", space.page_name(number), format);
    }
    Ok(output)
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgba;

    #[test]
    fn test_page_round_trip() {
        let mut image = RgbaImage::new(8, 4);
        for (x, _, p) in image.enumerate_pixels_mut() {
            *p = if x < 4 { Rgba([255, 0, 0, 255]) } else { Rgba([0, 0, 255, 255]) };
        }
        let page = PvrzPage {
            format: DxtFormat::Dxt1,
            image: image.clone(),
        };
        let decoded = PvrzPage::decode(&page.encode().unwrap()).unwrap();
        assert_eq!(decoded.format, DxtFormat::Dxt1);
        assert_eq!(decoded.image, image);
    }

    #[test]
    fn test_atlas_then_compose() {
        let mut frame = RgbaImage::new(6, 5);
        for p in frame.pixels_mut() {
            *p = Rgba([0, 255, 0, 255]);
        }
        let namer = PageNamer::new(1000);
        let atlas = build_atlas(std::slice::from_ref(&frame), &PageSpace::Mos, &namer, |_| false).unwrap();
        assert_eq!(atlas.pages.len(), 1);
        assert_eq!(atlas.pages[0].0, 1000);

        let mut store = PageStore::new(".", PageSpace::Mos);
        store.insert(1000, PvrzPage::decode(&atlas.pages[0].1).unwrap());
        let rebuilt = compose_frame(6, 5, &atlas.frame_blocks[0], &mut store).unwrap();
        assert_eq!(rebuilt, frame);
    }
}

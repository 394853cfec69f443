//! BAM animation container
//!
//! V1 stores palette-indexed frames, each either raw or sentinel-RLE
//! compressed, plus a frame lookup table (FLT) between cycles and frames. It
//! may be wrapped in a zlib `BAMC` container. V2 places every frame on PVRZ
//! atlas pages through data blocks.

use std::collections::HashMap;

use byteorder::{LittleEndian, WriteBytesExt};
use serde::{Deserialize, Serialize};

use crate::compression::{unwrap_signed, wrap_signed};
use crate::error::{Error, Result};
use crate::palette::{PALETTE_BYTES, Palette, Transparency, rle_decode, rle_encode};
use crate::pvrz::DataBlock;
use crate::utils::{ByteSpan, OffsetIndex};

pub const BAM_SIGNATURE: &[u8; 4] = b"BAM ";
pub const BAMC_SIGNATURE: &[u8; 4] = b"BAMC";
const VERSION_1: &[u8; 4] = b"V1  ";
const VERSION_2: &[u8; 4] = b"V2  ";

const V1_HEADER_SIZE: usize = 24;
const V2_HEADER_SIZE: usize = 32;
const FRAME_ENTRY_SIZE: usize = 12;
const CYCLE_ENTRY_SIZE: usize = 4;

/// Bit 31 of a V1 frame's data offset: the frame is stored raw
const UNCOMPRESSED_FLAG: u32 = 0x8000_0000;

/// Size and anchor of one frame
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct FrameGeometry {
    pub width: u16,
    pub height: u16,
    pub center_x: i16,
    pub center_y: i16,
}

impl FrameGeometry {
    fn read(span: &ByteSpan<'_>) -> Result<Self> {
        Ok(Self {
            width: span.u16_at(0)?,
            height: span.u16_at(2)?,
            center_x: span.i16_at(4)?,
            center_y: span.i16_at(6)?,
        })
    }

    fn write(&self, out: &mut Vec<u8>) -> Result<()> {
        out.write_u16::<LittleEndian>(self.width)?;
        out.write_u16::<LittleEndian>(self.height)?;
        out.write_i16::<LittleEndian>(self.center_x)?;
        out.write_i16::<LittleEndian>(self.center_y)?;
        Ok(())
    }

    #[must_use]
    pub fn pixel_count(&self) -> usize {
        usize::from(self.width) * usize::from(self.height)
    }
}

/// A cycle entry: `frame_count` consecutive entries starting at `first`
///
/// In V1 `first` indexes the FLT; in V2 it is a frame index.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Cycle {
    pub frame_count: u16,
    pub first: u16,
}

impl Cycle {
    fn read(span: &ByteSpan<'_>) -> Result<Self> {
        Ok(Self {
            frame_count: span.u16_at(0)?,
            first: span.u16_at(2)?,
        })
    }

    fn write(&self, out: &mut Vec<u8>) -> Result<()> {
        out.write_u16::<LittleEndian>(self.frame_count)?;
        out.write_u16::<LittleEndian>(self.first)?;
        Ok(())
    }

    fn end(&self) -> usize {
        usize::from(self.first) + usize::from(self.frame_count)
    }
}

/// Flatten per-cycle frame lists into cycle entries plus a lookup table
#[must_use]
pub fn cycles_to_table(cycles: &[Vec<u16>]) -> (Vec<Cycle>, Vec<u16>) {
    let mut table = Vec::new();
    let entries = cycles
        .iter()
        .map(|frames| {
            let cycle = Cycle {
                frame_count: frames.len() as u16,
                first: table.len() as u16,
            };
            table.extend_from_slice(frames);
            cycle
        })
        .collect();
    (entries, table)
}

/// One V1 frame with its stored payload
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FrameV1 {
    pub geometry: FrameGeometry,
    /// Payload is sentinel-RLE encoded
    pub rle: bool,
    pub data: Vec<u8>,
}

impl FrameV1 {
    /// Palette indices of the frame
    pub fn indices(&self, sentinel: u8) -> Result<Vec<u8>> {
        let count = self.geometry.pixel_count();
        if self.rle {
            return rle_decode(&self.data, sentinel, count);
        }
        Ok(ByteSpan::new(&self.data).slice(0, count)?.to_vec())
    }
}

/// BAM V1 (palette based)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BamV1 {
    /// Palette index used as the RLE sentinel
    pub compressed_color: u8,
    pub frames: Vec<FrameV1>,
    pub cycles: Vec<Cycle>,
    pub palette: Palette,
    /// Frame lookup table
    pub flt: Vec<u16>,
    /// Stored inside a `BAMC` wrapper
    pub compressed: bool,
}

impl BamV1 {
    /// Parse an uncompressed V1 body
    pub fn from_bytes(data: &[u8]) -> Result<Self> {
        let span = ByteSpan::new(data);
        let version = span.expect_signature("BAM", BAM_SIGNATURE)?;
        if &version != VERSION_1 {
            return Err(Error::UnsupportedVersion {
                format: "BAM",
                version: String::from_utf8_lossy(&version).into_owned(),
            });
        }

        let frame_count = span.u16_at(8)? as usize;
        let cycle_count = span.u8_at(10)? as usize;
        let compressed_color = span.u8_at(11)?;
        let frames_offset = span.u32_at(12)? as usize;
        let palette_offset = span.u32_at(16)? as usize;
        let flt_offset = span.u32_at(20)? as usize;
        tracing::debug!("BAM V1: {frame_count} frames, {cycle_count} cycles");

        let entries = span.records(frames_offset, frame_count, FRAME_ENTRY_SIZE)?;
        let cycles = span
            .records(frames_offset + frame_count * FRAME_ENTRY_SIZE, cycle_count, CYCLE_ENTRY_SIZE)?
            .iter()
            .map(Cycle::read)
            .collect::<Result<Vec<_>>>()?;

        let mut palette = Palette::from_bgra(span.slice(palette_offset, PALETTE_BYTES)?, Transparency::MagicGreen)?;
        if palette.transparent_index.is_none() {
            palette.transparent_index = Some(0);
        }

        let flt_len = cycles.iter().map(Cycle::end).max().unwrap_or(0);
        let flt = span
            .records(flt_offset, flt_len, 2)?
            .iter()
            .map(|r| r.u16_at(0))
            .collect::<Result<Vec<_>>>()?;

        let mut index = OffsetIndex::new(data.len());
        for offset in [frames_offset, palette_offset, flt_offset] {
            index.push(offset);
        }
        let raw_offsets = entries.iter().map(|e| e.u32_at(8)).collect::<Result<Vec<_>>>()?;
        for raw in &raw_offsets {
            index.push((raw & !UNCOMPRESSED_FLAG) as usize);
        }
        index.sort();

        let mut frames = Vec::with_capacity(frame_count);
        for (entry, raw) in entries.iter().zip(raw_offsets) {
            let geometry = FrameGeometry::read(entry)?;
            let rle = raw & UNCOMPRESSED_FLAG == 0;
            let offset = (raw & !UNCOMPRESSED_FLAG) as usize;
            let len = if rle { index.length_from(offset) } else { geometry.pixel_count() };
            let data = if len == 0 { Vec::new() } else { span.slice(offset, len)?.to_vec() };
            frames.push(FrameV1 { geometry, rle, data });
        }

        Ok(Self {
            compressed_color,
            frames,
            cycles,
            palette,
            flt,
            compressed: false,
        })
    }

    /// Serialize the uncompressed V1 body
    ///
    /// Identical payloads are stored once and shared by their frames.
    pub fn body_bytes(&self) -> Result<Vec<u8>> {
        let frame_count = u16::try_from(self.frames.len())
            .map_err(|_| Error::invalid("BAM", format!("{} frames exceed the V1 limit", self.frames.len())))?;
        let cycle_count = u8::try_from(self.cycles.len())
            .map_err(|_| Error::invalid("BAM", format!("{} cycles exceed the V1 limit", self.cycles.len())))?;

        let frames_offset = V1_HEADER_SIZE;
        let palette_offset = frames_offset + self.frames.len() * FRAME_ENTRY_SIZE + self.cycles.len() * CYCLE_ENTRY_SIZE;
        let flt_offset = palette_offset + PALETTE_BYTES;
        let data_offset = flt_offset + self.flt.len() * 2;

        let mut payload = Vec::new();
        let mut shared: HashMap<(bool, &[u8]), usize> = HashMap::new();
        let mut offsets = Vec::with_capacity(self.frames.len());
        for frame in &self.frames {
            let offset = *shared.entry((frame.rle, frame.data.as_slice())).or_insert_with(|| {
                let offset = data_offset + payload.len();
                payload.extend_from_slice(&frame.data);
                offset
            });
            offsets.push(offset);
        }

        let mut out = Vec::with_capacity(data_offset + payload.len());
        out.extend_from_slice(BAM_SIGNATURE);
        out.extend_from_slice(VERSION_1);
        out.write_u16::<LittleEndian>(frame_count)?;
        out.write_u8(cycle_count)?;
        out.write_u8(self.compressed_color)?;
        out.write_u32::<LittleEndian>(frames_offset as u32)?;
        out.write_u32::<LittleEndian>(palette_offset as u32)?;
        out.write_u32::<LittleEndian>(flt_offset as u32)?;

        for (frame, offset) in self.frames.iter().zip(offsets) {
            frame.geometry.write(&mut out)?;
            let flag = if frame.rle { 0 } else { UNCOMPRESSED_FLAG };
            out.write_u32::<LittleEndian>(offset as u32 | flag)?;
        }
        for cycle in &self.cycles {
            cycle.write(&mut out)?;
        }
        out.extend_from_slice(&self.palette.to_bgra());
        for &entry in &self.flt {
            out.write_u16::<LittleEndian>(entry)?;
        }
        out.extend_from_slice(&payload);
        Ok(out)
    }

    /// Serialize, applying the `BAMC` wrapper when [`Self::compressed`] is set
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        let body = self.body_bytes()?;
        if self.compressed {
            return wrap_signed(&body, BAMC_SIGNATURE, VERSION_1);
        }
        Ok(body)
    }

    /// ARGB pixels of one frame
    pub fn frame_pixels(&self, frame: usize) -> Result<Vec<u32>> {
        let entry = self
            .frames
            .get(frame)
            .ok_or_else(|| Error::invalid("BAM", format!("frame {frame} out of range")))?;
        Ok(self.palette.indices_to_pixels(&entry.indices(self.compressed_color)?))
    }

    /// Frame indices of every cycle, resolved through the FLT
    #[must_use]
    pub fn cycle_frames(&self) -> Vec<Vec<u16>> {
        self.cycles
            .iter()
            .map(|c| {
                let start = usize::from(c.first).min(self.flt.len());
                let end = c.end().min(self.flt.len());
                self.flt[start..end].to_vec()
            })
            .collect()
    }

    /// Build a V1 BAM from ARGB frames
    ///
    /// `palette` is reused when given (nearest-neighbour upscaling never
    /// introduces colours), otherwise one is quantized from all frames with
    /// index 0 kept as the magic-green sentinel. Each frame is RLE encoded
    /// only when that makes it smaller.
    #[must_use]
    pub fn from_frames(
        frames: &[(FrameGeometry, Vec<u32>)],
        cycles: &[Vec<u16>],
        palette: Option<Palette>,
        compressed: bool,
    ) -> Self {
        let palette = palette.unwrap_or_else(|| {
            let all: Vec<u32> = frames.iter().flat_map(|(_, p)| p.iter().copied()).collect();
            Palette::quantize_with_sentinel(&all)
        });
        let sentinel = palette.transparent_index.unwrap_or(0);

        let frames = frames
            .iter()
            .map(|(geometry, pixels)| {
                let indices = palette.pixels_to_indices(pixels);
                let encoded = rle_encode(&indices, sentinel);
                if encoded.len() < indices.len() {
                    FrameV1 {
                        geometry: *geometry,
                        rle: true,
                        data: encoded,
                    }
                } else {
                    FrameV1 {
                        geometry: *geometry,
                        rle: false,
                        data: indices,
                    }
                }
            })
            .collect();
        let (cycles, flt) = cycles_to_table(cycles);

        Self {
            compressed_color: sentinel,
            frames,
            cycles,
            palette,
            flt,
            compressed,
        }
    }
}

/// One V2 frame: a run of data blocks
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct FrameV2 {
    pub geometry: FrameGeometry,
    pub first_block: u16,
    pub block_count: u16,
}

/// BAM V2 (PVRZ based)
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct BamV2 {
    pub frames: Vec<FrameV2>,
    pub cycles: Vec<Cycle>,
    pub blocks: Vec<DataBlock>,
}

impl BamV2 {
    pub fn from_bytes(data: &[u8]) -> Result<Self> {
        let span = ByteSpan::new(data);
        let version = span.expect_signature("BAM", BAM_SIGNATURE)?;
        if &version != VERSION_2 {
            return Err(Error::UnsupportedVersion {
                format: "BAM",
                version: String::from_utf8_lossy(&version).into_owned(),
            });
        }
        let frame_count = span.u32_at(8)? as usize;
        let cycle_count = span.u32_at(12)? as usize;
        let block_count = span.u32_at(16)? as usize;
        let frames_offset = span.u32_at(20)? as usize;
        let cycles_offset = span.u32_at(24)? as usize;
        let blocks_offset = span.u32_at(28)? as usize;

        let frames = span
            .records(frames_offset, frame_count, FRAME_ENTRY_SIZE)?
            .iter()
            .map(|r| {
                Ok(FrameV2 {
                    geometry: FrameGeometry::read(r)?,
                    first_block: r.u16_at(8)?,
                    block_count: r.u16_at(10)?,
                })
            })
            .collect::<Result<Vec<_>>>()?;
        let cycles = span
            .records(cycles_offset, cycle_count, CYCLE_ENTRY_SIZE)?
            .iter()
            .map(Cycle::read)
            .collect::<Result<Vec<_>>>()?;
        let blocks = (0..block_count)
            .map(|i| DataBlock::read(&span, blocks_offset + i * DataBlock::SIZE))
            .collect::<Result<Vec<_>>>()?;

        for frame in &frames {
            let end = usize::from(frame.first_block) + usize::from(frame.block_count);
            if end > blocks.len() {
                return Err(Error::invalid(
                    "BAM",
                    format!("frame references blocks up to {end}, only {} present", blocks.len()),
                ));
            }
        }
        Ok(Self { frames, cycles, blocks })
    }

    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        let frames_offset = V2_HEADER_SIZE;
        let cycles_offset = frames_offset + self.frames.len() * FRAME_ENTRY_SIZE;
        let blocks_offset = cycles_offset + self.cycles.len() * CYCLE_ENTRY_SIZE;

        let mut out = Vec::with_capacity(blocks_offset + self.blocks.len() * DataBlock::SIZE);
        out.extend_from_slice(BAM_SIGNATURE);
        out.extend_from_slice(VERSION_2);
        for v in [
            self.frames.len(),
            self.cycles.len(),
            self.blocks.len(),
            frames_offset,
            cycles_offset,
            blocks_offset,
        ] {
            out.write_u32::<LittleEndian>(v as u32)?;
        }
        for frame in &self.frames {
            frame.geometry.write(&mut out)?;
            out.write_u16::<LittleEndian>(frame.first_block)?;
            out.write_u16::<LittleEndian>(frame.block_count)?;
        }
        for cycle in &self.cycles {
            cycle.write(&mut out)?;
        }
        for block in &self.blocks {
            block.write(&mut out)?;
        }
        Ok(out)
    }

    /// Data blocks of one frame
    #[must_use]
    pub fn frame_blocks(&self, frame: usize) -> &[DataBlock] {
        self.frames.get(frame).map_or(&[], |f| {
            let start = usize::from(f.first_block).min(self.blocks.len());
            let end = (start + usize::from(f.block_count)).min(self.blocks.len());
            &self.blocks[start..end]
        })
    }

    /// Frame indices of every cycle
    #[must_use]
    pub fn cycle_frames(&self) -> Vec<Vec<u16>> {
        self.cycles
            .iter()
            .map(|c| (c.first..c.first.saturating_add(c.frame_count)).collect())
            .collect()
    }

    /// Build from frame geometry, per-frame blocks and cycle frame lists
    #[must_use]
    pub fn from_blocks(geometry: &[FrameGeometry], frame_blocks: Vec<Vec<DataBlock>>, cycles: &[Vec<u16>]) -> Self {
        let mut blocks = Vec::new();
        let frames = geometry
            .iter()
            .zip(frame_blocks)
            .map(|(g, list)| {
                let frame = FrameV2 {
                    geometry: *g,
                    first_block: blocks.len() as u16,
                    block_count: list.len() as u16,
                };
                blocks.extend(list);
                frame
            })
            .collect();
        // V2 cycles address frames directly, so every cycle must be a contiguous run
        let cycles = cycles
            .iter()
            .map(|frames| Cycle {
                frame_count: frames.len() as u16,
                first: frames.first().copied().unwrap_or(0),
            })
            .collect();
        Self { frames, cycles, blocks }
    }
}

/// A parsed BAM of either version
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Bam {
    V1(BamV1),
    V2(BamV2),
}

impl Bam {
    /// Parse a BAM, unwrapping `BAMC` when present
    pub fn from_bytes(data: &[u8]) -> Result<Self> {
        let span = ByteSpan::new(data);
        let signature: [u8; 4] = span.array_at(0)?;
        if &signature == BAMC_SIGNATURE {
            let body = unwrap_signed(data, "BAMC", BAMC_SIGNATURE)?;
            let mut bam = BamV1::from_bytes(&body)?;
            bam.compressed = true;
            return Ok(Bam::V1(bam));
        }
        let version: [u8; 4] = span.array_at(4)?;
        if &version == VERSION_2 {
            return Ok(Bam::V2(BamV2::from_bytes(data)?));
        }
        Ok(Bam::V1(BamV1::from_bytes(data)?))
    }

    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        match self {
            Bam::V1(bam) => bam.to_bytes(),
            Bam::V2(bam) => bam.to_bytes(),
        }
    }

    #[must_use]
    pub fn version(&self) -> u8 {
        match self {
            Bam::V1(_) => 1,
            Bam::V2(_) => 2,
        }
    }

    /// Frame geometry in frame order
    #[must_use]
    pub fn geometry(&self) -> Vec<FrameGeometry> {
        match self {
            Bam::V1(bam) => bam.frames.iter().map(|f| f.geometry).collect(),
            Bam::V2(bam) => bam.frames.iter().map(|f| f.geometry).collect(),
        }
    }

    #[must_use]
    pub fn cycle_frames(&self) -> Vec<Vec<u16>> {
        match self {
            Bam::V1(bam) => bam.cycle_frames(),
            Bam::V2(bam) => bam.cycle_frames(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::palette::{MAGIC_GREEN, alpha, pack_argb};
    use pretty_assertions::assert_eq;

    /// Hand-built V1 file: one 2x2 raw frame of sentinel pixels, one cycle, FLT [0]
    fn minimal_v1() -> Vec<u8> {
        let mut out = Vec::new();
        out.extend_from_slice(b"BAM V1  ");
        out.extend_from_slice(&1u16.to_le_bytes());
        out.push(1); // cycles
        out.push(0); // compressed colour
        out.extend_from_slice(&24u32.to_le_bytes()); // frame entries
        out.extend_from_slice(&40u32.to_le_bytes()); // palette
        out.extend_from_slice(&1064u32.to_le_bytes()); // FLT
        // frame entry
        out.extend_from_slice(&2u16.to_le_bytes());
        out.extend_from_slice(&2u16.to_le_bytes());
        out.extend_from_slice(&0i16.to_le_bytes());
        out.extend_from_slice(&0i16.to_le_bytes());
        out.extend_from_slice(&(1066u32 | UNCOMPRESSED_FLAG).to_le_bytes());
        // cycle entry
        out.extend_from_slice(&1u16.to_le_bytes());
        out.extend_from_slice(&0u16.to_le_bytes());
        // palette: index 0 magic green
        let mut palette = vec![0u8; PALETTE_BYTES];
        palette[1] = 255;
        out.extend_from_slice(&palette);
        out.extend_from_slice(&0u16.to_le_bytes());
        out.extend_from_slice(&[0, 0, 0, 0]);
        out
    }

    #[test]
    fn test_minimal_frame_is_transparent() {
        let bam = Bam::from_bytes(&minimal_v1()).unwrap();
        let Bam::V1(bam) = bam else {
            panic!("expected V1");
        };
        assert_eq!(bam.frames.len(), 1);
        assert_eq!(bam.cycle_frames(), vec![vec![0]]);
        let pixels = bam.frame_pixels(0).unwrap();
        assert_eq!(pixels.len(), 4);
        assert!(pixels.iter().all(|&p| alpha(p) == 0));
    }

    #[test]
    fn test_minimal_v1_rewrites_identically() {
        let data = minimal_v1();
        let bam = BamV1::from_bytes(&data).unwrap();
        assert_eq!(bam.to_bytes().unwrap(), data);
    }

    fn sample_frames() -> Vec<(FrameGeometry, Vec<u32>)> {
        let red = pack_argb(0xFF, 200, 10, 10);
        let blue = pack_argb(0xFF, 10, 10, 200);
        let sparse: Vec<u32> = (0..64).map(|i| if i % 9 == 0 { red } else { 0 }).collect();
        let dense: Vec<u32> = (0..16).map(|i| if i % 2 == 0 { red } else { blue }).collect();
        vec![
            (
                FrameGeometry {
                    width: 8,
                    height: 8,
                    center_x: 4,
                    center_y: -2,
                },
                sparse,
            ),
            (
                FrameGeometry {
                    width: 4,
                    height: 4,
                    center_x: 0,
                    center_y: 0,
                },
                dense.clone(),
            ),
            (
                FrameGeometry {
                    width: 4,
                    height: 4,
                    center_x: 0,
                    center_y: 0,
                },
                dense,
            ),
        ]
    }

    #[test]
    fn test_from_frames_round_trip() {
        let frames = sample_frames();
        let bam = BamV1::from_frames(&frames, &[vec![0, 1], vec![2]], None, false);
        assert!(bam.frames[0].rle);
        assert!(!bam.frames[1].rle);

        let bytes = bam.to_bytes().unwrap();
        let parsed = BamV1::from_bytes(&bytes).unwrap();
        assert_eq!(parsed.cycle_frames(), vec![vec![0, 1], vec![2]]);
        for (i, (_, pixels)) in frames.iter().enumerate() {
            assert_eq!(&parsed.frame_pixels(i).unwrap(), pixels);
        }
        // Frames 1 and 2 share one payload
        assert_eq!(parsed.to_bytes().unwrap(), bytes);
    }

    #[test]
    fn test_opaque_frame_keeps_every_colour() {
        let geometry = FrameGeometry {
            width: 2,
            height: 2,
            ..FrameGeometry::default()
        };
        let pixels = vec![0xFFC8_0A0A, 0xFF0A_0AC8, 0xFFC8_0A0A, 0xFF0A_0AC8];
        let bam = BamV1::from_frames(&[(geometry, pixels.clone())], &[vec![0]], None, false);
        assert_eq!(bam.palette.colors[0], MAGIC_GREEN);

        let parsed = BamV1::from_bytes(&bam.to_bytes().unwrap()).unwrap();
        assert_eq!(parsed.palette.transparent_index, Some(0));
        assert_eq!(parsed.frame_pixels(0).unwrap(), pixels);
    }

    #[test]
    fn test_bamc_wrapper() {
        let mut bam = BamV1::from_frames(&sample_frames(), &[vec![0]], None, true);
        bam.palette.colors[0] = MAGIC_GREEN;
        let bytes = bam.to_bytes().unwrap();
        assert_eq!(&bytes[0..4], BAMC_SIGNATURE);
        let Bam::V1(parsed) = Bam::from_bytes(&bytes).unwrap() else {
            panic!("expected V1");
        };
        assert!(parsed.compressed);
        assert_eq!(parsed.frames, bam.frames);
    }

    #[test]
    fn test_v2_round_trip() {
        let block = DataBlock {
            page: 1000,
            source_x: 0,
            source_y: 0,
            width: 8,
            height: 8,
            target_x: 0,
            target_y: 0,
        };
        let geometry = [FrameGeometry {
            width: 8,
            height: 8,
            center_x: 1,
            center_y: 2,
        }; 2];
        let bam = BamV2::from_blocks(&geometry, vec![vec![block], vec![block, block]], &[vec![0, 1]]);
        let parsed = Bam::from_bytes(&bam.to_bytes().unwrap()).unwrap();
        assert_eq!(parsed, Bam::V2(bam.clone()));
        assert_eq!(bam.frame_blocks(1).len(), 2);
        assert_eq!(parsed.cycle_frames(), vec![vec![0, 1]]);
    }

    #[test]
    fn test_truncated_input_is_an_error() {
        let data = minimal_v1();
        assert!(BamV1::from_bytes(&data[..30]).is_err());
        assert!(matches!(
            Bam::from_bytes(b"BAM V9  "),
            Err(Error::UnsupportedVersion { .. } | Error::OutOfBounds { .. })
        ));
        assert!(matches!(Bam::from_bytes(b"XXXXV1  "), Err(Error::InvalidSignature { .. })));
    }
}

//! Interplay MVE movie container
//!
//! The stream is a sequence of chunks, each a sequence of typed opcodes.
//! Walking it is enough to recover the video geometry, frame count and
//! palette; frame pixels are not decoded.

use byteorder::{LittleEndian, WriteBytesExt};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::utils::ByteSpan;

pub const MVE_SIGNATURE: &[u8; 20] = b"Interplay MVE File\x1A\0";
const MAGIC: [u16; 3] = [0x001A, 0x0100, 0x1133];
const HEADER_SIZE: usize = 26;

pub mod chunk_type {
    pub const INIT_AUDIO: u16 = 0;
    pub const AUDIO: u16 = 1;
    pub const INIT_VIDEO: u16 = 2;
    pub const VIDEO: u16 = 3;
    pub const SHUTDOWN: u16 = 4;
    pub const END: u16 = 5;
}

pub mod opcode {
    pub const END_OF_STREAM: u8 = 0x00;
    pub const END_OF_CHUNK: u8 = 0x01;
    pub const CREATE_TIMER: u8 = 0x02;
    pub const INIT_AUDIO_BUFFERS: u8 = 0x03;
    pub const INIT_VIDEO_BUFFERS: u8 = 0x05;
    pub const SEND_BUFFER: u8 = 0x07;
    pub const AUDIO_FRAME: u8 = 0x08;
    pub const INIT_VIDEO_MODE: u8 = 0x0A;
    pub const SET_PALETTE: u8 = 0x0C;
    pub const VIDEO_DATA: u8 = 0x11;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Opcode {
    pub kind: u8,
    pub version: u8,
    pub data: Vec<u8>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Chunk {
    pub chunk_type: u16,
    pub opcodes: Vec<Opcode>,
}

/// What a walk over the stream found
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct MveInfo {
    pub width: u32,
    pub height: u32,
    pub frame_count: u32,
    /// Microseconds per frame
    pub frame_duration: u32,
    pub has_audio: bool,
    pub chunk_count: usize,
    /// Last palette set, expanded to 8-bit RGB
    #[serde(skip)]
    pub palette: Vec<[u8; 3]>,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Mve {
    pub chunks: Vec<Chunk>,
}

impl Mve {
    pub fn from_bytes(data: &[u8]) -> Result<Self> {
        let span = ByteSpan::new(data);
        if span.slice(0, MVE_SIGNATURE.len())? != MVE_SIGNATURE {
            return Err(Error::InvalidSignature {
                format: "MVE",
                found: span.array_at::<4>(0)?,
            });
        }
        for (i, expected) in MAGIC.iter().enumerate() {
            if span.u16_at(20 + i * 2)? != *expected {
                return Err(Error::invalid("MVE", "bad header magic"));
            }
        }

        let mut chunks = Vec::new();
        let mut pos = HEADER_SIZE;
        while pos + 4 <= span.len() {
            let length = usize::from(span.u16_at(pos)?);
            let kind = span.u16_at(pos + 2)?;
            let body = ByteSpan::new(span.slice(pos + 4, length)?);
            pos += 4 + length;

            let mut opcodes = Vec::new();
            let mut at = 0;
            while at + 4 <= body.len() {
                let len = usize::from(body.u16_at(at)?);
                let kind = body.u8_at(at + 2)?;
                let version = body.u8_at(at + 3)?;
                let data = body.slice(at + 4, len)?.to_vec();
                at += 4 + len;
                opcodes.push(Opcode { kind, version, data });
            }
            if at != body.len() {
                return Err(Error::invalid("MVE", format!("trailing bytes in chunk at {pos}")));
            }
            let end = kind == chunk_type::END || opcodes.iter().any(|o| o.kind == opcode::END_OF_STREAM);
            chunks.push(Chunk {
                chunk_type: kind,
                opcodes,
            });
            if end {
                break;
            }
        }
        tracing::debug!("MVE: {} chunks", chunks.len());
        Ok(Self { chunks })
    }

    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        let mut out = Vec::new();
        out.extend_from_slice(MVE_SIGNATURE);
        for v in MAGIC {
            out.write_u16::<LittleEndian>(v)?;
        }
        for chunk in &self.chunks {
            let length: usize = chunk.opcodes.iter().map(|o| 4 + o.data.len()).sum();
            let length = u16::try_from(length).map_err(|_| Error::invalid("MVE", "chunk larger than 64 KiB"))?;
            out.write_u16::<LittleEndian>(length)?;
            out.write_u16::<LittleEndian>(chunk.chunk_type)?;
            for op in &chunk.opcodes {
                out.write_u16::<LittleEndian>(op.data.len() as u16)?;
                out.push(op.kind);
                out.push(op.version);
                out.extend_from_slice(&op.data);
            }
        }
        Ok(out)
    }

    pub fn info(&self) -> Result<MveInfo> {
        let mut info = MveInfo {
            chunk_count: self.chunks.len(),
            ..MveInfo::default()
        };
        for op in self.chunks.iter().flat_map(|c| &c.opcodes) {
            let data = ByteSpan::new(&op.data);
            match op.kind {
                opcode::CREATE_TIMER => {
                    let rate = data.u32_at(0)?;
                    let subdivision = u32::from(data.u16_at(4)?);
                    info.frame_duration = rate.saturating_mul(subdivision);
                }
                opcode::INIT_AUDIO_BUFFERS => info.has_audio = true,
                opcode::INIT_VIDEO_BUFFERS => {
                    // Dimensions are in 8x8 blocks
                    info.width = u32::from(data.u16_at(0)?) * 8;
                    info.height = u32::from(data.u16_at(2)?) * 8;
                }
                opcode::SEND_BUFFER => info.frame_count += 1,
                opcode::SET_PALETTE => {
                    let start = usize::from(data.u16_at(0)?);
                    let count = usize::from(data.u16_at(2)?);
                    let rgb = data.slice(4, count * 3)?;
                    if info.palette.len() < 256 {
                        info.palette.resize(256, [0; 3]);
                    }
                    for (i, c) in rgb.chunks_exact(3).enumerate() {
                        if let Some(slot) = info.palette.get_mut(start + i) {
                            // 6-bit VGA components
                            *slot = [c[0], c[1], c[2]].map(|v| (v << 2) | (v >> 4));
                        }
                    }
                }
                _ => {}
            }
        }
        Ok(info)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn op(kind: u8, data: Vec<u8>) -> Opcode {
        Opcode { kind, version: 0, data }
    }

    fn sample() -> Mve {
        let mut timer = 66_728u32.to_le_bytes().to_vec();
        timer.extend_from_slice(&1u16.to_le_bytes());
        let mut buffers = Vec::new();
        for v in [80u16, 60, 1] {
            buffers.extend_from_slice(&v.to_le_bytes());
        }
        let mut palette = vec![0u8, 0, 2, 0];
        palette.extend_from_slice(&[63, 0, 0, 0, 63, 0]);
        Mve {
            chunks: vec![
                Chunk {
                    chunk_type: chunk_type::INIT_VIDEO,
                    opcodes: vec![
                        op(opcode::CREATE_TIMER, timer),
                        op(opcode::INIT_VIDEO_BUFFERS, buffers),
                        op(opcode::END_OF_CHUNK, vec![]),
                    ],
                },
                Chunk {
                    chunk_type: chunk_type::VIDEO,
                    opcodes: vec![
                        op(opcode::SET_PALETTE, palette),
                        op(opcode::VIDEO_DATA, vec![9; 12]),
                        op(opcode::SEND_BUFFER, vec![0; 6]),
                        op(opcode::END_OF_CHUNK, vec![]),
                    ],
                },
                Chunk {
                    chunk_type: chunk_type::VIDEO,
                    opcodes: vec![op(opcode::SEND_BUFFER, vec![0; 6]), op(opcode::END_OF_CHUNK, vec![])],
                },
                Chunk {
                    chunk_type: chunk_type::SHUTDOWN,
                    opcodes: vec![op(opcode::END_OF_STREAM, vec![])],
                },
            ],
        }
    }

    #[test]
    fn test_walk_and_round_trip() {
        let mve = sample();
        let bytes = mve.to_bytes().unwrap();
        assert!(bytes.starts_with(b"Interplay MVE File"));
        let parsed = Mve::from_bytes(&bytes).unwrap();
        assert_eq!(parsed, mve);
        assert_eq!(parsed.to_bytes().unwrap(), bytes);
    }

    #[test]
    fn test_info() {
        let info = sample().info().unwrap();
        assert_eq!((info.width, info.height), (640, 480));
        assert_eq!(info.frame_count, 2);
        assert_eq!(info.frame_duration, 66_728);
        assert!(!info.has_audio);
        assert_eq!(info.palette[0], [255, 0, 0]);
        assert_eq!(info.palette[1], [0, 255, 0]);
        assert_eq!(info.palette[2], [0, 0, 0]);
    }

    #[test]
    fn test_truncated_chunk() {
        let bytes = sample().to_bytes().unwrap();
        assert!(Mve::from_bytes(&bytes[..HEADER_SIZE + 10]).is_err());
    }

    #[test]
    fn test_bad_signature() {
        let mut bytes = sample().to_bytes().unwrap();
        bytes[0] = b'X';
        assert!(matches!(Mve::from_bytes(&bytes), Err(Error::InvalidSignature { .. })));
    }
}

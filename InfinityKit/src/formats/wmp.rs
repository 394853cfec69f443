//! WMP world map container
//!
//! Each world map owns its areas and the travel links between them. Entry
//! records are kept whole; only counts, offsets and coordinates are rewritten.

use byteorder::{LittleEndian, WriteBytesExt};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::utils::{ByteSpan, patch_u32, read_resref, resref_bytes};

pub const WMP_SIGNATURE: &[u8; 4] = b"WMAP";
pub const WMP_VERSION: &[u8; 4] = b"V1.0";

const HEADER_SIZE: usize = 0x10;
pub const WORLDMAP_SIZE: usize = 0xB8;
pub const AREA_SIZE: usize = 0xF0;
pub const LINK_SIZE: usize = 0xD8;

mod worldmap_field {
    pub const WIDTH: usize = 0x08;
    pub const HEIGHT: usize = 0x0C;
    pub const START_X: usize = 0x18;
    pub const START_Y: usize = 0x1C;
    pub const AREA_COUNT: usize = 0x20;
    pub const AREA_OFFSET: usize = 0x24;
    pub const LINK_OFFSET: usize = 0x28;
    pub const LINK_COUNT: usize = 0x2C;
}

mod area_field {
    pub const X: usize = 0x38;
    pub const Y: usize = 0x3C;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Worldmap {
    record: Vec<u8>,
    pub areas: Vec<Area>,
    pub links: Vec<Vec<u8>>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Area {
    record: Vec<u8>,
}

/// Per-area summary written next to an extracted world map
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AreaSummary {
    pub area: String,
    pub x: u32,
    pub y: u32,
}

fn field(record: &[u8], offset: usize) -> Result<u32> {
    ByteSpan::new(record).u32_at(offset)
}

fn scale_field(record: &mut [u8], offset: usize, factor: u32) -> Result<()> {
    let value = field(record, offset)?;
    patch_u32(record, offset, value.saturating_mul(factor));
    Ok(())
}

impl Area {
    /// Blank area record for `resref` at (`x`, `y`)
    #[must_use]
    pub fn new(resref: &str, x: u32, y: u32) -> Self {
        let mut record = vec![0u8; AREA_SIZE];
        record[..8].copy_from_slice(&resref_bytes(resref));
        patch_u32(&mut record, area_field::X, x);
        patch_u32(&mut record, area_field::Y, y);
        Self { record }
    }

    pub fn summary(&self) -> Result<AreaSummary> {
        Ok(AreaSummary {
            area: read_resref(&self.record[..8]),
            x: field(&self.record, area_field::X)?,
            y: field(&self.record, area_field::Y)?,
        })
    }
}

impl Worldmap {
    /// Blank world map of the given size with the background `mos`
    #[must_use]
    pub fn new(mos: &str, width: u32, height: u32) -> Self {
        let mut record = vec![0u8; WORLDMAP_SIZE];
        record[..8].copy_from_slice(&resref_bytes(mos));
        patch_u32(&mut record, worldmap_field::WIDTH, width);
        patch_u32(&mut record, worldmap_field::HEIGHT, height);
        Self {
            record,
            areas: Vec::new(),
            links: Vec::new(),
        }
    }

    #[must_use]
    pub fn background(&self) -> String {
        read_resref(&self.record[..8])
    }

    pub fn size(&self) -> Result<(u32, u32)> {
        Ok((
            field(&self.record, worldmap_field::WIDTH)?,
            field(&self.record, worldmap_field::HEIGHT)?,
        ))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Wmp {
    pub worldmaps: Vec<Worldmap>,
}

impl Wmp {
    pub fn from_bytes(data: &[u8]) -> Result<Self> {
        let span = ByteSpan::new(data);
        let version = span.expect_signature("WMP", WMP_SIGNATURE)?;
        if &version != WMP_VERSION {
            return Err(Error::UnsupportedVersion {
                format: "WMP",
                version: String::from_utf8_lossy(&version).into_owned(),
            });
        }
        let count = span.u32_at(0x08)? as usize;
        let offset = span.u32_at(0x0C)? as usize;
        tracing::debug!("WMP: {count} world maps");

        let mut worldmaps = Vec::with_capacity(count);
        for entry in span.records(offset, count, WORLDMAP_SIZE)? {
            let area_count = entry.u32_at(worldmap_field::AREA_COUNT)? as usize;
            let area_offset = entry.u32_at(worldmap_field::AREA_OFFSET)? as usize;
            let link_offset = entry.u32_at(worldmap_field::LINK_OFFSET)? as usize;
            let link_count = entry.u32_at(worldmap_field::LINK_COUNT)? as usize;
            let areas = span
                .records(area_offset, area_count, AREA_SIZE)?
                .iter()
                .map(|r| Area {
                    record: r.as_bytes().to_vec(),
                })
                .collect();
            let links = span
                .records(link_offset, link_count, LINK_SIZE)?
                .iter()
                .map(|r| r.as_bytes().to_vec())
                .collect();
            worldmaps.push(Worldmap {
                record: entry.as_bytes().to_vec(),
                areas,
                links,
            });
        }
        Ok(Self { worldmaps })
    }

    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        let mut cursor = HEADER_SIZE + self.worldmaps.len() * WORLDMAP_SIZE;
        let mut out = Vec::with_capacity(cursor);
        out.extend_from_slice(WMP_SIGNATURE);
        out.extend_from_slice(WMP_VERSION);
        out.write_u32::<LittleEndian>(self.worldmaps.len() as u32)?;
        out.write_u32::<LittleEndian>(HEADER_SIZE as u32)?;

        for worldmap in &self.worldmaps {
            let mut record = worldmap.record.clone();
            let area_offset = cursor;
            let link_offset = area_offset + worldmap.areas.len() * AREA_SIZE;
            cursor = link_offset + worldmap.links.len() * LINK_SIZE;
            patch_u32(&mut record, worldmap_field::AREA_COUNT, worldmap.areas.len() as u32);
            patch_u32(&mut record, worldmap_field::AREA_OFFSET, area_offset as u32);
            patch_u32(&mut record, worldmap_field::LINK_OFFSET, link_offset as u32);
            patch_u32(&mut record, worldmap_field::LINK_COUNT, worldmap.links.len() as u32);
            out.extend_from_slice(&record);
        }
        for worldmap in &self.worldmaps {
            for area in &worldmap.areas {
                out.extend_from_slice(&area.record);
            }
            for link in &worldmap.links {
                out.extend_from_slice(link);
            }
        }
        Ok(out)
    }

    /// Scale map size, start position and area positions by `factor`
    pub fn upscale(&mut self, factor: u32) -> Result<()> {
        for worldmap in &mut self.worldmaps {
            for offset in [
                worldmap_field::WIDTH,
                worldmap_field::HEIGHT,
                worldmap_field::START_X,
                worldmap_field::START_Y,
            ] {
                scale_field(&mut worldmap.record, offset, factor)?;
            }
            for area in &mut worldmap.areas {
                scale_field(&mut area.record, area_field::X, factor)?;
                scale_field(&mut area.record, area_field::Y, factor)?;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn sample() -> Wmp {
        let mut first = Worldmap::new("WORLDMAP", 1024, 768);
        first.areas = vec![Area::new("AR0100", 10, 20), Area::new("AR0200", 300, 400)];
        first.links = vec![vec![7u8; LINK_SIZE]];
        let mut second = Worldmap::new("UNDERDK", 512, 512);
        second.areas = vec![Area::new("AR2300", 1, 2)];
        Wmp {
            worldmaps: vec![first, second],
        }
    }

    #[test]
    fn test_round_trip() {
        let wmp = sample();
        let bytes = wmp.to_bytes().unwrap();
        let parsed = Wmp::from_bytes(&bytes).unwrap();
        assert_eq!(parsed.worldmaps.len(), 2);
        assert_eq!(parsed.worldmaps[0].background(), "WORLDMAP");
        assert_eq!(parsed.worldmaps[1].areas[0].summary().unwrap().area, "AR2300");
        assert_eq!(parsed.to_bytes().unwrap(), bytes);
        assert_eq!(
            bytes.len(),
            HEADER_SIZE + 2 * WORLDMAP_SIZE + 3 * AREA_SIZE + LINK_SIZE
        );
    }

    #[test]
    fn test_upscale() {
        let mut wmp = Wmp::from_bytes(&sample().to_bytes().unwrap()).unwrap();
        wmp.upscale(2).unwrap();
        assert_eq!(wmp.worldmaps[0].size().unwrap(), (2048, 1536));
        assert_eq!(
            wmp.worldmaps[0].areas[1].summary().unwrap(),
            AreaSummary {
                area: "AR0200".into(),
                x: 600,
                y: 800
            }
        );
        assert_eq!(wmp.worldmaps[0].links[0], vec![7u8; LINK_SIZE]);
    }

    #[test]
    fn test_truncated_areas() {
        let bytes = sample().to_bytes().unwrap();
        assert!(matches!(
            Wmp::from_bytes(&bytes[..HEADER_SIZE + 2 * WORLDMAP_SIZE + 10]),
            Err(Error::OutOfBounds { .. })
        ));
    }
}

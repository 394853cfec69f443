//! KEY resource index
//!
//! Lists the BIF archives of a game and, for every resource, which archive
//! and slot hold it.

use byteorder::{LittleEndian, WriteBytesExt};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::utils::{ByteSpan, read_cstr, read_resref, resref_bytes};

pub const KEY_SIGNATURE: &[u8; 4] = b"KEY ";
pub const KEY_VERSION: &[u8; 4] = b"V1  ";
const HEADER_SIZE: usize = 0x18;
const BIF_ENTRY_SIZE: usize = 12;
const RESOURCE_ENTRY_SIZE: usize = 14;

const BIF_SHIFT: u32 = 20;
const TILESET_SHIFT: u32 = 14;
const TILESET_MASK: u32 = 0x3F;
const FILE_MASK: u32 = 0x3FFF;

/// Resource type codes by extension
const RESOURCE_TYPES: &[(u16, &str)] = &[
    (0x001, "BMP"),
    (0x002, "MVE"),
    (0x004, "WAV"),
    (0x005, "WFX"),
    (0x006, "PLT"),
    (0x3E8, "BAM"),
    (0x3E9, "WED"),
    (0x3EA, "CHU"),
    (0x3EB, "TIS"),
    (0x3EC, "MOS"),
    (0x3ED, "ITM"),
    (0x3EE, "SPL"),
    (0x3EF, "BCS"),
    (0x3F0, "IDS"),
    (0x3F1, "CRE"),
    (0x3F2, "ARE"),
    (0x3F3, "DLG"),
    (0x3F4, "2DA"),
    (0x3F5, "GAM"),
    (0x3F6, "STO"),
    (0x3F7, "WMP"),
    (0x3F8, "EFF"),
    (0x3F9, "BS"),
    (0x3FA, "CHR"),
    (0x3FB, "VVC"),
    (0x3FC, "VEF"),
    (0x3FD, "PRO"),
    (0x3FE, "BIO"),
    (0x3FF, "WBM"),
    (0x400, "FNT"),
    (0x402, "GUI"),
    (0x403, "SQL"),
    (0x404, "PVRZ"),
    (0x405, "GLSL"),
    (0x408, "MENU"),
    (0x409, "LUA"),
    (0x40A, "TTF"),
    (0x40B, "PNG"),
    (0x44C, "BAH"),
    (0x802, "INI"),
    (0x803, "SRC"),
];

/// Extension for a resource type code
#[must_use]
pub fn extension_for(code: u16) -> Option<&'static str> {
    RESOURCE_TYPES.iter().find(|(c, _)| *c == code).map(|(_, ext)| *ext)
}

/// Resource type code for an extension (case-insensitive)
#[must_use]
pub fn type_for(extension: &str) -> Option<u16> {
    RESOURCE_TYPES
        .iter()
        .find(|(_, ext)| ext.eq_ignore_ascii_case(extension))
        .map(|(c, _)| *c)
}

/// Pack a resource locator
#[must_use]
pub fn pack_locator(bif: u32, tileset: u32, file: u32) -> u32 {
    (bif << BIF_SHIFT) | ((tileset & TILESET_MASK) << TILESET_SHIFT) | (file & FILE_MASK)
}

/// Split a locator into (bif, tileset, file)
#[must_use]
pub fn unpack_locator(locator: u32) -> (u32, u32, u32) {
    (
        locator >> BIF_SHIFT,
        (locator >> TILESET_SHIFT) & TILESET_MASK,
        locator & FILE_MASK,
    )
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BifEntry {
    pub file_length: u32,
    pub file_name: String,
    /// Location bits (data dir, cache, CDs)
    pub location: u16,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceEntry {
    pub name: String,
    pub resource_type: u16,
    pub locator: u32,
}

impl ResourceEntry {
    #[must_use]
    pub fn bif_index(&self) -> u32 {
        unpack_locator(self.locator).0
    }

    #[must_use]
    pub fn tileset_index(&self) -> u32 {
        unpack_locator(self.locator).1
    }

    #[must_use]
    pub fn file_index(&self) -> u32 {
        unpack_locator(self.locator).2
    }

    /// `NAME.EXT`, or the bare name when the type is unknown
    #[must_use]
    pub fn file_name(&self) -> String {
        match extension_for(self.resource_type) {
            Some(ext) => format!("{}.{ext}", self.name),
            None => self.name.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Key {
    pub bifs: Vec<BifEntry>,
    pub resources: Vec<ResourceEntry>,
}

impl Key {
    pub fn from_bytes(data: &[u8]) -> Result<Self> {
        let span = ByteSpan::new(data);
        let version = span.expect_signature("KEY", KEY_SIGNATURE)?;
        if &version != KEY_VERSION {
            return Err(Error::UnsupportedVersion {
                format: "KEY",
                version: String::from_utf8_lossy(&version).into_owned(),
            });
        }
        let bif_count = span.u32_at(0x08)? as usize;
        let resource_count = span.u32_at(0x0C)? as usize;
        let bif_offset = span.u32_at(0x10)? as usize;
        let resource_offset = span.u32_at(0x14)? as usize;
        tracing::debug!("KEY: {bif_count} BIFs, {resource_count} resources");

        let bifs = span
            .records(bif_offset, bif_count, BIF_ENTRY_SIZE)?
            .iter()
            .map(|r| {
                let name_offset = r.u32_at(4)? as usize;
                let name_len = usize::from(r.u16_at(8)?);
                Ok(BifEntry {
                    file_length: r.u32_at(0)?,
                    file_name: read_cstr(span.slice(name_offset, name_len)?),
                    location: r.u16_at(10)?,
                })
            })
            .collect::<Result<Vec<_>>>()?;
        let resources = span
            .records(resource_offset, resource_count, RESOURCE_ENTRY_SIZE)?
            .iter()
            .map(|r| {
                Ok(ResourceEntry {
                    name: read_resref(r.slice(0, 8)?),
                    resource_type: r.u16_at(8)?,
                    locator: r.u32_at(10)?,
                })
            })
            .collect::<Result<Vec<_>>>()?;
        Ok(Self { bifs, resources })
    }

    /// Header, BIF table, BIF names, then the resource table
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        let bif_offset = HEADER_SIZE;
        let names_offset = bif_offset + self.bifs.len() * BIF_ENTRY_SIZE;
        let names_len: usize = self.bifs.iter().map(|b| b.file_name.len() + 1).sum();
        let resource_offset = names_offset + names_len;

        let mut out = Vec::with_capacity(resource_offset + self.resources.len() * RESOURCE_ENTRY_SIZE);
        out.extend_from_slice(KEY_SIGNATURE);
        out.extend_from_slice(KEY_VERSION);
        out.write_u32::<LittleEndian>(self.bifs.len() as u32)?;
        out.write_u32::<LittleEndian>(self.resources.len() as u32)?;
        out.write_u32::<LittleEndian>(bif_offset as u32)?;
        out.write_u32::<LittleEndian>(resource_offset as u32)?;

        let mut name_cursor = names_offset;
        for bif in &self.bifs {
            let len = bif.file_name.len() + 1;
            let len16 = u16::try_from(len).map_err(|_| Error::invalid("KEY", format!("BIF name too long: {}", bif.file_name)))?;
            out.write_u32::<LittleEndian>(bif.file_length)?;
            out.write_u32::<LittleEndian>(name_cursor as u32)?;
            out.write_u16::<LittleEndian>(len16)?;
            out.write_u16::<LittleEndian>(bif.location)?;
            name_cursor += len;
        }
        for bif in &self.bifs {
            out.extend_from_slice(bif.file_name.as_bytes());
            out.push(0);
        }
        for resource in &self.resources {
            out.extend_from_slice(&resref_bytes(&resource.name));
            out.write_u16::<LittleEndian>(resource.resource_type)?;
            out.write_u32::<LittleEndian>(resource.locator)?;
        }
        Ok(out)
    }

    /// Register a BIF archive and return its index
    pub fn add_bif(&mut self, file_name: &str, file_length: u32, location: u16) -> u32 {
        self.bifs.push(BifEntry {
            file_length,
            file_name: file_name.to_string(),
            location,
        });
        (self.bifs.len() - 1) as u32
    }

    /// Register (or relocate) a resource held at `file` inside BIF `bif`
    pub fn add_resource(&mut self, name: &str, resource_type: u16, bif: u32, file: u32) {
        let name = name.to_uppercase();
        let locator = pack_locator(bif, 0, file);
        match self
            .resources
            .iter_mut()
            .find(|r| r.resource_type == resource_type && r.name.eq_ignore_ascii_case(&name))
        {
            Some(existing) => existing.locator = locator,
            None => self.resources.push(ResourceEntry {
                name,
                resource_type,
                locator,
            }),
        }
    }

    #[must_use]
    pub fn find(&self, name: &str, resource_type: u16) -> Option<&ResourceEntry> {
        self.resources
            .iter()
            .find(|r| r.resource_type == resource_type && r.name.eq_ignore_ascii_case(name))
    }
}

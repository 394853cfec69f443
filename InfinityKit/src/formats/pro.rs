//! PRO projectile record
//!
//! A fixed 256, 512 or 768 byte record. The record is kept as bytes with
//! typed accessors so fields a game variant does not interpret survive a
//! rewrite untouched.

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::utils::{ByteSpan, patch_u16, read_resref};

pub const PRO_SIGNATURE: &[u8; 4] = b"PRO ";
pub const PRO_VERSION: &[u8; 4] = b"V1.0";

/// Size of each of the base, BAM and area sections
pub const SECTION_SIZE: usize = 256;

const TYPE_OFFSET: usize = 0x08;
const SPEED_OFFSET: usize = 0x0A;
const SPARKING_FLAGS_OFFSET: usize = 0x0C;
const EXTENDED_FLAGS_OFFSET: usize = 0x2C;

const BAM_FLAGS_OFFSET: usize = 0x100;
const LIGHT_WIDTH_OFFSET: usize = 0x118;
const LIGHT_HEIGHT_OFFSET: usize = 0x11A;

const AREA_FLAGS_OFFSET: usize = 0x200;
const TRIGGER_RADIUS_OFFSET: usize = 0x204;
const EFFECT_RADIUS_OFFSET: usize = 0x206;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProjectileType {
    /// Base section only
    NoBam = 1,
    /// Base and BAM sections
    SingleTarget = 2,
    /// Base, BAM and area sections
    Area = 3,
}

impl ProjectileType {
    fn from_u16(value: u16) -> Option<Self> {
        match value {
            1 => Some(Self::NoBam),
            2 => Some(Self::SingleTarget),
            3 => Some(Self::Area),
            _ => None,
        }
    }

    /// Record size in bytes
    #[must_use]
    pub fn record_size(self) -> usize {
        SECTION_SIZE * self as usize
    }
}

pub mod sparking_flags {
    pub const SHOW_SPARKS: u32 = 1 << 0;
    pub const USE_HEIGHT: u32 = 1 << 1;
    pub const LOOP_FIRE_SOUND: u32 = 1 << 2;
    pub const LOOP_IMPACT_SOUND: u32 = 1 << 3;
    pub const IGNORE_CENTER: u32 = 1 << 4;
    pub const DRAW_AS_BACKGROUND: u32 = 1 << 5;
}

pub mod bam_flags {
    pub const COLOURED: u32 = 1 << 0;
    pub const CREATE_SMOKE: u32 = 1 << 1;
    pub const COLOURED_SMOKE: u32 = 1 << 2;
    pub const NOT_LIGHT_SOURCE: u32 = 1 << 3;
    pub const MODIFY_FOR_HEIGHT: u32 = 1 << 4;
    pub const DRAW_SHADOW: u32 = 1 << 5;
    pub const LIGHT_SPOT: u32 = 1 << 6;
    pub const TRANSLUCENT: u32 = 1 << 7;
}

pub mod area_flags {
    pub const TRAP_VISIBLE: u16 = 1 << 0;
    pub const TRIGGERED_BY_INANIMATE: u16 = 1 << 1;
    pub const TRIGGERED_ON_CONDITION: u16 = 1 << 2;
    pub const DELAYED_TRIGGER: u16 = 1 << 3;
    pub const SECONDARY_PROJECTILE: u16 = 1 << 4;
    pub const FRAGMENTS: u16 = 1 << 5;
    pub const AFFECT_ONLY_ENEMIES: u16 = 1 << 6;
    pub const AFFECT_ONLY_ALLIES: u16 = 1 << 7;
    pub const CONE: u16 = 1 << 11;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Pro {
    projectile_type: ProjectileType,
    data: Vec<u8>,
}

/// Summary written next to an extracted projectile
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProSummary {
    pub projectile_type: ProjectileType,
    pub speed: u16,
    pub sparking_flags: u32,
    pub fire_sound: String,
    pub impact_sound: String,
    pub bam_flags: Option<u32>,
    pub area_flags: Option<u16>,
    pub trigger_radius: Option<u16>,
    pub effect_radius: Option<u16>,
}

impl Pro {
    pub fn from_bytes(data: &[u8]) -> Result<Self> {
        let span = ByteSpan::new(data);
        let version = span.expect_signature("PRO", PRO_SIGNATURE)?;
        if &version != PRO_VERSION {
            return Err(Error::UnsupportedVersion {
                format: "PRO",
                version: String::from_utf8_lossy(&version).into_owned(),
            });
        }
        let raw_type = span.u16_at(TYPE_OFFSET)?;
        let projectile_type = ProjectileType::from_u16(raw_type)
            .ok_or_else(|| Error::invalid("PRO", format!("unknown projectile type {raw_type}")))?;
        let size = projectile_type.record_size();
        // Trailing bytes past the declared record are not part of it
        let record = span.slice(0, size)?;
        Ok(Self {
            projectile_type,
            data: record.to_vec(),
        })
    }

    #[must_use]
    pub fn to_bytes(&self) -> Vec<u8> {
        self.data.clone()
    }

    #[must_use]
    pub fn projectile_type(&self) -> ProjectileType {
        self.projectile_type
    }

    fn span(&self) -> ByteSpan<'_> {
        ByteSpan::new(&self.data)
    }

    fn has_bam_section(&self) -> bool {
        self.projectile_type != ProjectileType::NoBam
    }

    fn has_area_section(&self) -> bool {
        self.projectile_type == ProjectileType::Area
    }

    pub fn speed(&self) -> Result<u16> {
        self.span().u16_at(SPEED_OFFSET)
    }

    pub fn sparking_flags(&self) -> Result<u32> {
        self.span().u32_at(SPARKING_FLAGS_OFFSET)
    }

    /// Flags only interpreted by the enhanced editions
    pub fn extended_flags(&self) -> Result<u32> {
        self.span().u32_at(EXTENDED_FLAGS_OFFSET)
    }

    pub fn summary(&self) -> Result<ProSummary> {
        let span = self.span();
        let bam = self.has_bam_section();
        let area = self.has_area_section();
        Ok(ProSummary {
            projectile_type: self.projectile_type,
            speed: self.speed()?,
            sparking_flags: self.sparking_flags()?,
            fire_sound: read_resref(span.slice(0x10, 8)?),
            impact_sound: read_resref(span.slice(0x18, 8)?),
            bam_flags: if bam { Some(span.u32_at(BAM_FLAGS_OFFSET)?) } else { None },
            area_flags: if area { Some(span.u16_at(AREA_FLAGS_OFFSET)?) } else { None },
            trigger_radius: if area { Some(span.u16_at(TRIGGER_RADIUS_OFFSET)?) } else { None },
            effect_radius: if area { Some(span.u16_at(EFFECT_RADIUS_OFFSET)?) } else { None },
        })
    }

    fn scale_u16(&mut self, offset: usize, factor: u32) -> Result<()> {
        let value = u32::from(self.span().u16_at(offset)?);
        let scaled = u16::try_from(value * factor).unwrap_or(u16::MAX);
        patch_u16(&mut self.data, offset, scaled);
        Ok(())
    }

    /// Scale travel speed and every spatial radius by `factor`
    pub fn upscale(&mut self, factor: u32) -> Result<()> {
        if factor <= 1 {
            return Ok(());
        }
        self.scale_u16(SPEED_OFFSET, factor)?;
        if self.has_bam_section() {
            self.scale_u16(LIGHT_WIDTH_OFFSET, factor)?;
            self.scale_u16(LIGHT_HEIGHT_OFFSET, factor)?;
        }
        if self.has_area_section() {
            self.scale_u16(TRIGGER_RADIUS_OFFSET, factor)?;
            self.scale_u16(EFFECT_RADIUS_OFFSET, factor)?;
        }
        Ok(())
    }
}

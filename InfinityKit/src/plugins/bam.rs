//! BAM plugin: one PNG per frame plus `meta.json`

use std::path::Path;

use image::RgbaImage;
use serde::{Deserialize, Serialize};

use super::io::{
    assemble_path, assemble_source, frame_file, load_png, page_taken, read_json, read_resource, save_png,
    scale_image, write_json, write_output, write_with_pages,
};
use super::{FormatPlugin, META_FILE, PluginContext, ResourceType};
use crate::error::{Error, Result};
use crate::formats::{Bam, BamV1, BamV2, FrameGeometry};
use crate::palette::{Palette, argb_to_rgba, rgba_to_argb};
use crate::pvrz::{PageSpace, PageStore, build_atlas, compose_frame};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub(crate) struct BamMeta {
    pub version: u8,
    #[serde(default)]
    pub compressed: bool,
    pub frames: Vec<FrameGeometry>,
    /// Frame indices of every cycle
    pub cycles: Vec<Vec<u16>>,
    /// ARGB palette of a V1 BAM
    #[serde(default)]
    pub palette: Vec<u32>,
    #[serde(default)]
    pub transparent_index: Option<u8>,
}

impl BamMeta {
    fn palette(&self) -> Option<Palette> {
        (!self.palette.is_empty()).then(|| Palette {
            colors: self.palette.clone(),
            transparent_index: self.transparent_index,
        })
    }
}

pub(crate) struct BamPlugin;

fn frame_image(geometry: &FrameGeometry, pixels: &[u32]) -> Result<RgbaImage> {
    let (width, height) = (u32::from(geometry.width), u32::from(geometry.height));
    RgbaImage::from_raw(width, height, argb_to_rgba(pixels)).ok_or(Error::PixelCountMismatch {
        width,
        height,
        actual: pixels.len(),
    })
}

/// Load every frame of an extracted BAM; empty frames have no file
fn load_frames(dir: &Path, meta: &BamMeta) -> Result<Vec<RgbaImage>> {
    meta.frames
        .iter()
        .enumerate()
        .map(|(i, geometry)| {
            if geometry.pixel_count() == 0 {
                return Ok(RgbaImage::new(0, 0));
            }
            load_png(&dir.join(frame_file(i)))
        })
        .collect()
}

fn scale_geometry(geometry: &FrameGeometry, factor: u32) -> Result<FrameGeometry> {
    let too_large = || Error::invalid("BAM", format!("frame {}x{} too large to scale", geometry.width, geometry.height));
    let factor16 = u16::try_from(factor).map_err(|_| too_large())?;
    Ok(FrameGeometry {
        width: geometry.width.checked_mul(factor16).ok_or_else(too_large)?,
        height: geometry.height.checked_mul(factor16).ok_or_else(too_large)?,
        center_x: geometry.center_x.saturating_mul(factor16 as i16),
        center_y: geometry.center_y.saturating_mul(factor16 as i16),
    })
}

impl FormatPlugin for BamPlugin {
    fn resource_type(&self) -> ResourceType {
        ResourceType::Bam
    }

    fn extract(&self, context: &PluginContext<'_>, resource: &str) -> Result<()> {
        let bam = Bam::from_bytes(&read_resource(context, resource)?)?;
        let geometry = bam.geometry();
        let mut images = Vec::with_capacity(geometry.len());
        let meta = match &bam {
            Bam::V1(v1) => {
                for (i, g) in geometry.iter().enumerate() {
                    images.push(frame_image(g, &v1.frame_pixels(i)?)?);
                }
                BamMeta {
                    version: 1,
                    compressed: v1.compressed,
                    frames: geometry.clone(),
                    cycles: bam.cycle_frames(),
                    palette: v1.palette.colors.clone(),
                    transparent_index: v1.palette.transparent_index,
                }
            }
            Bam::V2(v2) => {
                let mut store = PageStore::new(&context.config.game_dir, PageSpace::Mos);
                for (i, g) in geometry.iter().enumerate() {
                    images.push(compose_frame(
                        u32::from(g.width),
                        u32::from(g.height),
                        v2.frame_blocks(i),
                        &mut store,
                    )?);
                }
                store.release();
                BamMeta {
                    version: 2,
                    compressed: false,
                    frames: geometry.clone(),
                    cycles: bam.cycle_frames(),
                    palette: Vec::new(),
                    transparent_index: None,
                }
            }
        };

        let dir = context.config.extract_path(resource);
        for (i, image) in images.iter().enumerate() {
            if image.width() > 0 && image.height() > 0 {
                save_png(&dir.join(frame_file(i)), image)?;
            }
        }
        write_json(&dir.join(META_FILE), &meta)?;
        tracing::info!("Extracted {} frames from {resource}", images.len());
        Ok(())
    }

    fn upscale(&self, context: &PluginContext<'_>, resource: &str) -> Result<()> {
        let factor = context.factor();
        let source = context.config.extract_path(resource);
        let mut meta: BamMeta = read_json(&source.join(META_FILE))?;
        let frames = load_frames(&source, &meta)?;

        let target = context.config.upscaled_path(resource);
        for (i, frame) in frames.iter().enumerate() {
            if frame.width() > 0 && frame.height() > 0 {
                save_png(&target.join(frame_file(i)), &scale_image(frame, factor))?;
            }
        }
        meta.frames = meta
            .frames
            .iter()
            .map(|g| scale_geometry(g, factor))
            .collect::<Result<_>>()?;
        write_json(&target.join(META_FILE), &meta)?;
        Ok(())
    }

    fn assemble(&self, context: &PluginContext<'_>, resource: &str) -> Result<()> {
        let source = assemble_source(context, resource);
        let meta: BamMeta = read_json(&source.join(META_FILE))?;
        let frames = load_frames(&source, &meta)?;

        // Edited frames may have been resized; their image is authoritative
        let geometry: Vec<FrameGeometry> = meta
            .frames
            .iter()
            .zip(&frames)
            .map(|(g, image)| FrameGeometry {
                width: image.width() as u16,
                height: image.height() as u16,
                ..*g
            })
            .collect();

        if meta.version == 2 {
            let space = PageSpace::Mos;
            let atlas = build_atlas(&frames, &space, context.namer, page_taken(context, &space))?;
            let bam = BamV2::from_blocks(&geometry, atlas.frame_blocks.clone(), &meta.cycles);
            let data = bam.to_bytes()?;
            write_with_pages(context, &space, &atlas, resource, &data)?;
            tracing::info!("Assembled {resource} with {} PVRZ pages", atlas.pages.len());
            return Ok(());
        }

        let pixels: Vec<(FrameGeometry, Vec<u32>)> = geometry
            .iter()
            .zip(&frames)
            .map(|(g, image)| (*g, rgba_to_argb(image.as_raw())))
            .collect();
        let bam = BamV1::from_frames(&pixels, &meta.cycles, meta.palette(), meta.compressed);
        let data = Bam::V1(bam).to_bytes()?;
        write_output(&assemble_path(context, resource), &data)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_scale_geometry() {
        let g = FrameGeometry {
            width: 10,
            height: 4,
            center_x: -3,
            center_y: 5,
        };
        let scaled = scale_geometry(&g, 3).unwrap();
        assert_eq!(
            scaled,
            FrameGeometry {
                width: 30,
                height: 12,
                center_x: -9,
                center_y: 15,
            }
        );
        let huge = FrameGeometry {
            width: 40_000,
            ..g
        };
        assert!(scale_geometry(&huge, 2).is_err());
    }

    #[test]
    fn test_meta_palette() {
        let meta = BamMeta {
            version: 1,
            compressed: false,
            frames: Vec::new(),
            cycles: Vec::new(),
            palette: vec![0xFF00_FF00; 256],
            transparent_index: Some(0),
        };
        assert_eq!(meta.palette().unwrap().transparent_index, Some(0));
        let v2 = BamMeta {
            version: 2,
            palette: Vec::new(),
            ..meta
        };
        assert!(v2.palette().is_none());
    }
}

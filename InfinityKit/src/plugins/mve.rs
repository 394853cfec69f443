//! MVE plugin: stream metadata and palette
//!
//! Frames are not decoded, so upscaling passes the movie through unchanged.

use image::{Rgba, RgbaImage};

use super::io::{
    assemble_path, assemble_source, read_file, read_resource, save_png, upscaled_file, write_json, write_output,
};
use super::{FormatPlugin, PluginContext, ResourceType};
use crate::error::Result;
use crate::formats::Mve;

pub(crate) const INFO_FILE: &str = "info.json";
pub(crate) const PALETTE_FILE: &str = "palette.png";

pub(crate) struct MvePlugin;

/// 16x16 swatch grid of a 256-colour palette
fn palette_image(palette: &[[u8; 3]]) -> RgbaImage {
    RgbaImage::from_fn(16, 16, |x, y| {
        let [r, g, b] = palette.get((y * 16 + x) as usize).copied().unwrap_or_default();
        Rgba([r, g, b, 255])
    })
}

impl FormatPlugin for MvePlugin {
    fn resource_type(&self) -> ResourceType {
        ResourceType::Mve
    }

    fn extract(&self, context: &PluginContext<'_>, resource: &str) -> Result<()> {
        let data = read_resource(context, resource)?;
        let info = Mve::from_bytes(&data)?.info()?;
        let dir = context.config.extract_path(resource);
        write_output(&dir.join(resource.to_uppercase()), &data)?;
        write_json(&dir.join(INFO_FILE), &info)?;
        if !info.palette.is_empty() {
            save_png(&dir.join(PALETTE_FILE), &palette_image(&info.palette))?;
        }
        tracing::info!(
            "{resource}: {}x{}, {} frames",
            info.width,
            info.height,
            info.frame_count
        );
        Ok(())
    }

    fn upscale(&self, context: &PluginContext<'_>, resource: &str) -> Result<()> {
        let data = read_resource(context, resource)?;
        Mve::from_bytes(&data)?;
        tracing::warn!("{resource}: movie frames are not decoded, copying unscaled");
        write_output(&upscaled_file(context, resource), &data)
    }

    fn assemble(&self, context: &PluginContext<'_>, resource: &str) -> Result<()> {
        let data = read_file(&assemble_source(context, resource).join(resource.to_uppercase()))?;
        let encoded = Mve::from_bytes(&data)?.to_bytes()?;
        write_output(&assemble_path(context, resource), &encoded)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_palette_image_layout() {
        let mut palette = vec![[0u8; 3]; 256];
        palette[17] = [255, 128, 0];
        let image = palette_image(&palette);
        assert_eq!(image.get_pixel(1, 1), &Rgba([255, 128, 0, 255]));
        assert_eq!(image.get_pixel(0, 0), &Rgba([0, 0, 0, 255]));
    }
}

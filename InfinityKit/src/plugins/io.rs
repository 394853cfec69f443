//! File helpers shared by the format plugins

use std::path::{Path, PathBuf};

use image::codecs::png::PngEncoder;
use image::{ExtendedColorType, ImageEncoder, ImageFormat, RgbaImage, imageops};
use serde::Serialize;
use serde::de::DeserializeOwned;

use super::PluginContext;
use crate::error::{Error, Result};
use crate::pvrz::{AtlasOutput, PageSpace};
use crate::utils::{find_case_insensitive, split_resource_name};

/// Per-resource metadata written next to extracted files
pub const META_FILE: &str = "meta.json";

/// Stem of a resource name (`AR0100.TIS` -> `AR0100`)
pub(crate) fn stem(resource: &str) -> String {
    split_resource_name(resource).0
}

/// Read a resource from the game directory
pub(crate) fn read_resource(context: &PluginContext<'_>, resource: &str) -> Result<Vec<u8>> {
    read_sibling(context, resource)?.ok_or_else(|| Error::ResourceNotFound(context.config.game_dir.join(resource)))
}

/// Read a resource from the game directory if it exists
pub(crate) fn read_sibling(context: &PluginContext<'_>, resource: &str) -> Result<Option<Vec<u8>>> {
    match find_case_insensitive(&context.config.game_dir, resource) {
        Some(path) => {
            tracing::debug!("Reading {}", path.display());
            Ok(Some(std::fs::read(path)?))
        }
        None => Ok(None),
    }
}

/// Write a fully built buffer, creating parent directories
pub(crate) fn write_output(path: &Path, data: &[u8]) -> Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(path, data)?;
    tracing::debug!("Wrote {} ({} bytes)", path.display(), data.len());
    Ok(())
}

/// Read an extracted or upscaled file
pub(crate) fn read_file(path: &Path) -> Result<Vec<u8>> {
    std::fs::read(path).map_err(|e| missing_or_io(path, e))
}

pub(crate) fn write_json<T: Serialize>(path: &Path, value: &T) -> Result<()> {
    let text = serde_json::to_string_pretty(value)?;
    write_output(path, text.as_bytes())
}

pub(crate) fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let text = std::fs::read_to_string(path).map_err(|e| missing_or_io(path, e))?;
    Ok(serde_json::from_str(&text)?)
}

fn missing_or_io(path: &Path, err: std::io::Error) -> Error {
    if err.kind() == std::io::ErrorKind::NotFound {
        Error::ResourceNotFound(path.to_path_buf())
    } else {
        Error::Io(err)
    }
}

/// Encode an image as PNG in memory
pub(crate) fn encode_png(image: &RgbaImage) -> Result<Vec<u8>> {
    let mut out = Vec::new();
    PngEncoder::new(&mut out)
        .write_image(image.as_raw(), image.width(), image.height(), ExtendedColorType::Rgba8)
        .map_err(|e| Error::PngEncodeFailed { message: e.to_string() })?;
    Ok(out)
}

pub(crate) fn save_png(path: &Path, image: &RgbaImage) -> Result<()> {
    write_output(path, &encode_png(image)?)
}

pub(crate) fn load_png(path: &Path) -> Result<RgbaImage> {
    let bytes = read_file(path)?;
    image::load_from_memory_with_format(&bytes, ImageFormat::Png)
        .map(|img| img.to_rgba8())
        .map_err(|e| Error::ImageDecodeFailed {
            path: path.to_path_buf(),
            message: e.to_string(),
        })
}

/// Directory assemble reads from: upscaled output when present, else the extraction
pub(crate) fn assemble_source(context: &PluginContext<'_>, resource: &str) -> PathBuf {
    let upscaled = context.config.upscaled_path(resource);
    if upscaled.is_dir() {
        return upscaled;
    }
    context.config.extract_path(resource)
}

/// Output path of an assembled resource
pub(crate) fn assemble_path(context: &PluginContext<'_>, resource: &str) -> PathBuf {
    context.config.assemble_dir.join(resource.to_uppercase())
}

/// Output path of a binary upscaled in place (`<upscaled>/<RES>/<RES>`)
pub(crate) fn upscaled_file(context: &PluginContext<'_>, resource: &str) -> PathBuf {
    context.config.upscaled_path(resource).join(resource.to_uppercase())
}

/// Write atlas pages and the resource, in that order
pub(crate) fn write_with_pages(
    context: &PluginContext<'_>,
    space: &PageSpace,
    atlas: &AtlasOutput,
    resource: &str,
    data: &[u8],
) -> Result<()> {
    for (page, bytes) in &atlas.pages {
        write_output(&context.config.assemble_dir.join(space.page_name(*page)), bytes)?;
    }
    write_output(&assemble_path(context, resource), data)
}

/// Page numbers already used by the game or an earlier assemble
pub(crate) fn page_taken<'a>(context: &'a PluginContext<'_>, space: &'a PageSpace) -> impl Fn(u32) -> bool + 'a {
    move |page| {
        let name = space.page_name(page);
        find_case_insensitive(&context.config.game_dir, &name).is_some()
            || find_case_insensitive(&context.config.assemble_dir, &name).is_some()
    }
}

/// Nearest-neighbour resize by an integer factor
#[must_use]
pub fn scale_image(image: &RgbaImage, factor: u32) -> RgbaImage {
    if factor <= 1 {
        return image.clone();
    }
    imageops::resize(
        image,
        image.width() * factor,
        image.height() * factor,
        imageops::FilterType::Nearest,
    )
}

/// `frame_007.png`
pub(crate) fn frame_file(index: usize) -> String {
    format!("frame_{index:03}.png")
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgba;

    #[test]
    fn test_png_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let mut image = RgbaImage::new(3, 2);
        image.put_pixel(2, 1, Rgba([1, 2, 3, 0]));
        let path = dir.path().join("nested/out.png");
        save_png(&path, &image).unwrap();
        assert_eq!(load_png(&path).unwrap(), image);
    }

    #[test]
    fn test_scale_image_repeats_pixels() {
        let mut image = RgbaImage::new(2, 1);
        image.put_pixel(1, 0, Rgba([255, 0, 0, 255]));
        let big = scale_image(&image, 3);
        assert_eq!(big.dimensions(), (6, 3));
        assert_eq!(big.get_pixel(3, 2), &Rgba([255, 0, 0, 255]));
        assert_eq!(big.get_pixel(2, 2), &Rgba([0, 0, 0, 0]));
    }

    #[test]
    fn test_missing_png_is_not_found() {
        let dir = tempfile::tempdir().unwrap();
        assert!(matches!(
            load_png(&dir.path().join("nope.png")),
            Err(Error::ResourceNotFound(_))
        ));
    }
}

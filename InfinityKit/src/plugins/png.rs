//! Loose PNG artwork (portraits, loading screens)

use super::io::{assemble_path, assemble_source, load_png, read_resource, save_png, scale_image, write_output};
use super::{FormatPlugin, PluginContext, ResourceType};
use crate::error::{Error, Result};

pub(crate) struct PngPlugin;

impl FormatPlugin for PngPlugin {
    fn resource_type(&self) -> ResourceType {
        ResourceType::Png
    }

    fn extract(&self, context: &PluginContext<'_>, resource: &str) -> Result<()> {
        let data = read_resource(context, resource)?;
        // Reject anything that is not a decodable PNG up front
        image::load_from_memory_with_format(&data, image::ImageFormat::Png).map_err(|e| Error::ImageDecodeFailed {
            path: context.config.game_dir.join(resource),
            message: e.to_string(),
        })?;
        write_output(&context.config.extract_path(resource).join(resource.to_uppercase()), &data)
    }

    fn upscale(&self, context: &PluginContext<'_>, resource: &str) -> Result<()> {
        let name = resource.to_uppercase();
        let image = load_png(&context.config.extract_path(resource).join(&name))?;
        save_png(
            &context.config.upscaled_path(resource).join(&name),
            &scale_image(&image, context.factor()),
        )
    }

    fn assemble(&self, context: &PluginContext<'_>, resource: &str) -> Result<()> {
        let image = load_png(&assemble_source(context, resource).join(resource.to_uppercase()))?;
        save_png(&assemble_path(context, resource), &image)
    }
}

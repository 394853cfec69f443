//! PLT plugin: `plt.png` (red = column, green = row) plus `meta.json`

use serde::{Deserialize, Serialize};

use super::io::{
    assemble_path, assemble_source, load_png, read_json, read_resource, save_png, scale_image, write_json,
    write_output,
};
use super::{FormatPlugin, META_FILE, PluginContext, ResourceType};
use crate::error::Result;
use crate::formats::Plt;

pub(crate) const PLT_IMAGE: &str = "plt.png";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub(crate) struct PltMeta {
    pub unknown: [u16; 4],
}

pub(crate) struct PltPlugin;

impl FormatPlugin for PltPlugin {
    fn resource_type(&self) -> ResourceType {
        ResourceType::Plt
    }

    fn extract(&self, context: &PluginContext<'_>, resource: &str) -> Result<()> {
        let plt = Plt::from_bytes(&read_resource(context, resource)?)?;
        let dir = context.config.extract_path(resource);
        save_png(&dir.join(PLT_IMAGE), &plt.to_image())?;
        write_json(&dir.join(META_FILE), &PltMeta { unknown: plt.unknown })
    }

    fn upscale(&self, context: &PluginContext<'_>, resource: &str) -> Result<()> {
        let source = context.config.extract_path(resource);
        let meta: PltMeta = read_json(&source.join(META_FILE))?;
        let image = load_png(&source.join(PLT_IMAGE))?;
        let target = context.config.upscaled_path(resource);
        save_png(&target.join(PLT_IMAGE), &scale_image(&image, context.factor()))?;
        write_json(&target.join(META_FILE), &meta)
    }

    fn assemble(&self, context: &PluginContext<'_>, resource: &str) -> Result<()> {
        let source = assemble_source(context, resource);
        let meta: PltMeta = read_json(&source.join(META_FILE))?;
        let plt = Plt::from_image(&load_png(&source.join(PLT_IMAGE))?, meta.unknown);
        write_output(&assemble_path(context, resource), &plt.to_bytes()?)
    }
}

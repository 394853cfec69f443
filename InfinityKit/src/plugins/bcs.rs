//! BCS plugin: compiled scripts as `<STEM>.baf` source text

use super::io::{assemble_path, assemble_source, read_file, read_resource, stem, write_output};
use super::{FormatPlugin, PluginContext, ResourceType};
use crate::bcs::{compile_to_bytes, decompile_bytes};
use crate::error::Result;

pub(crate) struct BcsPlugin;

fn source_file(resource: &str) -> String {
    format!("{}.baf", stem(resource))
}

impl FormatPlugin for BcsPlugin {
    fn resource_type(&self) -> ResourceType {
        ResourceType::Bcs
    }

    fn extract(&self, context: &PluginContext<'_>, resource: &str) -> Result<()> {
        let data = read_resource(context, resource)?;
        let text = decompile_bytes(&data, context.ids, context.config.game, 1)?;
        let path = context.config.extract_path(resource).join(source_file(resource));
        write_output(&path, text.as_bytes())
    }

    /// Decompiles the original with every coordinate scaled
    fn upscale(&self, context: &PluginContext<'_>, resource: &str) -> Result<()> {
        let data = read_resource(context, resource)?;
        let text = decompile_bytes(&data, context.ids, context.config.game, context.factor())?;
        let path = context.config.upscaled_path(resource).join(source_file(resource));
        write_output(&path, text.as_bytes())
    }

    fn assemble(&self, context: &PluginContext<'_>, resource: &str) -> Result<()> {
        let path = assemble_source(context, resource).join(source_file(resource));
        let text = String::from_utf8_lossy(&read_file(&path)?).into_owned();
        let data = compile_to_bytes(&text, context.ids, context.config.game)?;
        write_output(&assemble_path(context, resource), &data)
    }
}

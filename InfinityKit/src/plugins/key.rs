//! KEY plugin: the resource index as editable `key.json`

use super::io::{assemble_path, assemble_source, read_json, read_resource, write_json, write_output};
use super::{FormatPlugin, PluginContext, ResourceType};
use crate::error::{Error, Result};
use crate::formats::Key;

pub(crate) const KEY_JSON: &str = "key.json";

pub(crate) struct KeyPlugin;

impl FormatPlugin for KeyPlugin {
    fn resource_type(&self) -> ResourceType {
        ResourceType::Key
    }

    fn extract(&self, context: &PluginContext<'_>, resource: &str) -> Result<()> {
        let key = Key::from_bytes(&read_resource(context, resource)?)?;
        tracing::info!("{resource}: {} BIFs, {} resources", key.bifs.len(), key.resources.len());
        write_json(&context.config.extract_path(resource).join(KEY_JSON), &key)
    }

    /// The index holds no coordinates
    fn upscale(&self, _context: &PluginContext<'_>, _resource: &str) -> Result<()> {
        Err(Error::UnsupportedOperation {
            operation: "upscale",
            resource_type: "KEY",
        })
    }

    fn assemble(&self, context: &PluginContext<'_>, resource: &str) -> Result<()> {
        let key: Key = read_json(&assemble_source(context, resource).join(KEY_JSON))?;
        write_output(&assemble_path(context, resource), &key.to_bytes()?)
    }
}

//! DLG plugin
//!
//! Extraction keeps the binary and writes its embedded script texts to
//! `scripts.json`; edits to that file are folded back in on assemble.

use serde::{Deserialize, Serialize};

use super::io::{
    assemble_path, assemble_source, read_file, read_json, read_resource, upscaled_file, write_json, write_output,
};
use super::{FormatPlugin, PluginContext, ResourceType};
use crate::error::{Error, Result};
use crate::formats::Dlg;

pub(crate) const SCRIPTS_FILE: &str = "scripts.json";

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub(crate) struct DlgScripts {
    pub state_triggers: Vec<String>,
    pub transition_triggers: Vec<String>,
    pub actions: Vec<String>,
}

impl DlgScripts {
    fn of(dlg: &Dlg) -> Self {
        Self {
            state_triggers: dlg.state_triggers.clone(),
            transition_triggers: dlg.transition_triggers.clone(),
            actions: dlg.actions.clone(),
        }
    }

    /// Replace the dialog's texts; the table sizes must match
    fn apply(self, dlg: &mut Dlg) -> Result<()> {
        if self.state_triggers.len() != dlg.state_triggers.len()
            || self.transition_triggers.len() != dlg.transition_triggers.len()
            || self.actions.len() != dlg.actions.len()
        {
            return Err(Error::invalid("DLG", format!("{SCRIPTS_FILE} does not match the dialog's script tables")));
        }
        dlg.state_triggers = self.state_triggers;
        dlg.transition_triggers = self.transition_triggers;
        dlg.actions = self.actions;
        Ok(())
    }
}

pub(crate) struct DlgPlugin;

impl FormatPlugin for DlgPlugin {
    fn resource_type(&self) -> ResourceType {
        ResourceType::Dlg
    }

    fn extract(&self, context: &PluginContext<'_>, resource: &str) -> Result<()> {
        let data = read_resource(context, resource)?;
        let dlg = Dlg::from_bytes(&data)?;
        let dir = context.config.extract_path(resource);
        write_output(&dir.join(resource.to_uppercase()), &data)?;
        write_json(&dir.join(SCRIPTS_FILE), &DlgScripts::of(&dlg))
    }

    fn upscale(&self, context: &PluginContext<'_>, resource: &str) -> Result<()> {
        let mut dlg = Dlg::from_bytes(&read_resource(context, resource)?)?;
        let skipped = dlg.upscale(context.ids, context.config.game, context.factor());
        if skipped > 0 {
            tracing::warn!("{resource}: {skipped} script texts kept unscaled");
        }
        write_output(&upscaled_file(context, resource), &dlg.to_bytes()?)
    }

    fn assemble(&self, context: &PluginContext<'_>, resource: &str) -> Result<()> {
        let dir = assemble_source(context, resource);
        let mut dlg = Dlg::from_bytes(&read_file(&dir.join(resource.to_uppercase()))?)?;
        let scripts = dir.join(SCRIPTS_FILE);
        if scripts.is_file() {
            read_json::<DlgScripts>(&scripts)?.apply(&mut dlg)?;
        }
        write_output(&assemble_path(context, resource), &dlg.to_bytes()?)
    }
}

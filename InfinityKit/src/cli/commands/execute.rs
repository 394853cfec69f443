//! Command execution implementations

use super::Commands;
use super::definitions::OperationCommand;
use super::{config, resource};
use crate::cli::Settings;
use crate::plugins::ResourceType;

impl Commands {
    /// Format handled by this command, if any
    #[must_use]
    pub fn resource_type(&self) -> Option<ResourceType> {
        let resource_type = match self {
            Commands::Bam { .. } => ResourceType::Bam,
            Commands::Bcs { .. } => ResourceType::Bcs,
            Commands::Bmp { .. } => ResourceType::Bmp,
            Commands::Chu { .. } => ResourceType::Chu,
            Commands::Dlg { .. } => ResourceType::Dlg,
            Commands::Key { .. } => ResourceType::Key,
            Commands::Mos { .. } => ResourceType::Mos,
            Commands::Mve { .. } => ResourceType::Mve,
            Commands::Plt { .. } => ResourceType::Plt,
            Commands::Png { .. } => ResourceType::Png,
            Commands::Pro { .. } => ResourceType::Pro,
            Commands::Tis { .. } => ResourceType::Tis,
            Commands::TwoDa { .. } => ResourceType::TwoDa,
            Commands::Wed { .. } => ResourceType::Wed,
            Commands::Wmp { .. } => ResourceType::Wmp,
            Commands::Config | Commands::Formats => return None,
        };
        Some(resource_type)
    }

    fn operation_command(&self) -> Option<&OperationCommand> {
        match self {
            Commands::Bam { command }
            | Commands::Bcs { command }
            | Commands::Bmp { command }
            | Commands::Chu { command }
            | Commands::Dlg { command }
            | Commands::Key { command }
            | Commands::Mos { command }
            | Commands::Mve { command }
            | Commands::Plt { command }
            | Commands::Png { command }
            | Commands::Pro { command }
            | Commands::Tis { command }
            | Commands::TwoDa { command }
            | Commands::Wed { command }
            | Commands::Wmp { command } => Some(command),
            Commands::Config | Commands::Formats => None,
        }
    }

    /// Execute the selected command.
    ///
    /// Returns `Ok(false)` when a resource failed or no resource was given.
    ///
    /// # Errors
    /// Returns an error if the IDS tables cannot be loaded or the
    /// configuration cannot be printed.
    pub fn execute(&self, settings: &Settings) -> anyhow::Result<bool> {
        match self {
            Commands::Config => config::show(&settings.config),
            Commands::Formats => {
                config::formats();
                Ok(true)
            }
            _ => match (self.resource_type(), self.operation_command()) {
                (Some(resource_type), Some(command)) => resource::execute(
                    settings,
                    resource_type,
                    command.operation(),
                    command.resources(),
                ),
                _ => Ok(false),
            },
        }
    }
}

//! Subcommand enum definitions for CLI

use clap::Subcommand;

use crate::plugins::Operation;

/// Lifecycle step shared by every format
#[derive(Subcommand)]
pub enum OperationCommand {
    /// Convert game resources into editable files
    Extract {
        /// Resource names, with or without extension
        resources: Vec<String>,
    },

    /// Scale extracted files by the configured factor
    Upscale {
        /// Resource names, with or without extension
        resources: Vec<String>,
    },

    /// Build game resources from the (upscaled) files
    Assemble {
        /// Resource names, with or without extension
        resources: Vec<String>,
    },
}

impl OperationCommand {
    #[must_use]
    pub fn operation(&self) -> Operation {
        match self {
            OperationCommand::Extract { .. } => Operation::Extract,
            OperationCommand::Upscale { .. } => Operation::Upscale,
            OperationCommand::Assemble { .. } => Operation::Assemble,
        }
    }

    #[must_use]
    pub fn resources(&self) -> &[String] {
        match self {
            OperationCommand::Extract { resources }
            | OperationCommand::Upscale { resources }
            | OperationCommand::Assemble { resources } => resources,
        }
    }
}

use clap::Subcommand;

pub mod config;
pub mod definitions;
pub mod execute;
pub mod resource;

use definitions::OperationCommand;

#[derive(Subcommand)]
pub enum Commands {
    /// BAM animations (frames as PNG)
    Bam {
        #[command(subcommand)]
        command: OperationCommand,
    },

    /// BCS compiled scripts (decompiled to BAF text)
    Bcs {
        #[command(subcommand)]
        command: OperationCommand,
    },

    /// BMP bitmaps (light, search and height maps)
    Bmp {
        #[command(subcommand)]
        command: OperationCommand,
    },

    /// CHU user interface layouts
    Chu {
        #[command(subcommand)]
        command: OperationCommand,
    },

    /// DLG dialogs (embedded script texts)
    Dlg {
        #[command(subcommand)]
        command: OperationCommand,
    },

    /// KEY resource index (as JSON)
    Key {
        #[command(subcommand)]
        command: OperationCommand,
    },

    /// MOS backgrounds (as one PNG)
    Mos {
        #[command(subcommand)]
        command: OperationCommand,
    },

    /// MVE movies (header, dimensions and palette)
    Mve {
        #[command(subcommand)]
        command: OperationCommand,
    },

    /// PLT paperdoll palettes
    Plt {
        #[command(subcommand)]
        command: OperationCommand,
    },

    /// PNG images
    Png {
        #[command(subcommand)]
        command: OperationCommand,
    },

    /// PRO projectiles
    Pro {
        #[command(subcommand)]
        command: OperationCommand,
    },

    /// TIS tilesets (as one PNG laid out by the area's WED)
    Tis {
        #[command(subcommand)]
        command: OperationCommand,
    },

    /// 2DA tables
    #[command(name = "2da")]
    TwoDa {
        #[command(subcommand)]
        command: OperationCommand,
    },

    /// WED area layouts
    Wed {
        #[command(subcommand)]
        command: OperationCommand,
    },

    /// WMP world maps
    Wmp {
        #[command(subcommand)]
        command: OperationCommand,
    },

    /// Show the effective configuration
    Config,

    /// List the supported resource formats
    Formats,
}

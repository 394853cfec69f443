//! # InfinityKit
//!
//! A pure-Rust library for reading, upscaling and writing Infinity Engine
//! resources (Baldur's Gate, Icewind Dale, Planescape: Torment and the
//! Enhanced Editions).
//!
//! ## Supported Formats
//!
//! - **BAM / MOS / TIS** - Palettized and PVRZ-backed graphics
//! - **BCS** - Compiled scripts, decompiled to and compiled from BAF text
//! - **WED / WMP / PRO / CHU / 2DA** - Coordinate-bearing containers
//! - **DLG** - Dialogs with embedded script fragments
//! - **KEY / PLT / BMP / MVE** - Resource index, paperdolls, maps and movies
//! - **IDS** - Symbol tables, optionally XOR-obfuscated
//!
//! ## Quick Start
//!
//! ### Decompiling a Script
//!
//! ```no_run
//! use infinitykit::bcs::decompile_bytes;
//! use infinitykit::config::GameVariant;
//! use infinitykit::ids::IdsCache;
//!
//! let ids = IdsCache::global();
//! ids.initialize_from_dir("game/override".as_ref())?;
//!
//! let data = std::fs::read("game/override/AR0100.BCS")?;
//! let text = decompile_bytes(&data, ids, GameVariant::Bg2, 1)?;
//! println!("{text}");
//! # Ok::<(), infinitykit::Error>(())
//! ```
//!
//! ### Running a Format Plugin
//!
//! ```no_run
//! use infinitykit::prelude::*;
//!
//! let config = Config::load("infinitykit.toml".as_ref())?;
//! let context = PluginContext::new(&config);
//! let report = PluginManager::new().run(
//!     &context,
//!     Operation::Upscale,
//!     ResourceType::Bam,
//!     &["CDMF4G1".to_string()],
//! );
//! assert!(report.all_succeeded());
//! # Ok::<(), infinitykit::Error>(())
//! ```
//!
//! ## Feature Flags
//!
//! - `cli` - Enables the `infinitykit` command-line binary

pub mod bcs;
pub mod compression;
pub mod config;
pub mod error;
pub mod formats;
pub mod ids;
pub mod palette;
pub mod plugins;
pub mod pvrz;
pub mod utils;

// Re-exports for convenience
pub use error::{Error, Result};

/// Prelude module for common imports
pub mod prelude {
    pub use crate::config::{Config, GameVariant};
    pub use crate::error::{Error, Result};
    pub use crate::formats::{Bam, Bmp, Chu, Dlg, Key, Mos, Mve, Plt, Pro, Tis, TwoDa, Wed, Wmp};
    pub use crate::ids::{IdsCache, IdsTable, SymbolSource};
    pub use crate::palette::Palette;

    // Script pipeline
    pub use crate::bcs::{Compiler, Decompiler, Script, compile_to_bytes, decompile_bytes};

    // Plugin lifecycle
    pub use crate::plugins::{BatchReport, FormatPlugin, Operation, PluginContext, PluginManager, ResourceType};
    pub use crate::pvrz::{PageNamer, PageSpace};
}

pub const VERSION: &str = env!("CARGO_PKG_VERSION");

// CLI module (feature-gated)
#[cfg(feature = "cli")]
pub mod cli;

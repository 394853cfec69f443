//! Format plugins
//!
//! A plugin runs the extract / upscale / assemble lifecycle of one resource
//! type on top of the container codecs:
//!
//! - extract: `<game_dir>/<RESOURCE>` to `<extract_dir>/<RESOURCE>/`
//! - upscale: extracted files (or the original, for binary-only formats) to
//!   `<upscaled_dir>/<RESOURCE>/`
//! - assemble: upscaled files (falling back to the extracted ones) to
//!   `<assemble_dir>/<RESOURCE>`
//!
//! ```no_run
//! use infinitykit::config::Config;
//! use infinitykit::plugins::{Operation, PluginContext, PluginManager, ResourceType};
//!
//! let config = Config::default();
//! let context = PluginContext::new(&config);
//! let manager = PluginManager::new();
//! let report = manager.run(&context, Operation::Extract, ResourceType::Bam, &["CDMF4G1.BAM".to_string()]);
//! println!("{} ok, {} failed", report.success_count, report.fail_count);
//! ```

mod bam;
mod bcs;
mod binary;
mod dlg;
mod io;
mod key;
mod mos;
mod mve;
mod plt;
mod png;
mod tis;

use std::fmt;

use crate::config::Config;
use crate::error::{Error, Result};
use crate::ids::{IdsCache, SymbolSource};
use crate::pvrz::PageNamer;

pub use io::{META_FILE, scale_image};

/// Lifecycle step
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    Extract,
    Upscale,
    Assemble,
}

impl Operation {
    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            Operation::Extract => "extract",
            Operation::Upscale => "upscale",
            Operation::Assemble => "assemble",
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Resource types with a plugin
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResourceType {
    Bam,
    Bcs,
    Bmp,
    Chu,
    Dlg,
    Key,
    Mos,
    Mve,
    Plt,
    Png,
    Pro,
    Tis,
    TwoDa,
    Wed,
    Wmp,
}

impl ResourceType {
    pub const ALL: [ResourceType; 15] = [
        ResourceType::Bam,
        ResourceType::Bcs,
        ResourceType::Bmp,
        ResourceType::Chu,
        ResourceType::Dlg,
        ResourceType::Key,
        ResourceType::Mos,
        ResourceType::Mve,
        ResourceType::Plt,
        ResourceType::Png,
        ResourceType::Pro,
        ResourceType::Tis,
        ResourceType::TwoDa,
        ResourceType::Wed,
        ResourceType::Wmp,
    ];

    /// File extension, uppercase
    #[must_use]
    pub fn extension(self) -> &'static str {
        match self {
            ResourceType::Bam => "BAM",
            ResourceType::Bcs => "BCS",
            ResourceType::Bmp => "BMP",
            ResourceType::Chu => "CHU",
            ResourceType::Dlg => "DLG",
            ResourceType::Key => "KEY",
            ResourceType::Mos => "MOS",
            ResourceType::Mve => "MVE",
            ResourceType::Plt => "PLT",
            ResourceType::Png => "PNG",
            ResourceType::Pro => "PRO",
            ResourceType::Tis => "TIS",
            ResourceType::TwoDa => "2DA",
            ResourceType::Wed => "WED",
            ResourceType::Wmp => "WMP",
        }
    }

    /// Type for a file extension (case-insensitive)
    pub fn from_extension(extension: &str) -> Result<Self> {
        Self::ALL
            .into_iter()
            .find(|t| t.extension().eq_ignore_ascii_case(extension))
            .ok_or_else(|| Error::UnsupportedResourceType(extension.to_string()))
    }

    /// `NAME` or `NAME.EXT` as `NAME.EXT` with this type's extension
    #[must_use]
    pub fn resource_name(self, resource: &str) -> String {
        let (stem, _) = crate::utils::split_resource_name(resource);
        format!("{stem}.{}", self.extension())
    }
}

impl fmt::Display for ResourceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}

/// Shared services handed to every plugin call
pub struct PluginContext<'a> {
    pub config: &'a Config,
    pub ids: &'a dyn SymbolSource,
    pub namer: &'a PageNamer,
}

impl<'a> PluginContext<'a> {
    /// Context backed by the process-wide IDS cache and page namer
    #[must_use]
    pub fn new(config: &'a Config) -> Self {
        Self {
            config,
            ids: IdsCache::global(),
            namer: PageNamer::global(),
        }
    }

    #[must_use]
    pub fn with_ids(mut self, ids: &'a dyn SymbolSource) -> Self {
        self.ids = ids;
        self
    }

    #[must_use]
    pub fn with_namer(mut self, namer: &'a PageNamer) -> Self {
        self.namer = namer;
        self
    }

    #[must_use]
    pub fn factor(&self) -> u32 {
        self.config.upscale_factor.max(1)
    }
}

/// Extract, upscale and assemble one resource type
pub trait FormatPlugin: Send + Sync {
    fn resource_type(&self) -> ResourceType;

    /// Convert a game resource into editable files
    fn extract(&self, context: &PluginContext<'_>, resource: &str) -> Result<()>;

    /// Scale the editable files (or the resource itself) by the configured factor
    fn upscale(&self, context: &PluginContext<'_>, resource: &str) -> Result<()>;

    /// Build the game resource back from the editable files
    fn assemble(&self, context: &PluginContext<'_>, resource: &str) -> Result<()>;
}

/// Result of a batch run
#[derive(Debug, Clone, Default)]
pub struct BatchReport {
    /// Number of successful operations
    pub success_count: usize,
    /// Number of failed operations
    pub fail_count: usize,
    /// Message for each resource processed
    pub results: Vec<String>,
}

impl BatchReport {
    #[must_use]
    pub fn all_succeeded(&self) -> bool {
        self.fail_count == 0
    }
}

/// Registry of every format plugin
pub struct PluginManager {
    plugins: Vec<Box<dyn FormatPlugin>>,
}

impl Default for PluginManager {
    fn default() -> Self {
        Self::new()
    }
}

impl PluginManager {
    #[must_use]
    pub fn new() -> Self {
        let mut plugins: Vec<Box<dyn FormatPlugin>> = vec![
            Box::new(bam::BamPlugin),
            Box::new(bcs::BcsPlugin),
            Box::new(dlg::DlgPlugin),
            Box::new(key::KeyPlugin),
            Box::new(mos::MosPlugin),
            Box::new(mve::MvePlugin),
            Box::new(plt::PltPlugin),
            Box::new(png::PngPlugin),
            Box::new(tis::TisPlugin),
        ];
        plugins.extend(binary::plugins());
        Self { plugins }
    }

    pub fn plugin(&self, resource_type: ResourceType) -> Result<&dyn FormatPlugin> {
        self.plugins
            .iter()
            .find(|p| p.resource_type() == resource_type)
            .map(AsRef::as_ref)
            .ok_or_else(|| Error::UnsupportedResourceType(resource_type.extension().to_string()))
    }

    /// Run one operation on one resource
    pub fn run_one(
        &self,
        context: &PluginContext<'_>,
        operation: Operation,
        resource_type: ResourceType,
        resource: &str,
    ) -> Result<()> {
        let plugin = self.plugin(resource_type)?;
        let resource = resource_type.resource_name(resource);
        tracing::info!("{operation} {resource}");
        match operation {
            Operation::Extract => plugin.extract(context, &resource),
            Operation::Upscale => plugin.upscale(context, &resource),
            Operation::Assemble => plugin.assemble(context, &resource),
        }
    }

    /// Run one operation on every resource in order
    ///
    /// A failing resource is logged and counted; the batch continues.
    pub fn run(
        &self,
        context: &PluginContext<'_>,
        operation: Operation,
        resource_type: ResourceType,
        resources: &[String],
    ) -> BatchReport {
        self.run_with_progress(context, operation, resource_type, resources, |_, _, _| {})
    }

    /// [`Self::run`] with a `(current, total, resource)` callback before each item
    pub fn run_with_progress<F>(
        &self,
        context: &PluginContext<'_>,
        operation: Operation,
        resource_type: ResourceType,
        resources: &[String],
        progress: F,
    ) -> BatchReport
    where
        F: Fn(usize, usize, &str),
    {
        let mut report = BatchReport::default();
        let total = resources.len();
        for (i, resource) in resources.iter().enumerate() {
            progress(i + 1, total, resource);
            match self.run_one(context, operation, resource_type, resource) {
                Ok(()) => {
                    report.success_count += 1;
                    report.results.push(format!("{operation}: {resource}"));
                }
                Err(e) => {
                    tracing::error!("Failed to {operation} {resource}: {e}");
                    report.fail_count += 1;
                    report.results.push(format!("Failed {resource}: {e}"));
                }
            }
        }
        report
    }
}

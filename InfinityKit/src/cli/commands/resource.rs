//! Run one lifecycle operation over a list of resources

use std::time::Instant;

use crate::cli::Settings;
use crate::cli::progress::{self, LOOKING_GLASS};
use crate::ids::IdsCache;
use crate::plugins::{Operation, PluginContext, PluginManager, ResourceType};
use crate::pvrz::PageNamer;

/// Formats whose operations read or write script text
fn needs_ids(resource_type: ResourceType) -> bool {
    matches!(resource_type, ResourceType::Bcs | ResourceType::Dlg)
}

/// Execute `operation` on every resource in order.
///
/// # Errors
/// Returns an error if the IDS tables in the game directory cannot be read.
pub fn execute(
    settings: &Settings,
    resource_type: ResourceType,
    operation: Operation,
    resources: &[String],
) -> anyhow::Result<bool> {
    let format = resource_type.extension().to_lowercase();
    if resources.is_empty() {
        eprintln!("usage: infinitykit {format} {operation} <resource>...");
        return Ok(false);
    }

    let start = Instant::now();
    let config = &settings.config;
    let steps = if needs_ids(resource_type) { 2 } else { 1 };

    if needs_ids(resource_type) {
        if !settings.quiet {
            progress::print_step(1, steps, LOOKING_GLASS, "Loading IDS tables...");
        }
        let ids = IdsCache::global();
        if config.game_dir.is_dir() {
            ids.initialize_from_dir(&config.game_dir)?;
        }
        if ids.table_names().is_empty() {
            tracing::warn!("No IDS tables in {}; symbols print as numbers", config.game_dir.display());
        }
    }

    if !settings.quiet {
        let msg = format!("Running {operation} on {} {format} resource(s)...", resources.len());
        progress::print_step(steps, steps, progress::operation_emoji(operation), &msg);
    }

    let namer = PageNamer::new(config.pvrz_page_base);
    let context = PluginContext::new(config).with_namer(&namer);
    let manager = PluginManager::new();

    let pb = progress::batch_bar(resources.len() as u64, operation.name(), settings.quiet);
    let report = manager.run_with_progress(&context, operation, resource_type, resources, |current, _, name| {
        pb.set_position(current.saturating_sub(1) as u64);
        pb.set_message(format!("{operation} {name}"));
    });
    pb.finish_and_clear();

    for line in report.results.iter().filter(|r| r.starts_with("Failed")) {
        progress::print_failure(line);
    }
    if !settings.quiet {
        println!(
            "{} succeeded, {} failed",
            report.success_count, report.fail_count
        );
        progress::print_done(start.elapsed());
    }

    Ok(report.all_succeeded())
}

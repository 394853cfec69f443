//! Informational commands

use crate::config::Config;
use crate::plugins::ResourceType;

/// Print the configuration after file and flag overrides
///
/// # Errors
/// Returns an error if the configuration cannot be serialized.
pub fn show(config: &Config) -> anyhow::Result<bool> {
    print!("{}", toml::to_string_pretty(config)?);
    Ok(true)
}

pub fn formats() {
    for resource_type in ResourceType::ALL {
        println!("{}", resource_type.extension().to_lowercase());
    }
}

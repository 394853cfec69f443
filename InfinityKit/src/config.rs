//! Toolkit configuration (infinitykit.toml)

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Default configuration file name, looked up in the working directory
pub const CONFIG_FILE: &str = "infinitykit.toml";

fn default_game_dir() -> PathBuf {
    PathBuf::from("game")
}

fn default_extract_dir() -> PathBuf {
    PathBuf::from("extracted")
}

fn default_upscaled_dir() -> PathBuf {
    PathBuf::from("upscaled")
}

fn default_assemble_dir() -> PathBuf {
    PathBuf::from("assembled")
}

fn default_factor() -> u32 {
    1
}

fn default_page_base() -> u32 {
    1000
}

/// Engine variant; selects script object layouts and variant-only fields
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[cfg_attr(feature = "cli", derive(clap::ValueEnum))]
#[serde(rename_all = "lowercase")]
pub enum GameVariant {
    /// Baldur's Gate
    Bg1,
    /// Baldur's Gate II
    #[default]
    Bg2,
    /// Icewind Dale
    Iwd,
    /// Planescape: Torment
    Pst,
    /// Enhanced Editions
    Ee,
}

impl GameVariant {
    /// Script objects carry a `[x1.y1.x2.y2]` region
    #[must_use]
    pub fn has_object_region(self) -> bool {
        !matches!(self, GameVariant::Bg1)
    }

    /// Script objects carry faction and team fields
    #[must_use]
    pub fn has_faction_team(self) -> bool {
        matches!(self, GameVariant::Pst)
    }
}

/// Settings shared by every format plugin
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default = "default_game_dir")]
    pub game_dir: PathBuf,
    #[serde(default = "default_extract_dir")]
    pub extract_dir: PathBuf,
    #[serde(default = "default_upscaled_dir")]
    pub upscaled_dir: PathBuf,
    #[serde(default = "default_assemble_dir")]
    pub assemble_dir: PathBuf,
    #[serde(default = "default_factor")]
    pub upscale_factor: u32,
    #[serde(default)]
    pub game: GameVariant,
    /// First page number handed out in the shared MOS/BAM PVRZ namespace
    #[serde(default = "default_page_base")]
    pub pvrz_page_base: u32,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            game_dir: default_game_dir(),
            extract_dir: default_extract_dir(),
            upscaled_dir: default_upscaled_dir(),
            assemble_dir: default_assemble_dir(),
            upscale_factor: default_factor(),
            game: GameVariant::default(),
            pvrz_page_base: default_page_base(),
        }
    }
}

impl Config {
    /// Parse a TOML document, expanding `~` in directory settings
    pub fn from_toml(text: &str) -> Result<Self> {
        let mut config: Config = toml::from_str(text)?;
        config.expand_paths()?;
        config.validate()?;
        Ok(config)
    }

    /// Load a configuration file; a missing file yields the defaults
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            tracing::debug!("No config at {}, using defaults", path.display());
            return Ok(Self::default());
        }
        Self::from_toml(&std::fs::read_to_string(path)?)
    }

    pub fn validate(&self) -> Result<()> {
        if self.upscale_factor == 0 {
            return Err(Error::InvalidConfig("upscale_factor must be at least 1".to_string()));
        }
        Ok(())
    }

    fn expand_paths(&mut self) -> Result<()> {
        for dir in [
            &mut self.game_dir,
            &mut self.extract_dir,
            &mut self.upscaled_dir,
            &mut self.assemble_dir,
        ] {
            let raw = dir.to_string_lossy().into_owned();
            let expanded = shellexpand::tilde(&raw);
            *dir = PathBuf::from(expanded.as_ref());
        }
        Ok(())
    }

    /// Extracted files of one resource
    #[must_use]
    pub fn extract_path(&self, resource: &str) -> PathBuf {
        self.extract_dir.join(resource.to_uppercase())
    }

    /// Upscaled files of one resource
    #[must_use]
    pub fn upscaled_path(&self, resource: &str) -> PathBuf {
        self.upscaled_dir.join(resource.to_uppercase())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_when_fields_missing() {
        let config = Config::from_toml("upscale_factor = 2\ngame = \"pst\"\n").unwrap();
        assert_eq!(config.upscale_factor, 2);
        assert_eq!(config.game, GameVariant::Pst);
        assert_eq!(config.extract_dir, PathBuf::from("extracted"));
        assert_eq!(config.pvrz_page_base, 1000);
    }

    #[test]
    fn test_zero_factor_rejected() {
        assert!(matches!(
            Config::from_toml("upscale_factor = 0"),
            Err(Error::InvalidConfig(_))
        ));
    }

    #[test]
    fn test_missing_file_is_default() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config::load(&dir.path().join(CONFIG_FILE)).unwrap();
        assert_eq!(config, Config::default());
    }

    #[test]
    fn test_round_trip() {
        let config = Config {
            game: GameVariant::Ee,
            upscale_factor: 4,
            ..Config::default()
        };
        let text = toml::to_string_pretty(&config).unwrap();
        assert_eq!(Config::from_toml(&text).unwrap(), config);
    }

    #[test]
    fn test_variant_layouts() {
        assert!(!GameVariant::Bg1.has_object_region());
        assert!(GameVariant::Pst.has_faction_team());
        assert!(!GameVariant::Ee.has_faction_team());
    }
}

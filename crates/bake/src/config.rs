//! Bake settings. Loaded from a RON file given on the command line.

use planetgen::PlanetSettings;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// What to generate and where to write the results.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BakeConfig {
    #[serde(default)]
    pub planet: PlanetSettings,
    /// When set, the shape's layer centres are jittered from this seed.
    #[serde(default)]
    pub seed: Option<u64>,
    /// PNG destination for the colour lookup texture.
    #[serde(default = "default_lookup_texture_path")]
    pub lookup_texture_path: PathBuf,
}

fn default_lookup_texture_path() -> PathBuf {
    PathBuf::from("planet_lookup.png")
}

impl Default for BakeConfig {
    fn default() -> Self {
        Self {
            planet: PlanetSettings::default(),
            seed: None,
            lookup_texture_path: default_lookup_texture_path(),
        }
    }
}

impl BakeConfig {
    /// Load config from `path`. If the file is missing or invalid, returns default config.
    pub fn load(path: &Path) -> Self {
        if let Ok(data) = std::fs::read_to_string(path) {
            match ron::from_str(&data) {
                Ok(c) => return c,
                Err(e) => log::warn!("Invalid config at {:?}: {}, using defaults", path, e),
            }
        }
        Self::default()
    }

    /// Save config to `path`. Logs on error.
    pub fn save(&self, path: &Path) {
        match ron::ser::to_string_pretty(self, ron::ser::PrettyConfig::default()) {
            Ok(s) => {
                if let Err(e) = std::fs::write(path, s) {
                    log::warn!("Could not write config to {:?}: {}", path, e);
                }
            }
            Err(e) => log::warn!("Could not serialize config: {}", e),
        }
    }

    /// Planet settings with the seed applied.
    pub fn planet_settings(&self) -> PlanetSettings {
        let mut settings = self.planet.clone();
        if let Some(seed) = self.seed {
            settings.shape = settings.shape.randomized(seed);
        }
        settings
    }
}

//! Build configuration.

use crate::duplicates::DuplicateReport;
use crate::error::{Error, Result};
use crate::package::PACKAGE_EXTENSION;
use crate::types::{ValueMode, MIDI_MAX};
use crate::zones::ZoneSettings;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Everything a build needs besides the sample directory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BuildConfig {
    /// Instrument and package name (defaults to the directory name)
    pub name: Option<String>,
    /// Written as the instrument's creator
    pub author: String,
    /// Crossfade width between neighbouring key ranges
    pub key_fade: u8,
    /// Dimension driven by the numbers in the file names
    pub mode: ValueMode,
    /// Crossfade width between velocity or selection bands
    pub secondary_fade: u8,
    /// Spread samples sharing a key over the selection axis with this fade
    pub redistribute_fade: Option<u8>,
    /// Deflate archive entries
    pub compress: bool,
    /// Where the package goes (defaults to the sample directory)
    pub output_dir: Option<PathBuf>,
}

impl Default for BuildConfig {
    fn default() -> Self {
        Self {
            name: None,
            author: String::new(),
            key_fade: 0,
            mode: ValueMode::Velocity,
            secondary_fade: 0,
            redistribute_fade: None,
            compress: true,
            output_dir: None,
        }
    }
}

impl BuildConfig {
    /// Check value ranges.
    pub fn validate(&self) -> Result<()> {
        let fades = [
            ("key_fade", Some(self.key_fade)),
            ("secondary_fade", Some(self.secondary_fade)),
            ("redistribute_fade", self.redistribute_fade),
        ];
        for (field, value) in fades {
            if let Some(value) = value {
                if value > MIDI_MAX {
                    return Err(Error::Config(format!(
                        "{} must be between 0 and 127, got {}",
                        field, value
                    )));
                }
            }
        }
        Ok(())
    }

    /// The instrument name, falling back to the sample directory's name.
    pub fn instrument_name(&self, dir: &Path) -> Result<String> {
        let name = match &self.name {
            Some(name) => name.trim().to_string(),
            None => dir
                .canonicalize()
                .unwrap_or_else(|_| dir.to_path_buf())
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_default(),
        };

        if name.is_empty() {
            return Err(Error::Config("instrument name must not be empty".to_string()));
        }
        if name.contains(['/', '\\']) {
            return Err(Error::Config(format!(
                "instrument name '{}' must not contain path separators",
                name
            )));
        }
        Ok(name)
    }

    /// Path of the package for instrument `name` built from `dir`.
    pub fn archive_path(&self, dir: &Path, name: &str) -> PathBuf {
        let out = self.output_dir.as_deref().unwrap_or(dir);
        out.join(format!("{}.{}", name, PACKAGE_EXTENSION))
    }

    /// Zone settings for a batch.
    ///
    /// Redistribution is only kept when some key holds more than one sample
    /// and the mode is velocity; otherwise it is dropped with a warning.
    pub fn zone_settings(&self, duplicates: &DuplicateReport) -> ZoneSettings {
        let redistribute_fade = match self.redistribute_fade {
            Some(_) if self.mode != ValueMode::Velocity => {
                log::warn!("Redistribution needs velocity mode, ignoring it");
                None
            }
            Some(_) if !duplicates.has_duplicates() => {
                log::warn!("No key has more than one sample, nothing to redistribute");
                None
            }
            other => other,
        };

        ZoneSettings {
            key_fade: self.key_fade,
            mode: self.mode,
            secondary_fade: self.secondary_fade,
            redistribute_fade,
        }
    }
}

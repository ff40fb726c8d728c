//! Configuration file support for multisampler
//!
//! Configuration is stored in TOML format at:
//! - Linux: `~/.config/multisampler/config.toml`
//! - macOS: `~/Library/Application Support/multisampler/config.toml`
//! - Windows: `%APPDATA%\multisampler\config.toml`
//!
//! Every key is optional; missing keys keep their built-in defaults and
//! command-line flags override whatever the file sets.

use anyhow::{bail, Context, Result};
use directories::ProjectDirs;
use multisampler_core::BuildConfig;
use std::fs;
use std::path::{Path, PathBuf};

const DEFAULT_CONFIG: &str = r#"# multisampler configuration file

# Written as the instrument's creator
author = ""

# Crossfade width between neighbouring key ranges (0-127)
key_fade = 0

# What the number after the note means: "velocity" or "selection"
mode = "velocity"

# Crossfade width between velocity or selection bands (0-127)
secondary_fade = 0

# Spread samples sharing a key evenly over the selection axis,
# with this crossfade width (velocity mode only)
# redistribute_fade = 2

# Deflate samples inside the package
compress = true

# Where packages are written (default: next to the samples)
# output_dir = "/path/to/instruments"
"#;

/// Get the default configuration file path
pub fn config_path() -> Result<PathBuf> {
    match ProjectDirs::from("", "", "multisampler") {
        Some(dirs) => Ok(dirs.config_dir().join("config.toml")),
        None => bail!("Could not determine config directory"),
    }
}

/// Load the build configuration.
///
/// An explicit `path` must exist. Without one the default location is used
/// when a file is there, built-in defaults otherwise.
pub fn load(path: Option<&Path>) -> Result<BuildConfig> {
    let path = match path {
        Some(path) => path.to_path_buf(),
        None => {
            let default = config_path()?;
            if !default.exists() {
                log::debug!("No config file at {}, using defaults", default.display());
                return Ok(BuildConfig::default());
            }
            default
        }
    };

    let content = fs::read_to_string(&path)
        .with_context(|| format!("Failed to read config file {}", path.display()))?;
    let config = parse(&content)
        .with_context(|| format!("Invalid config file {}", path.display()))?;
    log::debug!("Loaded config from {}", path.display());
    Ok(config)
}

fn parse(content: &str) -> Result<BuildConfig> {
    Ok(toml::from_str(content)?)
}

/// Write a commented default config file to the default location.
pub fn create_default_config_file() -> Result<PathBuf> {
    let path = config_path()?;
    write_default_config(&path)?;
    Ok(path)
}

fn write_default_config(path: &Path) -> Result<()> {
    if path.exists() {
        bail!("Config file already exists at {}", path.display());
    }
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create {}", parent.display()))?;
    }
    fs::write(path, DEFAULT_CONFIG)
        .with_context(|| format!("Failed to write {}", path.display()))?;
    Ok(())
}

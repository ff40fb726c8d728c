//! Multisample package building.
//!
//! This crate turns a directory of audio samples into a `.multisample`
//! package:
//! - Sample file names are parsed for a note (`C3`, `F#4`) and an optional
//!   secondary value (`C3-64`)
//! - Samples are assigned key ranges and velocity or selection bands, with
//!   optional crossfades
//! - The zones are written as a `multisample.xml` descriptor and zipped
//!   together with the samples
//!
//! # Example
//!
//! ```ignore
//! use multisampler_core::{build_package, BuildConfig, FsPackageIo};
//!
//! let config = BuildConfig {
//!     key_fade: 2,
//!     ..Default::default()
//! };
//! let outcome = build_package(
//!     Path::new("samples/piano"),
//!     &config,
//!     &mut FsPackageIo,
//!     &mut |done, total, name| println!("{}/{} {}", done, total, name),
//! )?;
//! println!("wrote {}", outcome.archive_path.display());
//! ```

pub mod build;
pub mod config;
pub mod descriptor;
pub mod duplicates;
pub mod error;
pub mod filename;
pub mod notes;
pub mod package;
pub mod scan;
pub mod types;
pub mod zones;

pub use build::{build_package, plan, write_package, BuildOutcome, BuildPlan, ProgressCallback};
pub use config::BuildConfig;
pub use descriptor::{render_descriptor, InstrumentInfo, DESCRIPTOR_FILE};
pub use duplicates::DuplicateReport;
pub use error::{Error, Result};
pub use filename::{parse_filename, Rejection};
pub use package::{ArchiveEntry, Compression, FsPackageIo, PackageIo, PACKAGE_EXTENSION};
pub use scan::{scan_directory, ScanReport};
pub use types::*;
pub use zones::{assign_zones, ZoneSettings};

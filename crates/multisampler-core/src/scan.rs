//! Sample directory scanning.

use crate::error::Result;
use crate::filename::{parse_filename, Rejection};
use crate::types::{ParsedDescriptor, ValueMode};
use std::fs;
use std::path::Path;

/// Outcome of scanning a sample directory.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ScanReport {
    /// Accepted samples, ordered by file name.
    pub descriptors: Vec<ParsedDescriptor>,
    /// Files that were not accepted, with the reason.
    pub rejections: Vec<(String, Rejection)>,
}

impl ScanReport {
    /// Rejections worth telling the user about.
    pub fn warnings(&self) -> impl Iterator<Item = &(String, Rejection)> {
        self.rejections.iter().filter(|(_, rejection)| rejection.is_warning())
    }
}

/// Parse every regular file directly inside `dir`.
///
/// File names are sorted first so the result does not depend on the order the
/// filesystem lists them in. Subdirectories and names that are not valid
/// UTF-8 are skipped.
pub fn scan_directory(dir: &Path, mode: ValueMode) -> Result<ScanReport> {
    let mut names = Vec::new();
    for entry in fs::read_dir(dir)? {
        let entry = entry?;
        if !entry.file_type()?.is_file() {
            log::debug!("Skipping non-file entry {}", entry.path().display());
            continue;
        }
        match entry.file_name().into_string() {
            Ok(name) => names.push(name),
            Err(name) => log::debug!("Skipping non UTF-8 file name {:?}", name),
        }
    }
    names.sort();

    let mut report = ScanReport::default();
    for name in names {
        match parse_filename(&name, mode) {
            Ok(desc) => report.descriptors.push(desc),
            Err(rejection) => report.rejections.push((name, rejection)),
        }
    }

    log::info!(
        "Found {} samples in {} ({} files skipped)",
        report.descriptors.len(),
        dir.display(),
        report.rejections.len()
    );

    Ok(report)
}

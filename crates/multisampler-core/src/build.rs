//! The build pipeline: sample directory in, package archive out.

use crate::config::BuildConfig;
use crate::descriptor::{render_descriptor, InstrumentInfo, DESCRIPTOR_FILE};
use crate::duplicates::DuplicateReport;
use crate::error::{Error, Result};
use crate::package::{ArchiveEntry, Compression, PackageIo};
use crate::scan::{scan_directory, ScanReport};
use crate::types::Zone;
use crate::zones::{assign_zones, ZoneSettings};
use std::path::{Path, PathBuf};

/// Progress callback, called after each sample read with
/// `(samples_done, samples_total, file_name)`.
pub type ProgressCallback<'a> = &'a mut dyn FnMut(usize, usize, &str);

/// Everything decided before any archive I/O happens.
#[derive(Clone, Debug)]
pub struct BuildPlan {
    /// Directory the samples are read from
    pub sample_dir: PathBuf,
    /// Where the package will be written
    pub archive_path: PathBuf,
    pub info: InstrumentInfo,
    pub scan: ScanReport,
    pub duplicates: DuplicateReport,
    /// Settings actually used, after redistribution was offered or dropped
    pub settings: ZoneSettings,
    pub zones: Vec<Zone>,
    /// Rendered descriptor markup
    pub descriptor: String,
}

/// Result of a finished build.
#[derive(Clone, Debug)]
pub struct BuildOutcome {
    pub archive_path: PathBuf,
    pub zone_count: usize,
    pub archive_size: u64,
}

/// Scan `dir`, assign zones and render the descriptor without writing anything.
///
/// # Errors
///
/// - [`Error::Config`] for an invalid configuration
/// - [`Error::NoSamples`] when no file in `dir` is a usable sample
/// - [`Error::InvalidNote`] when a note cannot be resolved to a key
pub fn plan(dir: &Path, config: &BuildConfig) -> Result<BuildPlan> {
    config.validate()?;
    let name = config.instrument_name(dir)?;
    let archive_path = config.archive_path(dir, &name);

    let scan = scan_directory(dir, config.mode)?;
    if scan.descriptors.is_empty() {
        return Err(Error::NoSamples);
    }

    let duplicates = DuplicateReport::from_descriptors(&scan.descriptors)?;
    if duplicates.has_duplicates() {
        log::info!(
            "Keys with more than one sample: {:?}",
            duplicates.duplicate_keys()
        );
    }
    for (key, tag, count) in duplicates.shared_groups() {
        log::debug!("{} samples on key {} share group '{}'", count, key, tag);
    }

    let settings = config.zone_settings(&duplicates);
    let zones = assign_zones(&scan.descriptors, &settings)?;
    log::info!("Assigned {} zones ({} mode)", zones.len(), settings.mode);

    let info = InstrumentInfo {
        name,
        author: config.author.clone(),
    };
    let descriptor = render_descriptor(&info, &zones, &settings)?;

    Ok(BuildPlan {
        sample_dir: dir.to_path_buf(),
        archive_path,
        info,
        scan,
        duplicates,
        settings,
        zones,
        descriptor,
    })
}

/// Build the package for `dir` and write it through `io`.
///
/// The archive is assembled in memory and written in one go, so a failure
/// while reading samples leaves nothing behind.
///
/// # Errors
///
/// Everything [`plan`] reports, plus [`Error::ArchiveExists`] when the target
/// is already there and any I/O error while reading samples or writing.
pub fn build_package(
    dir: &Path,
    config: &BuildConfig,
    io: &mut dyn PackageIo,
    progress: ProgressCallback,
) -> Result<BuildOutcome> {
    let plan = plan(dir, config)?;
    write_package(&plan, config.compress, io, progress)
}

/// Write the package for an existing plan.
pub fn write_package(
    plan: &BuildPlan,
    compress: bool,
    io: &mut dyn PackageIo,
    progress: ProgressCallback,
) -> Result<BuildOutcome> {
    if io.exists(&plan.archive_path) {
        return Err(Error::ArchiveExists(plan.archive_path.clone()));
    }

    let compression = Compression::from_toggle(compress);
    let mut entries = Vec::with_capacity(plan.zones.len() + 1);
    entries.push(ArchiveEntry {
        name: DESCRIPTOR_FILE.to_string(),
        bytes: plan.descriptor.clone().into_bytes(),
        compression,
    });

    let total = plan.zones.len();
    for (index, zone) in plan.zones.iter().enumerate() {
        let path = plan.sample_dir.join(&zone.source_name);
        log::debug!("Reading {}", path.display());
        let bytes = io.read_bytes(&path)?;
        entries.push(ArchiveEntry {
            name: zone.source_name.clone(),
            bytes,
            compression,
        });
        progress(index + 1, total, &zone.source_name);
    }

    let archive_size = io.write_archive(&plan.archive_path, &entries)?;
    log::info!(
        "Wrote {} ({} zones, {} bytes)",
        plan.archive_path.display(),
        total,
        archive_size
    );

    Ok(BuildOutcome {
        archive_path: plan.archive_path.clone(),
        zone_count: total,
        archive_size,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::fs::File;

    /// In-memory package I/O that records what the pipeline asked for.
    #[derive(Default)]
    struct MemoryIo {
        existing: Vec<PathBuf>,
        files: HashMap<PathBuf, Vec<u8>>,
        reads: Vec<PathBuf>,
        written: Option<(PathBuf, Vec<ArchiveEntry>)>,
    }

    impl PackageIo for MemoryIo {
        fn exists(&self, archive_path: &Path) -> bool {
            self.existing.iter().any(|p| p == archive_path)
        }

        fn read_bytes(&mut self, path: &Path) -> Result<Vec<u8>> {
            self.reads.push(path.to_path_buf());
            self.files.get(path).cloned().ok_or_else(|| {
                Error::Io(std::io::Error::new(
                    std::io::ErrorKind::NotFound,
                    path.display().to_string(),
                ))
            })
        }

        fn write_archive(&mut self, archive_path: &Path, entries: &[ArchiveEntry]) -> Result<u64> {
            self.written = Some((archive_path.to_path_buf(), entries.to_vec()));
            Ok(entries.iter().map(|e| e.bytes.len() as u64).sum())
        }
    }

    fn sample_dir(names: &[&str]) -> (tempfile::TempDir, MemoryIo) {
        let dir = tempfile::tempdir().unwrap();
        let mut io = MemoryIo::default();
        for name in names {
            let path = dir.path().join(name);
            File::create(&path).unwrap();
            io.files.insert(path, name.as_bytes().to_vec());
        }
        (dir, io)
    }

    fn config() -> BuildConfig {
        BuildConfig {
            name: Some("Test".to_string()),
            ..Default::default()
        }
    }

    #[test]
    fn test_build_reads_each_sample_once_in_zone_order() {
        let (dir, mut io) = sample_dir(&["D3.wav", "C3.wav", "C3-40.wav", "readme.txt"]);
        let mut calls = Vec::new();
        let outcome = build_package(dir.path(), &config(), &mut io, &mut |done, total, name| {
            calls.push((done, total, name.to_string()))
        })
        .unwrap();

        assert_eq!(outcome.zone_count, 3);
        assert_eq!(outcome.archive_path, dir.path().join("Test.multisample"));

        let read: Vec<PathBuf> = ["C3-40.wav", "C3.wav", "D3.wav"]
            .iter()
            .map(|n| dir.path().join(n))
            .collect();
        assert_eq!(io.reads, read);
        assert_eq!(calls.last().unwrap(), &(3, 3, "D3.wav".to_string()));

        let (path, entries) = io.written.unwrap();
        assert_eq!(path, dir.path().join("Test.multisample"));
        let names: Vec<&str> = entries.iter().map(|e| e.name.as_str()).collect();
        assert_eq!(names, vec!["multisample.xml", "C3-40.wav", "C3.wav", "D3.wav"]);
        assert_eq!(entries[1].bytes, b"C3-40.wav".to_vec());
        assert!(entries.iter().all(|e| e.compression == Compression::Deflated));
    }

    #[test]
    fn test_build_refuses_existing_archive() {
        let (dir, mut io) = sample_dir(&["C3.wav"]);
        io.existing.push(dir.path().join("Test.multisample"));

        let result = build_package(dir.path(), &config(), &mut io, &mut |_, _, _| {});
        assert!(matches!(result, Err(Error::ArchiveExists(_))));
        assert!(io.reads.is_empty());
        assert!(io.written.is_none());
    }

    #[test]
    fn test_build_without_samples() {
        let (dir, mut io) = sample_dir(&["notes.txt", "x9.wav"]);
        let result = build_package(dir.path(), &config(), &mut io, &mut |_, _, _| {});
        assert!(matches!(result, Err(Error::NoSamples)));
        assert!(io.written.is_none());
    }

    #[test]
    fn test_unreadable_sample_aborts_before_writing() {
        let (dir, mut io) = sample_dir(&["C3.wav", "D3.wav"]);
        io.files.remove(&dir.path().join("D3.wav"));

        let result = build_package(dir.path(), &config(), &mut io, &mut |_, _, _| {});
        assert!(matches!(result, Err(Error::Io(_))));
        assert!(io.written.is_none());
    }

    #[test]
    fn test_plan_drops_redistribution_without_duplicates() {
        let (dir, _) = sample_dir(&["C3.wav", "D3.wav"]);
        let config = BuildConfig {
            redistribute_fade: Some(2),
            ..config()
        };
        let plan = plan(dir.path(), &config).unwrap();
        assert_eq!(plan.settings.redistribute_fade, None);
        assert!(plan.zones.iter().all(|z| !z.redistributed));
    }

    #[test]
    fn test_stored_entries_without_compression() {
        let (dir, mut io) = sample_dir(&["C3.wav"]);
        let config = BuildConfig {
            compress: false,
            ..config()
        };
        build_package(dir.path(), &config, &mut io, &mut |_, _, _| {}).unwrap();
        let (_, entries) = io.written.unwrap();
        assert!(entries.iter().all(|e| e.compression == Compression::Stored));
    }
}

//! Package archive I/O.
//!
//! A package is a zip archive holding the descriptor plus a verbatim copy of
//! every referenced sample. The pipeline talks to the filesystem only through
//! [`PackageIo`], which keeps the zone logic testable without touching disk.

use crate::error::{Error, Result};
use std::fs::{self, OpenOptions};
use std::io::{Cursor, ErrorKind, Write};
use std::path::Path;
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

/// File extension of a package archive.
pub const PACKAGE_EXTENSION: &str = "multisample";

/// How an entry is stored in the archive.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Compression {
    Stored,
    Deflated,
}

impl Compression {
    pub fn from_toggle(compress: bool) -> Self {
        if compress {
            Self::Deflated
        } else {
            Self::Stored
        }
    }

    fn method(self) -> CompressionMethod {
        match self {
            Self::Stored => CompressionMethod::Stored,
            Self::Deflated => CompressionMethod::Deflated,
        }
    }
}

/// One file of the archive.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ArchiveEntry {
    pub name: String,
    pub bytes: Vec<u8>,
    pub compression: Compression,
}

/// File access needed to assemble a package.
pub trait PackageIo {
    /// Whether something already sits at `archive_path`.
    fn exists(&self, archive_path: &Path) -> bool;

    /// Read one sample file completely.
    fn read_bytes(&mut self, path: &Path) -> Result<Vec<u8>>;

    /// Write all entries as one archive, returning the archive size in bytes.
    ///
    /// Must fail with [`Error::ArchiveExists`] rather than replace an existing
    /// file.
    fn write_archive(&mut self, archive_path: &Path, entries: &[ArchiveEntry]) -> Result<u64>;
}

/// [`PackageIo`] backed by the local filesystem.
#[derive(Clone, Copy, Debug, Default)]
pub struct FsPackageIo;

impl PackageIo for FsPackageIo {
    fn exists(&self, archive_path: &Path) -> bool {
        archive_path.exists()
    }

    fn read_bytes(&mut self, path: &Path) -> Result<Vec<u8>> {
        Ok(fs::read(path)?)
    }

    fn write_archive(&mut self, archive_path: &Path, entries: &[ArchiveEntry]) -> Result<u64> {
        let bytes = encode_zip(entries)?;

        // create_new also catches a file that appeared after the exists() check
        let mut file = match OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(archive_path)
        {
            Ok(file) => file,
            Err(e) if e.kind() == ErrorKind::AlreadyExists => {
                return Err(Error::ArchiveExists(archive_path.to_path_buf()));
            }
            Err(e) => return Err(e.into()),
        };

        if let Err(e) = file.write_all(&bytes).and_then(|_| file.sync_all()) {
            drop(file);
            if let Err(cleanup) = fs::remove_file(archive_path) {
                log::warn!(
                    "Could not remove partial package {}: {}",
                    archive_path.display(),
                    cleanup
                );
            }
            return Err(e.into());
        }

        Ok(bytes.len() as u64)
    }
}

/// Encode entries into an in-memory zip archive, in the given order.
pub fn encode_zip(entries: &[ArchiveEntry]) -> Result<Vec<u8>> {
    let mut zip = ZipWriter::new(Cursor::new(Vec::new()));

    for entry in entries {
        let options = SimpleFileOptions::default().compression_method(entry.compression.method());
        zip.start_file(entry.name.as_str(), options)?;
        zip.write_all(&entry.bytes)?;
    }

    Ok(zip.finish()?.into_inner())
}

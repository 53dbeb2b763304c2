//! Removal of document-property parts from OOXML containers.
//!
//! An archive is never patched in place. Every entry that is not
//! property-bearing is raw-copied (compressed bytes untouched) into a
//! temporary archive next to the original, and only a fully written and
//! synced temporary is renamed over the original path.

use crate::error::StripError;
use std::fs::{self, File};
use std::io::{self, BufReader, BufWriter, Read, Seek, SeekFrom};
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use tracing::debug;
use zip::{ZipArchive, ZipWriter};

/// First two bytes of every ZIP-family container.
pub const ARCHIVE_SIGNATURE: [u8; 2] = [0x50, 0x4B];

/// Entry-name prefixes that carry document metadata rather than content.
pub const PROPERTY_PREFIXES: &[&str] = &["docProps/", "customXml/"];

const CONTENT_TYPES_ENTRY: &str = "[Content_Types].xml";

/// `true` when the entry must be dropped. Matching is exact and
/// case-sensitive on the archive-internal name.
pub fn is_property_entry(name: &str) -> bool {
    PROPERTY_PREFIXES
        .iter()
        .any(|prefix| name.starts_with(prefix))
}

/// Cheap format gate: does the file start with `PK`?
///
/// Files shorter than the signature are reported as `false`; open and read
/// failures are returned as errors so callers can tell "locked" from "wrong
/// format".
pub fn has_archive_signature(path: &Path) -> io::Result<bool> {
    let mut file = File::open(path)?;
    read_signature(&mut file)
}

fn read_signature<R: Read>(reader: &mut R) -> io::Result<bool> {
    let mut header = [0u8; 2];
    match reader.read_exact(&mut header) {
        Ok(()) => Ok(header == ARCHIVE_SIGNATURE),
        Err(e) if e.kind() == io::ErrorKind::UnexpectedEof => Ok(false),
        Err(e) => Err(e),
    }
}

#[derive(Debug, Clone, Copy)]
pub struct StripOptions {
    /// Reject archives without `[Content_Types].xml` (e.g. a plain ZIP
    /// renamed to `.docx`).
    pub require_content_types: bool,
}

impl Default for StripOptions {
    fn default() -> Self {
        Self {
            require_content_types: true,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StripStats {
    pub kept_files: usize,
    pub kept_dirs: usize,
    pub removed: usize,
}

/// A rewritten archive waiting to replace its original.
///
/// Dropping it without calling [`StagedArchive::commit`] deletes the
/// temporary file and leaves the original exactly as it was.
#[derive(Debug)]
pub struct StagedArchive {
    target: PathBuf,
    temp: Option<NamedTempFile>,
    stats: StripStats,
}

impl StagedArchive {
    pub fn stats(&self) -> StripStats {
        self.stats
    }

    /// Nothing to remove, so there is nothing to swap in.
    pub fn is_noop(&self) -> bool {
        self.temp.is_none()
    }

    pub fn staging_path(&self) -> Option<&Path> {
        self.temp.as_ref().map(|t| t.path())
    }

    /// Atomically rename the staged archive over the original.
    pub fn commit(self) -> Result<StripStats, StripError> {
        if let Some(temp) = self.temp {
            temp.persist(&self.target)?;
            debug!(
                "Replaced {} ({} entries removed)",
                self.target.display(),
                self.stats.removed
            );
        }
        Ok(self.stats)
    }
}

/// Validate `path` and build its property-free replacement without touching
/// the original.
pub fn stage(path: &Path, options: StripOptions) -> Result<StagedArchive, StripError> {
    let mut file = File::open(path)?;
    if !read_signature(&mut file)? {
        return Err(StripError::NotAnArchive);
    }
    file.seek(SeekFrom::Start(0))?;

    let mut archive = ZipArchive::new(BufReader::new(file))?;

    if options.require_content_types && archive.index_for_name(CONTENT_TYPES_ENTRY).is_none() {
        return Err(StripError::NotOfficeDocument);
    }

    let removed = archive
        .file_names()
        .filter(|name| is_property_entry(name))
        .count();

    if removed == 0 {
        let kept_dirs = archive.file_names().filter(|n| n.ends_with('/')).count();
        debug!("{} has no property entries", path.display());
        return Ok(StagedArchive {
            target: path.to_path_buf(),
            temp: None,
            stats: StripStats {
                kept_files: archive.len() - kept_dirs,
                kept_dirs,
                removed: 0,
            },
        });
    }

    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    let mut temp = tempfile::Builder::new()
        .prefix(".cleanmeta-")
        .suffix(".tmp")
        .tempfile_in(dir)?;

    let mut stats = StripStats {
        removed,
        ..StripStats::default()
    };

    {
        let mut writer = ZipWriter::new(BufWriter::new(temp.as_file_mut()));
        for i in 0..archive.len() {
            let entry = archive.by_index_raw(i)?;
            if is_property_entry(entry.name()) {
                continue;
            }
            if entry.is_dir() {
                stats.kept_dirs += 1;
            } else {
                stats.kept_files += 1;
            }
            writer.raw_copy_file(entry)?;
        }
        writer
            .finish()?
            .into_inner()
            .map_err(|e| e.into_error())?;
    }

    temp.as_file().sync_all()?;
    fs::set_permissions(temp.path(), fs::metadata(path)?.permissions())?;

    Ok(StagedArchive {
        target: path.to_path_buf(),
        temp: Some(temp),
        stats,
    })
}

/// Remove every property-bearing entry from the archive at `path`.
pub fn strip_properties(path: &Path, options: StripOptions) -> Result<StripStats, StripError> {
    stage(path, options)?.commit()
}

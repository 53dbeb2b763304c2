use std::ffi::OsString;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

/// `dir/report.docx` with suffix `.bak` becomes `dir/report.docx.bak`.
pub fn backup_path(path: &Path, suffix: &str) -> PathBuf {
    let mut name = path
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_else(OsString::new);
    name.push(suffix);
    path.with_file_name(name)
}

/// Copy `path` to its sibling backup, replacing any earlier backup.
pub fn backup_file(path: &Path, suffix: &str) -> io::Result<PathBuf> {
    let destination = backup_path(path, suffix);
    fs::copy(path, &destination)?;
    Ok(destination)
}

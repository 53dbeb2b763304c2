#[cfg(target_os = "windows")]
pub mod windows;

use std::fs::File;
use std::io;
use std::path::Path;

/// Open `path` for read-write with no sharing, so the call fails while any
/// other process still holds the file.
#[cfg(target_os = "windows")]
pub fn open_exclusive(path: &Path) -> io::Result<File> {
    windows::open_exclusive(path)
}

/// Unix has no mandatory share locks; a successful read-write open is the
/// closest available signal.
#[cfg(not(target_os = "windows"))]
pub fn open_exclusive(path: &Path) -> io::Result<File> {
    std::fs::OpenOptions::new().read(true).write(true).open(path)
}

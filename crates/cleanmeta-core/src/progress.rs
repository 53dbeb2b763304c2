use crate::engine::{BatchReport, FileOutcome};
use crate::error::StripError;
use std::path::Path;

/// Observer for batch progress.
///
/// The CLI implements it with indicatif; tests record events. Stripping runs
/// on the rayon pool, so implementations must be thread-safe.
/// All methods have default no-op implementations.
pub trait BatchReporter: Send + Sync {
    fn on_discovery_complete(&self, _files: usize, _duration_secs: f64) {}
    fn on_backup(&self, _source: &Path, _succeeded: bool) {}
    fn on_convert_start(&self, _source: &Path, _index: usize, _total: usize) {}
    fn on_ready_timeout(&self, _path: &Path) {}
    fn on_convert_complete(&self, _archives: usize, _duration_secs: f64) {}
    fn on_strip_start(&self, _total: usize) {}
    fn on_strip_retry(&self, _path: &Path, _attempt: u32, _error: &StripError) {}
    fn on_file_complete(&self, _outcome: &FileOutcome) {}
    fn on_batch_complete(&self, _report: &BatchReport) {}
}

/// No-op reporter for silent operation.
pub struct SilentReporter;

impl BatchReporter for SilentReporter {}

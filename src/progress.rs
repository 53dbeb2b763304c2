use cleanmeta_core::engine::{BatchReport, FileOutcome};
use cleanmeta_core::{BatchReporter, StripError};
use indicatif::{ProgressBar, ProgressStyle};
use std::path::Path;
use std::sync::Mutex;

/// CLI progress reporter using indicatif progress bars.
///
/// - Conversion phase: progress bar over all discovered files
/// - Strip phase: progress bar over converted archives
pub struct CliReporter {
    bar: Mutex<Option<ProgressBar>>,
}

impl CliReporter {
    pub fn new() -> Self {
        Self {
            bar: Mutex::new(None),
        }
    }

    fn set_bar(&self, pb: ProgressBar) {
        let mut guard = self.bar.lock().unwrap();
        if let Some(old) = guard.take() {
            old.finish_and_clear();
        }
        *guard = Some(pb);
    }

    fn finish_bar(&self) {
        let mut guard = self.bar.lock().unwrap();
        if let Some(pb) = guard.take() {
            pb.finish_and_clear();
        }
    }

    fn with_bar(&self, f: impl FnOnce(&ProgressBar)) {
        let guard = self.bar.lock().unwrap();
        if let Some(pb) = guard.as_ref() {
            f(pb);
        }
    }

    fn phase_bar(label: &str, total: usize) -> ProgressBar {
        let pb = ProgressBar::new(total as u64);
        pb.set_style(
            ProgressStyle::with_template(&format!(
                "  {{spinner:.cyan}} {} [{{bar:30.cyan/dim}}] {{pos}}/{{len}} {{wide_msg}}",
                label
            ))
            .unwrap()
            .progress_chars("━╸─")
            .tick_chars("⠋⠙⠹⠸⠼⠴⠦⠧⠇⠏"),
        );
        pb.enable_steady_tick(std::time::Duration::from_millis(80));
        pb
    }
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

impl BatchReporter for CliReporter {
    fn on_discovery_complete(&self, files: usize, duration_secs: f64) {
        eprintln!(
            "  \x1b[32m✓\x1b[0m Discovery complete: {} files in {:.2}s",
            files, duration_secs
        );
        if files > 0 {
            self.set_bar(Self::phase_bar("Converting", files));
        }
    }

    fn on_convert_start(&self, source: &Path, index: usize, _total: usize) {
        self.with_bar(|pb| {
            pb.set_position(index as u64);
            pb.set_message(file_name(source));
        });
    }

    fn on_ready_timeout(&self, path: &Path) {
        self.with_bar(|pb| {
            pb.println(format!(
                "  \x1b[33m!\x1b[0m {} still busy, continuing anyway",
                file_name(path)
            ))
        });
    }

    fn on_convert_complete(&self, archives: usize, duration_secs: f64) {
        self.finish_bar();
        eprintln!(
            "  \x1b[32m✓\x1b[0m Conversion complete: {} archives in {:.2}s",
            archives, duration_secs
        );
    }

    fn on_strip_start(&self, total: usize) {
        self.set_bar(Self::phase_bar("Stripping", total));
    }

    fn on_strip_retry(&self, path: &Path, attempt: u32, error: &StripError) {
        self.with_bar(|pb| {
            pb.println(format!(
                "  \x1b[33m!\x1b[0m {} retry {}: {}",
                file_name(path),
                attempt,
                error
            ))
        });
    }

    fn on_file_complete(&self, outcome: &FileOutcome) {
        self.with_bar(|pb| {
            if outcome.archive.is_some() {
                pb.inc(1);
            }
            pb.set_message(file_name(&outcome.source));
        });
    }

    fn on_batch_complete(&self, report: &BatchReport) {
        self.finish_bar();
        if report.total() > 0 {
            eprintln!(
                "  \x1b[32m✓\x1b[0m Stripping complete in {:.2}s",
                report.strip_duration.as_secs_f64()
            );
        }
    }
}

use crate::backup;
use crate::config::AppConfig;
use crate::convert::{self, LegacyConverter};
use crate::error::{Error, StripError};
use crate::progress::BatchReporter;
use crate::ready;
use crate::retry;
use crate::scanner::{self, FileTask};
use crate::stripper::StripOptions;
use rayon::prelude::*;
use std::collections::HashSet;
use std::fmt;
use std::path::{Path, PathBuf};
use std::thread;
use std::time::{Duration, Instant};
use tracing::{debug, error, info, warn};

pub struct ScrubEngine {
    config: AppConfig,
    converter: Box<dyn LegacyConverter>,
}

/// Terminal state of one input document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProcessingOutcome {
    Succeeded { removed: usize },
    FailedConversion(String),
    FailedStripping(String),
    Skipped(String),
}

impl ProcessingOutcome {
    pub fn is_failure(&self) -> bool {
        matches!(
            self,
            ProcessingOutcome::FailedConversion(_) | ProcessingOutcome::FailedStripping(_)
        )
    }
}

impl fmt::Display for ProcessingOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProcessingOutcome::Succeeded { removed } => {
                write!(f, "succeeded ({} property entries removed)", removed)
            }
            ProcessingOutcome::FailedConversion(reason) => write!(f, "conversion failed: {}", reason),
            ProcessingOutcome::FailedStripping(reason) => write!(f, "stripping failed: {}", reason),
            ProcessingOutcome::Skipped(reason) => write!(f, "skipped: {}", reason),
        }
    }
}

#[derive(Debug, Clone)]
pub struct FileOutcome {
    /// The discovered input file.
    pub source: PathBuf,
    /// The archive that was stripped; differs from `source` after a
    /// legacy conversion, `None` when conversion failed.
    pub archive: Option<PathBuf>,
    pub outcome: ProcessingOutcome,
}

#[derive(Debug, Default)]
pub struct BatchReport {
    pub outcomes: Vec<FileOutcome>,
    pub discovery_duration: Duration,
    pub conversion_duration: Duration,
    pub strip_duration: Duration,
}

impl BatchReport {
    pub fn total(&self) -> usize {
        self.outcomes.len()
    }

    pub fn succeeded(&self) -> usize {
        self.count(|o| matches!(o, ProcessingOutcome::Succeeded { .. }))
    }

    pub fn skipped(&self) -> usize {
        self.count(|o| matches!(o, ProcessingOutcome::Skipped(_)))
    }

    pub fn failed(&self) -> usize {
        self.count(ProcessingOutcome::is_failure)
    }

    pub fn has_failures(&self) -> bool {
        self.failed() > 0
    }

    pub fn outcome_for(&self, source: &Path) -> Option<&FileOutcome> {
        self.outcomes.iter().find(|o| o.source == source)
    }

    fn count(&self, pred: impl Fn(&ProcessingOutcome) -> bool) -> usize {
        self.outcomes.iter().filter(|o| pred(&o.outcome)).count()
    }
}

/// Closes the converter session when dropped.
struct ConverterSession<'a> {
    converter: &'a dyn LegacyConverter,
}

impl Drop for ConverterSession<'_> {
    fn drop(&mut self) {
        self.converter.close_session();
        debug!("Converter session closed");
    }
}

impl ScrubEngine {
    pub fn new(config: AppConfig) -> Self {
        let converter = convert::from_config(&config.converter);
        Self { config, converter }
    }

    pub fn with_converter(mut self, converter: Box<dyn LegacyConverter>) -> Self {
        self.converter = converter;
        self
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    /// Run one batch over `roots`:
    /// 1. Discover supported files
    /// 2. Back them up (when enabled)
    /// 3. Convert legacy files one at a time and wait for each result to be
    ///    released by the engine
    /// 4. Strip every resulting archive in parallel, then join
    ///
    /// Per-file failures end up in the report; they never abort the batch.
    pub fn run<P: AsRef<Path>>(
        &self,
        roots: &[P],
        reporter: &dyn BatchReporter,
    ) -> Result<BatchReport, Error> {
        if roots.is_empty() {
            return Err(Error::NoInput);
        }

        let mut report = BatchReport::default();

        // Phase 1: Discover
        let discovery_start = Instant::now();
        let tasks = scanner::discover(roots, &self.config.ignore_patterns);
        report.discovery_duration = discovery_start.elapsed();
        reporter.on_discovery_complete(tasks.len(), report.discovery_duration.as_secs_f64());

        if tasks.is_empty() {
            info!("No supported files found");
            reporter.on_batch_complete(&report);
            return Ok(report);
        }
        debug!(
            "Discovered {} file(s) in {:.2}s",
            tasks.len(),
            report.discovery_duration.as_secs_f64()
        );

        // Phase 2: Backup
        if self.config.backup {
            self.backup_all(&tasks, reporter);
        }

        // Phase 3: Convert
        let conversion_start = Instant::now();
        let (session, session_error) = self.open_session(&tasks);
        let archives = self.convert_all(
            tasks,
            session_error.as_deref(),
            &mut report.outcomes,
            reporter,
        );
        report.conversion_duration = conversion_start.elapsed();
        reporter.on_convert_complete(archives.len(), report.conversion_duration.as_secs_f64());

        // Phase 4: Strip
        reporter.on_strip_start(archives.len());
        let strip_start = Instant::now();
        let stripped: Vec<FileOutcome> = archives
            .par_iter()
            .map(|(source, archive)| {
                let outcome = self.strip_one(source, archive, reporter);
                reporter.on_file_complete(&outcome);
                outcome
            })
            .collect();
        report.strip_duration = strip_start.elapsed();
        // the session spans the whole run, released only after the join
        drop(session);
        debug!(
            "Stripping completed in {:.2}s",
            report.strip_duration.as_secs_f64()
        );

        report.outcomes.extend(stripped);
        report.outcomes.sort_by(|a, b| a.source.cmp(&b.source));

        info!(
            "All files processed: {} succeeded, {} skipped, {} failed",
            report.succeeded(),
            report.skipped(),
            report.failed()
        );
        reporter.on_batch_complete(&report);

        Ok(report)
    }

    fn backup_all(&self, tasks: &[FileTask], reporter: &dyn BatchReporter) {
        let suffix = self.config.backup_suffix();
        for task in tasks {
            match backup::backup_file(&task.path, suffix) {
                Ok(dest) => {
                    info!("Backed up {} to {}", task.path.display(), dest.display());
                    reporter.on_backup(&task.path, true);
                }
                Err(e) => {
                    error!("Backup failed for {}: {}", task.path.display(), e);
                    reporter.on_backup(&task.path, false);
                }
            }
        }
    }

    /// Opened once per run, only when there is something to convert. The
    /// returned guard closes the session when dropped.
    fn open_session(&self, tasks: &[FileTask]) -> (Option<ConverterSession<'_>>, Option<String>) {
        if !tasks.iter().any(|t| t.legacy) {
            return (None, None);
        }
        match self.converter.open_session() {
            Ok(()) => {
                let session = ConverterSession {
                    converter: self.converter.as_ref(),
                };
                (Some(session), None)
            }
            Err(e) => {
                error!("Could not open converter session: {}", e);
                (None, Some(e.to_string()))
            }
        }
    }

    /// Sequential by construction: the external engine is driven by this
    /// thread only. Returns `(source, archive)` pairs ready for stripping,
    /// each archive at most once; everything else is pushed onto `outcomes`.
    fn convert_all(
        &self,
        tasks: Vec<FileTask>,
        session_error: Option<&str>,
        outcomes: &mut Vec<FileOutcome>,
        reporter: &dyn BatchReporter,
    ) -> Vec<(PathBuf, PathBuf)> {
        let total = tasks.len();
        let attempts = self.config.ready.timeout_secs;
        let interval = self.config.ready.poll_interval();
        let discovered: HashSet<PathBuf> = tasks.iter().map(|t| t.path.clone()).collect();
        let mut queued: HashSet<PathBuf> = HashSet::with_capacity(total);
        let mut archives = Vec::with_capacity(total);

        let mut finish_early = |source: PathBuf, outcome: ProcessingOutcome| {
            let outcome = FileOutcome {
                source,
                archive: None,
                outcome,
            };
            reporter.on_file_complete(&outcome);
            outcomes.push(outcome);
        };

        for (index, task) in tasks.into_iter().enumerate() {
            info!("Processing {}", task.path.display());
            reporter.on_convert_start(&task.path, index, total);

            let archive = match task.conversion_target() {
                None => task.path.clone(),
                Some(target) => {
                    // never overwrite a document that is already there
                    if discovered.contains(&target) || target.exists() {
                        warn!(
                            "Not converting {}: {} already exists",
                            task.path.display(),
                            target.display()
                        );
                        let reason = format!("conversion target {} already exists", target.display());
                        finish_early(task.path, ProcessingOutcome::Skipped(reason));
                        continue;
                    }

                    let converted = match session_error {
                        Some(reason) => Err(reason.to_string()),
                        None => self
                            .converter
                            .convert(&task.path, &target)
                            .map_err(|e| e.to_string()),
                    };
                    match converted {
                        Ok(()) => {
                            info!("Converted {} to {}", task.path.display(), target.display());
                            thread::sleep(Duration::from_millis(self.config.converter.settle_ms));
                            target
                        }
                        Err(reason) => {
                            error!("Conversion failed for {}: {}", task.path.display(), reason);
                            finish_early(task.path, ProcessingOutcome::FailedConversion(reason));
                            continue;
                        }
                    }
                }
            };

            if !queued.insert(archive.clone()) {
                warn!("{} is already queued, skipping {}", archive.display(), task.path.display());
                let reason = format!("{} is already queued for stripping", archive.display());
                finish_early(task.path, ProcessingOutcome::Skipped(reason));
                continue;
            }

            if !ready::wait_ready(&archive, attempts, interval) {
                reporter.on_ready_timeout(&archive);
            }
            archives.push((task.path, archive));
        }

        archives
    }

    fn strip_one(&self, source: &Path, archive: &Path, reporter: &dyn BatchReporter) -> FileOutcome {
        let options = StripOptions {
            require_content_types: self.config.strip.require_content_types,
        };
        let result = retry::strip_with_retry(
            archive,
            self.config.retry.max_attempts,
            self.config.retry.delay(),
            options,
            reporter,
        );

        let outcome = match result {
            Ok(stats) => {
                info!(
                    "Removed properties from {} ({} entries)",
                    archive.display(),
                    stats.removed
                );
                ProcessingOutcome::Succeeded {
                    removed: stats.removed,
                }
            }
            Err(e @ (StripError::NotAnArchive | StripError::NotOfficeDocument)) => {
                warn!("Skipping {}: {}", archive.display(), e);
                ProcessingOutcome::Skipped(e.to_string())
            }
            Err(e) => {
                error!("Failed to remove properties from {}: {}", archive.display(), e);
                ProcessingOutcome::FailedStripping(e.to_string())
            }
        };

        FileOutcome {
            source: source.to_path_buf(),
            archive: Some(archive.to_path_buf()),
            outcome,
        }
    }
}

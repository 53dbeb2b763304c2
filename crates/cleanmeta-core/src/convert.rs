//! Gateway to the external office engine that turns legacy binary documents
//! into archive-based ones. The engine is a single stateful resource, so the
//! orchestrator drives it from one thread, one document at a time.

use crate::config::ConverterConfig;
use crate::error::ConvertError;
use std::path::Path;
use std::process::Command;
use std::sync::Arc;
use tracing::debug;

pub trait LegacyConverter: Send + Sync {
    /// Called once per run before the first conversion.
    fn open_session(&self) -> Result<(), ConvertError> {
        Ok(())
    }

    /// Produce `target` (an archive-based document) from `source`.
    fn convert(&self, source: &Path, target: &Path) -> Result<(), ConvertError>;

    /// Called once per run after the last conversion.
    fn close_session(&self) {}
}

impl<T: LegacyConverter + ?Sized> LegacyConverter for Arc<T> {
    fn open_session(&self) -> Result<(), ConvertError> {
        (**self).open_session()
    }

    fn convert(&self, source: &Path, target: &Path) -> Result<(), ConvertError> {
        (**self).convert(source, target)
    }

    fn close_session(&self) {
        (**self).close_session()
    }
}

/// Used when no engine is configured; every legacy file fails conversion.
pub struct DisabledConverter;

impl LegacyConverter for DisabledConverter {
    fn convert(&self, _source: &Path, _target: &Path) -> Result<(), ConvertError> {
        Err(ConvertError::Disabled)
    }
}

/// Drives a headless office engine through its command line:
/// `<program> <args..> --convert-to <ext> --outdir <dir> <source>`.
pub struct CommandConverter {
    program: String,
    args: Vec<String>,
}

impl CommandConverter {
    pub fn new(program: impl Into<String>, args: Vec<String>) -> Self {
        Self {
            program: program.into(),
            args,
        }
    }
}

impl LegacyConverter for CommandConverter {
    fn convert(&self, source: &Path, target: &Path) -> Result<(), ConvertError> {
        let ext = target
            .extension()
            .and_then(|e| e.to_str())
            .ok_or_else(|| ConvertError::Unsupported(target.display().to_string()))?;
        let outdir = match target.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };

        debug!(
            "Running {} to convert {} to {}",
            self.program,
            source.display(),
            ext
        );
        let output = Command::new(&self.program)
            .args(&self.args)
            .arg("--convert-to")
            .arg(ext)
            .arg("--outdir")
            .arg(outdir)
            .arg(source)
            .output()
            .map_err(|e| ConvertError::Spawn {
                program: self.program.clone(),
                source: e,
            })?;

        if !output.status.success() {
            return Err(ConvertError::Failed {
                status: output.status.to_string(),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }
        if !target.exists() {
            return Err(ConvertError::MissingOutput(target.to_path_buf()));
        }
        Ok(())
    }
}

/// Pick the converter described by `config`.
pub fn from_config(config: &ConverterConfig) -> Box<dyn LegacyConverter> {
    match &config.program {
        Some(program) if !program.trim().is_empty() => {
            Box::new(CommandConverter::new(program.clone(), config.args.clone()))
        }
        _ => Box::new(DisabledConverter),
    }
}

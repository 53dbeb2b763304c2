use std::io;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),

    #[error("no input paths given")]
    NoInput,
}

/// Failure while removing property entries from a single archive.
#[derive(Error, Debug)]
pub enum StripError {
    #[error("not an archive-based document (missing PK signature)")]
    NotAnArchive,

    #[error("archive has no [Content_Types].xml, not an office document")]
    NotOfficeDocument,

    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("archive error: {0}")]
    Zip(#[from] zip::result::ZipError),

    #[error("failed to replace original: {0}")]
    Persist(#[from] tempfile::PersistError),
}

impl StripError {
    /// Classification errors are permanent; everything else may clear up
    /// once the file is released by whoever holds it.
    pub fn is_retryable(&self) -> bool {
        !matches!(self, StripError::NotAnArchive | StripError::NotOfficeDocument)
    }
}

#[derive(Error, Debug)]
pub enum ConvertError {
    #[error("legacy conversion is disabled (no converter program configured)")]
    Disabled,

    #[error("no conversion target for extension '{0}'")]
    Unsupported(String),

    #[error("failed to launch converter '{program}': {source}")]
    Spawn {
        program: String,
        #[source]
        source: io::Error,
    },

    #[error("converter exited with {status}: {stderr}")]
    Failed { status: String, stderr: String },

    #[error("converter reported success but {} was not produced", .0.display())]
    MissingOutput(PathBuf),
}

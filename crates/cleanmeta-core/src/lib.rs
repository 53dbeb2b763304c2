pub mod backup;
pub mod config;
pub mod convert;
pub mod engine;
pub mod error;
pub mod platform;
pub mod progress;
pub mod ready;
pub mod retry;
pub mod scanner;
pub mod stripper;

pub use config::AppConfig;
pub use convert::LegacyConverter;
pub use engine::{BatchReport, FileOutcome, ProcessingOutcome, ScrubEngine};
pub use error::{ConvertError, Error, StripError};
pub use progress::{BatchReporter, SilentReporter};

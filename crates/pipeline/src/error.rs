use thiserror::Error;

pub type Result<T> = std::result::Result<T, PipelineError>;

#[derive(Error, Debug)]
pub enum PipelineError {
    /// No numeric maximum to increment from and no seed supplied. Fatal:
    /// first-ever runs must seed a starting id.
    #[error("Allocation error: {0}")]
    Allocation(String),

    /// Run-level configuration problem (every source unconfigured, missing
    /// stage map). Per-source misses are skipped, not raised.
    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Source unavailable: {0}")]
    SourceUnavailable(#[from] crate::source::SourceError),
}

use std::path::PathBuf;

use thiserror::Error;

/// Application-specific errors for the CLI
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Jobs must be greater than 0, got: {jobs}")]
    ZeroJobs { jobs: usize },

    #[error("No raster files found in {inputs:?}")]
    NoInputs { inputs: Vec<PathBuf> },

    #[error("{failed} of {total} file(s) failed")]
    BatchFailed { failed: usize, total: usize },

    #[error(transparent)]
    Pipeline(#[from] floodprep::Error),
}

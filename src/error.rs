//! The crate's one recoverable-error boundary: opening the trace file.

use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum SimError {
    #[error("failed to open trace file {path}: {source}")]
    TraceOpen {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

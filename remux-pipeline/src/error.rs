//! Pipeline error types.

use remux_core::Error as CoreError;
use thiserror::Error;

/// Engine error, naming the phase that failed.
///
/// Every underlying failure is fatal to the run; the engine never retries.
#[derive(Error, Debug)]
pub enum EngineError {
    /// The source session could not be established.
    #[error("opening source: {0}")]
    OpenSource(#[source] CoreError),

    /// The destination session could not be established.
    #[error("opening destination: {0}")]
    OpenDestination(#[source] CoreError),

    /// Reading from the source failed mid-stream.
    #[error("reading from source: {0}")]
    Read(#[source] CoreError),

    /// Committing to the destination failed.
    #[error("writing to destination: {0}")]
    Write(#[source] CoreError),
}

/// Pipeline result type.
pub type Result<T> = std::result::Result<T, EngineError>;

//! Error types for the remux library.
//!
//! Errors are grouped by the phase that produces them: establishing a session
//! (open), pulling packets from the source (read), and committing packets to
//! the destination (write). Every fatal condition aborts the pump loop; there
//! is no internal retry.

use thiserror::Error;

/// Main error type for the remux library.
#[derive(Error, Debug)]
pub enum Error {
    /// Source or destination could not be established.
    #[error("open error: {0}")]
    Open(#[from] OpenError),

    /// Reading from the source failed.
    #[error("read error: {0}")]
    Read(#[from] ReadError),

    /// Committing to the destination failed.
    #[error("write error: {0}")]
    Write(#[from] WriteError),

    /// I/O errors outside the open/read/write phases.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Invalid parameter provided.
    #[error("invalid parameter: {0}")]
    InvalidParameter(String),
}

/// Errors establishing a source or destination session.
#[derive(Error, Debug)]
pub enum OpenError {
    /// The format hint does not match any registered container format.
    #[error("format not recognized: {0}")]
    FormatUnrecognized(String),

    /// The source carries no video stream to copy.
    #[error("no video stream found")]
    NoVideoStream,

    /// The destination container rejected a required muxing option.
    ///
    /// A muxer that does not implement a requested option must fail rather
    /// than silently ignore it; proceeding would leave the output with
    /// ambiguous muxing behavior.
    #[error("muxer option not accepted: {0}")]
    OptionRejected(String),

    /// Failure reported by the underlying container library.
    #[error("{0}")]
    Underlying(String),

    /// I/O failure while opening.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Errors pulling a packet from the source.
#[derive(Error, Debug)]
pub enum ReadError {
    /// The source is exhausted.
    #[error("end of stream")]
    EndOfStream,

    /// The source delivered data the demuxer could not parse.
    #[error("malformed data: {0}")]
    Malformed(String),

    /// Failure reported by the underlying container library or transport.
    #[error("{0}")]
    Underlying(String),

    /// I/O failure while reading.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Errors committing a packet to the destination.
#[derive(Error, Debug)]
pub enum WriteError {
    /// The destination rejected a non-monotonic decode timestamp.
    #[error("non-monotonic DTS {dts} after {last}")]
    NonMonotonicDts { last: i64, dts: i64 },

    /// Failure reported by the underlying container library.
    #[error("{0}")]
    Underlying(String),

    /// I/O failure while writing.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<String> for OpenError {
    fn from(s: String) -> Self {
        OpenError::Underlying(s)
    }
}

impl From<&str> for OpenError {
    fn from(s: &str) -> Self {
        OpenError::Underlying(s.to_string())
    }
}

impl From<String> for ReadError {
    fn from(s: String) -> Self {
        ReadError::Underlying(s)
    }
}

impl From<&str> for ReadError {
    fn from(s: &str) -> Self {
        ReadError::Underlying(s.to_string())
    }
}

impl From<String> for WriteError {
    fn from(s: String) -> Self {
        WriteError::Underlying(s)
    }
}

impl From<&str> for WriteError {
    fn from(s: &str) -> Self {
        WriteError::Underlying(s.to_string())
    }
}

/// Result type alias using our Error type.
pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// Create an invalid parameter error.
    pub fn invalid_param(msg: impl Into<String>) -> Self {
        Error::InvalidParameter(msg.into())
    }

    /// Check if this is an end-of-stream error.
    #[must_use]
    pub fn is_eof(&self) -> bool {
        matches!(self, Error::Read(ReadError::EndOfStream))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = Error::InvalidParameter("source location".into());
        assert_eq!(err.to_string(), "invalid parameter: source location");
    }

    #[test]
    fn test_open_error_conversion() {
        let open_err = OpenError::NoVideoStream;
        let err: Error = open_err.into();
        assert!(matches!(err, Error::Open(OpenError::NoVideoStream)));
    }

    #[test]
    fn test_is_eof() {
        assert!(Error::from(ReadError::EndOfStream).is_eof());
        assert!(!Error::from(ReadError::Underlying("timeout".into())).is_eof());
        assert!(!Error::from(OpenError::NoVideoStream).is_eof());
    }

    #[test]
    fn test_non_monotonic_display() {
        let err = WriteError::NonMonotonicDts { last: 2000, dts: 500 };
        assert_eq!(err.to_string(), "non-monotonic DTS 500 after 2000");
    }
}

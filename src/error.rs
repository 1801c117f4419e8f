//! Error types for rechat-dl
//!
//! Two classes of failure exist:
//! - [`Error`] is fatal. It aborts the operation and, for downloads, the staged
//!   output file is removed before the error reaches the caller.
//! - [`Warning`] is reported alongside a successful result. The operation itself
//!   already succeeded and is never rolled back for it.

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for rechat-dl operations
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for rechat-dl
#[derive(Debug, Error)]
pub enum Error {
    /// Configuration error with context about which setting is invalid
    #[error("configuration error: {message}")]
    Config {
        /// Human-readable error message describing the configuration issue
        message: String,
        /// The configuration key that caused the error (e.g., "api.endpoint")
        key: Option<String>,
    },

    /// Output file exists and overwriting was not requested
    #[error("output file already exists: {}", path.display())]
    AlreadyExists {
        /// The existing output path
        path: PathBuf,
    },

    /// The input could not be interpreted as a video id or video URL
    #[error("invalid video id: {0}")]
    InvalidVideoId(String),

    /// Network error
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),

    /// The API answered with a non-success HTTP status
    #[error("HTTP {status} from {url}")]
    HttpStatus {
        /// Response status code
        status: u16,
        /// The endpoint that was queried
        url: String,
    },

    /// The API reported errors in the response body
    #[error("API error: {0}")]
    Api(String),

    /// The API has no video with this id
    #[error("video not found: {0}")]
    VideoNotFound(String),

    /// The API response lacked fields required to continue
    #[error("malformed API response: {0}")]
    MalformedResponse(String),

    /// A persisted comment file is not a well-formed JSON array
    #[error("malformed comment file {} at byte {offset}: {reason}", path.display())]
    MalformedFile {
        /// The file being read
        path: PathBuf,
        /// Byte offset at which reading failed
        offset: u64,
        /// What was wrong
        reason: String,
    },

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization error
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// The operation was interrupted by a termination signal
    #[error("interrupted")]
    Interrupted,
}

impl Error {
    /// Machine-readable error code, used as a structured logging field
    pub fn code(&self) -> &'static str {
        match self {
            Error::Config { .. } => "config_error",
            Error::AlreadyExists { .. } => "already_exists",
            Error::InvalidVideoId(_) => "invalid_video_id",
            Error::Network(_) => "network_error",
            Error::HttpStatus { .. } => "http_status",
            Error::Api(_) => "api_error",
            Error::VideoNotFound(_) => "video_not_found",
            Error::MalformedResponse(_) => "malformed_response",
            Error::MalformedFile { .. } => "malformed_file",
            Error::Io(_) => "io_error",
            Error::Serialization(_) => "serialization_error",
            Error::Interrupted => "interrupted",
        }
    }
}

/// Non-fatal problems reported with an otherwise successful result
#[derive(Debug, Error)]
pub enum Warning {
    /// Setting the output file's creation/modification times failed
    #[error("failed to set file times on {}: {source}", path.display())]
    FileTimes {
        /// The completed output file
        path: PathBuf,
        /// Underlying OS error
        #[source]
        source: std::io::Error,
    },

    /// The first or last comment did not carry usable timestamps
    #[error("cannot infer file times: {reason}")]
    TimestampsUnavailable {
        /// Which field could not be read
        reason: String,
    },
}

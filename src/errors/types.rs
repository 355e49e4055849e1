//! Error type definitions for configuration resolution
//!
//! Two tiers exist. [`FetchError`] describes a single failed request against
//! the receiver's service directory. [`ConfigurationError`] is the fatal tier:
//! any value of it means the server must not start.

use std::path::PathBuf;
use thiserror::Error;

/// Failure of a single service directory request
#[derive(Error, Debug)]
pub enum FetchError {
    /// The request could not be sent or no response arrived
    #[error("GET {url} failed: {source}")]
    Transport {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    /// The receiver answered with something other than 200 OK
    #[error("GET {url} returned status {status}")]
    Status { url: String, status: u16 },

    /// The response body could not be read
    #[error("Failed to read response body from {url}: {source}")]
    Io {
        url: String,
        #[source]
        source: reqwest::Error,
    },
}

impl FetchError {
    /// HTTP status carried by a [`FetchError::Status`]
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Status { status, .. } => Some(*status),
            _ => None,
        }
    }
}

/// Unrecoverable configuration failure, startup must be aborted
#[derive(Error, Debug)]
pub enum ConfigurationError {
    /// Settings file or environment could not be read or decoded
    #[error("Failed to load settings: {message}")]
    Load { message: String },

    /// A required directory could not be created or inspected
    #[error("{action} {path:?}: {source}")]
    Io {
        action: &'static str,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// `vod.video-profiles` was empty
    #[error("specify at least one VOD video profile")]
    NoVideoProfiles,

    /// A video profile has a zero dimension or bitrate
    #[error("Invalid VOD video profile '{name}': {field} must be greater than zero")]
    InvalidVideoProfile { name: String, field: &'static str },

    /// The Enigma2 receiver could not be queried
    #[error("Enigma2 discovery failed: {0}")]
    Discovery(#[from] FetchError),
}

impl ConfigurationError {
    /// Create a load error from any displayable cause
    pub fn load<S: Into<String>>(message: S) -> Self {
        Self::Load {
            message: message.into(),
        }
    }

    /// Create an I/O error for a path
    pub fn io(action: &'static str, path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            action,
            path: path.into(),
            source,
        }
    }
}

impl From<figment::Error> for ConfigurationError {
    fn from(err: figment::Error) -> Self {
        Self::load(err.to_string())
    }
}

//! Centralized error handling for transcode-server
//!
//! # Error Categories
//!
//! - **Fetch Errors**: transport, status and body failures talking to an Enigma2 receiver
//! - **Configuration Errors**: anything that prevents the server from starting
//!
//! # Usage
//!
//! ```rust
//! use transcode_server::errors::{ConfigResult, ConfigurationError};
//!
//! fn require_profiles(count: usize) -> ConfigResult<()> {
//!     if count == 0 {
//!         return Err(ConfigurationError::NoVideoProfiles);
//!     }
//!     Ok(())
//! }
//! ```

pub mod types;

pub use types::*;

/// Convenience type alias for configuration results
pub type ConfigResult<T> = Result<T, ConfigurationError>;

/// Convenience type alias for service directory requests
pub type FetchResult<T> = Result<T, FetchError>;

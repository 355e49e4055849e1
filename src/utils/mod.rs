//! Utility modules for transcode-server
//!
//! This module contains small pure helpers shared across the crate.

pub mod channel_name;

pub use channel_name::normalize_channel_name;

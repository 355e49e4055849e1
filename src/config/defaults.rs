//! Fallback values used when a setting is left empty
//!
//! Directory, binary and receiver defaults that the resolver substitutes,
//! plus the names of the settings sources.

// Settings sources
pub const DEFAULT_CONFIG_FILE: &str = "config.toml";
pub const ENV_PREFIX: &str = "TRANSCODE_";

// Server defaults
pub const DEFAULT_BIND: &str = "127.0.0.1:8080";

// Directory defaults
pub const DEFAULT_SYSTEM_BASE_DIR: &str = "/etc/transcode";
pub const PROFILES_SUBDIR: &str = "profiles";
pub const TRANSCODE_DIR_PREFIX: &str = "transcode-vod";

// VOD defaults
pub const DEFAULT_FFMPEG_BINARY: &str = "ffmpeg";
pub const DEFAULT_FFPROBE_BINARY: &str = "ffprobe";

// Enigma2 defaults
pub const DEFAULT_BOUQUET: &str = "Favourites (TV)";

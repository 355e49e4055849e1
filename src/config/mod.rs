use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Deserializer, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

pub mod defaults;
pub mod resolver;

use crate::errors::ConfigResult;
use defaults::*;

pub use resolver::{SettingsResolver, resolve};

/// Normalized channel key -> playable URL
pub type StreamMap = HashMap<String, String>;

/// Output rendition of the VOD transcoder
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct VideoProfile {
    pub width: u32,
    pub height: u32,
    /// in kilobits per second
    pub bitrate: u32,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AudioProfile {
    /// in kilobits per second
    #[serde(default)]
    pub bitrate: u32,
}

/// Raw settings as supplied by the settings file, environment and command line.
///
/// Every field is optional; an empty string means "not set" and is replaced
/// by a computed default during resolution.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct RawSettings {
    pub bind: String,
    pub cert: String,
    pub key: String,
    #[serde(rename = "static")]
    pub static_dir: String,
    pub proxy: bool,
    pub basedir: String,
    pub profiles: String,
    pub streams: HashMap<String, String>,
    pub hls_proxy: HashMap<String, String>,
    pub vod: RawVodSettings,
    pub enigma2: RawEnigma2Settings,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct RawVodSettings {
    pub media_dir: String,
    pub transcode_dir: String,
    pub video_profiles: BTreeMap<String, VideoProfile>,
    pub video_keyframes: bool,
    pub audio_profile: AudioProfile,
    pub cache: bool,
    pub cache_dir: String,
    pub ffmpeg_binary: String,
    pub ffprobe_binary: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct RawEnigma2Settings {
    /// Receiver host, optionally with a port for its web interface
    pub ip: String,
    /// Port of the receiver's streaming service
    #[serde(deserialize_with = "string_or_number")]
    pub port: String,
    pub bouquet: String,
}

impl Default for RawSettings {
    fn default() -> Self {
        Self {
            bind: DEFAULT_BIND.to_string(),
            cert: String::new(),
            key: String::new(),
            static_dir: String::new(),
            proxy: false,
            basedir: String::new(),
            profiles: String::new(),
            streams: HashMap::new(),
            hls_proxy: HashMap::new(),
            vod: RawVodSettings::default(),
            enigma2: RawEnigma2Settings::default(),
        }
    }
}

impl RawSettings {
    /// Load raw settings, lowest precedence first: built-in defaults, the TOML
    /// file at `config_file` (skipped when missing), then `TRANSCODE_*`
    /// environment variables.
    ///
    /// Nested environment keys are separated by `__`. Underscores in field
    /// names become hyphens, so `TRANSCODE_VOD__MEDIA_DIR` sets `vod.media-dir`,
    /// while map keys keep theirs: `TRANSCODE_STREAMS__BBC_ONE_HD` sets
    /// `streams.bbc_one_hd`. See [`env_key_path`].
    pub fn load_from_file(config_file: impl AsRef<Path>) -> ConfigResult<Self> {
        let config_file = config_file.as_ref();
        let mut figment = Figment::from(Serialized::defaults(Self::default()));

        if config_file.exists() {
            info!("Loading settings from: {}", config_file.display());
            figment = figment.merge(Toml::file(config_file));
        } else {
            debug!(
                "Settings file {} not found, using defaults and environment",
                config_file.display()
            );
        }

        let settings = figment
            .merge(
                Env::prefixed(ENV_PREFIX)
                    .split("__")
                    .map(|key| env_key_path(key.as_str()).into()),
            )
            .extract()?;
        Ok(settings)
    }
}

/// Tables whose entries are keyed by user-chosen names
const MAP_TABLES: &[&[&str]] = &[&["streams"], &["hls-proxy"], &["vod", "video-profiles"]];

/// Map a dotted environment key onto the kebab-case settings surface.
///
/// Field segments get `_` replaced by `-`. The segment directly below a map
/// table is a user-chosen key and is kept as is.
pub fn env_key_path(key: &str) -> String {
    let mut path: Vec<String> = Vec::new();
    for segment in key.split('.') {
        let under_map = MAP_TABLES.iter().any(|table| {
            table.len() == path.len() && table.iter().zip(&path).all(|(a, b)| *a == b.as_str())
        });
        if under_map {
            path.push(segment.to_string());
        } else {
            path.push(segment.replace('_', "-"));
        }
    }
    path.join(".")
}

/// VOD transcoding settings after defaults have been applied
#[derive(Debug, Clone, Serialize)]
pub struct VodSettings {
    pub media_dir: PathBuf,
    pub transcode_dir: PathBuf,
    pub video_profiles: BTreeMap<String, VideoProfile>,
    pub video_keyframes: bool,
    pub audio_profile: AudioProfile,
    pub cache: bool,
    pub cache_dir: Option<PathBuf>,
    pub ffmpeg_binary: String,
    pub ffprobe_binary: String,
}

/// Enigma2 receiver used for live channel discovery
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ReceiverSettings {
    pub host: String,
    pub port: String,
    pub bouquet: String,
    /// Service reference of the configured bouquet, set by discovery only
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reference: Option<String>,
}

impl ReceiverSettings {
    /// Discovery runs only when both host and port are set
    pub fn is_configured(&self) -> bool {
        !self.host.is_empty() && !self.port.is_empty()
    }
}

impl From<RawEnigma2Settings> for ReceiverSettings {
    fn from(raw: RawEnigma2Settings) -> Self {
        Self {
            host: raw.ip,
            port: raw.port,
            bouquet: raw.bouquet,
            reference: None,
        }
    }
}

/// Fully resolved server configuration, built once at startup
#[derive(Debug, Clone, Serialize)]
pub struct ServerSettings {
    pub bind: String,
    pub cert: String,
    pub key: String,
    pub static_dir: String,
    pub proxy: bool,
    pub base_dir: PathBuf,
    pub profiles_dir: PathBuf,
    pub streams: StreamMap,
    pub vod: VodSettings,
    pub enigma2: ReceiverSettings,
    pub hls_proxy: HashMap<String, String>,
}

impl ServerSettings {
    /// Join path elements under the base directory
    pub fn abs_path<I, P>(&self, elements: I) -> PathBuf
    where
        I: IntoIterator<Item = P>,
        P: AsRef<Path>,
    {
        let mut path = self.base_dir.clone();
        for element in elements {
            path.push(element);
        }
        path
    }

    pub fn tls_enabled(&self) -> bool {
        !self.cert.is_empty() && !self.key.is_empty()
    }
}

/// Accept `port = 8001` as well as `port = "8001"`
fn string_or_number<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum StringOrNumber {
        String(String),
        Number(u64),
    }

    Ok(match StringOrNumber::deserialize(deserializer)? {
        StringOrNumber::String(value) => value,
        StringOrNumber::Number(value) => value.to_string(),
    })
}

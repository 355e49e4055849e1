//! Turns [`RawSettings`] into [`ServerSettings`]
//!
//! Resolution computes directory defaults, creates the directories the
//! transcoder writes to, validates the VOD profiles and finally merges
//! channels discovered on an Enigma2 receiver into the stream map. Every
//! failure is a [`ConfigurationError`] and the server must not start.

use std::path::{Path, PathBuf};
use tracing::{debug, info};

use super::defaults::*;
use super::{RawSettings, RawVodSettings, ReceiverSettings, ServerSettings, VodSettings};
use crate::enigma2::{self, HttpServiceDirectoryClient, ServiceDirectoryClient};
use crate::errors::{ConfigResult, ConfigurationError};

/// Resolve raw settings using a plain HTTP client for Enigma2 discovery
pub async fn resolve(raw: RawSettings) -> ConfigResult<ServerSettings> {
    SettingsResolver::new(HttpServiceDirectoryClient::new())
        .resolve(raw)
        .await
}

/// Configuration resolver with an injectable service directory client
pub struct SettingsResolver<C> {
    client: C,
    system_base_dir: PathBuf,
}

impl<C: ServiceDirectoryClient> SettingsResolver<C> {
    pub fn new(client: C) -> Self {
        Self {
            client,
            system_base_dir: PathBuf::from(DEFAULT_SYSTEM_BASE_DIR),
        }
    }

    /// Override the system-wide base directory probed when `basedir` is unset
    pub fn with_system_base_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.system_base_dir = dir.into();
        self
    }

    pub async fn resolve(&self, raw: RawSettings) -> ConfigResult<ServerSettings> {
        let base_dir = resolve_base_dir(&raw.basedir, &self.system_base_dir)?;
        let profiles_dir = resolve_profiles_dir(&raw.profiles, &base_dir);
        info!(
            "Base directory: {}, profiles: {}",
            base_dir.display(),
            profiles_dir.display()
        );

        let mut streams = raw.streams;
        let vod = resolve_vod(raw.vod).await?;
        let hls_proxy = raw.hls_proxy;

        let mut receiver = ReceiverSettings::from(raw.enigma2);
        enigma2::discover(&self.client, &mut receiver, &mut streams).await?;

        Ok(ServerSettings {
            bind: raw.bind,
            cert: raw.cert,
            key: raw.key,
            static_dir: raw.static_dir,
            proxy: raw.proxy,
            base_dir,
            profiles_dir,
            streams,
            vod,
            enigma2: receiver,
            hls_proxy,
        })
    }
}

/// Configured base dir, else the system dir if it exists, else the working directory
pub fn resolve_base_dir(configured: &str, system_dir: &Path) -> ConfigResult<PathBuf> {
    if !configured.is_empty() {
        return Ok(PathBuf::from(configured));
    }

    if system_dir.exists() {
        return Ok(system_dir.to_path_buf());
    }

    std::env::current_dir()
        .map_err(|e| ConfigurationError::io("Failed to read working directory", ".", e))
}

pub fn resolve_profiles_dir(configured: &str, base_dir: &Path) -> PathBuf {
    if configured.is_empty() {
        base_dir.join(PROFILES_SUBDIR)
    } else {
        PathBuf::from(configured)
    }
}

/// Apply VOD defaults and create the transcode and cache directories
pub async fn resolve_vod(raw: RawVodSettings) -> ConfigResult<VodSettings> {
    let transcode_dir = if raw.transcode_dir.is_empty() {
        let temp_root = std::env::temp_dir();
        tempfile::Builder::new()
            .prefix(TRANSCODE_DIR_PREFIX)
            .tempdir_in(&temp_root)
            .map_err(|e| {
                ConfigurationError::io("Failed to create transcode directory in", temp_root, e)
            })?
            .keep()
    } else {
        let dir = PathBuf::from(&raw.transcode_dir);
        tokio::fs::create_dir_all(&dir)
            .await
            .map_err(|e| ConfigurationError::io("Failed to create transcode directory", &dir, e))?;
        dir
    };
    debug!("Transcode directory: {}", transcode_dir.display());

    if raw.video_profiles.is_empty() {
        return Err(ConfigurationError::NoVideoProfiles);
    }
    for (name, profile) in &raw.video_profiles {
        let field = if profile.width == 0 {
            "width"
        } else if profile.height == 0 {
            "height"
        } else if profile.bitrate == 0 {
            "bitrate"
        } else {
            continue;
        };
        return Err(ConfigurationError::InvalidVideoProfile {
            name: name.clone(),
            field,
        });
    }

    let cache_dir = (!raw.cache_dir.is_empty()).then(|| PathBuf::from(&raw.cache_dir));
    if raw.cache
        && let Some(dir) = &cache_dir
    {
        tokio::fs::create_dir_all(dir)
            .await
            .map_err(|e| ConfigurationError::io("Failed to create cache directory", dir, e))?;
        debug!("Cache directory: {}", dir.display());
    }

    Ok(VodSettings {
        media_dir: PathBuf::from(raw.media_dir),
        transcode_dir,
        video_profiles: raw.video_profiles,
        video_keyframes: raw.video_keyframes,
        audio_profile: raw.audio_profile,
        cache: raw.cache,
        cache_dir,
        ffmpeg_binary: or_default(raw.ffmpeg_binary, DEFAULT_FFMPEG_BINARY),
        ffprobe_binary: or_default(raw.ffprobe_binary, DEFAULT_FFPROBE_BINARY),
    })
}

fn or_default(value: String, default: &str) -> String {
    if value.is_empty() {
        default.to_string()
    } else {
        value
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{StreamMap, VideoProfile};
    use crate::enigma2::client::mock::MockDirectory;
    use std::collections::BTreeMap;
    use tempfile::TempDir;

    fn one_profile() -> BTreeMap<String, VideoProfile> {
        BTreeMap::from([(
            "1080p".to_string(),
            VideoProfile {
                width: 1920,
                height: 1080,
                bitrate: 5000,
            },
        )])
    }

    fn raw_with_profiles(temp: &TempDir) -> RawSettings {
        RawSettings {
            basedir: temp.path().to_string_lossy().into_owned(),
            vod: RawVodSettings {
                transcode_dir: temp.path().join("transcode").to_string_lossy().into_owned(),
                video_profiles: one_profile(),
                ..Default::default()
            },
            ..Default::default()
        }
    }

    #[test]
    fn test_base_dir_configured_is_used_verbatim() {
        let dir = resolve_base_dir("/srv/transcode", Path::new("/etc/transcode")).unwrap();
        assert_eq!(dir, PathBuf::from("/srv/transcode"));
    }

    #[test]
    fn test_base_dir_prefers_existing_system_dir() {
        let temp = TempDir::new().unwrap();
        let dir = resolve_base_dir("", temp.path()).unwrap();
        assert_eq!(dir, temp.path());
    }

    #[test]
    fn test_base_dir_falls_back_to_working_dir() {
        let temp = TempDir::new().unwrap();
        let missing = temp.path().join("does-not-exist");
        let dir = resolve_base_dir("", &missing).unwrap();
        assert_eq!(dir, std::env::current_dir().unwrap());
    }

    #[test]
    fn test_profiles_dir_defaults_under_base_dir() {
        let base = Path::new("/etc/transcode");
        assert_eq!(
            resolve_profiles_dir("", base),
            PathBuf::from("/etc/transcode/profiles")
        );
        assert_eq!(
            resolve_profiles_dir("/opt/profiles", base),
            PathBuf::from("/opt/profiles")
        );
    }

    #[tokio::test]
    async fn test_vod_without_profiles_is_fatal() {
        let temp = TempDir::new().unwrap();
        let raw = RawVodSettings {
            transcode_dir: temp.path().join("transcode").to_string_lossy().into_owned(),
            ..Default::default()
        };

        let result = resolve_vod(raw).await;
        assert!(matches!(result, Err(ConfigurationError::NoVideoProfiles)));
    }

    #[tokio::test]
    async fn test_vod_rejects_zero_bitrate() {
        let temp = TempDir::new().unwrap();
        let raw = RawVodSettings {
            transcode_dir: temp.path().join("transcode").to_string_lossy().into_owned(),
            video_profiles: BTreeMap::from([(
                "broken".to_string(),
                VideoProfile {
                    width: 640,
                    height: 360,
                    bitrate: 0,
                },
            )]),
            ..Default::default()
        };

        match resolve_vod(raw).await {
            Err(ConfigurationError::InvalidVideoProfile { name, field }) => {
                assert_eq!(name, "broken");
                assert_eq!(field, "bitrate");
            }
            other => panic!("expected invalid profile error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_vod_defaults_and_directories() {
        let temp = TempDir::new().unwrap();
        let transcode_dir = temp.path().join("nested").join("transcode");
        let cache_dir = temp.path().join("cache");
        let raw = RawVodSettings {
            media_dir: "/media".to_string(),
            transcode_dir: transcode_dir.to_string_lossy().into_owned(),
            video_profiles: one_profile(),
            cache: true,
            cache_dir: cache_dir.to_string_lossy().into_owned(),
            ..Default::default()
        };

        let vod = resolve_vod(raw).await.unwrap();
        assert_eq!(vod.transcode_dir, transcode_dir);
        assert!(transcode_dir.is_dir());
        assert_eq!(vod.cache_dir.as_deref(), Some(cache_dir.as_path()));
        assert!(cache_dir.is_dir());
        assert_eq!(vod.media_dir, PathBuf::from("/media"));
        assert_eq!(vod.ffmpeg_binary, DEFAULT_FFMPEG_BINARY);
        assert_eq!(vod.ffprobe_binary, DEFAULT_FFPROBE_BINARY);
    }

    #[tokio::test]
    async fn test_vod_cache_dir_untouched_when_cache_disabled() {
        let temp = TempDir::new().unwrap();
        let cache_dir = temp.path().join("cache");
        let raw = RawVodSettings {
            transcode_dir: temp.path().join("transcode").to_string_lossy().into_owned(),
            video_profiles: one_profile(),
            cache: false,
            cache_dir: cache_dir.to_string_lossy().into_owned(),
            ffprobe_binary: "/usr/local/bin/ffprobe".to_string(),
            ..Default::default()
        };

        let vod = resolve_vod(raw).await.unwrap();
        assert!(!cache_dir.exists());
        assert_eq!(vod.ffprobe_binary, "/usr/local/bin/ffprobe");
    }

    #[tokio::test]
    async fn test_vod_creates_unique_temp_transcode_dir() {
        let first = resolve_vod(RawVodSettings {
            video_profiles: one_profile(),
            ..Default::default()
        })
        .await
        .unwrap();
        let second = resolve_vod(RawVodSettings {
            video_profiles: one_profile(),
            ..Default::default()
        })
        .await
        .unwrap();

        assert!(first.transcode_dir.is_dir());
        assert_ne!(first.transcode_dir, second.transcode_dir);
        assert!(first.transcode_dir.starts_with(std::env::temp_dir()));

        std::fs::remove_dir(&first.transcode_dir).unwrap();
        std::fs::remove_dir(&second.transcode_dir).unwrap();
    }

    #[tokio::test]
    async fn test_transcode_dir_creation_failure_is_fatal() {
        let temp = TempDir::new().unwrap();
        let blocker = temp.path().join("file");
        std::fs::write(&blocker, b"not a directory").unwrap();

        let raw = RawVodSettings {
            transcode_dir: blocker.join("transcode").to_string_lossy().into_owned(),
            video_profiles: one_profile(),
            ..Default::default()
        };

        let result = resolve_vod(raw).await;
        assert!(matches!(result, Err(ConfigurationError::Io { .. })));
    }

    #[tokio::test]
    async fn test_resolve_without_receiver_keeps_static_streams() {
        let temp = TempDir::new().unwrap();
        let mut raw = raw_with_profiles(&temp);
        raw.streams = StreamMap::from([("Sky News".to_string(), "url1".to_string())]);
        raw.hls_proxy = [("cam".to_string(), "http://cam/".to_string())].into();

        let client = MockDirectory::new();
        let settings = SettingsResolver::new(client.clone())
            .resolve(raw)
            .await
            .unwrap();

        assert_eq!(settings.base_dir, temp.path());
        assert_eq!(settings.profiles_dir, temp.path().join("profiles"));
        assert_eq!(settings.streams.len(), 1);
        assert_eq!(settings.streams["Sky News"], "url1");
        assert_eq!(settings.hls_proxy["cam"], "http://cam/");
        assert_eq!(settings.bind, DEFAULT_BIND);
        assert_eq!(settings.enigma2.reference, None);
        assert!(client.requests().is_empty());
    }

    #[tokio::test]
    async fn test_resolve_uses_system_base_dir_when_unset() {
        let temp = TempDir::new().unwrap();
        let mut raw = raw_with_profiles(&temp);
        raw.basedir.clear();

        let settings = SettingsResolver::new(MockDirectory::new())
            .with_system_base_dir(temp.path())
            .resolve(raw)
            .await
            .unwrap();

        assert_eq!(settings.base_dir, temp.path());
        assert_eq!(settings.profiles_dir, temp.path().join("profiles"));
    }

    #[tokio::test]
    async fn test_resolve_merges_discovered_channels() {
        let temp = TempDir::new().unwrap();
        let mut raw = raw_with_profiles(&temp);
        raw.streams = StreamMap::from([("bbc_one_hd".to_string(), "url1".to_string())]);
        raw.enigma2.ip = "10.0.0.5".to_string();
        raw.enigma2.port = "80".to_string();

        let client = MockDirectory::new()
            .with_services(
                "http://10.0.0.5/web/getservices",
                &[("Favourites (TV)", "1:7:1:0:0:0:0:0:0:0:")],
            )
            .with_services(
                "http://10.0.0.5/web/getservices?sRef=1%3A7%3A1%3A0%3A0%3A0%3A0%3A0%3A0%3A0%3A",
                &[("BBC One HD", "1:0:19:1B1C:802:2:11A0000:0:0:0:")],
            );

        let settings = SettingsResolver::new(client).resolve(raw).await.unwrap();

        assert_eq!(
            settings.streams["bbc_one_hd"],
            "http://10.0.0.5:80/1:0:19:1B1C:802:2:11A0000:0:0:0:"
        );
        assert_eq!(
            settings.enigma2.reference.as_deref(),
            Some("1:7:1:0:0:0:0:0:0:0:")
        );
        assert_eq!(settings.enigma2.bouquet, DEFAULT_BOUQUET);
    }

    #[tokio::test]
    async fn test_resolve_discovery_failure_is_fatal() {
        let temp = TempDir::new().unwrap();
        let mut raw = raw_with_profiles(&temp);
        raw.enigma2.ip = "10.0.0.5".to_string();
        raw.enigma2.port = "80".to_string();

        let client = MockDirectory::new().with_status("http://10.0.0.5/web/getservices", 500);

        let result = SettingsResolver::new(client).resolve(raw).await;
        match result {
            Err(ConfigurationError::Discovery(err)) => assert_eq!(err.status(), Some(500)),
            other => panic!("expected discovery error, got {other:?}"),
        }
    }
}

//! TOML configuration for the player, with environment overrides.

use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

use log::{debug, info, warn};

const SYSTEM_CONFIG_PATH: &str = "/etc/presence-player/config.toml";

#[derive(Debug, Clone, Default, Deserialize)]
pub struct PlayerConfig {
    #[serde(default)]
    pub sensor: SensorConfig,
    #[serde(default)]
    pub playback: PlaybackConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SensorConfig {
    /// BCM GPIO line the PIR output is wired to.
    #[serde(default = "default_pin")]
    pub pin: u32,
    /// Read this file instead of the sysfs value file derived from `pin`.
    pub value_path: Option<PathBuf>,
    #[serde(default)]
    pub active_low: bool,
}

impl Default for SensorConfig {
    fn default() -> Self {
        SensorConfig {
            pin: default_pin(),
            value_path: None,
            active_low: false,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct PlaybackConfig {
    #[serde(default = "default_media_dir")]
    pub media_dir: String,
    #[serde(default = "default_timeout_secs")]
    pub no_motion_timeout_secs: u64,
    #[serde(default = "default_fade_out_ms")]
    pub fade_out_ms: u64,
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,
    #[serde(default = "default_retry_delay_secs")]
    pub retry_delay_secs: u64,
}

impl Default for PlaybackConfig {
    fn default() -> Self {
        PlaybackConfig {
            media_dir: default_media_dir(),
            no_motion_timeout_secs: default_timeout_secs(),
            fade_out_ms: default_fade_out_ms(),
            poll_interval_ms: default_poll_interval_ms(),
            retry_delay_secs: default_retry_delay_secs(),
        }
    }
}

impl PlaybackConfig {
    /// Media directory with a leading `~/` expanded against `$HOME`.
    pub fn media_dir(&self) -> PathBuf {
        expand_home(&self.media_dir, std::env::var("HOME").ok().as_deref())
    }

    pub fn no_motion_timeout(&self) -> Duration {
        Duration::from_secs(self.no_motion_timeout_secs)
    }

    pub fn fade_out(&self) -> Duration {
        Duration::from_millis(self.fade_out_ms)
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    pub fn retry_delay(&self) -> Duration {
        Duration::from_secs(self.retry_delay_secs)
    }
}

fn default_pin() -> u32 { 4 }
fn default_media_dir() -> String { "~/Music".into() }
fn default_timeout_secs() -> u64 { 30 }
fn default_fade_out_ms() -> u64 { 1500 }
fn default_poll_interval_ms() -> u64 { 500 }
fn default_retry_delay_secs() -> u64 { 5 }

impl PlayerConfig {
    pub fn load(path: &Path) -> Result<Self, String> {
        let content = std::fs::read_to_string(path).map_err(|e| format!("read {}: {e}", path.display()))?;
        toml::from_str(&content).map_err(|e| format!("parse {}: {e}", path.display()))
    }

    /// Load config with fallback chain:
    /// 1. $PRESENCE_PLAYER_CONFIG env var
    /// 2. /etc/presence-player/config.toml
    /// 3. Built-in defaults
    ///
    /// `PRESENCE_*` environment overrides are applied on top of whichever wins.
    pub fn find_and_load() -> Self {
        let candidates: Vec<PathBuf> = vec![
            std::env::var("PRESENCE_PLAYER_CONFIG").ok().map(PathBuf::from),
            Some(PathBuf::from(SYSTEM_CONFIG_PATH)),
        ]
        .into_iter()
        .flatten()
        .collect();

        let mut config = None;
        for path in &candidates {
            if path.exists() {
                match Self::load(path) {
                    Ok(loaded) => {
                        info!("Loaded config from {}", path.display());
                        config = Some(loaded);
                        break;
                    }
                    Err(e) => warn!("Failed to load {}: {e}", path.display()),
                }
            }
        }

        let mut config = config.unwrap_or_else(|| {
            info!("Using built-in default config");
            Self::default()
        });
        config.apply_env(|key| std::env::var(key).ok());
        config
    }

    /// Apply `PRESENCE_*` overrides from `lookup`. Unparseable numbers are ignored.
    pub fn apply_env<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(pin) = parse_var(&lookup, "PRESENCE_SENSOR_PIN") {
            self.sensor.pin = pin;
        }
        if let Some(path) = lookup("PRESENCE_SENSOR_PATH") {
            self.sensor.value_path = Some(PathBuf::from(path));
        }
        if let Some(dir) = lookup("PRESENCE_MEDIA_DIR") {
            self.playback.media_dir = dir;
        }
        if let Some(secs) = parse_var(&lookup, "PRESENCE_TIMEOUT_SECS") {
            self.playback.no_motion_timeout_secs = secs;
        }
        if let Some(ms) = parse_var(&lookup, "PRESENCE_FADE_MS") {
            self.playback.fade_out_ms = ms;
        }
    }
}

fn parse_var<F, T>(lookup: &F, key: &str) -> Option<T>
where
    F: Fn(&str) -> Option<String>,
    T: std::str::FromStr,
{
    let raw = lookup(key)?;
    match raw.trim().parse() {
        Ok(value) => {
            debug!("{key} override: {raw}");
            Some(value)
        }
        Err(_) => {
            warn!("Ignoring {key}={raw:?}: not a number");
            None
        }
    }
}

fn expand_home(path: &str, home: Option<&str>) -> PathBuf {
    match (path.strip_prefix("~/"), home) {
        (Some(rest), Some(home)) => Path::new(home).join(rest),
        _ => PathBuf::from(path),
    }
}

use serde::{Deserialize, Deserializer};
use std::path::{Path, PathBuf};
use std::time::Duration;
use bpswitch_common::{DisplayTool, RetryPolicy, SwitchSettings, SwitchError, error::ConfigError, Result};
use bpswitch_common::window::normalize_keywords;

const MIN_CHECK_RATE: Duration = Duration::from_millis(100);

// `check_rate` accepts plain milliseconds or a humantime string
#[derive(Deserialize)]
#[serde(untagged)]
enum RawDuration {
    Millis(u64),
    Text(String),
}

fn deserialize_check_rate<'de, D>(deserializer: D) -> std::result::Result<Duration, D::Error>
where
    D: Deserializer<'de>,
{
    match RawDuration::deserialize(deserializer)? {
        RawDuration::Millis(ms) => Ok(Duration::from_millis(ms)),
        RawDuration::Text(text) => bpswitch_common::duration::parse_duration(&text)
            .map_err(serde::de::Error::custom),
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub detection: DetectionConfig,
    #[serde(default)]
    pub game: ModeOutputConfig,
    #[serde(default)]
    pub desktop: ModeOutputConfig,
    #[serde(default)]
    pub audio: AudioConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DetectionConfig {
    #[serde(default = "default_keywords")]
    pub keywords: Vec<String>,
    #[serde(default = "default_check_rate", deserialize_with = "deserialize_check_rate")]
    pub check_rate: Duration,
    #[serde(default)]
    pub start_paused: bool,
}

/// Screen and audio target of one mode.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ModeOutputConfig {
    #[serde(default)]
    pub screen: String,
    #[serde(default)]
    pub audio: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AudioConfig {
    #[serde(default)]
    pub disabled: bool,
    #[serde(default = "default_retry_delay", with = "humantime_serde")]
    pub retry_delay: Duration,
    /// 0 retries without bound.
    #[serde(default)]
    pub max_attempts: u32,
}

// Default values
fn default_keywords() -> Vec<String> {
    ["Steam", "Big", "Picture", "mode"].iter().map(|s| s.to_string()).collect()
}

fn default_check_rate() -> Duration {
    Duration::from_millis(1000)
}

fn default_retry_delay() -> Duration {
    Duration::from_millis(500)
}

impl Default for DetectionConfig {
    fn default() -> Self {
        Self {
            keywords: default_keywords(),
            check_rate: default_check_rate(),
            start_paused: false,
        }
    }
}

impl Default for AudioConfig {
    fn default() -> Self {
        Self {
            disabled: false,
            retry_delay: default_retry_delay(),
            max_attempts: 0,
        }
    }
}

impl Config {
    pub fn load_from_path(path: &Path) -> Result<Self> {
        log::info!("Loading configuration from {:?}", path);

        let content = std::fs::read_to_string(path)
            .map_err(|e| SwitchError::Config(ConfigError::FileRead {
                path: path.to_path_buf(),
                source: e,
            }))?;

        let config: Config = toml::from_str(&content)
            .map_err(|e| SwitchError::Config(ConfigError::TomlParse {
                message: e.to_string(),
            }))?;

        config.validate()?;
        Ok(config)
    }

    pub fn config_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or(SwitchError::Config(ConfigError::NoConfigDir))?
            .join("bpswitch");

        Ok(config_dir.join("config.toml"))
    }

    pub fn validate(&self) -> Result<()> {
        self.detection.validate()?;
        self.game.validate("game", self.audio.disabled)?;
        self.desktop.validate("desktop", self.audio.disabled)?;
        Ok(())
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        match self.audio.max_attempts {
            0 => RetryPolicy::unbounded(self.audio.retry_delay),
            max => RetryPolicy::bounded(self.audio.retry_delay, max),
        }
    }

    /// The detection loop's view of this configuration for the given display tool.
    pub fn switch_settings(&self, display_tool: DisplayTool) -> SwitchSettings {
        SwitchSettings {
            keywords: self.detection.keywords.clone(),
            poll_interval: self.detection.check_rate,
            display_tool,
            game_screen: self.game.screen.clone(),
            desktop_screen: self.desktop.screen.clone(),
            game_audio: self.game.audio.clone(),
            desktop_audio: self.desktop.audio.clone(),
            audio_disabled: self.audio.disabled,
            audio_retry: self.retry_policy(),
        }
    }
}

impl DetectionConfig {
    fn validate(&self) -> Result<()> {
        if normalize_keywords(&self.keywords).is_empty() {
            return Err(SwitchError::Config(ConfigError::InvalidValue {
                field: "detection.keywords".to_string(),
                value: format!("{:?}", self.keywords),
            }));
        }

        if self.check_rate < MIN_CHECK_RATE {
            return Err(SwitchError::Config(ConfigError::InvalidValue {
                field: "detection.check_rate".to_string(),
                value: format!("{:?}", self.check_rate),
            }));
        }

        Ok(())
    }
}

impl ModeOutputConfig {
    fn validate(&self, section: &str, audio_disabled: bool) -> Result<()> {
        if self.screen.trim().is_empty() {
            return Err(SwitchError::Config(ConfigError::MissingField {
                field: format!("{}.screen", section),
            }));
        }

        if !audio_disabled && self.audio.trim().is_empty() {
            return Err(SwitchError::Config(ConfigError::MissingField {
                field: format!("{}.audio", section),
            }));
        }

        Ok(())
    }
}

use std::fmt::Write;
use std::path::{Path, PathBuf};

use chrono::format::{Item, StrftimeItems};
use chrono::{DateTime, TimeZone};
use serde::{Deserialize, Serialize};

use crate::{
    error::{ConfigError, Result},
    xml::ElementPath,
};

/// Main configuration for timecode-sync
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Synchronization behaviour
    pub sync: SyncConfig,

    /// Output file naming
    pub output: OutputConfig,

    /// Where each value lives in the interchange file
    pub paths: ElementPaths,
}

impl Config {
    /// Load configuration from a TOML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .map_err(|_| ConfigError::FileNotFound { path: path.display().to_string() })?;

        let config: Config = toml::from_str(&content)
            .map_err(|_| ConfigError::ParseFailed { path: path.display().to_string() })?;
        Ok(config)
    }

    /// Save configuration to a TOML file
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let content = toml::to_string_pretty(self)
            .map_err(|e| ConfigError::InvalidValue {
                key: "config".to_string(),
                value: e.to_string()
            })?;

        std::fs::write(path, content)?;
        Ok(())
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        self.output.validate()?;
        self.paths.validate()?;
        Ok(())
    }
}

/// What to do with a clip that has no timecode and no earlier same-named track
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UnresolvedPolicy {
    /// Abort the run, naming the track
    #[default]
    Error,
    /// Leave the clip untouched and log a warning
    Skip,
}

/// Synchronization configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SyncConfig {
    /// Handling of clips whose start cannot be resolved
    pub unresolved_offset: UnresolvedPolicy,

    /// Warn when a clip timecode precedes the sequence timecode
    pub warn_on_negative_start: bool,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            unresolved_offset: UnresolvedPolicy::Error,
            warn_on_negative_start: true,
        }
    }
}

/// Output naming configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Prefix of the default output file name
    pub file_prefix: String,

    /// `strftime` format of the timestamp in the default output file name
    pub timestamp_format: String,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            file_prefix: "output_".to_string(),
            timestamp_format: "%Y%m%d-%H%M%S".to_string(),
        }
    }
}

impl OutputConfig {
    /// Default output file name, e.g. `output_20240131-174502.xml`
    pub fn default_file_name<Tz>(&self, now: &DateTime<Tz>) -> Result<PathBuf>
    where
        Tz: TimeZone,
        Tz::Offset: std::fmt::Display,
    {
        let mut name = self.file_prefix.clone();
        write!(name, "{}.xml", now.format(&self.timestamp_format)).map_err(|_| self.invalid_timestamp_format())?;
        Ok(PathBuf::from(name))
    }

    fn invalid_timestamp_format(&self) -> ConfigError {
        ConfigError::InvalidValue {
            key: "output.timestamp_format".to_string(),
            value: self.timestamp_format.clone()
        }
    }

    fn validate(&self) -> Result<()> {
        if self.file_prefix.trim().is_empty() {
            return Err(ConfigError::InvalidValue {
                key: "output.file_prefix".to_string(),
                value: self.file_prefix.clone()
            }.into());
        }

        if self.timestamp_format.trim().is_empty()
            || StrftimeItems::new(&self.timestamp_format).any(|item| matches!(item, Item::Error))
        {
            return Err(self.invalid_timestamp_format().into());
        }

        Ok(())
    }
}

/// Element paths into the interchange file
///
/// The sequence path is matched from the document root; all other paths
/// are relative to the sequence, track or clip item they describe.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ElementPaths {
    pub sequence: String,
    pub sequence_name: String,
    pub frame_rate: String,
    pub sequence_timecode: String,
    pub tracks: String,
    pub clip: String,
    pub clip_name: String,
    pub clip_start: String,
    pub clip_end: String,
    pub clip_timecode: String,
}

impl Default for ElementPaths {
    fn default() -> Self {
        Self {
            sequence: "*/sequence".to_string(),
            sequence_name: "name".to_string(),
            frame_rate: "timecode/rate/timebase".to_string(),
            sequence_timecode: "timecode/string".to_string(),
            tracks: "media/*/track".to_string(),
            clip: "clipitem".to_string(),
            clip_name: "name".to_string(),
            clip_start: "start".to_string(),
            clip_end: "end".to_string(),
            clip_timecode: "file/timecode/string".to_string(),
        }
    }
}

impl ElementPaths {
    /// Parse one configured path, reporting the config key on failure
    pub fn parse(key: &str, value: &str) -> Result<ElementPath> {
        value.parse().map_err(|_| {
            ConfigError::InvalidValue {
                key: format!("paths.{}", key),
                value: value.to_string()
            }.into()
        })
    }

    /// Every path with its config key, in declaration order
    pub fn entries(&self) -> [(&'static str, &str); 10] {
        [
            ("sequence", self.sequence.as_str()),
            ("sequence_name", self.sequence_name.as_str()),
            ("frame_rate", self.frame_rate.as_str()),
            ("sequence_timecode", self.sequence_timecode.as_str()),
            ("tracks", self.tracks.as_str()),
            ("clip", self.clip.as_str()),
            ("clip_name", self.clip_name.as_str()),
            ("clip_start", self.clip_start.as_str()),
            ("clip_end", self.clip_end.as_str()),
            ("clip_timecode", self.clip_timecode.as_str()),
        ]
    }

    fn validate(&self) -> Result<()> {
        for (key, value) in self.entries() {
            Self::parse(key, value)?;
        }
        Ok(())
    }
}

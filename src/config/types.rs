use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

use crate::conversion::ConverterSettings;

#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub tools: ToolsConfig,

    #[serde(default)]
    pub conversion: ConversionConfig,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct ToolsConfig {
    /// Explicit ffmpeg binary (searched on PATH when unset)
    #[serde(default)]
    pub ffmpeg_path: Option<PathBuf>,

    /// Explicit ffprobe binary (searched on PATH when unset)
    #[serde(default)]
    pub ffprobe_path: Option<PathBuf>,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct ConversionConfig {
    /// Longest wait for one progress update from ffmpeg; 0 disables (default: 10)
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// Sources shorter than this are rejected (default: 0.01)
    #[serde(default = "default_min_duration_secs")]
    pub min_duration_secs: f64,

    /// Count attached cover art as a video stream (default: true)
    #[serde(default = "default_posters_as_video")]
    pub posters_as_video: bool,
}

fn default_timeout_secs() -> u64 {
    10
}

fn default_min_duration_secs() -> f64 {
    0.01
}

fn default_posters_as_video() -> bool {
    true
}

impl Default for ConversionConfig {
    fn default() -> Self {
        Self {
            timeout_secs: default_timeout_secs(),
            min_duration_secs: default_min_duration_secs(),
            posters_as_video: default_posters_as_video(),
        }
    }
}

impl ConversionConfig {
    pub fn timeout(&self) -> Option<Duration> {
        (self.timeout_secs > 0).then(|| Duration::from_secs(self.timeout_secs))
    }

    pub fn settings(&self) -> ConverterSettings {
        ConverterSettings {
            timeout: self.timeout(),
            min_duration: self.min_duration_secs,
            posters_as_video: self.posters_as_video,
        }
    }
}

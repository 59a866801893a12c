use std::path::Path;

use serde::Deserialize;

use crate::{animation::sampler::KeyframeSearch, sim::TimeWrapMode};

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("malformed config: {0}")]
    Toml(#[from] toml::de::Error),
}

#[derive(Deserialize, Debug, Clone, Default)]
#[serde(default)]
pub struct Config {
    pub import: ImportConfig,
    pub playback: PlaybackConfig,
}

#[derive(Deserialize, Debug, Clone)]
#[serde(default)]
pub struct ImportConfig {
    pub keyframe_search: KeyframeSearch,
    /// refuse buffers declaring more bytes than this
    pub max_buffer_bytes: usize,
}
impl Default for ImportConfig {
    fn default() -> Self {
        Self {
            keyframe_search: KeyframeSearch::Binary,
            max_buffer_bytes: 256 * 1024 * 1024,
        }
    }
}

#[derive(Deserialize, Debug, Clone)]
#[serde(default)]
pub struct PlaybackConfig {
    pub fps: u32,
    pub num_frames: u32,
    pub wrap: TimeWrapMode,
    pub speed: f32,
    pub max_frames_per_tick: u32,
    /// wrap to the first frame past the end, otherwise stop on the last
    #[serde(rename = "loop")]
    pub looping: bool,
}
impl Default for PlaybackConfig {
    fn default() -> Self {
        Self {
            fps: 24,
            num_frames: 240,
            wrap: TimeWrapMode::Repeat,
            speed: 1.0,
            max_frames_per_tick: 20,
            looping: true,
        }
    }
}

impl Config {
    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(text)?)
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_toml_str(&text)
    }
}

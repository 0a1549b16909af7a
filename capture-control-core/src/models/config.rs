use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Audio output sample rate used by every engine.
pub const AUDIO_SAMPLE_RATE: u32 = 48000;

/// Paths handed to the engine at init.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EngineConfig {
    /// Directory the engine loads its plugins from.
    pub plugin_path: PathBuf,

    /// Directory log files are written to.
    pub log_path: PathBuf,

    /// Directory the engine loads effects and other data from.
    pub data_path: PathBuf,

    /// Directory recordings are written to until changed with `set_recording_dir`.
    pub recording_path: PathBuf,
}

impl EngineConfig {
    pub fn validate(&self) -> Result<(), String> {
        if self.recording_path.as_os_str().is_empty() {
            return Err("recording path must not be empty".into());
        }
        if self.log_path.as_os_str().is_empty() {
            return Err("log path must not be empty".into());
        }
        Ok(())
    }
}

/// Output geometry shared by the encoder and the preview canvas.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct VideoContext {
    pub fps: u32,
    pub width: u32,
    pub height: u32,
}

impl VideoContext {
    pub fn new(fps: u32, width: u32, height: u32) -> Self {
        Self { fps, width, height }
    }

    pub fn validate(&self) -> Result<(), String> {
        if self.fps == 0 {
            return Err("fps must be positive".into());
        }
        if self.width == 0 || self.height == 0 {
            return Err(format!(
                "resolution must be non-zero, got {}x{}",
                self.width, self.height
            ));
        }
        Ok(())
    }
}

impl Default for VideoContext {
    fn default() -> Self {
        Self {
            fps: 60,
            width: 1920,
            height: 1080,
        }
    }
}

/// Limits of the in-memory pre-roll buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BufferConfig {
    /// Seconds of footage retained (default: 30).
    pub max_time_secs: u32,

    /// Upper bound on buffer memory in megabytes (default: 512).
    pub max_size_mb: u32,
}

impl BufferConfig {
    pub fn validate(&self) -> Result<(), String> {
        if self.max_time_secs == 0 {
            return Err("buffer duration must be positive".into());
        }
        if self.max_size_mb == 0 {
            return Err("buffer size must be positive".into());
        }
        Ok(())
    }
}

impl Default for BufferConfig {
    fn default() -> Self {
        Self {
            max_time_secs: 30,
            max_size_mb: 512,
        }
    }
}

/// Optional init settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct InitOptions {
    /// Keep a pre-roll buffer so recordings can start in the past (default: true).
    pub buffering: bool,

    /// Install the file logger under `EngineConfig::log_path` (default: true).
    pub install_logger: bool,

    /// Initial output geometry.
    pub video: VideoContext,

    /// Pre-roll buffer limits.
    pub buffer: BufferConfig,

    /// Video encoder kind to bind at init, or None for the engine's first.
    pub default_video_encoder: Option<String>,
}

impl InitOptions {
    pub fn validate(&self) -> Result<(), String> {
        self.video.validate()?;
        self.buffer.validate()
    }
}

impl Default for InitOptions {
    fn default() -> Self {
        Self {
            buffering: true,
            install_logger: true,
            video: VideoContext::default(),
            buffer: BufferConfig::default(),
            default_video_encoder: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_engine_defaults() {
        let options = InitOptions::default();
        assert!(options.buffering);
        assert_eq!(options.video, VideoContext::new(60, 1920, 1080));
        assert_eq!(options.buffer.max_time_secs, 30);
        assert_eq!(options.buffer.max_size_mb, 512);
        assert!(options.validate().is_ok());
    }

    #[test]
    fn video_context_rejects_zero_values() {
        assert!(VideoContext::new(0, 1920, 1080).validate().is_err());
        assert!(VideoContext::new(30, 0, 1080).validate().is_err());
        assert!(VideoContext::new(30, 1920, 0).validate().is_err());
    }

    #[test]
    fn engine_config_requires_recording_path() {
        let config = EngineConfig {
            plugin_path: PathBuf::from("plugins"),
            log_path: PathBuf::from("logs"),
            data_path: PathBuf::from("data"),
            recording_path: PathBuf::new(),
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn engine_config_parses_camel_case_json() {
        let json = r#"{
            "pluginPath": "dist/plugins",
            "logPath": "logs",
            "dataPath": "dist/effects",
            "recordingPath": "recordings"
        }"#;
        let config: EngineConfig = serde_json::from_str(json).unwrap();
        assert_eq!(config.recording_path, PathBuf::from("recordings"));
        assert!(config.validate().is_ok());
    }
}

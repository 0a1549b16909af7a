use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use super::config::VideoContext;

/// A finalized recording as reported by the engine.
#[derive(Debug, Clone, PartialEq)]
pub struct RecordingResult {
    pub file_path: PathBuf,
    pub duration_secs: f64,
    pub metadata: RecordingMetadata,
}

/// Metadata stored alongside a recording.
///
/// Serialized as a JSON sidecar next to the output file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecordingMetadata {
    pub id: String,
    pub file_path: String,
    pub created_at: String,
    pub duration_secs: f64,
    pub fps: u32,
    pub width: u32,
    pub height: u32,
    pub frame_count: u64,
    /// Seconds of pre-roll spliced in front of the start command.
    pub start_offset_secs: u32,
    pub video_encoder: String,
    pub checksum: String,
}

impl RecordingMetadata {
    pub fn new(
        file_path: &str,
        video: &VideoContext,
        frame_count: u64,
        start_offset_secs: u32,
        video_encoder: &str,
        checksum: &str,
    ) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            file_path: file_path.to_string(),
            created_at: chrono::Utc::now().to_rfc3339(),
            duration_secs: frame_count as f64 / video.fps.max(1) as f64,
            fps: video.fps,
            width: video.width,
            height: video.height,
            frame_count,
            start_offset_secs,
            video_encoder: video_encoder.to_string(),
            checksum: checksum.to_string(),
        }
    }

    pub fn video_context(&self) -> VideoContext {
        VideoContext::new(self.fps, self.width, self.height)
    }
}

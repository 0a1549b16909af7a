use std::path::{Path, PathBuf};

use capture_control_core::storage::metadata::write_metadata;
use capture_control_core::{
    BufferConfig, CaptureError, RecordingMetadata, RecordingResult, RingBuffer, VideoContext, AUDIO_SAMPLE_RATE,
};

use crate::output::wav_format::WavSpec;
use crate::output::writer::WavFileWriter;

/// Container extension of software engine recordings.
pub const OUTPUT_EXTENSION: &str = "wav";

pub const OUTPUT_SPEC: WavSpec = WavSpec {
    sample_rate: AUDIO_SAMPLE_RATE,
    channels: 2,
    bit_depth: 16,
};

/// One encoded frame interval of mixed output.
#[derive(Debug, Clone, PartialEq)]
pub struct Packet {
    pub pcm: Vec<u8>,
}

/// Audio frames that fall into video frame `tick` at `fps`.
///
/// Rates that do not divide the sample rate evenly alternate between the
/// two neighbouring sizes so the long-run total stays exact.
pub fn samples_for_tick(tick: u64, fps: u32) -> usize {
    let fps = fps.max(1) as u64;
    let rate = AUDIO_SAMPLE_RATE as u64;
    let start = tick * rate / fps;
    let end = (tick + 1) * rate / fps;
    (end - start) as usize
}

/// Packets the pre-roll buffer can hold: the time limit or the size
/// limit, whichever is smaller.
pub fn buffer_capacity(buffer: &BufferConfig, video: &VideoContext) -> usize {
    let by_time = buffer.max_time_secs as u64 * video.fps as u64;
    let packet_bytes = samples_for_tick(0, video.fps) as u64 * OUTPUT_SPEC.block_align() as u64;
    let by_size = (buffer.max_size_mb as u64 * 1024 * 1024) / packet_bytes.max(1);
    by_time.min(by_size).max(1) as usize
}

/// A file being written by the output.
pub struct ActiveRecording {
    writer: WavFileWriter,
    video: VideoContext,
    start_offset_secs: u32,
    encoder: String,
    frames: u64,
}

impl ActiveRecording {
    pub fn create(path: PathBuf, video: VideoContext, start_offset_secs: u32, encoder: &str) -> Result<Self, CaptureError> {
        let mut writer = WavFileWriter::new(path, OUTPUT_SPEC);
        writer.open()?;
        Ok(Self {
            writer,
            video,
            start_offset_secs,
            encoder: encoder.to_string(),
            frames: 0,
        })
    }

    pub fn write_packet(&mut self, packet: &Packet) -> Result<(), CaptureError> {
        self.writer.write(&packet.pcm)?;
        self.frames += 1;
        Ok(())
    }

    pub fn path(&self) -> &Path {
        self.writer.file_path()
    }

    /// Close the file and write its metadata sidecar.
    pub fn finalize(mut self) -> Result<RecordingResult, CaptureError> {
        let checksum = self.writer.close()?;
        let file_path = self.writer.file_path().to_path_buf();
        let metadata = RecordingMetadata::new(
            &file_path.to_string_lossy(),
            &self.video,
            self.frames,
            self.start_offset_secs,
            &self.encoder,
            &checksum,
        );
        write_metadata(&metadata, &file_path)?;
        Ok(RecordingResult {
            file_path,
            duration_secs: metadata.duration_secs,
            metadata,
        })
    }

    /// Close the file without metadata. Used when the output is torn down.
    pub fn abort(mut self) {
        if let Err(e) = self.writer.close() {
            log::warn!("Failed to close aborted recording {}: {}", self.path().display(), e);
        }
    }
}

/// What the single engine output is doing.
pub enum OutputState {
    Idle,
    Buffering(RingBuffer<Packet>),
    Recording(ActiveRecording),
    /// Stop requested; the file is finalized on the next tick.
    Stopping(ActiveRecording),
}

impl OutputState {
    pub fn is_active(&self) -> bool {
        matches!(self, Self::Buffering(_) | Self::Recording(_))
    }

    pub fn is_idle(&self) -> bool {
        matches!(self, Self::Idle)
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Buffering(_) => "buffering",
            Self::Recording(_) => "recording",
            Self::Stopping(_) => "stopping",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use capture_control_core::storage::metadata::read_metadata;

    #[test]
    fn tick_sizes_sum_to_sample_rate() {
        for fps in [24, 30, 60, 144] {
            let total: usize = (0..fps as u64).map(|t| samples_for_tick(t, fps)).sum();
            assert_eq!(total, AUDIO_SAMPLE_RATE as usize, "fps {}", fps);
        }
        assert_eq!(samples_for_tick(0, 60), 800);
    }

    #[test]
    fn capacity_takes_the_tighter_limit() {
        let video = VideoContext::new(60, 1920, 1080);
        let by_time = BufferConfig { max_time_secs: 30, max_size_mb: 512 };
        assert_eq!(buffer_capacity(&by_time, &video), 1800);

        // 1 MiB of 3200-byte packets.
        let by_size = BufferConfig { max_time_secs: 30, max_size_mb: 1 };
        assert_eq!(buffer_capacity(&by_size, &video), 327);
    }

    #[test]
    fn finalize_writes_metadata_sidecar() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("clip.wav");
        let video = VideoContext::new(30, 1280, 720);
        let mut rec = ActiveRecording::create(path.clone(), video, 2, "obs_x264").unwrap();
        for _ in 0..30 {
            rec.write_packet(&Packet { pcm: vec![0u8; 6400] }).unwrap();
        }

        let result = rec.finalize().unwrap();

        assert_eq!(result.file_path, path);
        approx::assert_relative_eq!(result.duration_secs, 1.0);
        let metadata = read_metadata(&path).unwrap();
        assert_eq!(metadata.video_context(), video);
        assert_eq!(metadata.frame_count, 30);
        assert_eq!(metadata.start_offset_secs, 2);
        assert_eq!(metadata.checksum, result.metadata.checksum);
    }

    #[test]
    fn abort_leaves_no_sidecar() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("aborted.wav");
        let rec = ActiveRecording::create(path.clone(), VideoContext::default(), 0, "obs_x264").unwrap();

        rec.abort();

        assert!(path.exists());
        assert!(read_metadata(&path).is_err());
    }
}

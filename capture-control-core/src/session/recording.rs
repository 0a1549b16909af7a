use std::path::{Path, PathBuf};
use std::time::Instant;

use crate::models::config::{BufferConfig, InitOptions, VideoContext};
use crate::models::error::CaptureError;
use crate::models::settings::Settings;
use crate::models::state::RecordingMode;
use crate::storage::naming::next_output_target;
use crate::traits::engine::Engine;

/// Idle / Buffering / Recording state machine over the engine output.
///
/// ```text
///          start_buffer               start_recording(offset)
///   Idle ──────────────→ Buffering ──────────────────────────→ Recording
///    │  ←──────────────      │                                     │
///    │   stop_recording      │                                     │
///    └───────────────────────┴──── start_recording(0) ────────────→┘
///    ↑                                                             │
///    └──────────────── stop_recording / force_stop ────────────────┘
/// ```
///
/// The output path is bound when a recording starts, so changing the
/// recording directory never affects a recording in flight.
#[derive(Debug)]
pub struct RecordingController {
    mode: RecordingMode,
    buffering_enabled: bool,
    buffer: BufferConfig,
    recording_dir: PathBuf,
    video: VideoContext,
    video_encoder: Option<String>,
    buffer_started: Option<Instant>,
    active_path: Option<PathBuf>,
    last_recording: Option<PathBuf>,
}

impl RecordingController {
    pub fn new(recording_dir: PathBuf, options: &InitOptions) -> Self {
        Self {
            mode: RecordingMode::Idle,
            buffering_enabled: options.buffering,
            buffer: options.buffer,
            recording_dir,
            video: options.video,
            video_encoder: None,
            buffer_started: None,
            active_path: None,
            last_recording: None,
        }
    }

    pub fn mode(&self) -> RecordingMode {
        self.mode
    }

    pub fn video(&self) -> VideoContext {
        self.video
    }

    pub fn buffering_enabled(&self) -> bool {
        self.buffering_enabled
    }

    pub fn recording_dir(&self) -> &Path {
        &self.recording_dir
    }

    pub fn video_encoder(&self) -> Option<&str> {
        self.video_encoder.as_deref()
    }

    /// Path of the most recent recording that stopped cleanly.
    pub fn last_recording(&self) -> Option<&Path> {
        self.last_recording.as_deref()
    }

    /// Path of the recording in progress.
    pub fn active_recording(&self) -> Option<&Path> {
        self.active_path.as_deref()
    }

    fn require_idle(&self, action: &str) -> Result<(), CaptureError> {
        if self.mode.is_idle() {
            Ok(())
        } else {
            Err(CaptureError::InvalidState(format!(
                "cannot {} while {:?}",
                action, self.mode
            )))
        }
    }

    fn reset(&mut self) {
        self.mode = RecordingMode::Idle;
        self.buffer_started = None;
        self.active_path = None;
    }

    pub fn set_buffering(&mut self, enabled: bool) -> Result<(), CaptureError> {
        self.require_idle("change buffering")?;
        self.buffering_enabled = enabled;
        log::info!("Buffering {}", if enabled { "enabled" } else { "disabled" });
        Ok(())
    }

    pub fn set_recording_dir(&mut self, dir: &Path) -> Result<(), CaptureError> {
        if dir.as_os_str().is_empty() {
            return Err(CaptureError::InvalidArgument("recording directory must not be empty".into()));
        }
        self.recording_dir = dir.to_path_buf();
        log::info!("Recording directory set to {}", dir.display());
        Ok(())
    }

    /// Pick the encoder bound at init: `preferred` if given, else the engine's first.
    pub fn bind_default_encoder<E: Engine>(&mut self, engine: &mut E, preferred: Option<&str>) -> Result<(), CaptureError> {
        let available = engine.video_encoders();
        let kind = match preferred {
            Some(kind) if available.iter().any(|k| k == kind) => kind.to_string(),
            Some(kind) => return Err(CaptureError::UnknownEncoder(kind.to_string())),
            None => available
                .first()
                .cloned()
                .ok_or_else(|| CaptureError::ConfigurationFailed("engine offers no video encoders".into()))?,
        };
        engine.set_video_encoder(&kind, &Settings::new())?;
        log::info!("Using video encoder {}", kind);
        self.video_encoder = Some(kind);
        Ok(())
    }

    pub fn set_video_encoder<E: Engine>(&mut self, engine: &mut E, kind: &str, settings: &Settings) -> Result<(), CaptureError> {
        self.require_idle("change the video encoder")?;
        if !engine.video_encoders().iter().any(|k| k == kind) {
            return Err(CaptureError::UnknownEncoder(kind.to_string()));
        }
        engine.set_video_encoder(kind, settings)?;
        log::info!("Video encoder set to {}", kind);
        self.video_encoder = Some(kind.to_string());
        Ok(())
    }

    pub fn reset_video<E: Engine>(&mut self, engine: &mut E, video: VideoContext) -> Result<(), CaptureError> {
        video.validate().map_err(CaptureError::InvalidArgument)?;
        self.require_idle("reset video")?;
        engine.reset_video(&video)?;
        log::info!("Video reset to {}x{} @ {} fps", video.width, video.height, video.fps);
        self.video = video;
        Ok(())
    }

    pub fn start_buffer<E: Engine>(&mut self, engine: &mut E) -> Result<(), CaptureError> {
        if !self.buffering_enabled {
            return Err(CaptureError::InvalidState("buffering is disabled".into()));
        }
        self.require_idle("start buffering")?;
        engine.start_buffer(&self.buffer)?;
        self.mode = RecordingMode::Buffering;
        self.buffer_started = Some(Instant::now());
        log::info!("Buffer started");
        Ok(())
    }

    /// Seconds of pre-roll the buffer can hold at most by time alone.
    fn retained_secs(&self) -> u32 {
        let elapsed = self
            .buffer_started
            .map(|t| t.elapsed().as_secs())
            .unwrap_or(0);
        u32::try_from(elapsed)
            .unwrap_or(u32::MAX)
            .min(self.buffer.max_time_secs)
    }

    /// Start recording. Returns the offset actually applied.
    ///
    /// From Buffering the file starts `offset_secs` in the past, clamped to
    /// what the buffer holds. From Idle the offset does not apply.
    pub fn start_recording<E: Engine>(&mut self, engine: &mut E, offset_secs: u32) -> Result<u32, CaptureError> {
        let target = next_output_target(&self.recording_dir);
        let (path, applied) = match self.mode {
            RecordingMode::Recording => {
                return Err(CaptureError::InvalidState("already recording".into()));
            }
            RecordingMode::Buffering => {
                let wanted = offset_secs.min(self.retained_secs());
                target.ensure_directory()?;
                let (path, applied) = engine.convert_buffer(wanted, &target)?;
                let applied = applied.min(wanted);
                if applied < offset_secs {
                    log::warn!(
                        "Requested offset {}s exceeds buffered content, using {}s",
                        offset_secs,
                        applied
                    );
                }
                (path, applied)
            }
            RecordingMode::Idle => {
                if offset_secs > 0 {
                    log::debug!("Offset {}s ignored, no buffer running", offset_secs);
                }
                target.ensure_directory()?;
                (engine.start_recording(&target)?, 0)
            }
        };

        log::info!("Recording started: {} (offset {}s)", path.display(), applied);
        self.mode = RecordingMode::Recording;
        self.buffer_started = None;
        self.active_path = Some(path);
        Ok(applied)
    }

    /// Stop gracefully.
    ///
    /// From Recording the output path becomes the last recording. From
    /// Buffering the buffer is discarded without writing a file. If the
    /// output already died on its own the controller returns to Idle and
    /// reports an engine error instead of publishing a path.
    pub fn stop_recording<E: Engine>(&mut self, engine: &mut E) -> Result<(), CaptureError> {
        match self.mode {
            RecordingMode::Idle => Err(CaptureError::InvalidState("no recording in progress".into())),
            RecordingMode::Buffering => {
                engine.stop_output()?;
                self.reset();
                log::info!("Buffer discarded");
                Ok(())
            }
            RecordingMode::Recording => {
                if !engine.output_active() {
                    let lost = self.active_path.take();
                    self.reset();
                    log::error!("Output stopped unexpectedly, recording {:?} not saved", lost);
                    return Err(CaptureError::Engine("output stopped unexpectedly".into()));
                }
                engine.stop_output()?;
                self.last_recording = self.active_path.take();
                self.reset();
                if let Some(path) = &self.last_recording {
                    log::info!("Recording stopped: {}", path.display());
                }
                Ok(())
            }
        }
    }

    /// Tear the output down immediately. Never publishes a recording path.
    pub fn force_stop<E: Engine>(&mut self, engine: &mut E) {
        if self.mode.is_idle() {
            log::debug!("Force stop with no active output");
            return;
        }
        log::warn!("Force stopping output ({:?})", self.mode);
        engine.force_stop_output();
        self.reset();
    }

    /// Stop whatever is running during shutdown, falling back to a force stop.
    pub fn stop_for_shutdown<E: Engine>(&mut self, engine: &mut E) -> Option<CaptureError> {
        if self.mode.is_idle() {
            return None;
        }
        match self.stop_recording(engine) {
            Ok(()) => None,
            Err(e) => {
                log::error!("Graceful stop failed during shutdown: {}", e);
                self.force_stop(engine);
                Some(e)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::mock_engine::{MockEngine, MockOutput};
    use std::time::Duration;

    fn controller(dir: &Path) -> RecordingController {
        RecordingController::new(dir.to_path_buf(), &InitOptions::default())
    }

    #[test]
    fn offset_from_idle_is_ignored() {
        let dir = tempfile::tempdir().unwrap();
        let mut engine = MockEngine::new();
        let mut rec = controller(dir.path());

        assert_eq!(rec.start_recording(&mut engine, 10).unwrap(), 0);
        assert_eq!(rec.mode(), RecordingMode::Recording);
        assert!(engine.state().calls.contains(&"start_recording".to_string()));
    }

    #[test]
    fn offset_is_clamped_to_buffered_content() {
        let dir = tempfile::tempdir().unwrap();
        let mut engine = MockEngine::new();
        let mut rec = controller(dir.path());

        rec.start_buffer(&mut engine).unwrap();
        let applied = rec.start_recording(&mut engine, 25).unwrap();

        assert_eq!(applied, 0);
        assert_eq!(engine.state().last_offset, Some(0));
    }

    #[test]
    fn offset_within_buffer_is_applied() {
        let dir = tempfile::tempdir().unwrap();
        let mut engine = MockEngine::new();
        let mut rec = controller(dir.path());

        rec.start_buffer(&mut engine).unwrap();
        std::thread::sleep(Duration::from_millis(1100));
        let applied = rec.start_recording(&mut engine, 1).unwrap();

        assert_eq!(applied, 1);
        assert_eq!(engine.state().last_offset, Some(1));
    }

    #[test]
    fn offset_is_cut_to_what_the_engine_buffer_holds() {
        let dir = tempfile::tempdir().unwrap();
        let mut engine = MockEngine::new();
        engine.state().buffered_secs = Some(0);
        let mut rec = controller(dir.path());

        rec.start_buffer(&mut engine).unwrap();
        std::thread::sleep(Duration::from_millis(1100));
        let applied = rec.start_recording(&mut engine, 1).unwrap();

        assert_eq!(applied, 0);
        assert_eq!(engine.state().last_offset, Some(0));
        assert!(engine.state().calls.contains(&"convert_buffer 1".to_string()));
    }

    #[test]
    fn stop_publishes_path_and_idle_stop_fails() {
        let dir = tempfile::tempdir().unwrap();
        let mut engine = MockEngine::new();
        let mut rec = controller(dir.path());

        assert!(matches!(rec.stop_recording(&mut engine), Err(CaptureError::InvalidState(_))));

        rec.start_recording(&mut engine, 0).unwrap();
        let active = rec.active_recording().unwrap().to_path_buf();
        rec.stop_recording(&mut engine).unwrap();

        assert_eq!(rec.last_recording(), Some(active.as_path()));
        assert!(active.starts_with(dir.path()));
        assert_eq!(rec.mode(), RecordingMode::Idle);
    }

    #[test]
    fn stopping_a_buffer_discards_it() {
        let dir = tempfile::tempdir().unwrap();
        let mut engine = MockEngine::new();
        let mut rec = controller(dir.path());

        rec.start_buffer(&mut engine).unwrap();
        rec.stop_recording(&mut engine).unwrap();

        assert_eq!(rec.mode(), RecordingMode::Idle);
        assert_eq!(rec.last_recording(), None);
    }

    #[test]
    fn dead_output_is_reported_not_published() {
        let dir = tempfile::tempdir().unwrap();
        let mut engine = MockEngine::new();
        let mut rec = controller(dir.path());

        rec.start_recording(&mut engine, 0).unwrap();
        engine.state().output_dead = true;

        assert!(matches!(rec.stop_recording(&mut engine), Err(CaptureError::Engine(_))));
        assert_eq!(rec.mode(), RecordingMode::Idle);
        assert_eq!(rec.last_recording(), None);
    }

    #[test]
    fn force_stop_never_publishes() {
        let dir = tempfile::tempdir().unwrap();
        let mut engine = MockEngine::new();
        let mut rec = controller(dir.path());

        rec.force_stop(&mut engine);
        rec.start_recording(&mut engine, 0).unwrap();
        rec.force_stop(&mut engine);

        assert_eq!(rec.mode(), RecordingMode::Idle);
        assert_eq!(rec.last_recording(), None);
        assert_eq!(engine.state().output, MockOutput::Idle);
    }

    #[test]
    fn second_start_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let mut engine = MockEngine::new();
        let mut rec = controller(dir.path());

        rec.start_recording(&mut engine, 0).unwrap();
        assert!(matches!(rec.start_recording(&mut engine, 0), Err(CaptureError::InvalidState(_))));
        assert!(matches!(rec.start_buffer(&mut engine), Err(CaptureError::InvalidState(_))));
    }

    #[test]
    fn buffering_can_be_disabled_only_while_idle() {
        let dir = tempfile::tempdir().unwrap();
        let mut engine = MockEngine::new();
        let mut rec = controller(dir.path());

        rec.set_buffering(false).unwrap();
        assert!(matches!(rec.start_buffer(&mut engine), Err(CaptureError::InvalidState(_))));

        rec.set_buffering(true).unwrap();
        rec.start_buffer(&mut engine).unwrap();
        assert!(rec.set_buffering(false).is_err());
    }

    #[test]
    fn video_reset_requires_idle_and_valid_geometry() {
        let dir = tempfile::tempdir().unwrap();
        let mut engine = MockEngine::new();
        let mut rec = controller(dir.path());

        assert!(matches!(
            rec.reset_video(&mut engine, VideoContext::new(0, 1280, 720)),
            Err(CaptureError::InvalidArgument(_))
        ));
        rec.reset_video(&mut engine, VideoContext::new(30, 1280, 720)).unwrap();
        assert_eq!(rec.video(), VideoContext::new(30, 1280, 720));

        rec.start_buffer(&mut engine).unwrap();
        assert!(matches!(
            rec.reset_video(&mut engine, VideoContext::new(60, 1920, 1080)),
            Err(CaptureError::InvalidState(_))
        ));
        let state = engine.state();
        assert_eq!(state.video, Some(VideoContext::new(30, 1280, 720)));
        assert_eq!(state.calls.iter().filter(|c| c.starts_with("reset_video")).count(), 1);
    }

    #[test]
    fn directory_change_binds_next_recording_only() {
        let first = tempfile::tempdir().unwrap();
        let second = tempfile::tempdir().unwrap();
        let mut engine = MockEngine::new();
        let mut rec = controller(first.path());

        rec.start_recording(&mut engine, 0).unwrap();
        rec.set_recording_dir(second.path()).unwrap();
        rec.stop_recording(&mut engine).unwrap();
        assert!(rec.last_recording().unwrap().starts_with(first.path()));

        rec.start_recording(&mut engine, 0).unwrap();
        rec.stop_recording(&mut engine).unwrap();
        assert!(rec.last_recording().unwrap().starts_with(second.path()));
    }

    #[test]
    fn encoder_binding() {
        let dir = tempfile::tempdir().unwrap();
        let mut engine = MockEngine::new();
        let mut rec = controller(dir.path());

        rec.bind_default_encoder(&mut engine, None).unwrap();
        assert_eq!(rec.video_encoder(), Some("obs_x264"));

        assert_eq!(
            rec.set_video_encoder(&mut engine, "quantum_hevc", &Settings::new()).unwrap_err(),
            CaptureError::UnknownEncoder("quantum_hevc".into())
        );
        rec.set_video_encoder(&mut engine, "jim_nvenc", &Settings::new()).unwrap();
        assert_eq!(rec.video_encoder(), Some("jim_nvenc"));
        assert!(matches!(
            rec.bind_default_encoder(&mut engine, Some("nope")),
            Err(CaptureError::UnknownEncoder(_))
        ));
    }
}

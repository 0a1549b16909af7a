//! In-memory engine used by the session tests.

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;

use parking_lot::{Mutex, MutexGuard};

use crate::models::config::{BufferConfig, EngineConfig, VideoContext};
use crate::models::error::CaptureError;
use crate::models::preview::{PreviewRect, SurfaceHandle};
use crate::models::properties::{Property, PropertyKind};
use crate::models::settings::Settings;
use crate::models::signal::{codes, output_ids, Signal};
use crate::models::source::{SceneTransform, SourceCategory, SourceDimensions, SourceId};
use crate::session::signal_bus::EventSink;
use crate::storage::naming::OutputTarget;
use crate::traits::engine::Engine;

#[derive(Debug, Clone, Default)]
pub struct MockSource {
    pub name: String,
    pub kind: String,
    pub settings: Settings,
    pub volume: f32,
    pub muted: bool,
    pub force_mono: bool,
    pub noise_suppression: bool,
    pub transform: Option<SceneTransform>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum MockOutput {
    Idle,
    Buffering,
    Recording(PathBuf),
}

pub struct MockState {
    pub calls: Vec<String>,
    pub started: bool,
    pub shutdown_calls: usize,
    pub sources: HashMap<SourceId, MockSource>,
    pub live_sources: usize,
    pub scene_adds: usize,
    pub next_id: u64,
    pub fail_release: bool,
    pub fail_startup: bool,
    pub fail_transform: bool,
    pub encoders: Vec<String>,
    pub video_encoder: Option<String>,
    pub video: Option<VideoContext>,
    pub volmeter_enabled: bool,
    pub output: MockOutput,
    /// Simulates an output that died on its own.
    pub output_dead: bool,
    pub last_offset: Option<u32>,
    /// Whole seconds the simulated buffer holds, when limited.
    pub buffered_secs: Option<u32>,
    pub preview: Option<SurfaceHandle>,
    pub preview_rect: Option<PreviewRect>,
    pub preview_visible: bool,
    pub sink: EventSink,
}

impl Default for MockState {
    fn default() -> Self {
        Self {
            calls: Vec::new(),
            started: false,
            shutdown_calls: 0,
            sources: HashMap::new(),
            live_sources: 0,
            scene_adds: 0,
            next_id: 1,
            fail_release: false,
            fail_startup: false,
            fail_transform: false,
            encoders: vec!["obs_x264".into(), "jim_nvenc".into()],
            video_encoder: None,
            video: None,
            volmeter_enabled: false,
            output: MockOutput::Idle,
            buffered_secs: None,
            output_dead: false,
            last_offset: None,
            preview: None,
            preview_rect: None,
            preview_visible: false,
            sink: EventSink::disconnected(),
        }
    }
}

/// Cloneable handle; clones share state so tests can inspect an engine
/// that has been moved into a session.
#[derive(Clone, Default)]
pub struct MockEngine {
    shared: Arc<Mutex<MockState>>,
}

impl MockEngine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> MutexGuard<'_, MockState> {
        self.shared.lock()
    }

    pub fn source_named(&self, name: &str) -> Option<MockSource> {
        self.state().sources.values().find(|s| s.name == name).cloned()
    }

    fn record(&self, call: String) {
        self.shared.lock().calls.push(call);
    }

    fn with_source<R>(
        &self,
        id: SourceId,
        f: impl FnOnce(&mut MockSource) -> R,
    ) -> Result<R, CaptureError> {
        let mut state = self.shared.lock();
        state
            .sources
            .get_mut(&id)
            .map(f)
            .ok_or_else(|| CaptureError::Engine(format!("no source with id {}", id.0)))
    }

    fn emit_output(&self, id: &str) {
        let sink = self.shared.lock().sink.clone();
        sink.emit(Signal::output(id, codes::SUCCESS));
    }
}

impl Engine for MockEngine {
    fn startup(&mut self, _config: &EngineConfig, video: &VideoContext, events: EventSink) -> Result<(), CaptureError> {
        self.record("startup".into());
        let mut state = self.shared.lock();
        if state.fail_startup {
            return Err(CaptureError::Engine("startup failed".into()));
        }
        state.started = true;
        state.video = Some(*video);
        state.sink = events;
        Ok(())
    }

    fn shutdown(&mut self) -> Result<(), CaptureError> {
        self.record("shutdown".into());
        let mut state = self.shared.lock();
        state.started = false;
        state.shutdown_calls += 1;
        state.sink = EventSink::disconnected();
        Ok(())
    }

    fn reset_video(&mut self, video: &VideoContext) -> Result<(), CaptureError> {
        self.record(format!("reset_video {}x{}@{}", video.width, video.height, video.fps));
        self.shared.lock().video = Some(*video);
        Ok(())
    }

    fn source_category(&self, kind: &str) -> Option<SourceCategory> {
        match kind {
            "monitor_capture" | "window_capture" | "game_capture" => Some(SourceCategory::Video),
            "wasapi_input_capture" => Some(SourceCategory::AudioInput),
            "wasapi_output_capture" | "wasapi_process_output_capture" => Some(SourceCategory::AudioOutput),
            _ => None,
        }
    }

    fn create_source(&mut self, name: &str, kind: &str) -> Result<SourceId, CaptureError> {
        self.record(format!("create_source {}", name));
        let mut state = self.shared.lock();
        let id = SourceId(state.next_id);
        state.next_id += 1;
        state.live_sources += 1;
        state.sources.insert(
            id,
            MockSource {
                name: name.to_string(),
                kind: kind.to_string(),
                volume: 1.0,
                ..MockSource::default()
            },
        );
        Ok(id)
    }

    fn release_source(&mut self, id: SourceId) -> Result<(), CaptureError> {
        self.record(format!("release_source {}", id.0));
        let mut state = self.shared.lock();
        if state.fail_release {
            return Err(CaptureError::Engine("release failed".into()));
        }
        if state.sources.remove(&id).is_some() {
            state.live_sources -= 1;
        }
        Ok(())
    }

    fn source_settings(&self, id: SourceId) -> Result<Settings, CaptureError> {
        self.with_source(id, |s| s.settings.clone())
    }

    fn update_source(&mut self, id: SourceId, settings: &Settings) -> Result<(), CaptureError> {
        self.record(format!("update_source {}", id.0));
        self.with_source(id, |s| s.settings = settings.clone())
    }

    fn source_properties(&self, id: SourceId) -> Result<Vec<Property>, CaptureError> {
        self.with_source(id, |s| {
            let mut props = vec![Property::new("capture_cursor", "Capture Cursor", PropertyKind::Bool)];
            if s.settings.get_str("capture_mode") == Some("window") {
                props.push(Property::new("window", "Window", PropertyKind::Text {
                    text_type: crate::models::properties::TextType::Default,
                }));
            }
            props
        })
    }

    fn source_dimensions(&self, id: SourceId) -> Result<SourceDimensions, CaptureError> {
        self.with_source(id, |s| match s.kind.as_str() {
            "monitor_capture" | "window_capture" | "game_capture" => SourceDimensions { width: 1920, height: 1080 },
            _ => SourceDimensions::default(),
        })
    }

    fn set_source_volume(&mut self, id: SourceId, volume: f32) -> Result<(), CaptureError> {
        self.with_source(id, |s| s.volume = volume)
    }

    fn set_source_muted(&mut self, id: SourceId, muted: bool) -> Result<(), CaptureError> {
        self.with_source(id, |s| s.muted = muted)
    }

    fn set_source_force_mono(&mut self, id: SourceId, mono: bool) -> Result<(), CaptureError> {
        self.with_source(id, |s| s.force_mono = mono)
    }

    fn set_source_noise_suppression(&mut self, id: SourceId, enabled: bool) -> Result<(), CaptureError> {
        self.with_source(id, |s| s.noise_suppression = enabled)
    }

    fn set_volmeter_enabled(&mut self, enabled: bool) {
        self.shared.lock().volmeter_enabled = enabled;
    }

    fn scene_add(&mut self, id: SourceId) -> Result<(), CaptureError> {
        self.record(format!("scene_add {}", id.0));
        self.shared.lock().scene_adds += 1;
        self.with_source(id, |s| s.transform = Some(SceneTransform::default()))
    }

    fn scene_remove(&mut self, id: SourceId) -> Result<(), CaptureError> {
        self.record(format!("scene_remove {}", id.0));
        self.with_source(id, |s| s.transform = None)
    }

    fn set_scene_transform(&mut self, id: SourceId, transform: &SceneTransform) -> Result<(), CaptureError> {
        if self.shared.lock().fail_transform {
            return Err(CaptureError::Engine("transform rejected".into()));
        }
        self.with_source(id, |s| s.transform = Some(*transform))
    }

    fn video_encoders(&self) -> Vec<String> {
        self.shared.lock().encoders.clone()
    }

    fn set_video_encoder(&mut self, kind: &str, _settings: &Settings) -> Result<(), CaptureError> {
        self.record(format!("set_video_encoder {}", kind));
        self.shared.lock().video_encoder = Some(kind.to_string());
        Ok(())
    }

    fn start_buffer(&mut self, _buffer: &BufferConfig) -> Result<(), CaptureError> {
        self.record("start_buffer".into());
        self.shared.lock().output = MockOutput::Buffering;
        Ok(())
    }

    fn convert_buffer(&mut self, offset_secs: u32, target: &OutputTarget) -> Result<(PathBuf, u32), CaptureError> {
        self.record(format!("convert_buffer {}", offset_secs));
        let path = target.with_extension("mkv");
        let applied = {
            let mut state = self.shared.lock();
            let applied = state.buffered_secs.map_or(offset_secs, |held| offset_secs.min(held));
            state.last_offset = Some(applied);
            state.output = MockOutput::Recording(path.clone());
            applied
        };
        self.emit_output(output_ids::STARTING);
        self.emit_output(output_ids::START);
        Ok((path, applied))
    }

    fn start_recording(&mut self, target: &OutputTarget) -> Result<PathBuf, CaptureError> {
        self.record("start_recording".into());
        let path = target.with_extension("mkv");
        self.shared.lock().output = MockOutput::Recording(path.clone());
        self.emit_output(output_ids::STARTING);
        self.emit_output(output_ids::START);
        Ok(path)
    }

    fn output_active(&self) -> bool {
        let state = self.shared.lock();
        state.output != MockOutput::Idle && !state.output_dead
    }

    fn stop_output(&mut self) -> Result<(), CaptureError> {
        self.record("stop_output".into());
        let was_recording = {
            let mut state = self.shared.lock();
            let previous = std::mem::replace(&mut state.output, MockOutput::Idle);
            matches!(previous, MockOutput::Recording(_))
        };
        self.emit_output(output_ids::STOPPING);
        if was_recording {
            self.emit_output(output_ids::SAVED);
        }
        self.emit_output(output_ids::STOP);
        Ok(())
    }

    fn force_stop_output(&mut self) {
        self.record("force_stop_output".into());
        let mut state = self.shared.lock();
        state.output = MockOutput::Idle;
        state.output_dead = false;
    }

    fn preview_create(&mut self, surface: SurfaceHandle) -> Result<(), CaptureError> {
        self.record(format!("preview_create {}", surface.0));
        self.shared.lock().preview = Some(surface);
        Ok(())
    }

    fn preview_configure(&mut self, rect: &PreviewRect) -> Result<(), CaptureError> {
        self.shared.lock().preview_rect = Some(*rect);
        Ok(())
    }

    fn preview_set_visible(&mut self, visible: bool) -> Result<(), CaptureError> {
        self.shared.lock().preview_visible = visible;
        Ok(())
    }

    fn preview_destroy(&mut self) {
        self.record("preview_destroy".into());
        let mut state = self.shared.lock();
        state.preview = None;
        state.preview_rect = None;
        state.preview_visible = false;
    }
}

static SESSION_TEST_LOCK: Mutex<()> = parking_lot::const_mutex(());

/// Serializes tests that bring up a full session (one live session per process).
pub fn session_test_guard() -> MutexGuard<'static, ()> {
    SESSION_TEST_LOCK.lock()
}

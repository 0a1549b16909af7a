use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use parking_lot::RwLock;

use crate::logging;
use crate::models::audio::{AudioSettings, SourceAudio};
use crate::models::config::{EngineConfig, InitOptions, VideoContext};
use crate::models::error::CaptureError;
use crate::models::preview::{PreviewInfo, PreviewRect, SurfaceHandle};
use crate::models::properties::Property;
use crate::models::settings::Settings;
use crate::models::source::{SceneTransform, SourceInfo, SourcePosition};
use crate::models::state::{RecordingMode, SessionState};
use crate::session::audio::AudioSubsystem;
use crate::session::preview::PreviewManager;
use crate::session::recording::RecordingController;
use crate::session::registry::SourceRegistry;
use crate::session::signal_bus::SignalBus;
use crate::traits::engine::Engine;
use crate::traits::signal_handler::SignalHandler;

/// Set while a session is initialized anywhere in the process.
static LIVE_SESSION: AtomicBool = AtomicBool::new(false);

/// Errors collected by a shutdown that kept going past them.
#[derive(Debug, Default)]
pub struct ShutdownReport {
    pub errors: Vec<CaptureError>,
}

impl ShutdownReport {
    pub fn is_clean(&self) -> bool {
        self.errors.is_empty()
    }
}

struct Components {
    registry: SourceRegistry,
    audio: AudioSubsystem,
    recording: RecordingController,
    preview: PreviewManager,
    bus: SignalBus,
}

struct Inner<E> {
    state: SessionState,
    engine: E,
    components: Option<Components>,
}

/// The one control-plane entry point for an engine.
///
/// Mutating calls take the session write lock and are applied one at a
/// time; queries share a read lock and see a consistent snapshot. Only one
/// session may be initialized per process.
///
/// ```text
///            ┌──────────────── EngineSession ────────────────┐
/// caller ──→ │ registry · audio · recording · preview        │ ──→ Engine
///            └───────────────────────────────────────────────┘      │
/// handler ←── [signal-dispatch] ←── SignalBus ←── EventSink ←───────┘
/// ```
///
/// Dropping a ready session shuts it down.
pub struct EngineSession<E: Engine> {
    inner: RwLock<Inner<E>>,
}

impl<E: Engine> EngineSession<E> {
    pub fn new(engine: E) -> Self {
        Self {
            inner: RwLock::new(Inner {
                state: SessionState::Uninitialized,
                engine,
                components: None,
            }),
        }
    }

    pub fn state(&self) -> SessionState {
        self.inner.read().state
    }

    pub fn is_ready(&self) -> bool {
        self.state().is_ready()
    }

    fn with_ready<R>(
        &self,
        f: impl FnOnce(&E, &Components) -> Result<R, CaptureError>,
    ) -> Result<R, CaptureError> {
        let guard = self.inner.read();
        if !guard.state.is_ready() {
            return Err(CaptureError::NotInitialized);
        }
        let components = guard.components.as_ref().ok_or(CaptureError::NotInitialized)?;
        f(&guard.engine, components)
    }

    fn with_ready_mut<R>(
        &self,
        f: impl FnOnce(&mut E, &mut Components) -> Result<R, CaptureError>,
    ) -> Result<R, CaptureError> {
        let mut guard = self.inner.write();
        let inner = &mut *guard;
        if !inner.state.is_ready() {
            return Err(CaptureError::NotInitialized);
        }
        let components = inner.components.as_mut().ok_or(CaptureError::NotInitialized)?;
        f(&mut inner.engine, components)
    }

    // --- Lifecycle ---

    /// Start the engine and begin delivering signals to `handler`.
    ///
    /// Allowed from Uninitialized or Shutdown. Fails with `AlreadyInitialized`
    /// if this or any other session in the process is live.
    pub fn init(
        &self,
        config: &EngineConfig,
        options: &InitOptions,
        handler: Arc<dyn SignalHandler>,
    ) -> Result<(), CaptureError> {
        let mut guard = self.inner.write();
        if !guard.state.can_init() {
            return Err(CaptureError::AlreadyInitialized);
        }
        config.validate().map_err(CaptureError::ConfigurationFailed)?;
        options.validate().map_err(CaptureError::ConfigurationFailed)?;
        if LIVE_SESSION
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            return Err(CaptureError::AlreadyInitialized);
        }

        guard.state = SessionState::Initializing;
        match Self::bring_up(&mut guard.engine, config, options, handler) {
            Ok(components) => {
                guard.components = Some(components);
                guard.state = SessionState::Ready;
                log::info!(
                    "Engine initialized: {}x{} @ {} fps, recordings in {}",
                    options.video.width,
                    options.video.height,
                    options.video.fps,
                    config.recording_path.display()
                );
                Ok(())
            }
            Err(e) => {
                guard.state = SessionState::Uninitialized;
                LIVE_SESSION.store(false, Ordering::Release);
                log::error!("Engine init failed: {}", e);
                Err(e)
            }
        }
    }

    fn bring_up(
        engine: &mut E,
        config: &EngineConfig,
        options: &InitOptions,
        handler: Arc<dyn SignalHandler>,
    ) -> Result<Components, CaptureError> {
        if options.install_logger {
            if let Err(e) = logging::init_file_logger(&config.log_path) {
                log::warn!("File logging unavailable: {}", e);
            }
        }

        let bus = SignalBus::start(handler)?;
        engine.startup(config, &options.video, bus.sink())?;

        let mut recording = RecordingController::new(config.recording_path.clone(), options);
        if let Err(e) = recording.bind_default_encoder(engine, options.default_video_encoder.as_deref()) {
            if let Err(shutdown_err) = engine.shutdown() {
                log::error!("Engine shutdown after failed init: {}", shutdown_err);
            }
            return Err(e);
        }

        Ok(Components {
            registry: SourceRegistry::new(),
            audio: AudioSubsystem::new(),
            recording,
            preview: PreviewManager::new(),
            bus,
        })
    }

    /// Tear everything down, continuing past individual failures.
    ///
    /// Order: stop the output, release sources, destroy the preview, shut
    /// the engine down, then drain and close the signal bus. A no-op unless
    /// the session is ready.
    pub fn shutdown(&self) -> ShutdownReport {
        let mut report = ShutdownReport::default();
        let bus = {
            let mut guard = self.inner.write();
            if !guard.state.is_ready() {
                log::debug!("Shutdown requested while {:?}", guard.state);
                return report;
            }
            guard.state = SessionState::ShuttingDown;
            log::info!("Engine shutting down");

            let inner = &mut *guard;
            let Some(mut c) = inner.components.take() else {
                inner.state = SessionState::Shutdown;
                LIVE_SESSION.store(false, Ordering::Release);
                return report;
            };
            let engine = &mut inner.engine;

            report.errors.extend(c.recording.stop_for_shutdown(engine));
            report.errors.extend(c.registry.release_all(engine));
            c.preview.disable(engine);
            if let Err(e) = engine.shutdown() {
                log::error!("Engine shutdown failed: {}", e);
                report.errors.push(e);
            }
            c.bus
        };

        // Closed without the lock held: a handler blocked on the session
        // must be able to finish before the dispatcher is joined.
        let mut bus = bus;
        bus.close();

        self.inner.write().state = SessionState::Shutdown;
        LIVE_SESSION.store(false, Ordering::Release);
        log::info!("Engine shut down ({} errors)", report.errors.len());
        report
    }

    // --- Recording ---

    /// Enable or disable the pre-roll buffer. Only while no output runs.
    pub fn set_buffering(&self, enabled: bool) -> Result<(), CaptureError> {
        self.with_ready_mut(|_, c| c.recording.set_buffering(enabled))
    }

    pub fn start_buffer(&self) -> Result<(), CaptureError> {
        self.with_ready_mut(|engine, c| c.recording.start_buffer(engine))
    }

    /// Start recording `offset_secs` in the past; returns the offset applied.
    pub fn start_recording(&self, offset_secs: u32) -> Result<u32, CaptureError> {
        self.with_ready_mut(|engine, c| c.recording.start_recording(engine, offset_secs))
    }

    pub fn stop_recording(&self) -> Result<(), CaptureError> {
        self.with_ready_mut(|engine, c| c.recording.stop_recording(engine))
    }

    pub fn force_stop_recording(&self) -> Result<(), CaptureError> {
        self.with_ready_mut(|engine, c| {
            c.recording.force_stop(engine);
            Ok(())
        })
    }

    /// Path of the last recording that stopped cleanly.
    pub fn last_recording(&self) -> Result<Option<PathBuf>, CaptureError> {
        self.with_ready(|_, c| Ok(c.recording.last_recording().map(Path::to_path_buf)))
    }

    pub fn set_recording_dir(&self, dir: &Path) -> Result<(), CaptureError> {
        self.with_ready_mut(|_, c| c.recording.set_recording_dir(dir))
    }

    pub fn recording_dir(&self) -> Result<PathBuf, CaptureError> {
        self.with_ready(|_, c| Ok(c.recording.recording_dir().to_path_buf()))
    }

    pub fn recording_mode(&self) -> Result<RecordingMode, CaptureError> {
        self.with_ready(|_, c| Ok(c.recording.mode()))
    }

    /// Signals dropped by volmeter backpressure so far.
    pub fn dropped_signals(&self) -> Result<u64, CaptureError> {
        self.with_ready(|_, c| Ok(c.bus.dropped_count()))
    }

    // --- Video ---

    pub fn reset_video_context(&self, fps: u32, width: u32, height: u32) -> Result<(), CaptureError> {
        self.with_ready_mut(|engine, c| c.recording.reset_video(engine, VideoContext::new(fps, width, height)))
    }

    pub fn video_context(&self) -> Result<VideoContext, CaptureError> {
        self.with_ready(|_, c| Ok(c.recording.video()))
    }

    pub fn list_video_encoders(&self) -> Result<Vec<String>, CaptureError> {
        self.with_ready(|engine, _| Ok(engine.video_encoders()))
    }

    pub fn video_encoder(&self) -> Result<Option<String>, CaptureError> {
        self.with_ready(|_, c| Ok(c.recording.video_encoder().map(str::to_string)))
    }

    pub fn set_video_encoder(&self, kind: &str, settings: &Settings) -> Result<(), CaptureError> {
        self.with_ready_mut(|engine, c| c.recording.set_video_encoder(engine, kind, settings))
    }

    // --- Sources ---

    /// Create a source; returns the name it was registered under.
    pub fn create_source(&self, name: &str, kind: &str) -> Result<String, CaptureError> {
        self.with_ready_mut(|engine, c| {
            let name = c.registry.create(engine, name, kind)?;
            let entry = c.registry.entry(&name)?.clone();
            if let Err(e) = c.audio.configure_source(engine, &entry) {
                log::error!("Audio setup for '{}' failed, releasing it: {}", name, e);
                if let Err(release_err) = c.registry.delete(engine, &name) {
                    log::error!("Release of '{}' failed: {}", name, release_err);
                }
                return Err(e);
            }
            Ok(name)
        })
    }

    pub fn delete_source(&self, name: &str) -> Result<(), CaptureError> {
        self.with_ready_mut(|engine, c| c.registry.delete(engine, name))
    }

    pub fn source_settings(&self, name: &str) -> Result<Settings, CaptureError> {
        self.with_ready(|engine, c| c.registry.settings(engine, name))
    }

    /// Replace a source's settings; the audio toggles are re-applied.
    pub fn set_source_settings(&self, name: &str, settings: &Settings) -> Result<(), CaptureError> {
        self.with_ready_mut(|engine, c| {
            c.registry.set_settings(engine, name, settings)?;
            let entry = c.registry.entry(name)?.clone();
            c.audio.configure_source(engine, &entry)
        })
    }

    pub fn source_properties(&self, name: &str) -> Result<Vec<Property>, CaptureError> {
        self.with_ready(|engine, c| c.registry.properties(engine, name))
    }

    pub fn list_sources(&self) -> Result<Vec<SourceInfo>, CaptureError> {
        self.with_ready(|_, c| Ok(c.registry.infos()))
    }

    // --- Scene ---

    pub fn add_source_to_scene(&self, name: &str) -> Result<(), CaptureError> {
        self.with_ready_mut(|engine, c| c.registry.add_to_scene(engine, name))
    }

    pub fn remove_source_from_scene(&self, name: &str) -> Result<(), CaptureError> {
        self.with_ready_mut(|engine, c| c.registry.remove_from_scene(engine, name))
    }

    pub fn source_pos(&self, name: &str) -> Result<SourcePosition, CaptureError> {
        self.with_ready(|engine, c| c.registry.position(engine, name))
    }

    pub fn set_source_pos(&self, name: &str, transform: SceneTransform) -> Result<(), CaptureError> {
        self.with_ready_mut(|engine, c| c.registry.set_position(engine, name, transform))
    }

    // --- Audio ---

    pub fn set_source_volume(&self, name: &str, volume: f32) -> Result<(), CaptureError> {
        self.with_ready_mut(|engine, c| c.audio.set_volume(engine, &mut c.registry, name, volume))
    }

    pub fn set_source_muted(&self, name: &str, muted: bool) -> Result<(), CaptureError> {
        self.with_ready_mut(|engine, c| c.audio.set_muted(engine, &mut c.registry, name, muted))
    }

    pub fn source_audio(&self, name: &str) -> Result<SourceAudio, CaptureError> {
        self.with_ready(|_, c| Ok(c.registry.entry(name)?.audio))
    }

    pub fn set_mute_audio_inputs(&self, muted: bool) -> Result<(), CaptureError> {
        self.with_ready_mut(|engine, c| c.audio.set_mute_inputs(engine, &c.registry, muted))
    }

    pub fn set_force_mono(&self, enabled: bool) -> Result<(), CaptureError> {
        self.with_ready_mut(|_, c| {
            c.audio.set_force_mono(enabled);
            Ok(())
        })
    }

    pub fn set_audio_suppression(&self, enabled: bool) -> Result<(), CaptureError> {
        self.with_ready_mut(|_, c| {
            c.audio.set_noise_suppression(enabled);
            Ok(())
        })
    }

    pub fn set_volmeter_enabled(&self, enabled: bool) -> Result<(), CaptureError> {
        self.with_ready_mut(|engine, c| {
            c.audio.set_volmeter_enabled(engine, enabled);
            Ok(())
        })
    }

    pub fn audio_settings(&self) -> Result<AudioSettings, CaptureError> {
        self.with_ready(|_, c| Ok(c.audio.settings()))
    }

    // --- Preview ---

    pub fn init_preview(&self, surface: SurfaceHandle) -> Result<(), CaptureError> {
        self.with_ready_mut(|engine, c| c.preview.init(engine, surface))
    }

    pub fn configure_preview(&self, x: i32, y: i32, width: u32, height: u32) -> Result<(), CaptureError> {
        self.with_ready_mut(|engine, c| c.preview.configure(engine, PreviewRect::new(x, y, width, height)))
    }

    pub fn show_preview(&self) -> Result<(), CaptureError> {
        self.with_ready_mut(|engine, c| c.preview.show(engine))
    }

    pub fn hide_preview(&self) -> Result<(), CaptureError> {
        self.with_ready_mut(|engine, c| c.preview.hide(engine))
    }

    pub fn disable_preview(&self) -> Result<(), CaptureError> {
        self.with_ready_mut(|engine, c| {
            c.preview.disable(engine);
            Ok(())
        })
    }

    pub fn preview_info(&self) -> Result<PreviewInfo, CaptureError> {
        self.with_ready(|_, c| Ok(c.preview.info(&c.recording.video())))
    }
}

impl<E: Engine> Drop for EngineSession<E> {
    fn drop(&mut self) {
        if self.state().is_ready() {
            let report = self.shutdown();
            if !report.is_clean() {
                log::warn!("Session dropped with {} shutdown errors", report.errors.len());
            }
        }
    }
}

use std::path::PathBuf;

use crate::models::config::{BufferConfig, EngineConfig, VideoContext};
use crate::models::error::CaptureError;
use crate::models::preview::{PreviewRect, SurfaceHandle};
use crate::models::properties::Property;
use crate::models::settings::Settings;
use crate::models::source::{SceneTransform, SourceCategory, SourceDimensions, SourceId};
use crate::session::signal_bus::EventSink;
use crate::storage::naming::OutputTarget;

/// The native capture-and-encode engine driven by the control plane.
///
/// The session owns exactly one engine and serializes every `&mut self`
/// call. `&self` queries may run concurrently with each other.
///
/// Signals (output lifecycle, volmeter samples, source errors) are pushed
/// through the [`EventSink`] handed over in `startup`; emitting never blocks.
pub trait Engine: Send + Sync {
    /// Bring the engine up with the given asset paths and initial geometry.
    fn startup(
        &mut self,
        config: &EngineConfig,
        video: &VideoContext,
        events: EventSink,
    ) -> Result<(), CaptureError>;

    /// Release every native resource. Called once, after all sources are released.
    fn shutdown(&mut self) -> Result<(), CaptureError>;

    /// Apply new output geometry. Only called while no output is active.
    fn reset_video(&mut self, video: &VideoContext) -> Result<(), CaptureError>;

    // --- Sources ---

    /// Category of a backend type, or None when the type is unknown.
    fn source_category(&self, kind: &str) -> Option<SourceCategory>;

    fn create_source(&mut self, name: &str, kind: &str) -> Result<SourceId, CaptureError>;

    fn release_source(&mut self, id: SourceId) -> Result<(), CaptureError>;

    fn source_settings(&self, id: SourceId) -> Result<Settings, CaptureError>;

    /// Replace the settings document of a source.
    fn update_source(&mut self, id: SourceId, settings: &Settings) -> Result<(), CaptureError>;

    /// Current property schema; may depend on the current settings.
    fn source_properties(&self, id: SourceId) -> Result<Vec<Property>, CaptureError>;

    fn source_dimensions(&self, id: SourceId) -> Result<SourceDimensions, CaptureError>;

    // --- Audio ---

    fn set_source_volume(&mut self, id: SourceId, volume: f32) -> Result<(), CaptureError>;

    fn set_source_muted(&mut self, id: SourceId, muted: bool) -> Result<(), CaptureError>;

    fn set_source_force_mono(&mut self, id: SourceId, mono: bool) -> Result<(), CaptureError>;

    fn set_source_noise_suppression(&mut self, id: SourceId, enabled: bool) -> Result<(), CaptureError>;

    fn set_volmeter_enabled(&mut self, enabled: bool);

    // --- Scene ---

    fn scene_add(&mut self, id: SourceId) -> Result<(), CaptureError>;

    fn scene_remove(&mut self, id: SourceId) -> Result<(), CaptureError>;

    fn set_scene_transform(&mut self, id: SourceId, transform: &SceneTransform) -> Result<(), CaptureError>;

    // --- Encoders ---

    fn video_encoders(&self) -> Vec<String>;

    fn set_video_encoder(&mut self, kind: &str, settings: &Settings) -> Result<(), CaptureError>;

    // --- Outputs ---

    /// Start encoding into the in-memory pre-roll buffer.
    fn start_buffer(&mut self, buffer: &BufferConfig) -> Result<(), CaptureError>;

    /// Turn the running buffer into a file, starting up to `offset_secs` in the past.
    ///
    /// Returns the resolved output path and the offset actually applied,
    /// which is shorter when the buffer holds less than requested.
    fn convert_buffer(&mut self, offset_secs: u32, target: &OutputTarget) -> Result<(PathBuf, u32), CaptureError>;

    /// Start recording straight to a file. Returns the resolved output path.
    fn start_recording(&mut self, target: &OutputTarget) -> Result<PathBuf, CaptureError>;

    /// Whether the output is still running (it may die on its own).
    fn output_active(&self) -> bool;

    /// Ask the output to finalize. Completion is reported by a `stop` signal.
    fn stop_output(&mut self) -> Result<(), CaptureError>;

    /// Tear the output down immediately, whatever state it is in.
    fn force_stop_output(&mut self);

    // --- Preview ---

    fn preview_create(&mut self, surface: SurfaceHandle) -> Result<(), CaptureError>;

    fn preview_configure(&mut self, rect: &PreviewRect) -> Result<(), CaptureError>;

    fn preview_set_visible(&mut self, visible: bool) -> Result<(), CaptureError>;

    fn preview_destroy(&mut self);
}


//! # capture-control-core
//!
//! Engine-agnostic control plane for a screen and audio recorder.
//!
//! Owns the session lifecycle, the source and scene registry, audio
//! routing, the buffered recording state machine, the preview surface and
//! ordered signal delivery. An engine backend implements the `Engine`
//! trait and plugs into the generic `EngineSession`.
//!
//! ## Architecture
//!
//! ```text
//! capture-control-core (this crate)
//! ├── traits/       ← Engine, SignalHandler
//! ├── models/       ← CaptureError, SessionState, RecordingMode, Settings, Property, Signal, etc.
//! ├── processing/   ← RingBuffer, loudness helpers
//! ├── session/      ← EngineSession, SourceRegistry, AudioSubsystem, RecordingController,
//! │                   PreviewManager, SignalBus
//! ├── storage/      ← output naming, metadata sidecars
//! └── logging       ← daily log file
//! ```

pub mod logging;
pub mod models;
pub mod processing;
pub mod session;
pub mod storage;
pub mod traits;

// Re-export key types at crate root for convenience.
pub use models::audio::{AudioSettings, SourceAudio};
pub use models::config::{BufferConfig, EngineConfig, InitOptions, VideoContext, AUDIO_SAMPLE_RATE};
pub use models::error::{CaptureError, ErrorKind, NOT_INITIALIZED_MESSAGE};
pub use models::preview::{PreviewInfo, PreviewRect, SurfaceHandle};
pub use models::properties::{Property, PropertyKind};
pub use models::recording_result::{RecordingMetadata, RecordingResult};
pub use models::settings::{SettingValue, Settings};
pub use models::signal::{Signal, SignalCategory};
pub use models::source::{SceneTransform, SourceCategory, SourceDimensions, SourceId, SourceInfo, SourcePosition};
pub use models::state::{RecordingMode, SessionState};
pub use processing::ring_buffer::RingBuffer;
pub use session::engine_session::{EngineSession, ShutdownReport};
pub use session::signal_bus::{EventSink, SignalBus};
pub use storage::naming::OutputTarget;
pub use traits::engine::Engine;
pub use traits::signal_handler::SignalHandler;

//! # capture-control-software
//!
//! In-process software engine for `capture-control-core`.
//!
//! Implements the `Engine` trait without a native capture library: audio
//! sources are synthesized, the scene's audio is mixed into 16-bit PCM,
//! and recordings are written as WAV files with a metadata sidecar. The
//! capture inventory (monitors, windows, audio devices) is simulated so
//! property schemas behave like a real backend's.
//!
//! ## Architecture
//!
//! ```text
//! capture-control-software (this crate)
//! ├── engine        ← SoftwareEngine (Engine impl, tick thread)
//! ├── sources       ← backend kinds, default settings, properties, inventory
//! ├── encoders      ← video encoder list and settings validation
//! ├── processing/   ← mixer math, tone generator
//! └── output/       ← output state machine, WAV writer, header layout
//! ```

pub mod encoders;
pub mod engine;
pub mod output;
pub mod processing;
pub mod sources;

pub use engine::SoftwareEngine;
pub use sources::{Inventory, SourceKind};

pub mod audio;
pub mod config;
pub mod error;
pub mod preview;
pub mod properties;
pub mod recording_result;
pub mod settings;
pub mod signal;
pub mod source;
pub mod state;

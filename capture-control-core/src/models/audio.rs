use serde::{Deserialize, Serialize};

/// Per-source audio state as set by the caller.
///
/// `muted` is the source's own mute flag. The global input mute overrides
/// it on the engine side without changing it here.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SourceAudio {
    pub volume: f32,
    pub muted: bool,
}

impl Default for SourceAudio {
    fn default() -> Self {
        Self {
            volume: 1.0,
            muted: false,
        }
    }
}

/// Global audio pipeline toggles.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AudioSettings {
    pub all_inputs_muted: bool,
    pub force_mono: bool,
    pub noise_suppression: bool,
    pub volmeter_enabled: bool,
}

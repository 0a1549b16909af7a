use serde::{Deserialize, Serialize};

/// Engine session lifecycle.
///
/// State transitions:
/// ```text
/// uninitialized → initializing → ready → shutting_down → shutdown
///        ↑______________↓ (init failed)                     │
///        └──────────────── init again ──────────────────────┘
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionState {
    Uninitialized,
    Initializing,
    Ready,
    ShuttingDown,
    Shutdown,
}

impl SessionState {
    pub fn is_ready(&self) -> bool {
        matches!(self, Self::Ready)
    }

    /// Whether `init` may be called from this state.
    pub fn can_init(&self) -> bool {
        matches!(self, Self::Uninitialized | Self::Shutdown)
    }
}

impl Default for SessionState {
    fn default() -> Self {
        Self::Uninitialized
    }
}

/// Recording controller state machine.
///
/// ```text
/// idle → buffering → recording → idle
/// idle ─────────────→ recording → idle   (unbuffered)
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RecordingMode {
    Idle,
    Buffering,
    Recording,
}

impl RecordingMode {
    pub fn is_idle(&self) -> bool {
        matches!(self, Self::Idle)
    }

    /// Whether the engine output is running in this mode.
    pub fn is_active(&self) -> bool {
        !self.is_idle()
    }
}

impl Default for RecordingMode {
    fn default() -> Self {
        Self::Idle
    }
}

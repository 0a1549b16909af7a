use serde::{Deserialize, Serialize};

/// Output signal ids emitted over a recording lifecycle.
pub mod output_ids {
    pub const STARTING: &str = "starting";
    pub const START: &str = "start";
    pub const STOPPING: &str = "stopping";
    pub const SAVED: &str = "saved";
    pub const STOP: &str = "stop";
}

/// Engine-defined signal codes. Zero is success.
pub mod codes {
    pub const SUCCESS: i64 = 0;
    pub const BAD_PATH: i64 = -1;
    pub const CONNECT_FAILED: i64 = -2;
    pub const INVALID_STREAM: i64 = -3;
    pub const ERROR: i64 = -4;
    pub const DISCONNECTED: i64 = -5;
    pub const UNSUPPORTED: i64 = -6;
    pub const NO_SPACE: i64 = -7;
    pub const ENCODE_ERROR: i64 = -8;

    /// Human-readable description of a code.
    pub fn describe(code: i64) -> &'static str {
        match code {
            SUCCESS => "success",
            BAD_PATH => "output path is invalid",
            CONNECT_FAILED => "failed to connect",
            INVALID_STREAM => "invalid stream",
            ERROR => "engine error",
            DISCONNECTED => "disconnected",
            UNSUPPORTED => "unsupported format or settings",
            NO_SPACE => "no space left on device",
            ENCODE_ERROR => "encoder error",
            _ => "unknown error",
        }
    }
}

/// Which part of the engine a signal comes from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SignalCategory {
    Output,
    Source,
    Volmeter,
}

/// Asynchronous notification from the engine.
///
/// For `Volmeter` signals `id` is the source name and `value` the
/// normalized loudness (0.0–1.0).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Signal {
    #[serde(rename = "type")]
    pub category: SignalCategory,
    pub id: String,
    pub code: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value: Option<f64>,
}

impl Signal {
    pub fn output(id: &str, code: i64) -> Self {
        Self {
            category: SignalCategory::Output,
            id: id.to_string(),
            code,
            value: None,
        }
    }

    pub fn source(name: &str, code: i64) -> Self {
        Self {
            category: SignalCategory::Source,
            id: name.to_string(),
            code,
            value: None,
        }
    }

    pub fn volmeter(name: &str, level: f64) -> Self {
        Self {
            category: SignalCategory::Volmeter,
            id: name.to_string(),
            code: codes::SUCCESS,
            value: Some(level),
        }
    }

    pub fn is_success(&self) -> bool {
        self.code == codes::SUCCESS
    }

    /// Volmeter samples may be dropped under backpressure; nothing else may.
    pub fn is_lossy(&self) -> bool {
        self.category == SignalCategory::Volmeter
    }
}

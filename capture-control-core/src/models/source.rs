use serde::{Deserialize, Serialize};

/// Engine-side handle of a created source.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SourceId(pub u64);

/// What a source backend produces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceCategory {
    /// Monitor, window or game capture.
    Video,
    /// Microphone or line-in.
    AudioInput,
    /// Desktop or per-process audio.
    AudioOutput,
}

impl SourceCategory {
    pub fn has_audio(&self) -> bool {
        matches!(self, Self::AudioInput | Self::AudioOutput)
    }
}

/// Summary of a registered source.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SourceInfo {
    pub name: String,
    pub kind: String,
    pub category: SourceCategory,
    pub in_scene: bool,
}

/// Position and scale of a source in the scene.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SceneTransform {
    pub x: f32,
    pub y: f32,
    pub scale_x: f32,
    pub scale_y: f32,
}

impl SceneTransform {
    pub fn validate(&self) -> Result<(), String> {
        if !(self.x.is_finite() && self.y.is_finite()) {
            return Err("position must be finite".into());
        }
        if !(self.scale_x.is_finite() && self.scale_y.is_finite()) {
            return Err("scale must be finite".into());
        }
        Ok(())
    }
}

impl Default for SceneTransform {
    fn default() -> Self {
        Self {
            x: 0.0,
            y: 0.0,
            scale_x: 1.0,
            scale_y: 1.0,
        }
    }
}

/// Natural size of a source in pixels, before scaling.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceDimensions {
    pub width: u32,
    pub height: u32,
}

/// Scene transform of a source together with its natural size.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SourcePosition {
    pub x: f32,
    pub y: f32,
    pub scale_x: f32,
    pub scale_y: f32,
    pub width: u32,
    pub height: u32,
}

impl SourcePosition {
    pub fn new(transform: SceneTransform, dimensions: SourceDimensions) -> Self {
        Self {
            x: transform.x,
            y: transform.y,
            scale_x: transform.scale_x,
            scale_y: transform.scale_y,
            width: dimensions.width,
            height: dimensions.height,
        }
    }

    pub fn transform(&self) -> SceneTransform {
        SceneTransform {
            x: self.x,
            y: self.y,
            scale_x: self.scale_x,
            scale_y: self.scale_y,
        }
    }

    pub fn dimensions(&self) -> SourceDimensions {
        SourceDimensions {
            width: self.width,
            height: self.height,
        }
    }
}

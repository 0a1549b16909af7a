use serde::{Deserialize, Serialize};

/// Opaque native drawable handle (e.g. a window handle) the preview renders into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SurfaceHandle(pub u64);

/// Preview placement inside the host surface, in pixels.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PreviewRect {
    pub x: i32,
    pub y: i32,
    pub width: u32,
    pub height: u32,
}

impl PreviewRect {
    pub fn new(x: i32, y: i32, width: u32, height: u32) -> Self {
        Self { x, y, width, height }
    }
}

/// Canvas (scene) and preview (window) sizes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PreviewInfo {
    pub canvas_width: u32,
    pub canvas_height: u32,
    pub preview_width: u32,
    pub preview_height: u32,
}

impl PreviewInfo {
    /// Factor that maps canvas pixels onto preview pixels, preserving aspect.
    ///
    /// Zero when no preview geometry has been configured.
    pub fn scale_factor(&self) -> f64 {
        if self.canvas_width == 0 || self.canvas_height == 0 {
            return 0.0;
        }
        let sx = self.preview_width as f64 / self.canvas_width as f64;
        let sy = self.preview_height as f64 / self.canvas_height as f64;
        sx.min(sy)
    }
}

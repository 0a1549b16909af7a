use crate::models::config::VideoContext;
use crate::models::error::CaptureError;
use crate::models::preview::{PreviewInfo, PreviewRect, SurfaceHandle};
use crate::traits::engine::Engine;

/// Live preview of the composed scene inside a host-provided surface.
///
/// `init` binds a surface, `configure` places the preview inside it, and
/// `show`/`hide` toggle visibility while keeping the geometry. `disable`
/// destroys the preview; it must be initialized again before reuse.
#[derive(Debug, Default)]
pub struct PreviewManager {
    surface: Option<SurfaceHandle>,
    rect: Option<PreviewRect>,
    visible: bool,
}

impl PreviewManager {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_initialized(&self) -> bool {
        self.surface.is_some()
    }

    pub fn is_visible(&self) -> bool {
        self.visible
    }

    fn require_surface(&self) -> Result<(), CaptureError> {
        if self.surface.is_none() {
            return Err(CaptureError::InvalidState("preview not initialized".into()));
        }
        Ok(())
    }

    /// Bind the preview to `surface`. Rebinding to another surface recreates it.
    pub fn init<E: Engine>(&mut self, engine: &mut E, surface: SurfaceHandle) -> Result<(), CaptureError> {
        match self.surface {
            Some(current) if current == surface => {
                log::debug!("Preview already bound to surface {:#x}", surface.0);
                return Ok(());
            }
            Some(_) => self.disable(engine),
            None => {}
        }
        engine.preview_create(surface)?;
        self.surface = Some(surface);
        log::info!("Preview created on surface {:#x}", surface.0);
        Ok(())
    }

    pub fn configure<E: Engine>(&mut self, engine: &mut E, rect: PreviewRect) -> Result<(), CaptureError> {
        self.require_surface()?;
        if rect.width == 0 || rect.height == 0 {
            return Err(CaptureError::InvalidArgument(format!(
                "preview size must be non-zero, got {}x{}",
                rect.width, rect.height
            )));
        }
        engine.preview_configure(&rect)?;
        self.rect = Some(rect);
        Ok(())
    }

    pub fn show<E: Engine>(&mut self, engine: &mut E) -> Result<(), CaptureError> {
        self.require_surface()?;
        if self.rect.is_none() {
            return Err(CaptureError::InvalidState("preview geometry not configured".into()));
        }
        engine.preview_set_visible(true)?;
        self.visible = true;
        Ok(())
    }

    pub fn hide<E: Engine>(&mut self, engine: &mut E) -> Result<(), CaptureError> {
        self.require_surface()?;
        engine.preview_set_visible(false)?;
        self.visible = false;
        Ok(())
    }

    /// Destroy the preview. No-op when none exists.
    pub fn disable<E: Engine>(&mut self, engine: &mut E) {
        if self.surface.take().is_none() {
            return;
        }
        engine.preview_destroy();
        self.rect = None;
        self.visible = false;
        log::info!("Preview destroyed");
    }

    pub fn info(&self, video: &VideoContext) -> PreviewInfo {
        let rect = self.rect.unwrap_or_default();
        PreviewInfo {
            canvas_width: video.width,
            canvas_height: video.height,
            preview_width: rect.width,
            preview_height: rect.height,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::mock_engine::MockEngine;
    use approx::assert_relative_eq;

    #[test]
    fn operations_require_init() {
        let mut engine = MockEngine::new();
        let mut preview = PreviewManager::new();

        assert!(matches!(
            preview.configure(&mut engine, PreviewRect::new(0, 0, 640, 360)),
            Err(CaptureError::InvalidState(_))
        ));
        assert!(preview.show(&mut engine).is_err());
        assert!(preview.hide(&mut engine).is_err());
        preview.disable(&mut engine);
        assert!(engine.state().calls.is_empty());
    }

    #[test]
    fn hide_keeps_geometry_for_show() {
        let mut engine = MockEngine::new();
        let mut preview = PreviewManager::new();
        preview.init(&mut engine, SurfaceHandle(0x1234)).unwrap();
        preview.configure(&mut engine, PreviewRect::new(10, 10, 960, 540)).unwrap();
        preview.show(&mut engine).unwrap();

        preview.hide(&mut engine).unwrap();
        assert!(!engine.state().preview_visible);
        preview.show(&mut engine).unwrap();

        assert!(preview.is_visible());
        assert_eq!(engine.state().preview_rect, Some(PreviewRect::new(10, 10, 960, 540)));
    }

    #[test]
    fn disable_requires_reinit() {
        let mut engine = MockEngine::new();
        let mut preview = PreviewManager::new();
        preview.init(&mut engine, SurfaceHandle(1)).unwrap();
        preview.configure(&mut engine, PreviewRect::new(0, 0, 640, 360)).unwrap();

        preview.disable(&mut engine);
        assert!(!preview.is_initialized());
        assert!(preview.show(&mut engine).is_err());

        preview.init(&mut engine, SurfaceHandle(1)).unwrap();
        assert!(matches!(preview.show(&mut engine), Err(CaptureError::InvalidState(_))));
    }

    #[test]
    fn rebinding_recreates_preview() {
        let mut engine = MockEngine::new();
        let mut preview = PreviewManager::new();
        preview.init(&mut engine, SurfaceHandle(1)).unwrap();
        preview.init(&mut engine, SurfaceHandle(1)).unwrap();
        preview.init(&mut engine, SurfaceHandle(2)).unwrap();

        let calls = engine.state().calls.clone();
        assert_eq!(calls, vec!["preview_create 1", "preview_destroy", "preview_create 2"]);
        assert_eq!(engine.state().preview, Some(SurfaceHandle(2)));
    }

    #[test]
    fn zero_size_is_rejected() {
        let mut engine = MockEngine::new();
        let mut preview = PreviewManager::new();
        preview.init(&mut engine, SurfaceHandle(1)).unwrap();
        assert!(matches!(
            preview.configure(&mut engine, PreviewRect::new(0, 0, 0, 360)),
            Err(CaptureError::InvalidArgument(_))
        ));
    }

    #[test]
    fn info_reports_canvas_and_preview() {
        let mut engine = MockEngine::new();
        let mut preview = PreviewManager::new();
        let video = VideoContext::new(60, 1920, 1080);
        assert_relative_eq!(preview.info(&video).scale_factor(), 0.0);

        preview.init(&mut engine, SurfaceHandle(1)).unwrap();
        preview.configure(&mut engine, PreviewRect::new(0, 0, 960, 540)).unwrap();
        let info = preview.info(&video);

        assert_eq!((info.canvas_width, info.canvas_height), (1920, 1080));
        assert_eq!((info.preview_width, info.preview_height), (960, 540));
        assert_relative_eq!(info.scale_factor(), 0.5);
    }
}

use std::collections::BTreeMap;

use crate::models::audio::SourceAudio;
use crate::models::error::CaptureError;
use crate::models::properties::Property;
use crate::models::settings::Settings;
use crate::models::source::{
    SceneTransform, SourceCategory, SourceId, SourceInfo, SourcePosition,
};
use crate::traits::engine::Engine;

/// A registered source and its control-plane state.
#[derive(Debug, Clone, PartialEq)]
pub struct SourceEntry {
    pub id: SourceId,
    pub kind: String,
    pub category: SourceCategory,
    pub audio: SourceAudio,
    /// Scene membership; None when the source is not in the scene.
    pub scene: Option<SceneTransform>,
}

impl SourceEntry {
    pub fn is_audio_input(&self) -> bool {
        self.category == SourceCategory::AudioInput
    }
}

/// Named sources and their membership in the active scene.
#[derive(Debug, Default)]
pub struct SourceRegistry {
    sources: BTreeMap<String, SourceEntry>,
}

impl SourceRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// First free name for `requested`: the name itself, then `name (2)`, `name (3)`, ...
    pub fn resolve_name(&self, requested: &str) -> String {
        if !self.sources.contains_key(requested) {
            return requested.to_string();
        }
        (2..)
            .map(|n| format!("{} ({})", requested, n))
            .find(|candidate| !self.sources.contains_key(candidate))
            .unwrap_or_else(|| requested.to_string())
    }

    /// Create a source and return the name it was registered under.
    pub fn create<E: Engine>(&mut self, engine: &mut E, name: &str, kind: &str) -> Result<String, CaptureError> {
        if name.trim().is_empty() {
            return Err(CaptureError::InvalidArgument("source name must not be empty".into()));
        }
        let category = engine
            .source_category(kind)
            .ok_or_else(|| CaptureError::UnknownSourceType(kind.to_string()))?;

        let resolved = self.resolve_name(name);
        if resolved != name {
            log::info!("Source name '{}' taken, using '{}'", name, resolved);
        }

        let id = engine.create_source(&resolved, kind)?;
        self.sources.insert(
            resolved.clone(),
            SourceEntry {
                id,
                kind: kind.to_string(),
                category,
                audio: SourceAudio::default(),
                scene: None,
            },
        );
        log::info!("Created source '{}' ({})", resolved, kind);
        Ok(resolved)
    }

    /// Remove a source from the scene (if present) and release it.
    pub fn delete<E: Engine>(&mut self, engine: &mut E, name: &str) -> Result<(), CaptureError> {
        let entry = self.entry_mut(name)?;
        if entry.scene.is_some() {
            engine.scene_remove(entry.id)?;
            entry.scene = None;
        }
        let id = entry.id;
        engine.release_source(id)?;
        self.sources.remove(name);
        log::info!("Deleted source '{}'", name);
        Ok(())
    }

    pub fn entry(&self, name: &str) -> Result<&SourceEntry, CaptureError> {
        self.sources
            .get(name)
            .ok_or_else(|| CaptureError::UnknownSource(name.to_string()))
    }

    pub fn entry_mut(&mut self, name: &str) -> Result<&mut SourceEntry, CaptureError> {
        self.sources
            .get_mut(name)
            .ok_or_else(|| CaptureError::UnknownSource(name.to_string()))
    }

    pub fn entries(&self) -> impl Iterator<Item = (&str, &SourceEntry)> {
        self.sources.iter().map(|(name, entry)| (name.as_str(), entry))
    }

    pub fn infos(&self) -> Vec<SourceInfo> {
        self.sources
            .iter()
            .map(|(name, entry)| SourceInfo {
                name: name.clone(),
                kind: entry.kind.clone(),
                category: entry.category,
                in_scene: entry.scene.is_some(),
            })
            .collect()
    }

    pub fn len(&self) -> usize {
        self.sources.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sources.is_empty()
    }

    pub fn settings<E: Engine>(&self, engine: &E, name: &str) -> Result<Settings, CaptureError> {
        engine.source_settings(self.entry(name)?.id)
    }

    /// Replace the whole settings document of a source.
    pub fn set_settings<E: Engine>(&self, engine: &mut E, name: &str, settings: &Settings) -> Result<(), CaptureError> {
        engine.update_source(self.entry(name)?.id, settings)
    }

    pub fn properties<E: Engine>(&self, engine: &E, name: &str) -> Result<Vec<Property>, CaptureError> {
        engine.source_properties(self.entry(name)?.id)
    }

    /// Add to the scene with an identity transform. Adding twice is a no-op.
    pub fn add_to_scene<E: Engine>(&mut self, engine: &mut E, name: &str) -> Result<(), CaptureError> {
        let entry = self.entry_mut(name)?;
        if entry.scene.is_some() {
            log::debug!("Source '{}' already in scene", name);
            return Ok(());
        }
        let transform = SceneTransform::default();
        engine.scene_add(entry.id)?;
        if let Err(e) = engine.set_scene_transform(entry.id, &transform) {
            if let Err(undo) = engine.scene_remove(entry.id) {
                log::error!("Failed to undo scene add of '{}': {}", name, undo);
            }
            return Err(e);
        }
        entry.scene = Some(transform);
        Ok(())
    }

    /// Remove from the scene. Removing a source that is not a member is a no-op.
    pub fn remove_from_scene<E: Engine>(&mut self, engine: &mut E, name: &str) -> Result<(), CaptureError> {
        let entry = self.entry_mut(name)?;
        if entry.scene.is_none() {
            log::debug!("Source '{}' not in scene, nothing to remove", name);
            return Ok(());
        }
        engine.scene_remove(entry.id)?;
        entry.scene = None;
        Ok(())
    }

    pub fn position<E: Engine>(&self, engine: &E, name: &str) -> Result<SourcePosition, CaptureError> {
        let entry = self.entry(name)?;
        let transform = entry
            .scene
            .ok_or_else(|| CaptureError::NotInScene(name.to_string()))?;
        let dimensions = engine.source_dimensions(entry.id)?;
        Ok(SourcePosition::new(transform, dimensions))
    }

    pub fn set_position<E: Engine>(
        &mut self,
        engine: &mut E,
        name: &str,
        transform: SceneTransform,
    ) -> Result<(), CaptureError> {
        transform.validate().map_err(CaptureError::InvalidArgument)?;
        let entry = self.entry_mut(name)?;
        if entry.scene.is_none() {
            return Err(CaptureError::NotInScene(name.to_string()));
        }
        engine.set_scene_transform(entry.id, &transform)?;
        entry.scene = Some(transform);
        Ok(())
    }

    /// Release every source, continuing past failures.
    ///
    /// Returns the errors encountered; the registry is empty afterwards.
    pub fn release_all<E: Engine>(&mut self, engine: &mut E) -> Vec<CaptureError> {
        let mut errors = Vec::new();
        for (name, entry) in std::mem::take(&mut self.sources) {
            if entry.scene.is_some() {
                if let Err(e) = engine.scene_remove(entry.id) {
                    log::error!("Failed to remove '{}' from scene: {}", name, e);
                    errors.push(e);
                }
            }
            if let Err(e) = engine.release_source(entry.id) {
                log::error!("Failed to release source '{}': {}", name, e);
                errors.push(e);
            }
        }
        errors
    }
}

use crate::models::audio::AudioSettings;
use crate::models::error::CaptureError;
use crate::session::registry::{SourceEntry, SourceRegistry};
use crate::traits::engine::Engine;

/// Per-source volume and mute plus the global audio toggles.
///
/// Force-mono and noise suppression are applied when a source is created or
/// its settings are replaced; flipping a toggle does not touch live sources.
/// The global input mute is applied immediately and overrides each input's
/// own mute flag without overwriting it.
#[derive(Debug, Default)]
pub struct AudioSubsystem {
    settings: AudioSettings,
}

impl AudioSubsystem {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn settings(&self) -> AudioSettings {
        self.settings
    }

    fn effective_mute(&self, entry: &SourceEntry) -> bool {
        entry.audio.muted || (entry.is_audio_input() && self.settings.all_inputs_muted)
    }

    /// Push the pipeline toggles and mute state to a freshly created or
    /// reconfigured source.
    pub fn configure_source<E: Engine>(&self, engine: &mut E, entry: &SourceEntry) -> Result<(), CaptureError> {
        if !entry.category.has_audio() {
            return Ok(());
        }
        engine.set_source_force_mono(entry.id, self.settings.force_mono)?;
        if entry.is_audio_input() {
            engine.set_source_noise_suppression(entry.id, self.settings.noise_suppression)?;
        }
        engine.set_source_volume(entry.id, entry.audio.volume)?;
        engine.set_source_muted(entry.id, self.effective_mute(entry))
    }

    /// Set a source's volume as a linear multiplier in `[0.0, 1.0]`.
    pub fn set_volume<E: Engine>(
        &self,
        engine: &mut E,
        registry: &mut SourceRegistry,
        name: &str,
        volume: f32,
    ) -> Result<(), CaptureError> {
        if !volume.is_finite() || !(0.0..=1.0).contains(&volume) {
            return Err(CaptureError::InvalidArgument(format!(
                "volume must be within [0.0, 1.0], got {}",
                volume
            )));
        }
        let entry = registry.entry_mut(name)?;
        engine.set_source_volume(entry.id, volume)?;
        entry.audio.volume = volume;
        Ok(())
    }

    pub fn set_muted<E: Engine>(
        &self,
        engine: &mut E,
        registry: &mut SourceRegistry,
        name: &str,
        muted: bool,
    ) -> Result<(), CaptureError> {
        let entry = registry.entry_mut(name)?;
        let previous = entry.audio.muted;
        entry.audio.muted = muted;
        let effective = self.effective_mute(entry);
        if let Err(e) = engine.set_source_muted(entry.id, effective) {
            entry.audio.muted = previous;
            return Err(e);
        }
        Ok(())
    }

    /// Mute or unmute every audio input at once.
    ///
    /// Unmuting restores each input to its own mute flag. All inputs are
    /// visited even if one fails; the first failure is returned.
    pub fn set_mute_inputs<E: Engine>(
        &mut self,
        engine: &mut E,
        registry: &SourceRegistry,
        muted: bool,
    ) -> Result<(), CaptureError> {
        self.settings.all_inputs_muted = muted;
        let mut first_error = None;
        for (name, entry) in registry.entries().filter(|(_, e)| e.is_audio_input()) {
            if let Err(e) = engine.set_source_muted(entry.id, self.effective_mute(entry)) {
                log::error!("Failed to apply input mute to '{}': {}", name, e);
                first_error.get_or_insert(e);
            }
        }
        log::info!("Audio inputs {}", if muted { "muted" } else { "unmuted" });
        first_error.map_or(Ok(()), Err)
    }

    pub fn set_force_mono(&mut self, enabled: bool) {
        self.settings.force_mono = enabled;
        log::info!("Force mono {}", if enabled { "enabled" } else { "disabled" });
    }

    pub fn set_noise_suppression(&mut self, enabled: bool) {
        self.settings.noise_suppression = enabled;
        log::info!("Noise suppression {}", if enabled { "enabled" } else { "disabled" });
    }

    pub fn set_volmeter_enabled<E: Engine>(&mut self, engine: &mut E, enabled: bool) {
        engine.set_volmeter_enabled(enabled);
        self.settings.volmeter_enabled = enabled;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::mock_engine::MockEngine;

    fn setup() -> (MockEngine, SourceRegistry, AudioSubsystem) {
        (MockEngine::new(), SourceRegistry::new(), AudioSubsystem::new())
    }

    fn create(engine: &mut MockEngine, registry: &mut SourceRegistry, audio: &AudioSubsystem, name: &str, kind: &str) -> String {
        let name = registry.create(engine, name, kind).unwrap();
        let entry = registry.entry(&name).unwrap().clone();
        audio.configure_source(engine, &entry).unwrap();
        name
    }

    #[test]
    fn volume_outside_unit_range_is_rejected() {
        let (mut engine, mut registry, audio) = setup();
        let mic = create(&mut engine, &mut registry, &audio, "Mic", "wasapi_input_capture");

        audio.set_volume(&mut engine, &mut registry, &mic, 0.25).unwrap();
        for bad in [-0.1, 1.5, f32::NAN] {
            assert!(matches!(
                audio.set_volume(&mut engine, &mut registry, &mic, bad),
                Err(CaptureError::InvalidArgument(_))
            ));
        }

        assert_eq!(registry.entry(&mic).unwrap().audio.volume, 0.25);
        assert_eq!(engine.source_named(&mic).unwrap().volume, 0.25);
    }

    #[test]
    fn mute_all_restores_individual_mutes() {
        let (mut engine, mut registry, mut audio) = setup();
        let mic_a = create(&mut engine, &mut registry, &audio, "Mic A", "wasapi_input_capture");
        let mic_b = create(&mut engine, &mut registry, &audio, "Mic B", "wasapi_input_capture");
        let desktop = create(&mut engine, &mut registry, &audio, "Desktop", "wasapi_output_capture");
        audio.set_muted(&mut engine, &mut registry, &mic_b, true).unwrap();

        audio.set_mute_inputs(&mut engine, &registry, true).unwrap();
        assert!(engine.source_named(&mic_a).unwrap().muted);
        assert!(engine.source_named(&mic_b).unwrap().muted);
        assert!(!engine.source_named(&desktop).unwrap().muted);

        audio.set_mute_inputs(&mut engine, &registry, false).unwrap();
        assert!(!engine.source_named(&mic_a).unwrap().muted);
        assert!(engine.source_named(&mic_b).unwrap().muted);
        assert!(!registry.entry(&mic_a).unwrap().audio.muted);
    }

    #[test]
    fn unmuting_one_input_under_global_mute_stays_muted() {
        let (mut engine, mut registry, mut audio) = setup();
        let mic = create(&mut engine, &mut registry, &audio, "Mic", "wasapi_input_capture");
        audio.set_mute_inputs(&mut engine, &registry, true).unwrap();

        audio.set_muted(&mut engine, &mut registry, &mic, false).unwrap();
        assert!(engine.source_named(&mic).unwrap().muted);

        audio.set_mute_inputs(&mut engine, &registry, false).unwrap();
        assert!(!engine.source_named(&mic).unwrap().muted);
    }

    #[test]
    fn new_inputs_inherit_global_mute() {
        let (mut engine, mut registry, mut audio) = setup();
        audio.set_mute_inputs(&mut engine, &registry, true).unwrap();

        let mic = create(&mut engine, &mut registry, &audio, "Mic", "wasapi_input_capture");
        assert!(engine.source_named(&mic).unwrap().muted);
        assert!(!registry.entry(&mic).unwrap().audio.muted);
    }

    #[test]
    fn toggles_apply_to_sources_configured_afterwards() {
        let (mut engine, mut registry, mut audio) = setup();
        let before = create(&mut engine, &mut registry, &audio, "Before", "wasapi_input_capture");

        audio.set_force_mono(true);
        audio.set_noise_suppression(true);
        let after = create(&mut engine, &mut registry, &audio, "After", "wasapi_input_capture");
        let desktop = create(&mut engine, &mut registry, &audio, "Desktop", "wasapi_output_capture");

        let before_src = engine.source_named(&before).unwrap();
        assert!(!before_src.force_mono && !before_src.noise_suppression);
        let after_src = engine.source_named(&after).unwrap();
        assert!(after_src.force_mono && after_src.noise_suppression);
        let desktop_src = engine.source_named(&desktop).unwrap();
        assert!(desktop_src.force_mono);
        assert!(!desktop_src.noise_suppression);

        let entry = registry.entry(&before).unwrap().clone();
        audio.configure_source(&mut engine, &entry).unwrap();
        assert!(engine.source_named(&before).unwrap().force_mono);
    }

    #[test]
    fn video_sources_are_left_alone() {
        let (mut engine, mut registry, mut audio) = setup();
        audio.set_force_mono(true);
        let monitor = create(&mut engine, &mut registry, &audio, "Monitor", "monitor_capture");
        assert!(!engine.source_named(&monitor).unwrap().force_mono);
    }
}

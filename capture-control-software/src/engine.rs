use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use capture_control_core::models::signal::{codes, output_ids};
use capture_control_core::processing::levels;
use capture_control_core::{
    BufferConfig, CaptureError, Engine, EngineConfig, EventSink, OutputTarget, PreviewRect, Property, RingBuffer,
    SceneTransform, Settings, Signal, SourceCategory, SourceDimensions, SourceId, SurfaceHandle, VideoContext,
    AUDIO_SAMPLE_RATE,
};
use parking_lot::Mutex;

use crate::encoders::{EncoderBinding, AUDIO_BITRATE_KBPS, AUDIO_ENCODER, VIDEO_ENCODERS};
use crate::output::pipeline::{self, ActiveRecording, OutputState, Packet, OUTPUT_EXTENSION};
use crate::processing::mixer::{self, SourceGain};
use crate::processing::synth::ToneGenerator;
use crate::sources::{self, Inventory, SourceKind};

/// Minimum spacing of volmeter samples per source.
pub const VOLMETER_INTERVAL: Duration = Duration::from_millis(50);

struct SimSource {
    name: String,
    kind: SourceKind,
    settings: Settings,
    gain: SourceGain,
    noise_suppression: bool,
    in_scene: bool,
    transform: SceneTransform,
    generator: Option<ToneGenerator>,
    device_present: bool,
}

impl SimSource {
    fn new(id: SourceId, name: &str, kind: SourceKind) -> Self {
        let generator = kind.has_audio().then(|| {
            let frequency = 220.0 * (1 + id.0 % 4) as f32;
            ToneGenerator::new(frequency, AUDIO_SAMPLE_RATE, id.0 as u32)
        });
        Self {
            name: name.to_string(),
            kind,
            settings: sources::default_settings(kind),
            gain: SourceGain::default(),
            noise_suppression: false,
            in_scene: false,
            transform: SceneTransform::default(),
            generator,
            device_present: true,
        }
    }

    /// Post-fader audio for one tick, or None for video sources.
    fn render(&mut self, frames: usize) -> Option<Vec<f32>> {
        let generator = self.generator.as_mut()?;
        let mut block = generator.render(frames, self.noise_suppression);
        if !self.device_present {
            block.fill(0.0);
        }
        mixer::apply_gain(&mut block, &self.gain);
        Some(block)
    }
}

/// State shared between control calls and the tick thread.
struct Shared {
    video: VideoContext,
    events: EventSink,
    inventory: Inventory,
    sources: BTreeMap<SourceId, SimSource>,
    volmeter_enabled: bool,
    last_volmeter: Option<Instant>,
    encoder: Option<EncoderBinding>,
    output: OutputState,
    tick: u64,
}

impl Shared {
    fn new(inventory: Inventory) -> Self {
        Self {
            video: VideoContext::default(),
            events: EventSink::disconnected(),
            inventory,
            sources: BTreeMap::new(),
            volmeter_enabled: false,
            last_volmeter: None,
            encoder: None,
            output: OutputState::Idle,
            tick: 0,
        }
    }

    fn emit_output(&self, id: &str, code: i64) {
        self.events.emit(Signal::output(id, code));
    }

    fn source(&self, id: SourceId) -> Result<&SimSource, CaptureError> {
        self.sources
            .get(&id)
            .ok_or_else(|| CaptureError::Engine(format!("no source with id {}", id.0)))
    }

    fn source_mut(&mut self, id: SourceId) -> Result<&mut SimSource, CaptureError> {
        self.sources
            .get_mut(&id)
            .ok_or_else(|| CaptureError::Engine(format!("no source with id {}", id.0)))
    }

    fn encoder_kind(&self) -> String {
        self.encoder
            .as_ref()
            .map(|e| e.kind.clone())
            .unwrap_or_else(|| VIDEO_ENCODERS[0].to_string())
    }

    /// Finish a stop requested earlier: close the file, write metadata,
    /// then report `saved` and `stop`.
    fn finalize_pending(&mut self) {
        if !matches!(self.output, OutputState::Stopping(_)) {
            return;
        }
        let OutputState::Stopping(recording) = std::mem::replace(&mut self.output, OutputState::Idle) else {
            return;
        };
        let path = recording.path().to_path_buf();
        match recording.finalize() {
            Ok(result) => {
                log::info!(
                    "Saved {} ({:.2}s, {} frames)",
                    result.file_path.display(),
                    result.duration_secs,
                    result.metadata.frame_count
                );
                self.emit_output(output_ids::SAVED, codes::SUCCESS);
                self.emit_output(output_ids::STOP, codes::SUCCESS);
            }
            Err(e) => {
                log::error!("Failed to finalize {}: {}", path.display(), e);
                self.emit_output(output_ids::STOP, codes::ERROR);
            }
        }
    }

    /// Tear down whatever the output is doing without a graceful stop.
    fn abort_output(&mut self) {
        match std::mem::replace(&mut self.output, OutputState::Idle) {
            OutputState::Idle => {}
            OutputState::Buffering(_) => self.emit_output(output_ids::STOP, codes::SUCCESS),
            OutputState::Recording(recording) => {
                log::warn!("Aborting recording {}", recording.path().display());
                recording.abort();
                self.emit_output(output_ids::STOP, codes::SUCCESS);
            }
            stopping @ OutputState::Stopping(_) => {
                self.output = stopping;
                self.finalize_pending();
            }
        }
    }

    fn push_packet(&mut self, packet: Packet) {
        let failure = match &mut self.output {
            OutputState::Buffering(ring) => {
                ring.push(packet);
                None
            }
            OutputState::Recording(recording) => recording.write_packet(&packet).err(),
            _ => None,
        };
        if let Some(e) = failure {
            log::error!("Output write failed, stopping: {}", e);
            if let OutputState::Recording(recording) = std::mem::replace(&mut self.output, OutputState::Idle) {
                recording.abort();
            }
            self.emit_output(output_ids::STOP, codes::ERROR);
        }
    }

    /// Advance one video frame interval.
    fn tick(&mut self) {
        self.finalize_pending();

        let frames = pipeline::samples_for_tick(self.tick, self.video.fps);
        self.tick += 1;

        let capturing = self.output.is_active();
        let meter_due = self.volmeter_enabled
            && self.last_volmeter.is_none_or(|t| t.elapsed() >= VOLMETER_INTERVAL);
        if !capturing && !meter_due {
            return;
        }
        if meter_due {
            self.last_volmeter = Some(Instant::now());
        }

        let mut bus = vec![0.0f32; frames * 2];
        for source in self.sources.values_mut() {
            let Some(block) = source.render(frames) else {
                continue;
            };
            if meter_due {
                let loudness = levels::normalized_loudness(levels::rms_level(&block));
                self.events.emit(Signal::volmeter(&source.name, loudness as f64));
            }
            if capturing && source.in_scene {
                mixer::mix_into(&mut bus, &block);
            }
        }

        if capturing {
            self.push_packet(Packet {
                pcm: mixer::convert_to_int16_pcm(&bus),
            });
        }
    }
}

#[derive(Debug, Clone, Copy, Default)]
struct PreviewSurface {
    surface: Option<SurfaceHandle>,
    rect: Option<PreviewRect>,
    visible: bool,
}

/// In-process engine that synthesizes audio and writes WAV recordings.
///
/// ```text
/// [ToneGenerator per audio source] → gain → [mix of scene members] → PCM packet
///                 │                                                     │
///                 └→ volmeter signal            [RingBuffer] ←── buffering
///                                               [WavFileWriter] ←── recording
/// ```
///
/// A tick thread advances the pipeline once per video frame interval.
/// Stops are finalized on the following tick, after which `saved` and
/// `stop` are emitted.
pub struct SoftwareEngine {
    shared: Arc<Mutex<Shared>>,
    encoders: Vec<String>,
    next_id: u64,
    preview: PreviewSurface,
    running: Arc<AtomicBool>,
    tick_handle: Option<thread::JoinHandle<()>>,
}

impl SoftwareEngine {
    pub fn new() -> Self {
        Self::with_inventory(Inventory::default())
    }

    pub fn with_inventory(inventory: Inventory) -> Self {
        Self {
            shared: Arc::new(Mutex::new(Shared::new(inventory))),
            encoders: VIDEO_ENCODERS.iter().map(|s| s.to_string()).collect(),
            next_id: 1,
            preview: PreviewSurface::default(),
            running: Arc::new(AtomicBool::new(false)),
            tick_handle: None,
        }
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    /// Current output state, for diagnostics.
    pub fn output_label(&self) -> &'static str {
        self.shared.lock().output.label()
    }

    fn start_tick_thread(&mut self) -> Result<(), CaptureError> {
        self.running.store(true, Ordering::SeqCst);

        let running = Arc::clone(&self.running);
        let shared = Arc::clone(&self.shared);

        let handle = thread::Builder::new()
            .name("engine-tick".into())
            .spawn(move || {
                let mut next = Instant::now();
                while running.load(Ordering::SeqCst) {
                    let fps = shared.lock().video.fps.max(1);
                    next += Duration::from_secs(1) / fps;
                    let now = Instant::now();
                    match next.checked_duration_since(now) {
                        Some(wait) => thread::sleep(wait),
                        // More than a second behind: drop the backlog.
                        None if now.duration_since(next) > Duration::from_secs(1) => next = now,
                        None => {}
                    }
                    if !running.load(Ordering::SeqCst) {
                        break;
                    }
                    shared.lock().tick();
                }
            })
            .map_err(|e| {
                self.running.store(false, Ordering::SeqCst);
                CaptureError::Engine(format!("failed to spawn tick thread: {}", e))
            })?;

        self.tick_handle = Some(handle);
        Ok(())
    }

    fn stop_tick_thread(&mut self) {
        self.running.store(false, Ordering::SeqCst);
        if let Some(handle) = self.tick_handle.take() {
            if handle.join().is_err() {
                log::error!("Tick thread panicked");
            }
        }
    }
}

impl Default for SoftwareEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for SoftwareEngine {
    fn drop(&mut self) {
        self.stop_tick_thread();
    }
}

impl Engine for SoftwareEngine {
    fn startup(&mut self, config: &EngineConfig, video: &VideoContext, events: EventSink) -> Result<(), CaptureError> {
        if self.is_running() {
            return Err(CaptureError::Engine("engine already started".into()));
        }
        video.validate().map_err(CaptureError::InvalidArgument)?;
        {
            let mut shared = self.shared.lock();
            shared.video = *video;
            shared.events = events;
            shared.tick = 0;
            shared.output = OutputState::Idle;
        }
        self.start_tick_thread()?;
        log::info!(
            "Software engine started: plugins {}, data {}, audio {} @ {} kbps",
            config.plugin_path.display(),
            config.data_path.display(),
            AUDIO_ENCODER,
            AUDIO_BITRATE_KBPS
        );
        Ok(())
    }

    fn shutdown(&mut self) -> Result<(), CaptureError> {
        {
            let mut shared = self.shared.lock();
            shared.abort_output();
            if !shared.sources.is_empty() {
                log::warn!("{} sources still alive at shutdown", shared.sources.len());
                shared.sources.clear();
            }
            shared.events = EventSink::disconnected();
        }
        self.stop_tick_thread();
        self.preview = PreviewSurface::default();
        log::info!("Software engine stopped");
        Ok(())
    }

    fn reset_video(&mut self, video: &VideoContext) -> Result<(), CaptureError> {
        video.validate().map_err(CaptureError::InvalidArgument)?;
        let mut shared = self.shared.lock();
        shared.finalize_pending();
        if !shared.output.is_idle() {
            return Err(CaptureError::Engine(format!(
                "cannot reset video while {}",
                shared.output.label()
            )));
        }
        shared.video = *video;
        Ok(())
    }

    fn source_category(&self, kind: &str) -> Option<SourceCategory> {
        SourceKind::from_id(kind).map(|k| k.category())
    }

    fn create_source(&mut self, name: &str, kind: &str) -> Result<SourceId, CaptureError> {
        let kind = SourceKind::from_id(kind).ok_or_else(|| CaptureError::UnknownSourceType(kind.to_string()))?;
        let id = SourceId(self.next_id);
        self.next_id += 1;
        self.shared.lock().sources.insert(id, SimSource::new(id, name, kind));
        Ok(id)
    }

    fn release_source(&mut self, id: SourceId) -> Result<(), CaptureError> {
        self.shared
            .lock()
            .sources
            .remove(&id)
            .map(|_| ())
            .ok_or_else(|| CaptureError::Engine(format!("no source with id {}", id.0)))
    }

    fn source_settings(&self, id: SourceId) -> Result<Settings, CaptureError> {
        Ok(self.shared.lock().source(id)?.settings.clone())
    }

    fn update_source(&mut self, id: SourceId, settings: &Settings) -> Result<(), CaptureError> {
        let mut shared = self.shared.lock();
        let present = {
            let source = shared.source(id)?;
            match settings.get_str("device_id") {
                Some(device) if source.kind.has_audio() => shared.inventory.has_device(source.kind, device),
                _ => true,
            }
        };
        let source = shared.source_mut(id)?;
        source.settings = settings.clone();
        source.device_present = present;
        if !present {
            let name = source.name.clone();
            log::warn!("Audio device for '{}' not found", name);
            shared.events.emit(Signal::source(&name, codes::DISCONNECTED));
        }
        Ok(())
    }

    fn source_properties(&self, id: SourceId) -> Result<Vec<Property>, CaptureError> {
        let shared = self.shared.lock();
        let source = shared.source(id)?;
        Ok(sources::properties(source.kind, &source.settings, &shared.inventory))
    }

    fn source_dimensions(&self, id: SourceId) -> Result<SourceDimensions, CaptureError> {
        let shared = self.shared.lock();
        let source = shared.source(id)?;
        Ok(sources::dimensions(source.kind, &source.settings, &shared.inventory, &shared.video))
    }

    fn set_source_volume(&mut self, id: SourceId, volume: f32) -> Result<(), CaptureError> {
        self.shared.lock().source_mut(id)?.gain.volume = volume;
        Ok(())
    }

    fn set_source_muted(&mut self, id: SourceId, muted: bool) -> Result<(), CaptureError> {
        self.shared.lock().source_mut(id)?.gain.muted = muted;
        Ok(())
    }

    fn set_source_force_mono(&mut self, id: SourceId, mono: bool) -> Result<(), CaptureError> {
        self.shared.lock().source_mut(id)?.gain.force_mono = mono;
        Ok(())
    }

    fn set_source_noise_suppression(&mut self, id: SourceId, enabled: bool) -> Result<(), CaptureError> {
        self.shared.lock().source_mut(id)?.noise_suppression = enabled;
        Ok(())
    }

    fn set_volmeter_enabled(&mut self, enabled: bool) {
        let mut shared = self.shared.lock();
        shared.volmeter_enabled = enabled;
        shared.last_volmeter = None;
    }

    fn scene_add(&mut self, id: SourceId) -> Result<(), CaptureError> {
        let mut shared = self.shared.lock();
        let source = shared.source_mut(id)?;
        source.in_scene = true;
        source.transform = SceneTransform::default();
        Ok(())
    }

    fn scene_remove(&mut self, id: SourceId) -> Result<(), CaptureError> {
        self.shared.lock().source_mut(id)?.in_scene = false;
        Ok(())
    }

    fn set_scene_transform(&mut self, id: SourceId, transform: &SceneTransform) -> Result<(), CaptureError> {
        let mut shared = self.shared.lock();
        let source = shared.source_mut(id)?;
        if !source.in_scene {
            return Err(CaptureError::Engine(format!("source '{}' is not in the scene", source.name)));
        }
        source.transform = *transform;
        Ok(())
    }

    fn video_encoders(&self) -> Vec<String> {
        self.encoders.clone()
    }

    fn set_video_encoder(&mut self, kind: &str, settings: &Settings) -> Result<(), CaptureError> {
        let binding = EncoderBinding::new(kind, settings, &self.encoders)?;
        self.shared.lock().encoder = Some(binding);
        Ok(())
    }

    fn start_buffer(&mut self, buffer: &BufferConfig) -> Result<(), CaptureError> {
        buffer.validate().map_err(CaptureError::InvalidArgument)?;
        let mut shared = self.shared.lock();
        shared.finalize_pending();
        if !shared.output.is_idle() {
            return Err(CaptureError::Engine(format!("output is {}", shared.output.label())));
        }
        let capacity = pipeline::buffer_capacity(buffer, &shared.video);
        shared.output = OutputState::Buffering(RingBuffer::new(capacity));
        log::info!("Buffering up to {} packets", capacity);
        shared.emit_output(output_ids::STARTING, codes::SUCCESS);
        shared.emit_output(output_ids::START, codes::SUCCESS);
        Ok(())
    }

    fn convert_buffer(&mut self, offset_secs: u32, target: &OutputTarget) -> Result<(PathBuf, u32), CaptureError> {
        let mut shared = self.shared.lock();
        let fps = shared.video.fps.max(1);
        let held = match &shared.output {
            OutputState::Buffering(ring) => ring.count(),
            other => {
                return Err(CaptureError::Engine(format!(
                    "no buffer to convert, output is {}",
                    other.label()
                )))
            }
        };

        // The applied offset never exceeds what the buffer holds.
        let held_secs = u32::try_from(held / fps as usize).unwrap_or(u32::MAX);
        let applied = offset_secs.min(held_secs);
        if applied < offset_secs {
            log::warn!("Buffer holds {} packets, offset {}s cut to {}s", held, offset_secs, applied);
        }

        let path = target.with_extension(OUTPUT_EXTENSION);
        let encoder = shared.encoder_kind();
        let mut recording = ActiveRecording::create(path.clone(), shared.video, applied, &encoder)?;

        let wanted = applied as usize * fps as usize;
        let packets = match &mut shared.output {
            OutputState::Buffering(ring) => ring.take_latest(wanted),
            _ => Vec::new(),
        };
        for packet in &packets {
            if let Err(e) = recording.write_packet(packet) {
                recording.abort();
                shared.output = OutputState::Idle;
                shared.emit_output(output_ids::STOP, codes::ERROR);
                return Err(e);
            }
        }

        log::info!("Converted {} buffered packets into {}", packets.len(), path.display());
        shared.output = OutputState::Recording(recording);
        Ok((path, applied))
    }

    fn start_recording(&mut self, target: &OutputTarget) -> Result<PathBuf, CaptureError> {
        let mut shared = self.shared.lock();
        shared.finalize_pending();
        if !shared.output.is_idle() {
            return Err(CaptureError::Engine(format!("output is {}", shared.output.label())));
        }
        let path = target.with_extension(OUTPUT_EXTENSION);
        let encoder = shared.encoder_kind();
        let recording = ActiveRecording::create(path.clone(), shared.video, 0, &encoder)?;
        shared.output = OutputState::Recording(recording);
        shared.emit_output(output_ids::STARTING, codes::SUCCESS);
        shared.emit_output(output_ids::START, codes::SUCCESS);
        Ok(path)
    }

    fn output_active(&self) -> bool {
        self.shared.lock().output.is_active()
    }

    fn stop_output(&mut self) -> Result<(), CaptureError> {
        let mut shared = self.shared.lock();
        match std::mem::replace(&mut shared.output, OutputState::Idle) {
            OutputState::Idle => log::debug!("Stop requested with idle output"),
            OutputState::Buffering(_) => {
                shared.emit_output(output_ids::STOPPING, codes::SUCCESS);
                shared.emit_output(output_ids::STOP, codes::SUCCESS);
            }
            OutputState::Recording(recording) => {
                shared.output = OutputState::Stopping(recording);
                shared.emit_output(output_ids::STOPPING, codes::SUCCESS);
            }
            stopping @ OutputState::Stopping(_) => shared.output = stopping,
        }
        Ok(())
    }

    fn force_stop_output(&mut self) {
        self.shared.lock().abort_output();
    }

    fn preview_create(&mut self, surface: SurfaceHandle) -> Result<(), CaptureError> {
        self.preview = PreviewSurface {
            surface: Some(surface),
            ..PreviewSurface::default()
        };
        Ok(())
    }

    fn preview_configure(&mut self, rect: &PreviewRect) -> Result<(), CaptureError> {
        if self.preview.surface.is_none() {
            return Err(CaptureError::Engine("no preview surface".into()));
        }
        self.preview.rect = Some(*rect);
        Ok(())
    }

    fn preview_set_visible(&mut self, visible: bool) -> Result<(), CaptureError> {
        if self.preview.surface.is_none() {
            return Err(CaptureError::Engine("no preview surface".into()));
        }
        self.preview.visible = visible;
        Ok(())
    }

    fn preview_destroy(&mut self) {
        self.preview = PreviewSurface::default();
    }
}

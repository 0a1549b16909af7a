//! Source backends offered by the software engine and the simulated
//! capture inventory behind their property lists.

use capture_control_core::models::properties::{ComboFormat, ComboType, ListItem, ListValue, Property, PropertyKind};
use capture_control_core::{Settings, SourceCategory, SourceDimensions, VideoContext};

/// Backend type identifiers.
pub mod kinds {
    pub const MONITOR_CAPTURE: &str = "monitor_capture";
    pub const WINDOW_CAPTURE: &str = "window_capture";
    pub const GAME_CAPTURE: &str = "game_capture";
    pub const AUDIO_INPUT: &str = "wasapi_input_capture";
    pub const AUDIO_OUTPUT: &str = "wasapi_output_capture";
    pub const PROCESS_AUDIO: &str = "wasapi_process_output_capture";
}

/// Device id meaning "whatever the system default is".
pub const DEFAULT_DEVICE: &str = "default";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceKind {
    Monitor,
    Window,
    Game,
    AudioInput,
    AudioOutput,
    ProcessAudio,
}

impl SourceKind {
    pub fn from_id(id: &str) -> Option<Self> {
        match id {
            kinds::MONITOR_CAPTURE => Some(Self::Monitor),
            kinds::WINDOW_CAPTURE => Some(Self::Window),
            kinds::GAME_CAPTURE => Some(Self::Game),
            kinds::AUDIO_INPUT => Some(Self::AudioInput),
            kinds::AUDIO_OUTPUT => Some(Self::AudioOutput),
            kinds::PROCESS_AUDIO => Some(Self::ProcessAudio),
            _ => None,
        }
    }

    pub fn id(&self) -> &'static str {
        match self {
            Self::Monitor => kinds::MONITOR_CAPTURE,
            Self::Window => kinds::WINDOW_CAPTURE,
            Self::Game => kinds::GAME_CAPTURE,
            Self::AudioInput => kinds::AUDIO_INPUT,
            Self::AudioOutput => kinds::AUDIO_OUTPUT,
            Self::ProcessAudio => kinds::PROCESS_AUDIO,
        }
    }

    pub fn category(&self) -> SourceCategory {
        match self {
            Self::Monitor | Self::Window | Self::Game => SourceCategory::Video,
            Self::AudioInput => SourceCategory::AudioInput,
            Self::AudioOutput | Self::ProcessAudio => SourceCategory::AudioOutput,
        }
    }

    pub fn has_audio(&self) -> bool {
        self.category().has_audio()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Monitor {
    pub name: String,
    pub width: u32,
    pub height: u32,
}

/// A top-level window. `id` is `title:class:executable`.
#[derive(Debug, Clone, PartialEq)]
pub struct Window {
    pub id: String,
    pub title: String,
    pub width: u32,
    pub height: u32,
}

#[derive(Debug, Clone, PartialEq)]
pub struct AudioDevice {
    pub id: String,
    pub name: String,
}

/// What the capture backends can see.
#[derive(Debug, Clone, PartialEq)]
pub struct Inventory {
    pub monitors: Vec<Monitor>,
    pub windows: Vec<Window>,
    pub input_devices: Vec<AudioDevice>,
    pub output_devices: Vec<AudioDevice>,
}

impl Default for Inventory {
    fn default() -> Self {
        let window = |title: &str, class: &str, exe: &str, width, height| Window {
            id: format!("{}:{}:{}", title, class, exe),
            title: format!("[{}]: {}", exe, title),
            width,
            height,
        };
        let device = |id: &str, name: &str| AudioDevice {
            id: id.to_string(),
            name: name.to_string(),
        };
        Self {
            monitors: vec![
                Monitor { name: "Display 1".into(), width: 1920, height: 1080 },
                Monitor { name: "Display 2".into(), width: 2560, height: 1440 },
            ],
            windows: vec![
                window("World of Warcraft", "GxWindowClass", "Wow.exe", 2560, 1440),
                window("Untitled - Notepad", "Notepad", "notepad.exe", 1280, 720),
            ],
            input_devices: vec![
                device("{0.0.1.00000000}.{mic-1}", "Microphone (USB Audio)"),
                device("{0.0.1.00000000}.{mic-2}", "Line In (Realtek Audio)"),
            ],
            output_devices: vec![device("{0.0.0.00000000}.{spk-1}", "Speakers (Realtek Audio)")],
        }
    }
}

impl Inventory {
    pub fn window(&self, id: &str) -> Option<&Window> {
        self.windows.iter().find(|w| w.id == id)
    }

    /// Whether `device_id` names the default device or a known one of `kind`.
    pub fn has_device(&self, kind: SourceKind, device_id: &str) -> bool {
        if device_id == DEFAULT_DEVICE {
            return true;
        }
        let devices = match kind {
            SourceKind::AudioInput => &self.input_devices,
            SourceKind::AudioOutput => &self.output_devices,
            _ => return false,
        };
        devices.iter().any(|d| d.id == device_id)
    }
}

/// Settings a freshly created source starts with.
pub fn default_settings(kind: SourceKind) -> Settings {
    match kind {
        SourceKind::Monitor => Settings::new().with("monitor", 0i64).with("capture_cursor", true),
        SourceKind::Window => Settings::new().with("window", "").with("capture_cursor", true),
        SourceKind::Game => Settings::new()
            .with("capture_mode", "any_fullscreen")
            .with("window", "")
            .with("capture_cursor", true),
        SourceKind::AudioInput | SourceKind::AudioOutput => Settings::new().with("device_id", DEFAULT_DEVICE),
        SourceKind::ProcessAudio => Settings::new().with("window", ""),
    }
}

fn string_list(name: &str, description: &str, items: Vec<ListItem>) -> Property {
    Property::new(
        name,
        description,
        PropertyKind::List {
            combo_type: ComboType::List,
            combo_format: ComboFormat::String,
            items,
        },
    )
}

fn window_list(inventory: &Inventory) -> Property {
    let items = inventory
        .windows
        .iter()
        .map(|w| ListItem::new(&w.title, ListValue::String(w.id.clone())))
        .collect();
    string_list("window", "Window", items)
}

fn device_list(devices: &[AudioDevice]) -> Property {
    let items = std::iter::once(ListItem::new("Default", ListValue::String(DEFAULT_DEVICE.into())))
        .chain(devices.iter().map(|d| ListItem::new(&d.name, ListValue::String(d.id.clone()))))
        .collect();
    string_list("device_id", "Device", items)
}

/// Property schema for a source in its current settings.
///
/// Game capture only lists windows when `capture_mode` is `window`.
pub fn properties(kind: SourceKind, settings: &Settings, inventory: &Inventory) -> Vec<Property> {
    let cursor = Property::new("capture_cursor", "Capture Cursor", PropertyKind::Bool);
    match kind {
        SourceKind::Monitor => {
            let items = inventory
                .monitors
                .iter()
                .enumerate()
                .map(|(i, m)| {
                    let label = format!("{}: {}x{}", m.name, m.width, m.height);
                    ListItem::new(&label, ListValue::Int(i as i64))
                })
                .collect();
            let monitors = Property::new(
                "monitor",
                "Display",
                PropertyKind::List {
                    combo_type: ComboType::List,
                    combo_format: ComboFormat::Int,
                    items,
                },
            );
            vec![monitors, cursor]
        }
        SourceKind::Window => vec![window_list(inventory), cursor],
        SourceKind::Game => {
            let modes = string_list(
                "capture_mode",
                "Mode",
                vec![
                    ListItem::new("Capture any fullscreen application", ListValue::String("any_fullscreen".into())),
                    ListItem::new("Capture specific window", ListValue::String("window".into())),
                    ListItem::new("Capture foreground window with hotkey", ListValue::String("hotkey".into())),
                ],
            );
            let mut props = vec![modes];
            if settings.get_str("capture_mode") == Some("window") {
                props.push(window_list(inventory));
            }
            props.push(cursor);
            props
        }
        SourceKind::AudioInput => vec![device_list(&inventory.input_devices)],
        SourceKind::AudioOutput => vec![device_list(&inventory.output_devices)],
        SourceKind::ProcessAudio => vec![window_list(inventory)],
    }
}

/// Natural size of a source in its current settings. Zero when it captures nothing.
pub fn dimensions(kind: SourceKind, settings: &Settings, inventory: &Inventory, video: &VideoContext) -> SourceDimensions {
    let window_size = || {
        settings
            .get_str("window")
            .and_then(|id| inventory.window(id))
            .map(|w| SourceDimensions { width: w.width, height: w.height })
            .unwrap_or_default()
    };
    match kind {
        SourceKind::Monitor => settings
            .get_i64("monitor")
            .and_then(|i| usize::try_from(i).ok())
            .and_then(|i| inventory.monitors.get(i))
            .map(|m| SourceDimensions { width: m.width, height: m.height })
            .unwrap_or_default(),
        SourceKind::Window => window_size(),
        SourceKind::Game => match settings.get_str("capture_mode") {
            Some("window") => window_size(),
            _ => SourceDimensions { width: video.width, height: video.height },
        },
        SourceKind::AudioInput | SourceKind::AudioOutput | SourceKind::ProcessAudio => SourceDimensions::default(),
    }
}

//! Encoders offered by the software engine.

use capture_control_core::{CaptureError, Settings};

/// Video encoder kinds, in order of preference.
pub const VIDEO_ENCODERS: &[&str] = &["obs_x264", "jim_nvenc", "amd_amf_h264", "obs_qsv11"];

/// Audio is always AAC at a fixed bitrate.
pub const AUDIO_ENCODER: &str = "ffmpeg_aac";
pub const AUDIO_BITRATE_KBPS: u32 = 128;

const RATE_CONTROLS: &[&str] = &["CBR", "VBR", "CQP", "CRF"];

/// The encoder bound to the output, with its settings.
#[derive(Debug, Clone, PartialEq)]
pub struct EncoderBinding {
    pub kind: String,
    pub settings: Settings,
}

impl EncoderBinding {
    /// Check `settings` for `kind` and bind them.
    ///
    /// Recognized keys: `rate_control` (one of CBR, VBR, CQP, CRF),
    /// `bitrate` (kbps, positive) and `keyint_sec` (non-negative). Other
    /// keys pass through untouched.
    pub fn new(kind: &str, settings: &Settings, available: &[String]) -> Result<Self, CaptureError> {
        if !available.iter().any(|k| k == kind) {
            return Err(CaptureError::UnknownEncoder(kind.to_string()));
        }

        if let Some(value) = settings.get("rate_control") {
            let valid = settings
                .get_str("rate_control")
                .is_some_and(|rc| RATE_CONTROLS.contains(&rc));
            if !valid {
                return Err(CaptureError::InvalidArgument(format!(
                    "rate_control must be one of {:?}, got {:?}",
                    RATE_CONTROLS, value
                )));
            }
        }
        if settings.contains_key("bitrate") && !settings.get_f64("bitrate").is_some_and(|b| b > 0.0) {
            return Err(CaptureError::InvalidArgument("bitrate must be a positive number".into()));
        }
        if settings.contains_key("keyint_sec") && !settings.get_f64("keyint_sec").is_some_and(|k| k >= 0.0) {
            return Err(CaptureError::InvalidArgument("keyint_sec must be a non-negative number".into()));
        }

        Ok(Self {
            kind: kind.to_string(),
            settings: settings.clone(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn available() -> Vec<String> {
        VIDEO_ENCODERS.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn unknown_kind_is_rejected() {
        assert_eq!(
            EncoderBinding::new("h265_magic", &Settings::new(), &available()).unwrap_err(),
            CaptureError::UnknownEncoder("h265_magic".into())
        );
    }

    #[test]
    fn settings_are_validated() {
        let ok = Settings::new()
            .with("rate_control", "CBR")
            .with("bitrate", 6000i64)
            .with("preset", "veryfast");
        let binding = EncoderBinding::new("obs_x264", &ok, &available()).unwrap();
        assert_eq!(binding.settings.get_str("preset"), Some("veryfast"));

        for bad in [
            Settings::new().with("rate_control", "FAST"),
            Settings::new().with("rate_control", 3i64),
            Settings::new().with("bitrate", 0i64),
            Settings::new().with("keyint_sec", "two"),
        ] {
            assert!(matches!(
                EncoderBinding::new("obs_x264", &bad, &available()),
                Err(CaptureError::InvalidArgument(_))
            ));
        }
    }
}

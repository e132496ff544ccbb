use std::time::Duration;

use crossbeam_channel::Receiver;

use facescope_core::capture::domain::frame_source::CaptureError;
use facescope_core::capture::infrastructure::nokhwa_source::NokhwaSource;
use facescope_core::detection::infrastructure::gemini_config::{ConfigError, GeminiConfig};
use facescope_core::detection::infrastructure::gemini_detector::GeminiFaceDetector;
use facescope_core::pipeline::detection_loop::{
    DetectionLoop, LoopConfig, LoopEvent, LoopHandle,
};
use facescope_core::shared::constants::{CAPTURE_HEIGHT, CAPTURE_WIDTH};

use crate::settings::Settings;

pub enum StartError {
    Config(ConfigError),
    Capture(CaptureError),
}

impl StartError {
    /// What the status line shows. Full causes are already in the log.
    pub fn user_message(&self) -> &'static str {
        match self {
            StartError::Config(_) => "GEMINI_API_KEY is not set; set it and restart",
            StartError::Capture(CaptureError::Unsupported(_)) => {
                "Camera capture is not supported in this environment"
            }
            StartError::Capture(_) => "Could not access the camera; check permissions",
        }
    }
}

/// Acquires the camera, builds the detector, and starts the loop.
///
/// Any failure here means the loop never entered Running; the caller
/// shows the message and stays stopped.
pub fn spawn(settings: &Settings) -> Result<(Receiver<LoopEvent>, LoopHandle), StartError> {
    let config = GeminiConfig::from_env()
        .map_err(|e| {
            log::error!("startup configuration error: {e}");
            StartError::Config(e)
        })?
        .with_model(settings.model.clone());

    let source = NokhwaSource::open(settings.camera_index, CAPTURE_WIDTH, CAPTURE_HEIGHT)
        .map_err(|e| {
            log::error!("camera acquisition failed: {e}");
            StartError::Capture(e)
        })?;

    let detector = GeminiFaceDetector::new(config);
    Ok(DetectionLoop::spawn(
        Box::new(source),
        Box::new(detector),
        LoopConfig {
            detect_period: Duration::from_millis(settings.period_ms),
            ..LoopConfig::default()
        },
    ))
}

use std::time::Duration;

/// Delay between detection cycles.
pub const DETECT_PERIOD: Duration = Duration::from_millis(2000);

/// Preview refresh cadence (~30 fps).
pub const PREVIEW_PERIOD: Duration = Duration::from_millis(33);

/// JPEG quality for frames sent to the detection service.
pub const JPEG_QUALITY: u8 = 80;

/// Resolution requested from the capture device.
pub const CAPTURE_WIDTH: u32 = 640;
pub const CAPTURE_HEIGHT: u32 = 480;

/// Generic user-facing message for a failed detection cycle. The full
/// cause goes to the log; the UI shows only this.
pub const DETECTION_ERROR_MESSAGE: &str = "Face detection failed";

use std::path::Path;

use crate::capture::domain::frame_source::{CaptureError, FrameSource};
use crate::shared::frame::Frame;

/// Serves a single image file as a frame source.
///
/// Every `grab` returns the same frame, so one-shot detection and tests
/// can run the normal capture path without a camera.
pub struct ImageFileSource {
    frame: Option<Frame>,
}

impl ImageFileSource {
    pub fn open(path: &Path) -> Result<Self, CaptureError> {
        let img = image::open(path)
            .map_err(|e| CaptureError::DeviceAccess(format!("{}: {e}", path.display())))?
            .to_rgb8();
        let (w, h) = img.dimensions();
        Ok(Self {
            frame: Some(Frame::new(img.into_raw(), w, h, 3)),
        })
    }
}

impl FrameSource for ImageFileSource {
    fn grab(&mut self) -> Result<Option<Frame>, CaptureError> {
        Ok(self.frame.clone())
    }

    fn close(&mut self) {
        self.frame = None;
    }
}

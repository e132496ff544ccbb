use thiserror::Error;

use crate::shared::encoded_frame::EncodedFrame;
use crate::shared::face::DetectedFace;

/// Anything that went wrong asking the remote service about a frame.
///
/// Both variants surface to the user as the same generic message; the
/// split exists for the log, not the UI.
#[derive(Error, Debug)]
pub enum DetectionError {
    /// Transport failure or a non-success status from the service.
    #[error("detection request failed: {0}")]
    Request(String),
    /// The service answered, but not in the agreed shape.
    #[error("detection request failed: malformed response: {0}")]
    MalformedResponse(String),
}

/// Domain interface for remote face detection.
///
/// `detect` blocks the calling cycle until the service resolves.
/// Implementations may keep connection state, hence `&mut self`.
pub trait FaceDetector: Send {
    fn detect(&mut self, image: &EncodedFrame) -> Result<Vec<DetectedFace>, DetectionError>;
}

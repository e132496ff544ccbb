use thiserror::Error;

use crate::shared::frame::Frame;

#[derive(Error, Debug)]
pub enum CaptureError {
    /// Device missing, in use, or permission denied.
    #[error("camera access failed: {0}")]
    DeviceAccess(String),
    /// No capture backend exists in this environment.
    #[error("camera capture is not supported here: {0}")]
    Unsupported(String),
    /// A frame could not be read from an open source.
    #[error("frame capture failed: {0}")]
    Frame(String),
    /// A captured frame could not be encoded for transport.
    #[error("frame encoding failed: {0}")]
    Encode(String),
}

/// Domain interface for still-frame capture.
///
/// The loop owns the source for its Running lifetime and releases it
/// exactly once via `close`, which must be safe to call repeatedly.
pub trait FrameSource: Send {
    /// Grabs the current frame at the source's native resolution.
    ///
    /// `Ok(None)` means the source has no frame yet (e.g. stream still
    /// warming up); the caller abandons that cycle silently.
    fn grab(&mut self) -> Result<Option<Frame>, CaptureError>;

    /// Releases the underlying device. Idempotent.
    fn close(&mut self);
}

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use image::codecs::jpeg::JpegEncoder;

use crate::capture::domain::frame_source::CaptureError;
use crate::shared::encoded_frame::EncodedFrame;
use crate::shared::frame::Frame;

/// Encodes a frame as lossy JPEG and wraps it for transport.
///
/// The output carries no data-URL prefix; it is the bare base64 the
/// detection service expects.
pub fn encode_base64(frame: &Frame, quality: u8) -> Result<EncodedFrame, CaptureError> {
    let img = image::RgbImage::from_raw(frame.width(), frame.height(), frame.data().to_vec())
        .ok_or_else(|| CaptureError::Encode("frame buffer does not match dimensions".into()))?;

    let mut bytes = Vec::new();
    let encoder = JpegEncoder::new_with_quality(&mut bytes, quality);
    img.write_with_encoder(encoder)
        .map_err(|e| CaptureError::Encode(e.to_string()))?;

    Ok(EncodedFrame {
        data: BASE64.encode(&bytes),
        mime_type: "image/jpeg",
    })
}

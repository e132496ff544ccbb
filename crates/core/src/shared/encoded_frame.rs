/// A frame encoded for transport to the detection service.
///
/// `data` is raw base64 with no data-URL prefix; the service receives
/// the mime type out of band.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncodedFrame {
    pub data: String,
    pub mime_type: &'static str,
}

pub mod image_file_source;
pub mod jpeg_encoder;
pub mod nokhwa_source;

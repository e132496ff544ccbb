pub mod constants;
pub mod encoded_frame;
pub mod face;
pub mod frame;

/// A single captured frame: contiguous RGB bytes in row-major order.
///
/// Format conversion happens at I/O boundaries only; the rest of the
/// crate treats pixel data as opaque.
#[derive(Clone, Debug, PartialEq)]
pub struct Frame {
    data: Vec<u8>,
    width: u32,
    height: u32,
    channels: u8,
}

impl Frame {
    pub fn new(data: Vec<u8>, width: u32, height: u32, channels: u8) -> Self {
        debug_assert_eq!(
            data.len(),
            (width as usize) * (height as usize) * (channels as usize),
            "data length must equal width * height * channels"
        );
        Self {
            data,
            width,
            height,
            channels,
        }
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn channels(&self) -> u8 {
        self.channels
    }

    /// Returns a horizontally mirrored copy.
    ///
    /// Used by selfie-style presentation surfaces, which flip the frame
    /// exactly once; overlay geometry stays in the unflipped space.
    pub fn flip_horizontal(&self) -> Frame {
        let w = self.width as usize;
        let h = self.height as usize;
        let c = self.channels as usize;
        let mut data = vec![0u8; self.data.len()];
        for row in 0..h {
            let row_start = row * w * c;
            for col in 0..w {
                let src = row_start + col * c;
                let dst = row_start + (w - 1 - col) * c;
                data[dst..dst + c].copy_from_slice(&self.data[src..src + c]);
            }
        }
        Frame::new(data, self.width, self.height, self.channels)
    }

    /// Expands RGB bytes to RGBA with an opaque alpha channel.
    ///
    /// GUI texture uploads want RGBA; capture and encoding stay RGB.
    pub fn to_rgba8(&self) -> Vec<u8> {
        debug_assert_eq!(self.channels, 3, "to_rgba8 expects an RGB frame");
        let mut rgba = Vec::with_capacity(self.data.len() / 3 * 4);
        for px in self.data.chunks_exact(3) {
            rgba.extend_from_slice(px);
            rgba.push(0xff);
        }
        rgba
    }
}

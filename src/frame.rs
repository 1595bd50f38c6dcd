//! Frame data model.
//!
//! A [`Frame`] is an owned rectangular pixel buffer produced by the capture
//! layer. Ownership moves with the pipeline: whichever stage holds the frame
//! owns it exclusively, and a stage that changes pixels (the annotator)
//! produces a new buffer at the target resolution rather than mutating the
//! source in place.

/// Pixel layout of a frame buffer.
#[non_exhaustive]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PixelFormat {
    /// 8-bit RGB, row-major, 3 bytes per pixel.
    Rgb8,
}

impl PixelFormat {
    pub fn bytes_per_pixel(self) -> usize {
        match self {
            PixelFormat::Rgb8 => 3,
        }
    }
}

/// One captured image frame.
#[derive(Clone, Debug)]
pub struct Frame {
    data: Vec<u8>,
    width: u32,
    height: u32,
    format: PixelFormat,
}

impl Frame {
    /// Build a frame from raw pixel data. Called by the capture layer.
    ///
    /// Returns `None` when the buffer length does not match the stated
    /// dimensions; capture backends treat that as a read error.
    pub fn from_raw(data: Vec<u8>, width: u32, height: u32, format: PixelFormat) -> Option<Self> {
        let expected = width as usize * height as usize * format.bytes_per_pixel();
        if data.len() != expected {
            return None;
        }
        Some(Self {
            data,
            width,
            height,
            format,
        })
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn format(&self) -> PixelFormat {
        self.format
    }

    /// Read-only pixel access for detection and annotation.
    pub fn pixels(&self) -> &[u8] {
        &self.data
    }

    /// Consume the frame, returning the raw buffer.
    pub fn into_raw(self) -> Vec<u8> {
        self.data
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_raw_checks_buffer_length() {
        let ok = Frame::from_raw(vec![0u8; 2 * 2 * 3], 2, 2, PixelFormat::Rgb8);
        assert!(ok.is_some());

        let short = Frame::from_raw(vec![0u8; 5], 2, 2, PixelFormat::Rgb8);
        assert!(short.is_none());
    }
}

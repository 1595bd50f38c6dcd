//! Synthetic camera scenes for tests and demos.

use crate::frame::{Frame, PixelFormat};

use super::CaptureError;

const BACKGROUND: u8 = 128;

/// Fruit colors the `fruit` scene cycles through, one per acquisition:
/// green, orange, yellow, red.
const FRUIT_COLORS: [[u8; 3]; 4] = [[0, 255, 0], [255, 165, 0], [255, 255, 0], [255, 0, 0]];

/// Synthetic scene generator.
///
/// Scenes:
/// - `fruit`: gray bench with one fruit disc whose color cycles per frame
/// - `empty`: gray bench only, nothing to detect
///
/// Unknown scene names behave like `empty`.
pub struct SyntheticCamera {
    scene: String,
    width: u32,
    height: u32,
    frame_count: u64,
}

impl SyntheticCamera {
    pub fn new(scene: String, width: u32, height: u32) -> Self {
        Self {
            scene,
            width,
            height,
            frame_count: 0,
        }
    }

    pub fn acquire(&mut self) -> Result<Frame, CaptureError> {
        self.frame_count += 1;

        let mut pixels = vec![BACKGROUND; (self.width * self.height * 3) as usize];
        if self.scene == "fruit" {
            let color = FRUIT_COLORS[(self.frame_count as usize - 1) % FRUIT_COLORS.len()];
            self.paint_disc(&mut pixels, color);
        }

        Frame::from_raw(pixels, self.width, self.height, PixelFormat::Rgb8)
            .ok_or_else(|| CaptureError::ReadFailed("synthetic buffer size mismatch".into()))
    }

    /// Paint one filled fruit disc, slightly off-center so scaled boxes are
    /// asymmetric in tests.
    fn paint_disc(&self, pixels: &mut [u8], color: [u8; 3]) {
        let cx = self.width as f32 * 0.45;
        let cy = self.height as f32 * 0.55;
        let radius = (self.width.min(self.height) as f32 / 6.0).max(4.0);

        for y in 0..self.height {
            for x in 0..self.width {
                let dx = x as f32 - cx;
                let dy = y as f32 - cy;
                if dx * dx + dy * dy <= radius * radius {
                    let offset = ((y * self.width + x) * 3) as usize;
                    pixels[offset..offset + 3].copy_from_slice(&color);
                }
            }
        }
    }
}

//! Hue-region classifier backend.
//!
//! A model-free detector that classifies saturated hue regions of an RGB
//! frame into the four fruit classes. It exists so the full pipeline runs
//! end-to-end without model weights; an ML detector plugs in through the same
//! [`DetectorBackend`] trait.
//!
//! Detections are emitted largest-region-first so the emission order, which
//! drives the filter's first-match selection, stays deterministic.

use anyhow::{anyhow, Result};

use crate::detect::backend::DetectorBackend;
use crate::detect::result::{BoundingBox, Detection};

/// Minimum saturation for a pixel to count as fruit-colored.
const MIN_SATURATION: f32 = 0.35;
/// Minimum value (brightness) for a pixel to count at all.
const MIN_VALUE: f32 = 0.25;
/// Minimum region size as a fraction of the frame area.
const MIN_REGION_FRACTION: f32 = 0.002;

const CLASS_GREEN: u32 = 0;
const CLASS_ORANGE: u32 = 1;
const CLASS_YELLOW: u32 = 2;
const CLASS_RED: u32 = 3;
const CLASS_COUNT: usize = 4;

#[derive(Default)]
pub struct ColorBackend;

impl ColorBackend {
    pub fn new() -> Self {
        Self
    }
}

impl DetectorBackend for ColorBackend {
    fn name(&self) -> &'static str {
        "color"
    }

    fn detect(&mut self, pixels: &[u8], width: u32, height: u32) -> Result<Vec<Detection>> {
        let expected = width as usize * height as usize * 3;
        if pixels.len() != expected {
            return Err(anyhow!(
                "frame buffer size {} does not match {}x{} rgb",
                pixels.len(),
                width,
                height
            ));
        }

        let mut regions = [Region::default(); CLASS_COUNT];

        for y in 0..height {
            let row = (y * width) as usize * 3;
            for x in 0..width {
                let offset = row + x as usize * 3;
                let (r, g, b) = (pixels[offset], pixels[offset + 1], pixels[offset + 2]);
                if let Some(class_id) = classify_rgb(r, g, b) {
                    regions[class_id as usize].include(x as f32, y as f32);
                }
            }
        }

        let min_pixels = ((width * height) as f32 * MIN_REGION_FRACTION).max(16.0) as u64;

        let mut detections: Vec<(u64, Detection)> = Vec::new();
        for (class_id, region) in regions.iter().enumerate() {
            let Some(detection) = region.to_detection(class_id as u32, min_pixels) else {
                continue;
            };
            detections.push((region.count, detection));
        }

        // Largest region first; count ties broken by class id for determinism.
        detections.sort_by(|a, b| {
            b.0.cmp(&a.0)
                .then(a.1.class_id.cmp(&b.1.class_id))
        });

        Ok(detections.into_iter().map(|(_, det)| det).collect())
    }
}

/// Per-class pixel accumulator: bounding extent plus population.
#[derive(Clone, Copy, Debug)]
struct Region {
    min_x: f32,
    min_y: f32,
    max_x: f32,
    max_y: f32,
    count: u64,
}

impl Default for Region {
    fn default() -> Self {
        Self {
            min_x: f32::MAX,
            min_y: f32::MAX,
            max_x: f32::MIN,
            max_y: f32::MIN,
            count: 0,
        }
    }
}

impl Region {
    fn include(&mut self, x: f32, y: f32) {
        self.min_x = self.min_x.min(x);
        self.min_y = self.min_y.min(y);
        self.max_x = self.max_x.max(x);
        self.max_y = self.max_y.max(y);
        self.count += 1;
    }

    fn to_detection(&self, class_id: u32, min_pixels: u64) -> Option<Detection> {
        if self.count < min_pixels {
            return None;
        }
        // Extend by one pixel so single-row/column extents stay well-formed.
        let bbox = BoundingBox::new(self.min_x, self.min_y, self.max_x + 1.0, self.max_y + 1.0);
        if !bbox.is_well_formed() {
            return None;
        }
        // Density of the region inside its own box; a filled disc lands
        // around 0.78, scattered noise much lower.
        let area = bbox.width() * bbox.height();
        let confidence = (self.count as f32 / area).clamp(0.0, 1.0);
        Some(Detection {
            bbox,
            class_id,
            confidence,
        })
    }
}

/// Map an RGB pixel to a fruit class by hue, or `None` for background.
fn classify_rgb(r: u8, g: u8, b: u8) -> Option<u32> {
    let (h, s, v) = rgb_to_hsv(r, g, b);
    if s < MIN_SATURATION || v < MIN_VALUE {
        return None;
    }
    if h < 15.0 || h >= 345.0 {
        Some(CLASS_RED)
    } else if h < 45.0 {
        Some(CLASS_ORANGE)
    } else if h < 75.0 {
        Some(CLASS_YELLOW)
    } else if h < 170.0 {
        Some(CLASS_GREEN)
    } else {
        None
    }
}

fn rgb_to_hsv(r: u8, g: u8, b: u8) -> (f32, f32, f32) {
    let r = r as f32 / 255.0;
    let g = g as f32 / 255.0;
    let b = b as f32 / 255.0;
    let max = r.max(g).max(b);
    let min = r.min(g).min(b);
    let delta = max - min;

    let h = if delta == 0.0 {
        0.0
    } else if max == r {
        60.0 * (((g - b) / delta).rem_euclid(6.0))
    } else if max == g {
        60.0 * ((b - r) / delta + 2.0)
    } else {
        60.0 * ((r - g) / delta + 4.0)
    };
    let s = if max == 0.0 { 0.0 } else { delta / max };

    (h, s, max)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn frame_with_disc(width: u32, height: u32, rgb: [u8; 3]) -> Vec<u8> {
        // Gray background with a filled disc of the given color.
        let mut pixels = vec![128u8; (width * height * 3) as usize];
        let (cx, cy, radius) = (width as f32 / 2.0, height as f32 / 2.0, width as f32 / 6.0);
        for y in 0..height {
            for x in 0..width {
                let dx = x as f32 - cx;
                let dy = y as f32 - cy;
                if dx * dx + dy * dy <= radius * radius {
                    let offset = ((y * width + x) * 3) as usize;
                    pixels[offset..offset + 3].copy_from_slice(&rgb);
                }
            }
        }
        pixels
    }

    #[test]
    fn hue_mapping_matches_the_catalog() {
        assert_eq!(classify_rgb(255, 0, 0), Some(CLASS_RED));
        assert_eq!(classify_rgb(255, 165, 0), Some(CLASS_ORANGE));
        assert_eq!(classify_rgb(255, 255, 0), Some(CLASS_YELLOW));
        assert_eq!(classify_rgb(0, 255, 0), Some(CLASS_GREEN));
        // Gray background is never classified.
        assert_eq!(classify_rgb(128, 128, 128), None);
    }

    #[test]
    fn detects_a_red_disc_with_a_tight_box() {
        let (width, height) = (96, 96);
        let pixels = frame_with_disc(width, height, [255, 0, 0]);
        let mut backend = ColorBackend::new();

        let detections = backend.detect(&pixels, width, height).unwrap();
        assert_eq!(detections.len(), 1);

        let det = &detections[0];
        assert_eq!(det.class_id, CLASS_RED);
        assert!(det.bbox.is_well_formed());
        assert!(det.confidence > 0.5, "disc density, got {}", det.confidence);

        // The box must surround the disc center.
        assert!(det.bbox.x1 < 48.0 && det.bbox.x2 > 48.0);
        assert!(det.bbox.y1 < 48.0 && det.bbox.y2 > 48.0);
    }

    #[test]
    fn empty_scene_yields_no_detections() {
        let (width, height) = (32, 32);
        let pixels = vec![128u8; (width * height * 3) as usize];
        let mut backend = ColorBackend::new();

        let detections = backend.detect(&pixels, width, height).unwrap();
        assert!(detections.is_empty());
    }

    #[test]
    fn buffer_size_mismatch_is_an_error() {
        let mut backend = ColorBackend::new();
        assert!(backend.detect(&[0u8; 10], 4, 4).is_err());
    }
}

//! Display-space annotation.
//!
//! The annotator takes the source frame plus the filtered detection list and
//! produces a new image at the display resolution:
//! 1. resample the frame to the target size (independent x/y factors; aspect
//!    ratio is not preserved)
//! 2. scale each box by the same factors
//! 3. draw the box outline in the class color and a filled label chip above
//!    it with `<name> <confidence>`, clamped inside the frame
//! 4. apply a rounded-corner alpha mask to the composed image
//!
//! The mask is purely cosmetic; detection geometry is computed before it and
//! never altered by it. The source frame is read-only here; the annotator
//! owns its output buffer.

use std::path::PathBuf;

use ab_glyph::{FontVec, PxScale};
use anyhow::{anyhow, Result};
use image::imageops::{self, FilterType};
use image::{DynamicImage, RgbImage, Rgba, RgbaImage};
use imageproc::drawing::{draw_filled_rect_mut, draw_hollow_rect_mut, draw_text_mut, text_size};
use imageproc::rect::Rect;

use crate::catalog::ClassCatalog;
use crate::detect::Detection;
use crate::frame::Frame;

/// Box outline thickness in display pixels.
const OUTLINE_THICKNESS: i32 = 3;
/// Minimum top edge for the label baseline.
const LABEL_TOP_MARGIN: i32 = 30;
/// Gap between box top and label baseline.
const LABEL_GAP: i32 = 10;
const TEXT_COLOR: Rgba<u8> = Rgba([0, 0, 0, 255]);

#[derive(Clone, Debug)]
pub struct AnnotatorConfig {
    pub target_width: u32,
    pub target_height: u32,
    /// Rounded clip mask corner radius, in display pixels.
    pub corner_radius: u32,
    /// TTF/OTF file for chip text. Without a font the chip is drawn empty.
    pub font_path: Option<PathBuf>,
}

impl Default for AnnotatorConfig {
    fn default() -> Self {
        Self {
            target_width: 1280,
            target_height: 720,
            corner_radius: 20,
            font_path: None,
        }
    }
}

/// Annotated display image plus the cycle's "found" flag.
pub struct Annotated {
    pub image: RgbaImage,
    /// Whether at least one eligible detection was drawn; drives whether a
    /// command may later be sent.
    pub found: bool,
}

pub struct Annotator {
    config: AnnotatorConfig,
    font: Option<FontVec>,
}

impl Annotator {
    /// Build an annotator. A configured font that fails to load is reported
    /// in the log and degrades to chip-only labels; geometry is unaffected.
    pub fn new(config: AnnotatorConfig) -> Self {
        let font = config.font_path.as_ref().and_then(|path| {
            let bytes = match std::fs::read(path) {
                Ok(bytes) => bytes,
                Err(err) => {
                    log::warn!("Annotator: read font {} failed: {}", path.display(), err);
                    return None;
                }
            };
            match FontVec::try_from_vec(bytes) {
                Ok(font) => Some(font),
                Err(err) => {
                    log::warn!("Annotator: parse font {} failed: {}", path.display(), err);
                    None
                }
            }
        });
        Self { config, font }
    }

    pub fn target_size(&self) -> (u32, u32) {
        (self.config.target_width, self.config.target_height)
    }

    /// Render the annotated display image for one cycle.
    ///
    /// `detections` is the allowlist-filtered list in emission order, with
    /// boxes in source-frame coordinates.
    pub fn render(
        &self,
        frame: &Frame,
        detections: &[Detection],
        catalog: &ClassCatalog,
    ) -> Result<Annotated> {
        let source = RgbImage::from_raw(frame.width(), frame.height(), frame.pixels().to_vec())
            .ok_or_else(|| anyhow!("frame buffer does not match its dimensions"))?;

        let (tw, th) = (self.config.target_width, self.config.target_height);
        let resized = imageops::resize(&source, tw, th, FilterType::Triangle);
        let mut canvas = DynamicImage::ImageRgb8(resized).into_rgba8();

        let sx = tw as f32 / frame.width() as f32;
        let sy = th as f32 / frame.height() as f32;

        for detection in detections {
            self.draw_detection(&mut canvas, detection, sx, sy, catalog);
        }

        apply_rounded_mask(&mut canvas, self.config.corner_radius);

        Ok(Annotated {
            image: canvas,
            found: !detections.is_empty(),
        })
    }

    fn draw_detection(
        &self,
        canvas: &mut RgbaImage,
        detection: &Detection,
        sx: f32,
        sy: f32,
        catalog: &ClassCatalog,
    ) {
        let [r, g, b] = catalog.color(detection.class_id);
        let color = Rgba([r, g, b, 255]);

        let scaled = detection.bbox.scaled(sx, sy);
        let x1 = scaled.x1.round() as i32;
        let y1 = scaled.y1.round() as i32;
        let w = (scaled.width().round() as i32).max(1);
        let h = (scaled.height().round() as i32).max(1);

        // 3 px outline as nested 1 px rectangles.
        for inset in 0..OUTLINE_THICKNESS {
            let (iw, ih) = (w - 2 * inset, h - 2 * inset);
            if iw <= 0 || ih <= 0 {
                break;
            }
            let rect = Rect::at(x1 + inset, y1 + inset).of_size(iw as u32, ih as u32);
            draw_hollow_rect_mut(canvas, rect, color);
        }

        let label = format!(
            "{} {:.2}",
            catalog.display_name(detection.class_id),
            detection.confidence
        );
        let px = label_font_px(self.config.target_width, self.config.target_height);
        let (text_w, text_h) = self.measure(&label, px);
        let chip = label_chip(x1, y1, text_w, text_h, self.config.target_height as i32);

        let (cw, ch) = (chip.x2 - chip.x1, chip.y2 - chip.y1);
        if cw > 0 && ch > 0 {
            let rect = Rect::at(chip.x1, chip.y1).of_size(cw as u32, ch as u32);
            draw_filled_rect_mut(canvas, rect, color);
            if let Some(font) = &self.font {
                draw_text_mut(
                    canvas,
                    TEXT_COLOR,
                    chip.text_x,
                    chip.text_y,
                    PxScale::from(px),
                    font,
                    &label,
                );
            }
        }
    }

    /// Text extent in display pixels. Without a font, a deterministic
    /// estimate keeps chip geometry stable.
    fn measure(&self, label: &str, px: f32) -> (i32, i32) {
        match &self.font {
            Some(font) => {
                let (w, h) = text_size(PxScale::from(px), font, label);
                ((w as i32).max(1), (h as i32).max(1))
            }
            None => {
                let w = (label.chars().count() as f32 * px * 0.55).round() as i32;
                (w.max(1), px.round() as i32)
            }
        }
    }
}

/// Label chip rectangle and text origin, in display pixels.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) struct LabelChip {
    pub x1: i32,
    pub y1: i32,
    pub x2: i32,
    pub y2: i32,
    pub text_x: i32,
    pub text_y: i32,
}

/// Chip geometry for a box whose top-left display corner is `(box_x1,
/// box_y1)`. The baseline sits `LABEL_GAP` above the box, clamped so the chip
/// never rises above `LABEL_TOP_MARGIN` nor sinks below the frame.
pub(crate) fn label_chip(
    box_x1: i32,
    box_y1: i32,
    text_w: i32,
    text_h: i32,
    target_h: i32,
) -> LabelChip {
    let label_y = (box_y1 - LABEL_GAP)
        .max(LABEL_TOP_MARGIN)
        .min(target_h - text_h - LABEL_GAP);
    LabelChip {
        x1: box_x1,
        y1: label_y - text_h - LABEL_GAP,
        x2: box_x1 + text_w + LABEL_GAP,
        y2: label_y,
        text_x: box_x1 + 5,
        text_y: label_y - text_h - 5,
    }
}

fn label_font_px(target_w: u32, target_h: u32) -> f32 {
    (target_w.min(target_h) as f32 / 36.0).max(16.0)
}

/// Zero out the alpha of pixels outside a rounded rectangle covering the
/// whole image. Cosmetic only; runs after all geometry is drawn.
fn apply_rounded_mask(image: &mut RgbaImage, radius: u32) {
    if radius == 0 {
        return;
    }
    let (w, h) = image.dimensions();
    let r = radius.min(w / 2).min(h / 2);
    if r == 0 {
        return;
    }
    let rf = r as f32;

    // Circle centers of the four corner arcs.
    let centers = [
        (rf - 1.0, rf - 1.0),
        (w as f32 - rf, rf - 1.0),
        (rf - 1.0, h as f32 - rf),
        (w as f32 - rf, h as f32 - rf),
    ];

    for y in 0..h {
        for x in 0..w {
            let in_corner_band = (x < r || x >= w - r) && (y < r || y >= h - r);
            if !in_corner_band {
                continue;
            }
            let outside = centers.iter().all(|&(cx, cy)| {
                let dx = x as f32 - cx;
                let dy = y as f32 - cy;
                dx * dx + dy * dy > rf * rf
            });
            if outside {
                image.get_pixel_mut(x, y).0[3] = 0;
            }
        }
    }
}

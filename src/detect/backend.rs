use anyhow::Result;

use crate::detect::result::Detection;

/// Detector backend trait.
///
/// This is the consumed contract of the object detector: pixels in, an
/// ordered list of detections out. Inference itself (model weights, runtimes)
/// is an external capability; the pipeline owns filtering and selection, not
/// detection.
///
/// Implementations must report boxes in source-frame pixel coordinates and
/// confidences in `[0, 1]`. Emission order is significant: the filter selects
/// the primary detection by first match, so backends must emit in a
/// deterministic order.
pub trait DetectorBackend: Send {
    /// Backend identifier, used for registry lookup and logging.
    fn name(&self) -> &'static str;

    /// Run detection on one frame.
    ///
    /// The pixel slice is read-only and ephemeral; implementations must not
    /// retain it beyond this call. Returning an empty list is the normal
    /// "no object" outcome, not an error.
    fn detect(&mut self, pixels: &[u8], width: u32, height: u32) -> Result<Vec<Detection>>;

    /// Optional warm-up hook.
    fn warm_up(&mut self) -> Result<()> {
        Ok(())
    }
}

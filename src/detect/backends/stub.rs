use std::collections::VecDeque;

use anyhow::Result;

use crate::detect::backend::DetectorBackend;
use crate::detect::result::Detection;

/// Scripted backend for tests and demos.
///
/// Returns pre-programmed detection lists in order, then empty lists once the
/// script is exhausted. Emission order inside each list is preserved exactly,
/// which is what the filter's first-match selection is tested against.
pub struct StubBackend {
    script: VecDeque<Vec<Detection>>,
}

impl StubBackend {
    pub fn new(script: impl IntoIterator<Item = Vec<Detection>>) -> Self {
        Self {
            script: script.into_iter().collect(),
        }
    }

    /// A stub that never detects anything.
    pub fn empty() -> Self {
        Self::new([])
    }
}

impl DetectorBackend for StubBackend {
    fn name(&self) -> &'static str {
        "stub"
    }

    fn detect(&mut self, _pixels: &[u8], _width: u32, _height: u32) -> Result<Vec<Detection>> {
        Ok(self.script.pop_front().unwrap_or_default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::detect::result::BoundingBox;

    #[test]
    fn stub_replays_script_then_goes_quiet() {
        let detection = Detection {
            bbox: BoundingBox::new(0.0, 0.0, 10.0, 10.0),
            class_id: 2,
            confidence: 0.9,
        };
        let mut backend = StubBackend::new([vec![detection]]);

        let first = backend.detect(&[], 1, 1).unwrap();
        assert_eq!(first.len(), 1);

        let second = backend.detect(&[], 1, 1).unwrap();
        assert!(second.is_empty());
    }
}
